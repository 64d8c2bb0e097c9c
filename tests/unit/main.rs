//! Unit tests for individual components

mod config_test;
mod error_test;
mod primitives_test;
