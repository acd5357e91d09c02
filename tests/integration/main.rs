//! Integration tests for the engine, the transports and config-driven runs

mod common;
mod config_run_tests;
mod transport_tests;
