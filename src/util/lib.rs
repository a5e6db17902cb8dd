//! Crate containing common code used by the sonde conformance harness

pub mod config;
pub mod error;
pub mod time;
