//! Module containing error types used in the harness
use std::io;

use err_derive::Error;

/// Regroup all errors that can abort a run before any check executes
#[derive(Debug, Error)]
pub enum Error {
	#[error(display = "IO error: {}", _0)]
	Io(#[error(source)] io::Error),

	#[error(display = "HTTP client error: {}", _0)]
	Http(#[error(source)] reqwest::Error),

	#[error(display = "Missing required environment variables: {:?}", _0)]
	MissingConfiguration(Vec<String>),

	#[error(display = "{}", _0)]
	Message(String),
}
