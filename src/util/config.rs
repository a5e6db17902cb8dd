//! Resolution of the harness run configuration from its execution environment
use std::env;
use std::time::Duration;

use crate::error::Error;

/// Default S3 API port of a stock MinIO deployment
pub const DEFAULT_PORT: u16 = 9000;

const DEFAULT_REGION: &str = "us-east-1";

/// A pair of S3 credentials
#[derive(Debug, Clone)]
pub struct CredentialPair {
	pub access_key: String,
	pub secret_key: String,
}

/// Resolved configuration of a conformance run.
///
/// Built once at process start from the `MINIO_*` environment variables and
/// the TLS flag, then shared read-only by every check.
#[derive(Debug, Clone)]
pub struct RunConfig {
	/// Host name or address of the server under test
	pub server: String,
	/// S3 API port of the server under test
	pub port: u16,
	/// Credentials expected to be accepted by the server
	pub credentials: CredentialPair,
	/// Credentials scoped to a read-only role, for the authorization check
	pub read_only_credentials: Option<CredentialPair>,
	/// Region passed to the S3 client
	pub region: String,
	/// Whether to speak TLS to the server
	pub secure: bool,
}

impl RunConfig {
	/// Resolve the configuration from `MINIO_*` environment variables.
	///
	/// All missing required variables are reported in one error, so that a
	/// single failed run reveals the full misconfiguration.
	pub fn from_env(secure: bool) -> Result<Self, Error> {
		let mut missing = vec![];

		let server = require(&mut missing, "MINIO_SERVER");
		let access_key = require(&mut missing, "MINIO_ACCESS_KEY");
		let secret_key = require(&mut missing, "MINIO_SECRET_KEY");

		if !missing.is_empty() {
			return Err(Error::MissingConfiguration(missing));
		}

		let port = match env::var("MINIO_PORT") {
			Ok(value) if !value.is_empty() => value
				.parse::<u16>()
				.map_err(|_| Error::Message(format!("Invalid MINIO_PORT value: {}", value)))?,
			_ => DEFAULT_PORT,
		};

		let read_only_credentials = match (
			env::var("MINIO_READONLY_ACCESS_KEY"),
			env::var("MINIO_READONLY_SECRET_KEY"),
		) {
			(Ok(access_key), Ok(secret_key)) if !access_key.is_empty() && !secret_key.is_empty() => {
				Some(CredentialPair {
					access_key,
					secret_key,
				})
			}
			_ => None,
		};

		Ok(RunConfig {
			server,
			port,
			credentials: CredentialPair {
				access_key,
				secret_key,
			},
			read_only_credentials,
			region: env::var("MINIO_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
			secure,
		})
	}

	/// The `host:port` pair of the server under test
	pub fn endpoint(&self) -> String {
		format!("{}:{}", self.server, self.port)
	}

	pub fn scheme(&self) -> &'static str {
		if self.secure {
			"https"
		} else {
			"http"
		}
	}

	pub fn base_url(&self) -> String {
		format!("{}://{}", self.scheme(), self.endpoint())
	}

	/// HTTP client used by the raw probes.
	///
	/// Certificate validation is disabled only when TLS is enabled: probe
	/// targets are test deployments serving self-signed certificates. Never
	/// reuse this transport outside the harness.
	pub fn probe_client(&self, timeout: Duration) -> Result<reqwest::Client, Error> {
		let client = if self.secure {
			reqwest::Client::builder()
				.use_rustls_tls()
				.danger_accept_invalid_certs(true)
				.timeout(timeout)
				.build()?
		} else {
			reqwest::Client::builder().timeout(timeout).build()?
		};

		Ok(client)
	}

	/// Print a summary of the resolved configuration for operator diagnosis.
	///
	/// Secret values are never printed, only whether they are set.
	pub fn print_summary(&self) {
		println!("#################################");
		println!("# CONFIG");
		println!("#################################");
		println!("MINIO_SERVER: {:?}", self.server);
		println!("MINIO_PORT: {}", self.port);
		println!(
			"MINIO_ACCESS_KEY is set: {}",
			!self.credentials.access_key.is_empty()
		);
		println!(
			"MINIO_SECRET_KEY is set: {}",
			!self.credentials.secret_key.is_empty()
		);
		println!(
			"Read-only credentials are set: {}",
			self.read_only_credentials.is_some()
		);
		println!("Secure mode enabled: {}", self.secure);
		println!("Endpoint: {}", self.endpoint());
		println!("#################################");
	}
}

fn require(missing: &mut Vec<String>, name: &'static str) -> String {
	match env::var(name) {
		Ok(value) if !value.is_empty() => value,
		_ => {
			missing.push(name.to_string());
			String::new()
		}
	}
}
