//! Construction of S3 clients bound to the configured endpoint
use std::sync::Arc;
use std::time::SystemTime;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::Client;
use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;
use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ServerName};

use sonde_util::config::{CredentialPair, RunConfig};

/// Build an S3 client for the configured endpoint, bound to the given
/// credential pair.
///
/// Path-style addressing is forced: the harness targets deployments that do
/// not resolve virtual-hosted bucket domains.
pub fn build_client(cfg: &RunConfig, creds: &CredentialPair) -> Client {
	let credentials = Credentials::new(
		creds.access_key.clone(),
		creds.secret_key.clone(),
		None,
		None,
		"sonde",
	);

	let mut builder = aws_sdk_s3::Config::builder()
		.behavior_version(BehaviorVersion::latest())
		.region(Region::new(cfg.region.clone()))
		.endpoint_url(cfg.base_url())
		.credentials_provider(credentials)
		.force_path_style(true);

	if cfg.secure {
		// Same trust relaxation as the probe transport: test deployments
		// serve self-signed certificates.
		let tls_config = rustls::ClientConfig::builder()
			.with_safe_defaults()
			.with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
			.with_no_client_auth();
		let connector = hyper_rustls::HttpsConnectorBuilder::new()
			.with_tls_config(tls_config)
			.https_or_http()
			.enable_http1()
			.build();
		builder = builder.http_client(HyperClientBuilder::new().build(connector));
	}

	Client::from_conf(builder.build())
}

/// Certificate verifier that accepts any server certificate.
///
/// Only ever installed when the operator asked for TLS against a test
/// endpoint; the harness has no business validating the PKI of the
/// deployment it is probing.
struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
	fn verify_server_cert(
		&self,
		_end_entity: &Certificate,
		_intermediates: &[Certificate],
		_server_name: &ServerName,
		_scts: &mut dyn Iterator<Item = &[u8]>,
		_ocsp_response: &[u8],
		_now: SystemTime,
	) -> Result<ServerCertVerified, rustls::Error> {
		Ok(ServerCertVerified::assertion())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sonde_util::config::DEFAULT_PORT;

	fn test_config(secure: bool) -> RunConfig {
		RunConfig {
			server: "localhost".to_string(),
			port: DEFAULT_PORT,
			credentials: CredentialPair {
				access_key: "minioadmin".to_string(),
				secret_key: "minioadmin".to_string(),
			},
			read_only_credentials: None,
			region: "us-east-1".to_string(),
			secure,
		}
	}

	#[test]
	fn test_build_client_plain_and_tls() {
		for secure in [false, true] {
			let cfg = test_config(secure);
			let client = build_client(&cfg, &cfg.credentials);
			assert_eq!(
				client.config().endpoint_url(),
				Some(cfg.base_url().as_str())
			);
		}
	}
}
