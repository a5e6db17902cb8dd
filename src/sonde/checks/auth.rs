//! Credential and privilege checks
//!
//! The negative paths are the point here: a server that accepts invalid
//! credentials, or that lets a read-only identity mutate state, fails
//! conformance even though every call "worked".
use aws_sdk_s3::error::DisplayErrorContext;

use sonde_util::config::{CredentialPair, RunConfig};

use crate::client::build_client;

use super::CheckError;

/// Syntactically well-formed credentials that no deployment should accept
const INVALID_ACCESS_KEY: &str = "INVALID_KEY";
const INVALID_SECRET_KEY: &str = "INVALID_SECRET";

/// Bucket targeted by the privileged operation of the authorization check.
/// The operation is expected to be rejected, so a fixed name is fine.
const AUTH_BUCKET: &str = "test-bucket-auth";

/// Valid credentials must be able to list buckets; invalid ones must not.
pub async fn authentication(cfg: &RunConfig) -> Result<(), CheckError> {
	let client = build_client(cfg, &cfg.credentials);
	client
		.list_buckets()
		.send()
		.await
		.map_err(|e| CheckError::AuthenticationFailed(DisplayErrorContext(&e).to_string()))?;

	let bogus = CredentialPair {
		access_key: INVALID_ACCESS_KEY.to_string(),
		secret_key: INVALID_SECRET_KEY.to_string(),
	};
	let invalid_client = build_client(cfg, &bogus);
	match invalid_client.list_buckets().send().await {
		Ok(_) => Err(CheckError::UnexpectedAuthenticationSuccess),
		Err(e) => {
			debug!(
				"Invalid credentials rejected as expected: {}",
				DisplayErrorContext(&e)
			);
			Ok(())
		}
	}
}

/// A read-only identity must not be able to create a bucket.
pub async fn authorization(cfg: &RunConfig) -> Result<(), CheckError> {
	let read_only = match &cfg.read_only_credentials {
		Some(pair) => pair,
		// The runner reports this check as skipped before getting here
		None => return Ok(()),
	};

	let client = build_client(cfg, read_only);
	match client.create_bucket().bucket(AUTH_BUCKET).send().await {
		Ok(_) => {
			cleanup_auth_bucket(cfg).await;
			Err(CheckError::UnexpectedAuthorizationSuccess(
				"bucket creation with read-only credentials succeeded".to_string(),
			))
		}
		Err(e) => {
			debug!(
				"Privileged operation rejected as expected: {}",
				DisplayErrorContext(&e)
			);
			// The rejected call must not have created the bucket as a side
			// effect; verify with the privileged client.
			let privileged = build_client(cfg, &cfg.credentials);
			match privileged.head_bucket().bucket(AUTH_BUCKET).send().await {
				Ok(_) => {
					cleanup_auth_bucket(cfg).await;
					Err(CheckError::UnexpectedAuthorizationSuccess(
						"rejected bucket creation left the bucket behind".to_string(),
					))
				}
				Err(_) => Ok(()),
			}
		}
	}
}

/// Best-effort removal, so a failed run does not leak state into the next one.
async fn cleanup_auth_bucket(cfg: &RunConfig) {
	let client = build_client(cfg, &cfg.credentials);
	if let Err(e) = client.delete_bucket().bucket(AUTH_BUCKET).send().await {
		warn!(
			"Could not clean up bucket {}: {}",
			AUTH_BUCKET,
			DisplayErrorContext(&e)
		);
	}
}
