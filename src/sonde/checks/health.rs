//! Liveness and readiness probes against the well-known MinIO health paths
//!
//! The two probes are registered as separate checks so that a failure in one
//! never blocks or masks the other.
use sonde_util::config::RunConfig;

use super::{CheckError, PROBE_TIMEOUT};

const LIVE_PATH: &str = "/minio/health/live";
const READY_PATH: &str = "/minio/health/ready";

/// Process-up probe; exactly HTTP 200 passes.
pub async fn liveness(cfg: &RunConfig) -> Result<(), CheckError> {
	probe(cfg, LIVE_PATH).await.map_err(CheckError::LivenessFailed)
}

/// Ready-to-serve probe; exactly HTTP 200 passes.
pub async fn readiness(cfg: &RunConfig) -> Result<(), CheckError> {
	probe(cfg, READY_PATH)
		.await
		.map_err(CheckError::ReadinessFailed)
}

async fn probe(cfg: &RunConfig, path: &str) -> Result<(), String> {
	let url = format!("{}{}", cfg.base_url(), path);
	let client = cfg.probe_client(PROBE_TIMEOUT).map_err(|e| e.to_string())?;

	let response = client
		.get(&url)
		.send()
		.await
		.map_err(|e| e.to_string())?;
	let status = response.status().as_u16();
	if status != 200 {
		return Err(format!("unexpected status code {} for {}", status, url));
	}
	Ok(())
}
