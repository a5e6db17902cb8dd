//! Network reachability probes: DNS, TCP and HTTP
use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

use sonde_util::config::RunConfig;

use super::{CheckError, PROBE_TIMEOUT};

/// Status codes accepted on the base endpoint. A 403 means the service is up
/// but requires authorization, which counts as reachable. This is a
/// deliberately loose check.
const ACCEPTED_STATUS: &[u16] = &[200, 403];

/// Resolve the configured host to socket addresses.
pub async fn resolve_host(host: &str, port: u16) -> Result<Vec<SocketAddr>, CheckError> {
	let target = format!("{}:{}", host, port);
	let addrs = timeout(PROBE_TIMEOUT, lookup_host(target.clone()))
		.await
		.map_err(|e| CheckError::DnsResolutionFailed(target.clone(), e.to_string()))?
		.map_err(|e| CheckError::DnsResolutionFailed(target.clone(), e.to_string()))?
		.collect::<Vec<_>>();

	if addrs.is_empty() {
		return Err(CheckError::DnsResolutionFailed(
			target,
			"no addresses returned".to_string(),
		));
	}
	Ok(addrs)
}

/// Attempt a single TCP connection. The connection is closed again
/// immediately on success.
pub async fn probe_tcp(addr: SocketAddr) -> Result<(), CheckError> {
	let stream = timeout(PROBE_TIMEOUT, TcpStream::connect(addr))
		.await
		.map_err(|e| CheckError::PortUnreachable(addr, e.to_string()))?
		.map_err(|e| CheckError::PortUnreachable(addr, e.to_string()))?;
	drop(stream);
	Ok(())
}

/// Single unauthenticated GET, returning the observed status code.
pub async fn probe_http(client: &reqwest::Client, url: &str) -> Result<u16, CheckError> {
	let response = client
		.get(url)
		.send()
		.await
		.map_err(|e| CheckError::ConnectivityFailed(url.to_string(), e.to_string()))?;
	Ok(response.status().as_u16())
}

pub async fn run(cfg: &RunConfig) -> Result<(), CheckError> {
	let addrs = resolve_host(&cfg.server, cfg.port).await?;
	debug!("Resolved {} to {:?}", cfg.server, addrs);

	probe_tcp(addrs[0]).await?;

	let url = cfg.base_url();
	let client = cfg
		.probe_client(PROBE_TIMEOUT)
		.map_err(|e| CheckError::ConnectivityFailed(url.clone(), e.to_string()))?;
	let status = probe_http(&client, &url).await?;
	if !ACCEPTED_STATUS.contains(&status) {
		return Err(CheckError::UnexpectedHttpStatus(url, status));
	}
	debug!("Endpoint {} answered with status code {}", url, status);

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::super::test_stub::*;
	use super::*;

	#[tokio::test]
	async fn test_resolve_host_localhost() {
		let addrs = resolve_host("localhost", 9000).await.unwrap();
		assert!(!addrs.is_empty());
		assert!(addrs.iter().all(|a| a.port() == 9000));
	}

	#[tokio::test]
	async fn test_resolve_host_unresolvable_name() {
		assert!(matches!(
			resolve_host("sonde-test.invalid", 9000).await,
			Err(CheckError::DnsResolutionFailed(_, _))
		));
	}

	#[tokio::test]
	async fn test_probe_tcp_open_port() {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		probe_tcp(addr).await.unwrap();
	}

	#[tokio::test]
	async fn test_probe_tcp_closed_port() {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);
		assert!(matches!(
			probe_tcp(addr).await,
			Err(CheckError::PortUnreachable(_, _))
		));
	}

	#[tokio::test]
	async fn test_run_accepts_credential_guarded_endpoint() {
		let (addr, shutdown) = spawn_endpoint_stub(200, 200, 403).await;
		run(&stub_config(addr)).await.unwrap();
		let _ = shutdown.send(());
	}

	#[tokio::test]
	async fn test_run_rejects_other_status_codes() {
		let (addr, shutdown) = spawn_endpoint_stub(200, 200, 500).await;
		assert!(matches!(
			run(&stub_config(addr)).await,
			Err(CheckError::UnexpectedHttpStatus(_, 500))
		));
		let _ = shutdown.send(());
	}
}
