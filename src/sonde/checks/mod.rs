//! The conformance checks
//!
//! Each check is an independent unit of work: it talks to the service under
//! test through its own client and its own bucket/object namespace, so checks
//! run concurrently and a failure in one never prevents the others from
//! running and reporting.

pub mod auth;
pub mod bench;
pub mod connectivity;
pub mod crud;
pub mod health;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use err_derive::Error;

use sonde_util::config::RunConfig;

use crate::report::CheckOutcome;

/// Timeout applied to every raw network probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything that can make a check fail.
///
/// The transport variants are network-level failures; the remaining variants
/// are divergences from the conformance contract itself, which are the point
/// of the harness.
#[derive(Debug, Error)]
pub enum CheckError {
	#[error(display = "DNS resolution failed for {}: {}", _0, _1)]
	DnsResolutionFailed(String, String),

	#[error(display = "TCP port unreachable at {}: {}", _0, _1)]
	PortUnreachable(SocketAddr, String),

	#[error(display = "HTTP connectivity failed for {}: {}", _0, _1)]
	ConnectivityFailed(String, String),

	#[error(display = "Unexpected HTTP status code {} for {}", _1, _0)]
	UnexpectedHttpStatus(String, u16),

	#[error(display = "Liveness probe failed: {}", _0)]
	LivenessFailed(String),

	#[error(display = "Readiness probe failed: {}", _0)]
	ReadinessFailed(String),

	#[error(display = "Authentication with valid credentials failed: {}", _0)]
	AuthenticationFailed(String),

	#[error(display = "Invalid credentials were accepted by the server")]
	UnexpectedAuthenticationSuccess,

	#[error(
		display = "Read-only credentials performed a privileged operation: {}",
		_0
	)]
	UnexpectedAuthorizationSuccess(String),

	#[error(display = "Could not write fixture file: {}", _0)]
	FixtureWriteFailed(String),

	#[error(display = "Bucket creation failed for {}: {}", _0, _1)]
	BucketCreationFailed(String, String),

	#[error(display = "Object upload failed: {}", _0)]
	UploadFailed(String),

	#[error(display = "Object download failed: {}", _0)]
	DownloadFailed(String),

	#[error(display = "Downloaded content differs from uploaded content")]
	IntegrityMismatch,

	#[error(display = "Object overwrite failed: {}", _0)]
	UpdateFailed(String),

	#[error(display = "Object deletion failed: {}", _0)]
	DeletionFailed(String),

	#[error(display = "Object {} still listed after deletion", _0)]
	ObjectStillPresent(String),

	#[error(display = "Object listing failed: {}", _0)]
	ListingFailed(String),

	#[error(display = "Deadline exceeded after {:?}", _0)]
	DeadlineExceeded(Duration),
}

/// The independently schedulable checks, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
	Connectivity,
	Liveness,
	Readiness,
	Authentication,
	Authorization,
	Crud,
}

impl Check {
	pub const ALL: [Check; 6] = [
		Check::Connectivity,
		Check::Liveness,
		Check::Readiness,
		Check::Authentication,
		Check::Authorization,
		Check::Crud,
	];

	pub fn name(self) -> &'static str {
		match self {
			Check::Connectivity => "connectivity",
			Check::Liveness => "liveness",
			Check::Readiness => "readiness",
			Check::Authentication => "authentication",
			Check::Authorization => "authorization",
			Check::Crud => "crud",
		}
	}
}

async fn run_one(check: Check, cfg: Arc<RunConfig>, deadline: Option<Duration>) -> CheckOutcome {
	if check == Check::Authorization && cfg.read_only_credentials.is_none() {
		return CheckOutcome::skipped(check.name(), "no read-only credentials configured");
	}

	let started = Instant::now();
	let result = match check {
		// The CRUD check handles the deadline itself: its teardown must
		// still run after the lifecycle is cancelled.
		Check::Crud => crud::run(&cfg, deadline).await,
		_ => {
			let fut = async {
				match check {
					Check::Connectivity => connectivity::run(&cfg).await,
					Check::Liveness => health::liveness(&cfg).await,
					Check::Readiness => health::readiness(&cfg).await,
					Check::Authentication => auth::authentication(&cfg).await,
					Check::Authorization => auth::authorization(&cfg).await,
					Check::Crud => unreachable!(),
				}
			};
			match deadline {
				Some(d) => match tokio::time::timeout(d, fut).await {
					Ok(result) => result,
					Err(_) => Err(CheckError::DeadlineExceeded(d)),
				},
				None => fut.await,
			}
		}
	};

	if let Err(e) = &result {
		warn!("Check {} failed: {}", check.name(), e);
	}
	CheckOutcome::from_result(check.name(), result, started.elapsed())
}

/// Run the selected checks concurrently and gather one outcome per check.
pub async fn run_checks(
	checks: &[Check],
	cfg: Arc<RunConfig>,
	deadline: Option<Duration>,
) -> Vec<CheckOutcome> {
	let handles = checks
		.iter()
		.map(|&check| tokio::spawn(run_one(check, cfg.clone(), deadline)))
		.collect::<Vec<_>>();

	let mut outcomes = Vec::with_capacity(handles.len());
	for (handle, &check) in handles.into_iter().zip(checks) {
		match handle.await {
			Ok(outcome) => outcomes.push(outcome),
			Err(e) => outcomes.push(CheckOutcome::failed(
				check.name(),
				format!("check task panicked: {}", e),
				Duration::ZERO,
			)),
		}
	}
	outcomes
}

#[cfg(test)]
pub(crate) mod test_stub {
	use std::convert::Infallible;
	use std::net::SocketAddr;

	use hyper::service::{make_service_fn, service_fn};
	use hyper::{Body, Request, Response, Server, StatusCode};
	use tokio::sync::oneshot;

	use sonde_util::config::{CredentialPair, RunConfig};

	/// Minimal stand-in for the storage endpoint: answers the two health
	/// paths and everything else with fixed status codes.
	pub(crate) async fn spawn_endpoint_stub(
		live: u16,
		ready: u16,
		other: u16,
	) -> (SocketAddr, oneshot::Sender<()>) {
		let make_svc = make_service_fn(move |_conn| async move {
			Ok::<_, Infallible>(service_fn(move |req: Request<Body>| async move {
				let status = match req.uri().path() {
					"/minio/health/live" => live,
					"/minio/health/ready" => ready,
					_ => other,
				};
				Ok::<_, Infallible>(
					Response::builder()
						.status(StatusCode::from_u16(status).unwrap())
						.body(Body::empty())
						.unwrap(),
				)
			}))
		});

		let server = Server::bind(&"127.0.0.1:0".parse().unwrap()).serve(make_svc);
		let addr = server.local_addr();
		let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
		tokio::spawn(server.with_graceful_shutdown(async {
			let _ = shutdown_rx.await;
		}));

		(addr, shutdown_tx)
	}

	/// Configuration pointing at the stub endpoint.
	pub(crate) fn stub_config(addr: SocketAddr) -> RunConfig {
		RunConfig {
			server: addr.ip().to_string(),
			port: addr.port(),
			credentials: CredentialPair {
				access_key: "minioadmin".to_string(),
				secret_key: "minioadmin".to_string(),
			},
			read_only_credentials: None,
			region: "us-east-1".to_string(),
			secure: false,
		}
	}
}
