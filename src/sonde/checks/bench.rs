//! Best-effort throughput measurement against the endpoint
//!
//! Not part of the conformance verdict: the numbers depend as much on the
//! path between the harness and the service as on the service itself.
use std::time::Instant;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use rand::RngCore;

use sonde_util::config::RunConfig;
use sonde_util::time::name_suffix;

use crate::client::build_client;

use super::CheckError;

pub struct BenchReport {
	pub count: usize,
	pub size: usize,
	pub upload_secs: f64,
	pub download_secs: f64,
}

impl BenchReport {
	pub fn print(&self) {
		let volume_mib = (self.count * self.size) as f64 / (1024.0 * 1024.0);
		println!("Benchmark: {} objects of {} bytes", self.count, self.size);
		println!(
			"  upload:   {:.2}s ({:.2} MiB/s)",
			self.upload_secs,
			volume_mib / self.upload_secs
		);
		println!(
			"  download: {:.2}s ({:.2} MiB/s)",
			self.download_secs,
			volume_mib / self.download_secs
		);
	}
}

pub async fn run(cfg: &RunConfig, count: usize, size: usize) -> Result<BenchReport, CheckError> {
	let client = build_client(cfg, &cfg.credentials);
	let bucket = format!("bench-bucket-{}", name_suffix());

	client
		.create_bucket()
		.bucket(&bucket)
		.send()
		.await
		.map_err(|e| {
			CheckError::BucketCreationFailed(bucket.clone(), DisplayErrorContext(&e).to_string())
		})?;

	let mut payload = vec![0u8; size];
	rand::thread_rng().fill_bytes(&mut payload);

	let mut result = Ok(());

	let upload_started = Instant::now();
	for i in 0..count {
		let body = ByteStream::from(payload.clone());
		if let Err(e) = client
			.put_object()
			.bucket(&bucket)
			.key(format!("bench-object-{}", i))
			.body(body)
			.send()
			.await
		{
			result = Err(CheckError::UploadFailed(
				DisplayErrorContext(&e).to_string(),
			));
			break;
		}
	}
	let upload_secs = upload_started.elapsed().as_secs_f64();

	let download_started = Instant::now();
	if result.is_ok() {
		for i in 0..count {
			let response = client
				.get_object()
				.bucket(&bucket)
				.key(format!("bench-object-{}", i))
				.send()
				.await;
			let collected = match response {
				Ok(r) => r.body.collect().await.map(|_| ()).map_err(|e| e.to_string()),
				Err(e) => Err(DisplayErrorContext(&e).to_string()),
			};
			if let Err(detail) = collected {
				result = Err(CheckError::DownloadFailed(detail));
				break;
			}
		}
	}
	let download_secs = download_started.elapsed().as_secs_f64();

	// Best-effort cleanup, like every other resource the harness creates
	for i in 0..count {
		let _ = client
			.delete_object()
			.bucket(&bucket)
			.key(format!("bench-object-{}", i))
			.send()
			.await;
	}
	if let Err(e) = client.delete_bucket().bucket(&bucket).send().await {
		warn!(
			"Could not remove bench bucket {}: {}",
			bucket,
			DisplayErrorContext(&e)
		);
	}

	result.map(|_| BenchReport {
		count,
		size,
		upload_secs,
		download_secs,
	})
}
