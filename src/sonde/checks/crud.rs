//! CRUD round-trip integrity check
//!
//! Eight strictly sequential states drive one object through its full
//! lifecycle on a bucket unique to this run. Whatever happens along the way,
//! teardown releases everything the check created.
use std::path::PathBuf;
use std::time::Duration;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tempfile::TempDir;
use tokio::time::timeout;

use sonde_util::config::RunConfig;
use sonde_util::time::name_suffix;

use crate::client::build_client;

use super::CheckError;

const OBJECT_KEY: &str = "testfile.txt";
const FIXTURE_CONTENT: &str = "This is a test file.";
const UPDATE_MARKER: &str = "\nAdding a new line.";

/// Time allotted to teardown once the caller deadline is already spent
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the check creates, local and remote.
///
/// Local files live in the temporary directory and disappear with it; the
/// bucket and object are released by `teardown`.
struct Fixture {
	dir: TempDir,
	bucket: String,
	local_path: PathBuf,
	download_path: PathBuf,
}

impl Fixture {
	fn stage() -> Result<Self, CheckError> {
		let dir =
			tempfile::tempdir().map_err(|e| CheckError::FixtureWriteFailed(e.to_string()))?;
		let local_path = dir.path().join(OBJECT_KEY);
		let download_path = dir.path().join(format!("downloaded_{}", OBJECT_KEY));
		std::fs::write(&local_path, FIXTURE_CONTENT)
			.map_err(|e| CheckError::FixtureWriteFailed(e.to_string()))?;

		Ok(Fixture {
			dir,
			bucket: format!("test-bucket-{}", name_suffix()),
			local_path,
			download_path,
		})
	}
}

pub async fn run(cfg: &RunConfig, deadline: Option<Duration>) -> Result<(), CheckError> {
	let client = build_client(cfg, &cfg.credentials);
	let fixture = Fixture::stage()?;
	info!("Running CRUD lifecycle on bucket {}", fixture.bucket);

	let states = lifecycle(&client, &fixture);
	let result = match deadline {
		Some(d) => match timeout(d, states).await {
			Ok(result) => result,
			Err(_) => Err(CheckError::DeadlineExceeded(d)),
		},
		None => states.await,
	};

	// Teardown always runs, on its own clock: an expired caller deadline
	// must not leak the bucket.
	if timeout(TEARDOWN_TIMEOUT, teardown(&client, &fixture))
		.await
		.is_err()
	{
		warn!("Teardown of bucket {} timed out", fixture.bucket);
	}
	drop(fixture.dir);

	result
}

async fn lifecycle(client: &Client, fx: &Fixture) -> Result<(), CheckError> {
	// CreateBucket
	client
		.create_bucket()
		.bucket(&fx.bucket)
		.send()
		.await
		.map_err(|e| {
			CheckError::BucketCreationFailed(
				fx.bucket.clone(),
				DisplayErrorContext(&e).to_string(),
			)
		})?;

	// Upload
	let body = ByteStream::from_path(&fx.local_path)
		.await
		.map_err(|e| CheckError::UploadFailed(e.to_string()))?;
	client
		.put_object()
		.bucket(&fx.bucket)
		.key(OBJECT_KEY)
		.body(body)
		.send()
		.await
		.map_err(|e| CheckError::UploadFailed(DisplayErrorContext(&e).to_string()))?;

	// Download
	let response = client
		.get_object()
		.bucket(&fx.bucket)
		.key(OBJECT_KEY)
		.send()
		.await
		.map_err(|e| CheckError::DownloadFailed(DisplayErrorContext(&e).to_string()))?;
	let data = response
		.body
		.collect()
		.await
		.map_err(|e| CheckError::DownloadFailed(e.to_string()))?
		.into_bytes();
	tokio::fs::write(&fx.download_path, &data)
		.await
		.map_err(|e| CheckError::DownloadFailed(e.to_string()))?;

	// VerifyIntegrity: byte-compare the staged and downloaded files
	let original = tokio::fs::read(&fx.local_path)
		.await
		.map_err(|e| CheckError::DownloadFailed(e.to_string()))?;
	let downloaded = tokio::fs::read(&fx.download_path)
		.await
		.map_err(|e| CheckError::DownloadFailed(e.to_string()))?;
	if original != downloaded {
		return Err(CheckError::IntegrityMismatch);
	}

	// Update: overwrite under the same key
	tokio::fs::write(
		&fx.local_path,
		format!("{}{}", FIXTURE_CONTENT, UPDATE_MARKER),
	)
	.await
	.map_err(|e| CheckError::UpdateFailed(e.to_string()))?;
	let body = ByteStream::from_path(&fx.local_path)
		.await
		.map_err(|e| CheckError::UpdateFailed(e.to_string()))?;
	client
		.put_object()
		.bucket(&fx.bucket)
		.key(OBJECT_KEY)
		.body(body)
		.send()
		.await
		.map_err(|e| CheckError::UpdateFailed(DisplayErrorContext(&e).to_string()))?;

	// Delete
	client
		.delete_object()
		.bucket(&fx.bucket)
		.key(OBJECT_KEY)
		.send()
		.await
		.map_err(|e| CheckError::DeletionFailed(DisplayErrorContext(&e).to_string()))?;

	// VerifyAbsence
	let listing = client
		.list_objects_v2()
		.bucket(&fx.bucket)
		.send()
		.await
		.map_err(|e| CheckError::ListingFailed(DisplayErrorContext(&e).to_string()))?;
	if listing
		.contents()
		.iter()
		.any(|object| object.key() == Some(OBJECT_KEY))
	{
		return Err(CheckError::ObjectStillPresent(OBJECT_KEY.to_string()));
	}

	Ok(())
}

/// Best-effort release of everything the lifecycle may have created.
/// Failures are logged, never escalated: removal of already-absent resources
/// is a normal outcome here and must not mask the primary result.
async fn teardown(client: &Client, fx: &Fixture) {
	if let Err(e) = client
		.delete_object()
		.bucket(&fx.bucket)
		.key(OBJECT_KEY)
		.send()
		.await
	{
		debug!("Teardown, object removal: {}", DisplayErrorContext(&e));
	}
	if let Err(e) = client.delete_bucket().bucket(&fx.bucket).send().await {
		warn!(
			"Teardown, could not remove bucket {}: {}",
			fx.bucket,
			DisplayErrorContext(&e)
		);
	}
	// Local fixture files go away with the TempDir
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stage_writes_the_fixture_content() {
		let fixture = Fixture::stage().unwrap();
		let content = std::fs::read_to_string(&fixture.local_path).unwrap();
		assert_eq!(content, FIXTURE_CONTENT);
		assert!(fixture.local_path.starts_with(fixture.dir.path()));
	}

	#[test]
	fn test_stage_derives_a_timestamped_bucket_name() {
		let fixture = Fixture::stage().unwrap();
		let suffix = fixture.bucket.strip_prefix("test-bucket-").unwrap();
		assert!(suffix.chars().all(|c| c.is_ascii_digit() || c == '-'));
		assert_eq!(suffix.len(), 18);
	}

	#[test]
	fn test_fixture_files_are_released_with_the_tempdir() {
		let fixture = Fixture::stage().unwrap();
		let path = fixture.local_path.clone();
		drop(fixture);
		assert!(!path.exists());
	}
}
