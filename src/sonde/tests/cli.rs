//! Tests of the process contract that need no storage endpoint
use crate::common::*;

#[test]
fn test_missing_configuration_is_fatal_and_lists_everything() {
	let output = harness_command()
		.env_clear()
		.arg("connectivity")
		.output()
		.expect("Could not run harness");

	assert_eq!(output.status.code(), Some(1));

	let stderr = String::from_utf8_lossy(&output.stderr);
	for var in ["MINIO_SERVER", "MINIO_ACCESS_KEY", "MINIO_SECRET_KEY"] {
		assert!(
			stderr.contains(var),
			"missing variable {} not reported in: {}",
			var,
			stderr
		);
	}
}

#[test]
fn test_missing_configuration_reports_only_absent_variables() {
	let output = harness_command()
		.env_clear()
		.env("MINIO_SERVER", "localhost")
		.arg("connectivity")
		.output()
		.expect("Could not run harness");

	assert_eq!(output.status.code(), Some(1));

	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(!stderr.contains("\"MINIO_SERVER\""));
	assert!(stderr.contains("MINIO_ACCESS_KEY"));
	assert!(stderr.contains("MINIO_SECRET_KEY"));
}

#[test]
fn test_configuration_summary_hides_secrets() {
	// The endpoint is unreachable; only the configuration banner matters here
	let output = harness_command()
		.env_clear()
		.env("MINIO_SERVER", "127.0.0.1")
		.env("MINIO_PORT", "1")
		.env("MINIO_ACCESS_KEY", "super-secret-access-key")
		.env("MINIO_SECRET_KEY", "super-secret-secret-key")
		.arg("connectivity")
		.output()
		.expect("Could not run harness");

	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("MINIO_ACCESS_KEY is set: true"));
	assert!(!stdout.contains("super-secret-access-key"));
	assert!(!stdout.contains("super-secret-secret-key"));
}

#[test]
fn test_help_describes_the_checks() {
	let output = harness_command()
		.arg("--help")
		.expect_success_output("Could not run harness with --help");

	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("Conformance harness"));
	for subcommand in ["connectivity", "health", "crud", "bench"] {
		assert!(stdout.contains(subcommand));
	}
}
