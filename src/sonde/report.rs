//! Per-check outcomes and the final run report
use std::time::Duration;

use crate::checks::CheckError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
	Passed,
	Failed,
	Skipped,
}

/// Verdict of a single check
#[derive(Debug)]
pub struct CheckOutcome {
	pub name: &'static str,
	pub status: CheckStatus,
	pub detail: Option<String>,
	pub elapsed: Duration,
}

impl CheckOutcome {
	pub fn from_result(
		name: &'static str,
		result: Result<(), CheckError>,
		elapsed: Duration,
	) -> Self {
		match result {
			Ok(()) => CheckOutcome {
				name,
				status: CheckStatus::Passed,
				detail: None,
				elapsed,
			},
			Err(e) => CheckOutcome {
				name,
				status: CheckStatus::Failed,
				detail: Some(e.to_string()),
				elapsed,
			},
		}
	}

	pub fn skipped(name: &'static str, reason: &str) -> Self {
		CheckOutcome {
			name,
			status: CheckStatus::Skipped,
			detail: Some(reason.to_string()),
			elapsed: Duration::ZERO,
		}
	}

	pub fn failed(name: &'static str, detail: String, elapsed: Duration) -> Self {
		CheckOutcome {
			name,
			status: CheckStatus::Failed,
			detail: Some(detail),
			elapsed,
		}
	}
}

/// True iff no executed check failed. Skipped checks do not fail the run.
pub fn all_passed(outcomes: &[CheckOutcome]) -> bool {
	outcomes.iter().all(|o| o.status != CheckStatus::Failed)
}

/// Print the outcome table, one line per check.
pub fn print_report(outcomes: &[CheckOutcome]) {
	print!("{}", render_report(outcomes));
}

fn render_report(outcomes: &[CheckOutcome]) -> String {
	let mut table = vec!["CHECK\tRESULT\tTIME\tDETAIL".to_string()];
	for o in outcomes {
		let result = match o.status {
			CheckStatus::Passed => "ok",
			CheckStatus::Failed => "FAILED",
			CheckStatus::Skipped => "skipped",
		};
		table.push(format!(
			"{}\t{}\t{:.2}s\t{}",
			o.name,
			result,
			o.elapsed.as_secs_f64(),
			o.detail.as_deref().unwrap_or("-"),
		));
	}
	format_table(table)
}

/// Format tab-separated rows into aligned columns.
fn format_table(data: Vec<String>) -> String {
	let rows = data
		.iter()
		.map(|s| s.split('\t').collect::<Vec<_>>())
		.collect::<Vec<_>>();

	let columns = rows.iter().map(|row| row.len()).fold(0, std::cmp::max);
	let mut column_size = vec![0; columns];
	for row in rows.iter() {
		for (i, col) in row.iter().enumerate() {
			column_size[i] = std::cmp::max(column_size[i], col.chars().count());
		}
	}

	let mut out = String::new();
	for row in rows.iter() {
		for (col, col_len) in row[..row.len() - 1].iter().zip(column_size.iter()) {
			out.push_str(col);
			(0..col_len - col.chars().count() + 2).for_each(|_| out.push(' '));
		}
		out.push_str(row[row.len() - 1]);
		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_all_passed_ignores_skipped() {
		let outcomes = vec![
			CheckOutcome::from_result("connectivity", Ok(()), Duration::from_millis(12)),
			CheckOutcome::skipped("authorization", "no read-only credentials configured"),
		];
		assert!(all_passed(&outcomes));
	}

	#[test]
	fn test_any_failure_fails_the_run() {
		let outcomes = vec![
			CheckOutcome::from_result("liveness", Ok(()), Duration::from_millis(3)),
			CheckOutcome::failed(
				"readiness",
				"unexpected status code 503".to_string(),
				Duration::from_millis(5),
			),
		];
		assert!(!all_passed(&outcomes));
	}

	#[test]
	fn test_report_contains_one_line_per_check() {
		let outcomes = vec![
			CheckOutcome::from_result("connectivity", Ok(()), Duration::from_millis(12)),
			CheckOutcome::failed("crud", "boom".to_string(), Duration::from_secs(1)),
		];
		let rendered = render_report(&outcomes);
		let lines: Vec<&str> = rendered.lines().collect();
		assert_eq!(lines.len(), 3);
		assert!(lines[0].starts_with("CHECK"));
		assert!(lines[1].starts_with("connectivity"));
		assert!(lines[2].contains("FAILED"));
		assert!(lines[2].contains("boom"));
	}
}
