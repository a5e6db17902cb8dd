//! Module containing helper functions to derive run-unique names from time
use chrono::Utc;

/// Timestamp suffix used to build bucket names unique to one run, such as
/// `20240101120000-042`.
///
/// The millisecond component keeps names disjoint across concurrent runs
/// started within the same second.
pub fn name_suffix() -> String {
	let now = Utc::now();
	format!(
		"{}-{:03}",
		now.format("%Y%m%d%H%M%S"),
		now.timestamp_subsec_millis()
	)
}
