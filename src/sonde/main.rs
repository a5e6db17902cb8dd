//! sonde, a black-box conformance harness for S3-compatible object stores
//!
//! The harness treats the service under test as an opaque HTTP(S) endpoint:
//! it probes reachability and health, exercises the authentication and
//! authorization contracts, and drives a full object lifecycle, reporting
//! one verdict per check. The process exits non-zero if any check fails.

#[macro_use]
extern crate tracing;

mod checks;
mod client;
mod report;

use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use structopt::StructOpt;

use sonde_util::config::RunConfig;

use checks::Check;

#[derive(StructOpt, Debug)]
#[structopt(
	name = "sonde",
	about = "Conformance harness for S3-compatible object stores"
)]
struct Opt {
	/// Use a secure (TLS) connection to the server under test
	#[structopt(long = "use-tls")]
	pub use_tls: bool,

	/// Bound each check to this many seconds; cleanup still runs on expiry
	#[structopt(long = "deadline")]
	pub deadline: Option<u64>,

	#[structopt(subcommand)]
	cmd: Option<Command>,
}

#[derive(StructOpt, Debug)]
enum Command {
	/// Run every conformance check (the default)
	#[structopt(name = "all")]
	All,

	/// DNS, TCP and HTTP reachability of the endpoint
	#[structopt(name = "connectivity")]
	Connectivity,

	/// Liveness and readiness health probes
	#[structopt(name = "health")]
	Health,

	/// Valid and invalid credential handling
	#[structopt(name = "authentication")]
	Authentication,

	/// Privilege enforcement for read-only credentials
	#[structopt(name = "authorization")]
	Authorization,

	/// Full object lifecycle with byte-exact round-trip verification
	#[structopt(name = "crud")]
	Crud,

	/// Upload/download throughput measurement (not a conformance check)
	#[structopt(name = "bench")]
	Bench(BenchOpt),
}

#[derive(StructOpt, Debug)]
struct BenchOpt {
	/// Number of objects to upload and download
	#[structopt(long = "count", default_value = "8")]
	pub count: usize,

	/// Size of each object in bytes
	#[structopt(long = "size", default_value = "1048576")]
	pub size: usize,
}

#[tokio::main]
async fn main() {
	init_logging();

	let opt = Opt::from_args();

	let cfg = match RunConfig::from_env(opt.use_tls) {
		Ok(cfg) => Arc::new(cfg),
		Err(e) => {
			eprintln!("Error initializing configuration: {}", e);
			exit(1);
		}
	};
	cfg.print_summary();

	let deadline = opt.deadline.map(Duration::from_secs);

	let selection: &[Check] = match opt.cmd.unwrap_or(Command::All) {
		Command::All => &Check::ALL,
		Command::Connectivity => &[Check::Connectivity],
		Command::Health => &[Check::Liveness, Check::Readiness],
		Command::Authentication => &[Check::Authentication],
		Command::Authorization => &[Check::Authorization],
		Command::Crud => &[Check::Crud],
		Command::Bench(bench_opt) => {
			match checks::bench::run(&cfg, bench_opt.count, bench_opt.size).await {
				Ok(bench_report) => {
					bench_report.print();
					exit(0);
				}
				Err(e) => {
					eprintln!("Benchmark failed: {}", e);
					exit(1);
				}
			}
		}
	};

	let outcomes = checks::run_checks(selection, cfg, deadline).await;
	report::print_report(&outcomes);

	if !report::all_passed(&outcomes) {
		exit(1);
	}
}

fn init_logging() {
	if std::env::var("RUST_LOG").is_err() {
		std::env::set_var("RUST_LOG", "sonde=info")
	}

	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
		.init();
}
