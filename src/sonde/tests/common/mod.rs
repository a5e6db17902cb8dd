#![allow(dead_code)]

use std::process;

/// Command running the compiled harness binary
pub fn harness_command() -> process::Command {
	process::Command::new(env!("CARGO_BIN_EXE_sonde"))
}

pub trait CommandExt {
	fn expect_success_output(&mut self, msg: &str) -> process::Output;
}

impl CommandExt for process::Command {
	fn expect_success_output(&mut self, msg: &str) -> process::Output {
		let output = self.output().expect(msg);
		if !output.status.success() {
			panic!(
				"{}: command {:?} exited with error {:?}\nSTDOUT: {}\nSTDERR: {}",
				msg,
				self,
				output.status.code(),
				String::from_utf8_lossy(&output.stdout),
				String::from_utf8_lossy(&output.stderr)
			);
		}
		output
	}
}
