//! Runs the compiled binaries on the instances in `tests/instances`.
#![allow(
    dead_code,
    reason = "is used in integration tests but unable to find a way to silence these warnings"
)]

use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use wait_timeout::ChildExt;

#[derive(Debug)]
pub(crate) struct Run {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl Run {
    /// The `(meeting, timeslot)` lines of a printed schedule.
    pub(crate) fn schedule(&self) -> Vec<(usize, i32)> {
        let line = Regex::new(r"(?m)^(\d+) (\d+)$").expect("valid regex");
        line.captures_iter(&self.stdout)
            .map(|captures| {
                (
                    captures[1].parse().expect("meeting index"),
                    captures[2].parse().expect("timeslot"),
                )
            })
            .collect()
    }

    /// The rows of printed agent calendars.
    pub(crate) fn calendars(&self) -> Vec<Vec<i32>> {
        let line = Regex::new(r"(?m)^agent: \d+: \|(.*)\|$").expect("valid regex");
        line.captures_iter(&self.stdout)
            .map(|captures| {
                captures[1]
                    .split('|')
                    .map(|value| value.parse().expect("calendar entry"))
                    .collect()
            })
            .collect()
    }

    pub(crate) fn makespan(&self) -> i32 {
        self.schedule()
            .into_iter()
            .map(|(_, timeslot)| timeslot)
            .max()
            .expect("a schedule was printed")
    }
}

pub(crate) fn instance_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("instances")
        .join(name)
}

pub(crate) fn run_solver(instance: &str, args: &[&str], prefix: &str) -> Run {
    run_binary(
        env!("CARGO_BIN_EXE_msp-solver"),
        instance_path(instance),
        args,
        prefix,
    )
}

pub(crate) fn run_converter(input: &str, args: &[&str], prefix: &str) -> Run {
    run_binary(
        env!("CARGO_BIN_EXE_msp-convert"),
        instance_path(input),
        args,
        prefix,
    )
}

/// Runs `binary` on `input`, redirecting its output to files next to the input which are named
/// after `prefix`, so that tests running in parallel do not share them.
fn run_binary(binary: &str, input: PathBuf, args: &[&str], prefix: &str) -> Run {
    const TEST_TIMEOUT: Duration = Duration::from_secs(60);

    let log_file_path = input.with_extension(format!("{prefix}.log"));
    let err_file_path = input.with_extension(format!("{prefix}.err"));

    let mut command = Command::new(binary);
    for arg in args {
        let _ = command.arg(arg);
    }

    let mut child = command
        .arg(&input)
        .stdout(File::create(&log_file_path).expect("Failed to create log file."))
        .stderr(File::create(&err_file_path).expect("Failed to create error file."))
        .stdin(Stdio::null())
        .spawn()
        .expect("Failed to run binary.");

    let status = match child.wait_timeout(TEST_TIMEOUT) {
        Ok(None) => panic!("binary took more than {} seconds", TEST_TIMEOUT.as_secs()),
        Ok(Some(status)) => status,
        Err(e) => panic!("error starting binary: {e}"),
    };

    let stdout = std::fs::read_to_string(&log_file_path).expect("Failed to read log file.");
    let stderr = std::fs::read_to_string(&err_file_path).expect("Failed to read error file.");
    std::fs::remove_file(log_file_path).expect("Failed to remove log file.");
    std::fs::remove_file(err_file_path).expect("Failed to remove error file.");

    Run {
        status,
        stdout,
        stderr,
    }
}
