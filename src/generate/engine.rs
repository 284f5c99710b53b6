//! External scheduling engine invocation.
//!
//! The engine is a list of steps, each a program plus arguments. Arguments
//! may carry `{placeholders}` that are filled from the run context. Output is
//! captured to temp files rather than pipes so a chatty step cannot block on
//! a full pipe while we poll for exit.
use crate::error::{Result, ShiftError};
use crate::util::truncate_bytes;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const MAX_CAPTURE_BYTES: usize = 64 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStep {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineStep {
    /// Build a step from a shell-style command line.
    pub fn parse(command: &str) -> std::result::Result<Self, String> {
        let mut words = shell_words::split(command)
            .map_err(|err| format!("parse engine command {command:?}: {err}"))?;
        if words.is_empty() {
            return Err("engine command must not be empty".to_string());
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub steps: Vec<EngineStep>,
    pub timeout: Duration,
}

impl EngineConfig {
    /// Converter then generator, reading scripts from `resources_dir`.
    pub fn python_pipeline(python: &str) -> Self {
        let step = |args: &[&str]| EngineStep {
            program: python.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        };
        Self {
            steps: vec![
                step(&[
                    "{resources_dir}/json_converter.py",
                    "{staged}",
                    "{data_dir}/new.json",
                    "{resources_dir}/rokuyou.json",
                ]),
                step(&[
                    "{resources_dir}/shift_generator.py",
                    "{bundle_name}",
                    "{data_dir}/new.json",
                    "{bundles_dir}",
                ]),
            ],
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Values substituted into step arguments.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub staged: PathBuf,
    pub data_dir: PathBuf,
    pub bundle_name: String,
    pub bundle_dir: PathBuf,
    pub bundles_dir: PathBuf,
    pub resources_dir: PathBuf,
}

impl RunContext {
    pub fn substitute(&self, arg: &str) -> String {
        arg.replace("{staged}", &self.staged.display().to_string())
            .replace("{data_dir}", &self.data_dir.display().to_string())
            .replace("{bundle_name}", &self.bundle_name)
            .replace("{bundle_dir}", &self.bundle_dir.display().to_string())
            .replace("{bundles_dir}", &self.bundles_dir.display().to_string())
            .replace("{resources_dir}", &self.resources_dir.display().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct StepOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u128,
}

/// Run one step to completion, failing with `EngineFailed` on spawn error,
/// timeout, or non-zero exit.
pub fn run_step(index: usize, step: &EngineStep, ctx: &RunContext, timeout: Duration) -> Result<StepOutput> {
    let args: Vec<String> = step.args.iter().map(|arg| ctx.substitute(arg)).collect();
    let program = ctx.substitute(&step.program);
    let mut stdout_file = capture_file(&ctx.data_dir)?;
    let mut stderr_file = capture_file(&ctx.data_dir)?;

    let mut cmd = Command::new(&program);
    cmd.args(&args)
        .current_dir(&ctx.data_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(clone_handle(&stdout_file, &ctx.data_dir)?))
        .stderr(Stdio::from(clone_handle(&stderr_file, &ctx.data_dir)?));

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(|err| ShiftError::EngineFailed {
        step: index,
        exit_code: None,
        stderr: format!("spawn {program}: {err}"),
        stdout: String::new(),
    })?;
    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ShiftError::EngineFailed {
                    step: index,
                    exit_code: None,
                    stderr: format!("wait for {program}: {err}"),
                    stdout: String::new(),
                });
            }
        }
        if start.elapsed() > timeout {
            timed_out = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };
    let duration_ms = start.elapsed().as_millis();
    let stdout = read_capture(&mut stdout_file, &ctx.data_dir)?;
    let mut stderr = read_capture(&mut stderr_file, &ctx.data_dir)?;
    let exit_code = status.and_then(|status| status.code());

    tracing::info!(
        step = index,
        program = %program,
        exit_code = ?exit_code,
        timed_out,
        elapsed_ms = duration_ms,
        "engine step finished"
    );

    let succeeded = status.is_some_and(|status| status.success());
    if succeeded {
        return Ok(StepOutput {
            exit_code,
            stdout,
            stderr,
            duration_ms,
        });
    }
    if timed_out {
        stderr = format!(
            "step timed out after {}s and was killed\n{stderr}",
            timeout.as_secs()
        );
    } else if stderr.trim().is_empty() {
        stderr = match exit_code {
            Some(code) => format!("{program} exited with status {code}"),
            None => format!("{program} was terminated by a signal"),
        };
    }
    Err(ShiftError::EngineFailed {
        step: index,
        exit_code,
        stderr,
        stdout,
    })
}

fn capture_file(dir: &Path) -> Result<File> {
    tempfile::tempfile_in(dir)
        .or_else(|_| tempfile::tempfile())
        .map_err(|err| ShiftError::io("create capture file in", dir, err))
}

fn clone_handle(file: &File, dir: &Path) -> Result<File> {
    file.try_clone()
        .map_err(|err| ShiftError::io("duplicate capture handle in", dir, err))
}

fn read_capture(file: &mut File, dir: &Path) -> Result<String> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_end(&mut bytes))
        .map_err(|err| ShiftError::io("read capture file in", dir, err))?;
    Ok(truncate_bytes(&bytes, MAX_CAPTURE_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(dir: &Path) -> RunContext {
        RunContext {
            staged: dir.join("staging").join("define.json"),
            data_dir: dir.to_path_buf(),
            bundle_name: "shift_main_20250401".to_string(),
            bundle_dir: dir.join("bundles").join("shift_main_20250401"),
            bundles_dir: dir.join("bundles"),
            resources_dir: dir.join("resources"),
        }
    }

    fn sh(script: &str) -> EngineStep {
        EngineStep {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[test]
    fn parse_splits_shell_words() {
        let step = EngineStep::parse("python3 'gen script.py' {staged}").expect("parse");
        assert_eq!(step.program, "python3");
        assert_eq!(step.args, vec!["gen script.py", "{staged}"]);
        assert!(EngineStep::parse("   ").is_err());
        assert!(EngineStep::parse("python3 'unterminated").is_err());
    }

    #[test]
    fn placeholders_are_substituted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let arg = ctx.substitute("{bundles_dir}/{bundle_name}");
        assert_eq!(arg, ctx.bundle_dir.display().to_string());
        assert_eq!(ctx.substitute("--plain"), "--plain");
    }

    #[test]
    fn successful_step_captures_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let output = run_step(0, &sh("echo out; echo err >&2"), &ctx, Duration::from_secs(10))
            .expect("run");
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn step_runs_in_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        run_step(0, &sh("echo here > marker.txt"), &ctx, Duration::from_secs(10)).expect("run");
        assert!(dir.path().join("marker.txt").is_file());
    }

    #[test]
    fn non_zero_exit_reports_diagnostics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let err = run_step(1, &sh("echo partial; exit 3"), &ctx, Duration::from_secs(10))
            .expect_err("failure");
        match err {
            ShiftError::EngineFailed {
                step,
                exit_code,
                stderr,
                stdout,
            } => {
                assert_eq!(step, 1);
                assert_eq!(exit_code, Some(3));
                assert!(!stderr.is_empty());
                assert_eq!(stdout.trim(), "partial");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let step = EngineStep {
            program: "shiftdesk-no-such-engine".to_string(),
            args: Vec::new(),
        };
        let err = run_step(0, &step, &ctx, Duration::from_secs(10)).expect_err("spawn");
        assert_eq!(err.kind(), "EngineFailed");
    }

    #[test]
    fn slow_step_is_killed_at_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let started = Instant::now();
        let err = run_step(0, &sh("sleep 5"), &ctx, Duration::from_millis(200))
            .expect_err("timeout");
        assert!(started.elapsed() < Duration::from_secs(4));
        match err {
            ShiftError::EngineFailed { stderr, exit_code, .. } => {
                assert!(stderr.contains("timed out"), "{stderr}");
                assert_eq!(exit_code, None);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
