//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SHIFTDESK_VARS: &[&str] = &[
    "SHIFTDESK_DATA_DIR",
    "SHIFTDESK_BIND",
    "SHIFTDESK_RESOURCES_DIR",
    "SHIFTDESK_ENGINE_COMMAND",
    "SHIFTDESK_ENGINE_TIMEOUT_SECS",
    "SHIFTDESK_PYTHON_BIN",
];

/// Engine that copies the staged document into a fresh bundle directory.
pub const COPYING_ENGINE: &str =
    "sh -c 'mkdir -p {bundle_dir} && cp {staged} {bundle_dir}/input.json && echo generated'";

/// Engine that scribbles over the staging slot and then fails.
pub const FAILING_ENGINE: &str =
    "sh -c 'mkdir -p {bundle_dir}; echo clobbered > {staged}; echo solver exploded >&2; exit 3'";

/// An isolated data directory plus a way to run the `shiftdesk` binary
/// against it.
pub struct TestEnv {
    pub dir: TempDir,
    engine: String,
}

impl TestEnv {
    pub fn setup() -> Self {
        Self::with_engine(COPYING_ENGINE)
    }

    pub fn with_engine(engine: &str) -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
            engine: engine.to_string(),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn staging_path(&self) -> PathBuf {
        self.data_dir().join("staging").join("define.json")
    }

    /// Run `shiftdesk --data-dir <tmp> <args>` with the test engine.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_shiftdesk"));
        for var in SHIFTDESK_VARS {
            cmd.env_remove(var);
        }
        cmd.env("SHIFTDESK_ENGINE_COMMAND", &self.engine)
            .env("RUST_LOG", "warn")
            .current_dir(self.dir.path())
            .arg("--data-dir")
            .arg(self.data_dir())
            .args(args);
        cmd.output().expect("run shiftdesk")
    }

    /// Run and require success, returning stdout.
    pub fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "shiftdesk {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Run and require failure, returning stderr.
    pub fn fails(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "shiftdesk {args:?} unexpectedly succeeded: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let bytes = std::fs::read(path).expect("read json");
    serde_json::from_slice(&bytes).expect("parse json")
}
