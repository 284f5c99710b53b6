//! Staging and running the external scheduling engine.
//!
//! A run moves through `Idle -> Staged -> Running -> Succeeded | Failed`.
//! Only one run may be in flight: `stage` or `run` while `Running` fails
//! with `Busy`. Staging again replaces the pending token, so a caller can
//! only run the document it staged itself.
use crate::error::{Result, ShiftError};
use crate::model::ConfigDocument;
use crate::staging::SlotSnapshot;
use crate::store::{DocumentStore, STAGING_NAME};
use crate::util::{now_epoch_ms, sha256_hex};
use crate::validate::validate;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

pub mod bundle;
pub mod engine;

pub use bundle::BundleInfo;
pub use engine::{EngineConfig, EngineStep, RunContext};

const TOKEN_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Staged {
        token: String,
        source: String,
    },
    Running {
        token: String,
        source: String,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        source: String,
        bundle_id: String,
    },
    Failed {
        source: String,
        reason: String,
    },
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHandle {
    pub bundle_id: String,
    pub download_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedRun {
    pub run_token: String,
    pub source_name: String,
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub engine: EngineConfig,
    pub resources_dir: PathBuf,
    pub max_bundles: usize,
}

pub struct Generator {
    store: DocumentStore,
    settings: GeneratorSettings,
    state: Mutex<RunState>,
    nonce: AtomicU64,
}

impl Generator {
    pub fn new(store: DocumentStore, settings: GeneratorSettings) -> Self {
        Self {
            store,
            settings,
            state: Mutex::new(RunState::Idle),
            nonce: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn status(&self) -> RunState {
        self.lock_state().clone()
    }

    /// Validate `source_name` and copy it into the staging slot.
    ///
    /// The source is loaded and validated before the run lock is taken; the
    /// lock covers only the busy check, the slot write and the transition.
    pub fn stage(&self, source_name: &str) -> Result<StagedRun> {
        if matches!(self.status(), RunState::Running { .. }) {
            return Err(ShiftError::Busy);
        }
        if source_name == STAGING_NAME {
            return Err(ShiftError::InvalidName {
                name: source_name.to_string(),
                reason: "the staging slot cannot be staged",
            });
        }
        let doc = self.store.load(source_name)?;
        let violations = validate(&doc);
        if !violations.is_empty() {
            return Err(ShiftError::ValidationFailed(violations));
        }
        let mut state = self.lock_state();
        if matches!(*state, RunState::Running { .. }) {
            return Err(ShiftError::Busy);
        }
        self.store.save(STAGING_NAME, &doc)?;
        let token = self.next_token(source_name);
        if let RunState::Staged { token: previous, .. } = &*state {
            tracing::info!(superseded = %previous, "replacing staged run");
        }
        *state = RunState::Staged {
            token: token.clone(),
            source: source_name.to_string(),
        };
        tracing::info!(source = source_name, token = %token, "staged document");
        Ok(StagedRun {
            run_token: token,
            source_name: source_name.to_string(),
        })
    }

    /// Run the engine against the staged document. Blocks until the engine
    /// finishes; callers on an async runtime should use a blocking task.
    pub fn run(&self, token: &str) -> Result<RunHandle> {
        let source = {
            let mut state = self.lock_state();
            let source = match &*state {
                RunState::Running { .. } => return Err(ShiftError::Busy),
                RunState::Staged {
                    token: staged,
                    source,
                } if staged == token => source.clone(),
                _ => return Err(ShiftError::NotStaged(token.to_string())),
            };
            *state = RunState::Running {
                token: token.to_string(),
                source: source.clone(),
                started_at: Utc::now(),
            };
            source
        };

        let outcome = self.execute(&source);
        let mut state = self.lock_state();
        *state = match &outcome {
            Ok(handle) => RunState::Succeeded {
                source,
                bundle_id: handle.bundle_id.clone(),
            },
            Err(err) => RunState::Failed {
                source,
                reason: err.to_string(),
            },
        };
        outcome
    }

    /// Stage and run in one call.
    pub fn generate(&self, source_name: &str) -> Result<RunHandle> {
        let staged = self.stage(source_name)?;
        self.run(&staged.run_token)
    }

    pub fn fetch(&self, bundle_id: &str) -> Result<Vec<u8>> {
        bundle::archive(self.store.paths(), bundle_id)
    }

    pub fn list_bundles(&self) -> Result<Vec<BundleInfo>> {
        bundle::list(self.store.paths(), self.settings.max_bundles)
    }

    /// The document currently in the staging slot.
    pub fn staged_document(&self) -> Result<ConfigDocument> {
        self.store.load(STAGING_NAME)
    }

    fn execute(&self, source: &str) -> Result<RunHandle> {
        let paths = self.store.paths();
        let bundle_name = bundle::bundle_name(source, Local::now().date_naive());
        let ctx = RunContext {
            staged: paths.staging_path(),
            data_dir: paths.root().to_path_buf(),
            bundle_dir: paths.bundle_dir(&bundle_name),
            bundles_dir: paths.bundles_dir(),
            bundle_name,
            resources_dir: self.settings.resources_dir.clone(),
        };
        fs::create_dir_all(&ctx.bundles_dir)
            .map_err(|err| ShiftError::io("create", ctx.bundles_dir.clone(), err))?;
        let snapshot = SlotSnapshot::capture(&ctx.staged)?;
        let bundle_existed = ctx.bundle_dir.exists();
        let start = Instant::now();

        if let Err(err) = self.run_steps(&ctx) {
            self.roll_back(&snapshot, &ctx, bundle_existed);
            tracing::warn!(
                bundle = %ctx.bundle_name,
                elapsed_ms = start.elapsed().as_millis(),
                error = %err,
                "generation failed"
            );
            return Err(err);
        }

        tracing::info!(
            bundle = %ctx.bundle_name,
            elapsed_ms = start.elapsed().as_millis(),
            "generation succeeded"
        );
        let evicted =
            bundle::enforce_retention(paths, self.settings.max_bundles, &ctx.bundle_name);
        if !evicted.is_empty() {
            tracing::debug!(?evicted, "bundle retention");
        }
        Ok(RunHandle {
            download_ref: format!("/bundles/{}", ctx.bundle_name),
            bundle_id: ctx.bundle_name,
        })
    }

    fn run_steps(&self, ctx: &RunContext) -> Result<()> {
        let steps = &self.settings.engine.steps;
        let mut last_stdout = String::new();
        for (index, step) in steps.iter().enumerate() {
            let output = engine::run_step(index, step, ctx, self.settings.engine.timeout)?;
            last_stdout = output.stdout;
        }
        if !ctx.bundle_dir.is_dir() {
            return Err(ShiftError::EngineFailed {
                step: steps.len().saturating_sub(1),
                exit_code: Some(0),
                stderr: format!(
                    "engine finished without creating bundle {}",
                    self.store.paths().rel_path(&ctx.bundle_dir)
                ),
                stdout: last_stdout,
            });
        }
        Ok(())
    }

    fn roll_back(&self, snapshot: &SlotSnapshot, ctx: &RunContext, bundle_existed: bool) {
        match snapshot.restore() {
            Ok(true) => tracing::warn!(path = %snapshot.path().display(), "restored staging slot"),
            Ok(false) => {}
            Err(err) => tracing::warn!(error = %err, "failed to restore staging slot"),
        }
        if !bundle_existed && ctx.bundle_dir.exists() {
            if let Err(err) = fs::remove_dir_all(&ctx.bundle_dir) {
                tracing::warn!(bundle = %ctx.bundle_name, error = %err, "failed to remove partial bundle");
            }
        }
    }

    fn next_token(&self, source: &str) -> String {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let seed = format!("{source}:{}:{nonce}:{}", now_epoch_ms(), std::process::id());
        let mut token = sha256_hex(seed.as_bytes());
        token.truncate(TOKEN_LEN);
        token
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
#[path = "generate_tests.rs"]
mod tests;
