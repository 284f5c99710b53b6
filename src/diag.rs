//! Environment diagnostics: where data lives and whether the engine can run.
use crate::error::Result;
use crate::generate::{bundle, Generator, RunState};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub data_dir: String,
    pub documents_dir: String,
    pub staging_path: String,
    pub bundles_dir: String,
    pub resources_dir: String,
    pub resources_present: bool,
    pub document_count: usize,
    pub bundle_count: usize,
    pub timeout_secs: u64,
    pub engine: Vec<ProgramCheck>,
    pub run_state: RunState,
}

/// Whether one engine step's program can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramCheck {
    pub step: usize,
    pub program: String,
    pub resolved: Option<String>,
}

impl Diagnostics {
    pub fn engine_available(&self) -> bool {
        self.engine.iter().all(|check| check.resolved.is_some())
    }
}

pub fn collect(generator: &Generator) -> Result<Diagnostics> {
    let paths = generator.store().paths();
    let settings = generator.settings();
    let engine = settings
        .engine
        .steps
        .iter()
        .enumerate()
        .map(|(step, engine_step)| ProgramCheck {
            step,
            program: engine_step.program.clone(),
            resolved: which::which(&engine_step.program)
                .ok()
                .map(|path| path.display().to_string()),
        })
        .collect();
    Ok(Diagnostics {
        data_dir: display(paths.root()),
        documents_dir: display(&paths.documents_dir()),
        staging_path: display(&paths.staging_path()),
        bundles_dir: display(&paths.bundles_dir()),
        resources_dir: display(&settings.resources_dir),
        resources_present: settings.resources_dir.is_dir(),
        document_count: generator.store().list()?.len(),
        bundle_count: bundle::scan(paths)?.len(),
        timeout_secs: settings.engine.timeout.as_secs(),
        engine,
        run_state: generator.status(),
    })
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{EngineConfig, EngineStep, GeneratorSettings};
    use crate::model::ConfigDocument;
    use crate::store::{DataPaths, DocumentStore, StoreLimits};
    use std::time::Duration;

    #[test]
    fn reports_layout_and_missing_programs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(DataPaths::new(dir.path().to_path_buf()), StoreLimits::default());
        store.init().expect("init");
        store.save("main", &ConfigDocument::example()).expect("save");
        let settings = GeneratorSettings {
            engine: EngineConfig {
                steps: vec![
                    EngineStep {
                        program: "sh".to_string(),
                        args: Vec::new(),
                    },
                    EngineStep {
                        program: "shiftdesk-no-such-engine".to_string(),
                        args: Vec::new(),
                    },
                ],
                timeout: Duration::from_secs(30),
            },
            resources_dir: dir.path().join("resources"),
            max_bundles: 10,
        };
        let report = collect(&Generator::new(store, settings)).expect("collect");

        assert_eq!(report.document_count, 1);
        assert_eq!(report.bundle_count, 0);
        assert_eq!(report.timeout_secs, 30);
        assert!(!report.resources_present);
        assert!(report.engine[0].resolved.is_some());
        assert_eq!(report.engine[1].resolved, None);
        assert!(!report.engine_available());
        assert_eq!(report.run_state, RunState::Idle);
    }
}
