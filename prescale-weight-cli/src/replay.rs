//! Replaying recordings through the weight provider
//!
//! Each recording file is one stream: a fresh provider sees its runs and
//! events strictly in order. Independent files run in parallel.

use anyhow::{Context, Result};
use prescale_weight::{
    EventData, EventId, PathOutcome, PrescaleWeightProvider, RecordedHltOracle,
    RecordedSeedOracle, Recording, RunStatus, WeightConfig, WeightStatus,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Weights computed for one recording file
#[derive(Debug, Clone, Serialize)]
pub struct StreamReport {
    pub source: PathBuf,
    pub runs: Vec<RunReport>,
}

/// Initialisation result and event weights of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run: u32,
    /// Set when the run was initialised
    pub status: Option<RunStatus>,
    /// Set when initialisation failed
    pub error: Option<String>,
    pub events: Vec<EventWeight>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventWeight {
    pub id: EventId,
    pub weight: u64,
    pub status: WeightStatus,
    /// Path that determined the weight, if any
    pub dominant_path: Option<String>,
}

/// Replay every file, one provider per file
pub fn replay_files(files: &[PathBuf], config: &WeightConfig) -> Result<Vec<StreamReport>> {
    files
        .par_iter()
        .map(|file| replay_file(file, config))
        .collect()
}

/// Replay one recording file
pub fn replay_file(path: &Path, config: &WeightConfig) -> Result<StreamReport> {
    let recording = Recording::load(path)
        .with_context(|| format!("Failed to load recording: {:?}", path))?;
    Ok(replay(path.to_path_buf(), Arc::new(recording), config))
}

/// Replay an already loaded recording
pub fn replay(source: PathBuf, recording: Arc<Recording>, config: &WeightConfig) -> StreamReport {
    let mut provider = PrescaleWeightProvider::new(
        config.clone(),
        RecordedHltOracle::new(recording.clone()),
        RecordedSeedOracle::new(recording.clone()),
    );

    let mut runs = Vec::with_capacity(recording.runs.len());
    for run in &recording.runs {
        let (status, error) = match provider.init_run(run) {
            Ok(status) => (Some(status), None),
            Err(e) => {
                log::debug!("Run {} of {:?} not initialised: {}", run.run, source, e);
                (None, Some(e.to_string()))
            }
        };

        let events = run
            .events
            .iter()
            .map(|event| {
                let evaluation = provider.evaluate(event);
                let dominant_path = (evaluation.status == WeightStatus::Computed)
                    .then(|| dominant_path(&evaluation.paths, evaluation.weight))
                    .flatten();
                EventWeight {
                    id: event.id(),
                    weight: evaluation.weight,
                    status: evaluation.status,
                    dominant_path,
                }
            })
            .collect();

        runs.push(RunReport {
            run: run.run,
            status,
            error,
            events,
        });
    }

    StreamReport { source, runs }
}

/// First path whose candidate equals the event weight
fn dominant_path(paths: &[(String, PathOutcome)], weight: u64) -> Option<String> {
    paths.iter().find_map(|(name, outcome)| match outcome {
        PathOutcome::Prescaled { candidate, .. } if u64::try_from(*candidate).ok() == Some(weight) => {
            Some(name.clone())
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prescale_weight::{EventRecord, PathRecord, RunRecord, SeedExpression, SeedRecord, TriggerMenuLite};

    fn recording() -> Recording {
        let table = vec![
            PathRecord::new("HLT_Mu5", vec![SeedExpression::algorithmic("L1_SingleMu3 OR L1_SingleMu5")], 2),
            PathRecord::new("HLT_Jet30", vec![SeedExpression::algorithmic("L1_SingleJet16")], 1),
        ];
        let good = RunRecord::new(1)
            .with_hlt_config("HLT", table.clone())
            .with_l1_menu("l1GtTriggerMenuLite", TriggerMenuLite::new("L1Menu_Test"))
            .with_event(
                EventRecord::new(1, 10)
                    .with_accepted("TriggerResults::HLT", ["HLT_Mu5", "HLT_Jet30"])
                    .with_l1("L1_SingleMu3", SeedRecord::fired(3))
                    .with_l1("L1_SingleMu5", SeedRecord::fired(5))
                    .with_l1("L1_SingleJet16", SeedRecord::fired(4)),
            )
            .with_event(EventRecord::new(1, 11).with_accepted("TriggerResults::HLT", Vec::<String>::new()));
        // No L1 menu: whole run disabled
        let no_menu = RunRecord::new(2)
            .with_hlt_config("HLT", table)
            .with_event(
                EventRecord::new(1, 20)
                    .with_accepted("TriggerResults::HLT", ["HLT_Mu5"])
                    .with_l1("L1_SingleMu3", SeedRecord::fired(3)),
            );
        Recording::from_runs(vec![good, no_menu]).unwrap()
    }

    #[test]
    fn test_replay_weights() {
        let config = WeightConfig::new().with_hlt_paths(["HLT_Mu5", "HLT_Jet30"]);
        let report = replay(PathBuf::from("memory"), Arc::new(recording()), &config);

        assert_eq!(report.runs.len(), 2);
        let run = &report.runs[0];
        assert_eq!(run.status, Some(RunStatus::Changed));
        // HLT_Mu5: 3 x 2 = 6, HLT_Jet30: 4 x 1 = 4
        assert_eq!(run.events[0].weight, 4);
        assert_eq!(run.events[0].dominant_path.as_deref(), Some("HLT_Jet30"));
        assert_eq!(run.events[1].weight, 1);
        assert_eq!(run.events[1].status, WeightStatus::NoCandidate);

        let run = &report.runs[1];
        assert!(run.status.is_none());
        assert!(run.error.as_deref().unwrap().contains("l1GtTriggerMenuLite"));
        assert_eq!(run.events[0].weight, 1);
        assert_eq!(run.events[0].status, WeightStatus::Disabled);
    }

    #[test]
    fn test_replay_files_in_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let json = recording().to_json().unwrap();
        let files: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("stream{}.json", i));
                std::fs::write(&path, &json).unwrap();
                path
            })
            .collect();

        let config = WeightConfig::new().with_hlt_path("HLT_Mu5");
        let reports = replay_files(&files, &config).unwrap();
        assert_eq!(reports.len(), 3);
        for (report, file) in reports.iter().zip(&files) {
            assert_eq!(&report.source, file);
            assert_eq!(report.runs[0].events[0].weight, 6);
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let config = WeightConfig::new().with_hlt_path("HLT_Mu5");
        assert!(replay_file(Path::new("/nonexistent/recording.json"), &config).is_err());
    }
}
