//! Recorded trigger data and the oracles that replay it
//!
//! A [`Recording`] holds everything the calculator needs for a sequence of
//! runs: the HLT path tables per process, the L1 menus, and per event the
//! fired HLT paths, L1 decisions and prescales. It is stored as JSON.
//!
//! [`RecordedHltOracle`] and [`RecordedSeedOracle`] share one recording
//! through an `Arc` and answer lookups from it.

use crate::config::InputTag;
use crate::oracle::{EventData, RunData, SeedOracle, TriggerPathOracle};
use crate::types::{
    EventId, OracleError, SeedError, SeedExpression, TriggerMenuLite, TriggerResults,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Errors while loading a recording
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse recording: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Duplicate event {0} in recording")]
    DuplicateEvent(EventId),

    #[error("Duplicate run {0} in recording")]
    DuplicateRun(u32),

    #[error("Invalid L1 menu tag \"{0}\" in run {1}")]
    InvalidMenuTag(String, u32),

    #[error("Trigger results tag \"{tag}\" of event {event}: {reason}")]
    InvalidTriggerResults {
        event: EventId,
        tag: String,
        reason: String,
    },
}

/// A sequence of recorded runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub runs: Vec<RunRecord>,

    /// Event id -> (run position, event position)
    #[serde(skip)]
    index: HashMap<EventId, (usize, usize)>,
}

/// One recorded run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: u32,

    /// HLT path tables by process name
    #[serde(default)]
    pub hlt_configs: BTreeMap<String, Vec<PathRecord>>,

    /// L1 menus by encoded input tag, e.g. `"l1GtTriggerMenuLite"`
    #[serde(default)]
    pub l1_menus: BTreeMap<String, TriggerMenuLite>,

    #[serde(default)]
    pub events: Vec<EventRecord>,
}

/// One entry of an HLT path table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    pub name: String,

    #[serde(default)]
    pub l1_seeds: Vec<SeedExpression>,

    /// HLT prescale unless an event overrides it
    #[serde(default = "default_prescale")]
    pub prescale: i32,
}

fn default_prescale() -> i32 {
    1
}

/// Recorded state of one L1 trigger in one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub decision: bool,

    #[serde(default = "default_prescale")]
    pub prescale: i32,

    /// Non-zero marks the lookup as failed
    #[serde(default)]
    pub error_code: i32,
}

/// One recorded event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub lumi: u32,

    pub event: u64,

    /// Accepted HLT path names, by encoded trigger results tag
    #[serde(default)]
    pub trigger_results: BTreeMap<String, Vec<String>>,

    /// L1 trigger state by trigger name
    #[serde(default)]
    pub l1: BTreeMap<String, SeedRecord>,

    /// Per-event HLT prescale overrides by path name
    #[serde(default)]
    pub hlt_prescales: BTreeMap<String, i32>,

    #[serde(skip)]
    run: u32,

    /// Fired bitsets resolved against the run's path tables
    #[serde(skip)]
    resolved: HashMap<InputTag, TriggerResults>,
}

impl Recording {
    /// Load and resolve a recording from a JSON file
    pub fn load(path: &Path) -> Result<Self, RecordError> {
        log::info!("Loading recording: {:?}", path);
        let content = fs::read_to_string(path)?;
        let recording = Self::from_json(&content)?;
        log::info!(
            "Recording loaded: {} runs, {} events",
            recording.runs.len(),
            recording.num_events()
        );
        Ok(recording)
    }

    /// Parse and resolve a recording from JSON text
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let recording: Recording = serde_json::from_str(json)?;
        recording.resolve()
    }

    /// Build a recording from runs assembled in code
    pub fn from_runs(runs: Vec<RunRecord>) -> Result<Self, RecordError> {
        Self {
            runs,
            index: HashMap::new(),
        }
        .resolve()
    }

    /// Index events and turn accepted path names into bitsets
    fn resolve(mut self) -> Result<Self, RecordError> {
        self.index.clear();

        let mut seen_runs = HashSet::with_capacity(self.runs.len());
        for run in &self.runs {
            if !seen_runs.insert(run.run) {
                return Err(RecordError::DuplicateRun(run.run));
            }
        }

        for (run_pos, run) in self.runs.iter_mut().enumerate() {
            // Menus are looked up by canonical tag encoding
            let mut menus = BTreeMap::new();
            for (encoded, menu) in std::mem::take(&mut run.l1_menus) {
                let tag: InputTag = encoded
                    .parse()
                    .map_err(|_| RecordError::InvalidMenuTag(encoded.clone(), run.run))?;
                menus.insert(tag.encode(), menu);
            }
            run.l1_menus = menus;

            for (event_pos, event) in run.events.iter_mut().enumerate() {
                event.run = run.run;
                let id = event.id();
                if self.index.insert(id, (run_pos, event_pos)).is_some() {
                    return Err(RecordError::DuplicateEvent(id));
                }

                event.resolved.clear();
                for (encoded, accepted) in &event.trigger_results {
                    let invalid = |reason: String| RecordError::InvalidTriggerResults {
                        event: id,
                        tag: encoded.clone(),
                        reason,
                    };
                    let tag: InputTag = encoded.parse().map_err(|e| invalid(format!("{}", e)))?;
                    let table = run.hlt_configs.get(tag.process()).ok_or_else(|| {
                        invalid(format!("no HLT configuration for process \"{}\"", tag.process()))
                    })?;

                    let mut fired = Vec::with_capacity(accepted.len());
                    for name in accepted {
                        let index = table
                            .iter()
                            .position(|p| &p.name == name)
                            .ok_or_else(|| invalid(format!("path \"{}\" not in table", name)))?;
                        fired.push(index);
                    }
                    event
                        .resolved
                        .insert(tag, TriggerResults::from_indices(table.len(), fired));
                }
            }
        }

        Ok(self)
    }

    pub fn num_events(&self) -> usize {
        self.runs.iter().map(|r| r.events.len()).sum()
    }

    pub fn run(&self, run: u32) -> Option<&RunRecord> {
        self.runs.iter().find(|r| r.run == run)
    }

    pub fn event(&self, id: &EventId) -> Option<&EventRecord> {
        let (run_pos, event_pos) = *self.index.get(id)?;
        self.runs.get(run_pos)?.events.get(event_pos)
    }

    /// Serialize back to pretty JSON
    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl RunRecord {
    pub fn new(run: u32) -> Self {
        Self {
            run,
            ..Default::default()
        }
    }

    /// Builder method: add an HLT path table for a process
    pub fn with_hlt_config(mut self, process: impl Into<String>, paths: Vec<PathRecord>) -> Self {
        self.hlt_configs.insert(process.into(), paths);
        self
    }

    /// Builder method: add an L1 menu under an encoded input tag
    pub fn with_l1_menu(mut self, tag: impl Into<String>, menu: TriggerMenuLite) -> Self {
        self.l1_menus.insert(tag.into(), menu);
        self
    }

    /// Builder method: append an event
    pub fn with_event(mut self, event: EventRecord) -> Self {
        self.events.push(event);
        self
    }
}

impl RunData for RunRecord {
    fn run(&self) -> u32 {
        self.run
    }

    fn trigger_menu(&self, tag: &InputTag) -> Option<&TriggerMenuLite> {
        self.l1_menus.get(&tag.encode())
    }
}

impl PathRecord {
    pub fn new(name: impl Into<String>, l1_seeds: Vec<SeedExpression>, prescale: i32) -> Self {
        Self {
            name: name.into(),
            l1_seeds,
            prescale,
        }
    }
}

impl SeedRecord {
    pub fn fired(prescale: i32) -> Self {
        Self {
            decision: true,
            prescale,
            error_code: 0,
        }
    }

    pub fn not_fired(prescale: i32) -> Self {
        Self {
            decision: false,
            prescale,
            error_code: 0,
        }
    }
}

impl EventRecord {
    pub fn new(lumi: u32, event: u64) -> Self {
        Self {
            lumi,
            event,
            ..Default::default()
        }
    }

    /// Builder method: set the accepted paths for a trigger results tag
    pub fn with_accepted<I, S>(mut self, tag: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trigger_results
            .insert(tag.into(), paths.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method: record the state of one L1 trigger
    pub fn with_l1(mut self, name: impl Into<String>, seed: SeedRecord) -> Self {
        self.l1.insert(name.into(), seed);
        self
    }

    /// Builder method: override the HLT prescale of a path
    pub fn with_hlt_prescale(mut self, path: impl Into<String>, prescale: i32) -> Self {
        self.hlt_prescales.insert(path.into(), prescale);
        self
    }
}

impl EventData for EventRecord {
    fn id(&self) -> EventId {
        EventId::new(self.run, self.lumi, self.event)
    }

    fn trigger_results(&self, tag: &InputTag) -> Option<&TriggerResults> {
        self.resolved.get(tag)
    }
}

/// HLT oracle answering from a recording
pub struct RecordedHltOracle {
    recording: Arc<Recording>,
    /// Path table of the current run and process
    table: Vec<PathRecord>,
    loaded: bool,
}

impl RecordedHltOracle {
    pub fn new(recording: Arc<Recording>) -> Self {
        Self {
            recording,
            table: Vec::new(),
            loaded: false,
        }
    }

    fn path(&self, name: &str) -> Option<&PathRecord> {
        self.table.iter().find(|p| p.name == name)
    }
}

impl TriggerPathOracle for RecordedHltOracle {
    fn init_run(&mut self, run: u32, process: &str) -> Result<bool, OracleError> {
        let record = self.recording.run(run).ok_or(OracleError::UnknownRun(run))?;
        let table = record
            .hlt_configs
            .get(process)
            .ok_or_else(|| OracleError::UnknownProcess(process.to_string()))?;

        let changed = !self.loaded || self.table != *table;
        self.table = table.clone();
        self.loaded = true;
        Ok(changed)
    }

    fn size(&self) -> usize {
        self.table.len()
    }

    fn trigger_index(&self, path: &str) -> Option<usize> {
        self.table.iter().position(|p| p.name == path)
    }

    fn l1_seeds(&self, path: &str) -> &[SeedExpression] {
        self.path(path).map(|p| p.l1_seeds.as_slice()).unwrap_or(&[])
    }

    fn prescale_value(&self, event: &EventId, path: &str) -> i32 {
        let overridden = self
            .recording
            .event(event)
            .and_then(|e| e.hlt_prescales.get(path).copied());
        overridden
            .or_else(|| self.path(path).map(|p| p.prescale))
            .unwrap_or(-1)
    }
}

/// L1 oracle answering from a recording
pub struct RecordedSeedOracle {
    recording: Arc<Recording>,
}

impl RecordedSeedOracle {
    pub fn new(recording: Arc<Recording>) -> Self {
        Self { recording }
    }

    fn lookup(&self, event: &EventId, name: &str) -> Result<SeedRecord, SeedError> {
        let seed = self
            .recording
            .event(event)
            .and_then(|e| e.l1.get(name))
            .ok_or_else(|| SeedError::UnknownTrigger(name.to_string()))?;
        if seed.error_code != 0 {
            return Err(SeedError::ErrorCode {
                name: name.to_string(),
                code: seed.error_code,
            });
        }
        Ok(*seed)
    }
}

impl SeedOracle for RecordedSeedOracle {
    fn decision(&self, event: &EventId, name: &str) -> Result<bool, SeedError> {
        self.lookup(event, name).map(|s| s.decision)
    }

    fn prescale_factor(&self, event: &EventId, name: &str) -> Result<i32, SeedError> {
        self.lookup(event, name).map(|s| s.prescale)
    }
}
