//! Core types for the prescale weight library
//!
//! This module defines the run- and event-scoped trigger data the calculator
//! reads, plus the error types it reports. None of these types carry any
//! weighting logic; they are plain views over what the oracles supply.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Result type for prescale weight operations
pub type Result<T> = std::result::Result<T, WeightError>;

/// Identifies one event within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId {
    /// Run number
    pub run: u32,
    /// Luminosity block within the run
    pub lumi: u32,
    /// Event number within the run
    pub event: u64,
}

impl EventId {
    pub fn new(run: u32, lumi: u32, event: u64) -> Self {
        Self { run, lumi, event }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.run, self.lumi, self.event)
    }
}

/// One L1 seeding entry of an HLT path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedExpression {
    /// True if the expression names technical trigger bits
    #[serde(default)]
    pub technical: bool,
    /// Logical seed expression, e.g. `"L1_SingleMu3 OR L1_SingleMu5"`
    pub expression: String,
}

impl SeedExpression {
    /// Seed expression over algorithmic triggers (identified by name)
    pub fn algorithmic(expression: impl Into<String>) -> Self {
        Self {
            technical: false,
            expression: expression.into(),
        }
    }

    /// Seed expression over technical triggers (identified by bit number)
    pub fn technical(expression: impl Into<String>) -> Self {
        Self {
            technical: true,
            expression: expression.into(),
        }
    }
}

/// A single parsed L1 seed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L1Seed {
    /// Algorithmic trigger, identified by name
    Algorithm(String),
    /// Technical trigger, identified by bit number in the L1 menu
    TechnicalBit(u32),
}

impl fmt::Display for L1Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            L1Seed::Algorithm(name) => write!(f, "{}", name),
            L1Seed::TechnicalBit(bit) => write!(f, "tech bit {}", bit),
        }
    }
}

/// Per-event HLT decision bitset, indexed by position in the HLT path table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResults {
    accept: Vec<bool>,
}

impl TriggerResults {
    /// Build a bitset of `size` entries with the given indices set
    pub fn from_indices(size: usize, fired: impl IntoIterator<Item = usize>) -> Self {
        let mut accept = vec![false; size];
        for index in fired {
            if let Some(bit) = accept.get_mut(index) {
                *bit = true;
            }
        }
        Self { accept }
    }

    /// Whether the path at `index` fired. Out-of-range indices never fire.
    pub fn accept(&self, index: usize) -> bool {
        self.accept.get(index).copied().unwrap_or(false)
    }

    pub fn size(&self) -> usize {
        self.accept.len()
    }
}

/// Run-scoped snapshot of the L1 trigger menu
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMenuLite {
    /// Menu name, informational
    #[serde(default)]
    pub name: String,
    /// Technical trigger names by bit number
    #[serde(default)]
    pub technical_triggers: BTreeMap<u32, String>,
}

impl TriggerMenuLite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder method: register a technical trigger bit
    pub fn with_technical_trigger(mut self, bit: u32, name: impl Into<String>) -> Self {
        self.technical_triggers.insert(bit, name.into());
        self
    }

    /// Resolve a technical trigger bit to its name
    pub fn technical_trigger_name(&self, bit: u32) -> std::result::Result<&str, SeedError> {
        self.technical_triggers
            .get(&bit)
            .map(String::as_str)
            .ok_or(SeedError::UnknownTechnicalBit(bit))
    }
}

/// Outcome of a successful run refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// HLT configuration is the same as for the previous run
    Unchanged,
    /// HLT configuration differs from the previous run
    Changed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Unchanged => write!(f, "unchanged"),
            RunStatus::Changed => write!(f, "changed"),
        }
    }
}

/// Errors reported by the calculator
#[derive(Debug, thiserror::Error)]
pub enum WeightError {
    #[error("Run initialisation failed due to failing configuration")]
    NotConfigured,

    #[error("HLT config initialization error with process name \"{process}\": {source}")]
    HltConfig {
        process: String,
        #[source]
        source: OracleError,
    },

    #[error("HLT config size error")]
    EmptyHltConfig,

    #[error("L1GtTriggerMenuLite with label \"{0}\" not found")]
    MissingTriggerMenu(String),

    #[error("Invalid input tag \"{0}\"")]
    InvalidInputTag(String),
}

/// Configuration problems, reported in validation order
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Process name not configured via TriggerResults InputTag")]
    MissingProcess,

    #[error("TriggerResults label not configured")]
    MissingTriggerResultsLabel,

    #[error("L1GtTriggerMenuLite label not configured")]
    MissingMenuLabel,

    #[error("HLT paths of interest not configured")]
    NoHltPaths,
}

/// Failures of the HLT path oracle while refreshing for a run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("no HLT configuration for process \"{0}\"")]
    UnknownProcess(String),

    #[error("no data for run {0}")]
    UnknownRun(u32),

    #[error("{0}")]
    Other(String),
}

/// Failures of a single L1 seed lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    #[error("L1 trigger \"{0}\" not in menu")]
    UnknownTrigger(String),

    #[error("technical trigger bit {0} not in menu")]
    UnknownTechnicalBit(u32),

    #[error("L1 lookup for \"{name}\" returned error code {code}")]
    ErrorCode { name: String, code: i32 },
}

/// Seed expression parse failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedParseError {
    #[error("empty seed expression")]
    Empty,

    #[error("Only supported logical expression is OR (found \"{0}\")")]
    Unsupported(String),

    #[error("invalid technical trigger bit \"{0}\"")]
    InvalidTechnicalBit(String),
}
