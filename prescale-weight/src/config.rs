//! Calculator configuration types
//!
//! This module defines the static configuration of the prescale weight
//! calculator: which HLT paths are of interest, and where the trigger
//! products live. The configuration is fixed once the calculator is built.

use crate::types::{ConfigError, WeightError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product locator in `label:instance:process` form
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InputTag {
    label: String,
    instance: String,
    process: String,
}

impl InputTag {
    pub fn new(
        label: impl Into<String>,
        instance: impl Into<String>,
        process: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            instance: instance.into(),
            process: process.into(),
        }
    }

    /// Tag with only a module label
    pub fn label_only(label: impl Into<String>) -> Self {
        Self::new(label, "", "")
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    /// Canonical string form, trailing empty fields dropped
    pub fn encode(&self) -> String {
        if !self.process.is_empty() {
            format!("{}:{}:{}", self.label, self.instance, self.process)
        } else if !self.instance.is_empty() {
            format!("{}:{}", self.label, self.instance)
        } else {
            self.label.clone()
        }
    }
}

impl FromStr for InputTag {
    type Err = WeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(':').collect();
        match fields.as_slice() {
            [label] => Ok(Self::label_only(*label)),
            [label, instance] => Ok(Self::new(*label, *instance, "")),
            [label, instance, process] => Ok(Self::new(*label, *instance, *process)),
            _ => Err(WeightError::InvalidInputTag(s.to_string())),
        }
    }
}

impl TryFrom<String> for InputTag {
    type Error = WeightError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InputTag> for String {
    fn from(tag: InputTag) -> Self {
        tag.encode()
    }
}

impl fmt::Display for InputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Configuration for the prescale weight calculator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Diagnostics are only emitted when this is above zero
    #[serde(default, alias = "prescale_weight_verbosity_level")]
    pub verbosity: u32,

    /// Location of the per-event HLT decisions; the process selects the HLT menu
    #[serde(
        default = "default_trigger_results",
        alias = "prescale_weight_trigger_results"
    )]
    pub trigger_results: InputTag,

    /// Location of the run-scoped L1 menu
    #[serde(
        default = "default_l1_menu",
        alias = "prescale_weight_l1_gt_trigger_menu_lite"
    )]
    pub l1_menu: InputTag,

    /// HLT paths of interest, in evaluation order
    #[serde(default, alias = "prescale_weight_hlt_paths")]
    pub hlt_paths: Vec<String>,
}

fn default_trigger_results() -> InputTag {
    InputTag::new("TriggerResults", "", "HLT")
}

fn default_l1_menu() -> InputTag {
    InputTag::label_only("l1GtTriggerMenuLite")
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            trigger_results: default_trigger_results(),
            l1_menu: default_l1_menu(),
            hlt_paths: Vec::new(),
        }
    }
}

impl WeightConfig {
    /// Create a new configuration with default settings (no paths, so not yet valid)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set diagnostic verbosity
    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Builder method: set the trigger results tag
    pub fn with_trigger_results(mut self, tag: InputTag) -> Self {
        self.trigger_results = tag;
        self
    }

    /// Builder method: set the L1 menu tag
    pub fn with_l1_menu(mut self, tag: InputTag) -> Self {
        self.l1_menu = tag;
        self
    }

    /// Builder method: append one HLT path of interest
    pub fn with_hlt_path(mut self, path: impl Into<String>) -> Self {
        self.hlt_paths.push(path.into());
        self
    }

    /// Builder method: replace the HLT paths of interest
    pub fn with_hlt_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hlt_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Report the first configuration problem, if any
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_results.process().is_empty() {
            Err(ConfigError::MissingProcess)
        } else if self.trigger_results.label().is_empty() {
            Err(ConfigError::MissingTriggerResultsLabel)
        } else if self.l1_menu.label().is_empty() {
            Err(ConfigError::MissingMenuLabel)
        } else if self.hlt_paths.is_empty() {
            Err(ConfigError::NoHltPaths)
        } else {
            Ok(())
        }
    }
}
