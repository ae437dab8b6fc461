//! Combined HLT x L1 prescale weight
//!
//! [`PrescaleWeightProvider`] is the entry point of the library. It is built
//! once from a [`WeightConfig`], refreshed with [`init_run`] at the start of
//! every run, and then asked for one weight per event.
//!
//! For every configured HLT path that fired, the effective L1 prescale is the
//! smallest prescale among its fired seeds, and the path's candidate weight is
//! that L1 prescale times the path's HLT prescale. The event weight is the
//! smallest candidate. Whenever no weight can be determined the neutral
//! weight 1 is returned; nothing here ever fails an event.
//!
//! [`init_run`]: PrescaleWeightProvider::init_run

use crate::config::WeightConfig;
use crate::oracle::{EventData, RunData, SeedOracle, TriggerPathOracle};
use crate::types::{ConfigError, EventId, L1Seed, Result, RunStatus, TriggerMenuLite, WeightError};
use serde::Serialize;

/// Weight returned whenever no prescale combination applies
pub const NEUTRAL_WEIGHT: u64 = 1;

const TARGET: &str = "PrescaleWeightProvider";
const WEIGHT_TARGET: &str = "PrescaleWeightProvider::prescale_weight";

/// What happened to one configured HLT path during an evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// Path is not in the current HLT table
    Unknown,
    /// Path did not fire
    NotFired,
    /// Path has other than exactly one seed expression; evaluation stopped here
    SeedCountMismatch { count: usize },
    /// Seed expression could not be parsed
    Unparseable { reason: String },
    /// No seed fired with a valid prescale
    NoL1Prescale,
    /// Path produced a prescale product
    Prescaled {
        l1_prescale: i32,
        hlt_prescale: i32,
        candidate: i64,
    },
}

/// Why an evaluation ended with the weight it has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStatus {
    /// Minimum candidate across prescaled paths
    Computed,
    /// Provider not configured or not initialised for this run
    Disabled,
    /// Trigger results product missing from the event
    MissingTriggerResults,
    /// A path with a seed count mismatch forced the neutral weight
    Aborted,
    /// No path produced a positive candidate
    NoCandidate,
}

/// Full result of evaluating one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub weight: u64,
    pub status: WeightStatus,
    /// Outcome per inspected path, in configuration order
    pub paths: Vec<(String, PathOutcome)>,
}

impl Evaluation {
    fn neutral(status: WeightStatus, paths: Vec<(String, PathOutcome)>) -> Self {
        Self {
            weight: NEUTRAL_WEIGHT,
            status,
            paths,
        }
    }
}

/// Computes per-event prescale weights from an HLT and an L1 oracle
///
/// One instance serves one sequential stream of runs and events; every run
/// must be announced through [`init_run`](Self::init_run) before its events.
pub struct PrescaleWeightProvider<H, L> {
    config: WeightConfig,
    configured: bool,
    initialized: bool,
    hlt: H,
    l1: L,
    /// L1 menu of the current run
    menu: Option<TriggerMenuLite>,
}

impl<H, L> PrescaleWeightProvider<H, L>
where
    H: TriggerPathOracle,
    L: SeedOracle,
{
    /// Create a provider. An invalid configuration disables it permanently.
    pub fn new(config: WeightConfig, hlt: H, l1: L) -> Self {
        let configured = match config.validate() {
            Ok(()) => true,
            Err(err) => {
                match err {
                    ConfigError::NoHltPaths => diag!(config.verbosity, error, TARGET, "{}", err),
                    _ => diag!(config.verbosity, warn, TARGET, "{}", err),
                }
                false
            }
        };

        Self {
            config,
            configured,
            initialized: false,
            hlt,
            l1,
            menu: None,
        }
    }

    pub fn config(&self) -> &WeightConfig {
        &self.config
    }

    /// False if the configuration was rejected at construction
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// True if the last [`init_run`](Self::init_run) succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn hlt_oracle(&self) -> &H {
        &self.hlt
    }

    pub fn seed_oracle(&self) -> &L {
        &self.l1
    }

    /// L1 menu snapshot of the current run, if initialised
    pub fn trigger_menu(&self) -> Option<&TriggerMenuLite> {
        self.menu.as_ref()
    }

    /// Refresh the HLT configuration and L1 menu for a new run
    ///
    /// On error the provider is disabled until the next successful call and
    /// returns the neutral weight for every event in between.
    pub fn init_run<R: RunData + ?Sized>(&mut self, run: &R) -> Result<RunStatus> {
        self.initialized = false;
        self.menu = None;
        let verbosity = self.config.verbosity;

        if !self.configured {
            let err = WeightError::NotConfigured;
            diag!(verbosity, warn, TARGET, "{}", err);
            return Err(err);
        }

        let process = self.config.trigger_results.process();
        let changed = match self.hlt.init_run(run.run(), process) {
            Ok(changed) => changed,
            Err(source) => {
                let err = WeightError::HltConfig {
                    process: process.to_string(),
                    source,
                };
                diag!(verbosity, error, TARGET, "{}", err);
                return Err(err);
            }
        };

        if self.hlt.size() == 0 {
            let err = WeightError::EmptyHltConfig;
            diag!(verbosity, error, TARGET, "{}", err);
            return Err(err);
        }

        let status = if changed {
            diag!(verbosity, info, TARGET, "HLT configuration changed");
            RunStatus::Changed
        } else {
            RunStatus::Unchanged
        };

        let Some(menu) = run.trigger_menu(&self.config.l1_menu) else {
            let err = WeightError::MissingTriggerMenu(self.config.l1_menu.label().to_string());
            diag!(verbosity, error, TARGET, "{}", err);
            return Err(err);
        };

        self.menu = Some(menu.clone());
        self.initialized = true;
        if verbosity > 1 {
            log::debug!(target: TARGET, "Initialised run {} ({})", run.run(), status);
        }
        Ok(status)
    }

    /// Combined prescale weight of one event, at least 1
    pub fn prescale_weight<E: EventData + ?Sized>(&self, event: &E) -> u64 {
        self.evaluate(event).weight
    }

    /// Evaluate one event, keeping the per-path outcomes
    pub fn evaluate<E: EventData + ?Sized>(&self, event: &E) -> Evaluation {
        let verbosity = self.config.verbosity;

        let Some(menu) = self.menu.as_ref().filter(|_| self.initialized) else {
            return Evaluation::neutral(WeightStatus::Disabled, Vec::new());
        };

        let Some(results) = event.trigger_results(&self.config.trigger_results) else {
            diag!(
                verbosity,
                error,
                WEIGHT_TARGET,
                "TriggerResults product not found for InputTag \"{}\"",
                self.config.trigger_results
            );
            return Evaluation::neutral(WeightStatus::MissingTriggerResults, Vec::new());
        };

        let id = event.id();
        let mut paths = Vec::with_capacity(self.config.hlt_paths.len());
        let mut weight: Option<u64> = None;

        for path in &self.config.hlt_paths {
            let outcome = self.evaluate_path(&id, menu, |index| results.accept(index), path);
            let aborted = matches!(outcome, PathOutcome::SeedCountMismatch { .. });
            if let PathOutcome::Prescaled { candidate, .. } = &outcome {
                if let Ok(candidate) = u64::try_from(*candidate) {
                    if candidate > 0 {
                        weight = Some(weight.map_or(candidate, |w| w.min(candidate)));
                    }
                }
            }
            paths.push((path.clone(), outcome));
            if aborted {
                return Evaluation::neutral(WeightStatus::Aborted, paths);
            }
        }

        match weight {
            Some(weight) => Evaluation {
                weight,
                status: WeightStatus::Computed,
                paths,
            },
            None => {
                diag!(
                    verbosity,
                    warn,
                    WEIGHT_TARGET,
                    "No valid weight for any requested HLT path, returning default weight of {}",
                    NEUTRAL_WEIGHT
                );
                Evaluation::neutral(WeightStatus::NoCandidate, paths)
            }
        }
    }

    fn evaluate_path(
        &self,
        event: &EventId,
        menu: &TriggerMenuLite,
        fired: impl Fn(usize) -> bool,
        path: &str,
    ) -> PathOutcome {
        let verbosity = self.config.verbosity;

        let Some(index) = self.hlt.trigger_index(path) else {
            diag!(verbosity, error, WEIGHT_TARGET, "HLT path \"{}\" does not exist", path);
            return PathOutcome::Unknown;
        };
        if !fired(index) {
            return PathOutcome::NotFired;
        }

        let expression = match self.hlt.l1_seeds(path) {
            [expression] => expression,
            expressions => {
                diag!(
                    verbosity,
                    error,
                    WEIGHT_TARGET,
                    "HLT path \"{}\" provides {} L1 seed expressions, expected exactly one",
                    path,
                    expressions.len()
                );
                return PathOutcome::SeedCountMismatch {
                    count: expressions.len(),
                };
            }
        };

        let seeds = match expression.parse() {
            Ok(seeds) => seeds,
            Err(err) => {
                diag!(
                    verbosity,
                    warn,
                    WEIGHT_TARGET,
                    "Failed to parse L1 seeds for HLT path \"{}\": {}",
                    path,
                    err
                );
                return PathOutcome::Unparseable {
                    reason: err.to_string(),
                };
            }
        };

        let Some(l1_prescale) = self.l1_prescale(event, menu, &seeds) else {
            diag!(
                verbosity,
                error,
                WEIGHT_TARGET,
                "Unable to find the L1 prescale for HLT path \"{}\"",
                path
            );
            return PathOutcome::NoL1Prescale;
        };

        let hlt_prescale = self.hlt.prescale_value(event, path);
        let candidate = i64::from(l1_prescale) * i64::from(hlt_prescale);
        if verbosity > 1 {
            log::debug!(
                target: WEIGHT_TARGET,
                "{}: path={} l1_prescale={} hlt_prescale={} candidate={}",
                event,
                path,
                l1_prescale,
                hlt_prescale,
                candidate
            );
        }

        PathOutcome::Prescaled {
            l1_prescale,
            hlt_prescale,
            candidate,
        }
    }

    /// Smallest positive prescale among the fired seeds
    fn l1_prescale(&self, event: &EventId, menu: &TriggerMenuLite, seeds: &[L1Seed]) -> Option<i32> {
        seeds
            .iter()
            .filter_map(|seed| self.seed_prescale(event, menu, seed))
            .filter(|prescale| *prescale > 0)
            .min()
    }

    fn seed_prescale(&self, event: &EventId, menu: &TriggerMenuLite, seed: &L1Seed) -> Option<i32> {
        let name = match seed {
            L1Seed::Algorithm(name) => name.as_str(),
            L1Seed::TechnicalBit(bit) => match menu.technical_trigger_name(*bit) {
                Ok(name) => name,
                Err(err) => {
                    self.trace_seed(event, seed, &err);
                    return None;
                }
            },
        };

        match self.l1.decision(event, name) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                self.trace_seed(event, seed, &err);
                return None;
            }
        }

        match self.l1.prescale_factor(event, name) {
            Ok(prescale) => Some(prescale),
            Err(err) => {
                self.trace_seed(event, seed, &err);
                None
            }
        }
    }

    fn trace_seed(&self, event: &EventId, seed: &L1Seed, err: &dyn std::error::Error) {
        if self.config.verbosity > 1 {
            log::debug!(target: WEIGHT_TARGET, "{}: ignoring L1 seed {}: {}", event, seed, err);
        }
    }
}
