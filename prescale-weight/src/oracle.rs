//! Capability interfaces the calculator reads trigger data through
//!
//! The calculator never owns trigger data. HLT path tables and prescales come
//! from a [`TriggerPathOracle`], L1 decisions and prescales from a
//! [`SeedOracle`], and the run/event products from [`RunData`] and
//! [`EventData`]. Any of them can be replaced by a fake in tests.

use crate::config::InputTag;
use crate::types::{EventId, OracleError, SeedError, SeedExpression, TriggerMenuLite, TriggerResults};

/// HLT configuration and prescale provider
pub trait TriggerPathOracle {
    /// Load the HLT configuration of `process` for `run`
    ///
    /// Returns whether the configuration changed with respect to the
    /// previously loaded one.
    fn init_run(&mut self, run: u32, process: &str) -> Result<bool, OracleError>;

    /// Number of paths in the current table
    fn size(&self) -> usize;

    /// Position of `path` in the current table
    fn trigger_index(&self, path: &str) -> Option<usize>;

    /// L1 seeding entries of `path`; empty for unknown paths
    fn l1_seeds(&self, path: &str) -> &[SeedExpression];

    /// HLT prescale applied to `path` for this event
    fn prescale_value(&self, event: &EventId, path: &str) -> i32;
}

/// L1 decision and prescale provider
pub trait SeedOracle {
    /// Whether the named L1 trigger fired in this event
    fn decision(&self, event: &EventId, name: &str) -> Result<bool, SeedError>;

    /// Prescale factor applied to the named L1 trigger for this event
    fn prescale_factor(&self, event: &EventId, name: &str) -> Result<i32, SeedError>;
}

/// Run-scoped products
pub trait RunData {
    fn run(&self) -> u32;

    fn trigger_menu(&self, tag: &InputTag) -> Option<&TriggerMenuLite>;
}

/// Event-scoped products
pub trait EventData {
    fn id(&self) -> EventId;

    fn trigger_results(&self, tag: &InputTag) -> Option<&TriggerResults>;
}

impl<T: TriggerPathOracle + ?Sized> TriggerPathOracle for Box<T> {
    fn init_run(&mut self, run: u32, process: &str) -> Result<bool, OracleError> {
        (**self).init_run(run, process)
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn trigger_index(&self, path: &str) -> Option<usize> {
        (**self).trigger_index(path)
    }

    fn l1_seeds(&self, path: &str) -> &[SeedExpression] {
        (**self).l1_seeds(path)
    }

    fn prescale_value(&self, event: &EventId, path: &str) -> i32 {
        (**self).prescale_value(event, path)
    }
}

impl<T: SeedOracle + ?Sized> SeedOracle for Box<T> {
    fn decision(&self, event: &EventId, name: &str) -> Result<bool, SeedError> {
        (**self).decision(event, name)
    }

    fn prescale_factor(&self, event: &EventId, name: &str) -> Result<i32, SeedError> {
        (**self).prescale_factor(event, name)
    }
}
