//! Prescale Weight Library
//!
//! Computes the combined trigger prescale weight of physics events: for each
//! HLT path of interest that fired, the smallest prescale among its fired L1
//! seeds times the path's HLT prescale, minimised over all such paths.
//!
//! # Architecture
//!
//! This library only computes weights:
//! - Reads HLT tables/prescales and L1 decisions through oracle traits
//! - Parses L1 seed expressions (`OR` only)
//! - Degrades every failure to "skip the path" or the neutral weight 1
//!
//! The library does NOT:
//! - Read trigger data from any framework
//! - Print or write reports
//!
//! Recorded trigger data can be replayed through [`RecordedHltOracle`] and
//! [`RecordedSeedOracle`]; the command-line replay tool lives in
//! prescale-weight-cli.
//!
//! # Example Usage
//!
//! ```no_run
//! use prescale_weight::{
//!     PrescaleWeightProvider, RecordedHltOracle, RecordedSeedOracle, Recording, WeightConfig,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let recording = Arc::new(Recording::load(Path::new("run_160431.json")).unwrap());
//! let config = WeightConfig::new()
//!     .with_hlt_path("HLT_Mu5")
//!     .with_hlt_path("HLT_Jet30");
//!
//! let mut provider = PrescaleWeightProvider::new(
//!     config,
//!     RecordedHltOracle::new(recording.clone()),
//!     RecordedSeedOracle::new(recording.clone()),
//! );
//!
//! for run in &recording.runs {
//!     if let Err(e) = provider.init_run(run) {
//!         eprintln!("Run {} disabled: {}", run.run, e);
//!     }
//!     for event in &run.events {
//!         println!("weight = {}", provider.prescale_weight(event));
//!     }
//! }
//! ```

/// Emit a diagnostic only when the verbosity threshold is above zero
macro_rules! diag {
    ($verbosity:expr, $level:ident, $target:expr, $($arg:tt)+) => {
        if $verbosity > 0 {
            log::$level!(target: $target, $($arg)+)
        }
    };
}

// Public modules
pub mod config;
pub mod oracle;
pub mod provider;
pub mod recording;
pub mod seeds;
pub mod types;

// Re-export main types for convenience
pub use config::{InputTag, WeightConfig};
pub use oracle::{EventData, RunData, SeedOracle, TriggerPathOracle};
pub use provider::{Evaluation, PathOutcome, PrescaleWeightProvider, WeightStatus, NEUTRAL_WEIGHT};
pub use recording::{
    EventRecord, PathRecord, RecordError, RecordedHltOracle, RecordedSeedOracle, Recording,
    RunRecord, SeedRecord,
};
pub use seeds::parse_l1_seeds;
pub use types::{
    ConfigError, EventId, L1Seed, OracleError, Result, RunStatus, SeedError, SeedExpression,
    SeedParseError, TriggerMenuLite, TriggerResults, WeightError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a default configuration has no paths and is rejected
        let recording = std::sync::Arc::new(Recording::default());
        let provider = PrescaleWeightProvider::new(
            WeightConfig::new(),
            RecordedHltOracle::new(recording.clone()),
            RecordedSeedOracle::new(recording),
        );
        assert!(!provider.is_configured());
        assert!(!provider.is_initialized());
    }
}
