//! Report generation
//!
//! Renders replay results as a plain-text table or as JSON.

use crate::config::OutputFormat;
use crate::replay::StreamReport;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Totals over all streams
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub streams: usize,
    pub runs: usize,
    pub disabled_runs: usize,
    pub events: usize,
    /// Saturates at `u64::MAX`
    pub sum_of_weights: u64,
    /// Number of events per weight value
    pub weights: BTreeMap<u64, usize>,
}

impl Summary {
    pub fn from_reports(reports: &[StreamReport]) -> Self {
        let mut summary = Summary {
            streams: reports.len(),
            ..Default::default()
        };
        for run in reports.iter().flat_map(|r| &r.runs) {
            summary.runs += 1;
            if run.status.is_none() {
                summary.disabled_runs += 1;
            }
            for event in &run.events {
                summary.events += 1;
                summary.sum_of_weights = summary.sum_of_weights.saturating_add(event.weight);
                *summary.weights.entry(event.weight).or_insert(0) += 1;
            }
        }
        summary
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: DateTime<Utc>,
    version: &'a str,
    summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    streams: Option<&'a [StreamReport]>,
}

/// Render all stream reports in the requested format
pub fn render(
    format: OutputFormat,
    reports: &[StreamReport],
    per_event: bool,
    generated: DateTime<Utc>,
) -> Result<String> {
    let summary = Summary::from_reports(reports);
    match format {
        OutputFormat::Json => {
            let report = JsonReport {
                generated,
                version: prescale_weight::VERSION,
                summary,
                streams: per_event.then_some(reports),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Txt => Ok(render_txt(reports, &summary, per_event, generated)?),
    }
}

fn render_txt(
    reports: &[StreamReport],
    summary: &Summary,
    per_event: bool,
    generated: DateTime<Utc>,
) -> std::result::Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "═══════════════════════════════════════════════")?;
    writeln!(out, "  Prescale Weight Report")?;
    writeln!(out, "  Generated: {}", generated.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "═══════════════════════════════════════════════")?;

    for stream in reports {
        writeln!(out, "\n📄 {}", stream.source.display())?;
        for run in &stream.runs {
            match (&run.status, &run.error) {
                (Some(status), _) => writeln!(out, "  Run {} (HLT config {})", run.run, status)?,
                (None, Some(error)) => writeln!(out, "  Run {} DISABLED: {}", run.run, error)?,
                (None, None) => writeln!(out, "  Run {} DISABLED", run.run)?,
            }
            if !per_event {
                continue;
            }
            for event in &run.events {
                writeln!(
                    out,
                    "    {:>8} {:>12}  weight {:>6}  {:?}{}",
                    event.id.lumi,
                    event.id.event,
                    event.weight,
                    event.status,
                    event
                        .dominant_path
                        .as_deref()
                        .map(|p| format!(" ({})", p))
                        .unwrap_or_default()
                )?;
            }
        }
    }

    writeln!(out, "\n───────────────────────────────────────────────")?;
    writeln!(out, "📊 Summary:")?;
    writeln!(out, "  Streams:        {}", summary.streams)?;
    writeln!(out, "  Runs:           {} ({} disabled)", summary.runs, summary.disabled_runs)?;
    writeln!(out, "  Events:         {}", summary.events)?;
    writeln!(out, "  Sum of weights: {}", summary.sum_of_weights)?;
    for (weight, count) in &summary.weights {
        writeln!(out, "    weight {:>6}: {} events", weight, count)?;
    }

    Ok(out)
}
