//! Configuration loading and parsing

use anyhow::{Context, Result};
use prescale_weight::WeightConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub prescale_weight: WeightConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    pub file: Option<PathBuf>,
    /// Include one row per event, not only the summary
    #[serde(default = "default_true")]
    pub per_event: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            file: None,
            per_event: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Err(e) = config.prescale_weight.validate() {
        log::warn!("Configuration {:?} disables weighting: {}", path, e);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [prescale_weight]
            prescale_weight_verbosity_level = 1
            prescale_weight_trigger_results = "TriggerResults::HLT"
            prescale_weight_l1_gt_trigger_menu_lite = "l1GtTriggerMenuLite"
            prescale_weight_hlt_paths = ["HLT_Mu5", "HLT_Jet30"]

            [output]
            format = "json"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.prescale_weight.verbosity, 1);
        assert_eq!(config.prescale_weight.hlt_paths.len(), 2);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.per_event);
        assert!(config.output.file.is_none());
    }

    #[test]
    fn test_short_field_names() {
        let toml_content = r#"
            [prescale_weight]
            verbosity = 2
            trigger_results = "TriggerResults::REDIGI"
            hlt_paths = ["HLT_Photon20"]
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.prescale_weight.verbosity, 2);
        assert_eq!(config.prescale_weight.trigger_results.process(), "REDIGI");
        assert_eq!(config.output.format, OutputFormat::Txt);
        assert!(config.output.per_event);
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[prescale_weight]").unwrap();
        writeln!(file, "hlt_paths = [\"HLT_Mu5\"]").unwrap();
        writeln!(file, "[output]").unwrap();
        writeln!(file, "per_event = false").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.prescale_weight.hlt_paths, vec!["HLT_Mu5"]);
        assert_eq!(config.prescale_weight.l1_menu.label(), "l1GtTriggerMenuLite");
        assert!(!config.output.per_event);
    }

    #[test]
    fn test_bad_input_tag_rejected() {
        let toml_content = r#"
            [prescale_weight]
            trigger_results = "a:b:c:d"
        "#;
        assert!(toml::from_str::<AppConfig>(toml_content).is_err());
    }
}
