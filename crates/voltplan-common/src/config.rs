//! ---
//! vp_section: "01-core-functionality"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Shared configuration and tracing setup for VoltPlan binaries."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use voltplan_engine::{
    circuit::validate_ladder,
    model::{EngineSettings, IncomerSpec, PanelSettings, PhaseMode},
    thresholds::LoadThresholds,
};

use crate::logging::LogFormat;

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_export_directory() -> PathBuf {
    PathBuf::from("reports")
}

/// Primary configuration object for VoltPlan tooling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub thresholds: LoadThresholds,
    #[serde(default)]
    pub incomer: IncomerSpec,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "VOLTPLAN_CONFIG";

    /// Load configuration from disk, respecting the `VOLTPLAN_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants before anything reaches the engine.
    pub fn validate(&self) -> Result<()> {
        self.thresholds
            .validate()
            .context("invalid [thresholds] section")?;
        self.incomer
            .validate(self.engine.phase_mode)
            .context("invalid [incomer] section")?;
        validate_ladder(&self.engine.settings.breaker_ladder_a).context("invalid [engine] section")?;
        let ceiling = self.engine.settings.max_circuit_current_a;
        if !(ceiling.is_finite() && ceiling > 0.0) {
            return Err(anyhow!(
                "engine.max_circuit_current_a must be positive, got {}",
                ceiling
            ));
        }
        Ok(())
    }

    /// Panel settings for the engine, optionally overriding the configured phase mode.
    pub fn panel_settings(&self, mode_override: Option<PhaseMode>) -> PanelSettings {
        PanelSettings {
            incomer: self.incomer.clone(),
            thresholds: self.thresholds,
            mode: mode_override.unwrap_or(self.engine.phase_mode),
            engine: self.engine.settings.clone(),
        }
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub phase_mode: PhaseMode,
    #[serde(flatten)]
    pub settings: EngineSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            phase_mode: PhaseMode::default(),
            settings: EngineSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_directory")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_export_directory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use voltplan_engine::model::{DevicePolicy, IncomerKind, TripCurve};

    const SAMPLE: &str = r#"
[logging]
format = "structured-json"

[engine]
phase_mode = "single"
max_circuit_current_a = 25.0
device_policy = "skip_room"

[thresholds]
warn_pct = 55.0
alert_pct = 85.0

[incomer]
kind = "rcbo"
poles = 2
breaker_rating_a = 40.0
trip_curve = "B"
breaking_capacity_ka = 6.0
rcd_sensitivity_ma = 30
"#;

    #[test]
    fn parses_full_document() {
        let config = AppConfig::from_str(SAMPLE).unwrap();
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
        assert_eq!(config.engine.phase_mode, PhaseMode::Single);
        assert_eq!(config.engine.settings.max_circuit_current_a, 25.0);
        assert_eq!(config.engine.settings.device_policy, DevicePolicy::SkipRoom);
        assert_eq!(config.engine.settings.breaker_ladder_a.len(), 9);
        assert_eq!(config.incomer.kind, IncomerKind::Rcbo);
        assert_eq!(config.incomer.trip_curve, TripCurve::B);
        assert_eq!(config.export.output_dir, PathBuf::from("reports"));

        let settings = config.panel_settings(None);
        assert_eq!(settings.mode, PhaseMode::Single);
        assert_eq!(settings.thresholds.warn_pct, 55.0);
        assert_eq!(settings.engine.max_circuit_current_a, 25.0);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_str("").unwrap();
        assert_eq!(config.thresholds, LoadThresholds::default());
        assert_eq!(config.engine.phase_mode, PhaseMode::Three);
        assert_eq!(config.incomer.poles, 4);
    }

    #[test]
    fn mode_override_is_applied() {
        let config = AppConfig::default();
        let settings = config.panel_settings(Some(PhaseMode::Single));
        assert_eq!(settings.mode, PhaseMode::Single);
    }

    #[test]
    fn invalid_sections_are_rejected() {
        let thresholds = "[thresholds]\nwarn_pct = 90.0\nalert_pct = 80.0\n";
        let err = AppConfig::from_str(thresholds).unwrap_err();
        assert!(format!("{err:#}").contains("thresholds"));

        let ladder = "[engine]\nbreaker_ladder_a = [16.0, 10.0]\n";
        assert!(AppConfig::from_str(ladder).is_err());

        // Three-phase default mode with a 2-pole incomer.
        let incomer = "[incomer]\npoles = 2\nbreaker_rating_a = 32.0\nbreaking_capacity_ka = 6.0\nrcd_sensitivity_ma = 30\n";
        assert!(AppConfig::from_str(incomer).is_err());
    }

    #[test]
    fn load_with_source_picks_first_existing_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("voltplan.toml");
        fs::write(&present, SAMPLE).unwrap();

        let loaded = AppConfig::load_with_source(&[&missing, &present]).unwrap();
        assert_eq!(loaded.source, present);
        assert_eq!(loaded.config.incomer.breaker_rating_a, 40.0);

        let err = AppConfig::load_with_source(&[&missing]).unwrap_err();
        assert!(err.to_string().contains("no configuration files found"));
    }
}
