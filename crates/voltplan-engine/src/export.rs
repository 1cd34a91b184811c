//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use std::{fs, path::Path};

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{errors::Result, report::PanelReport, state::PhaseLoadUiState};

pub const PHASE_LOAD_FILE: &str = "phase_load.json";
pub const PANEL_REPORT_FILE: &str = "panel_report.json";

#[derive(Debug)]
pub struct ReportExporter<'a> {
    state: &'a PhaseLoadUiState,
    report: &'a PanelReport,
}

impl<'a> ReportExporter<'a> {
    pub fn new(state: &'a PhaseLoadUiState, report: &'a PanelReport) -> Self {
        Self { state, report }
    }

    pub fn export_all(&self, output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let timestamp = self.report.meta.generated_at.to_rfc3339();
        let installation = self.report.meta.installation.clone();

        let phase_envelope = ReportEnvelope::new(
            &timestamp,
            installation.clone(),
            phase_load_schema(),
            self.state,
        );
        let report_envelope =
            ReportEnvelope::new(&timestamp, installation, panel_report_schema(), self.report);

        write_json(output_dir.join(PHASE_LOAD_FILE), &phase_envelope)?;
        write_json(output_dir.join(PANEL_REPORT_FILE), &report_envelope)?;

        info!("Reports exported to {}", output_dir.display());
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    timestamp: &'a str,
    installation: Option<String>,
    schema: serde_json::Value,
    data: &'a T,
}

impl<'a, T: Serialize> ReportEnvelope<'a, T> {
    fn new(
        timestamp: &'a str,
        installation: Option<String>,
        schema: serde_json::Value,
        data: &'a T,
    ) -> Self {
        Self {
            timestamp,
            installation,
            schema,
            data,
        }
    }
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn phase_load_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "PhaseLoadUiState",
        "type": "object",
        "properties": {
            "phases": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "phase": {"type": "string", "enum": ["A", "B", "C", "L"]},
                        "total_power_w": {"type": "number"},
                        "total_current_a": {"type": "number"},
                        "utilization_pct": {"type": "number"},
                        "status": {"type": "string", "enum": ["OK", "WARN", "ALERT"]},
                        "groups": {"type": "array"}
                    },
                    "required": ["phase", "total_power_w", "total_current_a", "status", "groups"]
                }
            },
            "is_loading": {"type": "boolean"},
            "error": {"type": ["string", "null"]},
            "phase_mode": {"type": "string", "enum": ["single", "three"]},
            "incomer": {"type": "object"},
            "thresholds": {
                "type": "object",
                "properties": {
                    "warn_pct": {"type": "number"},
                    "alert_pct": {"type": "number"}
                },
                "required": ["warn_pct", "alert_pct"]
            }
        },
        "required": ["phases", "is_loading", "phase_mode", "incomer", "thresholds"]
    })
}

fn panel_report_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "PanelReport",
        "type": "object",
        "properties": {
            "meta": {
                "type": "object",
                "properties": {
                    "installation": {"type": ["string", "null"]},
                    "generated_at": {"type": "string", "format": "date-time"},
                    "incomer": {"type": "string"},
                    "total_power": {"type": "string"},
                    "phase_currents": {"type": "object", "additionalProperties": {"type": "string"}}
                },
                "required": ["generated_at", "incomer", "total_power", "phase_currents"]
            },
            "phases": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "phase": {"type": "string"},
                        "power": {"type": "string"},
                        "current": {"type": "string"},
                        "utilization": {"type": "string"},
                        "groups": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "title": {"type": "string"},
                                    "breaker": {"type": "string"},
                                    "devices": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "properties": {
                                                "name": {"type": "string"},
                                                "spec": {"type": "string"}
                                            },
                                            "required": ["name", "spec"]
                                        }
                                    }
                                },
                                "required": ["title", "breaker", "devices"]
                            }
                        }
                    },
                    "required": ["phase", "power", "current", "groups"]
                }
            }
        },
        "required": ["meta", "phases"]
    })
}
