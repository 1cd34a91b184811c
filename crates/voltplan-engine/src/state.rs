//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::PhaseLoadItem,
    circuit::SkippedRoom,
    errors::Result,
    model::{IncomerSpec, PanelSettings, PhaseMode},
    thresholds::{LoadStatus, LoadThresholds},
    PhaseLoadResult,
};

/// Snapshot handed to the presentation layer after each recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseLoadUiState {
    pub phases: Vec<PhaseLoadItem>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub phase_mode: PhaseMode,
    pub incomer: IncomerSpec,
    pub thresholds: LoadThresholds,
    #[serde(default)]
    pub skipped_rooms: Vec<SkippedRoom>,
}

impl PhaseLoadUiState {
    pub fn loading(settings: &PanelSettings) -> Self {
        Self {
            phases: Vec::new(),
            is_loading: true,
            error: None,
            phase_mode: settings.mode,
            incomer: settings.incomer.clone(),
            thresholds: settings.thresholds,
            skipped_rooms: Vec::new(),
        }
    }

    pub fn from_outcome(settings: &PanelSettings, outcome: Result<PhaseLoadResult>) -> Self {
        let mut state = Self::loading(settings);
        state.is_loading = false;
        match outcome {
            Ok(result) => {
                state.phases = result.phases;
                state.skipped_rooms = result.skipped;
            }
            Err(err) => state.error = Some(err.to_string()),
        }
        state
    }

    /// Worst status across phases and their groups.
    pub fn worst_status(&self) -> LoadStatus {
        self.phases
            .iter()
            .flat_map(|phase| {
                std::iter::once(phase.status).chain(phase.groups.iter().map(|g| g.status))
            })
            .max()
            .unwrap_or_default()
    }

    pub fn total_power_w(&self) -> f64 {
        self.phases.iter().map(|p| p.total_power_w).sum()
    }
}
