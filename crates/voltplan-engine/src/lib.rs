//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
pub mod aggregate;
pub mod api;
pub mod balancer;
pub mod circuit;
pub mod device_load;
pub mod errors;
pub mod export;
pub mod feed;
pub mod io;
pub mod model;
pub mod report;
pub mod state;
pub mod thresholds;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use voltplan_logging::{log_engine_event, vp_warn, EngineEventOutcome, LogContext};

use crate::{
    aggregate::{aggregate, PhaseLoadItem},
    balancer::{balance, PhaseAssignment},
    circuit::{build_circuit_groups, CircuitGroup, SkippedRoom},
    model::{InstallationSnapshot, PanelSettings},
    state::PhaseLoadUiState,
    thresholds::evaluate,
};

pub use errors::{PanelError, Result};

/// A complete computation input: the installation plus the panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseLoadRequest {
    pub snapshot: InstallationSnapshot,
    #[serde(flatten)]
    pub settings: PanelSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseLoadResult {
    pub groups: Vec<CircuitGroup>,
    pub assignment: PhaseAssignment,
    pub phases: Vec<PhaseLoadItem>,
    pub skipped: Vec<SkippedRoom>,
}

/// Runs grouping, balancing, aggregation and threshold evaluation over one snapshot.
///
/// Thresholds and the incomer are validated before any device is looked at.
pub fn compute_phase_load(
    snapshot: &InstallationSnapshot,
    settings: &PanelSettings,
) -> Result<PhaseLoadResult> {
    let installation = snapshot.name.as_deref().unwrap_or("unnamed");
    let context = LogContext::new().with_installation(installation);

    let outcome = run_pipeline(snapshot, settings, &context);
    match &outcome {
        Ok(result) => log_engine_event(
            Some(&context),
            "engine.phase_load",
            &format!(
                "{} circuit groups over {} phase(s), {:.1} W total",
                result.groups.len(),
                result.phases.len(),
                result.phases.iter().map(|p| p.total_power_w).sum::<f64>()
            ),
            EngineEventOutcome::Success,
        ),
        Err(err) => log_engine_event(
            Some(&context),
            "engine.phase_load",
            &err.to_string(),
            EngineEventOutcome::Fault,
        ),
    }
    outcome
}

fn run_pipeline(
    snapshot: &InstallationSnapshot,
    settings: &PanelSettings,
    context: &LogContext,
) -> Result<PhaseLoadResult> {
    settings.thresholds.validate()?;
    settings.incomer.validate(settings.mode)?;

    let grouping = build_circuit_groups(snapshot, &settings.engine)?;
    for skipped in &grouping.skipped {
        vp_warn!(
            context = context.clone().with_room(&skipped.room_name),
            "room skipped: {}",
            skipped.reason
        );
    }
    debug!(groups = grouping.groups.len(), "circuit groups built");

    let assignment = balance(&grouping.groups, settings.mode);
    let phases = aggregate(&grouping.groups, &assignment, settings.mode)?;
    let phases = evaluate(phases, &settings.incomer, &settings.thresholds)?;

    info!(
        mode = %settings.mode,
        imbalance_a = assignment.imbalance_a(),
        "phase load evaluated"
    );

    Ok(PhaseLoadResult {
        groups: grouping.groups,
        assignment,
        phases,
        skipped: grouping.skipped,
    })
}

/// Computes a request and folds the outcome into the presentation contract.
pub fn analyze(request: &PhaseLoadRequest) -> PhaseLoadUiState {
    let outcome = compute_phase_load(&request.snapshot, &request.settings);
    PhaseLoadUiState::from_outcome(&request.settings, outcome)
}
