//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
//! Human-readable projection of a computed panel. Formatting only; every number shown here was
//! computed upstream.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{PhaseDeviceItem, PhaseGroupItem, PhaseLoadItem},
    model::{IncomerSpec, PhaseMode, TripCurve},
    state::PhaseLoadUiState,
    thresholds::{LoadStatus, LoadThresholds},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelReport {
    pub meta: ReportMeta,
    pub phases: Vec<ReportPhase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub installation: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub incomer: String,
    pub phase_mode: PhaseMode,
    pub thresholds: LoadThresholds,
    pub total_power: String,
    /// Phase letter to formatted current, in phase order.
    pub phase_currents: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPhase {
    pub phase: String,
    pub power: String,
    pub current: String,
    pub utilization: String,
    pub status: LoadStatus,
    pub groups: Vec<ReportGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportGroup {
    pub title: String,
    pub breaker: String,
    pub power: String,
    pub current: String,
    pub status: LoadStatus,
    pub devices: Vec<ReportDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDevice {
    pub name: String,
    pub spec: String,
}

pub fn format_kw(power_w: f64) -> String {
    format!("{:.1} kW", power_w / 1000.0)
}

pub fn format_amps(current_a: f64) -> String {
    format!("{:.1} A", current_a)
}

pub fn project_report(
    state: &PhaseLoadUiState,
    installation: Option<&str>,
    generated_at: DateTime<Utc>,
) -> PanelReport {
    project_phases(
        &state.phases,
        &state.incomer,
        &state.thresholds,
        state.phase_mode,
        installation,
        generated_at,
    )
}

pub fn project_phases(
    phases: &[PhaseLoadItem],
    incomer: &IncomerSpec,
    thresholds: &LoadThresholds,
    phase_mode: PhaseMode,
    installation: Option<&str>,
    generated_at: DateTime<Utc>,
) -> PanelReport {
    let total_power_w: f64 = phases.iter().map(|p| p.total_power_w).sum();
    let phase_currents = phases
        .iter()
        .map(|p| (p.phase.letter().to_owned(), format_amps(p.total_current_a)))
        .collect();

    PanelReport {
        meta: ReportMeta {
            installation: installation.map(str::to_owned),
            generated_at,
            incomer: incomer.describe(),
            phase_mode,
            thresholds: *thresholds,
            total_power: format_kw(total_power_w),
            phase_currents,
        },
        phases: phases
            .iter()
            .map(|phase| project_phase(phase, incomer.trip_curve))
            .collect(),
    }
}

fn project_phase(phase: &PhaseLoadItem, curve: TripCurve) -> ReportPhase {
    ReportPhase {
        phase: phase.phase.letter().to_owned(),
        power: format_kw(phase.total_power_w),
        current: format_amps(phase.total_current_a),
        utilization: format!("{:.1}%", phase.utilization_pct),
        status: phase.status,
        groups: phase
            .groups
            .iter()
            .map(|group| project_group(group, curve))
            .collect(),
    }
}

fn project_group(group: &PhaseGroupItem, curve: TripCurve) -> ReportGroup {
    ReportGroup {
        title: format!("Group {}: {}", group.number, group.room_name),
        breaker: format!("{}{}", curve, group.breaker_a),
        power: format_kw(group.total_power_w),
        current: format_amps(group.total_current_a),
        status: group.status,
        devices: group.devices.iter().map(project_device).collect(),
    }
}

fn project_device(device: &PhaseDeviceItem) -> ReportDevice {
    ReportDevice {
        name: device.name.clone(),
        spec: format!(
            "{} / {}",
            format_kw(device.power_w),
            format_amps(device.current_a)
        ),
    }
}
