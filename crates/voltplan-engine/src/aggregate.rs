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
use uuid::Uuid;
use voltplan_logging::{vp_error, LogContext};

use crate::{
    balancer::PhaseAssignment,
    circuit::CircuitGroup,
    errors::{PanelError, Result},
    model::{Phase, PhaseMode},
    thresholds::LoadStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDeviceItem {
    pub name: String,
    pub power_w: f64,
    pub current_a: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseGroupItem {
    pub number: u32,
    pub room_id: Uuid,
    pub room_name: String,
    pub devices: Vec<PhaseDeviceItem>,
    pub total_power_w: f64,
    pub total_current_a: f64,
    pub breaker_a: f64,
    #[serde(default)]
    pub status: LoadStatus,
}

impl From<&CircuitGroup> for PhaseGroupItem {
    fn from(group: &CircuitGroup) -> Self {
        Self {
            number: group.number,
            room_id: group.room_id,
            room_name: group.room_name.clone(),
            devices: group
                .devices
                .iter()
                .map(|device| PhaseDeviceItem {
                    name: device.name.clone(),
                    power_w: device.power_w,
                    current_a: device.current_a,
                })
                .collect(),
            total_power_w: group.total_power_w,
            total_current_a: group.total_current_a,
            breaker_a: group.breaker_rating_a(),
            status: LoadStatus::Ok,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseLoadItem {
    pub phase: Phase,
    pub total_power_w: f64,
    pub total_current_a: f64,
    /// Filled in by threshold evaluation.
    #[serde(default)]
    pub utilization_pct: f64,
    #[serde(default)]
    pub status: LoadStatus,
    pub groups: Vec<PhaseGroupItem>,
}

impl PhaseLoadItem {
    fn empty(phase: Phase) -> Self {
        Self {
            phase,
            total_power_w: 0.0,
            total_current_a: 0.0,
            utilization_pct: 0.0,
            status: LoadStatus::Ok,
            groups: Vec::new(),
        }
    }
}

/// Per-phase totals with nested group and device detail, in `mode.phases()` order.
pub fn aggregate(
    groups: &[CircuitGroup],
    assignment: &PhaseAssignment,
    mode: PhaseMode,
) -> Result<Vec<PhaseLoadItem>> {
    let mut phases: Vec<PhaseLoadItem> =
        mode.phases().iter().copied().map(PhaseLoadItem::empty).collect();

    let mut ordered: Vec<&CircuitGroup> = groups.iter().collect();
    ordered.sort_by_key(|group| group.number);

    for group in ordered {
        let Some(phase) = assignment.phase_of(group.number) else {
            vp_error!(
                context = LogContext::new().with_room(&group.room_name),
                "circuit group {} left without a phase",
                group.number
            );
            return Err(PanelError::UnassignedGroup(group.number));
        };
        let Some(item) = phases.iter_mut().find(|item| item.phase == phase) else {
            vp_error!(
                context = LogContext::new()
                    .with_room(&group.room_name)
                    .with_phase(phase.letter()),
                "circuit group {} assigned outside the {} supply",
                group.number,
                mode
            );
            return Err(PanelError::UnassignedGroup(group.number));
        };
        item.total_power_w += group.total_power_w;
        item.total_current_a += group.total_current_a;
        item.groups.push(PhaseGroupItem::from(group));
    }

    Ok(phases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::balance;

    fn group(number: u32, current: f64) -> CircuitGroup {
        CircuitGroup {
            number,
            room_id: Uuid::nil(),
            room_name: format!("Room {number}"),
            devices: Vec::new(),
            total_power_w: current * 220.0,
            total_current_a: current,
            recommended_breaker_a: 40.0,
            installed_breaker_a: None,
        }
    }

    #[test]
    fn totals_follow_assignment() {
        let groups = vec![group(1, 10.0), group(2, 6.0)];
        let assignment = balance(&groups, PhaseMode::Three);
        let phases = aggregate(&groups, &assignment, PhaseMode::Three).unwrap();
        let currents: Vec<(Phase, f64)> =
            phases.iter().map(|p| (p.phase, p.total_current_a)).collect();
        assert_eq!(
            currents,
            vec![(Phase::A, 10.0), (Phase::B, 6.0), (Phase::C, 0.0)]
        );
        assert!(phases[2].groups.is_empty());
    }

    #[test]
    fn groups_are_listed_by_number_within_a_phase() {
        let groups = vec![group(3, 1.0), group(1, 1.0), group(2, 1.0)];
        let assignment = balance(&groups, PhaseMode::Single);
        let phases = aggregate(&groups, &assignment, PhaseMode::Single).unwrap();
        assert_eq!(phases.len(), 1);
        let numbers: Vec<u32> = phases[0].groups.iter().map(|g| g.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!((phases[0].total_power_w - 660.0).abs() < 1e-9);
    }

    #[test]
    fn unassigned_group_is_an_invariant_violation() {
        let assigned = vec![group(1, 1.0)];
        let assignment = balance(&assigned, PhaseMode::Three);
        let groups = vec![group(1, 1.0), group(2, 2.0)];
        let err = aggregate(&groups, &assignment, PhaseMode::Three).unwrap_err();
        assert!(matches!(err, PanelError::UnassignedGroup(2)));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn mismatched_mode_is_rejected() {
        let groups = vec![group(1, 1.0)];
        let assignment = balance(&groups, PhaseMode::Single);
        assert!(aggregate(&groups, &assignment, PhaseMode::Three).is_err());
    }
}
