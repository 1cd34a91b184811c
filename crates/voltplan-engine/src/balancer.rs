//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
//! Phase assignment for circuit groups.
//!
//! Three-phase balancing is the greedy longest-processing-time heuristic: groups are taken by
//! descending current and each lands on the currently least loaded phase. It is not an optimal
//! multiway partition, but the spread between the most and least loaded phase never exceeds the
//! current of the largest single group.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    circuit::CircuitGroup,
    model::{Phase, PhaseMode},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAssignment {
    pub mode: PhaseMode,
    assignments: BTreeMap<u32, Phase>,
    phase_currents: Vec<(Phase, f64)>,
}

impl PhaseAssignment {
    pub fn phase_of(&self, group_number: u32) -> Option<Phase> {
        self.assignments.get(&group_number).copied()
    }

    /// Accumulated current on `phase`; zero for phases outside the mode.
    pub fn phase_current(&self, phase: Phase) -> f64 {
        self.phase_currents
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, current)| *current)
            .unwrap_or_default()
    }

    /// Spread between the most and the least loaded phase.
    pub fn imbalance_a(&self) -> f64 {
        let max = self
            .phase_currents
            .iter()
            .map(|(_, c)| *c)
            .fold(f64::NEG_INFINITY, f64::max);
        let min = self
            .phase_currents
            .iter()
            .map(|(_, c)| *c)
            .fold(f64::INFINITY, f64::min);
        if max.is_finite() && min.is_finite() {
            max - min
        } else {
            0.0
        }
    }

    /// `(group number, phase)` pairs in group-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Phase)> + '_ {
        self.assignments.iter().map(|(number, phase)| (*number, *phase))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

pub fn balance(groups: &[CircuitGroup], mode: PhaseMode) -> PhaseAssignment {
    let mut phase_currents: Vec<(Phase, f64)> =
        mode.phases().iter().map(|phase| (*phase, 0.0)).collect();
    let mut assignments = BTreeMap::new();

    let mut order: Vec<&CircuitGroup> = groups.iter().collect();
    order.sort_by(|a, b| {
        b.total_current_a
            .total_cmp(&a.total_current_a)
            .then(a.number.cmp(&b.number))
    });

    for group in order {
        let slot = least_loaded(&phase_currents);
        let (phase, current) = &mut phase_currents[slot];
        *current += group.total_current_a;
        assignments.insert(group.number, *phase);
    }

    let assignment = PhaseAssignment {
        mode,
        assignments,
        phase_currents,
    };
    debug!(
        mode = %mode,
        groups = assignment.len(),
        imbalance_a = assignment.imbalance_a(),
        "phase assignment computed"
    );
    assignment
}

// First minimum wins, so ties resolve in A, B, C order.
fn least_loaded(phase_currents: &[(Phase, f64)]) -> usize {
    let mut best = 0;
    for (idx, (_, current)) in phase_currents.iter().enumerate().skip(1) {
        if *current < phase_currents[best].1 {
            best = idx;
        }
    }
    best
}
