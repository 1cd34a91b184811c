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
use strum::Display;
use voltplan_logging::{vp_warn, LogContext};

use crate::{
    aggregate::{PhaseGroupItem, PhaseLoadItem},
    errors::{PanelError, Result},
    model::IncomerSpec,
};

const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Warning and alert levels as a percentage of the incomer rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadThresholds {
    pub warn_pct: f64,
    pub alert_pct: f64,
}

impl Default for LoadThresholds {
    fn default() -> Self {
        Self {
            warn_pct: 60.0,
            alert_pct: 80.0,
        }
    }
}

impl LoadThresholds {
    pub fn new(warn_pct: f64, alert_pct: f64) -> Result<Self> {
        let thresholds = Self {
            warn_pct,
            alert_pct,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.warn_pct > 0.0 && self.warn_pct < self.alert_pct && self.alert_pct <= 100.0 {
            Ok(())
        } else {
            Err(PanelError::InvalidThresholds {
                warn_pct: self.warn_pct,
                alert_pct: self.alert_pct,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LoadStatus {
    #[default]
    Ok,
    Warn,
    Alert,
}

pub fn utilization_pct(current_a: f64, rating_a: f64) -> f64 {
    current_a / rating_a * 100.0
}

/// `<= warn` is OK, `>= alert` is ALERT, anything in between is WARN.
pub fn classify(utilization_pct: f64, thresholds: &LoadThresholds) -> LoadStatus {
    if utilization_pct <= thresholds.warn_pct + BOUNDARY_TOLERANCE {
        LoadStatus::Ok
    } else if utilization_pct >= thresholds.alert_pct - BOUNDARY_TOLERANCE {
        LoadStatus::Alert
    } else {
        LoadStatus::Warn
    }
}

/// A circuit drawing more than its own breaker is misconfigured.
pub fn group_status(group: &PhaseGroupItem) -> LoadStatus {
    if group.total_current_a > group.breaker_a + BOUNDARY_TOLERANCE {
        LoadStatus::Alert
    } else {
        LoadStatus::Ok
    }
}

/// Annotates phases and groups with utilization and status; loads are left untouched.
pub fn evaluate(
    phases: Vec<PhaseLoadItem>,
    incomer: &IncomerSpec,
    thresholds: &LoadThresholds,
) -> Result<Vec<PhaseLoadItem>> {
    thresholds.validate()?;
    incomer.validate_rating()?;

    Ok(phases
        .into_iter()
        .map(|mut phase| {
            phase.utilization_pct = utilization_pct(phase.total_current_a, incomer.breaker_rating_a);
            phase.status = classify(phase.utilization_pct, thresholds);
            let context = LogContext::new().with_phase(phase.phase.letter());
            if phase.status != LoadStatus::Ok {
                vp_warn!(
                    context = context,
                    "phase load {}: {:.1} A is {:.1}% of the incomer",
                    phase.status,
                    phase.total_current_a,
                    phase.utilization_pct
                );
            }
            for group in &mut phase.groups {
                group.status = group_status(group);
                if group.status == LoadStatus::Alert {
                    vp_warn!(
                        context = context.clone().with_room(&group.room_name),
                        "circuit group {} draws {:.1} A on a {} A breaker",
                        group.number,
                        group.total_current_a,
                        group.breaker_a
                    );
                }
            }
            phase
        })
        .collect())
}
