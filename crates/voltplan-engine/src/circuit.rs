//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
//! Circuit grouping: one room becomes one or more breaker-protected circuits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    device_load::DeviceLoad,
    errors::{PanelError, Result},
    model::{DevicePolicy, EngineSettings, InstallationSnapshot, Room},
};

/// Standard miniature circuit breaker ratings in amperes.
pub const DEFAULT_BREAKER_LADDER_A: [f64; 9] = [6.0, 10.0, 16.0, 20.0, 25.0, 32.0, 40.0, 50.0, 63.0];

/// Largest current a single circuit may carry before its room is split.
pub const DEFAULT_MAX_CIRCUIT_CURRENT_A: f64 = 32.0;

const CURRENT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitGroup {
    pub number: u32,
    pub room_id: Uuid,
    pub room_name: String,
    pub devices: Vec<DeviceLoad>,
    pub total_power_w: f64,
    pub total_current_a: f64,
    pub recommended_breaker_a: f64,
    #[serde(default)]
    pub installed_breaker_a: Option<f64>,
}

impl CircuitGroup {
    fn from_loads(number: u32, room: &Room, devices: Vec<DeviceLoad>, ladder: &[f64]) -> Result<Self> {
        let total_power_w = devices.iter().map(|d| d.power_w).sum();
        let total_current_a = devices.iter().map(|d| d.current_a).sum();
        let recommended_breaker_a = select_breaker(total_current_a, ladder)?;
        Ok(Self {
            number,
            room_id: room.id,
            room_name: room.name.clone(),
            devices,
            total_power_w,
            total_current_a,
            recommended_breaker_a,
            installed_breaker_a: room.installed_breaker_a,
        })
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Rating of the breaker protecting this circuit: the fitted one if known.
    pub fn breaker_rating_a(&self) -> f64 {
        self.installed_breaker_a.unwrap_or(self.recommended_breaker_a)
    }
}

/// A room left out of the computation under [`DevicePolicy::SkipRoom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRoom {
    pub room_id: Uuid,
    pub room_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupingOutcome {
    pub groups: Vec<CircuitGroup>,
    pub skipped: Vec<SkippedRoom>,
}

impl GroupingOutcome {
    pub fn total_power_w(&self) -> f64 {
        self.groups.iter().map(|g| g.total_power_w).sum()
    }
}

pub fn validate_ladder(ladder: &[f64]) -> Result<()> {
    if ladder.is_empty() {
        return Err(PanelError::InvalidLadder("ladder is empty".into()));
    }
    if ladder.iter().any(|rating| !(rating.is_finite() && *rating > 0.0)) {
        return Err(PanelError::InvalidLadder(
            "ratings must be positive".into(),
        ));
    }
    if ladder.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(PanelError::InvalidLadder(
            "ratings must be strictly ascending".into(),
        ));
    }
    Ok(())
}

/// Smallest rating on `ladder` that is at least `current_a`.
pub fn select_breaker(current_a: f64, ladder: &[f64]) -> Result<f64> {
    ladder
        .iter()
        .copied()
        .find(|rating| current_a <= rating + CURRENT_TOLERANCE)
        .ok_or_else(|| PanelError::NoSuitableBreaker {
            current_a,
            max_a: ladder.last().copied().unwrap_or_default(),
        })
}

pub fn build_circuit_groups(
    snapshot: &InstallationSnapshot,
    settings: &EngineSettings,
) -> Result<GroupingOutcome> {
    validate_ladder(&settings.breaker_ladder_a)?;
    if !(settings.max_circuit_current_a.is_finite() && settings.max_circuit_current_a > 0.0) {
        return Err(PanelError::InvalidLadder(format!(
            "circuit current ceiling must be positive, got {} A",
            settings.max_circuit_current_a
        )));
    }

    validate_rooms(&snapshot.rooms)?;
    for device in &snapshot.devices {
        if snapshot.find_room(device.room_id).is_none() {
            return Err(PanelError::UnknownRoom {
                device: device.name.clone(),
                room_id: device.room_id,
            });
        }
    }

    let mut outcome = GroupingOutcome::default();
    let mut next_number = 1u32;

    for room in &snapshot.rooms {
        let loads = match room_loads(snapshot, room) {
            Ok(loads) => loads,
            Err(err) if settings.device_policy == DevicePolicy::SkipRoom => {
                outcome.skipped.push(SkippedRoom {
                    room_id: room.id,
                    room_name: room.name.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };
        if loads.is_empty() {
            continue;
        }

        let room_current: f64 = loads.iter().map(|l| l.current_a).sum();
        let circuits = if room_current <= settings.max_circuit_current_a + CURRENT_TOLERANCE {
            vec![loads]
        } else {
            debug!(
                room = %room.name,
                current_a = room_current,
                ceiling_a = settings.max_circuit_current_a,
                "splitting room across circuits"
            );
            split_loads(loads, settings.max_circuit_current_a)
        };

        for devices in circuits {
            outcome.groups.push(CircuitGroup::from_loads(
                next_number,
                room,
                devices,
                &settings.breaker_ladder_a,
            )?);
            next_number += 1;
        }
    }

    Ok(outcome)
}

/// Room ids and names are unique; a fitted breaker must have a positive finite rating.
pub fn validate_rooms(rooms: &[Room]) -> Result<()> {
    let mut ids = HashSet::with_capacity(rooms.len());
    let mut names = HashSet::with_capacity(rooms.len());
    for room in rooms {
        if !ids.insert(room.id) {
            return Err(PanelError::InvalidRoom {
                room: room.name.clone(),
                reason: format!("duplicate room id {}", room.id),
            });
        }
        if !names.insert(room.name.as_str()) {
            return Err(PanelError::InvalidRoom {
                room: room.name.clone(),
                reason: "duplicate room name".into(),
            });
        }
        if let Some(rating) = room.installed_breaker_a {
            if !(rating.is_finite() && rating > 0.0) {
                return Err(PanelError::InvalidRoom {
                    room: room.name.clone(),
                    reason: format!("installed breaker must be positive, got {} A", rating),
                });
            }
        }
    }
    Ok(())
}

fn room_loads(snapshot: &InstallationSnapshot, room: &Room) -> Result<Vec<DeviceLoad>> {
    snapshot
        .devices_in(room.id)
        .map(DeviceLoad::from_device)
        .collect()
}

/// Greedy bin-fill in ascending power order; an oversized device gets a circuit to itself.
fn split_loads(mut loads: Vec<DeviceLoad>, ceiling_a: f64) -> Vec<Vec<DeviceLoad>> {
    loads.sort_by(|a, b| a.power_w.total_cmp(&b.power_w));

    let mut circuits: Vec<Vec<DeviceLoad>> = Vec::new();
    let mut open: Vec<DeviceLoad> = Vec::new();
    let mut open_current = 0.0;
    for load in loads {
        if !open.is_empty() && open_current + load.current_a > ceiling_a + CURRENT_TOLERANCE {
            circuits.push(std::mem::take(&mut open));
            open_current = 0.0;
        }
        open_current += load.current_a;
        open.push(load);
    }
    if !open.is_empty() {
        circuits.push(open);
    }
    circuits
}
