//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
    circuit::{DEFAULT_BREAKER_LADDER_A, DEFAULT_MAX_CIRCUIT_CURRENT_A},
    errors::{PanelError, Result},
    thresholds::LoadThresholds,
};

/// Supply voltage class a device is rated for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
pub enum VoltageClass {
    /// 220 V phase-to-neutral, single-phase device.
    #[serde(rename = "220v")]
    #[strum(serialize = "220v", serialize = "220V", serialize = "220")]
    V220,
    /// 380 V phase-to-phase, three-phase device.
    #[serde(rename = "380v")]
    #[strum(serialize = "380v", serialize = "380V", serialize = "380")]
    V380,
}

impl VoltageClass {
    pub fn nominal_voltage(&self) -> f64 {
        match self {
            VoltageClass::V220 => 220.0,
            VoltageClass::V380 => 380.0,
        }
    }

    pub fn is_three_phase(&self) -> bool {
        matches!(self, VoltageClass::V380)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub rated_power_w: f64,
    pub voltage: VoltageClass,
    pub demand_ratio: f64,
    #[serde(default)]
    pub power_factor: Option<f64>,
    pub room_id: Uuid,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Device {
    pub fn new(
        name: impl Into<String>,
        rated_power_w: f64,
        voltage: VoltageClass,
        demand_ratio: f64,
        room_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            rated_power_w,
            voltage,
            demand_ratio,
            power_factor: None,
            room_id,
            created_at: Utc::now(),
        }
    }

    pub fn with_power_factor(mut self, power_factor: f64) -> Self {
        self.power_factor = Some(power_factor);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Breaker the installer actually fitted for this room's circuits, if any.
    #[serde(default)]
    pub installed_breaker_a: Option<f64>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            installed_breaker_a: None,
        }
    }

    pub fn with_installed_breaker(mut self, rating_a: f64) -> Self {
        self.installed_breaker_a = Some(rating_a);
        self
    }
}

/// Immutable view of an installation's rooms and devices at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstallationSnapshot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl InstallationSnapshot {
    pub fn new(rooms: Vec<Room>, devices: Vec<Device>) -> Self {
        Self {
            name: None,
            rooms,
            devices,
        }
    }

    pub fn find_room(&self, id: Uuid) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    /// Devices owned by `room_id`, in declaration order.
    pub fn devices_in(&self, room_id: Uuid) -> impl Iterator<Item = &Device> {
        self.devices
            .iter()
            .filter(move |device| device.room_id == room_id)
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display,
)]
pub enum Phase {
    A,
    B,
    C,
    /// The only phase of a single-phase supply.
    #[serde(rename = "L")]
    #[strum(serialize = "L")]
    Single,
}

impl Phase {
    pub fn letter(&self) -> &'static str {
        match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
            Phase::Single => "L",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PhaseMode {
    Single,
    #[default]
    Three,
}

impl PhaseMode {
    pub fn phases(&self) -> &'static [Phase] {
        match self {
            PhaseMode::Single => &[Phase::Single],
            PhaseMode::Three => &[Phase::A, Phase::B, Phase::C],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncomerKind {
    BreakerOnly,
    #[default]
    BreakerWithRcd,
    /// Combined residual-current breaker with overcurrent protection.
    Rcbo,
}

impl IncomerKind {
    pub fn has_rcd(&self) -> bool {
        !matches!(self, IncomerKind::BreakerOnly)
    }

    fn label(&self) -> &'static str {
        match self {
            IncomerKind::BreakerOnly => "MCB",
            IncomerKind::BreakerWithRcd => "MCB+RCD",
            IncomerKind::Rcbo => "RCBO",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Display, EnumString)]
pub enum TripCurve {
    B,
    #[default]
    C,
    D,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RcdSelectivity {
    #[default]
    General,
    /// Time-delayed (type S) device for upstream selectivity.
    Selective,
}

/// Main incomer protecting the whole panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomerSpec {
    #[serde(default)]
    pub kind: IncomerKind,
    pub poles: u8,
    pub breaker_rating_a: f64,
    #[serde(default)]
    pub trip_curve: TripCurve,
    pub breaking_capacity_ka: f64,
    #[serde(default)]
    pub rcd_sensitivity_ma: Option<u32>,
    #[serde(default)]
    pub rcd_selectivity: Option<RcdSelectivity>,
}

impl Default for IncomerSpec {
    fn default() -> Self {
        Self {
            kind: IncomerKind::BreakerWithRcd,
            poles: 4,
            breaker_rating_a: 32.0,
            trip_curve: TripCurve::C,
            breaking_capacity_ka: 6.0,
            rcd_sensitivity_ma: Some(30),
            rcd_selectivity: Some(RcdSelectivity::General),
        }
    }
}

impl IncomerSpec {
    pub fn validate(&self, mode: PhaseMode) -> Result<()> {
        self.validate_rating()?;
        if self.poles != 2 && self.poles != 4 {
            return Err(PanelError::InvalidIncomer(format!(
                "pole count must be 2 or 4, got {}",
                self.poles
            )));
        }
        if !(self.breaking_capacity_ka.is_finite() && self.breaking_capacity_ka > 0.0) {
            return Err(PanelError::InvalidIncomer(format!(
                "breaking capacity must be positive, got {} kA",
                self.breaking_capacity_ka
            )));
        }
        match (self.kind.has_rcd(), self.rcd_sensitivity_ma) {
            (true, None) => {
                return Err(PanelError::InvalidIncomer(
                    "residual-current incomer requires an RCD sensitivity".into(),
                ))
            }
            (true, Some(0)) => {
                return Err(PanelError::InvalidIncomer(
                    "RCD sensitivity must be positive".into(),
                ))
            }
            (false, Some(_)) => {
                return Err(PanelError::InvalidIncomer(
                    "breaker-only incomer cannot declare an RCD sensitivity".into(),
                ))
            }
            _ => {}
        }
        if mode == PhaseMode::Three && self.poles != 4 {
            return Err(PanelError::InvalidIncomer(
                "three-phase supply requires a 4-pole incomer".into(),
            ));
        }
        Ok(())
    }

    /// Short catalogue-style label, e.g. `MCB+RCD 4P C32 6kA 30mA`.
    /// The rating every utilization figure is divided by: positive and finite.
    pub fn validate_rating(&self) -> Result<()> {
        if !(self.breaker_rating_a.is_finite() && self.breaker_rating_a > 0.0) {
            return Err(PanelError::InvalidIncomer(format!(
                "breaker rating must be positive, got {} A",
                self.breaker_rating_a
            )));
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        let mut label = format!(
            "{} {}P {}{} {}kA",
            self.kind.label(),
            self.poles,
            self.trip_curve,
            self.breaker_rating_a,
            self.breaking_capacity_ka
        );
        if let Some(sensitivity) = self.rcd_sensitivity_ma {
            label.push_str(&format!(" {}mA", sensitivity));
            if self.rcd_selectivity == Some(RcdSelectivity::Selective) {
                label.push_str(" S");
            }
        }
        label
    }
}

/// What to do when a device in a room fails validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DevicePolicy {
    #[default]
    AbortRun,
    SkipRoom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSettings {
    #[serde(default = "default_max_circuit_current")]
    pub max_circuit_current_a: f64,
    #[serde(default = "default_breaker_ladder")]
    pub breaker_ladder_a: Vec<f64>,
    #[serde(default)]
    pub device_policy: DevicePolicy,
}

fn default_max_circuit_current() -> f64 {
    DEFAULT_MAX_CIRCUIT_CURRENT_A
}

fn default_breaker_ladder() -> Vec<f64> {
    DEFAULT_BREAKER_LADDER_A.to_vec()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_circuit_current_a: default_max_circuit_current(),
            breaker_ladder_a: default_breaker_ladder(),
            device_policy: DevicePolicy::default(),
        }
    }
}

/// Everything besides the room/device snapshot that a computation depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PanelSettings {
    #[serde(default)]
    pub incomer: IncomerSpec,
    #[serde(default)]
    pub thresholds: LoadThresholds,
    #[serde(default)]
    pub mode: PhaseMode,
    #[serde(default)]
    pub engine: EngineSettings,
}
