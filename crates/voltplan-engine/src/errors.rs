//! ---
//! vp_section: "02-load-engine"
//! vp_subsection: "module"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Load derivation and phase balancing routines for panel design."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PanelError>;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("invalid device '{device}': {reason}")]
    InvalidDeviceSpec { device: String, reason: String },
    #[error("no standard breaker covers {current_a:.2} A (largest available is {max_a} A); split the circuit")]
    NoSuitableBreaker { current_a: f64, max_a: f64 },
    #[error("invalid thresholds warn={warn_pct}% alert={alert_pct}%: require 0 < warn < alert <= 100")]
    InvalidThresholds { warn_pct: f64, alert_pct: f64 },
    #[error("invalid incomer: {0}")]
    InvalidIncomer(String),
    #[error("invalid breaker ladder: {0}")]
    InvalidLadder(String),
    #[error("invalid room '{room}': {reason}")]
    InvalidRoom { room: String, reason: String },
    #[error("device '{device}' references unknown room {room_id}")]
    UnknownRoom { device: String, room_id: uuid::Uuid },
    #[error("circuit group {0} has no assigned phase")]
    UnassignedGroup(u32),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
}

impl PanelError {
    /// Errors the operator can fix by editing the installation or configuration.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            PanelError::InvalidDeviceSpec { .. }
                | PanelError::NoSuitableBreaker { .. }
                | PanelError::InvalidThresholds { .. }
                | PanelError::InvalidIncomer(_)
                | PanelError::InvalidLadder(_)
                | PanelError::InvalidRoom { .. }
                | PanelError::UnknownRoom { .. }
        )
    }
}
