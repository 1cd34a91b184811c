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

use crate::{
    errors::{PanelError, Result},
    model::{Device, VoltageClass},
};

/// Steady-state draw of a single device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLoad {
    pub device_id: Uuid,
    pub name: String,
    pub voltage: VoltageClass,
    /// Rated power de-rated by the demand ratio, in watts.
    pub power_w: f64,
    pub current_a: f64,
}

impl DeviceLoad {
    pub fn from_device(device: &Device) -> Result<Self> {
        let power_w = effective_power(device)?;
        let current_a = current_for_power(power_w, device.voltage, power_factor(device));
        Ok(Self {
            device_id: device.id,
            name: device.name.clone(),
            voltage: device.voltage,
            power_w,
            current_a,
        })
    }
}

pub fn validate_device(device: &Device) -> Result<()> {
    let invalid = |reason: String| PanelError::InvalidDeviceSpec {
        device: device.name.clone(),
        reason,
    };
    if !(device.rated_power_w.is_finite() && device.rated_power_w > 0.0) {
        return Err(invalid(format!(
            "rated power must be positive, got {} W",
            device.rated_power_w
        )));
    }
    if !(device.demand_ratio > 0.0 && device.demand_ratio <= 1.0) {
        return Err(invalid(format!(
            "demand ratio must be in (0, 1], got {}",
            device.demand_ratio
        )));
    }
    if let Some(pf) = device.power_factor {
        if !(pf > 0.0 && pf <= 1.0) {
            return Err(invalid(format!("power factor must be in (0, 1], got {}", pf)));
        }
    }
    Ok(())
}

/// Demand-adjusted power in watts.
pub fn effective_power(device: &Device) -> Result<f64> {
    validate_device(device)?;
    Ok(device.rated_power_w * device.demand_ratio)
}

/// Line current in amperes for the device's voltage class.
pub fn device_current(device: &Device) -> Result<f64> {
    let power_w = effective_power(device)?;
    Ok(current_for_power(power_w, device.voltage, power_factor(device)))
}

fn power_factor(device: &Device) -> f64 {
    device.power_factor.unwrap_or(1.0)
}

/// Single-phase `P / (V·pf)`, balanced three-phase `P / (V·√3·pf)`.
pub fn current_for_power(power_w: f64, voltage: VoltageClass, power_factor: f64) -> f64 {
    let mut denominator = voltage.nominal_voltage() * power_factor;
    if voltage.is_three_phase() {
        denominator *= (3.0f64).sqrt();
    }
    power_w / denominator
}
