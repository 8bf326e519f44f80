//! Threshold Classifier — fixed range tables mapping derived scalar
//! measurements to discrete anomaly categories.
//!
//! All tiers are half-open `[lo, hi)` with an unbounded final tier, so every
//! real input lands in exactly one category. These functions are pure and
//! total; the avg/peak derivations they consume are owned by the reconciler.

use crate::types::{MachineCondition, TemperatureAnomaly, VibrationAnomaly};

// Temperature tier boundaries (°C)
pub const TEMP_MODERATE: f64 = 80.0;
pub const TEMP_SIGNIFICANT: f64 = 100.0;
pub const TEMP_CRITICAL: f64 = 120.0;

// Vibration tier boundaries (mm/s, ISO 10816-style severity bands)
pub const VIB_UNBALANCE: f64 = 1.8;
pub const VIB_MISALIGNMENT: f64 = 2.8;
pub const VIB_LOOSENESS: f64 = 4.5;
pub const VIB_BEARING_GEAR: f64 = 7.1;

/// Classify average temperature into an overheat tier.
pub fn classify_temperature(avg_temp: f64) -> TemperatureAnomaly {
    if avg_temp < TEMP_MODERATE {
        TemperatureAnomaly::None
    } else if avg_temp < TEMP_SIGNIFICANT {
        TemperatureAnomaly::ModerateOverheat
    } else if avg_temp < TEMP_CRITICAL {
        TemperatureAnomaly::SignificantOverheat
    } else {
        TemperatureAnomaly::CriticalOverheat
    }
}

/// Classify peak vibration into a fault tier.
pub fn classify_vibration(peak_vib: f64) -> VibrationAnomaly {
    if peak_vib < VIB_UNBALANCE {
        VibrationAnomaly::None
    } else if peak_vib < VIB_MISALIGNMENT {
        VibrationAnomaly::Unbalance
    } else if peak_vib < VIB_LOOSENESS {
        VibrationAnomaly::Misalignment
    } else if peak_vib < VIB_BEARING_GEAR {
        VibrationAnomaly::Looseness
    } else {
        VibrationAnomaly::BearingOrGear
    }
}

/// Combined Safe / Maintain / Repair condition.
///
/// Safe requires both measurements below their first tier; Maintain is
/// evaluated only when not Safe.
pub fn machine_condition(avg_temp: f64, peak_vib: f64) -> MachineCondition {
    if avg_temp < TEMP_MODERATE && peak_vib < VIB_UNBALANCE {
        MachineCondition::Safe
    } else if avg_temp < TEMP_SIGNIFICANT && peak_vib < VIB_MISALIGNMENT {
        MachineCondition::Maintain
    } else {
        MachineCondition::Repair
    }
}
