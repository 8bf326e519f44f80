//! Core domain types: sensor readings, classifier labels, anomaly categories,
//! and the overall machine-health verdict.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Channel names
// ============================================================================

/// Canonical sensor channel names.
///
/// A reading is a flat `channel -> value` mapping; registered components refer
/// to channels by these names in their feature lists.
pub mod channels {
    pub const TEMPERATURE_ONE: &str = "temperature_one";
    pub const TEMPERATURE_TWO: &str = "temperature_two";
    pub const VIBRATION_X: &str = "vibration_x";
    pub const VIBRATION_Y: &str = "vibration_y";
    pub const VIBRATION_Z: &str = "vibration_z";
    pub const MAGNETIC_FLUX_X: &str = "magnetic_flux_x";
    pub const MAGNETIC_FLUX_Y: &str = "magnetic_flux_y";
    pub const MAGNETIC_FLUX_Z: &str = "magnetic_flux_z";
    pub const AUDIBLE_SOUND: &str = "audible_sound";
    pub const ULTRA_SOUND: &str = "ultra_sound";
}

// ============================================================================
// Sensor reading
// ============================================================================

/// One interval of machine telemetry as a flat channel map.
///
/// The sound channels are optional in the baseline deployment, so the reading
/// is a map rather than a fixed struct: a component whose feature list names
/// an absent channel fails individually instead of failing deserialization
/// for every component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorReading {
    values: BTreeMap<String, f64>,
}

impl SensorReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style channel insertion, used heavily in tests.
    #[must_use]
    pub fn with_channel(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Channel value, or 0.0 when absent. Only the onset-weight estimator
    /// uses this; everywhere else a missing channel is an error.
    pub fn get_or_zero(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Classifier labels
// ============================================================================

/// Raw classifier output.
///
/// Two label conventions exist across classifier generations: string tags
/// (`"healthy"` / `"unhealthy"`) and binary codes (`0` / `1`). The engine
/// carries the raw label and only converts through an explicitly declared
/// [`LabelConvention`] — never by inspecting the value's shape at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Tag(String),
    Code(i64),
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tag(t) => write!(f, "{t}"),
            Self::Code(c) => write!(f, "{c}"),
        }
    }
}

/// Which label convention a component's classifier was trained with.
///
/// Declared at registration time, alongside the feature list. A label outside
/// the declared convention (including a well-formed label of the *other*
/// convention) is an error, not a coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelConvention {
    /// `"healthy"` / `"unhealthy"` string tags.
    StringTag,
    /// `0` (healthy) / `1` (unhealthy) numeric codes.
    BinaryCode,
}

/// One classifier's verdict for one component on one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentVerdict {
    pub component: String,
    pub label: Label,
}

// ============================================================================
// Threshold anomaly categories
// ============================================================================

/// Temperature anomaly tiers, ascending severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemperatureAnomaly {
    None,
    ModerateOverheat,
    SignificantOverheat,
    CriticalOverheat,
}

impl TemperatureAnomaly {
    /// Operator-facing advisory text.
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::None => "No significant temperature anomaly detected",
            Self::ModerateOverheat => "Moderate Overheating - Check Lubrication",
            Self::SignificantOverheat => {
                "Significant Overheating - Possible Misalignment or Bearing Wear"
            }
            Self::CriticalOverheat => "Critical Overheating - Immediate Repair Needed",
        }
    }
}

/// Vibration anomaly tiers, ascending severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VibrationAnomaly {
    None,
    Unbalance,
    Misalignment,
    Looseness,
    BearingOrGear,
}

impl VibrationAnomaly {
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::None => "No significant vibration anomaly detected",
            Self::Unbalance => "Unbalance Fault",
            Self::Misalignment => "Misalignment Fault",
            Self::Looseness => "Looseness Fault",
            Self::BearingOrGear => "Bearing Fault or Gear Mesh Fault",
        }
    }
}

/// Deterministic machine condition from the threshold rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineCondition {
    Safe,
    Maintain,
    Repair,
}

impl MachineCondition {
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::Safe => "Safe Condition",
            Self::Maintain => "Maintain Condition",
            Self::Repair => "Repair Condition",
        }
    }
}

// ============================================================================
// Overall health
// ============================================================================

/// Reconciled machine-health verdict for one reading.
///
/// `PartialWarning` carries the unhealthy component names sorted
/// alphabetically so output is reproducible regardless of registry iteration
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "unhealthy_components", rename_all = "snake_case")]
pub enum OverallHealth {
    Healthy,
    Unhealthy,
    PartialWarning(Vec<String>),
}

impl OverallHealth {
    /// The categorical class without the component payload, used for
    /// majority voting across a batch.
    pub fn class(&self) -> HealthClass {
        match self {
            Self::Healthy => HealthClass::Healthy,
            Self::Unhealthy => HealthClass::Unhealthy,
            Self::PartialWarning(_) => HealthClass::PartialWarning,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// `OverallHealth` collapsed to its class tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthClass {
    Healthy,
    PartialWarning,
    Unhealthy,
}
