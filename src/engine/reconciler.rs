//! Health Reconciler — fuses per-component classifier verdicts into one
//! overall health state, plus the derived scalar measurements the threshold
//! rules consume and the unhealthy-onset severity estimator.
//!
//! The reconciliation policy is the single canonical rule: zero unhealthy
//! components is Healthy, all unhealthy is Unhealthy, anything in between is
//! a PartialWarning carrying the sorted unhealthy component names.

use std::collections::BTreeMap;

use tracing::debug;

use super::EngineError;
use crate::types::{channels, ComponentVerdict, Label, LabelConvention, OverallHealth, SensorReading};

/// Pseudo-component name used when a derived measurement's source channels
/// are absent. The avg/peak derivations feed the threshold rules, not any
/// registered component.
pub const THRESHOLD_RULES: &str = "threshold_rules";

// Onset-weight channel coefficients. Placeholder heuristic inherited from the
// field deployment; pending domain-expert calibration.
const ONSET_TEMP_WEIGHT: f64 = 3.0;
const ONSET_FLUX_WEIGHT: f64 = 5.0;
const ONSET_VIB_WEIGHT: f64 = 2.0;

/// Mean of the two temperature channels.
pub fn average_temperature(reading: &SensorReading) -> Result<f64, EngineError> {
    let t1 = require(reading, channels::TEMPERATURE_ONE)?;
    let t2 = require(reading, channels::TEMPERATURE_TWO)?;
    Ok((t1 + t2) / 2.0)
}

/// Max of the three vibration axes.
pub fn peak_vibration(reading: &SensorReading) -> Result<f64, EngineError> {
    let vx = require(reading, channels::VIBRATION_X)?;
    let vy = require(reading, channels::VIBRATION_Y)?;
    let vz = require(reading, channels::VIBRATION_Z)?;
    Ok(vx.max(vy).max(vz))
}

fn require(reading: &SensorReading, feature: &str) -> Result<f64, EngineError> {
    reading.get(feature).ok_or_else(|| EngineError::MissingFeature {
        component: THRESHOLD_RULES.to_string(),
        feature: feature.to_string(),
    })
}

/// Normalize a raw label to `is_unhealthy` under the component's declared
/// convention. A label outside the convention — including a well-formed label
/// of the other convention — is an [`EngineError::UnknownLabel`], never a
/// silent coercion.
pub fn normalize_label(
    component: &str,
    label: &Label,
    convention: LabelConvention,
) -> Result<bool, EngineError> {
    let unhealthy = match (convention, label) {
        (LabelConvention::StringTag, Label::Tag(tag)) => match tag.as_str() {
            "healthy" => Some(false),
            "unhealthy" => Some(true),
            _ => None,
        },
        (LabelConvention::BinaryCode, Label::Code(code)) => match code {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
        // Convention mismatch.
        _ => None,
    };

    unhealthy.ok_or_else(|| EngineError::UnknownLabel {
        component: component.to_string(),
        label: label.clone(),
    })
}

/// Fuse per-component verdicts into one overall health state.
///
/// Fails with `UnknownLabel` if any verdict cannot be normalized — a bad
/// label is fatal for the reading's reconciliation, not defaulted to healthy.
pub fn reconcile(
    verdicts: &BTreeMap<String, ComponentVerdict>,
    conventions: &BTreeMap<String, LabelConvention>,
) -> Result<OverallHealth, EngineError> {
    let mut unhealthy = Vec::new();
    for (name, verdict) in verdicts {
        let convention = conventions.get(name).copied().ok_or_else(|| {
            EngineError::UnknownLabel {
                component: name.clone(),
                label: verdict.label.clone(),
            }
        })?;
        if normalize_label(name, &verdict.label, convention)? {
            unhealthy.push(name.clone());
        }
    }

    let overall = if unhealthy.is_empty() {
        OverallHealth::Healthy
    } else if unhealthy.len() == verdicts.len() {
        OverallHealth::Unhealthy
    } else {
        unhealthy.sort();
        OverallHealth::PartialWarning(unhealthy)
    };

    debug!(?overall, components = verdicts.len(), "reconciled verdicts");
    Ok(overall)
}

/// Unhealthy-onset severity score: a fixed linear weighting of the summed
/// sensor channels. This is an urgency heuristic, not a time or calendar
/// value. Pure and total — absent sound channels contribute 0.
pub fn onset_weight(reading: &SensorReading) -> f64 {
    let temps =
        reading.get_or_zero(channels::TEMPERATURE_ONE) + reading.get_or_zero(channels::TEMPERATURE_TWO);
    let flux = reading.get_or_zero(channels::MAGNETIC_FLUX_X)
        + reading.get_or_zero(channels::MAGNETIC_FLUX_Y)
        + reading.get_or_zero(channels::MAGNETIC_FLUX_Z);
    let vibs = reading.get_or_zero(channels::VIBRATION_X)
        + reading.get_or_zero(channels::VIBRATION_Y)
        + reading.get_or_zero(channels::VIBRATION_Z);

    ONSET_TEMP_WEIGHT * temps
        + ONSET_FLUX_WEIGHT * flux
        + ONSET_VIB_WEIGHT * vibs
        + reading.get_or_zero(channels::AUDIBLE_SOUND)
        + reading.get_or_zero(channels::ULTRA_SOUND)
}
