//! Health Aggregation and Anomaly-Classification Engine.
//!
//! Orchestrates per-component classifier invocation, threshold-rule anomaly
//! categories, verdict reconciliation, and batch aggregation:
//!
//! - `thresholds`: fixed range tables for temperature/vibration anomalies
//! - `registry`: immutable component roster + opaque classifier seam
//! - `reconciler`: verdict fusion policy, derived measurements, onset weight
//! - `batch`: bounded-batch evaluation and consensus reduction
//!
//! The engine is stateless per request; the only shared resource is the
//! immutable [`PredictorRegistry`] built once at startup.

pub mod batch;
pub mod reconciler;
pub mod registry;
pub mod thresholds;

pub use batch::{BatchOutcome, BatchVerdict};
pub use registry::{Classifier, ClassifierFault, ComponentSpec, CutoffClassifier, PredictorRegistry};

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::types::{
    ComponentVerdict, Label, LabelConvention, MachineCondition, OverallHealth, SensorReading,
    TemperatureAnomaly, VibrationAnomaly,
};

/// Hard cap on batch size. A precondition, not a hint: oversized batches are
/// rejected before any classifier runs.
pub const MAX_BATCH_SIZE: usize = 200;

// ============================================================================
// Error taxonomy
// ============================================================================

/// Engine failure taxonomy. Every variant carries a stable machine code
/// (see [`EngineError::code`]) so API consumers never have to parse messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A component's declared feature is absent from the reading. Recoverable
    /// per component: siblings and other batch entries continue.
    #[error("component `{component}` requires feature `{feature}` which is missing from the reading")]
    MissingFeature { component: String, feature: String },

    /// A classifier returned a label outside its declared convention. Fatal
    /// for the reading's reconciliation; never defaulted to healthy.
    #[error("component `{component}` returned label `{label}` outside its declared convention")]
    UnknownLabel { component: String, label: Label },

    /// Batch precondition: more than [`MAX_BATCH_SIZE`] readings.
    #[error("batch of {len} readings exceeds the maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },

    /// Batch precondition: zero readings.
    #[error("batch contains no readings")]
    EmptyBatch,

    /// The classifier provider failed to produce any label. Propagated, never
    /// masked as a healthy verdict.
    #[error("classifier for component `{component}` is unavailable: {reason}")]
    ClassifierUnavailable { component: String, reason: String },
}

impl EngineError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFeature { .. } => "MISSING_FEATURE",
            Self::UnknownLabel { .. } => "UNKNOWN_LABEL",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            Self::EmptyBatch => "EMPTY_BATCH",
            Self::ClassifierUnavailable { .. } => "CLASSIFIER_UNAVAILABLE",
        }
    }
}

// ============================================================================
// Single-reading assessment
// ============================================================================

/// Full assessment of one reading: per-component verdicts (with isolated
/// per-component errors), threshold anomaly categories, and the reconciled
/// overall health.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingAssessment {
    pub verdicts: BTreeMap<String, ComponentVerdict>,
    /// Components that could not be predicted for this reading. Partial
    /// success is first-class: these are reported alongside the verdicts.
    pub component_errors: BTreeMap<String, EngineError>,
    pub temperature_anomaly: TemperatureAnomaly,
    pub vibration_anomaly: VibrationAnomaly,
    pub machine_condition: MachineCondition,
    pub average_temperature: f64,
    pub peak_vibration: f64,
    pub overall: OverallHealth,
    /// Severity/urgency heuristic; defined to be 0 for a healthy verdict.
    pub onset_weight: f64,
}

// ============================================================================
// Engine
// ============================================================================

/// The condition-monitoring engine. Owns the immutable registry; stateless
/// otherwise.
pub struct HealthEngine {
    registry: PredictorRegistry,
    conventions: BTreeMap<String, LabelConvention>,
}

impl HealthEngine {
    pub fn new(registry: PredictorRegistry) -> Self {
        let conventions = registry.conventions();
        Self { registry, conventions }
    }

    pub fn registry(&self) -> &PredictorRegistry {
        &self.registry
    }

    /// Assess one reading end to end.
    ///
    /// Per-component failures are isolated into `component_errors`; the
    /// reconciliation runs over the components that did produce verdicts. The
    /// whole reading fails only when a derived measurement's channels are
    /// missing, a label cannot be normalized, or *every* component failed.
    pub fn assess(&self, reading: &SensorReading) -> Result<ReadingAssessment, EngineError> {
        let avg_temp = reconciler::average_temperature(reading)?;
        let peak_vib = reconciler::peak_vibration(reading)?;

        let mut verdicts = BTreeMap::new();
        let mut component_errors = BTreeMap::new();
        for (name, outcome) in self.registry.predict_components(reading) {
            match outcome {
                Ok(verdict) => {
                    verdicts.insert(name, verdict);
                }
                Err(err) => {
                    debug!(component = %name, error = %err, "component prediction failed");
                    component_errors.insert(name, err);
                }
            }
        }

        // Reconciling zero verdicts would vacuously report Healthy; surface
        // the first component error instead.
        if verdicts.is_empty() {
            if let Some(err) = component_errors.values().next() {
                return Err(err.clone());
            }
        }

        let overall = reconciler::reconcile(&verdicts, &self.conventions)?;
        let onset_weight = if overall.is_healthy() {
            0.0
        } else {
            reconciler::onset_weight(reading)
        };

        Ok(ReadingAssessment {
            verdicts,
            component_errors,
            temperature_anomaly: thresholds::classify_temperature(avg_temp),
            vibration_anomaly: thresholds::classify_vibration(peak_vib),
            machine_condition: thresholds::machine_condition(avg_temp, peak_vib),
            average_temperature: avg_temp,
            peak_vibration: peak_vib,
            overall,
            onset_weight,
        })
    }
}
