//! API route handlers and request/response DTOs.
//!
//! The assessment payloads mirror the engine's output: per-component
//! verdicts with isolated per-component errors, both threshold anomaly
//! categories with operator advisory text, the deterministic machine
//! condition, and the reconciled overall health.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::envelope::{ApiErrorResponse, ApiResponse, ErrorDetail};
use crate::engine::{EngineError, HealthEngine, ReadingAssessment, MAX_BATCH_SIZE};
use crate::types::{
    Label, MachineCondition, OverallHealth, SensorReading, TemperatureAnomaly, VibrationAnomaly,
};

// ============================================================================
// API State
// ============================================================================

/// Shared handler state: just the immutable engine.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<HealthEngine>,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TemperatureAnomalyBody {
    pub category: TemperatureAnomaly,
    pub advisory: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VibrationAnomalyBody {
    pub category: VibrationAnomaly,
    pub advisory: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MachineConditionBody {
    pub condition: MachineCondition,
    pub advisory: &'static str,
}

/// Full single-reading assessment.
#[derive(Debug, Serialize)]
pub struct AssessmentBody {
    /// Raw classifier label per component, in the component's own convention.
    pub verdicts: BTreeMap<String, Label>,
    /// Components that could not be predicted, as structured errors.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub component_errors: BTreeMap<String, ErrorDetail>,
    pub temperature_anomaly: TemperatureAnomalyBody,
    pub vibration_anomaly: VibrationAnomalyBody,
    pub machine_condition: MachineConditionBody,
    pub average_temperature: f64,
    pub peak_vibration: f64,
    pub overall_health: OverallHealth,
    /// Present only for a warning/unhealthy verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_weight: Option<f64>,
}

impl AssessmentBody {
    fn from_assessment(assessment: ReadingAssessment) -> Self {
        let onset_weight = if assessment.overall.is_healthy() {
            None
        } else {
            Some(assessment.onset_weight)
        };
        Self {
            verdicts: assessment
                .verdicts
                .into_iter()
                .map(|(name, v)| (name, v.label))
                .collect(),
            component_errors: assessment
                .component_errors
                .iter()
                .map(|(name, e)| (name.clone(), ErrorDetail::from_engine(e)))
                .collect(),
            temperature_anomaly: TemperatureAnomalyBody {
                category: assessment.temperature_anomaly,
                advisory: assessment.temperature_anomaly.advisory(),
            },
            vibration_anomaly: VibrationAnomalyBody {
                category: assessment.vibration_anomaly,
                advisory: assessment.vibration_anomaly.advisory(),
            },
            machine_condition: MachineConditionBody {
                condition: assessment.machine_condition,
                advisory: assessment.machine_condition.advisory(),
            },
            average_temperature: assessment.average_temperature,
            peak_vibration: assessment.peak_vibration,
            overall_health: assessment.overall,
            onset_weight,
        }
    }
}

/// One entry of a per-reading batch response, in input order.
#[derive(Debug, Serialize)]
pub struct BatchEntryBody {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<AssessmentBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Serialize)]
pub struct PerReadingBatchBody {
    pub readings_total: usize,
    pub results: Vec<BatchEntryBody>,
}

/// Service liveness + registered component roster.
#[derive(Debug, Serialize)]
pub struct SystemHealthBody {
    pub status: &'static str,
    pub components: Vec<String>,
    pub max_batch_size: usize,
}

// ============================================================================
// Request types
// ============================================================================

/// Batch output mode — an explicit flag, never inferred from the batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Per-reading results in input order.
    PerReading,
    /// One reduced consensus verdict.
    Aggregate,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub readings: Vec<SensorReading>,
    pub mode: BatchMode,
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/v1/assess` — assess one reading.
pub async fn assess(State(state): State<ApiState>, Json(reading): Json<SensorReading>) -> Response {
    match state.engine.assess(&reading) {
        Ok(assessment) => {
            info!(overall = ?assessment.overall.class(), "reading assessed");
            ApiResponse::ok(AssessmentBody::from_assessment(assessment))
        }
        Err(err) => ApiErrorResponse::from_engine(&err),
    }
}

/// `POST /api/v1/assess/batch` — assess a bounded batch of readings.
pub async fn assess_batch(
    State(state): State<ApiState>,
    Json(request): Json<BatchRequest>,
) -> Response {
    let outcome = match state.engine.assess_batch(&request.readings) {
        Ok(outcome) => outcome,
        Err(err) => return ApiErrorResponse::from_engine(&err),
    };
    info!(
        total = request.readings.len(),
        mode = ?request.mode,
        "batch assessed"
    );

    match request.mode {
        BatchMode::PerReading => {
            let results = outcome
                .per_reading
                .into_iter()
                .enumerate()
                .map(|(index, result)| match result {
                    Ok(assessment) => BatchEntryBody {
                        index,
                        assessment: Some(AssessmentBody::from_assessment(assessment)),
                        error: None,
                    },
                    Err(err) => BatchEntryBody {
                        index,
                        assessment: None,
                        error: Some(ErrorDetail::from_engine(&err)),
                    },
                })
                .collect();
            ApiResponse::ok(PerReadingBatchBody {
                readings_total: request.readings.len(),
                results,
            })
        }
        BatchMode::Aggregate => match outcome.aggregate {
            Some(verdict) => ApiResponse::ok(verdict),
            // Every reading failed; surface the first failure.
            None => {
                let first = outcome
                    .per_reading
                    .into_iter()
                    .find_map(Result::err)
                    .unwrap_or(EngineError::EmptyBatch);
                ApiErrorResponse::from_engine(&first)
            }
        },
    }
}

/// `GET /api/v1/system/health` — liveness and component roster.
pub async fn system_health(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(SystemHealthBody {
        status: "ok",
        components: state.engine.registry().component_names(),
        max_batch_size: MAX_BATCH_SIZE,
    })
}
