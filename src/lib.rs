//! Rotorwatch: Condition Monitoring for Rotating Machinery
//!
//! Fuses per-component binary health classifiers with deterministic
//! threshold rules into a single machine-health verdict.
//!
//! ## Architecture
//!
//! - **Threshold Classifier**: fixed range tables for temperature/vibration anomalies
//! - **Predictor Registry**: immutable component roster over an opaque classifier seam
//! - **Health Reconciler**: canonical verdict-fusion policy + onset-weight estimator
//! - **Batch Aggregator**: bounded batches reduced by majority vote and mean/max

pub mod api;
pub mod config;
pub mod engine;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, MonitorConfig};

// Re-export commonly used types
pub use types::{
    ComponentVerdict, HealthClass, Label, LabelConvention, MachineCondition, OverallHealth,
    SensorReading, TemperatureAnomaly, VibrationAnomaly,
};

// Re-export the engine surface
pub use engine::{
    BatchOutcome, BatchVerdict, Classifier, ClassifierFault, ComponentSpec, CutoffClassifier,
    EngineError, HealthEngine, PredictorRegistry, ReadingAssessment, MAX_BATCH_SIZE,
};
