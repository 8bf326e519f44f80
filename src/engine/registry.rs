//! Component Predictor Registry — the roster of monitored components, each
//! with an ordered feature list and a handle to its opaque classifier.
//!
//! The registry is constructed once at startup from config and never mutated
//! afterward; the engine shares it behind an `Arc`. Per-component prediction
//! failures are isolated: a component whose features are missing or whose
//! provider is down reports its own error without aborting its siblings.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::EngineError;
use crate::types::{ComponentVerdict, Label, LabelConvention, SensorReading};

/// Opaque classifier provider seam.
///
/// Implementations receive the feature vector projected in the exact order
/// the component declared at registration — classifiers are sensitive to
/// feature order.
pub trait Classifier: Send + Sync {
    /// Predict a health label for one feature vector.
    fn predict(&self, features: &[f64]) -> Result<Label, ClassifierFault>;
}

/// Provider-side failure: the classifier could not produce a label at all.
/// Distinct from [`EngineError::UnknownLabel`], which is a label outside the
/// declared convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierFault {
    pub reason: String,
}

impl ClassifierFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Declaration of one monitored component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    pub name: String,
    /// Ordered feature list the classifier consumes.
    pub features: Vec<String>,
    /// Label convention the classifier was trained with.
    pub convention: LabelConvention,
}

struct RegisteredComponent {
    spec: ComponentSpec,
    classifier: Arc<dyn Classifier>,
}

/// Immutable roster of components and their classifiers.
pub struct PredictorRegistry {
    components: Vec<RegisteredComponent>,
}

impl PredictorRegistry {
    pub fn new() -> Self {
        Self { components: Vec::new() }
    }

    /// Register one component. Overlapping feature sets across components are
    /// expected (the sound components reuse the vibration axes).
    #[must_use]
    pub fn register(mut self, spec: ComponentSpec, classifier: Arc<dyn Classifier>) -> Self {
        self.components.push(RegisteredComponent { spec, classifier });
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.spec.name.clone()).collect()
    }

    /// Label convention per component, consumed by the reconciler when
    /// normalizing verdicts.
    pub fn conventions(&self) -> BTreeMap<String, LabelConvention> {
        self.components
            .iter()
            .map(|c| (c.spec.name.clone(), c.spec.convention))
            .collect()
    }

    /// Run every component's classifier against one reading.
    ///
    /// Each component either yields a verdict or its own error; one
    /// component's failure never short-circuits the others.
    pub fn predict_components(
        &self,
        reading: &SensorReading,
    ) -> BTreeMap<String, Result<ComponentVerdict, EngineError>> {
        let mut results = BTreeMap::new();
        for entry in &self.components {
            results.insert(entry.spec.name.clone(), predict_one(entry, reading));
        }
        results
    }
}

impl Default for PredictorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn predict_one(
    entry: &RegisteredComponent,
    reading: &SensorReading,
) -> Result<ComponentVerdict, EngineError> {
    let mut features = Vec::with_capacity(entry.spec.features.len());
    for name in &entry.spec.features {
        match reading.get(name) {
            Some(v) => features.push(v),
            None => {
                return Err(EngineError::MissingFeature {
                    component: entry.spec.name.clone(),
                    feature: name.clone(),
                })
            }
        }
    }

    let label = entry.classifier.predict(&features).map_err(|fault| {
        EngineError::ClassifierUnavailable {
            component: entry.spec.name.clone(),
            reason: fault.reason,
        }
    })?;

    debug!(component = %entry.spec.name, label = %label, "component prediction");
    Ok(ComponentVerdict {
        component: entry.spec.name.clone(),
        label,
    })
}

// ============================================================================
// Built-in provider
// ============================================================================

/// Deterministic stand-in for an externally trained model: flags the
/// component unhealthy when the mean of its feature vector reaches the
/// configured cutoff. Keeps the default deployment runnable and testable
/// without model artifacts.
pub struct CutoffClassifier {
    cutoff: f64,
    convention: LabelConvention,
}

impl CutoffClassifier {
    pub fn new(cutoff: f64, convention: LabelConvention) -> Self {
        Self { cutoff, convention }
    }
}

impl Classifier for CutoffClassifier {
    fn predict(&self, features: &[f64]) -> Result<Label, ClassifierFault> {
        if features.is_empty() {
            return Err(ClassifierFault::new("empty feature vector"));
        }
        let mean = features.iter().sum::<f64>() / features.len() as f64;
        let unhealthy = mean >= self.cutoff;
        Ok(match self.convention {
            LabelConvention::StringTag => {
                Label::Tag(if unhealthy { "unhealthy" } else { "healthy" }.to_string())
            }
            LabelConvention::BinaryCode => Label::Code(i64::from(unhealthy)),
        })
    }
}
