//! Engine Regression Tests
//!
//! End-to-end scenarios through `HealthEngine`: threshold boundaries,
//! reconciliation policy, onset weight, and batch preconditions, driven
//! through real registries rather than module internals.

use std::sync::Arc;

use rotorwatch::types::channels;
use rotorwatch::{
    Classifier, ClassifierFault, ComponentSpec, CutoffClassifier, EngineError, HealthEngine, Label,
    LabelConvention, MachineCondition, MonitorConfig, OverallHealth, PredictorRegistry,
    SensorReading, TemperatureAnomaly, VibrationAnomaly, MAX_BATCH_SIZE,
};

/// Classifier that always returns the same label, for verdict-policy tests.
struct Fixed(Label);

impl Classifier for Fixed {
    fn predict(&self, _features: &[f64]) -> Result<Label, ClassifierFault> {
        Ok(self.0.clone())
    }
}

fn default_engine() -> HealthEngine {
    let registry = MonitorConfig::default().build_registry().unwrap();
    HealthEngine::new(registry)
}

/// Full ten-channel reading with nominal values.
fn nominal_reading() -> SensorReading {
    SensorReading::new()
        .with_channel(channels::TEMPERATURE_ONE, 22.24)
        .with_channel(channels::TEMPERATURE_TWO, 18.69)
        .with_channel(channels::VIBRATION_X, 0.01)
        .with_channel(channels::VIBRATION_Y, 0.04)
        .with_channel(channels::VIBRATION_Z, 0.13)
        .with_channel(channels::MAGNETIC_FLUX_X, 0.27)
        .with_channel(channels::MAGNETIC_FLUX_Y, 0.093)
        .with_channel(channels::MAGNETIC_FLUX_Z, 0.115)
        .with_channel(channels::AUDIBLE_SOUND, 0.3)
        .with_channel(channels::ULTRA_SOUND, 0.25)
}

/// Registry of five fixed-verdict components, built in the given order.
fn fixed_registry(verdicts: &[(&str, bool)]) -> PredictorRegistry {
    let mut registry = PredictorRegistry::new();
    for (name, unhealthy) in verdicts {
        registry = registry.register(
            ComponentSpec {
                name: name.to_string(),
                features: vec![channels::TEMPERATURE_ONE.to_string()],
                convention: LabelConvention::BinaryCode,
            },
            Arc::new(Fixed(Label::Code(i64::from(*unhealthy)))),
        );
    }
    registry
}

#[test]
fn test_nominal_reading_is_fully_healthy() {
    let engine = default_engine();
    let assessment = engine.assess(&nominal_reading()).unwrap();

    assert_eq!(assessment.overall, OverallHealth::Healthy);
    assert_eq!(assessment.onset_weight, 0.0);
    assert_eq!(assessment.peak_vibration, 0.13);
    assert_eq!(assessment.vibration_anomaly, VibrationAnomaly::None);
    assert_eq!(assessment.temperature_anomaly, TemperatureAnomaly::None);
    assert_eq!(assessment.machine_condition, MachineCondition::Safe);
    assert_eq!(assessment.verdicts.len(), 5);
    assert!(assessment.component_errors.is_empty());
}

#[test]
fn test_boundary_average_temperature_is_moderate_overheat() {
    // (90 + 70) / 2 = 80 exactly: the moderate tier's lower bound is inclusive.
    let engine = default_engine();
    let reading = nominal_reading()
        .with_channel(channels::TEMPERATURE_ONE, 90.0)
        .with_channel(channels::TEMPERATURE_TWO, 70.0);

    let assessment = engine.assess(&reading).unwrap();
    assert_eq!(assessment.average_temperature, 80.0);
    assert_eq!(assessment.temperature_anomaly, TemperatureAnomaly::ModerateOverheat);
    assert_eq!(assessment.machine_condition, MachineCondition::Maintain);
}

#[test]
fn test_three_of_five_unhealthy_is_sorted_partial_warning() {
    let registry = fixed_registry(&[
        ("vibration", true),
        ("ultra_sound", true),
        ("temperature", false),
        ("magnetic_flux", true),
        ("audible_sound", false),
    ]);
    let engine = HealthEngine::new(registry);
    // Fixed classifiers still need the vibration/temperature channels for
    // the derived measurements.
    let assessment = engine.assess(&nominal_reading()).unwrap();

    assert_eq!(
        assessment.overall,
        OverallHealth::PartialWarning(vec![
            "magnetic_flux".to_string(),
            "ultra_sound".to_string(),
            "vibration".to_string(),
        ])
    );
    assert!(assessment.onset_weight > 0.0);
}

#[test]
fn test_reconciliation_is_registration_order_independent() {
    let forward = fixed_registry(&[("a", true), ("b", false), ("c", true)]);
    let backward = fixed_registry(&[("c", true), ("b", false), ("a", true)]);

    let first = HealthEngine::new(forward).assess(&nominal_reading()).unwrap();
    let second = HealthEngine::new(backward).assess(&nominal_reading()).unwrap();
    assert_eq!(first.overall, second.overall);
    assert_eq!(
        first.overall,
        OverallHealth::PartialWarning(vec!["a".to_string(), "c".to_string()])
    );
}

#[test]
fn test_all_unhealthy_is_unhealthy_not_warning() {
    let engine = HealthEngine::new(fixed_registry(&[("a", true), ("b", true)]));
    let assessment = engine.assess(&nominal_reading()).unwrap();
    assert_eq!(assessment.overall, OverallHealth::Unhealthy);
    assert!(assessment.onset_weight > 0.0);
}

#[test]
fn test_string_tag_roster_reconciles_like_binary() {
    let registry = PredictorRegistry::new()
        .register(
            ComponentSpec {
                name: "temperature".to_string(),
                features: vec![
                    channels::TEMPERATURE_ONE.to_string(),
                    channels::TEMPERATURE_TWO.to_string(),
                ],
                convention: LabelConvention::StringTag,
            },
            Arc::new(CutoffClassifier::new(90.0, LabelConvention::StringTag)),
        )
        .register(
            ComponentSpec {
                name: "vibration".to_string(),
                features: vec![
                    channels::VIBRATION_X.to_string(),
                    channels::VIBRATION_Y.to_string(),
                    channels::VIBRATION_Z.to_string(),
                ],
                convention: LabelConvention::StringTag,
            },
            Arc::new(CutoffClassifier::new(1.8, LabelConvention::StringTag)),
        );
    let engine = HealthEngine::new(registry);

    let assessment = engine.assess(&nominal_reading()).unwrap();
    assert_eq!(assessment.overall, OverallHealth::Healthy);
    assert_eq!(
        assessment.verdicts["temperature"].label,
        Label::Tag("healthy".to_string())
    );
}

#[test]
fn test_convention_mismatch_fails_reconciliation() {
    // Classifier emits numeric codes but the component declared string tags.
    let registry = PredictorRegistry::new().register(
        ComponentSpec {
            name: "temperature".to_string(),
            features: vec![channels::TEMPERATURE_ONE.to_string()],
            convention: LabelConvention::StringTag,
        },
        Arc::new(Fixed(Label::Code(1))),
    );
    let engine = HealthEngine::new(registry);

    let err = engine.assess(&nominal_reading()).unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_LABEL");
}

#[test]
fn test_batch_preconditions() {
    let engine = default_engine();

    assert_eq!(engine.assess_batch(&[]).unwrap_err(), EngineError::EmptyBatch);

    let exactly_cap: Vec<_> = (0..MAX_BATCH_SIZE).map(|_| nominal_reading()).collect();
    assert!(engine.assess_batch(&exactly_cap).is_ok());

    let over_cap: Vec<_> = (0..=MAX_BATCH_SIZE).map(|_| nominal_reading()).collect();
    assert_eq!(
        engine.assess_batch(&over_cap).unwrap_err(),
        EngineError::BatchTooLarge { len: MAX_BATCH_SIZE + 1, max: MAX_BATCH_SIZE }
    );
}

#[test]
fn test_batch_results_preserve_input_order() {
    let engine = default_engine();
    let cool = nominal_reading();
    let hot = nominal_reading()
        .with_channel(channels::TEMPERATURE_ONE, 130.0)
        .with_channel(channels::TEMPERATURE_TWO, 130.0);

    let outcome = engine.assess_batch(&[cool.clone(), hot, cool]).unwrap();
    let cool_avg = (22.24 + 18.69) / 2.0;
    let temps: Vec<f64> = outcome
        .per_reading
        .iter()
        .map(|r| r.as_ref().unwrap().average_temperature)
        .collect();
    assert_eq!(temps, vec![cool_avg, 130.0, cool_avg]);
}

#[test]
fn test_onset_weight_reproducible_across_engines() {
    let registry_a = fixed_registry(&[("a", true)]);
    let registry_b = fixed_registry(&[("a", true)]);
    let reading = nominal_reading();

    let w1 = HealthEngine::new(registry_a).assess(&reading).unwrap().onset_weight;
    let w2 = HealthEngine::new(registry_b).assess(&reading).unwrap().onset_weight;
    assert_eq!(w1, w2);

    // 3*(22.24+18.69) + 5*(0.27+0.093+0.115) + 2*(0.01+0.04+0.13) + 0.3 + 0.25
    let expected = 3.0 * 40.93 + 5.0 * 0.478 + 2.0 * 0.18 + 0.55;
    assert!((w1 - expected).abs() < 1e-9);
}
