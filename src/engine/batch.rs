//! Batch Aggregator — runs the engine over a bounded batch of readings and
//! reduces the per-reading results to one consensus verdict.
//!
//! Categorical fields are reduced by majority vote with ties broken by the
//! first-encountered category in original input order; numeric fields by
//! arithmetic mean, except peak vibration which takes the batch maximum so a
//! single hazardous reading is never diluted by averaging.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::reconciler::normalize_label;
use super::{EngineError, HealthEngine, ReadingAssessment, MAX_BATCH_SIZE};
use crate::types::{
    HealthClass, MachineCondition, SensorReading, TemperatureAnomaly, VibrationAnomaly,
};

/// Consensus verdict over the successfully assessed readings of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchVerdict {
    pub readings_total: usize,
    pub readings_assessed: usize,
    pub overall_health: HealthClass,
    pub temperature_anomaly: TemperatureAnomaly,
    pub vibration_anomaly: VibrationAnomaly,
    pub machine_condition: MachineCondition,
    pub mean_average_temperature: f64,
    /// Max, not mean: peak hazard must survive aggregation.
    pub max_peak_vibration: f64,
    pub mean_onset_weight: f64,
    /// Per component, the fraction of assessed readings whose normalized
    /// verdict was unhealthy (labels normalized to 0/1 before averaging).
    pub component_unhealthy_rate: BTreeMap<String, f64>,
}

/// Result of one batch request: per-reading outcomes in input order, plus the
/// consensus verdict when at least one reading was assessed.
#[derive(Debug)]
pub struct BatchOutcome {
    pub per_reading: Vec<Result<ReadingAssessment, EngineError>>,
    pub aggregate: Option<BatchVerdict>,
}

impl HealthEngine {
    /// Assess every reading in the batch and reduce to a consensus verdict.
    ///
    /// Preconditions are checked before any classifier runs: more than
    /// [`MAX_BATCH_SIZE`] readings is `BatchTooLarge`, zero is `EmptyBatch`.
    /// Readings are independent and evaluated in parallel; results are merged
    /// back in original input order, which the majority-vote tie-break
    /// depends on.
    pub fn assess_batch(&self, readings: &[SensorReading]) -> Result<BatchOutcome, EngineError> {
        if readings.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        if readings.len() > MAX_BATCH_SIZE {
            return Err(EngineError::BatchTooLarge {
                len: readings.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        // Indexed parallel map collects in input order.
        let per_reading: Vec<Result<ReadingAssessment, EngineError>> =
            readings.par_iter().map(|r| self.assess(r)).collect();

        let aggregate = self.reduce(&per_reading, readings.len());
        debug!(
            total = readings.len(),
            assessed = aggregate.as_ref().map_or(0, |a| a.readings_assessed),
            "batch assessed"
        );

        Ok(BatchOutcome { per_reading, aggregate })
    }

    fn reduce(
        &self,
        per_reading: &[Result<ReadingAssessment, EngineError>],
        total: usize,
    ) -> Option<BatchVerdict> {
        let assessed: Vec<&ReadingAssessment> =
            per_reading.iter().filter_map(|r| r.as_ref().ok()).collect();
        if assessed.is_empty() {
            return None;
        }
        let n = assessed.len() as f64;

        let overall_health = majority_vote(assessed.iter().map(|a| a.overall.class()))?;
        let temperature_anomaly = majority_vote(assessed.iter().map(|a| a.temperature_anomaly))?;
        let vibration_anomaly = majority_vote(assessed.iter().map(|a| a.vibration_anomaly))?;
        let machine_condition = majority_vote(assessed.iter().map(|a| a.machine_condition))?;

        let mean_average_temperature =
            assessed.iter().map(|a| a.average_temperature).sum::<f64>() / n;
        let max_peak_vibration = assessed
            .iter()
            .map(|a| a.peak_vibration)
            .fold(f64::NEG_INFINITY, f64::max);
        let mean_onset_weight = assessed.iter().map(|a| a.onset_weight).sum::<f64>() / n;

        Some(BatchVerdict {
            readings_total: total,
            readings_assessed: assessed.len(),
            overall_health,
            temperature_anomaly,
            vibration_anomaly,
            machine_condition,
            mean_average_temperature,
            max_peak_vibration,
            mean_onset_weight,
            component_unhealthy_rate: self.component_unhealthy_rates(&assessed),
        })
    }

    /// Mean unhealthy-rate per component over the readings that produced a
    /// verdict for it. Labels were already normalized successfully during
    /// reconciliation, so normalization failures cannot occur here.
    fn component_unhealthy_rates(&self, assessed: &[&ReadingAssessment]) -> BTreeMap<String, f64> {
        let conventions = self.registry().conventions();
        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for assessment in assessed {
            for (name, verdict) in &assessment.verdicts {
                let Some(convention) = conventions.get(name).copied() else {
                    continue;
                };
                let Ok(unhealthy) = normalize_label(name, &verdict.label, convention) else {
                    continue;
                };
                let entry = sums.entry(name.clone()).or_insert((0.0, 0));
                entry.0 += f64::from(u8::from(unhealthy));
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .map(|(name, (sum, count))| (name, sum / count as f64))
            .collect()
    }
}

/// Majority vote with a deterministic tie-break: counts accumulate in
/// first-encounter order, and a tie resolves to the earliest-seen category.
fn majority_vote<T: PartialEq>(items: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }

    let mut best: Option<usize> = None;
    for (idx, (_, count)) in counts.iter().enumerate() {
        // Strict comparison keeps the earliest first-seen winner on ties.
        if best.map_or(true, |b| *count > counts[b].1) {
            best = Some(idx);
        }
    }
    best.map(|idx| counts.swap_remove(idx).0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ComponentSpec, CutoffClassifier, PredictorRegistry};
    use crate::types::{channels, LabelConvention};
    use std::sync::Arc;

    fn engine(temp_cutoff: f64) -> HealthEngine {
        let registry = PredictorRegistry::new()
            .register(
                ComponentSpec {
                    name: "temperature".to_string(),
                    features: vec![
                        channels::TEMPERATURE_ONE.to_string(),
                        channels::TEMPERATURE_TWO.to_string(),
                    ],
                    convention: LabelConvention::BinaryCode,
                },
                Arc::new(CutoffClassifier::new(temp_cutoff, LabelConvention::BinaryCode)),
            )
            .register(
                ComponentSpec {
                    name: "vibration".to_string(),
                    features: vec![
                        channels::VIBRATION_X.to_string(),
                        channels::VIBRATION_Y.to_string(),
                        channels::VIBRATION_Z.to_string(),
                    ],
                    convention: LabelConvention::BinaryCode,
                },
                Arc::new(CutoffClassifier::new(1.8, LabelConvention::BinaryCode)),
            );
        HealthEngine::new(registry)
    }

    fn reading(temp: f64, vib: f64) -> SensorReading {
        SensorReading::new()
            .with_channel(channels::TEMPERATURE_ONE, temp)
            .with_channel(channels::TEMPERATURE_TWO, temp)
            .with_channel(channels::VIBRATION_X, vib)
            .with_channel(channels::VIBRATION_Y, vib)
            .with_channel(channels::VIBRATION_Z, vib)
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert_eq!(engine(50.0).assess_batch(&[]).unwrap_err(), EngineError::EmptyBatch);
    }

    #[test]
    fn test_batch_size_cap() {
        let eng = engine(50.0);
        let ok: Vec<_> = (0..MAX_BATCH_SIZE).map(|_| reading(20.0, 0.1)).collect();
        assert!(eng.assess_batch(&ok).is_ok());

        let too_many: Vec<_> = (0..=MAX_BATCH_SIZE).map(|_| reading(20.0, 0.1)).collect();
        assert_eq!(
            eng.assess_batch(&too_many).unwrap_err(),
            EngineError::BatchTooLarge { len: 201, max: 200 }
        );
    }

    #[test]
    fn test_majority_vote_tie_breaks_to_first_seen() {
        // 2 healthy, 2 unhealthy; the first reading is healthy.
        let eng = engine(50.0);
        let batch = vec![
            reading(20.0, 0.1), // healthy
            reading(90.0, 9.0), // unhealthy (both components)
            reading(21.0, 0.1), // healthy
            reading(95.0, 9.0), // unhealthy
        ];
        let outcome = eng.assess_batch(&batch).unwrap();
        let verdict = outcome.aggregate.unwrap();
        assert_eq!(verdict.overall_health, HealthClass::Healthy);

        // Reversed input: the unhealthy class is first-encountered.
        let reversed: Vec<_> = batch.into_iter().rev().collect();
        let verdict = eng.assess_batch(&reversed).unwrap().aggregate.unwrap();
        assert_eq!(verdict.overall_health, HealthClass::Unhealthy);
    }

    #[test]
    fn test_numeric_reductions_mean_and_max() {
        let eng = engine(500.0); // everything healthy
        let batch = vec![reading(20.0, 0.1), reading(40.0, 0.5), reading(60.0, 0.3)];
        let verdict = eng.assess_batch(&batch).unwrap().aggregate.unwrap();

        assert_eq!(verdict.mean_average_temperature, 40.0);
        // Peak vibration is the batch max, not the mean.
        assert_eq!(verdict.max_peak_vibration, 0.5);
        assert_eq!(verdict.readings_total, 3);
        assert_eq!(verdict.readings_assessed, 3);
    }

    #[test]
    fn test_component_unhealthy_rate() {
        let eng = engine(50.0);
        // Temperature unhealthy in 1 of 4 readings; vibration always healthy.
        let batch = vec![
            reading(20.0, 0.1),
            reading(90.0, 0.1),
            reading(21.0, 0.1),
            reading(22.0, 0.1),
        ];
        let verdict = eng.assess_batch(&batch).unwrap().aggregate.unwrap();
        assert_eq!(verdict.component_unhealthy_rate["temperature"], 0.25);
        assert_eq!(verdict.component_unhealthy_rate["vibration"], 0.0);
    }

    #[test]
    fn test_failed_readings_isolated_from_batch() {
        let eng = engine(50.0);
        let mut batch = vec![reading(20.0, 0.1)];
        // Second reading is missing the vibration channels entirely.
        batch.push(
            SensorReading::new()
                .with_channel(channels::TEMPERATURE_ONE, 20.0)
                .with_channel(channels::TEMPERATURE_TWO, 20.0),
        );
        batch.push(reading(21.0, 0.1));

        let outcome = eng.assess_batch(&batch).unwrap();
        assert!(outcome.per_reading[0].is_ok());
        assert!(matches!(
            outcome.per_reading[1],
            Err(EngineError::MissingFeature { .. })
        ));
        assert!(outcome.per_reading[2].is_ok());

        let verdict = outcome.aggregate.unwrap();
        assert_eq!(verdict.readings_total, 3);
        assert_eq!(verdict.readings_assessed, 2);
    }

    #[test]
    fn test_all_readings_failed_has_no_aggregate() {
        let eng = engine(50.0);
        let batch = vec![SensorReading::new().with_channel(channels::TEMPERATURE_ONE, 20.0)];
        let outcome = eng.assess_batch(&batch).unwrap();
        assert!(outcome.aggregate.is_none());
        assert!(outcome.per_reading[0].is_err());
    }

    #[test]
    fn test_majority_vote_helper() {
        assert_eq!(majority_vote(["a", "b", "b", "c"].into_iter()), Some("b"));
        // Tie between a and b: a was seen first.
        assert_eq!(majority_vote(["a", "b", "b", "a"].into_iter()), Some("a"));
        assert_eq!(majority_vote(std::iter::empty::<&str>()), None);
    }
}
