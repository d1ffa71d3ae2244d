//! Per-Engine Column Transforms
//!
//! Each transform returns a new column aligned to the input record order.

use crate::grouping::EngineGroups;
use crate::statistics::{diff, trailing_rolling_mean};
use crate::FeatureError;
use telemetry_loader::TelemetryRecord;

/// Remaining useful life per record: engine max cycle minus record cycle.
///
/// Only meaningful for run-to-failure data; censored in-service series get
/// labels relative to their last observed cycle.
pub fn compute_rul(records: &[TelemetryRecord]) -> Vec<u32> {
    let groups = EngineGroups::from_records(records);
    let mut rul = vec![0; records.len()];

    for (_, indices) in groups.iter() {
        let max_cycle = indices.iter().map(|&i| records[i].cycle).max().unwrap_or(0);
        for &i in indices {
            rul[i] = max_cycle - records[i].cycle;
        }
    }

    rul
}

/// Trailing rolling mean of one sensor channel, per engine, min periods 1
pub fn rolling_mean(
    records: &[TelemetryRecord],
    channel: usize,
    window: usize,
) -> Result<Vec<f64>, FeatureError> {
    if window == 0 {
        return Err(FeatureError::InvalidWindow(window));
    }
    per_engine(records, channel, |values| trailing_rolling_mean(values, window))
}

/// Cycle-over-cycle change of one sensor channel, 0 at each engine's first cycle
pub fn first_difference(
    records: &[TelemetryRecord],
    channel: usize,
) -> Result<Vec<f64>, FeatureError> {
    per_engine(records, channel, diff)
}

/// Apply a sequence transform to each engine's cycle-ordered channel values
/// and scatter the results back to input positions.
fn per_engine<F>(records: &[TelemetryRecord], channel: usize, f: F) -> Result<Vec<f64>, FeatureError>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    if TelemetryRecord::sensor_name(channel).is_none() {
        return Err(FeatureError::UnknownChannel(channel));
    }

    let groups = EngineGroups::from_records(records);
    let mut out = vec![0.0; records.len()];

    for (_, indices) in groups.iter() {
        let values: Vec<f64> = indices
            .iter()
            .map(|&i| records[i].sensors[channel - 1])
            .collect();
        for (&i, v) in indices.iter().zip(f(&values)) {
            out[i] = v;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine(engine_id: u32, sensor_7: &[f64]) -> Vec<TelemetryRecord> {
        sensor_7
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let mut r = TelemetryRecord {
                    engine_id,
                    cycle: i as u32 + 1,
                    ..Default::default()
                };
                r.sensors[6] = v;
                r
            })
            .collect()
    }

    #[test]
    fn test_rul_single_cycle_is_zero() {
        let records = engine(4, &[553.0]);
        assert_eq!(compute_rul(&records), vec![0]);
    }

    #[test]
    fn test_rul_counts_down_to_zero() {
        let mut records = engine(1, &[1.0, 2.0, 3.0]);
        records.extend(engine(2, &[1.0, 2.0]));

        assert_eq!(compute_rul(&records), vec![2, 1, 0, 1, 0]);
    }

    #[test]
    fn test_rolling_mean_does_not_leak_across_engines() {
        let mut records = engine(1, &[10.0, 20.0, 30.0]);
        records.extend(engine(2, &[100.0, 200.0]));

        let means = rolling_mean(&records, 7, 5).unwrap();
        assert_eq!(means, vec![10.0, 15.0, 20.0, 100.0, 150.0]);
    }

    #[test]
    fn test_rolling_mean_window_semantics() {
        let records = engine(1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let means = rolling_mean(&records, 7, 5).unwrap();

        assert_eq!(means[0], 1.0);
        assert!((means[4] - 3.0).abs() < 1e-12);
        assert!((means[7] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_input_is_sorted_per_engine() {
        let mut records = engine(1, &[1.0, 2.0, 4.0]);
        records.reverse();

        let deltas = first_difference(&records, 7).unwrap();
        // records[2] is cycle 1
        assert_eq!(deltas, vec![2.0, 1.0, 0.0]);

        let means = rolling_mean(&records, 7, 2).unwrap();
        assert_eq!(means, vec![3.0, 1.5, 1.0]);
    }

    #[test]
    fn test_first_difference_zero_at_first_cycle() {
        let mut records = engine(1, &[5.0, 7.0]);
        records.extend(engine(2, &[9.0, 6.0]));

        let deltas = first_difference(&records, 7).unwrap();
        assert_eq!(deltas, vec![0.0, 2.0, 0.0, -3.0]);
    }

    #[test]
    fn test_invalid_channel_and_window() {
        let records = engine(1, &[1.0]);
        assert_eq!(
            rolling_mean(&records, 22, 5),
            Err(FeatureError::UnknownChannel(22))
        );
        assert_eq!(
            first_difference(&records, 0),
            Err(FeatureError::UnknownChannel(0))
        );
        assert_eq!(
            rolling_mean(&records, 7, 0),
            Err(FeatureError::InvalidWindow(0))
        );
    }

    proptest! {
        #[test]
        fn prop_rul_bounds(lengths in proptest::collection::vec(1usize..60, 1..6)) {
            let mut records = Vec::new();
            for (id, &len) in lengths.iter().enumerate() {
                records.extend(engine(id as u32 + 1, &vec![0.0; len]));
            }
            let rul = compute_rul(&records);

            let mut offset = 0;
            for &len in &lengths {
                let group = &rul[offset..offset + len];
                prop_assert_eq!(*group.iter().max().unwrap() as usize, len - 1);
                prop_assert_eq!(group[len - 1], 0);
                offset += len;
            }
        }

        #[test]
        fn prop_first_difference_starts_at_zero(
            values in proptest::collection::vec(-1000.0f64..1000.0, 1..40),
            engines in 1u32..4,
        ) {
            let mut records = Vec::new();
            for id in 0..engines {
                records.extend(engine(id, &values));
            }
            let deltas = first_difference(&records, 7).unwrap();
            for id in 0..engines as usize {
                let first = deltas[id * values.len()];
                prop_assert_eq!(first, 0.0);
            }
        }
    }
}
