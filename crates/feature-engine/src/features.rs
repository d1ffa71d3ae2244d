//! Feature Table Assembly

use crate::grouping::EngineGroups;
use crate::transforms::{compute_rul, first_difference, rolling_mean};
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use telemetry_loader::{column_names, TelemetryRecord};
use tracing::{debug, info};

/// Default rolling window (cycles)
pub const DEFAULT_WINDOW: usize = 5;

/// Channels that get rolling and difference features by default
pub const DEFAULT_CHANNELS: [usize; 3] = [7, 11, 12];

/// Feature construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Trailing window for rolling means
    pub window: usize,
    /// 1-based sensor channels to derive rolling/diff columns for
    pub channels: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            channels: DEFAULT_CHANNELS.to_vec(),
        }
    }
}

/// One engine cycle with its derived features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub engine_id: u32,
    pub cycle: u32,
    /// Ground-truth remaining cycles (run-to-failure data only)
    pub rul: u32,
    /// Values in `FeatureTable::columns` order
    pub values: Vec<f64>,
}

/// Feature table ordered by engine id, then cycle.
///
/// Per-engine lookups rely on that ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of a named column in row order
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Distinct engine ids in ascending order
    pub fn engine_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.rows.iter().map(|r| r.engine_id).collect();
        ids.dedup();
        ids
    }

    /// Rows belonging to one engine, in cycle order
    pub fn engine_rows(&self, engine_id: u32) -> impl Iterator<Item = &FeatureRow> {
        self.rows[self.engine_range(engine_id)].iter()
    }

    /// Row span of one engine; rows are grouped by ascending engine id
    fn engine_range(&self, engine_id: u32) -> Range<usize> {
        let start = self.rows.partition_point(|r| r.engine_id < engine_id);
        let end = start + self.rows[start..].partition_point(|r| r.engine_id == engine_id);
        start..end
    }

    /// `(cycle, value)` pairs of one column for one engine
    pub fn engine_series(&self, engine_id: u32, column: &str) -> Option<Vec<(f64, f64)>> {
        let idx = self.column_index(column)?;
        let series: Vec<(f64, f64)> = self
            .engine_rows(engine_id)
            .map(|r| (r.cycle as f64, r.values[idx]))
            .collect();
        if series.is_empty() {
            None
        } else {
            Some(series)
        }
    }

    /// Engine with the most recorded cycles; ties go to the lowest id
    pub fn longest_engine(&self) -> Option<u32> {
        let mut best: Option<(u32, usize)> = None;
        for id in self.engine_ids() {
            let count = self.engine_range(id).len();
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((id, count));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Builds the full feature table from loaded telemetry
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create a new feature builder
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Derived column names for the configured channels
    pub fn derived_columns(&self) -> Vec<String> {
        let rolling = self
            .config
            .channels
            .iter()
            .map(|ch| format!("sensor_{}_rollmean_w{}", ch, self.config.window));
        let deltas = self.config.channels.iter().map(|ch| format!("sensor_{}_diff", ch));
        rolling.chain(deltas).collect()
    }

    /// Every column name `build` produces, in order
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = column_names()[2..].iter().map(|c| c.to_string()).collect();
        columns.extend(self.derived_columns());
        columns
    }

    /// Settings, raw sensors and derived columns with RUL labels.
    ///
    /// Input records are left untouched; rows come out grouped by engine and
    /// sorted by cycle.
    pub fn build(&self, records: &[TelemetryRecord]) -> Result<FeatureTable, FeatureError> {
        let columns = self.columns();

        let mut derived: Vec<Vec<f64>> = Vec::with_capacity(self.config.channels.len() * 2);
        for &channel in &self.config.channels {
            derived.push(rolling_mean(records, channel, self.config.window)?);
        }
        for &channel in &self.config.channels {
            derived.push(first_difference(records, channel)?);
        }
        debug!("Derived {} feature columns", derived.len());

        let rul = compute_rul(records);
        let groups = EngineGroups::from_records(records);
        let mut rows = Vec::with_capacity(records.len());

        for (engine_id, indices) in groups.iter() {
            for &i in indices {
                let record = &records[i];
                let mut values = Vec::with_capacity(columns.len());
                values.extend_from_slice(&record.settings);
                values.extend_from_slice(&record.sensors);
                values.extend(derived.iter().map(|col| col[i]));

                rows.push(FeatureRow {
                    engine_id,
                    cycle: record.cycle,
                    rul: rul[i],
                    values,
                });
            }
        }

        info!(
            "Built feature table: {} rows x {} columns over {} engines",
            rows.len(),
            columns.len(),
            groups.len()
        );

        Ok(FeatureTable { columns, rows })
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet() -> Vec<TelemetryRecord> {
        let mut records = Vec::new();
        for (engine_id, cycles) in [(2u32, 3u32), (1, 6)] {
            for cycle in (1..=cycles).rev() {
                let mut r = TelemetryRecord {
                    engine_id,
                    cycle,
                    ..Default::default()
                };
                r.sensors[6] = 550.0 + cycle as f64;
                r.sensors[10] = 47.0 + engine_id as f64;
                r.sensors[11] = 520.0 - cycle as f64;
                records.push(r);
            }
        }
        records
    }

    #[test]
    fn test_column_layout() {
        let table = FeatureBuilder::default().build(&fleet()).unwrap();

        assert_eq!(table.columns.len(), 3 + 21 + 6);
        assert_eq!(table.columns[0], "setting_1");
        assert_eq!(table.columns[3], "sensor_1");
        assert_eq!(table.columns[24], "sensor_7_rollmean_w5");
        assert_eq!(table.columns[26], "sensor_12_rollmean_w5");
        assert_eq!(table.columns[27], "sensor_7_diff");
        assert!(table.column_index("engine_id").is_none());
        assert!(table.column_index("cycle").is_none());
        assert!(table.rows.iter().all(|r| r.values.len() == table.columns.len()));
    }

    #[test]
    fn test_rows_grouped_and_sorted() {
        let table = FeatureBuilder::default().build(&fleet()).unwrap();

        assert_eq!(table.engine_ids(), vec![1, 2]);
        let order: Vec<(u32, u32)> = table.rows.iter().map(|r| (r.engine_id, r.cycle)).collect();
        assert_eq!(order[0], (1, 1));
        assert_eq!(order[5], (1, 6));
        assert_eq!(order[6], (2, 1));
        assert_eq!(table.rows[0].rul, 5);
        assert_eq!(table.rows[5].rul, 0);
        assert_eq!(table.rows[8].rul, 0);
    }

    #[test]
    fn test_derived_values() {
        let table = FeatureBuilder::default().build(&fleet()).unwrap();
        let roll = table.column("sensor_7_rollmean_w5").unwrap();
        let delta = table.column("sensor_7_diff").unwrap();

        // engine 1, cycle 1 and cycle 6
        assert_eq!(roll[0], 551.0);
        assert!((roll[5] - 554.0).abs() < 1e-9);
        assert_eq!(delta[0], 0.0);
        assert!((delta[1] - 1.0).abs() < 1e-9);
        // engine 2 starts fresh
        assert_eq!(roll[6], 551.0);
        assert_eq!(delta[6], 0.0);
    }

    #[test]
    fn test_engine_series_and_longest() {
        let table = FeatureBuilder::default().build(&fleet()).unwrap();

        let series = table.engine_series(2, "sensor_12").unwrap();
        assert_eq!(series, vec![(1.0, 519.0), (2.0, 518.0), (3.0, 517.0)]);
        assert!(table.engine_series(9, "sensor_12").is_none());
        assert!(table.engine_series(2, "sensor_99").is_none());
        assert_eq!(table.longest_engine(), Some(1));
    }

    #[test]
    fn test_custom_channels_and_window() {
        let builder = FeatureBuilder::new(FeatureConfig {
            window: 3,
            channels: vec![2],
        });
        assert_eq!(
            builder.derived_columns(),
            vec!["sensor_2_rollmean_w3".to_string(), "sensor_2_diff".to_string()]
        );

        let bad = FeatureBuilder::new(FeatureConfig {
            window: 5,
            channels: vec![30],
        });
        assert_eq!(bad.build(&fleet()).unwrap_err(), FeatureError::UnknownChannel(30));
    }

    #[test]
    fn test_engine_rows_by_span() {
        let mut records = fleet();
        records.extend((1..=4).map(|cycle| TelemetryRecord {
            engine_id: 7,
            cycle,
            ..Default::default()
        }));
        let table = FeatureBuilder::default().build(&records).unwrap();

        assert_eq!(table.engine_rows(1).count(), 6);
        let middle: Vec<u32> = table.engine_rows(2).map(|r| r.cycle).collect();
        assert_eq!(middle, vec![1, 2, 3]);
        assert_eq!(table.engine_rows(7).count(), 4);
        assert_eq!(table.engine_rows(0).count(), 0);
        assert_eq!(table.engine_rows(5).count(), 0);
        assert_eq!(table.engine_rows(99).count(), 0);
        assert_eq!(FeatureTable::default().engine_rows(1).count(), 0);
    }

    #[test]
    fn test_columns_match_built_table() {
        let builder = FeatureBuilder::new(FeatureConfig {
            window: 3,
            channels: vec![4, 9],
        });
        let table = builder.build(&fleet()).unwrap();
        assert_eq!(builder.columns(), table.columns);
        assert!(builder.columns().contains(&"sensor_9_rollmean_w3".to_string()));
    }
}
