//! Grouped View over Engine Time Series

use std::collections::BTreeMap;
use telemetry_loader::TelemetryRecord;

/// Read-only grouping of record indices by engine id.
///
/// Indices within each group are sorted by cycle, so windowed transforms do
/// not depend on the order rows arrived in. Sorting is stable: duplicated
/// cycles keep their input order.
#[derive(Debug, Clone, Default)]
pub struct EngineGroups {
    groups: BTreeMap<u32, Vec<usize>>,
}

impl EngineGroups {
    /// Group records by engine id, each group sorted by cycle
    pub fn from_records(records: &[TelemetryRecord]) -> Self {
        let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            groups.entry(record.engine_id).or_default().push(idx);
        }
        for indices in groups.values_mut() {
            indices.sort_by_key(|&i| records[i].cycle);
        }
        Self { groups }
    }

    /// Iterate groups in ascending engine id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[usize])> {
        self.groups.iter().map(|(&id, idx)| (id, idx.as_slice()))
    }

    /// Engine ids in ascending order
    pub fn engine_ids(&self) -> Vec<u32> {
        self.groups.keys().copied().collect()
    }

    /// Number of engines
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(engine_id: u32, cycle: u32) -> TelemetryRecord {
        TelemetryRecord {
            engine_id,
            cycle,
            ..Default::default()
        }
    }

    #[test]
    fn test_groups_sorted_by_cycle() {
        let records = vec![record(2, 2), record(1, 3), record(2, 1), record(1, 1), record(1, 2)];
        let groups = EngineGroups::from_records(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.engine_ids(), vec![1, 2]);
        let collected: Vec<(u32, Vec<usize>)> =
            groups.iter().map(|(id, idx)| (id, idx.to_vec())).collect();
        assert_eq!(collected, vec![(1, vec![3, 4, 1]), (2, vec![2, 0])]);
    }

    #[test]
    fn test_empty() {
        let groups = EngineGroups::from_records(&[]);
        assert!(groups.is_empty());
        assert_eq!(groups.iter().count(), 0);
    }
}
