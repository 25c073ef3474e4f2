//! Grouped statistics over filtered records

use crate::dataset::{Column, Record};
use ordered_float::OrderedFloat;
use std::collections::{btree_map, BTreeMap};

/// Identity of a group: the values of the grouping columns, in order
///
/// Ordering is lexicographic, which is the order in which groups are plotted.
pub type GroupKey = Box<[OrderedFloat<f64>]>;

/// Quantity that is aggregated within each group
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Measure {
    /// Value of a single column
    Column(Column),

    /// Row-wise sum of several columns
    Sum(&'static [Column]),
}
//
impl Measure {
    /// Evaluate the measure on a record
    pub fn get(&self, record: &Record) -> f64 {
        match self {
            Self::Column(column) => column.get(record),
            Self::Sum(columns) => columns.iter().map(|column| column.get(record)).sum(),
        }
    }
}

/// Reduction from the records of a group to a single value
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Aggregator {
    /// Arithmetic mean of the measure
    Mean,

    /// Maximum of the measure for each distinct value of `entity`, then mean
    /// of these maxima
    MaxThenMean { entity: Column },
}

/// Partition records by the values of `keys`, then reduce the `measure` of
/// each partition using `aggregator`
///
/// An empty `keys` list puts all records in a single group, whose key is
/// empty. No records means no groups.
pub fn group_and_aggregate<'data>(
    records: impl IntoIterator<Item = &'data Record>,
    keys: &[Column],
    measure: Measure,
    aggregator: Aggregator,
) -> BTreeMap<GroupKey, f64> {
    let mut groups = BTreeMap::<GroupKey, GroupStats>::new();
    for record in records {
        let key = (keys.iter())
            .map(|column| OrderedFloat(column.get(record)))
            .collect::<GroupKey>();
        let value = measure.get(record);
        match groups.entry(key) {
            btree_map::Entry::Occupied(o) => o.into_mut().add(record, value),
            btree_map::Entry::Vacant(v) => v.insert(GroupStats::new(aggregator)).add(record, value),
        }
    }
    log::debug!(
        "Grouped records by {keys:?} into {} groups, aggregating {measure:?} with {aggregator:?}",
        groups.len()
    );
    (groups.into_iter())
        .filter_map(|(key, stats)| {
            let result = stats.finish()?;
            log::trace!("Group {key:?} aggregates to {result}");
            Some((key, result))
        })
        .collect()
}

/// Running arithmetic mean
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeanStats {
    /// Sum of the values seen so far
    sum: f64,

    /// Number of values seen so far
    count: usize,
}
//
impl MeanStats {
    /// Integrate a new value
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Mean of the values seen so far, if any
    pub fn finish(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Accumulated knowledge about one group
#[derive(Clone, Debug, PartialEq)]
enum GroupStats {
    /// State of the [`Aggregator::Mean`] reduction
    Mean(MeanStats),

    /// State of the [`Aggregator::MaxThenMean`] reduction
    MaxThenMean {
        /// Column that identifies entities
        entity: Column,

        /// Maximal value seen so far for each entity
        maxima: BTreeMap<OrderedFloat<f64>, f64>,
    },
}
//
impl GroupStats {
    /// Set up the accumulator of an aggregator
    fn new(aggregator: Aggregator) -> Self {
        match aggregator {
            Aggregator::Mean => Self::Mean(MeanStats::default()),
            Aggregator::MaxThenMean { entity } => Self::MaxThenMean {
                entity,
                maxima: BTreeMap::new(),
            },
        }
    }

    /// Integrate the measure of a new record
    fn add(&mut self, record: &Record, value: f64) {
        match self {
            Self::Mean(stats) => stats.add(value),
            Self::MaxThenMean { entity, maxima } => {
                match maxima.entry(OrderedFloat(entity.get(record))) {
                    btree_map::Entry::Occupied(o) => {
                        let max = o.into_mut();
                        *max = max.max(value);
                    }
                    btree_map::Entry::Vacant(v) => {
                        v.insert(value);
                    }
                }
            }
        }
    }

    /// Final value of the reduction
    fn finish(self) -> Option<f64> {
        match self {
            Self::Mean(stats) => stats.finish(),
            Self::MaxThenMean { maxima, .. } => {
                let mut mean = MeanStats::default();
                maxima.into_values().for_each(|max| mean.add(max));
                mean.finish()
            }
        }
    }
}
