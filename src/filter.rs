//! Row selection
//!
//! A [`Filter`] is a conjunction of [`Predicate`]s. Since every predicate only
//! looks at a single record, the order in which they are checked does not
//! matter and filtering an already filtered set is a no-op.

use crate::dataset::{Column, Record};
use std::fmt;

/// Condition that a record must satisfy to be kept
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Predicate {
    /// Column is exactly equal to a constant
    Equals(Column, f64),

    /// Column is lower than or equal to a bound
    AtMost(Column, f64),

    /// Column is strictly positive
    Positive(Column),

    /// Column holds an even integer
    Even(Column),
}
//
impl Predicate {
    /// Column which this predicate looks at
    pub fn column(&self) -> Column {
        match *self {
            Self::Equals(column, _)
            | Self::AtMost(column, _)
            | Self::Positive(column)
            | Self::Even(column) => column,
        }
    }

    /// Truth that a record satisfies this predicate
    pub fn matches(&self, record: &Record) -> bool {
        let value = self.column().get(record);
        match *self {
            Self::Equals(_, expected) => value == expected,
            Self::AtMost(_, bound) => value <= bound,
            Self::Positive(_) => value > 0.0,
            Self::Even(_) => value % 2.0 == 0.0,
        }
    }
}
//
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(column, expected) => write!(f, "{column} == {expected}"),
            Self::AtMost(column, bound) => write!(f, "{column} <= {bound}"),
            Self::Positive(column) => write!(f, "{column} > 0"),
            Self::Even(column) => write!(f, "{column} % 2 == 0"),
        }
    }
}

/// Conjunction of predicates
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter(Vec<Predicate>);
//
impl Filter {
    /// Filter that accepts every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.0.push(predicate);
        self
    }

    /// Drop every predicate that looks at a certain column
    pub fn without(mut self, column: Column) -> Self {
        self.0.retain(|predicate| predicate.column() != column);
        self
    }

    /// Predicates that records must satisfy
    pub fn predicates(&self) -> &[Predicate] {
        &self.0[..]
    }

    /// Truth that a record satisfies every predicate
    pub fn accepts(&self, record: &Record) -> bool {
        self.0.iter().all(|predicate| predicate.matches(record))
    }

    /// Select the records that satisfy every predicate, preserving their order
    pub fn apply<'data>(
        &self,
        records: impl IntoIterator<Item = &'data Record>,
    ) -> Vec<&'data Record> {
        let mut considered = 0;
        let selected = records
            .into_iter()
            .inspect(|_| considered += 1)
            .filter(|record| self.accepts(record))
            .collect::<Vec<_>>();
        log::debug!(
            "Filter ({self}) kept {} out of {considered} records",
            selected.len()
        );
        selected
    }
}
//
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut predicates = self.predicates().iter();
        let Some(first) = predicates.next() else {
            return f.write_str("true");
        };
        write!(f, "{first}")?;
        predicates.try_for_each(|predicate| write!(f, " && {predicate}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(k: f64, ngrams_count: f64, syn_meta: f64) -> Record {
        Record {
            k,
            ngrams_count,
            syn_meta,
            ..Record::default()
        }
    }

    #[test]
    fn ngrams_count_must_be_even_and_positive() {
        let records = (0..=4)
            .map(|count| record(1.0, count as f64, 5.0))
            .collect::<Vec<_>>();
        let filter = Filter::new()
            .with(Predicate::Even(Column::NgramsCount))
            .with(Predicate::Positive(Column::NgramsCount));
        let kept = filter
            .apply(&records)
            .into_iter()
            .map(|r| r.ngrams_count)
            .collect::<Vec<_>>();
        assert_eq!(kept, [2.0, 4.0]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = (1..=6)
            .map(|k| record(k as f64, (k % 3) as f64, (k % 2) as f64))
            .collect::<Vec<_>>();
        let filter = Filter::new()
            .with(Predicate::AtMost(Column::K, 4.0))
            .with(Predicate::Equals(Column::SynMeta, 1.0));
        let once = filter.apply(&records);
        let twice = filter.apply(once.iter().copied());
        assert_eq!(once, twice);
        assert_eq!(once.iter().map(|r| r.k).collect::<Vec<_>>(), [1.0, 3.0]);
    }

    #[test]
    fn predicate_order_does_not_matter() {
        let records = (0..10)
            .map(|i| record(i as f64, (i * 2) as f64, (i % 3) as f64))
            .collect::<Vec<_>>();
        let a = Filter::new()
            .with(Predicate::AtMost(Column::K, 7.0))
            .with(Predicate::Equals(Column::SynMeta, 0.0))
            .with(Predicate::Positive(Column::NgramsCount));
        let b = Filter::new()
            .with(Predicate::Positive(Column::NgramsCount))
            .with(Predicate::Equals(Column::SynMeta, 0.0))
            .with(Predicate::AtMost(Column::K, 7.0));
        assert_eq!(a.apply(&records), b.apply(&records));
    }

    #[test]
    fn no_match_is_an_empty_selection() {
        let records = [record(1.0, 2.0, 5.0)];
        let filter = Filter::new().with(Predicate::Equals(Column::SynMeta, 3.0));
        assert!(filter.apply(&records).is_empty());
        assert!(filter.apply(std::iter::empty()).is_empty());
    }

    #[test]
    fn display() {
        let filter = Filter::new()
            .with(Predicate::Equals(Column::Missing, 0.6))
            .with(Predicate::Even(Column::NgramsCount));
        assert_eq!(filter.to_string(), "%missing == 0.6 && ngrams_count % 2 == 0");
        assert_eq!(Filter::new().to_string(), "true");
    }

    #[test]
    fn without_drops_all_predicates_on_a_column() {
        let filter = Filter::new()
            .with(Predicate::Equals(Column::SynMeta, 5.0))
            .with(Predicate::AtMost(Column::K, 3.0))
            .with(Predicate::Positive(Column::SynMeta))
            .without(Column::SynMeta);
        assert_eq!(filter.predicates(), [Predicate::AtMost(Column::K, 3.0)]);
    }
}
