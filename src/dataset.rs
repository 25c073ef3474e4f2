//! In-memory representation of the evaluation results
//!
//! Each row of the results file describes the outcome of mapping one test
//! sentence (identified by `id`) at candidate rank `k`, under one combination
//! of the mapper's tuning parameters.

use serde::Deserialize;
use std::{fmt, sync::Arc};

/// One row of the results file
///
/// Every column is read as a float, because that is how the thresholds and
/// measurements are compared and averaged later on. Columns of the file that
/// are not listed here are ignored.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct Record {
    /// Identifier of the evaluated test case
    pub id: f64,

    /// Rank of the candidate interpretation
    pub k: f64,

    // Tuning parameters of the run
    #[serde(rename = "simMember")]
    pub sim_member: f64,
    #[serde(rename = "simMeta")]
    pub sim_meta: f64,
    #[serde(rename = "synMember")]
    pub syn_member: f64,
    #[serde(rename = "synMeta")]
    pub syn_meta: f64,
    #[serde(rename = "%missing")]
    pub missing: f64,
    #[serde(rename = "maxDistance")]
    pub max_distance: f64,
    #[serde(rename = "ngramSize")]
    pub ngram_size: f64,

    /// Number of ngrams recognized in the test sentence
    pub ngrams_count: f64,

    /// Similarity between the produced and the expected interpretation
    pub similarity: f64,

    /// Number of candidate mappings without pruning
    pub sentence_count: f64,

    /// Number of distinct candidate mappings
    pub sentence_count_pruned: f64,

    /// Number of mappings that were actually computed
    pub sentence_pruned: f64,

    // Durations of the processing phases, in milliseconds
    pub lemmatization_time: f64,
    pub match_time: f64,
    pub sentence_time: f64,
}

/// Column of the results file
///
/// Provides typed access to the fields of a [`Record`], so that filters and
/// groupings can be described as data.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Column {
    Id,
    K,
    SimMember,
    SimMeta,
    SynMember,
    SynMeta,
    Missing,
    MaxDistance,
    NgramSize,
    NgramsCount,
    Similarity,
    SentenceCount,
    SentenceCountPruned,
    SentencePruned,
    LemmatizationTime,
    MatchTime,
    SentenceTime,
}
//
impl Column {
    /// Value of this column in a record
    pub fn get(self, record: &Record) -> f64 {
        match self {
            Self::Id => record.id,
            Self::K => record.k,
            Self::SimMember => record.sim_member,
            Self::SimMeta => record.sim_meta,
            Self::SynMember => record.syn_member,
            Self::SynMeta => record.syn_meta,
            Self::Missing => record.missing,
            Self::MaxDistance => record.max_distance,
            Self::NgramSize => record.ngram_size,
            Self::NgramsCount => record.ngrams_count,
            Self::Similarity => record.similarity,
            Self::SentenceCount => record.sentence_count,
            Self::SentenceCountPruned => record.sentence_count_pruned,
            Self::SentencePruned => record.sentence_pruned,
            Self::LemmatizationTime => record.lemmatization_time,
            Self::MatchTime => record.match_time,
            Self::SentenceTime => record.sentence_time,
        }
    }

    /// Name of this column in the header of the results file
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::K => "k",
            Self::SimMember => "simMember",
            Self::SimMeta => "simMeta",
            Self::SynMember => "synMember",
            Self::SynMeta => "synMeta",
            Self::Missing => "%missing",
            Self::MaxDistance => "maxDistance",
            Self::NgramSize => "ngramSize",
            Self::NgramsCount => "ngrams_count",
            Self::Similarity => "similarity",
            Self::SentenceCount => "sentence_count",
            Self::SentenceCountPruned => "sentence_count_pruned",
            Self::SentencePruned => "sentence_pruned",
            Self::LemmatizationTime => "lemmatization_time",
            Self::MatchTime => "match_time",
            Self::SentenceTime => "sentence_time",
        }
    }
}
//
impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full content of the results file
///
/// Never modified after loading. Cloning only bumps a reference count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset(Arc<[Record]>);
//
impl Dataset {
    /// Access the records, in file order
    pub fn records(&self) -> &[Record] {
        &self.0[..]
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Truth that there are no records at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
//
impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_read_the_matching_field() {
        let record = Record {
            id: 7.0,
            k: 2.0,
            missing: 0.6,
            ngrams_count: 4.0,
            match_time: 200.0,
            ..Record::default()
        };
        assert_eq!(Column::Id.get(&record), 7.0);
        assert_eq!(Column::K.get(&record), 2.0);
        assert_eq!(Column::Missing.get(&record), 0.6);
        assert_eq!(Column::NgramsCount.get(&record), 4.0);
        assert_eq!(Column::MatchTime.get(&record), 200.0);
        assert_eq!(Column::Similarity.get(&record), 0.0);
        assert_eq!(Column::Missing.to_string(), "%missing");
    }

    #[test]
    fn dataset_keeps_file_order() {
        let dataset = [1.0, 3.0, 2.0]
            .into_iter()
            .map(|id| Record {
                id,
                ..Record::default()
            })
            .collect::<Dataset>();
        assert_eq!(dataset.len(), 3);
        let ids = dataset.records().iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, [1.0, 3.0, 2.0]);
        assert!(Dataset::default().is_empty());
    }
}
