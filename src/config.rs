//! Processing pipeline configuration

use crate::{
    dataset::Column,
    filter::{Filter, Predicate},
    Args,
};
use std::{num::NonZeroU32, path::PathBuf, sync::Arc};

/// Final process configuration
///
/// This is the result of digesting validated [`Args`]. Please refer to
/// [`Args`] to know more about individual fields.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Location of the results file
    pub input: PathBuf,

    /// Directory where charts are written
    pub output_dir: PathBuf,

    /// Subset of the configuration that selects the relevant runs
    pub thresholds: Thresholds,

    // Other fields have the same meaning as in Args
    pub syn_meta_sweep: Box<[f64]>,
    pub max_k: NonZeroU32,
}
//
impl Config {
    /// Determine process configuration from CLI arguments
    pub(crate) fn new(args: Args) -> Arc<Self> {
        let Args {
            input,
            output_dir,
            sim_member,
            sim_meta,
            syn_member,
            syn_meta,
            ngram_size,
            missing,
            max_distance,
            syn_meta_sweep,
            max_k,
        } = args;
        Arc::new(Self {
            input,
            output_dir,
            thresholds: Thresholds {
                sim_member,
                sim_meta,
                syn_member,
                syn_meta,
                ngram_size,
                missing,
                max_distance,
            },
            syn_meta_sweep: syn_meta_sweep.into(),
            max_k,
        })
    }

    /// Upper bounds of the top-k windows, in increasing order
    pub fn k_windows(&self) -> impl Iterator<Item = u32> {
        1..=self.max_k.get()
    }
}

/// Parameters of the mapper that identify the runs of interest
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub sim_member: f64,
    pub sim_meta: f64,
    pub syn_member: f64,
    pub syn_meta: f64,
    pub ngram_size: f64,
    pub missing: f64,
    pub max_distance: f64,
}
//
impl Thresholds {
    /// Filter that only keeps the runs which match every threshold exactly
    pub fn base_filter(&self) -> Filter {
        [
            (Column::SimMember, self.sim_member),
            (Column::SimMeta, self.sim_meta),
            (Column::SynMember, self.syn_member),
            (Column::SynMeta, self.syn_meta),
            (Column::Missing, self.missing),
            (Column::MaxDistance, self.max_distance),
            (Column::NgramSize, self.ngram_size),
        ]
        .into_iter()
        .fold(Filter::new(), |filter, (column, value)| {
            filter.with(Predicate::Equals(column, value))
        })
    }
}

/// Configuration obtained when no CLI argument is given
#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        use clap::Parser;
        let args = Args::try_parse_from(["cbi-charts"]).expect("defaults should be valid");
        Arc::unwrap_or_clone(Self::new(args))
    }
}
