//! The charts that summarize an evaluation run
//!
//! Each view selects the runs of interest with a [`Filter`], then reduces them
//! into one or more [`Series`] with [`group_and_aggregate`]. Views are
//! independent from each other and only read the dataset.

use crate::{
    config::Config,
    dataset::{Column, Dataset},
    filter::{Filter, Predicate},
    stats::{group_and_aggregate, Aggregator, GroupKey, Measure},
};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Durations that make up the total processing time of a sentence
pub const PHASE_TIMES: &[Column] = &[
    Column::LemmatizationTime,
    Column::MatchTime,
    Column::SentenceTime,
];

/// Scale factor from milliseconds to seconds
const MS_PER_S: f64 = 1000.0;

/// Kinds of chart that are produced
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ViewKind {
    /// Mean similarity for each candidate rank
    SimilarityByK,

    /// Mean best similarity among the first k candidates
    TopKSimilarity,

    /// Number of explored mappings, with and without pruning
    Pruning,

    /// Total processing time
    Timing,
}
//
impl ViewKind {
    /// Every view, in production order
    pub const ALL: [ViewKind; 4] = [
        Self::SimilarityByK,
        Self::TopKSimilarity,
        Self::Pruning,
        Self::Timing,
    ];

    /// Name of the output file, without extension
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::SimilarityByK => "similarity_avg",
            Self::TopKSimilarity => "similarity",
            Self::Pruning => "pruning",
            Self::Timing => "time",
        }
    }

    /// Horizontal axis legend
    pub fn x_label(self) -> &'static str {
        match self {
            Self::SimilarityByK | Self::TopKSimilarity => "k",
            Self::Pruning | Self::Timing => "|M|",
        }
    }

    /// Vertical axis legend
    pub fn y_label(self) -> &'static str {
        match self {
            Self::SimilarityByK | Self::TopKSimilarity => "Sim",
            Self::Pruning => "Explored mappings",
            Self::Timing => "Time (s)",
        }
    }

    /// How series are drawn
    pub fn layout(self) -> Layout {
        match self {
            Self::SimilarityByK => Layout::Lines,
            Self::TopKSimilarity | Self::Pruning | Self::Timing => Layout::Bars,
        }
    }

    /// How the vertical axis is scaled
    pub fn y_axis(self) -> YAxis {
        match self {
            Self::SimilarityByK | Self::TopKSimilarity => YAxis::Unit,
            Self::Pruning => YAxis::Log,
            Self::Timing => YAxis::Linear,
        }
    }

    /// Compute this view from the dataset
    pub fn compute(self, config: &Config, dataset: &Dataset) -> View {
        let series = match self {
            Self::SimilarityByK => similarity_by_k(config, dataset),
            Self::TopKSimilarity => top_k_similarity(config, dataset),
            Self::Pruning => pruning(config, dataset),
            Self::Timing => timing(config, dataset),
        };
        log::info!(
            "Computed {self:?} view with {} points",
            series.iter().map(|s| s.points.len()).sum::<usize>()
        );
        View { kind: self, series }
    }
}

/// Way in which the series of a view are drawn
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Layout {
    /// One line per series, with a marker at each point
    Lines,

    /// One slot per category, with one bar per series in each slot
    Bars,
}

/// Scale of the vertical axis
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum YAxis {
    /// Linear from 0 to 1
    Unit,

    /// Linear from 0 to the largest value
    Linear,

    /// Logarithmic over the range of positive values
    Log,
}

/// Result of a view computation, ready to be rendered
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    /// What this view shows
    pub kind: ViewKind,

    /// Data to be drawn
    pub series: Vec<Series>,
}
//
impl View {
    /// Truth that there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|series| series.points.is_empty())
    }
}

/// Named sequence of (category, value) points, by increasing category
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    /// Legend of the series
    pub label: Box<str>,

    /// Data points
    pub points: Vec<(f64, f64)>,
}
//
impl Series {
    /// Build a series from groups that are keyed by a single column
    fn from_groups(label: impl Into<Box<str>>, groups: BTreeMap<GroupKey, f64>) -> Self {
        let points = (groups.into_iter())
            .filter_map(|(key, value)| Some((key.first()?.into_inner(), value)))
            .collect();
        Self {
            label: label.into(),
            points,
        }
    }

    /// Apply a transformation to every value
    fn map_values(mut self, f: impl Fn(f64) -> f64) -> Self {
        self.points.iter_mut().for_each(|(_, y)| *y = f(*y));
        self
    }
}

/// Compute every view, in [`ViewKind::ALL`] order
pub fn compute_all(config: &Config, dataset: &Dataset) -> Vec<View> {
    (ViewKind::ALL.par_iter())
        .map(|kind| kind.compute(config, dataset))
        .collect()
}

/// Tab-separated listing of every point of every view
///
/// Each line reads `<file stem>\t<series label>\t<x>\t<y>`.
pub fn summary(views: &[View]) -> impl Iterator<Item = String> + '_ {
    views.iter().flat_map(|view| {
        view.series.iter().flat_map(move |series| {
            (series.points.iter()).map(move |(x, y)| {
                format!("{}\t{}\t{x}\t{y}", view.kind.file_stem(), series.label)
            })
        })
    })
}

/// Legend of a series that belongs to a `synMeta` sweep
fn syn_threshold_label(syn_meta: f64) -> String {
    format!("SynThr = {}", syn_meta + 1.0)
}

/// Filter that keeps the runs with an even, non-zero number of ngrams
fn with_even_ngrams(filter: Filter) -> Filter {
    filter
        .with(Predicate::Even(Column::NgramsCount))
        .with(Predicate::Positive(Column::NgramsCount))
}

/// Mean similarity of the runs of interest, for each candidate rank
pub fn similarity_by_k(config: &Config, dataset: &Dataset) -> Vec<Series> {
    let runs = config.thresholds.base_filter().apply(dataset.records());
    let groups = group_and_aggregate(
        runs,
        &[Column::K],
        Measure::Column(Column::Similarity),
        Aggregator::Mean,
    );
    vec![Series::from_groups("C-BI", groups)]
}

/// Mean, over test cases, of the best similarity among the first k candidates
///
/// One series per value of the `synMeta` sweep. A window that contains no
/// runs produces no point.
pub fn top_k_similarity(config: &Config, dataset: &Dataset) -> Vec<Series> {
    let base = config.thresholds.base_filter().without(Column::SynMeta);
    (config.syn_meta_sweep.iter())
        .map(|&syn_meta| {
            let runs = (base.clone())
                .with(Predicate::Equals(Column::SynMeta, syn_meta))
                .apply(dataset.records());
            let points = (config.k_windows())
                .filter_map(|k| {
                    let window = Filter::new()
                        .with(Predicate::AtMost(Column::K, f64::from(k)))
                        .apply(runs.iter().copied());
                    let groups = group_and_aggregate(
                        window,
                        &[],
                        Measure::Column(Column::Similarity),
                        Aggregator::MaxThenMean { entity: Column::Id },
                    );
                    let mean = groups.into_values().next()?;
                    Some((f64::from(k), mean))
                })
                .collect();
            Series {
                label: syn_threshold_label(syn_meta).into(),
                points,
            }
        })
        .collect()
}

/// Mean number of candidate mappings, for each number of ngrams
///
/// Produces the "All", "Distinct" and "Computed" series, in this order.
pub fn pruning(config: &Config, dataset: &Dataset) -> Vec<Series> {
    let runs = with_even_ngrams(config.thresholds.base_filter()).apply(dataset.records());
    [
        ("All", Column::SentenceCount),
        ("Distinct", Column::SentenceCountPruned),
        ("Computed", Column::SentencePruned),
    ]
    .into_iter()
    .map(|(label, column)| {
        let groups = group_and_aggregate(
            runs.iter().copied(),
            &[Column::NgramsCount],
            Measure::Column(column),
            Aggregator::Mean,
        );
        Series::from_groups(label, groups)
    })
    .collect()
}

/// Mean total processing time in seconds, for each number of ngrams
///
/// One series per value of the `synMeta` sweep.
pub fn timing(config: &Config, dataset: &Dataset) -> Vec<Series> {
    let base = with_even_ngrams(config.thresholds.base_filter().without(Column::SynMeta));
    (config.syn_meta_sweep.iter())
        .map(|&syn_meta| {
            let runs = (base.clone())
                .with(Predicate::Equals(Column::SynMeta, syn_meta))
                .apply(dataset.records());
            let groups = group_and_aggregate(
                runs,
                &[Column::NgramsCount],
                Measure::Sum(PHASE_TIMES),
                Aggregator::Mean,
            );
            Series::from_groups(syn_threshold_label(syn_meta), groups).map_values(|ms| ms / MS_PER_S)
        })
        .collect()
}
