//! Drawing of the computed views as SVG charts

use crate::{
    progress::{ProgressConfig, ProgressReport, Work},
    views::{Layout, View, YAxis},
    Result,
};
use anyhow::Context;
use ordered_float::OrderedFloat;
use plotters::{
    coord::{
        ranged1d::{Ranged, ValueFormatter},
        types::RangedCoordf64,
    },
    prelude::*,
};
use rayon::prelude::*;
use std::{
    collections::BTreeSet,
    ops::Range,
    path::{Path, PathBuf},
};

/// Size of every chart, in pixels
pub const CHART_SIZE: (u32, u32) = (400, 300);

/// Colors of successive series
const PALETTE: [RGBColor; 3] = [BLACK, RGBColor(128, 128, 128), RGBColor(169, 169, 169)];

/// Fraction of a category slot that is covered by bars
const BAR_GROUP_WIDTH: f64 = 0.8;

/// Render every view into the output directory, in parallel
///
/// Returns the paths of the charts, in the order of `views`.
pub fn save_all(views: &[View], output_dir: &Path, report: &ProgressReport) -> Result<Vec<PathBuf>> {
    let steps = report.add(
        "Rendering charts",
        ProgressConfig::new(Work::Steps(views.len())).dont_show_rate_eta(),
    );
    (views.par_iter())
        .map(|view| {
            let path = save(view, output_dir)?;
            steps.make_progress(1);
            Ok(path)
        })
        .collect()
}

/// Render a view into `<output_dir>/<file stem>.svg`
pub fn save(view: &View, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(format!("{}.svg", view.kind.file_stem()));
    if view.is_empty() {
        log::warn!("No data for the {:?} view, its chart will be blank", view.kind);
    }
    draw(view, &path)
        .with_context(|| format!("rendering {:?} view into {}", view.kind, path.display()))?;
    log::info!("Wrote {:?} chart to {}", view.kind, path.display());
    Ok(path)
}

/// Draw a view into an SVG file
fn draw(view: &View, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let frame = Frame::new(view);
    let mut builder = ChartBuilder::on(&root);
    builder.margin(10).x_label_area_size(35).y_label_area_size(50);
    match view.kind.y_axis() {
        YAxis::Log => {
            let mut chart =
                builder.build_cartesian_2d(frame.x_range.clone(), frame.y_range.clone().log_scale())?;
            plot(&mut chart, view, &frame)?;
        }
        YAxis::Unit | YAxis::Linear => {
            let mut chart =
                builder.build_cartesian_2d(frame.x_range.clone(), frame.y_range.clone())?;
            plot(&mut chart, view, &frame)?;
        }
    }
    root.present()?;
    Ok(())
}

/// Draw the axes, series and legend of a view on a chart
fn plot<'a, Y>(
    chart: &mut ChartContext<'a, SVGBackend<'a>, Cartesian2d<RangedCoordf64, Y>>,
    view: &View,
    frame: &Frame,
) -> Result<()>
where
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let layout = view.kind.layout();
    let log_axis = view.kind.y_axis() == YAxis::Log;

    // Axes
    let category_label = |x: &f64| match layout {
        Layout::Lines if x.fract() == 0.0 => x.to_string(),
        Layout::Lines => String::new(),
        Layout::Bars => (frame.category_at(*x))
            .map(|category| category.to_string())
            .unwrap_or_default(),
    };
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(view.kind.x_label())
        .y_desc(view.kind.y_label())
        .light_line_style(WHITE)
        .x_label_formatter(&category_label);
    if layout == Layout::Bars {
        mesh.x_labels(frame.categories.len().max(1)).disable_x_mesh();
    }
    mesh.draw()?;

    // Series, skipping those with nothing to show
    let bar_width = BAR_GROUP_WIDTH / view.series.len().max(1) as f64;
    let baseline = if log_axis { frame.y_range.start } else { 0.0 };
    let mut labelled = false;
    for (idx, series) in view.series.iter().enumerate() {
        let points = (series.points.iter().copied())
            .filter(|&(_, y)| y.is_finite() && (!log_axis || y > 0.0))
            .collect::<Vec<_>>();
        if points.is_empty() {
            log::debug!("Nothing to draw for series {:?} of {:?}", series.label, view.kind);
            continue;
        }
        let color = PALETTE[idx % PALETTE.len()];
        match layout {
            Layout::Lines => {
                chart.draw_series(
                    (points.iter()).map(|&point| Circle::new(point, 3, color.stroke_width(1))),
                )?;
                chart
                    .draw_series(LineSeries::new(points, color.stroke_width(1)))?
                    .label(&*series.label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color));
            }
            Layout::Bars => {
                let offset = idx as f64 * bar_width - BAR_GROUP_WIDTH / 2.0;
                chart
                    .draw_series(points.iter().filter_map(|&(x, y)| {
                        let left = frame.slot(x)? as f64 + offset;
                        Some(Rectangle::new(
                            [(left, baseline), (left + bar_width, y)],
                            color.filled(),
                        ))
                    }))?
                    .label(&*series.label)
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 4), (x + 10, y + 4)], color.filled())
                    });
            }
        }
        labelled = true;
    }

    // Legend
    if labelled {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

/// Coordinate system of a chart
#[derive(Clone, Debug, PartialEq)]
struct Frame {
    /// Union of the categories of all series, in increasing order
    categories: Vec<f64>,

    /// Horizontal extent
    x_range: Range<f64>,

    /// Vertical extent
    y_range: Range<f64>,
}
//
impl Frame {
    /// Pick a coordinate system that fits every point of a view
    fn new(view: &View) -> Self {
        let categories = (view.series.iter())
            .flat_map(|series| series.points.iter().map(|&(x, _)| OrderedFloat(x)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(OrderedFloat::into_inner)
            .collect::<Vec<_>>();

        // Bars are centered on the index of their category, lines on their
        // actual coordinate
        let x_range = match (view.kind.layout(), categories.first(), categories.last()) {
            (Layout::Lines, Some(&first), Some(&last)) => (first - 0.5)..(last + 0.5),
            (Layout::Lines, _, _) => 0.0..1.0,
            (Layout::Bars, _, _) => -0.5..(categories.len().max(1) as f64 - 0.5),
        };

        let values = (view.series.iter())
            .flat_map(|series| series.points.iter().map(|&(_, y)| y))
            .filter(|y| y.is_finite());
        let y_range = match view.kind.y_axis() {
            YAxis::Unit => 0.0..1.0,
            YAxis::Linear => {
                let max = values.fold(0.0, f64::max);
                let top = if max > 0.0 { max * 1.1 } else { 1.0 };
                0.0..top
            }
            YAxis::Log => {
                let (min, max) = values
                    .filter(|&y| y > 0.0)
                    .fold((f64::INFINITY, 0.0f64), |(min, max), y| (min.min(y), max.max(y)));
                if max > 0.0 {
                    // Bars start at the bottom of the axis, so an exact power
                    // of ten must stay above it
                    let low = (min.log10() - 1e-9).floor();
                    let high = max.log10().ceil().max(low + 1.0);
                    10f64.powi(low as i32)..10f64.powi(high as i32)
                } else {
                    1.0..10.0
                }
            }
        };

        Self {
            categories,
            x_range,
            y_range,
        }
    }

    /// Index of the slot where a category is drawn
    fn slot(&self, category: f64) -> Option<usize> {
        self.categories.iter().position(|&c| c == category)
    }

    /// Category whose slot is centered on some horizontal coordinate
    fn category_at(&self, x: f64) -> Option<f64> {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return None;
        }
        self.categories.get(idx as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{Series, ViewKind};

    fn view(kind: ViewKind, series: Vec<(&str, Vec<(f64, f64)>)>) -> View {
        View {
            kind,
            series: (series.into_iter())
                .map(|(label, points)| Series {
                    label: label.into(),
                    points,
                })
                .collect(),
        }
    }

    fn assert_is_svg(path: &Path) {
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("<svg"), "{content}");
    }

    #[test]
    fn renders_every_view_kind() {
        let dir = tempfile::tempdir().unwrap();
        let views = [
            view(
                ViewKind::SimilarityByK,
                vec![("C-BI", vec![(1.0, 0.5), (2.0, 0.7)])],
            ),
            view(
                ViewKind::TopKSimilarity,
                vec![
                    ("SynThr = 2", vec![(1.0, 0.5), (2.0, 0.6)]),
                    ("SynThr = 4", vec![(1.0, 0.55), (2.0, 0.65)]),
                ],
            ),
            view(
                ViewKind::Pruning,
                vec![
                    ("All", vec![(2.0, 1200.0), (4.0, 45000.0)]),
                    ("Distinct", vec![(2.0, 80.0), (4.0, 0.0)]),
                ],
            ),
            view(
                ViewKind::Timing,
                vec![("SynThr = 6", vec![(2.0, 0.6), (4.0, 1.2)])],
            ),
        ];
        let paths = save_all(&views, dir.path(), &ProgressReport::new()).unwrap();
        let names = (paths.iter())
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            ["similarity_avg.svg", "similarity.svg", "pruning.svg", "time.svg"]
        );
        paths.iter().for_each(|path| assert_is_svg(path));
    }

    #[test]
    fn empty_views_render_blank_charts() {
        let dir = tempfile::tempdir().unwrap();
        for kind in ViewKind::ALL {
            let path = save(&view(kind, vec![("SynThr = 2", vec![])]), dir.path()).unwrap();
            assert_is_svg(&path);
        }
    }

    #[test]
    fn unwritable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does").join("not").join("exist");
        let timing = view(ViewKind::Timing, vec![("SynThr = 2", vec![(2.0, 0.6)])]);
        assert!(save(&timing, &missing).is_err());
    }

    #[test]
    fn frames_fit_the_data() {
        let bars = Frame::new(&view(
            ViewKind::Pruning,
            vec![
                ("All", vec![(4.0, 2000.0), (2.0, 30.0)]),
                ("Computed", vec![(6.0, 0.0)]),
            ],
        ));
        assert_eq!(bars.categories, [2.0, 4.0, 6.0]);
        assert_eq!(bars.x_range, -0.5..2.5);
        assert_eq!(bars.y_range, 10.0..10000.0);
        assert_eq!(bars.slot(4.0), Some(1));
        assert_eq!(bars.category_at(2.0), Some(6.0));
        assert_eq!(bars.category_at(1.5), None);

        let lines = Frame::new(&view(
            ViewKind::SimilarityByK,
            vec![("C-BI", vec![(1.0, 0.2), (5.0, 0.9)])],
        ));
        assert_eq!(lines.x_range, 0.5..5.5);
        assert_eq!(lines.y_range, 0.0..1.0);
    }

    #[test]
    fn log_axis_starts_below_powers_of_ten() {
        let frame = Frame::new(&view(
            ViewKind::Pruning,
            vec![("Computed", vec![(2.0, 1.0), (4.0, 10.0)])],
        ));
        assert!(frame.y_range.start < 1.0, "{:?}", frame.y_range);
        assert_eq!(frame.y_range.end, 10.0);

        let frame = Frame::new(&view(
            ViewKind::Pruning,
            vec![("All", vec![(2.0, 100.0), (4.0, 4500.0)])],
        ));
        assert_eq!(frame.y_range, 10.0..10000.0);
    }
}
