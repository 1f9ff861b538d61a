//! Turn a [`ChartSpec`] into series a plotting backend can draw directly.

use std::collections::BTreeMap;

use crate::chart::{ChartKind, ChartSpec};
use crate::data::filter::FilteredView;
use crate::data::model::{ColumnKind, CustomerRecord, Value};
use crate::error::{DashboardError, Result};
use crate::metrics::quantile;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Histogram(HistogramData),
    Pie(Vec<PieSlice>),
    Scatter(Vec<ScatterSeries>),
    Box(Vec<BoxSummary>),
}

/// One bar slot on the x axis. Categorical bins are unit wide, centred on
/// their index.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub label: String,
    pub start: f64,
    pub end: f64,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    /// Color-group value; `None` when the chart has no color channel.
    pub group: Option<Value>,
    /// One count per bin.
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramData {
    pub bins: Vec<Bin>,
    pub series: Vec<HistogramSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: Value,
    pub count: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub group: Option<Value>,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub group: Option<Value>,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Compute the series for `spec` over `view`. Empty views give empty series.
pub fn materialize(view: &FilteredView<'_>, spec: &ChartSpec) -> Result<ChartData> {
    let x = || {
        spec.x.as_deref().ok_or(DashboardError::MissingEncoding {
            kind: spec.kind,
            channel: "x",
        })
    };
    let y = || {
        spec.y.as_deref().ok_or(DashboardError::MissingEncoding {
            kind: spec.kind,
            channel: "y",
        })
    };
    for column in [&spec.x, &spec.y, &spec.color].into_iter().flatten() {
        view.schema().column(column)?;
    }

    match spec.kind {
        ChartKind::Histogram => histogram(view, x()?, spec.color.as_deref(), spec.bins),
        ChartKind::Pie => Ok(ChartData::Pie(pie(view, x()?))),
        ChartKind::Scatter => scatter(view, x()?, y()?, spec.color.as_deref()),
        ChartKind::Box => boxes(view, spec.x.as_deref(), y()?),
    }
}

fn group_of(record: &CustomerRecord, column: Option<&str>) -> Option<Value> {
    column.and_then(|c| record.get(c)).cloned()
}

fn histogram(
    view: &FilteredView<'_>,
    x: &str,
    color: Option<&str>,
    bins: Option<usize>,
) -> Result<ChartData> {
    let kind = view.schema().column(x)?.kind;
    let mut series: BTreeMap<Option<Value>, Vec<usize>> = BTreeMap::new();

    let bins = match kind {
        ColumnKind::Numeric => {
            let n = match bins {
                Some(0) => return Err(DashboardError::InvalidBins),
                Some(n) => n,
                None => crate::chart::DEFAULT_BINS,
            };
            let values = view.numbers(x)?;
            let Some((min, max)) = min_max(&values) else {
                return Ok(ChartData::Histogram(HistogramData {
                    bins: Vec::new(),
                    series: Vec::new(),
                }));
            };
            let edges = numeric_bins(min, max, n);
            let width = edges[0].width();
            for record in view.records() {
                let Some(v) = record.number(x) else { continue };
                let idx = if width > 0.0 {
                    (((v - min) / width).floor() as usize).min(edges.len() - 1)
                } else {
                    0
                };
                series
                    .entry(group_of(record, color))
                    .or_insert_with(|| vec![0; edges.len()])[idx] += 1;
            }
            edges
        }
        ColumnKind::Categorical => {
            let categories: Vec<&Value> = view
                .dataset()
                .unique_values
                .get(x)
                .map(|set| set.iter().collect())
                .unwrap_or_default();
            let position: BTreeMap<&Value, usize> =
                categories.iter().enumerate().map(|(i, v)| (*v, i)).collect();
            for record in view.records() {
                let Some(idx) = record.get(x).and_then(|v| position.get(v)) else {
                    continue;
                };
                series
                    .entry(group_of(record, color))
                    .or_insert_with(|| vec![0; categories.len()])[*idx] += 1;
            }
            categories
                .iter()
                .enumerate()
                .map(|(i, v)| Bin {
                    label: v.to_string(),
                    start: i as f64 - 0.5,
                    end: i as f64 + 0.5,
                })
                .collect()
        }
    };

    Ok(ChartData::Histogram(HistogramData {
        bins,
        series: series
            .into_iter()
            .map(|(group, counts)| HistogramSeries { group, counts })
            .collect(),
    }))
}

/// Range of the finite values; infinities fall into the edge bins.
fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().filter(|v| v.is_finite()).fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// `n` equal-width bins over `[min, max]`; a zero-width range is one bin.
fn numeric_bins(min: f64, max: f64, n: usize) -> Vec<Bin> {
    if max <= min {
        return vec![Bin {
            label: Value::Number(min).to_string(),
            start: min - 0.5,
            end: min + 0.5,
        }];
    }
    let width = (max - min) / n as f64;
    (0..n)
        .map(|i| {
            let start = min + width * i as f64;
            let end = if i + 1 == n { max } else { start + width };
            Bin {
                label: format!("{start:.2}–{end:.2}"),
                start,
                end,
            }
        })
        .collect()
}

fn pie(view: &FilteredView<'_>, x: &str) -> Vec<PieSlice> {
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for record in view.records() {
        if let Some(v) = record.get(x) {
            *counts.entry(v).or_default() += 1;
        }
    }
    let total = view.len();
    counts
        .into_iter()
        .map(|(label, count)| PieSlice {
            label: label.clone(),
            count,
            fraction: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            },
        })
        .collect()
}

fn scatter(view: &FilteredView<'_>, x: &str, y: &str, color: Option<&str>) -> Result<ChartData> {
    view.schema().numeric_column(x)?;
    view.schema().numeric_column(y)?;
    let mut series: BTreeMap<Option<Value>, Vec<[f64; 2]>> = BTreeMap::new();
    for record in view.records() {
        if let (Some(px), Some(py)) = (record.number(x), record.number(y)) {
            series
                .entry(group_of(record, color))
                .or_default()
                .push([px, py]);
        }
    }
    Ok(ChartData::Scatter(
        series
            .into_iter()
            .map(|(group, points)| ScatterSeries { group, points })
            .collect(),
    ))
}

fn boxes(view: &FilteredView<'_>, x: Option<&str>, y: &str) -> Result<ChartData> {
    view.schema().numeric_column(y)?;
    let mut groups: BTreeMap<Option<Value>, Vec<f64>> = BTreeMap::new();
    for record in view.records() {
        if let Some(v) = record.number(y) {
            groups.entry(group_of(record, x)).or_default().push(v);
        }
    }
    Ok(ChartData::Box(
        groups
            .into_iter()
            .map(|(group, mut values)| {
                values.sort_by(f64::total_cmp);
                BoxSummary {
                    group,
                    count: values.len(),
                    min: values[0],
                    q1: quantile(&values, 0.25),
                    median: quantile(&values, 0.5),
                    q3: quantile(&values, 0.75),
                    max: values[values.len() - 1],
                }
            })
            .collect(),
    ))
}
