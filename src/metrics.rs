//! Summary figures over a filtered view: counts, cancellation rate, means and
//! grouped descriptive statistics.
//!
//! Everything is returned at full precision; rounding is left to the caller.

use std::collections::BTreeMap;

use crate::data::filter::FilteredView;
use crate::data::model::{Column, Value};
use crate::error::Result;

/// Which columns and labels carry the churn semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub status_column: String,
    pub cancelled_label: String,
    pub age_column: String,
    pub credit_limit_column: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            status_column: Column::Status.header().to_string(),
            cancelled_label: "Cancelado".to_string(),
            age_column: Column::Age.header().to_string(),
            credit_limit_column: Column::CreditLimit.header().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub total_count: usize,
    pub cancelled_count: usize,
    /// In `[0, 1]`; exactly `0.0` for an empty view.
    pub cancellation_rate: f64,
    pub mean_age: Option<f64>,
    pub mean_credit_limit: Option<f64>,
}

/// Headline figures for a view. Columns named in `labels` that the dataset
/// lacks count as zero cancellations / no mean.
pub fn summarize(view: &FilteredView<'_>, labels: &Labels) -> MetricsReport {
    let total_count = view.len();
    let cancelled = Value::from(labels.cancelled_label.as_str());
    let cancelled_count = view
        .records()
        .filter(|r| r.get(&labels.status_column) == Some(&cancelled))
        .count();

    let cancellation_rate = if total_count == 0 {
        0.0
    } else {
        cancelled_count as f64 / total_count as f64
    };

    MetricsReport {
        total_count,
        cancelled_count,
        cancellation_rate,
        mean_age: mean(view, &labels.age_column).ok().flatten(),
        mean_credit_limit: mean(view, &labels.credit_limit_column).ok().flatten(),
    }
}

/// Arithmetic mean of a numeric column; `Ok(None)` for an empty view.
pub fn mean(view: &FilteredView<'_>, column: &str) -> Result<Option<f64>> {
    let values = view.numbers(column)?;
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
}

/// Occurrences of each value of a column, most frequent first; ties are
/// ordered by value.
pub fn value_counts(view: &FilteredView<'_>, column: &str) -> Result<Vec<(Value, usize)>> {
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for value in view.values(column)? {
        *counts.entry(value).or_default() += 1;
    }
    let mut counts: Vec<(Value, usize)> = counts
        .into_iter()
        .map(|(v, n)| (v.clone(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Five-number summary plus count, mean and sample standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// `None` for fewer than two values (ddof = 1).
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Describe {
    /// `None` when `values` is empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = (n > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });

        Some(Describe {
            count: n,
            mean,
            std,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[n - 1],
        })
    }
}

/// Linear-interpolation quantile of an ascending, non-empty slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Statistics of every numeric column for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: Value,
    /// (column, statistics) in schema order.
    pub columns: Vec<(String, Describe)>,
}

/// Describe every numeric column separately for each value of `group_column`.
/// Groups come out sorted by value; the grouping column is not described.
pub fn describe_by(view: &FilteredView<'_>, group_column: &str) -> Result<Vec<GroupSummary>> {
    view.schema().column(group_column)?;
    let numeric: Vec<&str> = view
        .schema()
        .numeric_names()
        .filter(|name| *name != group_column)
        .collect();

    let mut groups: BTreeMap<&Value, Vec<Vec<f64>>> = BTreeMap::new();
    for record in view.records() {
        let Some(key) = record.get(group_column) else {
            continue;
        };
        let columns = groups
            .entry(key)
            .or_insert_with(|| vec![Vec::new(); numeric.len()]);
        for (values, name) in columns.iter_mut().zip(&numeric) {
            if let Some(v) = record.number(name) {
                values.push(v);
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|(group, columns)| GroupSummary {
            group: group.clone(),
            columns: numeric
                .iter()
                .zip(columns)
                .filter_map(|(name, values)| {
                    Describe::from_values(&values).map(|d| (name.to_string(), d))
                })
                .collect(),
        })
        .collect())
}
