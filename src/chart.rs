//! Declarative chart requests.
//!
//! [`build`] checks an encoding against the view's schema and produces a
//! [`ChartSpec`]. Nothing here renders; see [`crate::chart_data`] for turning
//! a spec into plottable series.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::filter::FilteredView;
use crate::data::model::Schema;
use crate::error::{DashboardError, Result};

/// Histogram bin count used when the caller does not pick one.
pub const DEFAULT_BINS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Histogram,
    Pie,
    Scatter,
    Box,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Histogram,
        ChartKind::Pie,
        ChartKind::Scatter,
        ChartKind::Box,
    ];
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartKind::Histogram => "histogram",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
            ChartKind::Box => "box",
        })
    }
}

/// How histogram bars of different color groups share a bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    /// Bars drawn on top of each other, translucent.
    #[default]
    Overlay,
    Stack,
}

/// Which columns drive which visual channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    pub bins: Option<usize>,
    pub bar_mode: BarMode,
    pub title: Option<String>,
}

impl Encoding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, column: impl Into<String>) -> Self {
        self.x = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y = Some(column.into());
        self
    }

    pub fn color(mut self, column: impl Into<String>) -> Self {
        self.color = Some(column.into());
        self
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }

    pub fn bar_mode(mut self, mode: BarMode) -> Self {
        self.bar_mode = mode;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A validated chart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    /// Set for histograms only.
    pub bins: Option<usize>,
    pub bar_mode: BarMode,
}

/// Validate `encoding` for `kind` against the view's schema.
///
/// | kind      | required           | numeric |
/// |-----------|--------------------|---------|
/// | histogram | `x`                |         |
/// | pie       | `x` (slice labels) |         |
/// | scatter   | `x`, `y`           | `x`, `y`|
/// | box       | `y`                | `y`     |
pub fn build(view: &FilteredView<'_>, kind: ChartKind, encoding: &Encoding) -> Result<ChartSpec> {
    let schema = view.schema();

    // Unknown columns are reported before missing channels.
    for column in [&encoding.x, &encoding.y, &encoding.color]
        .into_iter()
        .flatten()
    {
        schema.column(column)?;
    }

    let require = |channel: &'static str, value: &Option<String>| {
        value
            .clone()
            .ok_or(DashboardError::MissingEncoding { kind, channel })
    };

    let bins = match kind {
        ChartKind::Histogram => {
            require("x", &encoding.x)?;
            match encoding.bins.unwrap_or(DEFAULT_BINS) {
                0 => return Err(DashboardError::InvalidBins),
                n => Some(n),
            }
        }
        ChartKind::Pie => {
            require("x", &encoding.x)?;
            None
        }
        ChartKind::Scatter => {
            numeric(schema, &require("x", &encoding.x)?)?;
            numeric(schema, &require("y", &encoding.y)?)?;
            None
        }
        ChartKind::Box => {
            numeric(schema, &require("y", &encoding.y)?)?;
            None
        }
    };

    let title = encoding
        .title
        .clone()
        .unwrap_or_else(|| default_title(kind, encoding));

    Ok(ChartSpec {
        kind,
        title,
        x: encoding.x.clone(),
        y: encoding.y.clone(),
        color: encoding.color.clone(),
        bins,
        bar_mode: encoding.bar_mode,
    })
}

fn numeric(schema: &Schema, column: &str) -> Result<()> {
    schema.numeric_column(column).map(|_| ())
}

fn default_title(kind: ChartKind, encoding: &Encoding) -> String {
    let subject = match kind {
        ChartKind::Histogram => format!("Distribution of {}", encoding.x.as_deref().unwrap_or("")),
        ChartKind::Pie => format!("Share of {}", encoding.x.as_deref().unwrap_or("")),
        ChartKind::Scatter => format!(
            "{} vs {}",
            encoding.y.as_deref().unwrap_or(""),
            encoding.x.as_deref().unwrap_or("")
        ),
        ChartKind::Box => match &encoding.x {
            Some(x) => format!("{} by {x}", encoding.y.as_deref().unwrap_or("")),
            None => encoding.y.clone().unwrap_or_default(),
        },
    };
    match (&encoding.color, kind) {
        (Some(color), ChartKind::Histogram | ChartKind::Scatter) => format!("{subject} by {color}"),
        _ => subject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{ColumnInfo, ColumnKind, Dataset};

    fn dataset() -> Dataset {
        let schema = Schema::new(vec![
            ColumnInfo {
                name: "Categoria".into(),
                kind: ColumnKind::Categorical,
            },
            ColumnInfo {
                name: "Idade".into(),
                kind: ColumnKind::Numeric,
            },
            ColumnInfo {
                name: "Limite".into(),
                kind: ColumnKind::Numeric,
            },
        ]);
        Dataset::from_records(schema, Vec::new())
    }

    #[test]
    fn histogram_defaults_bins_and_title() {
        let ds = dataset();
        let view = FilteredView::full(&ds);
        let spec = build(
            &view,
            ChartKind::Histogram,
            &Encoding::new().x("Idade").color("Categoria"),
        )
        .unwrap();
        assert_eq!(spec.bins, Some(DEFAULT_BINS));
        assert_eq!(spec.bar_mode, BarMode::Overlay);
        assert_eq!(spec.title, "Distribution of Idade by Categoria");
    }

    #[test]
    fn unknown_column_is_rejected() {
        let ds = dataset();
        let view = FilteredView::full(&ds);
        for kind in ChartKind::ALL {
            let err = build(&view, kind, &Encoding::new().x("Idade").y("Renda")).unwrap_err();
            assert!(matches!(err, DashboardError::UnknownColumn(c) if c == "Renda"));
        }
        let err = build(
            &view,
            ChartKind::Pie,
            &Encoding::new().x("Categoria").color("Cor"),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::UnknownColumn(_)));
    }

    #[test]
    fn missing_channels_are_named() {
        let ds = dataset();
        let view = FilteredView::full(&ds);
        let err = build(&view, ChartKind::Scatter, &Encoding::new().x("Idade")).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingEncoding {
                kind: ChartKind::Scatter,
                channel: "y"
            }
        ));
        let err = build(&view, ChartKind::Box, &Encoding::new()).unwrap_err();
        assert_eq!(err.to_string(), "box chart needs a 'y' column");
    }

    #[test]
    fn scatter_and_box_need_numeric_axes() {
        let ds = dataset();
        let view = FilteredView::full(&ds);
        let err = build(
            &view,
            ChartKind::Scatter,
            &Encoding::new().x("Categoria").y("Idade"),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::NotNumeric(_)));
        let spec = build(
            &view,
            ChartKind::Box,
            &Encoding::new().x("Categoria").y("Limite"),
        )
        .unwrap();
        assert_eq!(spec.title, "Limite by Categoria");
        assert_eq!(spec.bins, None);
    }

    #[test]
    fn zero_bins_is_invalid() {
        let ds = dataset();
        let view = FilteredView::full(&ds);
        let err = build(
            &view,
            ChartKind::Histogram,
            &Encoding::new().x("Idade").bins(0),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidBins));
    }

    #[test]
    fn caller_title_wins() {
        let ds = dataset();
        let view = FilteredView::full(&ds);
        let spec = build(
            &view,
            ChartKind::Pie,
            &Encoding::new().x("Categoria").title("Clientes"),
        )
        .unwrap();
        assert_eq!(spec.title, "Clientes");
    }
}
