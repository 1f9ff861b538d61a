use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use churn_dash::chart::ChartKind;
use churn_dash::config::{DashboardConfig, DashboardLayout};
use churn_dash::data::cache::DatasetCache;
use churn_dash::data::filter::{apply, FilterSelection, FilteredView};
use churn_dash::data::model::{Dataset, Value};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Distribution,
    Detailed,
    Charts,
    Insights,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Overview,
        Tab::Distribution,
        Tab::Detailed,
        Tab::Charts,
        Tab::Insights,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Overview => "📊 Overview",
            Tab::Distribution => "🔍 Distribution",
            Tab::Detailed => "📈 Detailed analysis",
            Tab::Charts => "🧪 Chart builder",
            Tab::Insights => "💡 Insights",
        }
    }
}

/// Inputs of the free-form chart tab.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartControls {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
    pub bins: usize,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<Dataset>>,

    /// Per-column filter selections.
    pub selection: FilterSelection,

    pub layout: DashboardLayout,

    pub tab: Tab,

    /// Column shown on the distribution tab.
    pub distribution_column: Option<String>,

    pub chart: ChartControls,

    /// Colours of the status categories, shared by every chart.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            layout: config.layout,
            chart: ChartControls {
                kind: ChartKind::Histogram,
                x: None,
                y: None,
                color: Some(config.status_column.clone()),
                bins: config.default_bins,
            },
            config,
            dataset: None,
            selection: FilterSelection::new(),
            tab: Tab::Overview,
            distribution_column: None,
            color_map: None,
            status_message: None,
        }
    }

    /// Load `path` through the shared cache and make it the current dataset.
    /// On failure the previous dataset stays in place.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let options = self.config.load_options();
        let dataset = DatasetCache::global()
            .get_or_load(path, &options)
            .with_context(|| format!("loading {}", path.display()))?;
        self.set_dataset(dataset);
        self.config.data_path = path.to_path_buf();
        Ok(())
    }

    /// [`AppState::load`], reporting failures in the status line.
    pub fn open(&mut self, path: &Path) {
        if let Err(e) = self.load(path) {
            log::error!("Failed to load dataset: {e:#}");
            self.status_message = Some(format!("Error: {e:#}"));
        }
    }

    /// Ingest a newly loaded dataset, initialise filters and chart inputs.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        let status = self.config.status_column.as_str();
        self.color_map = dataset.unique_values.get(status).map(ColorMap::new);

        let numeric: Vec<String> = dataset
            .schema
            .numeric_names()
            .take(2)
            .map(str::to_string)
            .collect();
        let first = numeric.first().cloned();
        let second = numeric.get(1).cloned();
        self.distribution_column = dataset
            .schema
            .names()
            .find(|name| *name != status)
            .map(str::to_string);
        self.chart.x = first.clone();
        self.chart.y = second.or(first);

        self.dataset = Some(dataset);
        self.reset_filters();
        self.status_message = None;
    }

    /// Start from "everything visible" in the current layout.
    pub fn reset_filters(&mut self) {
        self.selection = FilterSelection::new();
        if self.layout == DashboardLayout::Compact {
            return;
        }
        for column in self.filter_columns() {
            self.select_all(&column);
        }
    }

    pub fn set_layout(&mut self, layout: DashboardLayout) {
        if self.layout != layout {
            self.layout = layout;
            self.reset_filters();
        }
    }

    /// Columns the sidebar offers filters for in the current layout.
    pub fn filter_columns(&self) -> Vec<String> {
        match self.layout {
            DashboardLayout::Compact => vec![self.config.status_column.clone()],
            DashboardLayout::Extended => vec![
                self.config.status_column.clone(),
                self.config.income_column.clone(),
            ],
        }
    }

    /// The current view, recomputed from the dataset and selection.
    pub fn view(&self) -> Option<churn_dash::Result<FilteredView<'_>>> {
        self.dataset
            .as_deref()
            .map(|dataset| apply(dataset, &self.selection))
    }

    /// Single-select category: `None` is "All".
    pub fn category_choice(&self) -> Option<&Value> {
        self.selection.single(&self.config.status_column)
    }

    pub fn set_category_choice(&mut self, choice: Option<Value>) {
        let status = self.config.status_column.clone();
        self.selection.set_single(&status, choice);
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &Value) {
        self.selection.toggle(column, value);
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(ds) = &self.dataset {
            if let Err(e) = self.selection.select_all(ds, column) {
                log::warn!("Cannot filter on {column}: {e}");
            }
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.selection.select_none(column);
    }
}
