//! Dashboard settings.
//!
//! Read from the JSON file named by `CHURN_DASH_CONFIG`, else from
//! `churn-dash.json` in the working directory when it exists, else defaults.
//! Every field is optional in the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chart::DEFAULT_BINS;
use crate::data::loader::{Encoding, LoadOptions};
use crate::data::model::Column;
use crate::error::{DashboardError, Result};
use crate::metrics::Labels;

pub const CONFIG_ENV_VAR: &str = "CHURN_DASH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "churn-dash.json";

/// The two sidebar layouts over the same core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardLayout {
    /// One drop-down: all categories or a single one.
    #[default]
    Compact,
    /// Checkbox lists for category and income bracket.
    Extended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub encoding: Encoding,
    pub delimiter: char,
    pub status_column: String,
    pub cancelled_label: String,
    pub income_column: String,
    pub default_bins: usize,
    /// Rows shown in the overview preview table.
    pub head_rows: usize,
    pub layout: DashboardLayout,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("dados/ClientesBanco.csv"),
            encoding: Encoding::Latin1,
            delimiter: ',',
            status_column: Column::Status.header().to_string(),
            cancelled_label: "Cancelado".to_string(),
            income_column: Column::IncomeBracket.header().to_string(),
            default_bins: DEFAULT_BINS,
            head_rows: 5,
            layout: DashboardLayout::default(),
        }
    }
}

impl DashboardConfig {
    /// Resolve the config file location and read it, falling back to defaults
    /// when no file is configured or present.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_path(Path::new(&path));
        }
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            return Self::from_path(path);
        }
        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DashboardError::io(path, e))?;
        let config = Self::from_json(&text, path)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate. `origin` only labels errors.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| DashboardError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let invalid = |message: String| DashboardError::Config {
            path: origin.to_path_buf(),
            message,
        };
        if self.default_bins == 0 {
            return Err(invalid("default_bins must be at least 1".into()));
        }
        if !self.delimiter.is_ascii() {
            return Err(invalid(format!(
                "delimiter '{}' is not a single-byte character",
                self.delimiter
            )));
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions {
            encoding: self.encoding,
            delimiter: self.delimiter as u8,
            ..LoadOptions::default()
        };
        // Renamed status/income columns replace the stock headers.
        for (stock, configured) in [
            (Column::Status, &self.status_column),
            (Column::IncomeBracket, &self.income_column),
        ] {
            for required in &mut options.required_columns {
                if required == stock.header() {
                    *required = configured.clone();
                }
            }
        }
        options
    }

    pub fn labels(&self) -> Labels {
        Labels {
            status_column: self.status_column.clone(),
            cancelled_label: self.cancelled_label.clone(),
            ..Labels::default()
        }
    }
}
