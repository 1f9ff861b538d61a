use std::collections::{BTreeMap, BTreeSet};

use super::model::{CustomerRecord, Dataset, Schema, Value};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Filter predicate: which values are accepted per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of accepted values.
/// A column that is absent is not filtered; a column with an empty set
/// accepts nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    columns: BTreeMap<String, BTreeSet<Value>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every unique value of each listed column selected (i.e., show everything).
    pub fn all(dataset: &Dataset, columns: &[&str]) -> Result<Self> {
        let mut selection = Self::new();
        for column in columns {
            selection.select_all(dataset, column)?;
        }
        Ok(selection)
    }

    /// Accept a single value of one column.
    pub fn only(column: &str, value: impl Into<Value>) -> Self {
        let mut selection = Self::new();
        selection.set(column, [value.into()]);
        selection
    }

    pub fn set(&mut self, column: &str, values: impl IntoIterator<Item = Value>) {
        self.columns
            .insert(column.to_string(), values.into_iter().collect());
    }

    /// Single-select control: `None` means "all values", `Some(v)` means only `v`.
    pub fn set_single(&mut self, column: &str, value: Option<Value>) {
        match value {
            Some(v) => self.set(column, [v]),
            None => self.clear_column(column),
        }
    }

    /// The value a single-select control should show, if exactly one is set.
    pub fn single(&self, column: &str) -> Option<&Value> {
        self.columns
            .get(column)
            .filter(|set| set.len() == 1)
            .and_then(|set| set.iter().next())
    }

    /// Stop filtering on `column`.
    pub fn clear_column(&mut self, column: &str) {
        self.columns.remove(column);
    }

    /// Toggle a single value in a column's accepted set.
    pub fn toggle(&mut self, column: &str, value: &Value) {
        let selected = self.columns.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, dataset: &Dataset, column: &str) -> Result<()> {
        let values = dataset
            .unique_values
            .get(column)
            .ok_or_else(|| DashboardError::UnknownColumn(column.to_string()))?;
        self.columns.insert(column.to_string(), values.clone());
        Ok(())
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.columns.insert(column.to_string(), BTreeSet::new());
    }

    pub fn get(&self, column: &str) -> Option<&BTreeSet<Value>> {
        self.columns.get(column)
    }

    pub fn is_selected(&self, column: &str, value: &Value) -> bool {
        self.columns
            .get(column)
            .map_or(true, |set| set.contains(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Value>)> {
        self.columns.iter().map(|(c, s)| (c.as_str(), s))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// Read-only subset of a dataset's rows, in dataset order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// The unfiltered view.
    pub fn full(dataset: &'a Dataset) -> Self {
        FilteredView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn schema(&self) -> &'a Schema {
        &self.dataset.schema
    }

    /// Indices of the visible rows in the underlying dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a CustomerRecord> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }

    /// The first `n` visible rows.
    pub fn head(&self, n: usize) -> impl Iterator<Item = &'a CustomerRecord> + '_ {
        self.records().take(n)
    }

    /// Values of one column over the visible rows.
    pub fn values(&self, column: &str) -> Result<Vec<&'a Value>> {
        self.schema().column(column)?;
        Ok(self.records().filter_map(|r| r.get(column)).collect())
    }

    /// Numeric values of one column over the visible rows.
    pub fn numbers(&self, column: &str) -> Result<Vec<f64>> {
        self.schema().numeric_column(column)?;
        Ok(self.records().filter_map(|r| r.number(column)).collect())
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Return the rows that pass all active filters.
///
/// A row passes a column filter when:
/// * The column is not present in `selection` → passes (no constraint)
/// * The accepted set for that column is empty → nothing selected → fails
/// * The row's value for that column is in the accepted set → passes
///
/// Selections naming a column the dataset does not have are rejected.
pub fn apply<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> Result<FilteredView<'a>> {
    for (col, _) in selection.iter() {
        dataset.schema.column(col)?;
    }

    // Columns with every value accepted constrain nothing.
    let active: Vec<(&str, &BTreeSet<Value>)> = selection
        .iter()
        .filter(|(col, selected)| {
            selected.is_empty()
                || dataset
                    .unique_values
                    .get(*col)
                    .map_or(true, |all| !all.is_subset(selected))
        })
        .collect();

    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            active.iter().all(|(col, selected)| {
                record
                    .get(col)
                    .is_some_and(|val| selected.contains(val))
            })
        })
        .map(|(i, _)| i)
        .collect();

    Ok(FilteredView { dataset, indices })
}
