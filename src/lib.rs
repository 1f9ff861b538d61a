//! Exploration core for the bank credit-card churn dashboard.
//!
//! Load the customer table once ([`data::cache::DatasetCache`]), narrow it
//! with a [`data::filter::FilterSelection`], then derive headline figures
//! ([`metrics`]) and chart requests ([`chart`], [`chart_data`]) from the
//! resulting view.

pub mod chart;
pub mod chart_data;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;

pub use error::{DashboardError, Result};
