use std::collections::{BTreeMap, BTreeSet};

use churn_dash::data::model::Value;
use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.7, 0.5);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the values of a categorical column to distinct colours, so a category
/// keeps its colour across every chart and filter change.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(unique_values: &BTreeSet<Value>) -> Self {
        let mapping = unique_values
            .iter()
            .cloned()
            .zip(generate_palette(unique_values.len()))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::LIGHT_BLUE,
        }
    }

    pub fn get(&self, value: &Value) -> Option<Color32> {
        self.mapping.get(value).copied()
    }

    /// Colour for a series group; ungrouped series get the default colour.
    pub fn color_for(&self, value: Option<&Value>) -> Color32 {
        value
            .and_then(|v| self.get(v))
            .unwrap_or(self.default_color)
    }
}
