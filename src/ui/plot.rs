use std::f32::consts::{FRAC_PI_2, TAU};

use churn_dash::chart::{BarMode, ChartSpec};
use churn_dash::chart_data::{BoxSummary, ChartData, HistogramData, PieSlice, ScatterSeries};
use churn_dash::data::model::Value;
use eframe::egui::{self, Color32, RichText, Sense, Shape, Stroke, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Plot, Points};

use crate::color::{generate_palette, ColorMap};

// ---------------------------------------------------------------------------
// Chart panel (central panel)
// ---------------------------------------------------------------------------

fn group_name(group: Option<&Value>) -> String {
    group.map_or_else(|| "all".to_string(), Value::to_string)
}

/// Draw a materialized chart. `id` must be unique among plots on screen.
pub fn chart(
    ui: &mut Ui,
    id: &str,
    spec: &ChartSpec,
    data: &ChartData,
    colors: Option<&ColorMap>,
    height: f32,
) {
    ui.strong(&spec.title);
    let color_for = |group: Option<&Value>| {
        colors.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(group))
    };

    match data {
        ChartData::Histogram(h) => histogram(ui, id, spec, h, color_for, height),
        ChartData::Scatter(series) => scatter(ui, id, spec, series, color_for, height),
        ChartData::Box(boxes) => box_plot(ui, id, spec, boxes, color_for, height),
        ChartData::Pie(slices) => pie(ui, slices, colors, height),
    }
}

fn histogram(
    ui: &mut Ui,
    id: &str,
    spec: &ChartSpec,
    data: &HistogramData,
    color_for: impl Fn(Option<&Value>) -> Color32,
    height: f32,
) {
    let stacked = spec.bar_mode == BarMode::Stack;

    Plot::new(id)
        .legend(Legend::default())
        .height(height)
        .x_axis_label(spec.x.clone().unwrap_or_default())
        .y_axis_label("count")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let mut base = vec![0.0; data.bins.len()];
            for series in &data.series {
                let bars: Vec<Bar> = data
                    .bins
                    .iter()
                    .zip(&series.counts)
                    .zip(base.iter_mut())
                    .map(|((bin, &count), offset)| {
                        let mut bar = Bar::new(bin.center(), count as f64)
                            .width(bin.width() * 0.95)
                            .name(&bin.label);
                        if stacked {
                            bar = bar.base_offset(*offset);
                            *offset += count as f64;
                        }
                        bar
                    })
                    .collect();

                let color = color_for(series.group.as_ref());
                let color = if stacked {
                    color
                } else {
                    color.gamma_multiply(0.6)
                };
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .color(color)
                        .name(group_name(series.group.as_ref())),
                );
            }
        });
}

fn scatter(
    ui: &mut Ui,
    id: &str,
    spec: &ChartSpec,
    series: &[ScatterSeries],
    color_for: impl Fn(Option<&Value>) -> Color32,
    height: f32,
) {
    Plot::new(id)
        .legend(Legend::default())
        .height(height)
        .x_axis_label(spec.x.clone().unwrap_or_default())
        .y_axis_label(spec.y.clone().unwrap_or_default())
        .show(ui, |plot_ui| {
            for s in series {
                plot_ui.points(
                    Points::new(s.points.clone())
                        .radius(2.0)
                        .color(color_for(s.group.as_ref()))
                        .name(group_name(s.group.as_ref())),
                );
            }
        });
}

fn box_plot(
    ui: &mut Ui,
    id: &str,
    spec: &ChartSpec,
    boxes: &[BoxSummary],
    color_for: impl Fn(Option<&Value>) -> Color32,
    height: f32,
) {
    Plot::new(id)
        .legend(Legend::default())
        .height(height)
        .y_axis_label(spec.y.clone().unwrap_or_default())
        .show(ui, |plot_ui| {
            for (i, b) in boxes.iter().enumerate() {
                let name = group_name(b.group.as_ref());
                let color = color_for(b.group.as_ref());
                let spread = BoxSpread::new(b.min, b.q1, b.median, b.q3, b.max);
                let elem = BoxElem::new(i as f64, spread).name(&name).box_width(0.5);
                plot_ui.box_plot(BoxPlot::new(vec![elem]).color(color).name(name));
            }
        });
}

/// egui_plot has no pie chart, so slices are painted as triangle fans.
fn pie(ui: &mut Ui, slices: &[PieSlice], colors: Option<&ColorMap>, height: f32) {
    if slices.is_empty() {
        ui.label("No rows to chart.");
        return;
    }

    let palette = generate_palette(slices.len());
    let slice_color = |i: usize, slice: &PieSlice| {
        colors
            .and_then(|cm| cm.get(&slice.label))
            .unwrap_or(palette[i])
    };

    ui.horizontal(|ui: &mut Ui| {
        let size = height.min(ui.available_width() * 0.6);
        let (response, painter) = ui.allocate_painter(egui::vec2(size, size), Sense::hover());
        let center = response.rect.center();
        let radius = size * 0.45;

        let mut angle = -FRAC_PI_2;
        for (i, slice) in slices.iter().enumerate() {
            let sweep = slice.fraction as f32 * TAU;
            let steps = ((sweep / 0.05).ceil() as usize).max(1);
            let color = slice_color(i, slice);
            for step in 0..steps {
                let a0 = angle + sweep * step as f32 / steps as f32;
                let a1 = angle + sweep * (step + 1) as f32 / steps as f32;
                painter.add(Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * egui::vec2(a0.cos(), a0.sin()),
                        center + radius * egui::vec2(a1.cos(), a1.sin()),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            angle += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for (i, slice) in slices.iter().enumerate() {
                ui.label(
                    RichText::new(format!(
                        "■ {}  {} ({:.1}%)",
                        slice.label,
                        slice.count,
                        slice.fraction * 100.0
                    ))
                    .color(slice_color(i, slice)),
                );
            }
        });
    });
}
