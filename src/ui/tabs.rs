use churn_dash::chart::{build, BarMode, ChartKind, Encoding};
use churn_dash::chart_data::materialize;
use churn_dash::data::filter::{apply, FilteredView};
use churn_dash::metrics::{describe_by, summarize, Describe};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::state::{AppState, Tab};
use crate::ui::plot;

const PLOT_HEIGHT: f32 = 320.0;
const SMALL_PLOT_HEIGHT: f32 = 200.0;

// ---------------------------------------------------------------------------
// Central panel – title, tab strip and the selected tab
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Credit card cancellation analysis");
    ui.label(RichText::new("Goal: identify patterns associated with cancellation").italics());

    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.label());
        }
    });
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a customer file to begin  (File → Open…)");
        });
        return;
    };

    // The view borrows the local Arc, so `state` stays mutable below.
    let view = match apply(&dataset, &state.selection) {
        Ok(view) => view,
        Err(e) => {
            placeholder(ui, &e.to_string());
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.tab {
            Tab::Overview => overview(ui, state, &view),
            Tab::Distribution => distribution(ui, state, &view),
            Tab::Detailed => detailed(ui, state, &view),
            Tab::Charts => chart_builder(ui, state, &view),
            Tab::Insights => insights(ui),
        });

    ui.separator();
    ui.small("Data: Kaggle Credit Card Customers");
}

fn placeholder(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).color(Color32::GRAY).italics());
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

fn metric_card(ui: &mut Ui, label: &str, value: String) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.label(label);
        ui.label(RichText::new(value).size(26.0).strong());
    });
}

fn overview(ui: &mut Ui, state: &AppState, view: &FilteredView<'_>) {
    ui.heading("📊 Data overview");
    let report = summarize(view, &state.config.labels());
    let mean_or_dash = |v: Option<f64>| v.map_or_else(|| "—".to_string(), |v| format!("{v:.1}"));

    ui.columns(3, |cols: &mut [Ui]| {
        metric_card(&mut cols[0], "Total customers", report.total_count.to_string());
        metric_card(&mut cols[1], "Cancelled customers", report.cancelled_count.to_string());
        metric_card(
            &mut cols[2],
            "Cancellation rate",
            format!("{:.2}%", report.cancellation_rate * 100.0),
        );
    });
    if state.layout == churn_dash::config::DashboardLayout::Extended {
        ui.columns(2, |cols: &mut [Ui]| {
            metric_card(&mut cols[0], "Mean age", mean_or_dash(report.mean_age));
            metric_card(
                &mut cols[1],
                "Mean credit limit",
                mean_or_dash(report.mean_credit_limit),
            );
        });
    }

    ui.add_space(8.0);
    ui.strong("First rows");
    data_table(ui, view, state.config.head_rows);
}

fn data_table(ui: &mut Ui, view: &FilteredView<'_>, rows: usize) {
    if view.is_empty() {
        placeholder(ui, "No customers match the current filters.");
        return;
    }
    let columns: Vec<&str> = view.schema().names().collect();
    let head: Vec<_> = view.head(rows).collect();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(TableColumn::auto().at_least(60.0), columns.len())
            .header(20.0, |mut header| {
                for name in &columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(*name);
                    });
                }
            })
            .body(|mut body| {
                for record in &head {
                    body.row(18.0, |mut row| {
                        for name in &columns {
                            row.col(|ui: &mut Ui| {
                                if let Some(v) = record.get(name) {
                                    ui.label(v.to_string());
                                }
                            });
                        }
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

fn distribution(ui: &mut Ui, state: &mut AppState, view: &FilteredView<'_>) {
    ui.heading("🔍 Distribution analysis");
    let status = state.config.status_column.clone();

    let mut selected = state.distribution_column.clone().unwrap_or_default();
    egui::ComboBox::from_label("Variable to analyse")
        .selected_text(&selected)
        .show_ui(ui, |ui: &mut Ui| {
            for name in view.schema().names().filter(|n| *n != status) {
                ui.selectable_value(&mut selected, name.to_string(), name);
            }
        });
    state.distribution_column = Some(selected.clone());

    let encoding = Encoding::new()
        .x(selected.clone())
        .color(status.clone())
        .bins(state.config.default_bins)
        .title(format!("Distribution of {selected} by {status}"));
    draw(ui, state, view, "distribution", ChartKind::Histogram, &encoding, PLOT_HEIGHT);
}

// ---------------------------------------------------------------------------
// Detailed analysis
// ---------------------------------------------------------------------------

fn detailed(ui: &mut Ui, state: &AppState, view: &FilteredView<'_>) {
    ui.heading("📈 Detailed analysis by category");
    let status = state.config.status_column.clone();

    egui::CollapsingHeader::new("Descriptive statistics")
        .default_open(false)
        .show(ui, |ui: &mut Ui| match describe_by(view, &status) {
            Ok(groups) if !groups.is_empty() => {
                ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
                    egui::Grid::new("describe_grid")
                        .striped(true)
                        .show(ui, |ui: &mut Ui| {
                            ui.strong("Variable");
                            ui.strong("Statistic");
                            for g in &groups {
                                ui.strong(g.group.to_string());
                            }
                            ui.end_row();

                            let names: Vec<&String> =
                                groups[0].columns.iter().map(|(name, _)| name).collect();
                            for name in names {
                                for stat in STATISTICS {
                                    ui.label(name.as_str());
                                    ui.label(stat);
                                    for g in &groups {
                                        let cell = g
                                            .columns
                                            .iter()
                                            .find(|(n, _)| n == name)
                                            .and_then(|(_, d)| statistic(d, stat))
                                            .map_or_else(String::new, |v| format!("{v:.1}"));
                                        ui.label(cell);
                                    }
                                    ui.end_row();
                                }
                            }
                        });
                });
            }
            Ok(_) => placeholder(ui, "No customers match the current filters."),
            Err(e) => placeholder(ui, &e.to_string()),
        });

    ui.add_space(8.0);
    ui.strong("Every variable");
    for name in view.schema().names().filter(|n| *n != status) {
        let encoding = Encoding::new()
            .x(name)
            .color(status.clone())
            .bins(state.config.default_bins)
            .bar_mode(BarMode::Stack);
        draw(
            ui,
            state,
            view,
            &format!("detail_{name}"),
            ChartKind::Histogram,
            &encoding,
            SMALL_PLOT_HEIGHT,
        );
    }
}

const STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn statistic(d: &Describe, stat: &str) -> Option<f64> {
    match stat {
        "count" => Some(d.count as f64),
        "mean" => Some(d.mean),
        "std" => d.std,
        "min" => Some(d.min),
        "25%" => Some(d.q25),
        "50%" => Some(d.median),
        "75%" => Some(d.q75),
        "max" => Some(d.max),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Chart builder
// ---------------------------------------------------------------------------

fn column_picker(ui: &mut Ui, label: &str, value: &mut Option<String>, names: &[&str]) {
    egui::ComboBox::from_label(label)
        .selected_text(value.as_deref().unwrap_or("—"))
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(value, None, "—");
            for name in names {
                ui.selectable_value(value, Some(name.to_string()), *name);
            }
        });
}

fn chart_builder(ui: &mut Ui, state: &mut AppState, view: &FilteredView<'_>) {
    ui.heading("🧪 Chart builder");
    let names: Vec<&str> = view.schema().names().collect();

    ui.horizontal_wrapped(|ui: &mut Ui| {
        egui::ComboBox::from_label("Chart")
            .selected_text(state.chart.kind.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for kind in ChartKind::ALL {
                    ui.selectable_value(&mut state.chart.kind, kind, kind.to_string());
                }
            });
        column_picker(ui, "x", &mut state.chart.x, &names);
        column_picker(ui, "y", &mut state.chart.y, &names);
        column_picker(ui, "color", &mut state.chart.color, &names);
        if state.chart.kind == ChartKind::Histogram {
            ui.add(
                egui::DragValue::new(&mut state.chart.bins)
                    .range(1..=500)
                    .prefix("bins: "),
            );
        }
    });

    let controls = &state.chart;
    let encoding = Encoding {
        x: controls.x.clone(),
        y: controls.y.clone(),
        color: controls.color.clone(),
        bins: Some(controls.bins),
        ..Encoding::default()
    };
    draw(ui, state, view, "chart_builder", controls.kind, &encoding, PLOT_HEIGHT);
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

const INSIGHTS: &[(&str, &str)] = &[
    ("Age pattern", "cancelled customers tend to be younger."),
    (
        "Card utilisation",
        "higher utilisation rates go with fewer cancellations.",
    ),
    (
        "Interactions",
        "customers with fewer contacts in the last year cancel more often.",
    ),
    (
        "Products held",
        "customers holding fewer products tend to cancel more.",
    ),
];

fn insights(ui: &mut Ui) {
    ui.heading("💡 Key insights");
    for (i, (topic, finding)) in INSIGHTS.iter().enumerate() {
        ui.horizontal_wrapped(|ui: &mut Ui| {
            ui.label(format!("{}.", i + 1));
            ui.strong(format!("{topic}:"));
            ui.label(*finding);
        });
    }
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Build, materialize and draw one chart; request errors become a placeholder.
fn draw(
    ui: &mut Ui,
    state: &AppState,
    view: &FilteredView<'_>,
    id: &str,
    kind: ChartKind,
    encoding: &Encoding,
    height: f32,
) {
    let result = build(view, kind, encoding)
        .and_then(|spec| materialize(view, &spec).map(|data| (spec, data)));
    match result {
        Ok((spec, data)) => {
            plot::chart(ui, id, &spec, &data, state.color_map.as_ref(), height);
        }
        Err(e) => {
            log::debug!("Chart '{id}' not drawn: {e}");
            placeholder(ui, &format!("Cannot draw chart: {e}"));
        }
    }
}
