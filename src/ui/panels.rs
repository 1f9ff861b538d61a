use churn_dash::config::DashboardLayout;
use churn_dash::data::model::Value;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Settings");
    ui.label("Filters and customisation");
    ui.separator();

    let mut layout = state.layout;
    ui.horizontal(|ui: &mut Ui| {
        ui.radio_value(&mut layout, DashboardLayout::Compact, "Compact");
        ui.radio_value(&mut layout, DashboardLayout::Extended, "Extended");
    });
    state.set_layout(layout);
    ui.separator();

    // Clone the Arc so we can mutate state inside the widgets.
    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.layout {
            DashboardLayout::Compact => {
                let status = state.config.status_column.clone();
                let current = state.category_choice().cloned();
                let mut choice = current.clone();

                ui.strong("Select the category:");
                egui::ComboBox::from_id_salt("category_choice")
                    .selected_text(choice.as_ref().map_or("All".to_string(), Value::to_string))
                    .show_ui(ui, |ui: &mut Ui| {
                        ui.selectable_value(&mut choice, None, "All");
                        for val in dataset.unique_values.get(&status).into_iter().flatten() {
                            ui.selectable_value(&mut choice, Some(val.clone()), val.to_string());
                        }
                    });
                if choice != current {
                    state.set_category_choice(choice);
                }
            }
            DashboardLayout::Extended => {
                // ---- Per-column filter widgets (collapsible) ----
                for col in state.filter_columns() {
                    let Some(all_values) = dataset.unique_values.get(&col) else {
                        continue;
                    };

                    // Show count of selected / total in the header
                    let n_selected = state
                        .selection
                        .get(&col)
                        .map_or(all_values.len(), |s| s.len());
                    let header_text = format!("{col}  ({n_selected}/{})", all_values.len());

                    egui::CollapsingHeader::new(RichText::new(header_text).strong())
                        .id_salt(&col)
                        .default_open(true)
                        .show(ui, |ui: &mut Ui| {
                            // Select all / none buttons
                            ui.horizontal(|ui: &mut Ui| {
                                if ui.small_button("All").clicked() {
                                    state.select_all(&col);
                                }
                                if ui.small_button("None").clicked() {
                                    state.select_none(&col);
                                }
                            });

                            for val in all_values {
                                let mut text = RichText::new(val.to_string());
                                if col == state.config.status_column {
                                    if let Some(cm) = &state.color_map {
                                        text = text.color(cm.color_for(Some(val)));
                                    }
                                }

                                let mut checked = state.selection.is_selected(&col, val);
                                if ui.checkbox(&mut checked, text).changed() {
                                    state.toggle_filter_value(&col, val);
                                }
                            }
                        });
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(Ok(view))) = (&state.dataset, state.view()) {
            ui.label(format!(
                "{} customers loaded, {} visible",
                ds.len(),
                view.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open customer data")
        .add_filter("Supported files", &["csv", "txt", "tsv", "json", "parquet", "pq"])
        .add_filter("Delimited text", &["csv", "txt", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
