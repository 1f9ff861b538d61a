use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, tabs};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ChurnDashApp {
    pub state: AppState,
}

impl ChurnDashApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for ChurnDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            tabs::central_panel(ui, &mut self.state);
        });
    }
}
