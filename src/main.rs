mod app;
mod color;
mod state;
mod ui;

use app::ChurnDashApp;
use churn_dash::config::DashboardConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let (mut config, config_error) = match DashboardConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            (DashboardConfig::default(), Some(format!("Error: {e}")))
        }
    };
    // An explicit path on the command line wins over the configured one.
    if let Some(path) = std::env::args_os().nth(1) {
        config.data_path = path.into();
    }

    let mut state = AppState::new(config);
    let data_path = state.config.data_path.clone();
    state.open(&data_path);
    if config_error.is_some() {
        state.status_message = config_error;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Churn Dash – Card Cancellation Analysis",
        options,
        Box::new(move |_cc| Ok(Box::new(ChurnDashApp::new(state)))),
    )
}
