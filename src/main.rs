use car_market_dashboard::app::CarDashboardApp;
use car_market_dashboard::config::DashboardConfig;
use car_market_dashboard::state::AppState;
use eframe::egui;

fn main() -> eframe::Result {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Logger first so config warnings are visible.
    let default_level = if args.iter().any(|a| a == "--debug") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = DashboardConfig::from_env_and_args(args);
    log::debug!("Starting with {config:?}");

    let mut state = AppState::new(config);
    let data_path = state.config.data_path.clone();
    if data_path.exists() {
        state.load(&data_path);
    } else {
        log::warn!(
            "No dataset at {}; use File → Open to pick one",
            data_path.display()
        );
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Car Market Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(CarDashboardApp::new(state)))),
    )
}
