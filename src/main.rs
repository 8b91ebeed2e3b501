mod app;
mod config;
mod details;
mod intake;
mod mapper;
mod model;
mod store;
mod viewer;

use std::path::PathBuf;

use app::FloorPlanApp;
use config::Config;

const TITLE: &str = "Floor Plan Annotator";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 || args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: floorplan-annotate [floor-plan.png|jpg|gif|pdf]");
        std::process::exit(if args.len() > 2 { 1 } else { 0 });
    }
    let initial = args.get(1).map(PathBuf::from);

    let config = Config::load();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true)
            .with_title(TITLE),
        ..Default::default()
    };

    eframe::run_native(
        TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(FloorPlanApp::new(cc, config, initial)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to run eframe: {err}"))
}
