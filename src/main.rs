mod api;
mod app;
mod kg;
mod layout;
mod util;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory containing nodes.json and links.json.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Base URL of the search server.
    #[arg(long, default_value = "http://localhost:8000")]
    api_url: String,
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "graphlens",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::GraphLensApp::new(
                cc,
                args.data_dir.clone(),
                args.api_url.clone(),
            )))
        }),
    )
}
