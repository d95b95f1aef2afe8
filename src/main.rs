mod api;
mod audio;
mod config;
mod gui;

use gui::app::StudioApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("voicebox_studio=info")),
        )
        .init();

    let config = config::Config::load();
    tracing::info!(server_url = %config.server_url, "starting up");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Voicebox Studio")
            .with_inner_size([960.0, 700.0])
            .with_min_inner_size([720.0, 540.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Voicebox Studio",
        options,
        Box::new(|cc| Ok(Box::new(StudioApp::new(&cc.egui_ctx, config)))),
    )
}
