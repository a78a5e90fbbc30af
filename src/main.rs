mod app;
mod catalog;
mod chat;
mod config;
mod event;
mod markup;
mod theme;
mod ui;

use app::AdvisorApp;
use catalog::FileCatalogProvider;
use chat::transport::HttpChatTransport;
use config::AdvisorConfig;
use eframe::egui;
use std::sync::{mpsc, Arc};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let workspace = std::env::current_dir()?;
    let config = AdvisorConfig::for_workspace(&workspace);
    tracing::info!(
        endpoint = %config.chat_endpoint,
        catalog = %config.catalog_path.display(),
        "starting routine advisor"
    );
    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("advisor-runtime")
        .build()?;

    let transport = HttpChatTransport::new(config.chat_endpoint.clone())?;
    let catalog_provider = FileCatalogProvider::new(config.catalog_path.clone());

    let app = AdvisorApp::new(
        rx,
        tx,
        runtime.handle().clone(),
        Arc::new(transport),
        Arc::new(catalog_provider),
        config,
    );
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Routine Advisor",
        native_options,
        Box::new(move |creation_context| {
            egui_extras::install_image_loaders(&creation_context.egui_ctx);
            app.theme().apply_visuals(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
