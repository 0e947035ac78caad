use anyhow::Context;
use chat_storage_uploader::app::ChatShell;
use chat_storage_uploader::config::AppConfig;
use eframe::egui;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_storage_uploader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let storage = &config.storage;
    info!(
        account = storage.account_name.as_deref().unwrap_or("-"),
        container = storage.container_name.as_deref().unwrap_or("-"),
        collision_policy = ?storage.collision_policy,
        "Loaded storage configuration"
    );
    if storage.account_name.is_none() || storage.sas_token.is_none() || storage.container_name.is_none() {
        warn!("Storage is not fully configured; uploads will fail until STORAGE_ACCOUNT_NAME, SAS_TOKEN and CONTAINER_NAME are set");
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 640.0])
            .with_min_inner_size([360.0, 480.0]),
        ..Default::default()
    };

    let title = config.ui.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Box::new(ChatShell::new(cc, config, runtime))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the ui: {e}"))
}
