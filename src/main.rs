use anyhow::Context;
use std::{path::PathBuf, sync::Arc};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod ingest;
mod models;
mod routes;
mod store;
#[cfg(test)]
mod test_support;
mod views;

use config::Config;
use models::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("loading config.toml")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "reelix_backend={0},tower_http={0}",
            config.log_level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Ensure directories exist
    create_dirs(&config).await;

    print_startup_info(&config);

    // Create app state
    let app_state = Arc::new(AppState::new(config.clone()));
    let app = routes::build_router(app_state);

    // Start server
    let addr = config.bind_addr();
    info!("🚀 Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;

    println!("{}", "=".repeat(60));
    println!("✅ Server running on http://{}", addr);
    println!("✅ Server accessible at http://localhost:{}", config.port);
    println!("✅ API: http://localhost:{}/api/v1/videos", config.port);
    println!("{}", "=".repeat(60));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running server")?;

    info!("👋 Server stopped");
    Ok(())
}

async fn create_dirs(config: &Config) {
    let mut dirs: Vec<PathBuf> = vec![
        config.videos_dir(),
        config.thumbnails_dir(),
        config.static_dir.join("css"),
        config.static_dir.join("js"),
        config.static_dir.join("images"),
        config.staging_dir.clone(),
    ];
    if let Some(parent) = config.index_file.parent() {
        dirs.push(parent.to_path_buf());
    }

    for dir in dirs {
        match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => info!("Created directory: {:?}", dir),
            Err(e) => warn!("Error creating directory {:?}: {}", dir, e),
        }
    }
}

fn print_startup_info(config: &Config) {
    println!("{}", "=".repeat(60));
    println!("🚀 Reelix Backend Starting...");
    println!("{}", "=".repeat(60));
    println!("  Version: {}", env!("CARGO_PKG_VERSION"));
    println!("  Upload Dir: {:?}", config.upload_dir);
    println!("  Staging Dir: {:?}", config.staging_dir);
    println!("  Static Dir: {:?}", config.static_dir);
    println!("  Index Page: {:?}", config.index_file);
    println!(
        "  Max Upload: {} MB",
        config.max_file_size / 1024 / 1024
    );
    if config.max_videos > 0 {
        println!("  Max Videos: {}", config.max_videos);
    }
    println!("{}", "=".repeat(60));
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
}
