//! Document Merger Web - merge uploaded PDF and Word documents in the browser.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, header};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use clap::Parser;
use docmerge_core::{AppConfig, detect_converter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

/// Resolve the static files directory.
///
/// Priority:
/// 1. Explicit path if provided
/// 2. ./static if it exists
/// 3. Crate's built-in static directory
fn resolve_static_dir(explicit_path: Option<&str>) -> PathBuf {
    if let Some(path) = explicit_path {
        return PathBuf::from(path);
    }

    let local_static = PathBuf::from("static");
    if local_static.is_dir() {
        return local_static;
    }

    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

#[derive(Parser, Debug)]
#[command(name = "docmerge-web")]
#[command(author, version, about = "Document Merger Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "DOCMERGE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, env = "DOCMERGE_PORT", default_value = "3000")]
    port: u16,

    /// Config file (defaults to ~/.config/docmerge/config.toml or ./config.toml)
    #[arg(short, long, env = "DOCMERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Static files directory (defaults to ./static or crate's static dir)
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<String>,

    /// Disable Word to PDF conversion even if LibreOffice is installed
    #[arg(long)]
    no_convert: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    };
    if args.no_convert {
        config.converter.enabled = false;
    }
    debug!("Configuration: {:?}", config);

    // Conversion is a capability of the host, resolved once
    let converter = detect_converter(&config.converter);

    let body_limit = config.max_upload_bytes();
    let session_ttl = Duration::from_secs(config.session_ttl_secs);
    let cleanup_interval = Duration::from_secs(config.cleanup_interval_secs);
    let state = Arc::new(AppState::new(config, converter));

    // Background task expiring idle sessions
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(cleanup_interval).await;
            let expired = cleanup_state.cleanup_old_sessions(session_ttl).await;
            if expired > 0 {
                info!(
                    "Expired {} idle sessions ({} active)",
                    expired,
                    cleanup_state.session_count().await
                );
            }
        }
    });

    let app = Router::new()
        // Pages
        .route("/", get(routes::index))
        .route("/session/{session_id}", get(routes::session_page))
        // API endpoints - HTML fragments (HTMX)
        .route("/api/upload/{session_id}", post(routes::upload_files))
        .route("/api/reset/{session_id}", post(routes::reset_session))
        .route("/api/order/{session_id}/default", post(routes::restore_order))
        .route("/api/order/{session_id}/{key}/{action}", post(routes::update_order))
        .route("/api/pages/{session_id}/{key}", get(routes::edit_panel))
        .route("/api/edit/{session_id}/{key}", post(routes::apply_edit))
        .route("/api/edit/{session_id}/{key}/revert", post(routes::revert_edit))
        // API endpoints - binary responses
        .route("/api/merge/{session_id}/{target}", get(routes::download_merged))
        // Static files with Cache-Control: no-cache (cache but always revalidate via ETag)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(resolve_static_dir(args.static_dir.as_deref()))),
        )
        // Middleware
        // Cache-Control for HTML fragments - prevents bfcache issues with HTMX
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid host or port")?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
