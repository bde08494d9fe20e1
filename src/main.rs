use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use recolor::api;
use recolor::assets::AssetLoader;
use recolor::models::AppConfig;
use recolor::server;

/// How long the worker may take to finish its current job after shutdown
const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "recolor")]
#[command(about = "Recolor - remap images onto a color palette")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server and background worker
    Serve,
    /// Convert a single image to a palette (no server needed)
    Convert {
        /// Source image (JPEG or PNG)
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Palette as comma-separated hex RGB (e.g. "#000000,#FFFFFF,#FF0000")
        #[arg(short, long, required_unless_present = "palette", conflicts_with = "palette")]
        colors: Option<String>,

        /// Name of a preset palette from the config
        #[arg(short, long)]
        palette: Option<String>,

        /// Mix each pixel with its match as (pixel + match) / 5, a muted tint
        #[arg(short, long)]
        blend: bool,

        /// Re-compress the output with oxipng
        #[arg(long)]
        optimize: bool,
    },
    /// List preset palettes
    Palettes,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recolor API",
        description = "Asynchronous palette remapping for uploaded images",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_convert,
        api::handle_job_status,
        api::handle_output,
        api::handle_palettes,
        api::handle_queue_stats,
    ),
    components(schemas(
        api::ConvertForm,
        api::ConvertResponse,
        api::JobResult,
        api::JobStatusResponse,
        api::PalettesResponse,
        api::PresetPalette,
        api::QueueStats,
    )),
    tags(
        (name = "Conversion", description = "Image submission"),
        (name = "Jobs", description = "Job results and queue state"),
        (name = "Palettes", description = "Preset palettes")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert {
            input,
            output,
            colors,
            palette,
            blend,
            optimize,
        }) => {
            init_cli_logging();
            run_convert_command(&input, &output, colors, palette, blend, optimize)
        }
        Some(Commands::Palettes) => {
            init_cli_logging();
            run_palettes_command();
            Ok(())
        }
        Some(Commands::Serve) => run_server().await,
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Minimal logging for CLI commands
fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recolor=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn asset_loader_from_env() -> AssetLoader {
    AssetLoader::new(std::env::var("CONFIG_FILE").ok().map(PathBuf::from))
}

/// Load config and apply UPLOAD_DIR / OUTPUT_DIR overrides
fn load_config(loader: &AssetLoader) -> AppConfig {
    AppConfig::load_from_assets(loader).with_storage_overrides(
        std::env::var("UPLOAD_DIR").ok().map(PathBuf::from),
        std::env::var("OUTPUT_DIR").ok().map(PathBuf::from),
    )
}

/// Convert one file directly. The input file is left in place.
fn run_convert_command(
    input: &Path,
    output: &Path,
    colors: Option<String>,
    palette: Option<String>,
    blend: bool,
    optimize: bool,
) -> anyhow::Result<()> {
    let config = load_config(&asset_loader_from_env());
    let palette = api::convert::resolve_palette(&config, colors.as_deref(), palette.as_deref())?;

    let never_cancelled = AtomicBool::new(false);
    let png_bytes = recolor::services::transformer::convert_file(
        input,
        &palette,
        blend,
        optimize,
        &never_cancelled,
    )
    .map_err(|e| anyhow::anyhow!("Conversion failed: {e}"))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, &png_bytes)?;
    println!(
        "Converted {} -> {} ({} colors, {} bytes)",
        input.display(),
        output.display(),
        palette.len(),
        png_bytes.len()
    );
    Ok(())
}

/// Print the preset palettes
fn run_palettes_command() {
    let config = load_config(&asset_loader_from_env());

    if config.palettes.is_empty() {
        println!("No preset palettes configured.");
        return;
    }

    let width = config.palettes.keys().map(String::len).max().unwrap_or(0);
    for (name, colors) in &config.palettes {
        let marker = match config.preset(name) {
            Some(Err(e)) => format!("  (invalid: {e})"),
            _ => String::new(),
        };
        println!("  {name:<width$}  {}{marker}", colors.join(" "));
    }
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let upload_dir = std::env::var("UPLOAD_DIR").ok();
    let output_dir = std::env::var("OUTPUT_DIR").ok();

    println!("Recolor v{VERSION}");
    println!("Palette remapping service for images\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:3000 (default)")
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  UPLOAD_DIR  = {}",
        upload_dir.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  OUTPUT_DIR  = {}",
        output_dir.as_deref().unwrap_or("(not set)")
    );

    let loader = asset_loader_from_env();
    let config = load_config(&loader);

    println!("\nConfiguration:");
    println!("  Config:    {}", loader.config_source());
    println!("  Uploads:   {}", config.storage.upload_dir.display());
    println!("  Outputs:   {}", config.storage.output_dir.display());
    println!(
        "  Timeout:   {}",
        config
            .queue
            .job_timeout()
            .map(|t| format!("{}s per job", t.as_secs()))
            .unwrap_or_else(|| "none".to_string())
    );
    println!("  Max size:  {} bytes", config.upload.max_bytes);
    println!("  Presets:   {}", config.palettes.len());
    println!("  Frontend:  {}", AssetLoader::list_static().join(", "));

    println!("\nCommands:");
    println!("  recolor serve      Start the HTTP server");
    println!("  recolor convert    Convert an image file directly");
    println!("  recolor palettes   List preset palettes");
    println!("\nRun 'recolor --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recolor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let asset_loader = asset_loader_from_env();

    tracing::info!(config = %asset_loader.config_source(), "Config source");

    match asset_loader.seed_config_if_configured() {
        Ok(true) => tracing::info!("Seeded config file with embedded default"),
        Ok(false) => {}
        Err(e) => tracing::warn!(%e, "Failed to seed config file"),
    }

    let state = server::create_app_state(load_config(&asset_loader))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = state.spawn_worker(shutdown_rx);

    // Build router: start with shared API routes, add production-only routes
    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Recolor server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped accepting connections, stopping worker");
    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(WORKER_SHUTDOWN_GRACE, worker_handle).await {
        Ok(Ok(())) => tracing::info!("Worker stopped"),
        Ok(Err(e)) => tracing::error!(%e, "Worker task panicked"),
        Err(_) => tracing::warn!("Worker did not stop in time, abandoning current job"),
    }

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(%e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(%e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
