//! oscpuppet - OSC-driven skeletal avatar renderer
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use oscpuppet::{avatar::Avatar, config::Config, tracking::osc::MotionReceiver, AppState};

/// Real-time skeletal avatar renderer driven by OSC motion capture streams
#[derive(Parser, Debug)]
#[command(name = "oscpuppet", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Avatar model file (overrides config)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// UDP port for the motion stream (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Disable smooth mesh deformation
    #[arg(long)]
    no_skinning: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Launch the native viewer window
    #[cfg(feature = "native-ui")]
    #[arg(long)]
    ui: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", oscpuppet::NAME, oscpuppet::VERSION);

    // Build the tokio runtime manually so the main thread stays free for
    // the winit event loop
    let runtime = tokio::runtime::Runtime::new()?;

    let state = runtime.block_on(async { setup_and_spawn_services(&args).await })?;

    // If the viewer is requested, run eframe on the main thread (blocks
    // until the window closes)
    #[cfg(feature = "native-ui")]
    if args.ui {
        info!("Launching viewer window");
        let ui_state = Arc::clone(&state);

        if let Err(e) = oscpuppet::ui::ViewerApp::run(ui_state) {
            error!("UI error: {}", e);
        }

        info!("Viewer closed, shutting down");
        state.shutdown();

        runtime.shutdown_timeout(std::time::Duration::from_secs(3));
        return Ok(());
    }

    // Headless mode: wait for Ctrl+C / SIGTERM
    runtime.block_on(async {
        shutdown_signal().await;
        info!("Shutdown signal received");
        state.shutdown();

        // Give tasks a moment to clean up
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
    });

    info!("oscpuppet stopped");
    Ok(())
}

/// Load config, construct the avatar, and spawn the motion stream task.
async fn setup_and_spawn_services(args: &Args) -> anyhow::Result<Arc<AppState>> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.model.path = model.clone();
    }
    if let Some(port) = args.port {
        config.osc.port = port;
    }
    if args.no_skinning {
        config.model.skinning = false;
    }

    config.validate()?;

    info!("Model: {}", config.model.path.display());
    info!("Motion stream port: {}", config.osc.port);
    info!("Skinning: {}", config.model.skinning);

    // Fatal if the model cannot be opened or parsed
    let avatar = Avatar::create(&config.model.path, config.model.skinning)?;

    let state = AppState::new(config, avatar);

    let stream_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = run_motion_stream(stream_state).await {
            error!("Motion stream error: {}", e);
        }
    });

    Ok(state)
}

/// Poll the motion receiver until shutdown.
async fn run_motion_stream(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut shutdown_rx = state.subscribe_shutdown();

    let mut receiver = MotionReceiver::new(&state.config.osc, Arc::clone(&state.avatar));
    receiver.start()?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Motion stream shutting down");
                break;
            }
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(5)) => {
                if let Err(e) = receiver.process() {
                    error!("Motion receive error: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }
    }

    receiver.stop();
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
