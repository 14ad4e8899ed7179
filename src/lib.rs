//! oscpuppet - OSC-driven skeletal avatar renderer
//!
//! Receives per-joint motion capture samples over OSC/UDP and applies them
//! to the skeleton of a loaded glTF model in real time:
//! - Fixed 64-joint taxonomy, resolved by name against the model on load
//!   (best effort: missing joints are warned about and skipped)
//! - Translation samples set absolute local positions; orientation samples
//!   arrive as Euler degrees and are composed in Z-X-Y order
//! - Network ingestion and the render loop are decoupled by a single pose
//!   lock, so a frame never sees a half-written transform
//! - Optional native viewer window with GPU rendering (feature `native-ui`)

pub mod avatar;
pub mod config;
pub mod error;
pub mod scene;
pub mod skeleton;
pub mod tracking;

#[cfg(feature = "native-ui")]
pub mod ui;

pub use config::Config;
pub use error::{OscPuppetError, Result};

use std::sync::Arc;
use tokio::sync::broadcast;

use avatar::Avatar;

/// Application state shared across all components
pub struct AppState {
    /// Configuration, frozen after startup
    pub config: Config,
    /// The motion-driven avatar
    pub avatar: Arc<Avatar>,
    /// Shutdown signal
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Create the shared application state around a constructed avatar.
    pub fn new(config: Config, avatar: Avatar) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(Self {
            config,
            avatar: Arc::new(avatar),
            shutdown_tx,
        })
    }

    /// Subscribe to the shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
