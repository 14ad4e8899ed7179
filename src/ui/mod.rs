//! Native viewer window for oscpuppet.
//!
//! Provides a desktop window with the avatar viewport and a small status
//! panel (model, bound joints, stream port). Enabled via
//! `--features native-ui`.

mod app;
mod renderer;
mod viewport;

pub use app::ViewerApp;
