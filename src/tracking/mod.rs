//! Motion stream ingestion.
//!
//! One backend: per-joint translation/orientation samples over OSC/UDP.

pub mod osc;
