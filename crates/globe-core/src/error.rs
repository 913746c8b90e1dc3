//! Error types for loading the graphics runtime and building the scene.
//!
//! Neither escapes the engine facade: load errors are logged and the engine
//! stays un-started, setup errors are logged and the container is hidden.

use std::time::Duration;
use thiserror::Error;

/// Acquiring the graphics runtime (adapter, device, surface) failed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("graphics runtime did not become available within {0:?}")]
    Timeout(Duration),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create render surface: {0}")]
    Surface(String),
    #[error("failed to acquire GPU device: {0}")]
    Device(String),
    #[error("graphics runtime unsupported: {0}")]
    Unsupported(String),
}

/// Building the scene or attaching the render surface failed.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("point field needs at least two points, got {0}")]
    DegeneratePointField(usize),
    #[error("render backend: {0:#}")]
    Backend(anyhow::Error),
}
