//! Crate error type
//!
//! The field, batches and particles never fail; only persistence, content
//! parsing and GPU frame acquisition do.

use thiserror::Error;

/// Errors surfaced at the crate's fallible edges
#[derive(Error, Debug)]
pub enum Error {
    /// Settings file could not be read or written
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or content JSON was malformed
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// Surface texture could not be acquired this frame
    #[error("surface unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("gpu device unavailable: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// A content descriptor has values that cannot be resolved
    #[error("invalid {kind} descriptor: {reason}")]
    InvalidContent {
        /// Descriptor type name
        kind: &'static str,
        /// What was wrong with it
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
