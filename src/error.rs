//! # Error Types
//!
//! This module defines error types used throughout the catprint library.
//!
//! Two layers exist:
//!
//! - [`LinkError`]: what a [`TransportLink`](crate::transport::TransportLink)
//!   reports for a single operation (one connect, one chunk write, ...)
//! - [`CatprintError`]: what callers of the encoder, writer and session see

use thiserror::Error;
use uuid::Uuid;

/// Failure of a single link-level operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkError {
    /// Could not establish the connection
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// No peripheral with this address was found during the scan
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The peripheral does not expose a required characteristic
    #[error("Characteristic {0} not found")]
    CharacteristicNotFound(Uuid),

    /// A single chunk write was rejected
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Reading the status characteristic failed
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Starting or stopping notifications failed
    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    /// Any other backend failure (adapter missing, disconnect error, ...)
    #[error("Bluetooth backend error: {0}")]
    Backend(String),
}

/// Main error type for catprint operations
#[derive(Debug, Error)]
pub enum CatprintError {
    /// Invalid raster dimensions, chunk size, address or profile value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A write was attempted while the link is disconnected
    #[error("Printer is not connected")]
    NotConnected,

    /// Transport-level error surfaced by the link
    #[error(transparent)]
    Link(#[from] LinkError),

    /// A single chunk failed too many times in a row
    #[error("Gave up after {attempts} failed attempts writing chunk at offset {offset}")]
    RetryExhausted { offset: usize, attempts: u32 },

    /// Image loading or processing error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Profile parsing error
    #[error("Profile error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatprintError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
