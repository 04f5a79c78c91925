//! Error taxonomy, one enum per layer.
//!
//! Storage failures during startup are fatal; storage failures during
//! individual operations and every location failure are recoverable at the
//! application level.

use thiserror::Error;

/// Failures of the photo store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The embedded database could not be opened or its schema could not be
    /// established. Fatal to startup.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A create or delete transaction failed. The store is left unchanged.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A list transaction failed, or a stored row could not be decoded.
    #[error("read failed: {0}")]
    ReadFailed(String),
}

/// Failures of the camera adapter.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Hardware access was denied or no device is present, or a frame was
    /// requested while the camera is stopped.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// The captured frame could not be encoded as a JPEG.
    #[error("failed to encode frame: {0}")]
    EncodeFailed(String),
}

/// Failures of the position adapter. All of these are non-fatal to capture:
/// the caller proceeds without coordinates.
#[derive(Debug, Error)]
pub enum LocationError {
    /// The platform has no geolocation capability.
    #[error("geolocation not supported")]
    Unsupported,

    /// Geolocation requires a secure origin (HTTPS or loopback).
    #[error("geolocation requires a secure context")]
    InsecureContext,

    /// The user or platform denied the location request.
    #[error("location permission denied: {0}")]
    Denied(String),

    /// No fix arrived within the configured timeout.
    #[error("timed out waiting for a location fix")]
    Timeout,
}

/// Anything the application context can fail with. Capture and storage
/// failures surface as a transient status message; location failures never
/// reach this level.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of the static asset cache. Never allowed to block capture or
/// store operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The asset is not cached and the fetch failed.
    #[error("failed to fetch asset: {0}")]
    FetchFailed(String),

    /// The cache directory could not be read or written.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}
