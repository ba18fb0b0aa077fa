//! Unified error handling for the tour-sim library.
//!
//! Hard errors exist only at the edges: malformed polyline bytes, a missing
//! API key, HTTP transport failures. Everything else in this crate degrades
//! (straight-line fallback, skipped spot) rather than failing.

use thiserror::Error;

/// Unified error type for tour-sim operations.
#[derive(Debug, Clone, Error)]
pub enum TourSimError {
    /// A coordinate outside the valid latitude/longitude range
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Encoded polyline could not be decoded
    #[error("polyline decode failed at byte {position}: {message}")]
    PolylineDecode { position: usize, message: String },

    /// Directions provider failure (transport error or bad response)
    #[error("directions error{}: {message}", .status_code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Directions {
        message: String,
        status_code: Option<u16>,
    },

    /// Geocoding provider failure
    #[error("geocoding failed for \"{query}\": {message}")]
    Geocoding { query: String, message: String },

    /// Configuration error (e.g. missing API key)
    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for tour-sim operations.
pub type Result<T> = std::result::Result<T, TourSimError>;
