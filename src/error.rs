//! Error types for rangefinder protocol operations.
//!
//! Errors reported by the instrument itself are not represented here: they
//! arrive as [`Response::Error`](crate::Response::Error) values and are
//! described by [`codes`](crate::codes).

use thiserror::Error;

/// Result type alias for rangefinder operations.
pub type Result<T> = std::result::Result<T, DlsError>;

/// Error types for rangefinder communication.
#[derive(Error, Debug)]
pub enum DlsError {
    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No byte arrived before the response deadline
    #[error("Communication timeout")]
    Timeout,

    /// Response line too short to classify
    #[error("Invalid response: expected {expected}, got {actual}")]
    InvalidResponse {
        /// Expected response format
        expected: String,
        /// Actual response received
        actual: String,
    },

    /// Device address that does not fit the one-character address column
    #[error("Invalid device id {0}: must be a single digit")]
    InvalidDeviceId(u8),

    /// Unknown measuring characteristic name
    #[error("Invalid measuring characteristic: {0}")]
    InvalidCharacteristic(String),

    /// Data parsing error
    #[error("Parse error: {0}")]
    Parse(String),
}
