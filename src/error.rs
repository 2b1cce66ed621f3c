//! # Error Module
//!
//! This module provides the error types for the `uart_shell` application.
//! It uses the `thiserror` crate for ergonomic error handling.
//!
//! Errors fall in two groups: startup errors (bad baud rate, device open,
//! thread spawn) end the process, everything else is reported on the console
//! and the session carries on in its previous state.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for `uart_shell` operations.
pub type Result<T> = std::result::Result<T, UartShellError>;

/// Main error type for the `uart_shell` application.
#[derive(Debug, Error)]
pub enum UartShellError {
    /// The requested baud rate is not one of the supported rates.
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(String),

    /// Failed to open serial port.
    #[error("Failed to open serial port '{port_name}': {reason}")]
    PortOpen { port_name: String, reason: String },

    /// Failed to read from serial port.
    #[error("Failed to read from serial port: {0}")]
    PortRead(#[source] io::Error),

    /// Failed to write to serial port.
    #[error("Failed to write to serial port: {0}")]
    PortWrite(#[source] io::Error),

    /// The device or a file accepted fewer bytes than requested.
    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// The redirect destination could not be opened.
    #[error("Error opening destination file '{}': {source}", .path.display())]
    RedirectOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The transmit source could not be opened.
    #[error("Error opening source file '{}': {source}", .path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Terminal mode could not be changed.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A session thread could not be started.
    #[error("Failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIo(#[from] io::Error),
}

impl UartShellError {
    /// Creates a new port open error.
    #[must_use]
    pub fn port_open(port_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PortOpen {
            port_name: port_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new unsupported baud rate error.
    #[must_use]
    pub fn unsupported_baud_rate(value: impl Into<String>) -> Self {
        Self::UnsupportedBaudRate(value.into())
    }

    /// Creates a new short write error.
    #[must_use]
    pub fn short_write(written: usize, expected: usize) -> Self {
        Self::ShortWrite { written, expected }
    }

    /// Creates a new terminal error.
    #[must_use]
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    /// Returns true for errors that must end the process at startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedBaudRate(_) | Self::PortOpen { .. } | Self::ThreadSpawn { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_open_error() {
        let error = UartShellError::port_open("/dev/ttyUSB0", "Permission denied");
        let msg = error.to_string();
        assert!(msg.contains("/dev/ttyUSB0"));
        assert!(msg.contains("Permission denied"));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_unsupported_baud_rate_error() {
        let error = UartShellError::unsupported_baud_rate("4800");
        assert!(error.to_string().contains("4800"));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_short_write_error() {
        let error = UartShellError::short_write(10, 256);
        assert_eq!(error.to_string(), "Short write: 10 of 256 bytes");
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_redirect_open_error() {
        let error = UartShellError::RedirectOpen {
            path: PathBuf::from("/nope/out.log"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let msg = error.to_string();
        assert!(msg.contains("destination"));
        assert!(msg.contains("/nope/out.log"));
    }

    #[test]
    fn test_io_error_conversion() {
        let error: UartShellError = io::Error::other("disk full").into();
        assert!(matches!(error, UartShellError::FileIo(_)));
        assert!(error.to_string().contains("disk full"));
    }
}
