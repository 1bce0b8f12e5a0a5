//! # Error Types Module
//!
//! Centralized error handling for ppg-scope.
//! One error type per concern, with context and source chaining.
//!
//! ## Error Types
//! - `LineParseError`: a received line could not be decoded or parsed; the
//!   line is dropped and ingestion carries on
//! - `ExportError`: nothing to export, or writing the CSV file failed
//! - `TransportError`: the serial link could not be opened or read
//! - `ConfigError`: configuration file I/O and parsing errors
//!
//! ## Severity
//! Only a `TransportError` while opening the port ends the process. Line and
//! export failures are reported and the session keeps running.

use std::fmt;
use std::num::ParseFloatError;

/// Errors raised while parsing one line of sensor output
#[derive(Debug, Clone, PartialEq)]
pub enum LineParseError {
    /// Line is not valid UTF-8
    Encoding(std::str::Utf8Error),
    /// A `name:value` field whose value is not a number
    InvalidValue {
        field: String,
        value: String,
        source: ParseFloatError,
    },
}

impl fmt::Display for LineParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineParseError::Encoding(e) => {
                write!(f, "Line is not valid UTF-8: {}", e)
            }
            LineParseError::InvalidValue { field, value, source } => {
                write!(f, "Invalid value {:?} in field {:?}: {}", value, field, source)
            }
        }
    }
}

impl std::error::Error for LineParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LineParseError::Encoding(e) => Some(e),
            LineParseError::InvalidValue { source, .. } => Some(source),
        }
    }
}

/// Errors that can occur while exporting recorded samples
#[derive(Debug)]
pub enum ExportError {
    /// Session store holds no samples yet
    NoSamples,
    /// Creating, writing or renaming the output file failed
    Io(std::io::Error),
    /// CSV encoding failed
    Csv(csv::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NoSamples => write!(f, "No data to export"),
            ExportError::Io(e) => write!(f, "Failed to write export file: {}", e),
            ExportError::Csv(e) => write!(f, "Failed to encode export file: {}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::NoSamples => None,
            ExportError::Io(e) => Some(e),
            ExportError::Csv(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e)
    }
}

/// Errors that can occur on the serial link
#[derive(Debug)]
pub enum TransportError {
    /// Failed to create Tokio runtime
    RuntimeCreation(String),
    /// Failed to open the serial port
    Open { port: String, reason: String },
    /// Reading from an open port failed
    Read(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::RuntimeCreation(msg) => {
                write!(f, "Failed to create async runtime: {}", msg)
            }
            TransportError::Open { port, reason } => {
                write!(f, "Failed to open serial port {}: {}", port, reason)
            }
            TransportError::Read(e) => {
                write!(f, "Serial read failed: {}", e)
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Read(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors that can occur during configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read config file
    ReadFailed(std::io::Error),
    /// Failed to write config file
    WriteFailed(std::io::Error),
    /// Failed to parse config file
    ParseFailed(toml::de::Error),
    /// Failed to serialize config
    SerializeFailed(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFailed(e) => {
                write!(f, "Failed to read config file: {}", e)
            }
            ConfigError::WriteFailed(e) => {
                write!(f, "Failed to write config file: {}", e)
            }
            ConfigError::ParseFailed(e) => {
                write!(f, "Failed to parse config file: {}", e)
            }
            ConfigError::SerializeFailed(e) => {
                write!(f, "Failed to serialize config: {}", e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadFailed(e) => Some(e),
            ConfigError::WriteFailed(e) => Some(e),
            ConfigError::ParseFailed(e) => Some(e),
            ConfigError::SerializeFailed(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_line_parse_error_display() {
        let source = "abc".parse::<f64>().unwrap_err();
        let err = LineParseError::InvalidValue {
            field: "R:abc".to_string(),
            value: "abc".to_string(),
            source,
        };
        assert!(err.to_string().contains("R:abc"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_export_error_display() {
        assert_eq!(ExportError::NoSamples.to_string(), "No data to export");
        assert!(ExportError::NoSamples.source().is_none());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Open {
            port: "COM8".to_string(),
            reason: "not found".to_string(),
        };
        assert!(err.to_string().contains("COM8"));
    }

    #[test]
    fn test_config_error_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::ReadFailed(io_err);
        assert!(err.source().is_some());
    }
}
