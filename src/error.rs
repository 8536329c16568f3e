//! Error types for `dbhandle`
//!
//! Every failure is a returned value. Errors reported by a driver are kept
//! as the `source` of the variant that carries them, never re-interpreted.

use thiserror::Error;

/// Boxed error reported by a driver implementation
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to resolve or open a driver connection
#[derive(Debug, Error)]
pub enum DriverError {
    /// No driver is registered under the requested name
    #[error("unknown driver {0:?} (forgotten registration?)")]
    UnknownDriver(String),

    /// A driver is already registered under this name
    #[error("driver {0:?} is already registered")]
    AlreadyRegistered(String),

    /// The driver rejected the connection string
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// The driver failed to allocate the connection
    #[error("failed to open connection: {0}")]
    Open(#[source] BoxError),
}

/// Failure to parse a `key=value` connection string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnInfoError {
    /// A keyword was not followed by `=`
    #[error("missing \"=\" after keyword {0:?}")]
    MissingEquals(String),

    /// An `=` appeared where a keyword was expected
    #[error("empty keyword at offset {0}")]
    EmptyKeyword(usize),

    /// A single-quoted value was never closed
    #[error("unterminated quoted value for keyword {0:?}")]
    UnterminatedQuote(String),

    /// The same keyword appeared twice
    #[error("duplicate keyword {0:?}")]
    DuplicateKeyword(String),
}

/// Failure to release a connection
#[derive(Debug, Error)]
pub enum CloseError {
    /// `close` was already called on this handle
    #[error("connection is already closed")]
    AlreadyClosed,

    /// The driver reported a failure while releasing resources
    #[error("failed to close connection: {0}")]
    Driver(#[source] BoxError),
}

/// Failed liveness check
#[derive(Debug, Error)]
pub enum ConnectivityError {
    /// The handle was closed before the ping
    #[error("connection is closed")]
    Closed,

    /// The round-trip to the server failed
    #[error("ping failed: {0}")]
    Driver(#[source] BoxError),
}

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error occurred while reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error occurred
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure to build the TLS client configuration
#[derive(Debug, Error)]
pub enum TlsError {
    /// The CA certificate file could not be read
    #[error("failed to read CA certificate file '{path}': {source}")]
    CaCertRead {
        /// Path of the CA file
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The CA certificate file contained no usable certificate
    #[error("no valid certificates found in '{0}'")]
    NoCertificates(String),

    /// rustls rejected the configuration
    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_unknown_driver_message_quotes_name() {
        let err = DriverError::UnknownDriver(String::new());
        assert_eq!(
            err.to_string(),
            "unknown driver \"\" (forgotten registration?)"
        );
    }

    #[test]
    fn test_driver_source_is_preserved() {
        let inner: BoxError = "connection refused".into();
        let err = ConnectivityError::Driver(inner);
        assert_eq!(err.source().unwrap().to_string(), "connection refused");
        assert_eq!(err.to_string(), "ping failed: connection refused");
    }

    #[test]
    fn test_open_error_keeps_driver_source() {
        let err = DriverError::Open("no pg_hba.conf entry".into());
        assert_eq!(err.source().unwrap().to_string(), "no pg_hba.conf entry");
    }
}
