//! Error types for port operations.

use std::io;
use thiserror::Error;

use crate::transport::tcp::Endpoint;

/// Errors that can occur while operating a network port.
#[derive(Error, Debug)]
pub enum PortError {
    /// I/O error on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Host name did not resolve to any address.
    #[error("Unable to resolve {endpoint}")]
    Resolve { endpoint: Endpoint },

    /// Connection to the endpoint could not be established.
    #[error("Unable to connect to {endpoint}: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    /// Operation attempted while no connection is present.
    #[error("Port is not connected")]
    NotConnected,

    /// Operation attempted after the port was explicitly closed.
    #[error("Port is closed")]
    Closed,

    /// Peer closed the connection in an orderly way.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// Read timed out before a byte arrived.
    #[error("Operation timed out")]
    Timeout,
}

/// Result type alias for port operations.
pub type Result<T> = std::result::Result<T, PortError>;

impl PortError {
    /// Create a connect error for the given endpoint.
    pub fn connect(endpoint: &Endpoint, source: io::Error) -> Self {
        Self::Connect {
            endpoint: endpoint.clone(),
            source,
        }
    }

    /// Classify an I/O error from a read, folding timeouts into [`PortError::Timeout`].
    pub fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            _ => Self::Io(err),
        }
    }

    /// Check if this error means the link is broken and recovery should start.
    ///
    /// Timeouts are reported separately so callers can decide via
    /// configuration whether an idle link counts as broken.
    pub fn triggers_reconnect(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }

    /// Check if this error is a read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let endpoint = Endpoint::new("coordinator.local", 8888);
        let err = PortError::connect(
            &endpoint,
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(
            format!("{err}"),
            "Unable to connect to coordinator.local:8888: refused"
        );

        let err = PortError::Resolve { endpoint };
        assert_eq!(format!("{err}"), "Unable to resolve coordinator.local:8888");
    }

    #[test]
    fn test_from_read_classification() {
        let err = PortError::from_read(io::Error::new(io::ErrorKind::WouldBlock, "t"));
        assert!(err.is_timeout());
        assert!(!err.triggers_reconnect());

        let err = PortError::from_read(io::Error::new(io::ErrorKind::ConnectionReset, "r"));
        assert!(matches!(err, PortError::Io(_)));
        assert!(err.triggers_reconnect());

        let err = PortError::from_read(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(matches!(err, PortError::ConnectionClosed));
        assert!(err.triggers_reconnect());
    }

    #[test]
    fn test_disconnected_errors_do_not_reconnect() {
        assert!(!PortError::NotConnected.triggers_reconnect());
        assert!(!PortError::Closed.triggers_reconnect());
    }
}
