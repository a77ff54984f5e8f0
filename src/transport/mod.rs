//! Transport layer for network ports.
//!
//! This module provides the raw TCP pieces a port is built from:
//! endpoint resolution, pluggable connectors and connection handles.

pub mod tcp;

pub use tcp::{ConnectionHandle, Connector, Endpoint, TcpConnector};
