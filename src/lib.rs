//! Self-healing TCP byte-stream port built on std::net.
//!
//! This crate provides the lowest transport layer under a device
//! communication protocol: a byte-oriented port connected to a remote
//! device over TCP that transparently repairs the link when it drops.
//!
//! # Features
//!
//! - Single-byte blocking reads with timeouts and best-effort writes
//! - Background reconnection with linear backoff (500 ms steps up to 5 s)
//! - At most one reconnect supervisor per port; `close()` cancels it at once
//! - Reconnect notifications through a [`ReconnectListener`]
//! - A generic [`Port`] trait shared with serial transports
//! - An async variant on tokio behind the `tokio` feature
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use netport::{NetworkPort, Port, READ_FAILED};
//!
//! let port = NetworkPort::new("192.168.1.20", 8888);
//! if !port.open() {
//!     eprintln!("device unreachable");
//!     return;
//! }
//!
//! port.write(0x1A);
//! match port.read_timeout(Duration::from_millis(500)) {
//!     READ_FAILED => eprintln!("no answer, link is being repaired"),
//!     byte => println!("received 0x{byte:02X}"),
//! }
//! ```
//!
//! # Failure model
//!
//! No operation surfaces an error through the [`Port`] contract:
//!
//! ```text
//! open()          -> false        connect / resolve failure
//! read(timeout)   -> -1           timeout, I/O error, end of stream,
//!                                 or no connection
//! write(byte)     -> ()           byte dropped on failure
//! ```
//!
//! Read and write failures on a live connection start the reconnect
//! supervisor. The `try_*` methods on [`NetworkPort`] return the
//! underlying [`PortError`] instead.

pub mod connection;
pub mod error;
pub mod port;
pub mod transport;

// Re-export commonly used types at the crate root
pub use connection::{BackoffPolicy, NetworkPort, PortConfig, PortState, PortStats};
#[cfg(feature = "tokio")]
pub use connection::AsyncNetworkPort;
pub use error::{PortError, Result};
pub use port::{FlowControl, Port, ReconnectListener, DEFAULT_READ_TIMEOUT, READ_FAILED};
pub use transport::{Connector, Endpoint, TcpConnector};
