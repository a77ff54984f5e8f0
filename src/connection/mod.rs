//! Self-healing network ports.
//!
//! This module provides:
//! - [`NetworkPort`], a TCP port that reconnects in the background
//! - Configuration for backoff, timeouts and retry limits
//! - Port state and statistics
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use netport::connection::{BackoffPolicy, NetworkPort, PortConfig};
//! use netport::{Endpoint, ReconnectListener};
//!
//! let config = PortConfig::default().with_backoff(BackoffPolicy::linear(
//!     Duration::from_millis(500),
//!     Duration::from_millis(500),
//!     Duration::from_secs(5),
//! ));
//! let port = NetworkPort::with_config(Endpoint::new("192.168.1.20", 8888), config);
//!
//! let listener: Arc<dyn ReconnectListener> = Arc::new(|| println!("link repaired"));
//! port.set_reconnect_listener(&listener);
//!
//! if port.open() {
//!     port.write(0x7E);
//!     let byte = port.read_timeout(Duration::from_secs(1));
//!     println!("read {byte}");
//! }
//! port.close();
//! ```

mod config;
mod network_port;
mod state;
mod supervisor;

pub use config::{Backoff, BackoffPolicy, PortConfig};
pub use network_port::NetworkPort;
pub use state::{PortState, PortStats};

// Async variant (requires tokio feature)
#[cfg(feature = "tokio")]
mod network_port_async;

#[cfg(feature = "tokio")]
pub use network_port_async::AsyncNetworkPort;
