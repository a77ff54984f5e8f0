//! Generic port abstraction shared with other physical transports.
//!
//! A protocol layer talks to a [`Port`] without knowing whether bytes
//! travel over a serial line or a TCP socket. Serial-only parameters such
//! as baud rate and flow control are part of the contract but have no
//! meaning for network transports, which accept and ignore them.

use std::time::Duration;

/// Value returned by [`Port::read`] when no byte could be read.
pub const READ_FAILED: i32 = -1;

/// Timeout used by [`Port::read`]. Effectively unbounded.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(9_999_999);

/// Flow control mode of a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowControl {
    /// No flow control.
    #[default]
    None,
    /// Hardware flow control (RTS/CTS).
    RtsCts,
    /// Software flow control (XON/XOFF).
    XonXoff,
}

/// Byte-oriented port used by a device protocol layer.
///
/// Failures never surface as errors: `open` reports `false`, `read`
/// reports [`READ_FAILED`] and `write` is best effort.
pub trait Port: Send + Sync {
    /// Open the port.
    fn open(&self) -> bool;

    /// Open the port at the given baud rate.
    fn open_with_baud_rate(&self, baud_rate: u32) -> bool;

    /// Open the port at the given baud rate and flow control.
    fn open_with_flow_control(&self, baud_rate: u32, flow_control: FlowControl) -> bool;

    /// Close the port.
    fn close(&self);

    /// Write a single byte.
    fn write(&self, value: u8);

    /// Read a single byte, waiting up to `timeout`.
    ///
    /// Returns the byte value (0..=255) or [`READ_FAILED`].
    fn read_timeout(&self, timeout: Duration) -> i32;

    /// Read a single byte, waiting up to [`DEFAULT_READ_TIMEOUT`].
    fn read(&self) -> i32 {
        self.read_timeout(DEFAULT_READ_TIMEOUT)
    }

    /// Purge the receive buffer.
    fn purge_rx_buffer(&self);
}

/// Notified when a broken link has been repaired in the background.
///
/// Called once per repair episode, never concurrently with itself and
/// never after the port was explicitly closed.
pub trait ReconnectListener: Send + Sync {
    /// The port reconnected to its endpoint.
    fn reconnected(&self);
}

impl<F> ReconnectListener for F
where
    F: Fn() + Send + Sync,
{
    fn reconnected(&self) {
        self()
    }
}
