//! Network port with background reconnection.

use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use bytes::Buf;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::error::{PortError, Result};
use crate::port::{FlowControl, Port, ReconnectListener, DEFAULT_READ_TIMEOUT, READ_FAILED};
use crate::transport::tcp::{ConnectionHandle, Connector, Endpoint, TcpConnector};

use super::config::{Backoff, PortConfig};
use super::state::{PortState, PortStats};
use super::supervisor;

/// State transitioned under a single guard.
pub(super) struct Status {
    pub(super) state: PortState,
    /// Generation of the most recently installed handle.
    pub(super) generation: u64,
    pub(super) backoff: Backoff,
    pub(super) stats: PortStats,
}

/// State shared between a port and its reconnect supervisor.
pub(super) struct Shared {
    pub(super) endpoint: Endpoint,
    pub(super) config: PortConfig,
    connector: Box<dyn Connector>,
    /// Held for the whole of a read, and by the supervisor around each
    /// attempt, so a reconnect never swaps the handle under a reader.
    pub(super) io: Mutex<()>,
    /// Serializes writers.
    tx: Mutex<()>,
    current: ArcSwapOption<ConnectionHandle>,
    pub(super) status: Mutex<Status>,
    /// Signalled whenever the state leaves `Reconnecting` or becomes `Closed`.
    pub(super) wake: Condvar,
    listener: Mutex<Option<Weak<dyn ReconnectListener>>>,
    /// Serializes listener notifications.
    notify: Mutex<()>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    /// Open a raw stream to the endpoint, recording failures.
    pub(super) fn connect(&self) -> Result<TcpStream> {
        self.connector
            .connect(&self.endpoint, self.config.connect_timeout)
            .inspect_err(|_| self.status.lock().stats.record_failure())
    }

    /// Wrap `stream` in a handle and make it the current one.
    ///
    /// The previous handle, if any, is released.
    pub(super) fn install(&self, stream: TcpStream, status: &mut Status) -> Result<()> {
        let generation = status.generation + 1;
        let handle = ConnectionHandle::new(stream, generation)?;
        handle.configure(self.config.nodelay, self.config.write_timeout)?;

        debug!(endpoint = %self.endpoint, peer = %handle.peer_addr(), generation, "installing connection");
        status.generation = generation;
        status.stats.record_connect();
        if let Some(old) = self.current.swap(Some(Arc::new(handle))) {
            old.release();
        }
        Ok(())
    }

    /// Drop the current handle without touching the state.
    pub(super) fn retire(&self, status: &mut Status) {
        if let Some(old) = self.current.swap(None) {
            old.release();
            status.stats.record_disconnect();
        }
    }

    /// Connect and install the new handle.
    ///
    /// The swap waits for any read in flight, which keeps its handle
    /// until it returns.
    fn open(&self) -> Result<()> {
        let stream = self.connect()?;

        let _io = self.io.lock();
        let mut status = self.status.lock();
        self.install(stream, &mut status)?;
        if status.state.is_reconnecting() {
            info!(endpoint = %self.endpoint, "port reopened while a reconnect was pending");
        }
        status.state = PortState::Connected;
        self.wake.notify_all();
        Ok(())
    }

    /// Report a broken link seen on the handle of `generation`.
    ///
    /// Starts the supervisor unless one is already running, the port is
    /// not connected, or the handle has already been replaced.
    fn report_failure(self: &Arc<Self>, generation: u64, err: &PortError) {
        let mut slot = self.supervisor.lock();

        {
            let mut status = self.status.lock();
            if status.state != PortState::Connected || status.generation != generation {
                debug!(
                    endpoint = %self.endpoint,
                    generation,
                    state = ?status.state,
                    "ignoring failure, no reconnect needed"
                );
                return;
            }
            warn!(
                endpoint = %self.endpoint,
                error = %err,
                uptime = ?status.stats.uptime(),
                "link failed, reconnecting"
            );
            status.state = PortState::Reconnecting;
            self.retire(&mut status);
        }

        if let Some(previous) = slot.take() {
            // A finished episode; its thread has already returned or is
            // returning from the listener callback.
            if previous.is_finished() && previous.join().is_err() {
                warn!(endpoint = %self.endpoint, "previous reconnect supervisor panicked");
            }
        }

        match supervisor::spawn(self) {
            Ok(handle) => *slot = Some(handle),
            Err(e) => {
                error!(endpoint = %self.endpoint, error = %e, "unable to start reconnect supervisor");
                let mut status = self.status.lock();
                if status.state.is_reconnecting() {
                    status.state = PortState::Disconnected;
                    self.wake.notify_all();
                }
            }
        }
    }

    /// Block while a reconnect is in progress, up to `timeout`.
    ///
    /// Returns what is left of the timeout. `None` means no limit.
    fn await_repair(&self, timeout: Option<Duration>) -> Result<Option<Duration>> {
        let mut status = self.status.lock();
        if !status.state.is_reconnecting() {
            return Ok(timeout);
        }

        match timeout {
            None => {
                self.wake
                    .wait_while(&mut status, |status| status.state.is_reconnecting());
                Ok(None)
            }
            Some(timeout) => {
                let started = Instant::now();
                let result = self.wake.wait_while_for(
                    &mut status,
                    |status| status.state.is_reconnecting(),
                    timeout,
                );
                let remaining = timeout.saturating_sub(started.elapsed());
                if result.timed_out() || remaining.is_zero() {
                    return Err(PortError::Timeout);
                }
                Ok(Some(remaining))
            }
        }
    }

    /// Tell the listener the link was repaired, unless the port was closed.
    pub(super) fn notify_reconnected(&self) {
        let _serial = self.notify.lock();

        if self.status.lock().state.is_closed() {
            info!(endpoint = %self.endpoint, "port closed, skipping reconnect notification");
            return;
        }

        let listener = self.listener.lock().as_ref().and_then(Weak::upgrade);
        match listener {
            Some(listener) => listener.reconnected(),
            None => debug!(endpoint = %self.endpoint, "no reconnect listener registered"),
        }
    }

    fn close(&self) {
        {
            let mut status = self.status.lock();
            status.state = PortState::Closed;
            self.retire(&mut status);
            self.wake.notify_all();
        }

        let supervisor = self.supervisor.lock().take();
        if let Some(handle) = supervisor {
            if handle.thread().id() == thread::current().id() {
                // Closed from inside the listener callback.
                return;
            }
            if handle.join().is_err() {
                warn!(endpoint = %self.endpoint, "reconnect supervisor panicked");
            }
        }
    }
}

/// A TCP port that repairs itself when the link drops.
///
/// The port keeps its identity across reconnections: callers keep using
/// the same `NetworkPort` while a background supervisor re-establishes
/// the connection with linear backoff. An optional [`ReconnectListener`]
/// learns when a repair happened.
///
/// All operations take `&self`; share the port between a reader thread
/// and writer threads by wrapping it in an `Arc`.
pub struct NetworkPort {
    shared: Arc<Shared>,
}

impl NetworkPort {
    /// Create a port for `host:port` with the default configuration.
    ///
    /// No connection is made until [`NetworkPort::open`] is called.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(Endpoint::new(host, port), PortConfig::default())
    }

    /// Create a port with an explicit configuration.
    pub fn with_config(endpoint: Endpoint, config: PortConfig) -> Self {
        Self::with_connector(endpoint, config, TcpConnector)
    }

    /// Create a port that establishes streams through `connector`.
    pub fn with_connector<C>(endpoint: Endpoint, config: PortConfig, connector: C) -> Self
    where
        C: Connector + 'static,
    {
        let backoff = config.backoff.start();
        Self {
            shared: Arc::new(Shared {
                endpoint,
                config,
                connector: Box::new(connector),
                io: Mutex::new(()),
                tx: Mutex::new(()),
                current: ArcSwapOption::empty(),
                status: Mutex::new(Status {
                    state: PortState::Disconnected,
                    generation: 0,
                    backoff,
                    stats: PortStats::default(),
                }),
                wake: Condvar::new(),
                listener: Mutex::new(None),
                notify: Mutex::new(()),
                supervisor: Mutex::new(None),
            }),
        }
    }

    /// Get the endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    /// Get the configuration.
    pub fn config(&self) -> &PortConfig {
        &self.shared.config
    }

    /// Get the current state.
    pub fn state(&self) -> PortState {
        self.shared.status.lock().state
    }

    /// Get a snapshot of the port statistics.
    pub fn stats(&self) -> PortStats {
        self.shared.status.lock().stats.clone()
    }

    /// Delay the supervisor will wait after its next failed attempt.
    pub fn backoff(&self) -> Duration {
        self.shared.status.lock().backoff.current()
    }

    /// Check if the port is connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Check if the port is closed or was never opened.
    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    /// Get the peer address of the current connection.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.shared.current.load_full().map(|h| h.peer_addr())
    }

    /// Register the listener notified after a background repair.
    ///
    /// Only a weak reference is kept; dropping the listener unregisters it.
    pub fn set_reconnect_listener(&self, listener: &Arc<dyn ReconnectListener>) {
        *self.shared.listener.lock() = Some(Arc::downgrade(listener));
    }

    /// Remove the reconnect listener.
    pub fn clear_reconnect_listener(&self) {
        *self.shared.listener.lock() = None;
    }

    /// Connect to the endpoint.
    pub fn try_open(&self) -> Result<()> {
        self.shared.open()
    }

    /// Connect to the endpoint. Returns `false` on any failure.
    pub fn open(&self) -> bool {
        match self.try_open() {
            Ok(()) => true,
            Err(e) => {
                error!(endpoint = %self.shared.endpoint, error = %e, "unable to open port");
                false
            }
        }
    }

    /// Close the port.
    ///
    /// Always succeeds, whether or not the port was ever opened. A running
    /// supervisor is woken, observes the closure and exits without calling
    /// the listener; this call waits for it to finish.
    pub fn close(&self) {
        info!(endpoint = %self.shared.endpoint, "closing port");
        self.shared.close();
    }

    /// Write bytes to the connection.
    ///
    /// A failing write starts a reconnection and the bytes are lost.
    pub fn try_write_all(&self, bytes: &[u8]) -> Result<()> {
        let _tx = self.shared.tx.lock();

        let Some(handle) = self.shared.current.load_full() else {
            return Err(PortError::NotConnected);
        };

        match handle.write_all(bytes) {
            Ok(()) => {
                self.shared.status.lock().stats.record_send(bytes.len());
                Ok(())
            }
            Err(e) => {
                self.shared.report_failure(handle.generation(), &e);
                Err(e)
            }
        }
    }

    /// Write a single byte.
    pub fn try_write(&self, value: u8) -> Result<()> {
        self.try_write_all(&[value])
    }

    /// Write a single byte, best effort.
    ///
    /// Does nothing while disconnected. Errors are not reported.
    pub fn write(&self, value: u8) {
        if let Err(e) = self.try_write(value) {
            debug!(endpoint = %self.shared.endpoint, error = %e, "dropped byte");
        }
    }

    /// Write a whole buffer, best effort.
    ///
    /// Stops at the first failure; the rest of the buffer is dropped.
    pub fn write_buf<B: Buf>(&self, mut buf: B) {
        while buf.has_remaining() {
            let chunk = buf.chunk();
            let len = chunk.len();
            if let Err(e) = self.try_write_all(chunk) {
                debug!(
                    endpoint = %self.shared.endpoint,
                    error = %e,
                    dropped = buf.remaining(),
                    "dropped buffer"
                );
                return;
            }
            buf.advance(len);
        }
    }

    /// Read a single byte, waiting up to `timeout`.
    ///
    /// A zero timeout waits indefinitely. While a reconnect is in progress
    /// the read waits for it within the same timeout.
    pub fn try_read(&self, timeout: Duration) -> Result<u8> {
        let timeout = (!timeout.is_zero()).then_some(timeout);
        let timeout = self.shared.await_repair(timeout)?;

        let _io = self.shared.io.lock();

        let Some(handle) = self.shared.current.load_full() else {
            error!(endpoint = %self.shared.endpoint, "reading on an unconnected port");
            return Err(PortError::NotConnected);
        };

        match handle.read_byte(timeout) {
            Ok(byte) => {
                self.shared.status.lock().stats.record_receive(1);
                Ok(byte)
            }
            Err(e) => {
                if e.triggers_reconnect()
                    || (e.is_timeout() && self.shared.config.reconnect_on_timeout)
                {
                    self.shared.report_failure(handle.generation(), &e);
                }
                Err(e)
            }
        }
    }

    /// Read a single byte, waiting up to `timeout`.
    ///
    /// Returns the byte value or [`READ_FAILED`].
    pub fn read_timeout(&self, timeout: Duration) -> i32 {
        match self.try_read(timeout) {
            Ok(byte) => i32::from(byte),
            Err(e) => {
                debug!(endpoint = %self.shared.endpoint, error = %e, "read failed");
                READ_FAILED
            }
        }
    }

    /// Read a single byte with the default, effectively unbounded, timeout.
    pub fn read(&self) -> i32 {
        self.read_timeout(DEFAULT_READ_TIMEOUT)
    }

    /// Drop bytes already received but not yet read.
    ///
    /// Waits for any read or reconnect in flight to finish first. Returns
    /// the number of bytes discarded.
    pub fn purge_rx_buffer_count(&self) -> usize {
        let _io = self.shared.io.lock();

        let Some(handle) = self.shared.current.load_full() else {
            return 0;
        };
        match handle.discard_pending() {
            Ok(discarded) => {
                if discarded > 0 {
                    debug!(endpoint = %self.shared.endpoint, discarded, "purged receive buffer");
                }
                discarded
            }
            Err(e) => {
                debug!(endpoint = %self.shared.endpoint, error = %e, "purge failed");
                0
            }
        }
    }
}

impl Port for NetworkPort {
    fn open(&self) -> bool {
        NetworkPort::open(self)
    }

    fn open_with_baud_rate(&self, _baud_rate: u32) -> bool {
        NetworkPort::open(self)
    }

    fn open_with_flow_control(&self, _baud_rate: u32, _flow_control: FlowControl) -> bool {
        NetworkPort::open(self)
    }

    fn close(&self) {
        NetworkPort::close(self)
    }

    fn write(&self, value: u8) {
        NetworkPort::write(self, value)
    }

    fn read(&self) -> i32 {
        NetworkPort::read(self)
    }

    fn read_timeout(&self, timeout: Duration) -> i32 {
        NetworkPort::read_timeout(self, timeout)
    }

    fn purge_rx_buffer(&self) {
        self.purge_rx_buffer_count();
    }
}

impl Drop for NetworkPort {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl std::fmt::Debug for NetworkPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkPort")
            .field("endpoint", &self.shared.endpoint)
            .field("state", &self.state())
            .finish()
    }
}
