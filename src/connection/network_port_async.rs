//! Async network port with background reconnection.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Buf;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, timeout, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{PortError, Result};
use crate::port::{ReconnectListener, READ_FAILED};
use crate::transport::tcp::Endpoint;

use super::config::PortConfig;
use super::network_port::Status;
use super::state::{PortState, PortStats};

/// Read timeout used while draining already-queued bytes.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(1);

struct Reader {
    generation: u64,
    half: OwnedReadHalf,
}

struct Writer {
    generation: u64,
    peer_addr: SocketAddr,
    half: OwnedWriteHalf,
}

struct AsyncShared {
    endpoint: Endpoint,
    config: PortConfig,
    /// Read guard; also held by the supervisor around each attempt.
    io: tokio::sync::Mutex<Option<Reader>>,
    tx: tokio::sync::Mutex<Option<Writer>>,
    status: Mutex<Status>,
    /// Mirrors `status.state` for tasks waiting on a transition.
    state: watch::Sender<PortState>,
    listener: Mutex<Option<Weak<dyn ReconnectListener>>>,
    notify: Mutex<()>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Repaired,
    Aborted,
    Superseded,
    Exhausted,
}

impl AsyncShared {
    fn set_state(&self, status: &mut Status, state: PortState) {
        status.state = state;
        self.state.send_replace(state);
    }

    async fn connect(&self) -> Result<TcpStream> {
        let endpoint = &self.endpoint;
        let attempt = TcpStream::connect((endpoint.host(), endpoint.port()));

        let result = if self.config.connect_timeout.is_zero() {
            attempt.await
        } else {
            match timeout(self.config.connect_timeout, attempt).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
            }
        };

        result.map_err(|e| {
            self.status.lock().stats.record_failure();
            PortError::connect(endpoint, e)
        })
    }

    /// Split `stream` into the read and write slots.
    ///
    /// Halves of the previous connection are dropped, closing it.
    fn install(
        &self,
        stream: TcpStream,
        status: &mut Status,
        reader: &mut Option<Reader>,
        writer: &mut Option<Writer>,
    ) -> Result<()> {
        stream.set_nodelay(self.config.nodelay)?;
        let peer_addr = stream.peer_addr()?;
        let generation = status.generation + 1;
        let (read_half, write_half) = stream.into_split();

        debug!(endpoint = %self.endpoint, peer = %peer_addr, generation, "installing connection");
        *reader = Some(Reader {
            generation,
            half: read_half,
        });
        *writer = Some(Writer {
            generation,
            peer_addr,
            half: write_half,
        });
        status.generation = generation;
        status.stats.record_connect();
        Ok(())
    }

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
            self.set_state(&mut status, PortState::Reconnecting);
            status.stats.record_disconnect();
        }

        if let Some(previous) = slot.take() {
            if !previous.is_finished() {
                debug!(endpoint = %self.endpoint, "previous supervisor still notifying");
            }
        }
        *slot = Some(tokio::spawn(supervise(Arc::clone(self))));
    }

    fn check(&self, attempt: u32) -> Option<Outcome> {
        let mut status = self.status.lock();
        match status.state {
            PortState::Reconnecting => {}
            PortState::Connected => return Some(Outcome::Superseded),
            PortState::Disconnected | PortState::Closed => return Some(Outcome::Aborted),
        }

        if !self.config.should_retry(attempt) {
            self.set_state(&mut status, PortState::Disconnected);
            return Some(Outcome::Exhausted);
        }
        None
    }

    fn notify_reconnected(&self) {
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

    fn mark_closed(&self) {
        {
            let mut status = self.status.lock();
            if !status.state.is_closed() {
                status.stats.record_disconnect();
            }
            self.set_state(&mut status, PortState::Closed);
        }
        if let Some(handle) = self.supervisor.lock().take() {
            handle.abort();
        }
    }
}

async fn supervise(shared: Arc<AsyncShared>) {
    let mut state = shared.state.subscribe();
    let mut attempt: u32 = 0;

    let outcome = loop {
        {
            let mut reader = shared.io.lock().await;

            if let Some(outcome) = shared.check(attempt) {
                break outcome;
            }

            attempt += 1;
            shared.status.lock().stats.record_reconnect_attempt();
            info!(endpoint = %shared.endpoint, attempt, "attempting to reconnect");

            match shared.connect().await {
                Ok(stream) => {
                    let mut writer = shared.tx.lock().await;
                    let mut status = shared.status.lock();
                    match status.state {
                        PortState::Reconnecting => {}
                        PortState::Connected => break Outcome::Superseded,
                        _ => break Outcome::Aborted,
                    }
                    match shared.install(stream, &mut status, &mut reader, &mut writer) {
                        Ok(()) => {
                            shared.set_state(&mut status, PortState::Connected);
                            status.backoff.reset();
                            status.stats.record_reconnect();
                            break Outcome::Repaired;
                        }
                        Err(e) => {
                            status.stats.record_failure();
                            error!(endpoint = %shared.endpoint, attempt, error = %e, "connect failed");
                        }
                    }
                }
                Err(e) => error!(endpoint = %shared.endpoint, attempt, error = %e, "connect failed"),
            }
        }

        let delay = shared.status.lock().backoff.next_delay();
        debug!(
            endpoint = %shared.endpoint,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "waiting before next attempt"
        );
        tokio::select! {
            _ = sleep(delay) => {}
            _ = settled(&mut state) => {}
        }
    };

    match outcome {
        Outcome::Repaired => {
            warn!(endpoint = %shared.endpoint, "reconnect successful");
            shared.notify_reconnected();
        }
        Outcome::Aborted => warn!(endpoint = %shared.endpoint, "port closed, not reconnecting"),
        Outcome::Superseded => debug!(endpoint = %shared.endpoint, "port reopened, supervisor exiting"),
        Outcome::Exhausted => error!(endpoint = %shared.endpoint, "giving up reconnecting"),
    }
}

/// Wait until the port leaves `Reconnecting`.
async fn settled(
    state: &mut watch::Receiver<PortState>,
) -> std::result::Result<(), watch::error::RecvError> {
    state
        .wait_for(|state| !state.is_reconnecting())
        .await
        .map(|_| ())
}

/// Wait until the port is no longer `Connected`.
async fn disconnected(state: &mut watch::Receiver<PortState>) {
    let _ = state.wait_for(|state| !state.is_connected()).await;
}

/// Wait until `deadline`, or forever if there is none.
async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Async counterpart of [`NetworkPort`](super::NetworkPort).
///
/// The reconnect supervisor runs as a tokio task. Closing or dropping the
/// port aborts it, so all operations must be used from within a tokio
/// runtime.
pub struct AsyncNetworkPort {
    shared: Arc<AsyncShared>,
}

impl AsyncNetworkPort {
    /// Create a port for `host:port` with the default configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(Endpoint::new(host, port), PortConfig::default())
    }

    /// Create a port with an explicit configuration.
    pub fn with_config(endpoint: Endpoint, config: PortConfig) -> Self {
        let backoff = config.backoff.start();
        let (state, _) = watch::channel(PortState::Disconnected);
        Self {
            shared: Arc::new(AsyncShared {
                endpoint,
                config,
                io: tokio::sync::Mutex::new(None),
                tx: tokio::sync::Mutex::new(None),
                status: Mutex::new(Status {
                    state: PortState::Disconnected,
                    generation: 0,
                    backoff,
                    stats: PortStats::default(),
                }),
                state,
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
    pub async fn peer_addr(&self) -> Option<SocketAddr> {
        self.shared.tx.lock().await.as_ref().map(|w| w.peer_addr)
    }

    /// Register the listener notified after a background repair.
    pub fn set_reconnect_listener(&self, listener: &Arc<dyn ReconnectListener>) {
        *self.shared.listener.lock() = Some(Arc::downgrade(listener));
    }

    /// Remove the reconnect listener.
    pub fn clear_reconnect_listener(&self) {
        *self.shared.listener.lock() = None;
    }

    /// Connect to the endpoint.
    ///
    /// Waits for any read in flight to finish before installing the new
    /// connection.
    pub async fn try_open(&self) -> Result<()> {
        let stream = self.shared.connect().await?;

        let mut reader = self.shared.io.lock().await;
        let mut writer = self.shared.tx.lock().await;
        let mut status = self.shared.status.lock();
        self.shared
            .install(stream, &mut status, &mut reader, &mut writer)?;
        self.shared.set_state(&mut status, PortState::Connected);
        Ok(())
    }

    /// Connect to the endpoint. Returns `false` on any failure.
    pub async fn open(&self) -> bool {
        match self.try_open().await {
            Ok(()) => true,
            Err(e) => {
                error!(endpoint = %self.shared.endpoint, error = %e, "unable to open port");
                false
            }
        }
    }

    /// Close the port.
    ///
    /// Aborts a running supervisor, wakes pending reads and releases the
    /// connection. Release failures are ignored.
    pub async fn close(&self) {
        info!(endpoint = %self.shared.endpoint, "closing port");
        self.shared.mark_closed();

        if let Some(mut writer) = self.shared.tx.lock().await.take() {
            if let Err(e) = writer.half.flush().await {
                debug!(error = %e, "ignoring output flush failure");
            }
            if let Err(e) = writer.half.shutdown().await {
                debug!(error = %e, "ignoring output release failure");
            }
        }
        self.shared.io.lock().await.take();
    }

    /// Write bytes to the connection.
    pub async fn try_write_all(&self, bytes: &[u8]) -> Result<()> {
        let mut tx = self.shared.tx.lock().await;

        if !self.state().is_connected() {
            return Err(PortError::NotConnected);
        }
        let Some(writer) = tx.as_mut() else {
            return Err(PortError::NotConnected);
        };

        let write = writer.half.write_all(bytes);
        let result = match self.shared.config.write_timeout {
            Some(limit) => match timeout(limit, write).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out")),
            },
            None => write.await,
        };

        match result {
            Ok(()) => {
                self.shared.status.lock().stats.record_send(bytes.len());
                Ok(())
            }
            Err(e) => {
                let err = PortError::Io(e);
                self.shared.report_failure(writer.generation, &err);
                Err(err)
            }
        }
    }

    /// Write a single byte.
    pub async fn try_write(&self, value: u8) -> Result<()> {
        self.try_write_all(&[value]).await
    }

    /// Write a single byte, best effort.
    pub async fn write(&self, value: u8) {
        if let Err(e) = self.try_write(value).await {
            debug!(endpoint = %self.shared.endpoint, error = %e, "dropped byte");
        }
    }

    /// Write a whole buffer, best effort.
    pub async fn write_buf<B: Buf>(&self, mut buf: B) {
        while buf.has_remaining() {
            let len = buf.chunk().len();
            if let Err(e) = self.try_write_all(buf.chunk()).await {
                debug!(endpoint = %self.shared.endpoint, error = %e, "dropped buffer");
                return;
            }
            buf.advance(len);
        }
    }

    /// Read a single byte, waiting up to `timeout`.
    ///
    /// A zero timeout waits indefinitely. A pending reconnect is awaited
    /// within the same timeout.
    pub async fn try_read(&self, timeout: Duration) -> Result<u8> {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        let mut state = self.shared.state.subscribe();

        let waited = match deadline {
            Some(deadline) => timeout_at(deadline, settled(&mut state))
                .await
                .map_err(|_| PortError::Timeout)?,
            None => settled(&mut state).await,
        };
        waited.map_err(|_| PortError::Closed)?;

        let mut io = self.shared.io.lock().await;

        let reader = match io.as_mut() {
            Some(reader) if self.state().is_connected() => reader,
            _ => {
                error!(endpoint = %self.shared.endpoint, "reading on an unconnected port");
                return Err(PortError::NotConnected);
            }
        };

        let result = tokio::select! {
            result = reader.half.read_u8() => result.map_err(PortError::from_read),
            _ = expire(deadline) => Err(PortError::Timeout),
            _ = disconnected(&mut state) => Err(PortError::NotConnected),
        };

        match result {
            Ok(byte) => {
                self.shared.status.lock().stats.record_receive(1);
                Ok(byte)
            }
            Err(e) => {
                if e.triggers_reconnect()
                    || (e.is_timeout() && self.shared.config.reconnect_on_timeout)
                {
                    self.shared.report_failure(reader.generation, &e);
                }
                Err(e)
            }
        }
    }

    /// Read a single byte. Returns the byte value or [`READ_FAILED`].
    pub async fn read_timeout(&self, timeout: Duration) -> i32 {
        match self.try_read(timeout).await {
            Ok(byte) => i32::from(byte),
            Err(e) => {
                debug!(endpoint = %self.shared.endpoint, error = %e, "read failed");
                READ_FAILED
            }
        }
    }

    /// Read a single byte with the default, effectively unbounded, timeout.
    pub async fn read(&self) -> i32 {
        self.read_timeout(crate::port::DEFAULT_READ_TIMEOUT).await
    }

    /// Wait for reads and reconnects in flight, then drop bytes already
    /// received. Returns the number of bytes discarded.
    pub async fn purge_rx_buffer(&self) -> usize {
        let mut io = self.shared.io.lock().await;
        let Some(reader) = io.as_mut() else {
            return 0;
        };

        let mut scratch = [0u8; 256];
        let mut discarded = 0;
        loop {
            match timeout(DRAIN_TIMEOUT, reader.half.read(&mut scratch)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => {
                    debug!(endpoint = %self.shared.endpoint, error = %e, "purge failed");
                    break;
                }
            }
        }
        discarded
    }
}

impl Drop for AsyncNetworkPort {
    fn drop(&mut self) {
        self.shared.mark_closed();
    }
}

impl std::fmt::Debug for AsyncNetworkPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncNetworkPort")
            .field("endpoint", &self.shared.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::config::BackoffPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    fn fast_backoff() -> PortConfig {
        PortConfig::default().with_backoff(BackoffPolicy::linear(
            Duration::from_millis(10),
            Duration::from_millis(10),
            Duration::from_millis(50),
        ))
    }

    #[tokio::test]
    async fn test_async_open_read_write() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let port = AsyncNetworkPort::with_config(addr.into(), PortConfig::default());

        assert!(port.open().await);
        let (mut peer, _) = listener.accept().await.unwrap();
        assert_eq!(port.peer_addr().await, Some(addr));

        port.write(0x10).await;
        port.write_buf(&[0x20, 0x30][..]).await;
        let mut buf = [0u8; 3];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0x10, 0x20, 0x30]);

        peer.write_all(&[0x99]).await.unwrap();
        assert_eq!(port.read_timeout(Duration::from_secs(1)).await, 0x99);
        assert_eq!(port.stats().bytes_sent, 3);
    }

    #[tokio::test]
    async fn test_async_read_unconnected() {
        let port = AsyncNetworkPort::new("127.0.0.1", 1);
        assert_eq!(port.read_timeout(Duration::from_secs(5)).await, READ_FAILED);
        assert_eq!(port.state(), PortState::Disconnected);
        assert_eq!(port.stats().reconnect_attempts, 0);

        port.close().await;
        assert_eq!(port.state(), PortState::Closed);
    }

    #[tokio::test]
    async fn test_async_reconnect_after_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let port = AsyncNetworkPort::with_config(addr.into(), fast_backoff());

        let notified = Arc::new(AtomicUsize::new(0));
        let callback: Arc<dyn ReconnectListener> = Arc::new({
            let notified = notified.clone();
            move || {
                notified.fetch_add(1, Ordering::SeqCst);
            }
        });
        port.set_reconnect_listener(&callback);

        assert!(port.open().await);
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);

        assert_eq!(port.read_timeout(Duration::from_secs(1)).await, READ_FAILED);

        let (mut peer, _) = listener.accept().await.unwrap();
        for _ in 0..100 {
            if port.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(port.is_connected());

        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert_eq!(port.stats().reconnect_count, 1);
        assert_eq!(port.backoff(), Duration::ZERO);

        port.write(0x42).await;
        let mut buf = [0u8; 1];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf[0], 0x42);
    }

    #[tokio::test]
    async fn test_async_write_failure_starts_recovery() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let port = AsyncNetworkPort::with_config(addr.into(), fast_backoff());

        let notified = Arc::new(AtomicUsize::new(0));
        let callback: Arc<dyn ReconnectListener> = Arc::new({
            let notified = notified.clone();
            move || {
                notified.fetch_add(1, Ordering::SeqCst);
            }
        });
        port.set_reconnect_listener(&callback);

        assert!(port.open().await);
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);

        let mut failed = false;
        for _ in 0..100 {
            if port.try_write(0xAA).await.is_err() {
                failed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(failed);

        let (mut peer, _) = listener.accept().await.unwrap();
        for _ in 0..100 {
            if port.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(port.is_connected());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert_eq!(port.stats().reconnect_count, 1);
        assert_eq!(port.stats().bytes_received, 0);

        port.write(0x11).await;
        let mut buf = [0u8; 1];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf[0], 0x11);
    }

    #[tokio::test]
    async fn test_async_reopen_during_recovery_skips_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = PortConfig::default().with_backoff(BackoffPolicy::linear(
            Duration::from_secs(10),
            Duration::from_secs(10),
            Duration::from_secs(10),
        ));
        let port = AsyncNetworkPort::with_config(addr.into(), config);

        let notified = Arc::new(AtomicUsize::new(0));
        let callback: Arc<dyn ReconnectListener> = Arc::new({
            let notified = notified.clone();
            move || {
                notified.fetch_add(1, Ordering::SeqCst);
            }
        });
        port.set_reconnect_listener(&callback);

        assert!(port.open().await);
        let (peer, _) = listener.accept().await.unwrap();
        drop(listener);
        drop(peer);

        // The first attempt is refused; the supervisor then backs off.
        assert_eq!(port.read_timeout(Duration::from_secs(1)).await, READ_FAILED);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(port.state(), PortState::Reconnecting);
        assert_eq!(port.stats().reconnect_attempts, 1);

        let listener = TcpListener::bind(addr).await.unwrap();
        assert!(port.open().await);
        let (mut peer, _) = listener.accept().await.unwrap();
        assert_eq!(port.state(), PortState::Connected);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(notified.load(Ordering::SeqCst), 0);
        let stats = port.stats();
        assert_eq!(stats.reconnect_attempts, 1);
        assert_eq!(stats.reconnect_count, 0);
        assert!(port.is_connected());

        port.write(0x21).await;
        let mut buf = [0u8; 1];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf[0], 0x21);
    }

    #[tokio::test]
    async fn test_async_close_aborts_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = PortConfig::default().with_backoff(BackoffPolicy::linear(
            Duration::from_secs(10),
            Duration::from_secs(10),
            Duration::from_secs(10),
        ));
        let port = AsyncNetworkPort::with_config(addr.into(), config);

        let notified = Arc::new(AtomicUsize::new(0));
        let callback: Arc<dyn ReconnectListener> = Arc::new({
            let notified = notified.clone();
            move || {
                notified.fetch_add(1, Ordering::SeqCst);
            }
        });
        port.set_reconnect_listener(&callback);

        assert!(port.open().await);
        let (peer, _) = listener.accept().await.unwrap();
        drop(listener);
        drop(peer);

        assert_eq!(port.read_timeout(Duration::from_secs(1)).await, READ_FAILED);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(port.state(), PortState::Reconnecting);

        port.close().await;
        assert_eq!(port.state(), PortState::Closed);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notified.load(Ordering::SeqCst), 0);
        assert_eq!(
            port.read_timeout(Duration::from_millis(10)).await,
            READ_FAILED
        );
    }
}
