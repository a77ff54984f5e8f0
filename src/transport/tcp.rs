//! TCP transport: endpoints, connectors and connection handles.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{PortError, Result};

/// Read timeout used while draining already-queued bytes.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Remote host and port a network port connects to.
///
/// The host is resolved on every connection attempt, so a device that
/// changes address behind a stable name is picked up on reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint from a host name or address and a port number.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host identifier.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve the endpoint to socket addresses.
    pub fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| {
                debug!(endpoint = %self, error = %e, "name lookup failed");
                PortError::Resolve {
                    endpoint: self.clone(),
                }
            })?
            .collect();

        if addrs.is_empty() {
            return Err(PortError::Resolve {
                endpoint: self.clone(),
            });
        }
        Ok(addrs)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

/// Establishes raw TCP streams to an endpoint.
///
/// [`TcpConnector`] is the production implementation. Any
/// `Fn(&Endpoint, Duration) -> Result<TcpStream>` closure is also a connector.
pub trait Connector: Send + Sync {
    /// Open a stream to `endpoint`, giving up after `timeout`.
    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream>;
}

impl<F> Connector for F
where
    F: Fn(&Endpoint, Duration) -> Result<TcpStream> + Send + Sync,
{
    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream> {
        self(endpoint, timeout)
    }
}

/// Connector that resolves the endpoint and tries each address in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream> {
        let mut last_err = None;

        for addr in endpoint.resolve()? {
            let attempt = if timeout.is_zero() {
                TcpStream::connect(addr)
            } else {
                TcpStream::connect_timeout(&addr, timeout)
            };
            match attempt {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(%endpoint, %addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) => PortError::connect(endpoint, e),
            None => PortError::Resolve {
                endpoint: endpoint.clone(),
            },
        })
    }
}

/// One established connection: the socket and its byte-stream endpoints.
///
/// Reads and writes go through `&TcpStream`, so a handle can be shared
/// between the read path and the write path without extra locking. Each
/// handle carries the generation number it was installed under.
#[derive(Debug)]
pub struct ConnectionHandle {
    stream: TcpStream,
    peer_addr: SocketAddr,
    generation: u64,
}

impl ConnectionHandle {
    /// Wrap a freshly connected stream.
    ///
    /// Fails if the socket is not usable (e.g. the peer address cannot be
    /// queried), so a half-constructed handle is never produced.
    pub fn new(stream: TcpStream, generation: u64) -> io::Result<Self> {
        let peer_addr = stream.peer_addr()?;
        Ok(Self {
            stream,
            peer_addr,
            generation,
        })
    }

    /// Get the peer address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Generation this handle was installed under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply socket options from the port configuration.
    pub fn configure(&self, nodelay: bool, write_timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_nodelay(nodelay)?;
        self.stream.set_write_timeout(write_timeout)
    }

    /// Block for a single byte. `None` waits indefinitely.
    pub fn read_byte(&self, timeout: Option<Duration>) -> Result<u8> {
        self.stream.set_read_timeout(timeout)?;

        let mut buf = [0u8; 1];
        loop {
            match (&self.stream).read(&mut buf) {
                Ok(0) => return Err(PortError::ConnectionClosed),
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(PortError::from_read(e)),
            }
        }
    }

    /// Write all bytes to the output stream.
    pub fn write_all(&self, bytes: &[u8]) -> Result<()> {
        (&self.stream).write_all(bytes)?;
        Ok(())
    }

    /// Drop bytes that are already queued on the input side.
    ///
    /// Returns the number of bytes discarded. Stops at the first read that
    /// would block, or at end of stream (left for the next read to report).
    pub fn discard_pending(&self) -> io::Result<usize> {
        self.stream.set_read_timeout(Some(DRAIN_TIMEOUT))?;

        let mut scratch = [0u8; 256];
        let mut discarded = 0;
        loop {
            match (&self.stream).read(&mut scratch) {
                Ok(0) => break,
                Ok(n) => discarded += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(discarded)
    }

    /// Release the input stream, flush and release the output stream.
    ///
    /// Each step runs independently and failures are ignored. The socket
    /// itself is closed when the last reference to the handle is dropped;
    /// shutting down both directions here already wakes any blocked reader.
    pub fn release(&self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Read) {
            debug!(peer = %self.peer_addr, error = %e, "ignoring input release failure");
        }
        if let Err(e) = (&self.stream).flush() {
            debug!(peer = %self.peer_addr, error = %e, "ignoring output flush failure");
        }
        if let Err(e) = self.stream.shutdown(Shutdown::Write) {
            debug!(peer = %self.peer_addr, error = %e, "ignoring output release failure");
        }
    }
}
