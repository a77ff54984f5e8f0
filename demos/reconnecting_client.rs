//! Reconnecting client example.
//!
//! Connects to a device, prints every received byte and sends a probe
//! byte whenever the line stays quiet. Stop and restart the server to
//! watch the port repair itself.
//!
//! Run with: cargo run --example reconnecting_client -- 127.0.0.1 8888
//!
//! Set `RUST_LOG=netport=debug` for the reconnect supervisor's log.

use std::sync::Arc;
use std::time::Duration;

use netport::{Endpoint, NetworkPort, PortConfig, ReconnectListener, READ_FAILED};
use tracing_subscriber::EnvFilter;

const PROBE: u8 = 0x7E;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("netport=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port_number: u16 = args
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8888);

    let config = PortConfig::default().with_reconnect_on_timeout(false);
    let port = NetworkPort::with_config(Endpoint::new(host, port_number), config);

    let listener: Arc<dyn ReconnectListener> = Arc::new(|| println!("*** link repaired ***"));
    port.set_reconnect_listener(&listener);

    if !port.open() {
        eprintln!("Unable to connect to {}", port.endpoint());
        return;
    }
    println!("Connected to {}", port.endpoint());

    loop {
        match port.read_timeout(Duration::from_secs(2)) {
            READ_FAILED => {
                if port.is_connected() {
                    port.write(PROBE);
                } else {
                    println!("Waiting for link ({:?})", port.state());
                }
            }
            byte => println!("Received 0x{byte:02X}"),
        }
    }
}
