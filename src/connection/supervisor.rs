//! Background reconnection loop.
//!
//! One supervisor runs per repair episode. Each attempt is made while
//! holding the port's I/O guard; between attempts the supervisor waits out
//! the current backoff on the port's condition variable, so `close()`
//! wakes it immediately.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use super::network_port::Shared;
use super::state::PortState;

/// How a repair episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// A new connection was installed.
    Repaired,
    /// The port was closed while reconnecting.
    Aborted,
    /// The owner reopened the port directly.
    Superseded,
    /// Ran out of attempts.
    Exhausted,
}

/// Start a supervisor thread for `shared`.
pub(super) fn spawn(shared: &Arc<Shared>) -> io::Result<JoinHandle<()>> {
    let shared = Arc::clone(shared);
    thread::Builder::new()
        .name(format!("netport-reconnect-{}", shared.endpoint))
        .spawn(move || run(&shared))
}

fn run(shared: &Shared) {
    let outcome = supervise(shared);

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

fn supervise(shared: &Shared) -> Outcome {
    let mut attempt: u32 = 0;

    loop {
        {
            let _io = shared.io.lock();

            if let Some(outcome) = check(shared, attempt) {
                return outcome;
            }

            attempt += 1;
            shared.status.lock().stats.record_reconnect_attempt();
            info!(endpoint = %shared.endpoint, attempt, "attempting to reconnect");

            match shared.connect() {
                Ok(stream) => {
                    let mut status = shared.status.lock();
                    match status.state {
                        PortState::Reconnecting => {}
                        PortState::Connected => return Outcome::Superseded,
                        _ => return Outcome::Aborted,
                    }
                    match shared.install(stream, &mut status) {
                        Ok(()) => {
                            status.state = PortState::Connected;
                            status.backoff.reset();
                            status.stats.record_reconnect();
                            shared.wake.notify_all();
                            return Outcome::Repaired;
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

        let mut status = shared.status.lock();
        let delay = status.backoff.next_delay();
        debug!(
            endpoint = %shared.endpoint,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "waiting before next attempt"
        );
        shared
            .wake
            .wait_while_for(&mut status, |status| status.state.is_reconnecting(), delay);
    }
}

/// Decide whether the episode is over before the next attempt.
fn check(shared: &Shared, attempt: u32) -> Option<Outcome> {
    let mut status = shared.status.lock();
    match status.state {
        PortState::Reconnecting => {}
        PortState::Connected => return Some(Outcome::Superseded),
        PortState::Disconnected | PortState::Closed => return Some(Outcome::Aborted),
    }

    if !shared.config.should_retry(attempt) {
        status.state = PortState::Disconnected;
        shared.wake.notify_all();
        return Some(Outcome::Exhausted);
    }
    None
}
