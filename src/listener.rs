//! UDP command listener
//!
//! Binds the control port once at startup (fatal on failure) and dispatches
//! one decoded command per datagram, strictly sequentially, on a dedicated
//! thread. The protocol is fire-and-forget; no response is ever sent.
//!
//! The socket uses a short read timeout so the loop can observe the shutdown
//! flag between receives; timeouts and interrupts are retried, any other
//! receive error terminates the listener thread (the daemon keeps playing).

use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::protocol::{Command, MAX_DATAGRAM};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Interval at which the receive loop rechecks the shutdown flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

/// Handle to the running listener thread.
pub struct CommandListener {
    handle: Option<JoinHandle<()>>,
}

impl CommandListener {
    /// Bind the control port and spawn the receive loop.
    pub fn spawn(
        port: u16,
        controller: Arc<Controller>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
            .map_err(|e| Error::Listener(format!("Failed to bind UDP port {}: {}", port, e)))?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(|e| Error::Listener(format!("Failed to configure socket: {}", e)))?;

        let handle = std::thread::Builder::new()
            .name("loudd-listener".to_string())
            .spawn(move || Self::receive_loop(socket, controller, shutdown))
            .map_err(|e| Error::Listener(format!("Failed to spawn listener thread: {}", e)))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    fn receive_loop(socket: UdpSocket, controller: Arc<Controller>, shutdown: Arc<AtomicBool>) {
        let mut buf = [0u8; MAX_DATAGRAM];

        while !shutdown.load(Ordering::SeqCst) {
            match socket.recv_from(&mut buf) {
                Ok((len, peer)) => {
                    let payload = String::from_utf8_lossy(&buf[..len]);
                    let command = Command::parse(&payload);
                    debug!("command from {}: {:?}", peer, command);
                    controller.dispatch(command);
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    // Interrupted wait, retry
                    continue;
                }
                Err(e) => {
                    error!("listener receive failed: {}", e);
                    break;
                }
            }
        }

        debug!("command listener exiting");
    }

    /// Join the listener thread; called during shutdown after the flag is set.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("listener thread panicked");
            }
        }
    }
}
