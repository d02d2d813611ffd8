//! WebSocket listener for live reload clients.

use super::RELOAD_MESSAGE;
use crate::{debug, log};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

const ACCEPT_POLL: Duration = Duration::from_millis(100);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Accepts reload clients on a background thread and broadcasts to them.
pub struct ReloadServer {
    addr: SocketAddr,
    clients: Clients,
    stop: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
}

impl ReloadServer {
    /// Bind the listener and start accepting. Port 0 picks a free port.
    pub fn bind(interface: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(interface, port))
            .with_context(|| format!("Failed to bind reload listener on port {port}"))?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let clients = Clients::default();
        let stop = Arc::new(AtomicBool::new(false));
        let acceptor = {
            let clients = Arc::clone(&clients);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("reload-accept".into())
                .spawn(move || accept_loop(&listener, &clients, &stop))?
        };

        debug!("reload"; "ws://{addr}");
        Ok(Self {
            addr,
            clients,
            stop,
            acceptor: Some(acceptor),
        })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    #[cfg(test)]
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Send `reload` to every client, dropping the ones that went away.
    ///
    /// Returns the number of clients reached.
    pub fn broadcast(&self) -> usize {
        let mut clients = self.clients.lock();
        clients.retain_mut(|ws| match ws.send(Message::Text(RELOAD_MESSAGE.into())) {
            Ok(()) => true,
            Err(e) => {
                debug!("reload"; "client disconnected: {e}");
                false
            }
        });
        debug!("reload"; "reload sent to {} client(s)", clients.len());
        clients.len()
    }

    /// Stop accepting and close every client.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.acceptor.take() {
            let _ = handle.join();
        }
        for mut ws in self.clients.lock().drain(..) {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
    }
}

impl Drop for ReloadServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept_loop(listener: &TcpListener, clients: &Clients, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                // Handshake and writes are blocking
                let _ = stream.set_nonblocking(false);
                match tungstenite::accept(stream) {
                    Ok(ws) => {
                        debug!("reload"; "client connected: {peer}");
                        clients.lock().push(ws);
                    }
                    Err(e) => log!("reload"; "handshake failed: {e}"),
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                log!("reload"; "accept error: {e}");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}
