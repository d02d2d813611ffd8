//! Server lifecycle: one running instance per [`ServerSlot`].

use super::response::{ServeState, handle};
use crate::config::ServeConfig;
use crate::reload::{ReloadServer, reload_script};
use crate::{debug, log};
use anyhow::{Context, Result, anyhow};
use parking_lot::Mutex;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tiny_http::{Server, SslConfig};

const REQUEST_THREADS: usize = 4;

/// A running server. Dropping it stops the server.
pub struct ServerHandle {
    addr: SocketAddr,
    tls: bool,
    server: Arc<Server>,
    thread: Option<JoinHandle<()>>,
    reload: Option<ReloadServer>,
}

impl ServerHandle {
    /// Bind and start serving `root`.
    ///
    /// The not-found page is read once here; a missing page or certificate
    /// is an error and nothing is bound.
    pub fn start(config: &ServeConfig, root: &Path) -> Result<Self> {
        let not_found_path = root.join(&config.not_found);
        let not_found = fs::read(&not_found_path).with_context(|| {
            format!("Not-found page missing: {}", not_found_path.display())
        })?;

        let addr = SocketAddr::new(config.interface, config.port);
        let server = if config.tls {
            let ssl = SslConfig {
                certificate: fs::read(&config.cert)
                    .with_context(|| format!("Failed to read {}", config.cert.display()))?,
                private_key: fs::read(&config.key)
                    .with_context(|| format!("Failed to read {}", config.key.display()))?,
            };
            Server::https(addr, ssl)
        } else {
            Server::http(addr)
        }
        .map_err(|e| anyhow!("Failed to bind {addr}: {e}"))?;

        let addr = server
            .server_addr()
            .to_ip()
            .context("server is not bound to an IP address")?;

        let reload = if config.livereload {
            Some(ReloadServer::bind(config.interface, config.reload_port)?)
        } else {
            None
        };

        let state = Arc::new(ServeState {
            root: root.to_path_buf(),
            not_found,
            reload_script: reload.as_ref().map(|r| reload_script(r.port())),
        });
        let server = Arc::new(server);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .thread_name(|i| format!("serve-{i}"))
            .build()?;

        let thread = {
            let server = Arc::clone(&server);
            thread::Builder::new()
                .name("serve".into())
                .spawn(move || request_loop(&server, &pool, &state))?
        };

        Ok(Self {
            addr,
            tls: config.tls,
            server,
            thread: Some(thread),
            reload,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}", self.addr)
    }

    /// Tell connected browsers to reload. Returns the number reached.
    pub fn reload(&self) -> usize {
        self.reload.as_ref().map_or(0, ReloadServer::broadcast)
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Unblock the listener and wait for the request loop to exit.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.server.unblock();
        if thread.join().is_err() {
            log!("serve"; "request loop panicked");
        }
        if let Some(reload) = &mut self.reload {
            reload.shutdown();
        }
        debug!("serve"; "stopped {}", self.addr);
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn request_loop(server: &Server, pool: &rayon::ThreadPool, state: &Arc<ServeState>) {
    for request in server.incoming_requests() {
        let state = Arc::clone(state);
        pool.spawn(move || {
            let url = request.url().to_string();
            if let Err(e) = handle(request, &state) {
                debug!("serve"; "{url}: {e:#}");
            }
        });
    }
}

/// Holder of the process's single server.
#[derive(Default)]
pub struct ServerSlot(Mutex<Option<ServerHandle>>);

impl ServerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the running server, if any, then start a new one.
    pub fn start(&self, config: &ServeConfig, root: &Path) -> Result<String> {
        let mut slot = self.0.lock();
        if let Some(mut previous) = slot.take() {
            previous.stop();
        }
        let handle = ServerHandle::start(config, root)?;
        let url = handle.url();
        *slot = Some(handle);
        Ok(url)
    }

    pub fn reload(&self) -> usize {
        self.0.lock().as_ref().map_or(0, ServerHandle::reload)
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.0.lock().as_ref().is_some_and(ServerHandle::is_running)
    }

    pub fn stop(&self) {
        if let Some(mut handle) = self.0.lock().take() {
            handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{IpAddr, Ipv4Addr, TcpStream};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("index.html"), "<html><body>home</body></html>").unwrap();
        fs::write(dir.path().join("404.html"), "<html><body>custom missing</body></html>").unwrap();
        fs::write(dir.path().join("docs/index.html"), "docs").unwrap();
        fs::write(dir.path().join("feed.xml"), "<rss/>").unwrap();
        dir
    }

    fn plain(livereload: bool) -> ServeConfig {
        ServeConfig {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            tls: false,
            livereload,
            reload_port: 0,
            ..ServeConfig::default()
        }
    }

    fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_routes_over_http() {
        let dir = site();
        let mut server = ServerHandle::start(&plain(false), dir.path()).unwrap();
        let addr = server.addr();

        let home = get(addr, "/");
        assert!(home.starts_with("HTTP/1.1 200"), "{home}");
        assert!(home.contains("text/html"));
        assert!(home.ends_with("<html><body>home</body></html>"));

        let redirect = get(addr, "/index.html");
        assert!(redirect.starts_with("HTTP/1.1 302"), "{redirect}");
        assert!(redirect.contains("Location: /\r\n"));

        let feed = get(addr, "/feed");
        assert!(feed.contains("application/xml"));

        let missing = get(addr, "/nope");
        assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");
        assert!(missing.contains("custom missing"));

        server.stop();
        assert!(!server.is_running());
    }

    /// `localhost` certificate signed by `ca.pem`, valid 2020-2100.
    const TEST_CA: &str = include_str!("testdata/ca.pem");
    const TEST_CERT: &str = include_str!("testdata/cert.pem");
    const TEST_KEY: &str = include_str!("testdata/key.pem");

    fn get_tls(addr: SocketAddr, path: &str) -> String {
        let mut roots = rustls::RootCertStore::empty();
        for der in rustls_pemfile::certs(&mut TEST_CA.as_bytes()).unwrap() {
            roots.add(&rustls::Certificate(der)).unwrap();
        }
        let config = rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let name = rustls::ServerName::try_from("localhost").unwrap();
        let conn = rustls::ClientConnection::new(Arc::new(config), name).unwrap();
        let mut stream = rustls::StreamOwned::new(conn, TcpStream::connect(addr).unwrap());

        write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        stream.flush().unwrap();
        // the server may close without close_notify; keep what arrived
        let mut response = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => response.extend_from_slice(&buf[..n]),
            }
        }
        String::from_utf8(response).unwrap()
    }

    #[test]
    fn test_routes_over_https() {
        let dir = site();
        let certs = TempDir::new().unwrap();
        let cert = certs.path().join("localhost.pem");
        let key = certs.path().join("localhost-key.pem");
        fs::write(&cert, TEST_CERT).unwrap();
        fs::write(&key, TEST_KEY).unwrap();
        let config = ServeConfig {
            tls: true,
            cert,
            key,
            ..plain(false)
        };

        let server = ServerHandle::start(&config, dir.path()).unwrap();
        assert!(server.url().starts_with("https://"));

        let home = get_tls(server.addr(), "/");
        assert!(home.starts_with("HTTP/1.1 200"), "{home}");
        assert!(home.contains("home"));

        let redirect = get_tls(server.addr(), "/docs/index.html");
        assert!(redirect.starts_with("HTTP/1.1 302"), "{redirect}");
        assert!(redirect.contains("Location: /docs/\r\n"));

        let missing = get_tls(server.addr(), "/nope");
        assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");
        assert!(missing.contains("custom missing"));
    }

    #[test]
    fn test_missing_certificate_is_fatal() {
        let dir = site();
        let config = ServeConfig {
            tls: true,
            cert: dir.path().join("none.pem"),
            ..plain(false)
        };
        let err = ServerHandle::start(&config, dir.path()).err().unwrap();
        assert!(err.to_string().contains("none.pem"));
    }

    #[test]
    fn test_reload_script_injected_into_html() {
        let dir = site();
        let server = ServerHandle::start(&plain(true), dir.path()).unwrap();
        let home = get(server.addr(), "/");
        assert!(home.contains("<script>"));
        assert!(home.contains("</script></body>"));

        let feed = get(server.addr(), "/feed.xml");
        assert!(!feed.contains("<script>"));
    }

    #[test]
    fn test_missing_not_found_page_is_fatal() {
        let dir = site();
        let config = ServeConfig {
            not_found: PathBuf::from("missing.html"),
            ..plain(false)
        };
        let err = ServerHandle::start(&config, dir.path()).err().unwrap();
        assert!(err.to_string().contains("missing.html"));
    }

    #[test]
    fn test_slot_replaces_running_server() {
        let dir = site();
        let slot = ServerSlot::new();
        slot.start(&plain(false), dir.path()).unwrap();
        slot.start(&plain(false), dir.path()).unwrap();
        assert!(slot.is_running());
        slot.stop();
        assert!(!slot.is_running());
        assert_eq!(slot.reload(), 0);
    }
}
