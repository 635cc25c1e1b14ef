use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::router::RouterBuilder;
use crate::http::uri::Uri;
use crate::server::listener::{self, Listener};
use crate::server::worker::{Mailbox, Worker};

/// A server that has not started yet.
///
/// Routes can only be registered here. [`HttpServer::start`] consumes the
/// server and freezes the route table, so it cannot change while workers
/// read it.
#[derive(Debug, Default)]
pub struct HttpServer {
    config: ServerConfig,
    routes: RouterBuilder,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            routes: RouterBuilder::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Registers a handler for `method` on `path`. Paths are matched
    /// case-insensitively; registering a pair again replaces its handler.
    pub fn register_handler<F>(&mut self, path: impl Into<Uri>, method: Method, handler: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.routes.register(path, method, handler);
        self
    }

    /// Binds to `host:port` and starts the listener and worker threads.
    pub fn start(self, host: &str, port: u16) -> Result<ServerHandle, ServerError> {
        self.config.validate()?;

        let addr = resolve(host, port)?;
        let socket = listener::bind(addr, self.config.backlog)?;
        let local_addr = socket.local_addr().map_err(|e| ServerError::bind(addr, e))?;

        let router = Arc::new(self.routes.freeze());
        let running = Arc::new(AtomicBool::new(true));

        let mut workers = Vec::with_capacity(self.config.workers);
        let mut mailboxes = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let (worker, mailbox) =
                Worker::new(id, &self.config, Arc::clone(&router), Arc::clone(&running))?;
            workers.push(worker);
            mailboxes.push(mailbox);
        }
        let listener = Listener::new(
            socket,
            mailboxes.clone(),
            Arc::clone(&running),
            self.config.poll_timeout(),
        )?;

        // From here on, dropping the handle on error stops whatever was spawned.
        let mut handle = ServerHandle {
            local_addr,
            running,
            mailboxes,
            listener: None,
            workers: Vec::with_capacity(self.config.workers),
        };

        for worker in workers {
            let thread = thread::Builder::new()
                .name(format!("shardline-worker-{}", worker.id()))
                .spawn(move || worker.run())
                .map_err(ServerError::Spawn)?;
            handle.workers.push(thread);
        }

        let thread = thread::Builder::new()
            .name("shardline-listener".to_string())
            .spawn(move || listener.run())
            .map_err(ServerError::Spawn)?;
        handle.listener = Some(thread);

        info!(
            addr = %local_addr,
            workers = self.config.workers,
            routes = router.len(),
            "Server started"
        );
        Ok(handle)
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let target = format!("{host}:{port}");
    (host, port)
        .to_socket_addrs()
        .map_err(|e| ServerError::bind(&target, e))?
        .next()
        .ok_or_else(|| {
            ServerError::bind(
                &target,
                io::Error::new(io::ErrorKind::AddrNotAvailable, "address resolved to nothing"),
            )
        })
}

/// A running server.
///
/// [`stop`](ServerHandle::stop) takes the handle by value, so a server is
/// stopped at most once. Dropping the handle stops the server as well.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    mailboxes: Vec<Mailbox>,
    listener: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// The address actually bound, including the port picked for port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signals shutdown and joins the listener and every worker.
    ///
    /// When this returns, every connection, multiplexer and the listening
    /// socket have been closed.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }

        for (id, mailbox) in self.mailboxes.iter().enumerate() {
            if let Err(e) = mailbox.wake() {
                debug!(worker = id, error = %e, "Failed to wake worker");
            }
        }

        if let Some(listener) = self.listener.take() {
            if listener.join().is_err() {
                error!("Listener thread panicked");
            }
        }
        for (id, worker) in self.workers.drain(..).enumerate() {
            if worker.join().is_err() {
                error!(worker = id, "Worker thread panicked");
            }
        }

        info!(addr = %self.local_addr, "Server stopped");
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
