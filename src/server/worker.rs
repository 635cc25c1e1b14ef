//! Worker reactors.
//!
//! Each worker owns a private `mio::Poll` and the connections the listener
//! handed to it. A connection is registered for exactly one interest at a
//! time and is re-registered after every event, so the edge-triggered
//! multiplexer reports it again while data (or buffer space) is left.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use mio::event::Event;
use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token, Waker};
use tracing::{debug, trace, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::connection::{CloseReason, Connection, Next};
use crate::http::router::Router;

pub(crate) const WAKER: Token = Token(0);

/// Sending side of a worker: queues accepted streams and wakes its poll.
#[derive(Debug, Clone)]
pub(crate) struct Mailbox {
    sender: Sender<TcpStream>,
    waker: Arc<Waker>,
}

impl Mailbox {
    pub(crate) fn deliver(&self, stream: TcpStream) -> io::Result<()> {
        self.sender
            .send(stream)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "worker has stopped"))?;
        self.waker.wake()
    }

    pub(crate) fn wake(&self) -> io::Result<()> {
        self.waker.wake()
    }
}

struct Slot {
    stream: TcpStream,
    conn: Connection,
}

pub(crate) struct Worker {
    id: usize,
    poll: Poll,
    incoming: Receiver<TcpStream>,
    router: Arc<Router>,
    running: Arc<AtomicBool>,
    connections: HashMap<Token, Slot>,
    next_token: usize,
    max_connections: usize,
    max_events: usize,
    buffer_size: usize,
    poll_timeout: Duration,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        config: &ServerConfig,
        router: Arc<Router>,
        running: Arc<AtomicBool>,
    ) -> Result<(Self, Mailbox), ServerError> {
        let poll = Poll::new().map_err(ServerError::Multiplexer)?;
        let waker = Waker::new(poll.registry(), WAKER).map_err(ServerError::Multiplexer)?;
        let (sender, incoming) = channel::unbounded();

        let worker = Self {
            id,
            poll,
            incoming,
            router,
            running,
            connections: HashMap::new(),
            next_token: WAKER.0 + 1,
            max_connections: config.connections_per_worker(),
            max_events: config.max_events,
            buffer_size: config.buffer_size,
            poll_timeout: config.poll_timeout(),
        };
        let mailbox = Mailbox {
            sender,
            waker: Arc::new(waker),
        };
        Ok((worker, mailbox))
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Runs the event loop until the running flag is cleared.
    ///
    /// Open connections are closed when the worker returns.
    pub(crate) fn run(mut self) {
        let mut events = Events::with_capacity(self.max_events);
        debug!(worker = self.id, "Worker started");

        while self.running.load(Ordering::Acquire) {
            if let Err(e) = self.poll.poll(&mut events, Some(self.poll_timeout)) {
                if e.kind() != io::ErrorKind::Interrupted {
                    warn!(worker = self.id, error = %e, "Poll failed");
                }
                continue;
            }

            for event in events.iter() {
                if event.token() == WAKER {
                    self.adopt_incoming();
                } else {
                    self.handle_event(event);
                }
            }
        }

        debug!(
            worker = self.id,
            open = self.connections.len(),
            "Worker stopped"
        );
    }

    fn adopt_incoming(&mut self) {
        while let Ok(stream) = self.incoming.try_recv() {
            self.adopt(stream);
        }
    }

    fn adopt(&mut self, mut stream: TcpStream) {
        if self.connections.len() >= self.max_connections {
            warn!(
                worker = self.id,
                limit = self.max_connections,
                "Connection limit reached, refusing connection"
            );
            return;
        }

        let token = self.allocate_token();
        if let Err(e) = self
            .poll
            .registry()
            .register(&mut stream, token, Interest::READABLE)
        {
            warn!(worker = self.id, error = %e, "Failed to register connection");
            return;
        }

        self.connections.insert(
            token,
            Slot {
                stream,
                conn: Connection::new(self.buffer_size),
            },
        );
        trace!(worker = self.id, token = ?token, "Connection registered");
    }

    fn allocate_token(&mut self) -> Token {
        loop {
            let token = Token(self.next_token);
            self.next_token = self.next_token.wrapping_add(1);
            if token != WAKER && !self.connections.contains_key(&token) {
                return token;
            }
        }
    }

    fn handle_event(&mut self, event: &Event) {
        let token = event.token();
        let Some(slot) = self.connections.get_mut(&token) else {
            return;
        };

        let reading = slot.conn.is_reading();
        let next = if event.is_error() || (event.is_read_closed() && event.is_write_closed()) {
            Next::Close(CloseReason::Hangup)
        } else if reading && event.is_readable() && !event.is_writable() {
            slot.conn.on_readable(&mut slot.stream, &self.router)
        } else if !reading && event.is_writable() && !event.is_readable() {
            slot.conn.on_writable(&mut slot.stream)
        } else {
            Next::Close(CloseReason::UnexpectedReadiness)
        };

        self.apply(token, next);
    }

    fn apply(&mut self, token: Token, next: Next) {
        let interest = match next {
            Next::Read => Interest::READABLE,
            Next::Write => Interest::WRITABLE,
            Next::Close(reason) => {
                self.close(token, reason);
                return;
            }
        };

        let Some(slot) = self.connections.get_mut(&token) else {
            return;
        };
        let rearmed = self
            .poll
            .registry()
            .reregister(&mut slot.stream, token, interest);
        if let Err(e) = rearmed {
            self.close(token, CloseReason::Io(e.kind()));
        }
    }

    fn close(&mut self, token: Token, reason: CloseReason) {
        let Some(mut slot) = self.connections.remove(&token) else {
            return;
        };
        if let Err(e) = self.poll.registry().deregister(&mut slot.stream) {
            trace!(worker = self.id, token = ?token, error = %e, "Deregister failed");
        }

        match reason {
            CloseReason::Io(kind) => {
                warn!(worker = self.id, token = ?token, error = ?kind, "Connection failed, closing")
            }
            _ => debug!(worker = self.id, token = ?token, reason = ?reason, "Connection closed"),
        }
    }
}
