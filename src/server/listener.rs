use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use crate::error::ServerError;
use crate::server::worker::Mailbox;

const LISTENER: Token = Token(0);

/// Creates a non-blocking listening socket.
///
/// Address failures map to [`ServerError::Bind`], backlog failures to
/// [`ServerError::Listen`].
pub(crate) fn bind(addr: SocketAddr, backlog: i32) -> Result<std::net::TcpListener, ServerError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| ServerError::bind(addr, e))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| ServerError::bind(addr, e))?;
    socket
        .set_nonblocking(true)
        .map_err(|e| ServerError::bind(addr, e))?;
    socket
        .bind(&addr.into())
        .map_err(|e| ServerError::bind(addr, e))?;
    socket
        .listen(backlog)
        .map_err(|e| ServerError::listen(addr, e))?;

    Ok(socket.into())
}

/// Cycles through worker indices in order.
#[derive(Debug)]
pub(crate) struct RoundRobin {
    next: usize,
    len: usize,
}

impl RoundRobin {
    pub(crate) fn new(len: usize) -> Self {
        Self { next: 0, len }
    }

    pub(crate) fn next(&mut self) -> usize {
        let current = self.next;
        self.next = (self.next + 1) % self.len;
        current
    }
}

/// Accepts connections and deals them out to the workers.
///
/// Only the listener thread touches the round-robin counter.
pub(crate) struct Listener {
    listener: TcpListener,
    poll: Poll,
    mailboxes: Vec<Mailbox>,
    round_robin: RoundRobin,
    running: Arc<AtomicBool>,
    poll_timeout: Duration,
}

impl Listener {
    pub(crate) fn new(
        listener: std::net::TcpListener,
        mailboxes: Vec<Mailbox>,
        running: Arc<AtomicBool>,
        poll_timeout: Duration,
    ) -> Result<Self, ServerError> {
        let mut listener = TcpListener::from_std(listener);
        let poll = Poll::new().map_err(ServerError::Multiplexer)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .map_err(ServerError::Multiplexer)?;

        Ok(Self {
            listener,
            poll,
            round_robin: RoundRobin::new(mailboxes.len()),
            mailboxes,
            running,
            poll_timeout,
        })
    }

    pub(crate) fn run(mut self) {
        let mut events = Events::with_capacity(16);

        while self.running.load(Ordering::Acquire) {
            if let Err(e) = self.poll.poll(&mut events, Some(self.poll_timeout)) {
                if e.kind() != io::ErrorKind::Interrupted {
                    warn!(error = %e, "Listener poll failed");
                }
                continue;
            }

            if !events.is_empty() {
                self.accept_pending();
            }
        }

        debug!("Listener stopped");
    }

    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => self.assign(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "Accept failed");
                    break;
                }
            }
        }

        // Re-arm so connections still queued after a failed accept are reported again.
        if let Err(e) = self
            .poll
            .registry()
            .reregister(&mut self.listener, LISTENER, Interest::READABLE)
        {
            warn!(error = %e, "Failed to re-arm listener");
        }
    }

    fn assign(&mut self, stream: TcpStream, peer: SocketAddr) {
        let worker = self.round_robin.next();
        debug!(peer = %peer, worker, "Accepted connection");

        if let Err(e) = self.mailboxes[worker].deliver(stream) {
            warn!(peer = %peer, worker, error = %e, "Failed to hand off connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_spreads_evenly() {
        let mut rr = RoundRobin::new(3);
        let picks: Vec<usize> = (0..7).map(|_| rr.next()).collect();

        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn bind_conflict_is_a_bind_error() {
        let first = bind("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = first.local_addr().unwrap();

        assert!(matches!(bind(addr, 16), Err(ServerError::Bind { .. })));
    }
}
