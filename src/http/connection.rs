use std::io::{self, Read, Write};

use bytes::Bytes;

use crate::http::pipeline;
use crate::http::router::Router;

/// Where a connection is in its request/response cycle.
///
/// The response bytes travel inside the `Writing` variant, so a connection
/// can never be read from while a response is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the next request.
    Reading,
    /// Draining a serialized response; `cursor` bytes are already sent.
    Writing { payload: Bytes, cursor: usize },
}

/// What the reactor should do with the socket after an I/O attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Re-arm for read readiness.
    Read,
    /// Re-arm for write readiness.
    Write,
    /// Deregister and close.
    Close(CloseReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    Hangup,
    Io(io::ErrorKind),
    UnexpectedReadiness,
}

/// Per-connection state owned by exactly one worker.
///
/// The read buffer has a fixed capacity and one read is taken to be one
/// complete request. Each `on_*` call makes a single non-blocking I/O attempt
/// and reports how to re-arm the socket. Would-block leaves the state
/// untouched.
#[derive(Debug)]
pub struct Connection {
    buffer: Box<[u8]>,
    state: ConnectionState,
}

impl Connection {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer: vec![0; buffer_size].into_boxed_slice(),
            state: ConnectionState::Reading,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_reading(&self) -> bool {
        matches!(self.state, ConnectionState::Reading)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes of the pending response already written.
    pub fn cursor(&self) -> usize {
        match &self.state {
            ConnectionState::Reading => 0,
            ConnectionState::Writing { cursor, .. } => *cursor,
        }
    }

    /// Bytes of the pending response still to write.
    pub fn remaining(&self) -> usize {
        match &self.state {
            ConnectionState::Reading => 0,
            ConnectionState::Writing { payload, cursor } => payload.len() - cursor,
        }
    }

    /// Reads one request and, if one arrived, prepares its response.
    pub fn on_readable<R: Read>(&mut self, io: &mut R, router: &Router) -> Next {
        if !self.is_reading() {
            return Next::Close(CloseReason::UnexpectedReadiness);
        }

        match io.read(&mut self.buffer) {
            Ok(0) => Next::Close(CloseReason::PeerClosed),
            Ok(n) => {
                let payload = pipeline::respond(&self.buffer[..n], router);
                self.state = ConnectionState::Writing { payload, cursor: 0 };
                Next::Write
            }
            Err(e) if is_retryable(&e) => Next::Read,
            Err(e) => Next::Close(CloseReason::Io(e.kind())),
        }
    }

    /// Writes as much of the pending response as the socket accepts.
    ///
    /// Once the whole response is out the connection goes back to reading.
    pub fn on_writable<W: Write>(&mut self, io: &mut W) -> Next {
        let ConnectionState::Writing { payload, cursor } = &mut self.state else {
            return Next::Close(CloseReason::UnexpectedReadiness);
        };

        match io.write(&payload[*cursor..]) {
            Ok(n) if n < payload.len() - *cursor => {
                *cursor += n;
                Next::Write
            }
            Ok(_) => {
                self.state = ConnectionState::Reading;
                Next::Read
            }
            Err(e) if is_retryable(&e) => Next::Write,
            Err(e) => Next::Close(CloseReason::Io(e.kind())),
        }
    }
}

fn is_retryable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
