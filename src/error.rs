//! Startup errors.
//!
//! Everything in here aborts [`HttpServer::start`](crate::server::HttpServer::start).
//! Per-connection and per-request failures never surface as a `ServerError`:
//! the reactor closes the affected connection, and the pipeline turns request
//! failures into HTTP responses.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid server configuration: {reason}")]
    Config { reason: String },

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create readiness multiplexer: {0}")]
    Multiplexer(#[source] io::Error),

    #[error("failed to spawn server thread: {0}")]
    Spawn(#[source] io::Error),
}

impl ServerError {
    pub fn config<S: ToString>(reason: S) -> Self {
        Self::Config { reason: reason.to_string() }
    }

    pub fn bind<A: ToString>(addr: A, source: io::Error) -> Self {
        Self::Bind { addr: addr.to_string(), source }
    }

    pub fn listen<A: ToString>(addr: A, source: io::Error) -> Self {
        Self::Listen { addr: addr.to_string(), source }
    }
}
