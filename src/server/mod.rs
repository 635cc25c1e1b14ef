//! Sockets, threads and readiness.
//!
//! One listener thread accepts connections and hands them round-robin to a
//! fixed pool of worker threads. Every worker runs its own event loop over a
//! private multiplexer and never shares a connection with another worker.
//!
//! ```text
//!   listener ──accept──► worker[i % N] ──read──► pipeline ──► write ──┐
//!                             ▲                                       │
//!                             └──────────── keep-alive ───────────────┘
//! ```

mod http_server;
pub(crate) mod listener;
pub(crate) mod worker;

pub use http_server::{HttpServer, ServerHandle};
