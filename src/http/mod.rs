//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.x side of the server: the message
//! model, the codec, the route table and the per-connection state machine.
//! Sockets and readiness are handled in [`crate::server`].
//!
//! # Architecture
//!
//! - **`uri`**: Normalized request paths used as routing keys
//! - **`message`**: Versions and the header/body container shared by requests and responses
//! - **`request`** / **`response`**: Methods, status codes and the two message kinds
//! - **`parser`**: Parses requests (and responses) from byte buffers
//! - **`writer`**: Serializes responses (and requests) to bytes
//! - **`router`**: Build-then-freeze route table and dispatch
//! - **`pipeline`**: Raw request bytes in, serialized response bytes out
//! - **`connection`**: The per-connection read/write state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ One read = one request → parse, dispatch, serialize
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Drain the response, resuming after partial writes
//!        └──────┬───────────┘
//!               │ Response fully sent
//!               └─ back to Reading (same connection)
//! ```
//!
//! Peer close, I/O errors and unexpected readiness close the connection from
//! either state.

pub mod connection;
pub mod message;
pub mod parser;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod router;
pub mod uri;
pub mod writer;

pub use message::HttpMessage;
