//! Shardline - sharded reactor HTTP/1.x server
//!
//! A small HTTP/1.x server built on non-blocking sockets and a readiness
//! multiplexer per worker thread. The listener deals accepted connections
//! out round-robin; each worker reads a request, routes it, writes the
//! response and keeps the connection open for the next one.
//!
//! # Example
//!
//! ```no_run
//! use shardline::config::ServerConfig;
//! use shardline::http::request::Method;
//! use shardline::http::response::Response;
//! use shardline::server::HttpServer;
//!
//! let mut server = HttpServer::new(ServerConfig::default());
//! server.register_handler("/", Method::GET, |_| Response::ok("ok"));
//!
//! let handle = server.start("127.0.0.1", 8080)?;
//! // ... serve until it is time to shut down
//! handle.stop();
//! # Ok::<(), shardline::error::ServerError>(())
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod server;
