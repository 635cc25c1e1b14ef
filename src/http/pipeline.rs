//! Turns the bytes of one read into the bytes of one response.
//!
//! Every failure on this path ends up as a response: parse errors become
//! 400 or 505 and a panicking handler becomes 500. The connection that fed
//! the bytes stays open either way.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use bytes::Bytes;
use tracing::{debug, error};

use crate::http::parser::parse_request;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::router::Router;
use crate::http::writer::serialize_response;

pub fn respond(raw: &[u8], router: &Router) -> Bytes {
    let (response, include_body) = match parse_request(raw) {
        Ok(request) => (
            dispatch_guarded(router, &request),
            request.method != Method::HEAD,
        ),
        Err(e) => {
            debug!(error = %e, "Rejected request");
            (Response::error(e.status(), e.to_string()), true)
        }
    };

    serialize_response(&response, include_body)
}

fn dispatch_guarded(router: &Router, request: &Request) -> Response {
    panic::catch_unwind(AssertUnwindSafe(|| router.dispatch(request))).unwrap_or_else(|payload| {
        let reason = panic_message(payload.as_ref());
        error!(
            method = %request.method,
            path = %request.uri,
            reason = %reason,
            "Handler panicked"
        );
        Response::error(StatusCode::InternalServerError, reason)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
