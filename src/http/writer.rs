use bytes::{BufMut, Bytes, BytesMut};

use crate::http::message::{CONTENT_LENGTH, HttpMessage};
use crate::http::request::Request;
use crate::http::response::Response;

/// Serializes a response into the bytes put on the wire.
///
/// Headers are written in name order. `Content-Length` always reflects the
/// body: whatever value a handler stored, or however it spelled the name,
/// exactly one computed header goes on the wire. With `include_body` set to
/// false (responses to HEAD) the body is left out but `Content-Length` still
/// announces its size.
pub fn serialize_response(resp: &Response, include_body: bool) -> Bytes {
    let mut buf = BytesMut::with_capacity(128 + resp.content_length());

    // Status line
    buf.put_slice(
        format!(
            "{} {} {}\r\n",
            resp.version(),
            resp.status.as_u16(),
            resp.status.reason_phrase()
        )
        .as_bytes(),
    );

    put_headers(&mut buf, resp);

    if include_body {
        buf.put_slice(resp.body());
    }

    buf.freeze()
}

/// Serializes a request, mainly for clients talking to the server.
pub fn serialize_request(req: &Request) -> Bytes {
    let mut buf = BytesMut::with_capacity(128 + req.content_length());

    buf.put_slice(format!("{} {} {}\r\n", req.method, req.uri, req.version()).as_bytes());
    put_headers(&mut buf, req);
    buf.put_slice(req.body());

    buf.freeze()
}

fn put_headers<M: HttpMessage>(buf: &mut BytesMut, message: &M) {
    for (k, v) in message.headers() {
        if k.eq_ignore_ascii_case(CONTENT_LENGTH) {
            continue;
        }
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(format!("{}: {}\r\n", CONTENT_LENGTH, message.content_length()).as_bytes());

    // Header/body separator
    buf.put_slice(b"\r\n");
}
