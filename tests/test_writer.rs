use shardline::http::HttpMessage;
use shardline::http::message::Version;
use shardline::http::parser::parse_request;
use shardline::http::request::{Method, RequestBuilder};
use shardline::http::response::{Response, ResponseBuilder, StatusCode};
use shardline::http::writer::{serialize_request, serialize_response};

#[test]
fn test_serialize_status_line_headers_and_body() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .body("ok")
        .build();

    let bytes = serialize_response(&response, true);

    assert_eq!(
        bytes.as_ref(),
        b"HTTP/1.1 200 Ok\r\nContent-Length: 2\r\nContent-Type: text/plain\r\n\r\nok"
    );
}

#[test]
fn test_serialize_headers_in_name_order() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Zeta", "1")
        .header("Alpha", "2")
        .build();

    let text = String::from_utf8(serialize_response(&response, true).to_vec()).unwrap();

    let alpha = text.find("Alpha: 2").unwrap();
    let zeta = text.find("Zeta: 1").unwrap();
    assert!(alpha < zeta);
}

#[test]
fn test_serialize_head_response_omits_body() {
    let response = Response::ok("hello");

    let bytes = serialize_response(&response, false);

    assert_eq!(bytes.as_ref(), b"HTTP/1.1 200 Ok\r\nContent-Length: 5\r\n\r\n");
}

#[test]
fn test_serialize_adds_missing_content_length() {
    let mut response = Response::ok("abc");
    response.remove_header("Content-Length");

    let bytes = serialize_response(&response, true);

    assert_eq!(bytes.as_ref(), b"HTTP/1.1 200 Ok\r\nContent-Length: 3\r\n\r\nabc");
}

#[test]
fn test_serialize_ignores_stale_content_length() {
    let mut response = Response::ok("ok");
    response.set_header("Content-Length", "999");

    let bytes = serialize_response(&response, true);

    assert_eq!(bytes.as_ref(), b"HTTP/1.1 200 Ok\r\nContent-Length: 2\r\n\r\nok");
}

#[test]
fn test_serialize_writes_one_content_length_whatever_its_case() {
    let mut response = Response::new(StatusCode::Ok);
    response.set_body("ok");
    response.set_header("content-length", "5");

    let bytes = serialize_response(&response, true);

    assert_eq!(bytes.as_ref(), b"HTTP/1.1 200 Ok\r\nContent-Length: 2\r\n\r\nok");
}

#[test]
fn test_serialize_empty_response() {
    let bytes = serialize_response(&Response::not_found(), true);

    assert_eq!(
        bytes.as_ref(),
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n"
    );
}

#[test]
fn test_serialize_uses_message_version() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .version(Version::Http10)
        .build();

    let bytes = serialize_response(&response, true);

    assert!(bytes.starts_with(b"HTTP/1.0 200 Ok\r\n"));
}

#[test]
fn test_serialize_request_is_parseable() {
    let request = RequestBuilder::new()
        .method(Method::POST)
        .path("/submit?x=1")
        .header("Host", "localhost")
        .body("payload")
        .build()
        .unwrap();

    let bytes = serialize_request(&request);
    assert!(bytes.starts_with(b"POST /submit?x=1 HTTP/1.1\r\n"));

    let parsed = parse_request(&bytes).unwrap();
    assert_eq!(parsed, request);
    assert_eq!(parsed.body().as_ref(), b"payload");
}
