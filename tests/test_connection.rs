//! Read/write state transitions of a single connection, driven by in-memory
//! I/O doubles instead of sockets.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use shardline::http::connection::{CloseReason, Connection, ConnectionState, Next};
use shardline::http::request::Method;
use shardline::http::response::Response;
use shardline::http::router::Router;
use shardline::http::writer::serialize_response;

const REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";
const BODY: &str = "a response body long enough to be split in many pieces";

fn router() -> Router {
    let mut builder = Router::builder();
    builder.register("/", Method::GET, |_| Response::ok(BODY));
    builder.freeze()
}

fn expected_wire() -> Vec<u8> {
    serialize_response(&Response::ok(BODY), true).to_vec()
}

/// Reader that replays scripted results, one per call.
struct ScriptedReader {
    script: VecDeque<io::Result<Vec<u8>>>,
}

impl Read for ScriptedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.script.pop_front() {
            Some(Ok(chunk)) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            Some(Err(e)) => Err(e),
            None => Ok(0),
        }
    }
}

/// Writer that accepts at most the scripted number of bytes per call.
/// `None` reports would-block.
struct ChunkedWriter {
    limits: VecDeque<Option<usize>>,
    out: Vec<u8>,
}

impl ChunkedWriter {
    fn new(limits: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            limits: limits.into_iter().collect(),
            out: Vec::new(),
        }
    }
}

impl Write for ChunkedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.limits.pop_front().unwrap_or(Some(usize::MAX)) {
            Some(limit) => {
                let n = limit.min(buf.len());
                self.out.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writing_connection(router: &Router) -> Connection {
    let mut conn = Connection::new(4096);
    let mut input = REQUEST;
    assert_eq!(conn.on_readable(&mut input, router), Next::Write);
    conn
}

fn drain(conn: &mut Connection, writer: &mut ChunkedWriter) -> usize {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match conn.on_writable(writer) {
            Next::Write => continue,
            Next::Read => return attempts,
            Next::Close(reason) => panic!("connection closed: {reason:?}"),
        }
    }
}

#[test]
fn test_new_connection_is_reading() {
    let conn = Connection::new(128);

    assert!(conn.is_reading());
    assert_eq!(conn.capacity(), 128);
    assert_eq!(conn.remaining(), 0);
}

#[test]
fn test_read_prepares_full_response() {
    let router = router();
    let conn = writing_connection(&router);

    assert!(!conn.is_reading());
    assert_eq!(conn.cursor(), 0);
    assert_eq!(conn.remaining(), expected_wire().len());
}

#[test]
fn test_single_write_returns_to_reading() {
    let router = router();
    let mut conn = writing_connection(&router);
    let mut writer = ChunkedWriter::new([]);

    assert_eq!(conn.on_writable(&mut writer), Next::Read);
    assert_eq!(writer.out, expected_wire());
    assert_eq!(conn.state(), &ConnectionState::Reading);
}

#[test]
fn test_partial_writes_resume_byte_for_byte() {
    let router = router();
    let total = expected_wire().len();

    let splits: Vec<Vec<Option<usize>>> = vec![
        vec![Some(1)],
        vec![Some(total - 1)],
        vec![Some(1); total],
        vec![Some(7); total.div_ceil(7)],
        vec![Some(0), Some(3), Some(0), Some(10)],
        vec![Some(total / 2), Some(total / 2)],
    ];

    for limits in splits {
        let mut conn = writing_connection(&router);
        let mut writer = ChunkedWriter::new(limits.clone());
        drain(&mut conn, &mut writer);

        assert_eq!(writer.out, expected_wire(), "split {limits:?}");
        assert!(conn.is_reading());
    }
}

#[test]
fn test_partial_write_advances_cursor() {
    let router = router();
    let total = expected_wire().len();
    let mut conn = writing_connection(&router);
    let mut writer = ChunkedWriter::new([Some(10)]);

    assert_eq!(conn.on_writable(&mut writer), Next::Write);
    assert_eq!(conn.cursor(), 10);
    assert_eq!(conn.remaining(), total - 10);
}

#[test]
fn test_write_would_block_keeps_state() {
    let router = router();
    let mut conn = writing_connection(&router);
    let mut writer = ChunkedWriter::new([Some(5), None]);

    assert_eq!(conn.on_writable(&mut writer), Next::Write);
    let before = conn.state().clone();

    assert_eq!(conn.on_writable(&mut writer), Next::Write);
    assert_eq!(conn.state(), &before);
    assert_eq!(conn.cursor(), 5);

    drain(&mut conn, &mut writer);
    assert_eq!(writer.out, expected_wire());
}

#[test]
fn test_read_would_block_keeps_reading() {
    let router = router();
    let mut conn = Connection::new(4096);
    let mut reader = ScriptedReader {
        script: VecDeque::from([
            Err(io::ErrorKind::WouldBlock.into()),
            Ok(REQUEST.to_vec()),
        ]),
    };

    assert_eq!(conn.on_readable(&mut reader, &router), Next::Read);
    assert!(conn.is_reading());

    assert_eq!(conn.on_readable(&mut reader, &router), Next::Write);
    assert_eq!(conn.remaining(), expected_wire().len());
}

#[test]
fn test_read_error_closes() {
    let router = router();
    let mut conn = Connection::new(4096);
    let mut reader = ScriptedReader {
        script: VecDeque::from([Err(io::ErrorKind::ConnectionReset.into())]),
    };

    assert_eq!(
        conn.on_readable(&mut reader, &router),
        Next::Close(CloseReason::Io(io::ErrorKind::ConnectionReset))
    );
}

#[test]
fn test_write_error_closes() {
    let router = router();
    let mut conn = writing_connection(&router);

    struct Broken;
    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    assert_eq!(
        conn.on_writable(&mut Broken),
        Next::Close(CloseReason::Io(io::ErrorKind::BrokenPipe))
    );
}

#[test]
fn test_write_while_reading_is_unexpected() {
    let mut conn = Connection::new(64);
    let mut writer = ChunkedWriter::new([]);

    assert_eq!(
        conn.on_writable(&mut writer),
        Next::Close(CloseReason::UnexpectedReadiness)
    );
}

#[test]
fn test_keep_alive_cycles_reuse_the_connection() {
    let router = router();
    let mut conn = Connection::new(4096);
    let mut writer = ChunkedWriter::new([]);

    for _ in 0..3 {
        let mut input = REQUEST;
        assert_eq!(conn.on_readable(&mut input, &router), Next::Write);
        drain(&mut conn, &mut writer);
    }

    assert_eq!(writer.out, expected_wire().repeat(3));
}

#[test]
fn test_malformed_request_still_gets_a_response() {
    let router = router();
    let mut conn = Connection::new(4096);
    let mut input: &[u8] = b"GARBAGE\r\n\r\n";
    let mut writer = ChunkedWriter::new([]);

    assert_eq!(conn.on_readable(&mut input, &router), Next::Write);
    drain(&mut conn, &mut writer);

    assert!(writer.out.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
    assert!(conn.is_reading());
}
