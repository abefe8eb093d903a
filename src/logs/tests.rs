//! Tests for the log stream demultiplexer.

use super::*;
use std::io::Cursor;

fn frame(stream: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![stream, 0, 0, 0];
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Reader that hands out at most `chunk` bytes per `read` call.
struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self { data, pos: 0, chunk }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.data.len() - self.pos;
        let n = remaining.min(self.chunk).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Reader that fails after yielding its data.
struct FailingReader {
    inner: Cursor<Vec<u8>>,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
        }
        Ok(n)
    }
}

#[test]
fn test_header_length_is_big_endian() {
    let header = FrameHeader::parse(&[2, 0, 0, 0, 0x01, 0x02, 0x03, 0x04]);
    assert_eq!(header.stream, StreamType::Stderr);
    assert_eq!(header.len, 0x0102_0304);

    let header = FrameHeader::parse(&[1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
    assert_eq!(header.len, u32::MAX);
}

#[test]
fn test_interleaved_frames_are_split_per_stream() {
    let mut data = Vec::new();
    data.extend(frame(1, b"hello "));
    data.extend(frame(2, b"warning: disk low\n"));
    data.extend(frame(1, b"world\n"));
    data.extend(frame(2, b""));
    data.extend(frame(1, &vec![b'x'; 70_000]));
    data.extend(frame(2, b"done\n"));

    let (out, err) = drain(Cursor::new(data), None).unwrap();
    let mut expected_out = String::from("hello world\n");
    expected_out.push_str(&"x".repeat(70_000));
    assert_eq!(out, expected_out);
    assert_eq!(err, "warning: disk low\ndone\n");
}

#[test]
fn test_payload_split_across_many_reads() {
    let mut data = Vec::new();
    data.extend(frame(1, b"first line of output\n"));
    data.extend(frame(2, b"an error spanning several reads\n"));
    data.extend(frame(1, b"last\n"));

    for chunk in [1, 3, 7, 8, 9] {
        let (out, err) = drain(ChunkedReader::new(data.clone(), chunk), None).unwrap();
        assert_eq!(out, "first line of output\nlast\n", "chunk size {}", chunk);
        assert_eq!(err, "an error spanning several reads\n", "chunk size {}", chunk);
    }
}

#[test]
fn test_raw_stream_is_copied_once_including_first_bytes() {
    let text = b"total 0\ndrwxr-xr-x 2 root root 40 Jan 1 00:00 tmp\n".to_vec();
    let mut out = Vec::new();
    let mut err = Vec::new();

    let summary = demux(ChunkedReader::new(text.clone(), 5), &mut out, &mut err, None).unwrap();

    assert_eq!(summary.format, LogFormat::Raw);
    assert_eq!(out, text);
    assert!(err.is_empty());
    assert_eq!(summary.stdout_bytes, text.len() as u64);
}

#[test]
fn test_short_stream_is_raw() {
    let (out, err) = drain(Cursor::new(b"ok\n".to_vec()), None).unwrap();
    assert_eq!(out, "ok\n");
    assert!(err.is_empty());
}

#[test]
fn test_empty_stream_produces_nothing() {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let summary = demux(Cursor::new(Vec::new()), &mut out, &mut err, None).unwrap();
    assert_eq!(summary.stdout_bytes + summary.stderr_bytes, 0);
    assert!(out.is_empty() && err.is_empty());
}

#[test]
fn test_known_tty_skips_sniffing() {
    // Framed-looking bytes are passed through untouched when a TTY is known.
    let data = frame(1, b"hi");
    let mut out = Vec::new();
    let summary = demux(Cursor::new(data.clone()), &mut out, io::sink(), Some(true)).unwrap();
    assert_eq!(summary.format, LogFormat::Raw);
    assert_eq!(out, data);
}

#[test]
fn test_known_non_tty_never_falls_back_to_raw() {
    let err = drain(Cursor::new(b"plain text output".to_vec()), Some(false));
    // Bytes 4-7 of the text decode to a length the stream cannot satisfy.
    assert_eq!(err.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn test_unknown_selector_is_dropped() {
    let mut data = Vec::new();
    data.extend(frame(1, b"kept\n"));
    data.extend(frame(7, b"mystery"));
    data.extend(frame(0, b"stdin echo"));
    data.extend(frame(2, b"also kept\n"));

    let mut out = Vec::new();
    let mut err = Vec::new();
    let summary = demux(Cursor::new(data), &mut out, &mut err, None).unwrap();

    assert_eq!(out, b"kept\n");
    assert_eq!(err, b"also kept\n");
    assert_eq!(summary.dropped_bytes, 17);
}

#[test]
fn test_truncated_payload_is_written_then_reported() {
    let mut data = frame(1, b"complete\n");
    let mut partial = frame(2, b"cut short here");
    partial.truncate(HEADER_LEN + 3);
    data.extend(partial);

    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = demux(Cursor::new(data), &mut out, &mut err, None);

    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    assert_eq!(out, b"complete\n");
    assert_eq!(err, b"cut");
}

#[test]
fn test_truncated_header_is_reported() {
    let mut data = frame(1, b"complete\n");
    data.extend_from_slice(&[2, 0, 0]);

    let result = drain(Cursor::new(data), None);
    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn test_read_errors_propagate() {
    let reader = FailingReader {
        inner: Cursor::new(frame(1, b"partial")),
    };
    let result = drain(reader, None);
    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::ConnectionReset);
}

#[test]
fn test_looks_raw() {
    assert!(looks_raw(b"Hello, world"));
    assert!(looks_raw(&[1, 0, 0]));
    assert!(!looks_raw(&[1, 0, 0, 0, 0, 0, 0, 5]));
    assert!(looks_raw(&[1, 0, 1, 0, 0, 0, 0, 5]));
}
