//! Service log demultiplexing.
//!
//! The daemon returns service logs as one byte stream. Without a TTY the
//! stream is a sequence of frames:
//!
//! ```text
//! +--------+-----------+---------------------------+------------------+
//! | stream | 0 | 0 | 0 | payload length (u32, BE)  | payload ...      |
//! +--------+-----------+---------------------------+------------------+
//!   byte 0   bytes 1-3   bytes 4-7
//! ```
//!
//! Stream 1 is stdout, stream 2 is stderr; other selectors are dropped. With
//! a TTY attached there is no framing and the stream is plain output.
//!
//! When the TTY setting is unknown the first 8 bytes are sniffed: non-zero
//! reserved bytes mean raw output. A multiplexed stream always has zero
//! reserved bytes, but raw output that happens to contain NUL bytes at
//! positions 1-3 is misread as a frame header. Pass the TTY flag when it is
//! known to avoid the guess.

use std::io::{self, Read, Write};

#[cfg(test)]
mod tests;

/// Size of a frame header in bytes.
pub const HEADER_LEN: usize = 8;

/// Output channel selected by a frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Stdin,
    Stdout,
    Stderr,
    Unknown(u8),
}

impl From<u8> for StreamType {
    fn from(value: u8) -> Self {
        match value {
            0 => StreamType::Stdin,
            1 => StreamType::Stdout,
            2 => StreamType::Stderr,
            other => StreamType::Unknown(other),
        }
    }
}

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub stream: StreamType,
    pub len: u32,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        Self {
            stream: StreamType::from(bytes[0]),
            len: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// Shape of a log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Framed stdout/stderr chunks.
    Multiplexed,
    /// Undifferentiated terminal output.
    Raw,
}

/// Whether the reserved bytes of a would-be header mark the stream as raw.
///
/// Fewer than 8 bytes cannot hold a header, so short input is raw too.
pub fn looks_raw(prefix: &[u8]) -> bool {
    prefix.len() < HEADER_LEN || prefix[1..4].iter().any(|&b| b != 0)
}

/// Byte counts of a decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxSummary {
    pub format: LogFormat,
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
    /// Payload bytes of frames with an unknown stream selector.
    pub dropped_bytes: u64,
}

impl DemuxSummary {
    fn new(format: LogFormat) -> Self {
        Self {
            format,
            stdout_bytes: 0,
            stderr_bytes: 0,
            dropped_bytes: 0,
        }
    }
}

/// Decode a log stream, writing stdout and stderr payloads to their writers.
///
/// `tty` is the container's TTY setting when known; `Some(true)` skips the
/// sniffing and copies the stream to `stdout` verbatim.
///
/// # Errors
///
/// Read and write errors propagate. A header or payload cut short by the end
/// of the stream is reported as `UnexpectedEof` after the bytes that did
/// arrive have been written.
pub fn demux<R, O, E>(
    mut reader: R,
    mut stdout: O,
    mut stderr: E,
    tty: Option<bool>,
) -> io::Result<DemuxSummary>
where
    R: Read,
    O: Write,
    E: Write,
{
    if tty == Some(true) {
        let copied = io::copy(&mut reader, &mut stdout)?;
        stdout.flush()?;
        return Ok(DemuxSummary {
            stdout_bytes: copied,
            ..DemuxSummary::new(LogFormat::Raw)
        });
    }

    let mut header = [0u8; HEADER_LEN];
    let n = read_full(&mut reader, &mut header)?;
    if n == 0 {
        return Ok(DemuxSummary::new(LogFormat::Multiplexed));
    }

    if tty.is_none() && looks_raw(&header[..n]) {
        stdout.write_all(&header[..n])?;
        let copied = io::copy(&mut reader, &mut stdout)?;
        stdout.flush()?;
        return Ok(DemuxSummary {
            stdout_bytes: n as u64 + copied,
            ..DemuxSummary::new(LogFormat::Raw)
        });
    }

    let mut summary = DemuxSummary::new(LogFormat::Multiplexed);
    let mut filled = n;
    loop {
        if filled < HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("log frame header truncated after {} bytes", filled),
            ));
        }

        let frame = FrameHeader::parse(&header);
        let copied = match frame.stream {
            StreamType::Stdout => copy_payload(&mut reader, &mut stdout, frame.len)?,
            StreamType::Stderr => copy_payload(&mut reader, &mut stderr, frame.len)?,
            StreamType::Stdin | StreamType::Unknown(_) => {
                copy_payload(&mut reader, &mut io::sink(), frame.len)?
            }
        };
        match frame.stream {
            StreamType::Stdout => summary.stdout_bytes += copied,
            StreamType::Stderr => summary.stderr_bytes += copied,
            _ => summary.dropped_bytes += copied,
        }

        if copied < u64::from(frame.len) {
            stdout.flush()?;
            stderr.flush()?;
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "log frame truncated: expected {} payload bytes, got {}",
                    frame.len, copied
                ),
            ));
        }

        filled = read_full(&mut reader, &mut header)?;
        if filled == 0 {
            break;
        }
    }

    stdout.flush()?;
    stderr.flush()?;
    Ok(summary)
}

/// Decode a whole log stream into stdout and stderr text.
///
/// Invalid UTF-8 is replaced rather than rejected.
#[cfg(test)]
pub(crate) fn drain<R: Read>(reader: R, tty: Option<bool>) -> io::Result<(String, String)> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    demux(reader, &mut out, &mut err, tty)?;
    Ok((
        String::from_utf8_lossy(&out).into_owned(),
        String::from_utf8_lossy(&err).into_owned(),
    ))
}

/// Copy exactly `len` bytes unless the stream ends first.
fn copy_payload<R: Read, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    len: u32,
) -> io::Result<u64> {
    io::copy(&mut reader.by_ref().take(u64::from(len)), writer)
}

/// Fill `buf` from `reader`, looping over short reads. Returns the number of
/// bytes read, which is less than `buf.len()` only at end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
