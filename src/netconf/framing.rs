//! NETCONF message framing over an SSH channel (RFC 6242).
//!
//! Hellos always travel with the base:1.0 end-of-message delimiter. When both
//! peers advertise base:1.1 every later message uses chunked framing.

use std::io::{Read, Write};

use super::SessionError;

pub const EOM_DELIMITER: &[u8] = b"]]>]]>";

const END_OF_CHUNKS: &[u8] = b"\n##\n";
const MAX_CHUNK_SIZE: u64 = 4_294_967_295;
const MAX_CHUNK_HEADER_DIGITS: usize = 10;
const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;
const READ_BUF_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// base:1.0, message followed by `]]>]]>`
    EndOfMessage,
    /// base:1.1, `\n#<len>\n<data>` chunks closed by `\n##\n`
    Chunked,
}

/// Frame one message for the wire.
pub fn encode(framing: Framing, message: &str) -> Vec<u8> {
    match framing {
        Framing::EndOfMessage => {
            let mut out = Vec::with_capacity(message.len() + EOM_DELIMITER.len());
            out.extend_from_slice(message.as_bytes());
            out.extend_from_slice(EOM_DELIMITER);
            out
        }
        Framing::Chunked => {
            let mut out = format!("\n#{}\n", message.len()).into_bytes();
            out.extend_from_slice(message.as_bytes());
            out.extend_from_slice(END_OF_CHUNKS);
            out
        }
    }
}

/// Try to take one complete message off the front of `buf`.
///
/// Returns the message bytes and how many bytes of `buf` they used, or
/// `None` when more input is needed.
pub fn decode(framing: Framing, buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, SessionError> {
    match framing {
        Framing::EndOfMessage => Ok(decode_eom(buf)),
        Framing::Chunked => decode_chunked(buf),
    }
}

fn decode_eom(buf: &[u8]) -> Option<(Vec<u8>, usize)> {
    buf.windows(EOM_DELIMITER.len())
        .position(|window| window == EOM_DELIMITER)
        .map(|pos| (buf[..pos].to_vec(), pos + EOM_DELIMITER.len()))
}

fn malformed(reason: impl Into<String>) -> SessionError {
    SessionError::Framing(reason.into())
}

fn decode_chunked(buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, SessionError> {
    // Tolerate stray whitespace between messages, e.g. a newline some devices
    // leave after the hello delimiter. The chunk header still needs its LF.
    let lead = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
    if lead == buf.len() {
        return Ok(None);
    }
    if lead == 0 || buf[lead - 1] != b'\n' || buf[lead] != b'#' {
        return Err(malformed("expected chunk header"));
    }

    let mut pos = lead - 1;
    let mut message = Vec::new();
    let mut chunks = 0usize;

    loop {
        // "\n#" then either "#\n" (end of chunks) or "<size>\n"
        if buf.len() < pos + 3 {
            return Ok(None);
        }
        if &buf[pos..pos + 2] != b"\n#" {
            return Err(malformed("expected chunk header"));
        }

        let header = &buf[pos + 2..];
        if header[0] == b'#' {
            if header.len() < 2 {
                return Ok(None);
            }
            if header[1] != b'\n' {
                return Err(malformed("bad end-of-chunks marker"));
            }
            if chunks == 0 {
                return Err(malformed("message without chunks"));
            }
            return Ok(Some((message, pos + END_OF_CHUNKS.len())));
        }

        let Some(newline) = header.iter().position(|&b| b == b'\n') else {
            if header.len() > MAX_CHUNK_HEADER_DIGITS || !header.iter().all(u8::is_ascii_digit) {
                return Err(malformed("bad chunk size"));
            }
            return Ok(None);
        };

        let size = parse_chunk_size(&header[..newline])?;
        let start = pos + 2 + newline + 1;
        let end = start + size;
        if buf.len() < end {
            return Ok(None);
        }

        message.extend_from_slice(&buf[start..end]);
        chunks += 1;
        pos = end;
    }
}

fn parse_chunk_size(digits: &[u8]) -> Result<usize, SessionError> {
    if digits.is_empty() || digits.len() > MAX_CHUNK_HEADER_DIGITS {
        return Err(malformed("bad chunk size"));
    }
    if digits[0] == b'0' || !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed(format!(
            "bad chunk size {:?}",
            String::from_utf8_lossy(digits)
        )));
    }
    let size: u64 = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| malformed("bad chunk size"))?;
    if size > MAX_CHUNK_SIZE {
        return Err(malformed(format!("chunk size {} exceeds maximum", size)));
    }
    usize::try_from(size).map_err(|_| malformed("chunk size does not fit in memory"))
}

/// A byte stream carrying framed NETCONF messages.
pub struct FramedStream<T> {
    inner: T,
    framing: Framing,
    buf: Vec<u8>,
}

impl<T: Read + Write> FramedStream<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            framing: Framing::EndOfMessage,
            buf: Vec::new(),
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn set_framing(&mut self, framing: Framing) {
        self.framing = framing;
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn send(&mut self, message: &str) -> Result<(), SessionError> {
        self.inner.write_all(&encode(self.framing, message))?;
        self.inner.flush()?;
        Ok(())
    }

    /// Block until one full message has arrived.
    pub fn recv(&mut self) -> Result<String, SessionError> {
        let mut chunk = [0u8; READ_BUF_SIZE];
        loop {
            if let Some((message, used)) = decode(self.framing, &self.buf)? {
                self.buf.drain(..used);
                return String::from_utf8(message)
                    .map_err(|e| malformed(format!("message is not UTF-8: {}", e)));
            }
            if self.buf.len() > MAX_MESSAGE_SIZE {
                return Err(malformed("message exceeds 64 MiB"));
            }

            let n = self.inner.read(&mut chunk)?;
            if n == 0 {
                return Err(SessionError::Closed);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
