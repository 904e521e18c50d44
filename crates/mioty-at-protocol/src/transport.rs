//! Byte transport used to reach the modem.
//!
//! The codec only needs two primitives: write a command, and read whatever
//! bytes are available. Timeouts and retransmission belong to the transport;
//! a transport that gives up must report it as a read error.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// A synchronous byte transport.
pub trait Transport {
    /// Transmit exactly `data`.
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read up to `buf.len()` bytes.
    ///
    /// `Ok(0)` means nothing is available yet; an error ends the current
    /// exchange.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }
}

/// Adapts any `Read + Write` stream (serial port, TCP socket, ...).
///
/// End of stream is reported as `UnexpectedEof` so a closed connection
/// cannot stall a pending exchange. Read timeouts configured on the stream
/// surface as read errors.
#[derive(Debug)]
pub struct IoTransport<S> {
    stream: S,
}

impl<S: Read + Write> IoTransport<S> {
    /// Wrap a stream.
    pub fn new(stream: S) -> Self {
        IoTransport { stream }
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> Transport for IoTransport<S> {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.stream.read(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream closed",
                    ))
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// An in-memory transport that replays scripted reads.
///
/// Every write is recorded. Reads hand out the scripted chunks in order,
/// splitting a chunk when the caller's buffer is smaller; once the script is
/// exhausted every read fails.
#[derive(Debug, Default, Clone)]
pub struct ScriptedTransport {
    chunks: VecDeque<Vec<u8>>,
    written: Vec<u8>,
}

impl ScriptedTransport {
    /// Create a transport with an empty script.
    pub fn new() -> Self {
        ScriptedTransport::default()
    }

    /// Append a chunk to the script.
    pub fn with_chunk(mut self, chunk: &[u8]) -> Self {
        self.push_chunk(chunk);
        self
    }

    /// Append a chunk to the script.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.chunks.push_back(chunk.to_vec());
    }

    /// Append a reply split into chunks of at most `size` bytes.
    pub fn push_reply(&mut self, reply: &[u8], size: usize) {
        for chunk in reply.chunks(size.max(1)) {
            self.push_chunk(chunk);
        }
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Take and clear everything written so far.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Number of scripted chunks not yet fully read.
    pub fn remaining_chunks(&self) -> usize {
        self.chunks.len()
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self
            .chunks
            .front_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "script exhausted"))?;
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n == chunk.len() {
            self.chunks.pop_front();
        } else {
            chunk.drain(..n);
        }
        Ok(n)
    }
}
