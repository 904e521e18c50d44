//! Response accumulation and status-line detection.
//!
//! The modem does not length-prefix its replies. A reply is complete once one
//! of three status lines shows up anywhere in the accumulated text:
//!
//! ```text
//! \r\n0\r\n  (or a leading 0\r\n)   success
//! \r\n1\r\n                         MAC error, code in -MNFO: / -MERR:
//! \r\n2\r\n                         AT error, code in AT!ERR: (+200)
//! ```
//!
//! A status line can straddle two reads, so the whole buffer is rescanned
//! after every chunk.

use bytes::BytesMut;
use log::{debug, trace};

use crate::responses::{Response, Status};
use crate::return_code::ReturnCode;
use crate::transport::Transport;

/// Carriage return, terminates every command.
pub const CR: u8 = b'\r';
/// Line feed.
pub const LF: u8 = b'\n';
/// Separates the length prefix from hex data.
pub const TAB: u8 = b'\t';
/// First byte of the binary terminator.
pub const SUB: u8 = 0x1A;

/// Closes a hex payload, in both directions.
pub const BINARY_TERMINATOR: &[u8] = b"\x1a\r";

/// Default number of bytes requested from the transport per read.
pub const DEFAULT_CHUNK_SIZE: usize = 30;

/// Status line for success.
pub const SUCCESS_MARKER: &[u8] = b"\r\n0\r\n";
/// Success status line when the reply has no preceding line.
pub const SUCCESS_PREFIX: &[u8] = b"0\r\n";
/// Status line for a MAC-layer error.
pub const MAC_ERROR_MARKER: &[u8] = b"\r\n1\r\n";
/// Status line for an AT-layer error.
pub const AT_ERROR_MARKER: &[u8] = b"\r\n2\r\n";

/// Field carrying the MAC error code, preferred over [`MAC_ERROR_FIELD`].
pub const MAC_INFO_FIELD: &[u8] = b"-MNFO:";
/// Fallback field carrying the MAC error code.
pub const MAC_ERROR_FIELD: &[u8] = b"-MERR:";
/// Field carrying the AT error sub-code.
pub const AT_ERROR_FIELD: &[u8] = b"AT!ERR:";

/// Start of every command line, and so of the modem's echo of it.
pub const ECHO_PREFIX: &[u8] = b"AT";

/// Accumulates the reply to a single command.
///
/// Letters are upper-cased on arrival so markers match regardless of the
/// modem's casing; an unmodified copy is kept at the same offsets for string
/// fields.
#[derive(Debug, Default)]
pub struct ResponseCodec {
    /// Upper-cased text, used for all marker matching.
    buffer: BytesMut,
    /// Bytes exactly as received.
    raw: BytesMut,
}

impl ResponseCodec {
    /// Create an empty codec.
    pub fn new() -> Self {
        ResponseCodec {
            buffer: BytesMut::with_capacity(DEFAULT_CHUNK_SIZE * 8),
            raw: BytesMut::with_capacity(DEFAULT_CHUNK_SIZE * 8),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.raw.extend_from_slice(data);
        self.buffer.reserve(data.len());
        for &byte in data {
            self.buffer.extend_from_slice(&[byte.to_ascii_uppercase()]);
        }
    }

    /// Classify the accumulated text.
    ///
    /// Returns `None` while no status line has arrived.
    pub fn classify(&self) -> Option<Status> {
        let text = &self.buffer[..];

        if find(text, SUCCESS_MARKER).is_some() || text.starts_with(SUCCESS_PREFIX) {
            return Some(Status::Success);
        }

        if find(text, MAC_ERROR_MARKER).is_some() {
            let code = find_field(text, MAC_INFO_FIELD)
                .map(|pos| pos + MAC_INFO_FIELD.len())
                .or_else(|| find_field(text, MAC_ERROR_FIELD).map(|pos| pos + MAC_ERROR_FIELD.len()))
                .and_then(|start| parse_decimal(&text[start..]))
                .filter(|&code| code != 0)
                .map(ReturnCode::from)
                .unwrap_or(ReturnCode::GenericError);
            return Some(Status::MacError(code));
        }

        if find(text, AT_ERROR_MARKER).is_some() {
            let code = find_field(text, AT_ERROR_FIELD)
                .and_then(|pos| parse_decimal(&text[pos + AT_ERROR_FIELD.len()..]))
                .map(ReturnCode::from_at_subcode)
                .unwrap_or(ReturnCode::AtError);
            return Some(Status::AtError(code));
        }

        None
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Get the current buffer contents as a string (for debugging).
    pub fn buffer_as_str(&self) -> String {
        String::from_utf8_lossy(&self.buffer).to_string()
    }

    /// Freeze the accumulated text into a [`Response`].
    pub fn finish(self, status: Status) -> Response {
        Response::new(status, self.buffer.freeze(), self.raw.freeze())
    }
}

/// Read one reply from `transport`, `chunk_size` bytes at a time.
///
/// Blocks until a status line arrives or the transport reports a read
/// failure. There is no timeout here; a transport that needs one must fail
/// its read when the deadline passes.
pub fn read_response<T: Transport + ?Sized>(transport: &mut T, chunk_size: usize) -> Response {
    let mut codec = ResponseCodec::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        let len = match transport.read(&mut chunk) {
            Ok(len) => len.min(chunk.len()),
            Err(e) => {
                debug!(
                    "read failed after {} bytes: {} ({:?})",
                    codec.buffered_len(),
                    e,
                    codec.buffer_as_str()
                );
                return codec.finish(Status::TransportFailure);
            }
        };

        trace!("rx {:?}", String::from_utf8_lossy(&chunk[..len]));
        codec.push(&chunk[..len]);

        if let Some(status) = codec.classify() {
            debug!("reply complete after {} bytes: {:?}", codec.buffered_len(), status);
            return codec.finish(status);
        }
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Position of a field marker.
///
/// An occurrence at the start of a line wins over one embedded in other text
/// (such as the echoed command); otherwise the first occurrence is used.
pub(crate) fn find_field(haystack: &[u8], marker: &[u8]) -> Option<usize> {
    let mut first = None;
    let mut offset = 0;
    while let Some(pos) = find(&haystack[offset..], marker) {
        let pos = offset + pos;
        if pos == 0 || haystack[pos - 1] == LF {
            return Some(pos);
        }
        first.get_or_insert(pos);
        offset = pos + 1;
        if offset >= haystack.len() {
            break;
        }
    }
    first
}

/// Position of a reply field marker, ignoring the echoed command.
///
/// Like [`find_field`], but an occurrence inside a line that starts with the
/// `AT` prefix is never returned: that line is the modem echoing the command,
/// and its arguments are not part of the reply.
pub(crate) fn find_reply_field(haystack: &[u8], marker: &[u8]) -> Option<usize> {
    let mut first = None;
    let mut offset = 0;
    while let Some(pos) = find(&haystack[offset..], marker) {
        let pos = offset + pos;
        let line_start = haystack[..pos]
            .iter()
            .rposition(|&b| b == LF)
            .map_or(0, |lf| lf + 1);
        if line_start == pos {
            return Some(pos);
        }
        if !haystack[line_start..].starts_with(ECHO_PREFIX) {
            first.get_or_insert(pos);
        }
        offset = pos + 1;
        if offset >= haystack.len() {
            break;
        }
    }
    first
}

/// Parse the decimal digits at the start of `text`.
///
/// Leading spaces and tabs are skipped. Returns `None` when there are no
/// digits or the value does not fit in a `u32`.
pub(crate) fn parse_decimal(text: &[u8]) -> Option<u32> {
    let start = text.iter().position(|&b| b != b' ' && b != TAB)?;
    let digits: &[u8] = &text[start..];
    let end = digits
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].iter().try_fold(0u32, |acc, &b| {
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;

    fn classify(text: &[u8]) -> Option<Status> {
        let mut codec = ResponseCodec::new();
        codec.push(text);
        codec.classify()
    }

    #[test]
    fn test_success_marker() {
        assert_eq!(classify(b"AT-MPCT:0\r\n-MPCT:42\r\n0\r\n"), Some(Status::Success));
    }

    #[test]
    fn test_leading_success_line() {
        assert_eq!(classify(b"0\r\n"), Some(Status::Success));
        assert_eq!(classify(b"0\r"), None);
    }

    #[test]
    fn test_mac_error() {
        assert_eq!(
            classify(b"\r\n1\r\n-MERR:6\r\n"),
            Some(Status::MacError(ReturnCode::MacNodeNotAttached))
        );
    }

    #[test]
    fn test_mac_info_preferred_over_merr() {
        assert_eq!(
            classify(b"-MERR:6\r\n-MNFO:12\r\n\r\n1\r\n"),
            Some(Status::MacError(ReturnCode::MacNoDownlinkReceived))
        );
    }

    #[test]
    fn test_mac_error_without_code_is_generic() {
        assert_eq!(
            classify(b"AT-U=1\t00\x1a\r\r\n1\r\n"),
            Some(Status::MacError(ReturnCode::GenericError))
        );
        assert_eq!(
            classify(b"-MERR:0\r\n\r\n1\r\n"),
            Some(Status::MacError(ReturnCode::GenericError))
        );
    }

    #[test]
    fn test_at_error() {
        assert_eq!(
            classify(b"\r\n2\r\n AT!ERR:3\r\n"),
            Some(Status::AtError(ReturnCode::AtParamOutOfBounds))
        );
    }

    #[test]
    fn test_at_error_lowercase_marker() {
        assert_eq!(
            classify(b"at!err:2\r\n\r\n2\r\n"),
            Some(Status::AtError(ReturnCode::AtCommandNotKnown))
        );
    }

    #[test]
    fn test_at_error_without_code() {
        assert_eq!(classify(b"\r\n2\r\n"), Some(Status::AtError(ReturnCode::AtError)));
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(classify(b""), None);
        assert_eq!(classify(b"AT-MEUI?\r\n-MEUI:8\t0011"), None);
        assert_eq!(classify(b"\r\n3\r\n"), None);
    }

    #[test]
    fn test_uppercase_normalization() {
        let mut codec = ResponseCodec::new();
        codec.push(b"-mpct:7\r\n");
        assert_eq!(codec.buffer_as_str(), "-MPCT:7\r\n");
        let response = codec.finish(Status::Success);
        assert_eq!(response.raw(), b"-mpct:7\r\n");
    }

    #[test]
    fn test_marker_split_across_chunks() {
        let mut transport = ScriptedTransport::new()
            .with_chunk(b"-MSTA:1\r\n")
            .with_chunk(b"\r\n")
            .with_chunk(b"0\r\n");
        let response = read_response(&mut transport, DEFAULT_CHUNK_SIZE);
        assert_eq!(response.status(), Status::Success);
        assert_eq!(transport.remaining_chunks(), 0);
    }

    #[test]
    fn test_read_failure() {
        let mut transport = ScriptedTransport::new().with_chunk(b"AT-MPCT?\r\n");
        let response = read_response(&mut transport, DEFAULT_CHUNK_SIZE);
        assert_eq!(response.status(), Status::TransportFailure);
    }

    #[test]
    fn test_stops_reading_after_status() {
        let mut transport = ScriptedTransport::new()
            .with_chunk(b"\r\n0\r\n")
            .with_chunk(b"\r\n2\r\n");
        let response = read_response(&mut transport, DEFAULT_CHUNK_SIZE);
        assert_eq!(response.status(), Status::Success);
        assert_eq!(transport.remaining_chunks(), 1);
    }

    #[test]
    fn test_chunk_size_bounds_reads() {
        let mut transport = ScriptedTransport::new().with_chunk(b"-MPCT:1234\r\n\r\n0\r\n");
        let response = read_response(&mut transport, 4);
        assert_eq!(response.status(), Status::Success);
        assert_eq!(response.packet_counter(), 1234);
    }

    #[test]
    fn test_find_field_prefers_line_start() {
        let text = b"AT-MPCT:0\r\n-MPCT:42\r\n";
        assert_eq!(find_field(text, b"-MPCT:"), Some(11));
        assert_eq!(find_field(b"X-MSTA:1", b"-MSTA:"), Some(1));
        assert_eq!(find_field(b"nothing", b"-MSTA:"), None);
    }

    #[test]
    fn test_find_reply_field_skips_echo_line() {
        let text = b"AT-B=2\tCAFE\x1a\r\r\n-MPCT:17\r\n";
        assert_eq!(find_reply_field(text, b"-B"), None);
        assert_eq!(find_reply_field(text, b"-MPCT:"), Some(15));
        assert_eq!(find_reply_field(b"ATI\r\n-I:X\r\n", b"I:"), Some(6));
        assert_eq!(find_reply_field(b"AT-UTPL?\r\n\r\n0\r\n", b"-UTPL"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(b"42\r\n"), Some(42));
        assert_eq!(parse_decimal(b" 7"), Some(7));
        assert_eq!(parse_decimal(b"4294967295"), Some(u32::MAX));
        assert_eq!(parse_decimal(b"4294967296"), None);
        assert_eq!(parse_decimal(b"\r\n"), None);
        assert_eq!(parse_decimal(b""), None);
    }
}
