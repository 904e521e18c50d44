//! Completed replies and the fields that can be read from them.
//!
//! A reply is the full text the modem sent for one command, up to and
//! including its status line. Fields are located by marker:
//!
//! - `-TAG:value` lines, where `-TAG` is the command name without `AT`
//! - hex payloads, `-TAG:<len>\t<HEX>\x1A\r`
//! - named sub-fields: `-MPCT:` (packet counter), `-DLMPF:1\t` (downlink MPF),
//!   `-MSTA:` (MAC state)

use bytes::Bytes;

use crate::codec::{find, find_reply_field, parse_decimal, BINARY_TERMINATOR, CR, TAB};
use crate::commands::PREFIX_LENGTH;
use crate::error::{ProtocolError, ProtocolResult};
use crate::return_code::ReturnCode;

/// Marker of the packet counter sub-field.
pub const PACKET_COUNTER_FIELD: &[u8] = b"-MPCT:";
/// Marker of the downlink MPF sub-field, followed by one hex byte.
pub const DOWNLINK_MPF_FIELD: &[u8] = b"-DLMPF:1\t";
/// Marker of the MAC state sub-field.
pub const MAC_STATE_FIELD: &[u8] = b"-MSTA:";

/// Separates a field name from its value.
const FIELD_SEPARATOR: u8 = b':';

/// Terminal classification of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `0` status line.
    Success,
    /// `1` status line with the MAC error code.
    MacError(ReturnCode),
    /// `2` status line with the AT error code, already offset by 200.
    AtError(ReturnCode),
    /// The transport failed before a status line arrived.
    TransportFailure,
}

impl Status {
    /// The numeric return code for this status.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            Status::Success => ReturnCode::Ok,
            Status::MacError(code) | Status::AtError(code) => *code,
            Status::TransportFailure => ReturnCode::ReadFailed,
        }
    }

    /// Convert a non-success status into its error.
    pub fn check(&self) -> ProtocolResult<()> {
        match self {
            Status::Success => Ok(()),
            Status::MacError(code) => Err(ProtocolError::Mac(*code)),
            Status::AtError(code) => Err(ProtocolError::At(*code)),
            Status::TransportFailure => Err(ProtocolError::ReadFailed),
        }
    }
}

/// The complete reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    /// Upper-cased text.
    text: Bytes,
    /// Text as received.
    raw: Bytes,
}

impl Response {
    pub(crate) fn new(status: Status, text: Bytes, raw: Bytes) -> Self {
        debug_assert_eq!(text.len(), raw.len());
        Response { status, text, raw }
    }

    /// The terminal status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Check if the modem reported success.
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Convert a non-success status into its error.
    pub fn check(&self) -> ProtocolResult<()> {
        self.status.check()
    }

    /// The reply bytes as received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Integer value of the field named after `command`.
    ///
    /// Looks for the command name without its `AT` prefix, skips one
    /// separator and parses the digits that follow. A field with no digits
    /// reads as 0.
    pub fn int_field(&self, command: &str) -> ProtocolResult<u32> {
        let start = self.value_start(command)?;
        let value = &self.text[start.min(self.text.len())..];
        let has_digits = value
            .iter()
            .find(|&&b| b != b' ' && b != TAB)
            .map_or(false, |b| b.is_ascii_digit());
        match parse_decimal(value) {
            Some(v) => Ok(v),
            None if !has_digits => Ok(0),
            None => Err(ProtocolError::ParseError(format!(
                "{} value does not fit in 32 bits",
                command
            ))),
        }
    }

    /// Hex payload of the field named after `command`.
    ///
    /// The payload starts after the first tab following the name and ends at
    /// the binary terminator. Without a terminator, at most `capacity` bytes
    /// of leading hex digits are decoded.
    pub fn bytes_field(&self, command: &str, capacity: usize) -> ProtocolResult<Vec<u8>> {
        let name_end = self.value_start(command)?.saturating_sub(1);
        let tab = find(&self.text[name_end..], &[TAB])
            .ok_or_else(|| ProtocolError::MissingField(format!("{} payload", command)))?;
        let data = &self.text[name_end + tab + 1..];

        let hex_len = match find(data, BINARY_TERMINATOR) {
            Some(end) => {
                let needed = end / 2;
                if needed > capacity {
                    return Err(ProtocolError::BufferTooSmall { capacity, needed });
                }
                end
            }
            None => {
                let digits = data.iter().take_while(|b| b.is_ascii_hexdigit()).count();
                digits.min(capacity.saturating_mul(2))
            }
        };

        hex::decode(&data[..hex_len & !1]).map_err(|e| ProtocolError::InvalidHex(e.to_string()))
    }

    /// String value of the field named after `command`.
    ///
    /// Skips one separator after the name and returns the bytes as received up
    /// to the next carriage return.
    pub fn string_field(&self, command: &str) -> ProtocolResult<String> {
        let start = self.value_start(command)?.min(self.raw.len());
        let value = &self.raw[start..];
        let end = find(value, &[CR]).unwrap_or(value.len());
        Ok(String::from_utf8_lossy(&value[..end]).into_owned())
    }

    /// Packet counter reported after an uplink, 0 if absent.
    pub fn packet_counter(&self) -> u32 {
        self.sub_field(PACKET_COUNTER_FIELD)
            .and_then(parse_decimal)
            .unwrap_or(0)
    }

    /// Downlink MPF byte, 0 if no downlink MPF was reported.
    pub fn downlink_mpf(&self) -> u8 {
        self.sub_field(DOWNLINK_MPF_FIELD)
            .filter(|value| value.len() >= 2)
            .and_then(|value| hex::decode(&value[..2]).ok())
            .map_or(0, |bytes| bytes[0])
    }

    /// MAC state after attach or detach, 0 if absent.
    pub fn mac_state(&self) -> u8 {
        self.sub_field(MAC_STATE_FIELD)
            .and_then(parse_decimal)
            .and_then(|v| u8::try_from(v).ok())
            .unwrap_or(0)
    }

    /// Text following a named sub-field marker.
    fn sub_field(&self, marker: &[u8]) -> Option<&[u8]> {
        find_reply_field(&self.text, marker).map(|pos| &self.text[pos + marker.len()..])
    }

    /// Offset of the value after `<name without AT>:`.
    ///
    /// Matches inside the echoed command line are ignored, so a reply that
    /// only echoes `AT-UTPL?` has no `UTPL` field.
    fn value_start(&self, command: &str) -> ProtocolResult<usize> {
        let mut marker = command
            .get(PREFIX_LENGTH..)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ProtocolError::InvalidCommand(command.to_string()))?
            .to_ascii_uppercase()
            .into_bytes();
        let name_len = marker.len();
        marker.push(FIELD_SEPARATOR);

        let pos = find_reply_field(&self.text, &marker)
            .ok_or_else(|| ProtocolError::MissingField(command.to_string()))?;
        Ok(pos + name_len + 1)
    }
}
