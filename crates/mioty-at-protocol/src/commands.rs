//! Commands that can be sent to the modem.
//!
//! Every command is an ASCII mnemonic (`AT-MEUI`, `ATZ`, `AT$TXOFF`, ...)
//! followed by one of four argument shapes:
//!
//! ```text
//! execute:    NAME\r
//! query:      NAME?\r
//! set int:    NAME=123\r
//! set bytes:  NAME=<len>\t<HEX>\x1A\r
//! ```

use std::fmt;

use crate::codec::{CR, SUB, TAB};
use crate::error::{ProtocolError, ProtocolResult};

/// Shortest accepted command name (`ATZ`, `ATI`).
pub const MIN_NAME_LENGTH: usize = 3;

/// Longest accepted command name (`AT$TXCMLP`, `AT$RXCONT`).
pub const MAX_NAME_LENGTH: usize = 9;

/// Default upper bound on an encoded command accepted by the modem.
pub const MAX_COMMAND_LENGTH: usize = 512;

/// Length of the protocol prefix stripped from a name when the modem echoes it.
pub const PREFIX_LENGTH: usize = 2;

/// Commands after which the modem never emits a status line.
pub const NO_ANSWER_COMMANDS: [&str; 4] = ["AT-RST", "ATZ", "AT-SBTL", "AT-SHDN"];

/// Argument shape of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Plain command without argument.
    Execute,
    /// Read the current value (`?`).
    Query,
    /// Set an unsigned integer value (`=<decimal>`).
    SetInt(u32),
    /// Set a byte array (`=<len>\t<HEX>` plus the binary terminator).
    SetBytes(Vec<u8>),
}

/// A single AT command, built per call and serialized once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    operation: Operation,
}

impl Command {
    /// Create a command, validating the name.
    pub fn new(name: impl Into<String>, operation: Operation) -> ProtocolResult<Command> {
        let name = name.into();
        if name.len() < MIN_NAME_LENGTH || name.len() > MAX_NAME_LENGTH {
            return Err(ProtocolError::InvalidCommand(format!(
                "name {:?} must be {}-{} characters",
                name, MIN_NAME_LENGTH, MAX_NAME_LENGTH
            )));
        }
        if !name.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(ProtocolError::InvalidCommand(format!(
                "name {:?} must be printable ASCII",
                name
            )));
        }
        Ok(Command { name, operation })
    }

    /// `NAME\r`
    pub fn execute(name: impl Into<String>) -> ProtocolResult<Command> {
        Command::new(name, Operation::Execute)
    }

    /// `NAME?\r`
    pub fn query(name: impl Into<String>) -> ProtocolResult<Command> {
        Command::new(name, Operation::Query)
    }

    /// `NAME=<value>\r`
    pub fn set_int(name: impl Into<String>, value: u32) -> ProtocolResult<Command> {
        Command::new(name, Operation::SetInt(value))
    }

    /// `NAME=<len>\t<HEX>\x1A\r`
    pub fn set_bytes(name: impl Into<String>, data: &[u8]) -> ProtocolResult<Command> {
        Command::new(name, Operation::SetBytes(data.to_vec()))
    }

    /// The command mnemonic.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as it appears in reply fields, without the `AT` prefix.
    pub fn field_name(&self) -> &str {
        &self.name[PREFIX_LENGTH..]
    }

    /// Whether the modem answers this command with a status line.
    pub fn expects_response(&self) -> bool {
        !NO_ANSWER_COMMANDS
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.name))
    }

    /// Encode the command for transmission, terminators included.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(self.name.as_bytes());
        match &self.operation {
            Operation::Execute => buf.push(CR),
            Operation::Query => {
                buf.push(b'?');
                buf.push(CR);
            }
            Operation::SetInt(value) => {
                buf.push(b'=');
                buf.extend_from_slice(value.to_string().as_bytes());
                buf.push(CR);
            }
            Operation::SetBytes(data) => {
                buf.push(b'=');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.push(TAB);
                buf.extend_from_slice(hex::encode_upper(data).as_bytes());
                buf.push(SUB);
                buf.push(CR);
            }
        }
        buf
    }

    /// Encode the command, failing if it would exceed `max` bytes.
    pub fn encode_with_limit(&self, max: usize) -> ProtocolResult<Vec<u8>> {
        let actual = self.encoded_len();
        if actual > max {
            return Err(ProtocolError::CommandTooLong { max, actual });
        }
        Ok(self.encode())
    }

    /// Number of bytes [`Command::encode`] produces.
    pub fn encoded_len(&self) -> usize {
        let arg_len = match &self.operation {
            Operation::Execute => 0,
            Operation::Query => 1,
            Operation::SetInt(value) => 1 + decimal_len(*value as usize),
            Operation::SetBytes(data) => 1 + decimal_len(data.len()) + 1 + data.len() * 2 + 1,
        };
        self.name.len() + arg_len + 1
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Operation::Execute => write!(f, "{}", self.name),
            Operation::Query => write!(f, "{}?", self.name),
            Operation::SetInt(value) => write!(f, "{}={}", self.name, value),
            Operation::SetBytes(data) => {
                write!(f, "{}={} {}", self.name, data.len(), hex::encode_upper(data))
            }
        }
    }
}

fn decimal_len(mut value: usize) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_execute() {
        let cmd = Command::execute("AT-MALO").unwrap();
        assert_eq!(cmd.encode(), b"AT-MALO\r");
    }

    #[test]
    fn test_encode_query() {
        let cmd = Command::query("AT-UTPL").unwrap();
        assert_eq!(cmd.encode(), b"AT-UTPL?\r");
    }

    #[test]
    fn test_encode_set_int() {
        assert_eq!(Command::set_int("AT-UTPL", 14).unwrap().encode(), b"AT-UTPL=14\r");
        assert_eq!(Command::set_int("AT-UM", 0).unwrap().encode(), b"AT-UM=0\r");
        assert_eq!(
            Command::set_int("AT$TXCU", u32::MAX).unwrap().encode(),
            b"AT$TXCU=4294967295\r"
        );
    }

    #[test]
    fn test_encode_set_bytes() {
        let cmd = Command::set_bytes("AT-U", &[0x01, 0xAB, 0xff]).unwrap();
        assert_eq!(cmd.encode(), b"AT-U=3\t01ABFF\x1a\r");
    }

    #[test]
    fn test_set_bytes_length_is_byte_count() {
        let data = [0x5Au8; 12];
        let encoded = Command::set_bytes("AT-MNWK", &data).unwrap().encode();
        assert!(encoded.starts_with(b"AT-MNWK=12\t"));
        assert!(encoded.ends_with(b"\x1a\r"));
        assert_eq!(encoded.len(), "AT-MNWK=12\t".len() + 24 + 2);
    }

    #[test]
    fn test_encoded_len_matches() {
        let cmds = [
            Command::execute("ATI").unwrap(),
            Command::query("AT-MEUI").unwrap(),
            Command::set_int("AT$RXCONT", 868_180_000).unwrap(),
            Command::set_bytes("AT-B", &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap(),
            Command::set_bytes("AT-U", &[]).unwrap(),
        ];
        for cmd in &cmds {
            assert_eq!(cmd.encoded_len(), cmd.encode().len(), "{}", cmd);
        }
    }

    #[test]
    fn test_encode_with_limit() {
        let cmd = Command::set_bytes("AT-U", &[0u8; 300]).unwrap();
        match cmd.encode_with_limit(MAX_COMMAND_LENGTH) {
            Err(ProtocolError::CommandTooLong { max, actual }) => {
                assert_eq!(max, MAX_COMMAND_LENGTH);
                assert_eq!(actual, cmd.encoded_len());
            }
            other => panic!("expected CommandTooLong, got {:?}", other),
        }
        let small = Command::set_bytes("AT-U", &[0u8; 8]).unwrap();
        assert_eq!(small.encode_with_limit(MAX_COMMAND_LENGTH).unwrap(), small.encode());
    }

    #[test]
    fn test_invalid_names() {
        assert!(Command::execute("AT").is_err());
        assert!(Command::execute("AT-TOOLONGX").is_err());
        assert!(Command::execute("AT U").is_err());
        assert!(Command::execute("AT-\r").is_err());
    }

    #[test]
    fn test_field_name_and_no_answer() {
        let cmd = Command::query("AT-MPCT").unwrap();
        assert_eq!(cmd.field_name(), "-MPCT");
        assert!(cmd.expects_response());
        assert!(!Command::execute("ATZ").unwrap().expects_response());
        assert!(!Command::execute("AT-RST").unwrap().expects_response());
    }
}
