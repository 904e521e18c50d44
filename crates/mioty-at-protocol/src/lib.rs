//! MIOTY AT Protocol
//!
//! This crate provides the codec for talking to a MIOTY radio modem over its
//! textual AT interface: building command lines and turning the modem's
//! streamed replies into a status plus the fields the caller asked for.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → modem): an ASCII mnemonic terminated with `\r`,
//!   optionally carrying `?`, `=<decimal>` or a hex payload
//!   `=<len>\t<HEX>\x1A\r`.
//! - **Replies** (modem → host): free-form lines ending in a status line,
//!   `\r\n0\r\n` (success), `\r\n1\r\n` (MAC error) or `\r\n2\r\n` (AT error).
//! - **Fields**: `-TAG:value` lines and hex payloads, matched
//!   case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use mioty_at_protocol::{read_response, Command, ScriptedTransport, Status, Transport};
//!
//! let mut transport = ScriptedTransport::new().with_chunk(b"-UTPL:14\r\n\r\n0\r\n");
//!
//! let cmd = Command::query("AT-UTPL").unwrap();
//! transport.write(&cmd.encode()).unwrap();
//!
//! let response = read_response(&mut transport, 30);
//! assert_eq!(response.status(), Status::Success);
//! assert_eq!(response.int_field(cmd.name()).unwrap(), 14);
//! ```

mod codec;
mod commands;
mod error;
mod responses;
mod return_code;
mod transport;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use responses::*;
pub use return_code::*;
pub use transport::*;
