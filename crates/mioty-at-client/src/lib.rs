//! MIOTY AT Client
//!
//! High-level access to a MIOTY modem: one method per modem operation, built
//! on the codec in [`mioty_at_protocol`].
//!
//! ```rust
//! use mioty_at_client::MiotyClient;
//! use mioty_at_protocol::ScriptedTransport;
//!
//! let transport = ScriptedTransport::new().with_chunk(b"AT-MPCT?\r\n-MPCT:42\r\n\r\n0\r\n");
//! let mut client = MiotyClient::new(transport);
//!
//! assert_eq!(client.packet_counter().unwrap(), 42);
//! assert_eq!(client.transport().written(), b"AT-MPCT?\r");
//! ```

pub mod client;
pub mod config;
pub mod fields;

pub use client::{Downlink, MiotyClient, ATTACH_NONCE_LEN};
pub use config::{ClientConfig, ConfigError};
