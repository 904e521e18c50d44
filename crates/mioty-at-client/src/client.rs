//! Client for a MIOTY modem.
//!
//! The client owns the transport and runs one command/reply exchange at a
//! time. Every modem operation is a thin call into a handful of generic
//! helpers, parameterised by the field descriptors in [`crate::fields`].

use std::io;
use std::net::TcpStream;

use mioty_at_protocol::{
    read_response, Command, IoTransport, ProtocolError, ProtocolResult, Response, Transport,
};
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::fields::{self, BytesField, FlagField, IntField, StringField};

// ============================================================================
// Commands
// ============================================================================

const CMD_RESET: &str = "AT-RST";
const CMD_FACTORY_RESET: &str = "ATZ";
const CMD_START_BOOTLOADER: &str = "AT-SBTL";
const CMD_SHUTDOWN: &str = "AT-SHDN";

const CMD_SEND_UNI: &str = "AT-U";
const CMD_SEND_UNI_MPF: &str = "AT-UMPF";
const CMD_SEND_UNI_TRANSPARENT: &str = "AT-TU";
const CMD_SEND_BIDI: &str = "AT-B";
const CMD_SEND_BIDI_MPF: &str = "AT-BMPF";
const CMD_SEND_BIDI_TRANSPARENT: &str = "AT-TB";

const CMD_MAC_ATTACH: &str = "AT-MAOA";
const CMD_MAC_DETACH: &str = "AT-MDOA";
const CMD_MAC_ATTACH_LOCAL: &str = "AT-MALO";
const CMD_MAC_DETACH_LOCAL: &str = "AT-MDLO";

const CMD_TX_CONT_UNMODULATED: &str = "AT$TXCU";
const CMD_TX_CONT_MODULATED: &str = "AT$TXCMLP";
const CMD_TX_CONT_OFF: &str = "AT$TXOFF";
const CMD_RX_CONT: &str = "AT$RXCONT";
const CMD_RX_CONT_OFF: &str = "AT$RXOFF";

/// Length of the nonce carried by a MAC attach.
pub const ATTACH_NONCE_LEN: usize = 4;

// ============================================================================
// Results
// ============================================================================

/// Result of a bidirectional uplink.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Downlink {
    /// Downlink payload.
    pub data: Vec<u8>,
    /// Downlink MPF byte, 0 when absent.
    pub mpf: u8,
    /// Packet counter of the uplink.
    pub packet_counter: u32,
}

// ============================================================================
// Client
// ============================================================================

/// A client driving one modem over a [`Transport`].
pub struct MiotyClient<T> {
    transport: T,
    config: ClientConfig,

    // Statistics
    commands_sent: u32,
    commands_succeeded: u32,
    commands_failed: u32,
}

impl MiotyClient<IoTransport<TcpStream>> {
    /// Connect to a modem behind the TCP serial bridge named in `config`.
    pub fn connect(config: ClientConfig) -> io::Result<Self> {
        let stream = TcpStream::connect(&config.address)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_nodelay(true)?;
        debug!("connected to {}", config.address);
        Ok(MiotyClient::with_config(IoTransport::new(stream), config))
    }
}

impl<T: Transport> MiotyClient<T> {
    /// Create a client with the default configuration.
    pub fn new(transport: T) -> Self {
        MiotyClient::with_config(transport, ClientConfig::default())
    }

    /// Create a client with the given configuration.
    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        MiotyClient {
            transport,
            config,
            commands_sent: 0,
            commands_succeeded: 0,
            commands_failed: 0,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the number of commands sent.
    pub fn commands_sent(&self) -> u32 {
        self.commands_sent
    }

    /// Get the number of commands that succeeded.
    pub fn commands_succeeded(&self) -> u32 {
        self.commands_succeeded
    }

    /// Get the number of commands that failed.
    pub fn commands_failed(&self) -> u32 {
        self.commands_failed
    }

    // ========================================================================
    // Protocol Helpers
    // ========================================================================

    /// Encode and write a command.
    fn send(&mut self, cmd: &Command) -> ProtocolResult<()> {
        let frame = cmd.encode_with_limit(self.config.max_command_len)?;
        trace!("sending '{}' ({} bytes)", cmd, frame.len());
        self.transport
            .write(&frame)
            .map_err(ProtocolError::WriteFailed)?;
        self.commands_sent += 1;
        Ok(())
    }

    /// Send a command and read its reply, whatever its status.
    pub fn transact(&mut self, cmd: &Command) -> ProtocolResult<Response> {
        self.send(cmd)?;
        let response = read_response(&mut self.transport, self.config.chunk_size);
        if response.is_success() {
            self.commands_succeeded += 1;
            trace!("'{}' -> ok", cmd);
        } else {
            self.commands_failed += 1;
            warn!("'{}' failed: {}", cmd, response.status().return_code());
        }
        Ok(response)
    }

    /// Send a command and fail unless the modem reports success.
    pub fn execute(&mut self, cmd: &Command) -> ProtocolResult<Response> {
        let response = self.transact(cmd)?;
        response.check()?;
        Ok(response)
    }

    /// Send a command the modem never answers.
    pub fn send_no_answer(&mut self, cmd: &Command) -> ProtocolResult<()> {
        debug_assert!(!cmd.expects_response());
        self.send(cmd)?;
        debug!("'{}' sent, no reply expected", cmd);
        Ok(())
    }

    /// Read an integer setting.
    pub fn get_int(&mut self, field: IntField) -> ProtocolResult<u32> {
        let response = self.execute(&Command::query(field.command)?)?;
        response.int_field(field.command)
    }

    /// Write an integer setting.
    pub fn set_int(&mut self, field: IntField, value: u32) -> ProtocolResult<()> {
        if !field.accepts(value) {
            return Err(ProtocolError::InvalidCommand(format!(
                "{} value {} outside {}..={}",
                field.command, value, field.min, field.max
            )));
        }
        self.execute(&Command::set_int(field.command, value)?)?;
        Ok(())
    }

    /// Read a boolean setting.
    pub fn get_flag(&mut self, field: FlagField) -> ProtocolResult<bool> {
        let value = self.get_int(IntField::new(field.command))?;
        Ok(value != 0)
    }

    /// Write a boolean setting.
    pub fn set_flag(&mut self, field: FlagField, value: bool) -> ProtocolResult<()> {
        self.set_int(IntField::new(field.command), u32::from(value))
    }

    /// Read a fixed-size byte setting.
    pub fn get_bytes<const N: usize>(&mut self, field: BytesField<N>) -> ProtocolResult<[u8; N]> {
        let response = self.execute(&Command::query(field.command)?)?;
        let data = response.bytes_field(field.command, N)?;
        data.try_into().map_err(|data: Vec<u8>| {
            ProtocolError::ParseError(format!(
                "{} returned {} bytes, expected {}",
                field.command,
                data.len(),
                N
            ))
        })
    }

    /// Write a fixed-size byte setting.
    pub fn set_bytes<const N: usize>(
        &mut self,
        field: BytesField<N>,
        value: &[u8; N],
    ) -> ProtocolResult<()> {
        self.execute(&Command::set_bytes(field.command, value)?)?;
        Ok(())
    }

    /// Read a text value.
    pub fn get_string(&mut self, field: StringField) -> ProtocolResult<String> {
        let response = self.execute(&Command::execute(field.command)?)?;
        response.string_field(field.command)
    }

    /// Send a unidirectional uplink and return its packet counter.
    fn uplink(&mut self, command: &str, msg: &[u8]) -> ProtocolResult<u32> {
        let response = self.transact(&Command::set_bytes(command, msg)?)?;
        let packet_counter = response.packet_counter();
        response.check()?;
        debug!("{} uplink of {} bytes, packet counter {}", command, msg.len(), packet_counter);
        Ok(packet_counter)
    }

    /// Send a bidirectional uplink whose reply payload is named `reply`.
    fn bidi_uplink(
        &mut self,
        command: &str,
        reply: &str,
        msg: &[u8],
        with_mpf: bool,
    ) -> ProtocolResult<Downlink> {
        let response = self.transact(&Command::set_bytes(command, msg)?)?;
        let packet_counter = response.packet_counter();
        if let Err(e) = response.check() {
            debug!("{} failed after packet counter {}", command, packet_counter);
            return Err(e);
        }

        let data = response.bytes_field(reply, self.config.downlink_capacity)?;
        let mpf = if with_mpf { response.downlink_mpf() } else { 0 };
        debug!(
            "{} uplink of {} bytes, {} byte downlink, packet counter {}",
            command,
            msg.len(),
            data.len(),
            packet_counter
        );
        Ok(Downlink {
            data,
            mpf,
            packet_counter,
        })
    }

    /// Run a MAC attach/detach command and return the reported MAC state.
    fn mac_state_command(&mut self, cmd: &Command) -> ProtocolResult<u8> {
        let response = self.execute(cmd)?;
        Ok(response.mac_state())
    }

    // ========================================================================
    // Device Control
    // ========================================================================

    /// Soft reset; persistent settings keep their values.
    pub fn reset(&mut self) -> ProtocolResult<()> {
        self.send_no_answer(&Command::execute(CMD_RESET)?)
    }

    /// Reset to factory defaults.
    pub fn factory_reset(&mut self) -> ProtocolResult<()> {
        self.send_no_answer(&Command::execute(CMD_FACTORY_RESET)?)
    }

    /// Restart into the bootloader.
    pub fn start_bootloader(&mut self) -> ProtocolResult<()> {
        self.send_no_answer(&Command::execute(CMD_START_BOOTLOADER)?)
    }

    /// Shut down; the modem wakes only on TX_INH or RESET pin action.
    pub fn shutdown(&mut self) -> ProtocolResult<()> {
        self.send_no_answer(&Command::execute(CMD_SHUTDOWN)?)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn set_network_key(&mut self, key: &[u8; 16]) -> ProtocolResult<()> {
        self.set_bytes(fields::NETWORK_KEY, key)
    }

    pub fn ipv6_subnet_mask(&mut self) -> ProtocolResult<[u8; 8]> {
        self.get_bytes(fields::IPV6_SUBNET_MASK)
    }

    pub fn set_ipv6_subnet_mask(&mut self, mask: &[u8; 8]) -> ProtocolResult<()> {
        self.set_bytes(fields::IPV6_SUBNET_MASK, mask)
    }

    pub fn eui(&mut self) -> ProtocolResult<[u8; 8]> {
        self.get_bytes(fields::EUI)
    }

    pub fn set_eui(&mut self, eui: &[u8; 8]) -> ProtocolResult<()> {
        self.set_bytes(fields::EUI, eui)
    }

    pub fn short_address(&mut self) -> ProtocolResult<[u8; 2]> {
        self.get_bytes(fields::SHORT_ADDRESS)
    }

    pub fn set_short_address(&mut self, address: &[u8; 2]) -> ProtocolResult<()> {
        self.set_bytes(fields::SHORT_ADDRESS, address)
    }

    pub fn packet_counter(&mut self) -> ProtocolResult<u32> {
        self.get_int(fields::PACKET_COUNTER)
    }

    pub fn transmit_power(&mut self) -> ProtocolResult<u32> {
        self.get_int(fields::TRANSMIT_POWER)
    }

    /// Set the transmit power level (10..=100).
    pub fn set_transmit_power(&mut self, level: u32) -> ProtocolResult<()> {
        self.set_int(fields::TRANSMIT_POWER, level)
    }

    pub fn uplink_mode(&mut self) -> ProtocolResult<u32> {
        self.get_int(fields::UPLINK_MODE)
    }

    pub fn set_uplink_mode(&mut self, mode: u32) -> ProtocolResult<()> {
        self.set_int(fields::UPLINK_MODE, mode)
    }

    pub fn uplink_profile(&mut self) -> ProtocolResult<u32> {
        self.get_int(fields::UPLINK_PROFILE)
    }

    pub fn set_uplink_profile(&mut self, profile: u32) -> ProtocolResult<()> {
        self.set_int(fields::UPLINK_PROFILE, profile)
    }

    pub fn downlink_request_flag(&mut self) -> ProtocolResult<bool> {
        self.get_flag(fields::DOWNLINK_REQUEST)
    }

    pub fn set_downlink_request_flag(&mut self, flag: bool) -> ProtocolResult<()> {
        self.set_flag(fields::DOWNLINK_REQUEST, flag)
    }

    pub fn tx_inhibit(&mut self) -> ProtocolResult<bool> {
        self.get_flag(fields::TX_INHIBIT)
    }

    pub fn set_tx_inhibit(&mut self, enable: bool) -> ProtocolResult<()> {
        self.set_flag(fields::TX_INHIBIT, enable)
    }

    pub fn tx_active(&mut self) -> ProtocolResult<bool> {
        self.get_flag(fields::TX_ACTIVE)
    }

    pub fn set_tx_active(&mut self, enable: bool) -> ProtocolResult<()> {
        self.set_flag(fields::TX_ACTIVE, enable)
    }

    pub fn rx_active(&mut self) -> ProtocolResult<bool> {
        self.get_flag(fields::RX_ACTIVE)
    }

    pub fn set_rx_active(&mut self, enable: bool) -> ProtocolResult<()> {
        self.set_flag(fields::RX_ACTIVE, enable)
    }

    /// Whether the end-point is attached to a base station.
    pub fn attachment(&mut self) -> ProtocolResult<bool> {
        self.get_flag(fields::ATTACHMENT)
    }

    /// End-point information text.
    pub fn ep_info(&mut self) -> ProtocolResult<String> {
        self.get_string(fields::EP_INFO)
    }

    /// Core library version text.
    pub fn core_lib_info(&mut self) -> ProtocolResult<String> {
        self.get_string(fields::CORE_LIB_INFO)
    }

    // ========================================================================
    // Messaging
    // ========================================================================

    /// Send a unidirectional message; returns the packet counter.
    pub fn send_uni(&mut self, msg: &[u8]) -> ProtocolResult<u32> {
        self.uplink(CMD_SEND_UNI, msg)
    }

    /// Send a unidirectional message whose first byte is the MPF field.
    pub fn send_uni_mpf(&mut self, msg: &[u8]) -> ProtocolResult<u32> {
        self.uplink(CMD_SEND_UNI_MPF, msg)
    }

    /// Send a unidirectional message without MAC.
    pub fn send_uni_transparent(&mut self, msg: &[u8]) -> ProtocolResult<u32> {
        self.uplink(CMD_SEND_UNI_TRANSPARENT, msg)
    }

    /// Send a bidirectional message.
    ///
    /// A successful reply without a downlink payload line is a
    /// [`ProtocolError::MissingField`].
    pub fn send_bidi(&mut self, msg: &[u8]) -> ProtocolResult<Downlink> {
        self.bidi_uplink(CMD_SEND_BIDI, CMD_SEND_BIDI, msg, true)
    }

    /// Send a bidirectional message whose first byte is the MPF field.
    ///
    /// The modem reports the downlink under the plain `-B` tag.
    pub fn send_bidi_mpf(&mut self, msg: &[u8]) -> ProtocolResult<Downlink> {
        self.bidi_uplink(CMD_SEND_BIDI_MPF, CMD_SEND_BIDI, msg, true)
    }

    /// Send a bidirectional message without MAC; no MPF is reported.
    pub fn send_bidi_transparent(&mut self, msg: &[u8]) -> ProtocolResult<Downlink> {
        self.bidi_uplink(CMD_SEND_BIDI_TRANSPARENT, CMD_SEND_BIDI_TRANSPARENT, msg, false)
    }

    // ========================================================================
    // MAC Attachment
    // ========================================================================

    /// Over-the-air attach with a 4-byte nonce; returns the MAC state.
    pub fn mac_attach(&mut self, nonce: &[u8; ATTACH_NONCE_LEN]) -> ProtocolResult<u8> {
        self.mac_state_command(&Command::set_bytes(CMD_MAC_ATTACH, nonce)?)
    }

    /// Over-the-air detach carrying `data` to the base station.
    pub fn mac_detach(&mut self, data: &[u8]) -> ProtocolResult<u8> {
        self.mac_state_command(&Command::set_bytes(CMD_MAC_DETACH, data)?)
    }

    /// Local attach.
    pub fn mac_attach_local(&mut self) -> ProtocolResult<u8> {
        self.mac_state_command(&Command::execute(CMD_MAC_ATTACH_LOCAL)?)
    }

    /// Local detach.
    pub fn mac_detach_local(&mut self) -> ProtocolResult<u8> {
        self.mac_state_command(&Command::execute(CMD_MAC_DETACH_LOCAL)?)
    }

    // ========================================================================
    // Test Modes
    // ========================================================================

    /// Transmit an unmodulated carrier at `frequency` Hz.
    pub fn start_tx_cont_unmodulated(&mut self, frequency: u32) -> ProtocolResult<()> {
        self.execute(&Command::set_int(CMD_TX_CONT_UNMODULATED, frequency)?)?;
        Ok(())
    }

    /// Transmit a modulated carrier at `frequency` Hz.
    pub fn start_tx_cont_modulated(&mut self, frequency: u32) -> ProtocolResult<()> {
        self.execute(&Command::set_int(CMD_TX_CONT_MODULATED, frequency)?)?;
        Ok(())
    }

    pub fn stop_tx_cont(&mut self) -> ProtocolResult<()> {
        self.execute(&Command::execute(CMD_TX_CONT_OFF)?)?;
        Ok(())
    }

    /// Run the receiver continuously at `frequency` Hz.
    pub fn start_rx_cont(&mut self, frequency: u32) -> ProtocolResult<()> {
        self.execute(&Command::set_int(CMD_RX_CONT, frequency)?)?;
        Ok(())
    }

    pub fn stop_rx_cont(&mut self) -> ProtocolResult<()> {
        self.execute(&Command::execute(CMD_RX_CONT_OFF)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mioty_at_protocol::{ReturnCode, ScriptedTransport};

    fn client_with_reply(reply: &[u8]) -> MiotyClient<ScriptedTransport> {
        MiotyClient::new(ScriptedTransport::new().with_chunk(reply))
    }

    #[test]
    fn test_statistics() {
        let mut transport = ScriptedTransport::new();
        transport.push_chunk(b"0\r\n");
        transport.push_chunk(b"\r\n2\r\nAT!ERR:2\r\n");
        let mut client = MiotyClient::new(transport);

        client.stop_rx_cont().unwrap();
        let err = client.stop_tx_cont().unwrap_err();
        assert_eq!(err.return_code(), ReturnCode::AtCommandNotKnown);

        assert_eq!(client.commands_sent(), 2);
        assert_eq!(client.commands_succeeded(), 1);
        assert_eq!(client.commands_failed(), 1);
    }

    #[test]
    fn test_command_limit_enforced_before_write() {
        let config = ClientConfig {
            max_command_len: 16,
            ..ClientConfig::default()
        };
        let mut client = MiotyClient::with_config(ScriptedTransport::new(), config);
        let err = client.send_uni(&[0u8; 8]).unwrap_err();
        assert!(matches!(err, ProtocolError::CommandTooLong { max: 16, .. }));
        assert!(client.transport().written().is_empty());
        assert_eq!(client.commands_sent(), 0);
    }

    #[test]
    fn test_get_bytes_wrong_length() {
        let mut client = client_with_reply(b"-MSAD:1\t01\x1a\r\n\r\n0\r\n");
        assert!(matches!(client.short_address(), Err(ProtocolError::ParseError(_))));
    }

    #[test]
    fn test_transmit_power_out_of_range() {
        let mut client = client_with_reply(b"0\r\n");
        let err = client.set_transmit_power(5).unwrap_err();
        assert_eq!(err.return_code(), ReturnCode::ArgumentOutOfRange);
        assert!(client.transport().written().is_empty());
    }
}
