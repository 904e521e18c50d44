//! Return codes reported by the modem and by the codec itself.
//!
//! The numeric values are shared with the modem firmware: MAC-layer codes are
//! small integers, AT-layer codes are offset by [`AT_ERROR_BASE`].

// ============================================================================
// Numeric Codes
// ============================================================================

/// Success.
pub const RC_OK: u32 = 0;
/// Generic MAC error.
pub const RC_MAC_ERROR: u32 = 1;
/// MAC framing error.
pub const RC_MAC_FRAMING_ERROR: u32 = 2;
/// Argument size mismatch.
pub const RC_ARGUMENT_SIZE_MISMATCH: u32 = 3;
/// Argument out of range.
pub const RC_ARGUMENT_OUT_OF_RANGE: u32 = 4;
/// Buffer size insufficient.
pub const RC_BUFFER_SIZE_INSUFFICIENT: u32 = 5;
/// End-point not attached.
pub const RC_MAC_NODE_NOT_ATTACHED: u32 = 6;
/// Network key not set.
pub const RC_MAC_NETWORK_KEY_NOT_SET: u32 = 7;
/// Already attached.
pub const RC_MAC_ALREADY_ATTACHED: u32 = 8;
/// Generic error raised by the codec, not part of the modem protocol.
pub const RC_GENERIC_ERROR: u32 = 9;
/// Downlink not available.
pub const RC_MAC_DOWNLINK_NOT_AVAILABLE: u32 = 10;
/// Uplink packing error.
pub const RC_UPLINK_PACKING_ERROR: u32 = 11;
/// No downlink received, or the downlink acknowledge was corrupted.
pub const RC_MAC_NO_DOWNLINK_RECEIVED: u32 = 12;
/// Option not allowed.
pub const RC_MAC_OPTION_NOT_ALLOWED: u32 = 13;
/// Downlink CRC error.
pub const RC_MAC_DOWNLINK_ERROR: u32 = 14;
/// Defaults not set.
pub const RC_MAC_DEFAULTS_NOT_SET: u32 = 15;
/// Previous command not finished.
pub const RC_PREVIOUS_COMMAND_NOT_FINISHED: u32 = 18;
/// Downlink acknowledge ok, downlink data corrupted.
pub const RC_DOWNLINK_DATA_CORRUPTED: u32 = 22;
/// Feature not supported.
pub const RC_FEATURE_NOT_SUPPORTED: u32 = 100;

/// Base added to every `AT!ERR:` sub-code. On its own it means
/// "AT error, code unknown".
pub const AT_ERROR_BASE: u32 = 200;
/// Generic AT error.
pub const RC_AT_GENERIC_ERROR: u32 = 201;
/// Command not known.
pub const RC_AT_COMMAND_NOT_KNOWN: u32 = 202;
/// Parameter out of bounds.
pub const RC_AT_PARAM_OUT_OF_BOUNDS: u32 = 203;
/// Data size mismatch.
pub const RC_AT_DATA_SIZE_MISMATCH: u32 = 204;
/// Unexpected character.
pub const RC_AT_UNEXPECTED_CHAR: u32 = 206;
/// Invalid argument.
pub const RC_AT_ARGUMENT_INVALID: u32 = 207;
/// Reading data from the transport failed.
pub const RC_READ_FAILED: u32 = 208;

// ============================================================================
// ReturnCode
// ============================================================================

/// A return code from the MAC layer, the AT layer or the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Ok,
    MacError,
    MacFramingError,
    ArgumentSizeMismatch,
    ArgumentOutOfRange,
    BufferSizeInsufficient,
    MacNodeNotAttached,
    MacNetworkKeyNotSet,
    MacAlreadyAttached,
    /// An error status line was seen but its code could not be located.
    GenericError,
    MacDownlinkNotAvailable,
    UplinkPackingError,
    MacNoDownlinkReceived,
    MacOptionNotAllowed,
    MacDownlinkError,
    MacDefaultsNotSet,
    PreviousCommandNotFinished,
    DownlinkDataCorrupted,
    FeatureNotSupported,
    /// AT error without a readable sub-code.
    AtError,
    AtGenericError,
    AtCommandNotKnown,
    AtParamOutOfBounds,
    AtDataSizeMismatch,
    AtUnexpectedChar,
    AtArgumentInvalid,
    /// The transport reported a read failure.
    ReadFailed,
    /// A code the modem sent that this table does not name.
    Unknown(u32),
}

impl ReturnCode {
    /// Numeric value of the code.
    pub fn code(&self) -> u32 {
        (*self).into()
    }

    /// True for codes in the AT-layer range.
    pub fn is_at_layer(&self) -> bool {
        let code = self.code();
        (AT_ERROR_BASE..AT_ERROR_BASE + 100).contains(&code) && code != RC_READ_FAILED
    }

    /// Build the final code for an `AT!ERR:` sub-code.
    pub fn from_at_subcode(subcode: u32) -> ReturnCode {
        ReturnCode::from(subcode.saturating_add(AT_ERROR_BASE))
    }
}

impl From<u32> for ReturnCode {
    fn from(code: u32) -> Self {
        match code {
            RC_OK => ReturnCode::Ok,
            RC_MAC_ERROR => ReturnCode::MacError,
            RC_MAC_FRAMING_ERROR => ReturnCode::MacFramingError,
            RC_ARGUMENT_SIZE_MISMATCH => ReturnCode::ArgumentSizeMismatch,
            RC_ARGUMENT_OUT_OF_RANGE => ReturnCode::ArgumentOutOfRange,
            RC_BUFFER_SIZE_INSUFFICIENT => ReturnCode::BufferSizeInsufficient,
            RC_MAC_NODE_NOT_ATTACHED => ReturnCode::MacNodeNotAttached,
            RC_MAC_NETWORK_KEY_NOT_SET => ReturnCode::MacNetworkKeyNotSet,
            RC_MAC_ALREADY_ATTACHED => ReturnCode::MacAlreadyAttached,
            RC_GENERIC_ERROR => ReturnCode::GenericError,
            RC_MAC_DOWNLINK_NOT_AVAILABLE => ReturnCode::MacDownlinkNotAvailable,
            RC_UPLINK_PACKING_ERROR => ReturnCode::UplinkPackingError,
            RC_MAC_NO_DOWNLINK_RECEIVED => ReturnCode::MacNoDownlinkReceived,
            RC_MAC_OPTION_NOT_ALLOWED => ReturnCode::MacOptionNotAllowed,
            RC_MAC_DOWNLINK_ERROR => ReturnCode::MacDownlinkError,
            RC_MAC_DEFAULTS_NOT_SET => ReturnCode::MacDefaultsNotSet,
            RC_PREVIOUS_COMMAND_NOT_FINISHED => ReturnCode::PreviousCommandNotFinished,
            RC_DOWNLINK_DATA_CORRUPTED => ReturnCode::DownlinkDataCorrupted,
            RC_FEATURE_NOT_SUPPORTED => ReturnCode::FeatureNotSupported,
            AT_ERROR_BASE => ReturnCode::AtError,
            RC_AT_GENERIC_ERROR => ReturnCode::AtGenericError,
            RC_AT_COMMAND_NOT_KNOWN => ReturnCode::AtCommandNotKnown,
            RC_AT_PARAM_OUT_OF_BOUNDS => ReturnCode::AtParamOutOfBounds,
            RC_AT_DATA_SIZE_MISMATCH => ReturnCode::AtDataSizeMismatch,
            RC_AT_UNEXPECTED_CHAR => ReturnCode::AtUnexpectedChar,
            RC_AT_ARGUMENT_INVALID => ReturnCode::AtArgumentInvalid,
            RC_READ_FAILED => ReturnCode::ReadFailed,
            _ => ReturnCode::Unknown(code),
        }
    }
}

impl From<ReturnCode> for u32 {
    fn from(code: ReturnCode) -> Self {
        match code {
            ReturnCode::Ok => RC_OK,
            ReturnCode::MacError => RC_MAC_ERROR,
            ReturnCode::MacFramingError => RC_MAC_FRAMING_ERROR,
            ReturnCode::ArgumentSizeMismatch => RC_ARGUMENT_SIZE_MISMATCH,
            ReturnCode::ArgumentOutOfRange => RC_ARGUMENT_OUT_OF_RANGE,
            ReturnCode::BufferSizeInsufficient => RC_BUFFER_SIZE_INSUFFICIENT,
            ReturnCode::MacNodeNotAttached => RC_MAC_NODE_NOT_ATTACHED,
            ReturnCode::MacNetworkKeyNotSet => RC_MAC_NETWORK_KEY_NOT_SET,
            ReturnCode::MacAlreadyAttached => RC_MAC_ALREADY_ATTACHED,
            ReturnCode::GenericError => RC_GENERIC_ERROR,
            ReturnCode::MacDownlinkNotAvailable => RC_MAC_DOWNLINK_NOT_AVAILABLE,
            ReturnCode::UplinkPackingError => RC_UPLINK_PACKING_ERROR,
            ReturnCode::MacNoDownlinkReceived => RC_MAC_NO_DOWNLINK_RECEIVED,
            ReturnCode::MacOptionNotAllowed => RC_MAC_OPTION_NOT_ALLOWED,
            ReturnCode::MacDownlinkError => RC_MAC_DOWNLINK_ERROR,
            ReturnCode::MacDefaultsNotSet => RC_MAC_DEFAULTS_NOT_SET,
            ReturnCode::PreviousCommandNotFinished => RC_PREVIOUS_COMMAND_NOT_FINISHED,
            ReturnCode::DownlinkDataCorrupted => RC_DOWNLINK_DATA_CORRUPTED,
            ReturnCode::FeatureNotSupported => RC_FEATURE_NOT_SUPPORTED,
            ReturnCode::AtError => AT_ERROR_BASE,
            ReturnCode::AtGenericError => RC_AT_GENERIC_ERROR,
            ReturnCode::AtCommandNotKnown => RC_AT_COMMAND_NOT_KNOWN,
            ReturnCode::AtParamOutOfBounds => RC_AT_PARAM_OUT_OF_BOUNDS,
            ReturnCode::AtDataSizeMismatch => RC_AT_DATA_SIZE_MISMATCH,
            ReturnCode::AtUnexpectedChar => RC_AT_UNEXPECTED_CHAR,
            ReturnCode::AtArgumentInvalid => RC_AT_ARGUMENT_INVALID,
            ReturnCode::ReadFailed => RC_READ_FAILED,
            ReturnCode::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ReturnCode::Ok => "ok",
            ReturnCode::MacError => "generic MAC error",
            ReturnCode::MacFramingError => "MAC framing error",
            ReturnCode::ArgumentSizeMismatch => "argument size mismatch",
            ReturnCode::ArgumentOutOfRange => "argument out of range",
            ReturnCode::BufferSizeInsufficient => "buffer size insufficient",
            ReturnCode::MacNodeNotAttached => "end-point not attached",
            ReturnCode::MacNetworkKeyNotSet => "network key not set",
            ReturnCode::MacAlreadyAttached => "already attached",
            ReturnCode::GenericError => "generic error",
            ReturnCode::MacDownlinkNotAvailable => "downlink not available",
            ReturnCode::UplinkPackingError => "uplink packing error",
            ReturnCode::MacNoDownlinkReceived => "no downlink received",
            ReturnCode::MacOptionNotAllowed => "option not allowed",
            ReturnCode::MacDownlinkError => "downlink CRC error",
            ReturnCode::MacDefaultsNotSet => "defaults not set",
            ReturnCode::PreviousCommandNotFinished => "previous command not finished",
            ReturnCode::DownlinkDataCorrupted => "downlink data corrupted",
            ReturnCode::FeatureNotSupported => "feature not supported",
            ReturnCode::AtError => "AT error, code unknown",
            ReturnCode::AtGenericError => "generic AT error",
            ReturnCode::AtCommandNotKnown => "command not known",
            ReturnCode::AtParamOutOfBounds => "parameter out of bounds",
            ReturnCode::AtDataSizeMismatch => "data size mismatch",
            ReturnCode::AtUnexpectedChar => "unexpected character",
            ReturnCode::AtArgumentInvalid => "invalid argument",
            ReturnCode::ReadFailed => "reading data failed",
            ReturnCode::Unknown(code) => return write!(f, "unknown code ({})", code),
        };
        write!(f, "{} ({})", text, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_codes_round_trip() {
        for code in [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 18, 22, 100,
            200, 201, 202, 203, 204, 206, 207, 208]
        {
            let rc = ReturnCode::from(code);
            assert!(!matches!(rc, ReturnCode::Unknown(_)), "code {} should be named", code);
            assert_eq!(rc.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_preserved() {
        assert_eq!(ReturnCode::from(17), ReturnCode::Unknown(17));
        assert_eq!(ReturnCode::from(205).code(), 205);
    }

    #[test]
    fn test_at_subcode_offset() {
        assert_eq!(ReturnCode::from_at_subcode(3), ReturnCode::AtParamOutOfBounds);
        assert_eq!(ReturnCode::from_at_subcode(0), ReturnCode::AtError);
        assert!(ReturnCode::AtCommandNotKnown.is_at_layer());
        assert!(!ReturnCode::ReadFailed.is_at_layer());
        assert!(!ReturnCode::MacNodeNotAttached.is_at_layer());
    }

    #[test]
    fn test_display() {
        assert_eq!(ReturnCode::MacNodeNotAttached.to_string(), "end-point not attached (6)");
        assert_eq!(ReturnCode::Unknown(42).to_string(), "unknown code (42)");
    }
}
