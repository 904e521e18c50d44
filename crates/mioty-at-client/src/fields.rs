//! Modem settings addressable with get/set commands.
//!
//! Each setting is described once by its command name and value shape; the
//! generic helpers on [`MiotyClient`](crate::MiotyClient) do the rest.

// ============================================================================
// Field Descriptors
// ============================================================================

/// An unsigned integer setting (`NAME?` / `NAME=<decimal>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntField {
    /// Command name.
    pub command: &'static str,
    /// Smallest accepted value when setting.
    pub min: u32,
    /// Largest accepted value when setting.
    pub max: u32,
}

impl IntField {
    /// An integer field accepting any `u32`.
    pub const fn new(command: &'static str) -> Self {
        IntField {
            command,
            min: 0,
            max: u32::MAX,
        }
    }

    /// Restrict the values accepted when setting.
    pub const fn with_range(self, min: u32, max: u32) -> Self {
        IntField { min, max, ..self }
    }

    /// Whether `value` may be written to this field.
    pub fn accepts(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// A boolean setting carried as `0`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagField {
    /// Command name.
    pub command: &'static str,
}

impl FlagField {
    pub const fn new(command: &'static str) -> Self {
        FlagField { command }
    }
}

/// A fixed-size byte setting carried as hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BytesField<const N: usize> {
    /// Command name.
    pub command: &'static str,
}

impl<const N: usize> BytesField<N> {
    pub const fn new(command: &'static str) -> Self {
        BytesField { command }
    }

    /// Size of the value in bytes.
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

/// A read-only text value (`NAME` answered with `-TAG:text`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringField {
    /// Command name.
    pub command: &'static str,
}

impl StringField {
    pub const fn new(command: &'static str) -> Self {
        StringField { command }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Network key, write-only (`AT-MNWK`).
pub const NETWORK_KEY: BytesField<16> = BytesField::new("AT-MNWK");
/// IPv6 subnet mask (`AT-MIP6`).
pub const IPV6_SUBNET_MASK: BytesField<8> = BytesField::new("AT-MIP6");
/// EUI-64 of the end-point (`AT-MEUI`).
pub const EUI: BytesField<8> = BytesField::new("AT-MEUI");
/// Short address (`AT-MSAD`).
pub const SHORT_ADDRESS: BytesField<2> = BytesField::new("AT-MSAD");

/// Uplink packet counter, read-only (`AT-MPCT`).
pub const PACKET_COUNTER: IntField = IntField::new("AT-MPCT");
/// Uplink transmit power level (`AT-UTPL`).
pub const TRANSMIT_POWER: IntField = IntField::new("AT-UTPL").with_range(10, 100);
/// Uplink mode (`AT-UM`).
pub const UPLINK_MODE: IntField = IntField::new("AT-UM");
/// Uplink profile (`AT-UP`).
pub const UPLINK_PROFILE: IntField = IntField::new("AT-UP");

/// Whether the end-point is attached, read-only (`AT-MAS`).
pub const ATTACHMENT: FlagField = FlagField::new("AT-MAS");
/// Request a downlink response on the next uplink (`AT-MRDR`).
pub const DOWNLINK_REQUEST: FlagField = FlagField::new("AT-MRDR");
/// TX inhibit function (`AT-TXINH`).
pub const TX_INHIBIT: FlagField = FlagField::new("AT-TXINH");
/// TX active indication (`AT-TXACT`).
pub const TX_ACTIVE: FlagField = FlagField::new("AT-TXACT");
/// RX active indication (`AT-RXACT`).
pub const RX_ACTIVE: FlagField = FlagField::new("AT-RXACT");

/// End-point information (`ATI`).
pub const EP_INFO: StringField = StringField::new("ATI");
/// Core library version (`AT-LIBV`).
pub const CORE_LIB_INFO: StringField = StringField::new("AT-LIBV");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transmit_power_range() {
        assert!(TRANSMIT_POWER.accepts(10));
        assert!(TRANSMIT_POWER.accepts(100));
        assert!(!TRANSMIT_POWER.accepts(9));
        assert!(!TRANSMIT_POWER.accepts(101));
        assert!(UPLINK_MODE.accepts(u32::MAX));
    }

    #[test]
    fn test_field_sizes() {
        assert_eq!(NETWORK_KEY.len(), 16);
        assert_eq!(EUI.len(), 8);
        assert_eq!(SHORT_ADDRESS.len(), 2);
    }
}
