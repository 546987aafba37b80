//! Transport configuration
//!
//! Fixed when the communication stack is constructed; not mutable during a
//! session. Defaults match the host driver.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cobs::{DELIMITER, MAX_PAYLOAD_SIZE};

/// Default packet start byte
pub const DEFAULT_START_BYTE: u8 = 129;

/// Default time a started packet may take to arrive completely (µs)
pub const DEFAULT_TIMEOUT_US: u32 = 20_000;

/// Serial buffer bytes reserved for framing around the payload
pub const RESERVED_NON_PAYLOAD_SIZE: usize = 6;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Maximum payload size is 0 or above 254
    InvalidPayloadSize,
    /// Start byte collides with the packet delimiter
    StartByteIsDelimiter,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPayloadSize => {
                write!(f, "maximum payload size must be 1..={}", MAX_PAYLOAD_SIZE)
            }
            ConfigError::StartByteIsDelimiter => {
                write!(f, "start byte must differ from the delimiter")
            }
        }
    }
}

/// CRC parameters
///
/// Values are truncated to the CRC width selected by the transport's word type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CrcConfig {
    /// Generator polynomial (normal form)
    pub polynomial: u32,
    /// Register value before the first byte
    pub initial_value: u32,
    /// Value XORed into the final register
    pub final_xor: u32,
}

impl Default for CrcConfig {
    fn default() -> Self {
        Self {
            polynomial: 0x1021,
            initial_value: 0xFFFF,
            final_xor: 0x0000,
        }
    }
}

/// Transport layer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransportConfig {
    /// Byte that opens every packet
    pub start_byte: u8,
    /// Largest payload accepted or produced (1-254)
    pub max_payload_size: u8,
    /// Reception timeout after the start byte (µs)
    pub timeout_us: u32,
    /// Checksum parameters
    pub crc: CrcConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            start_byte: DEFAULT_START_BYTE,
            max_payload_size: MAX_PAYLOAD_SIZE as u8,
            timeout_us: DEFAULT_TIMEOUT_US,
            crc: CrcConfig::default(),
        }
    }
}

impl TransportConfig {
    /// Derive the payload limit from the controller's serial buffer size
    ///
    /// The whole packet must fit the hardware buffer, so the payload gets
    /// what is left after framing, capped at 254 bytes.
    pub fn for_serial_buffer(serial_buffer_size: usize) -> Self {
        let max = serial_buffer_size
            .saturating_sub(RESERVED_NON_PAYLOAD_SIZE)
            .min(MAX_PAYLOAD_SIZE);
        Self {
            max_payload_size: max as u8,
            ..Self::default()
        }
    }

    /// Check the configuration for values the transport cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_size == 0 || usize::from(self.max_payload_size) > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::InvalidPayloadSize);
        }
        if self.start_byte == DELIMITER {
            return Err(ConfigError::StartByteIsDelimiter);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TransportConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.start_byte, 129);
        assert_eq!(config.max_payload_size, 254);
    }

    #[test]
    fn test_for_serial_buffer() {
        assert_eq!(TransportConfig::for_serial_buffer(64).max_payload_size, 58);
        assert_eq!(TransportConfig::for_serial_buffer(1024).max_payload_size, 254);
        assert_eq!(
            TransportConfig::for_serial_buffer(4).validate(),
            Err(ConfigError::InvalidPayloadSize)
        );
    }

    #[test]
    fn test_start_byte_must_not_be_delimiter() {
        let config = TransportConfig {
            start_byte: DELIMITER,
            ..TransportConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StartByteIsDelimiter));
    }

    #[test]
    fn test_payload_size_bounds() {
        let config = TransportConfig {
            max_payload_size: 255,
            ..TransportConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPayloadSize));
    }
}
