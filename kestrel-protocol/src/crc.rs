//! Table-driven CRC over the encoded packet
//!
//! The checksum covers the COBS overhead byte through the delimiter and is
//! appended big-endian, whatever the host byte order. Width is chosen by the
//! word type: `u8`, `u16` or `u32`. Reflection is not supported; neither
//! endpoint uses it.

use core::fmt;

use crate::config::CrcConfig;

mod private {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// Unsigned word holding a CRC of a given width
pub trait CrcWord: Copy + Eq + Default + fmt::Debug + private::Sealed {
    /// Width in bytes (1, 2 or 4)
    const WIDTH: usize;

    /// Truncate a 32-bit value to this width
    fn from_u32(value: u32) -> Self;

    /// Widen to 32 bits
    fn to_u32(self) -> u32;
}

impl CrcWord for u8 {
    const WIDTH: usize = 1;

    fn from_u32(value: u32) -> Self {
        value as u8
    }

    fn to_u32(self) -> u32 {
        u32::from(self)
    }
}

impl CrcWord for u16 {
    const WIDTH: usize = 2;

    fn from_u32(value: u32) -> Self {
        value as u16
    }

    fn to_u32(self) -> u32 {
        u32::from(self)
    }
}

impl CrcWord for u32 {
    const WIDTH: usize = 4;

    fn from_u32(value: u32) -> Self {
        value
    }

    fn to_u32(self) -> u32 {
        self
    }
}

/// CRC calculator with a precomputed lookup table
#[derive(Debug, Clone)]
pub struct CrcProcessor<W: CrcWord> {
    table: [W; 256],
    initial_value: W,
    final_xor: W,
}

impl<W: CrcWord> CrcProcessor<W> {
    const BITS: u32 = (W::WIDTH * 8) as u32;
    const MASK: u32 = u32::MAX >> (32 - Self::BITS);
    const TOP_BIT: u32 = 1 << (Self::BITS - 1);

    /// Create a processor for the given polynomial, initial value and final XOR
    pub fn new(polynomial: W, initial_value: W, final_xor: W) -> Self {
        let poly = polynomial.to_u32();
        let mut table = [W::default(); 256];
        for (byte, entry) in table.iter_mut().enumerate() {
            let mut crc = (byte as u32) << (Self::BITS - 8);
            for _ in 0..8 {
                crc = if crc & Self::TOP_BIT != 0 {
                    (crc << 1) ^ poly
                } else {
                    crc << 1
                };
            }
            *entry = W::from_u32(crc & Self::MASK);
        }

        Self {
            table,
            initial_value,
            final_xor,
        }
    }

    /// Create a processor from configuration values, truncated to `W`
    pub fn from_config(config: &CrcConfig) -> Self {
        Self::new(
            W::from_u32(config.polynomial),
            W::from_u32(config.initial_value),
            W::from_u32(config.final_xor),
        )
    }

    /// Compute the checksum of `data`
    pub fn checksum(&self, data: &[u8]) -> W {
        let mut crc = self.initial_value.to_u32();
        for &byte in data {
            let index = ((crc >> (Self::BITS - 8)) ^ u32::from(byte)) & 0xFF;
            crc = ((crc << 8) ^ self.table[index as usize].to_u32()) & Self::MASK;
        }
        W::from_u32(crc ^ self.final_xor.to_u32())
    }

    /// Write `value` big-endian at `offset`
    ///
    /// Returns the offset just past the checksum, or `None` if it does not fit.
    pub fn write_checksum(&self, buffer: &mut [u8], offset: usize, value: W) -> Option<usize> {
        let end = offset.checked_add(W::WIDTH)?;
        let slot = buffer.get_mut(offset..end)?;
        let bytes = value.to_u32().to_be_bytes();
        slot.copy_from_slice(&bytes[4 - W::WIDTH..]);
        Some(end)
    }

    /// Read a big-endian checksum stored at `offset`
    pub fn read_checksum(&self, buffer: &[u8], offset: usize) -> Option<W> {
        let slot = buffer.get(offset..offset.checked_add(W::WIDTH)?)?;
        let value = slot
            .iter()
            .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte));
        Some(W::from_u32(value))
    }

    /// Check that `packet[..data_len]` matches the checksum stored right after it
    pub fn verify(&self, packet: &[u8], data_len: usize) -> bool {
        match (packet.get(..data_len), self.read_checksum(packet, data_len)) {
            (Some(data), Some(stored)) => self.checksum(data) == stored,
            _ => false,
        }
    }
}

impl Default for CrcProcessor<u16> {
    fn default() -> Self {
        Self::from_config(&CrcConfig::default())
    }
}
