//! Packet transport over a serial byte stream.
//!
//! Packet format:
//!
//! ```text
//! ┌───────┬────────┬──────────┬──────────────────┬───────────┬──────────┐
//! │ START │ LENGTH │ OVERHEAD │ COBS(PAYLOAD)    │ DELIMITER │ CRC      │
//! │ 1B    │ 1B     │ 1B       │ LENGTH (1-254B)  │ 1B        │ 1/2/4B   │
//! └───────┴────────┴──────────┴──────────────────┴───────────┴──────────┘
//! ```
//!
//! The CRC covers OVERHEAD through DELIMITER and is stored big-endian.
//!
//! Transmission is a single pass: objects are written into the payload region
//! of the transmission buffer, then [`TransportLayer::send`] frames and pushes
//! the packet. Reception is a resumable state machine that never blocks: it
//! consumes whatever the stream holds and reports
//! [`TransportError::PacketIncomplete`] until the rest of the packet arrives
//! or the reception timeout expires.

use core::fmt;

use heapless::Vec;
use kestrel_hal::{MonotonicClock, SerialStream};

use crate::cobs::{self, CobsError, COBS_OVERHEAD, DELIMITER, MAX_PAYLOAD_SIZE};
use crate::config::{ConfigError, TransportConfig};
use crate::crc::{CrcProcessor, CrcWord};
use crate::wire::Wire;

/// START + LENGTH
pub const PREAMBLE_SIZE: usize = 2;

/// Largest possible packet (32-bit CRC)
pub const MAX_PACKET_SIZE: usize = PREAMBLE_SIZE + COBS_OVERHEAD + MAX_PAYLOAD_SIZE + 4;

/// Index of the first payload byte in the transmission buffer
const PAYLOAD_OFFSET: usize = PREAMBLE_SIZE + 1;

/// Transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Declared payload length is 0 or above the configured maximum
    InvalidPayloadSize,
    /// Started packet did not complete within the reception timeout
    PacketTimeout,
    /// No start byte in the stream
    NoBytesToParse,
    /// Checksum mismatch
    CrcCheckFailed,
    /// Object does not fit the remaining payload space
    WriteObjectBufferError,
    /// Payload holds fewer bytes than the requested object
    ReadObjectBufferError,
    /// Byte after the payload is not the delimiter
    DelimiterNotFound,
    /// Delimiter inside the payload region
    DelimiterFoundTooEarly,
    /// Packet started but the stream ran dry; retry later
    PacketIncomplete,
    /// The stream rejected or truncated the packet
    TransmissionFailed,
    /// COBS stage failed
    Cobs(CobsError),
}

impl TransportError {
    /// Status code reported to the host
    pub fn code(self) -> u8 {
        match self {
            TransportError::InvalidPayloadSize => 108,
            TransportError::PacketTimeout => 109,
            TransportError::NoBytesToParse => 110,
            TransportError::CrcCheckFailed => 112,
            TransportError::WriteObjectBufferError => 115,
            TransportError::ReadObjectBufferError => 117,
            TransportError::DelimiterNotFound => 119,
            TransportError::DelimiterFoundTooEarly => 120,
            TransportError::PacketIncomplete => 122,
            TransportError::TransmissionFailed => 123,
            TransportError::Cobs(error) => error.code(),
        }
    }

    /// Outcomes that only mean "not yet": the caller retries later
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            TransportError::NoBytesToParse | TransportError::PacketIncomplete
        )
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InvalidPayloadSize => write!(f, "invalid payload size"),
            TransportError::PacketTimeout => write!(f, "packet reception timed out"),
            TransportError::NoBytesToParse => write!(f, "no packet bytes to parse"),
            TransportError::CrcCheckFailed => write!(f, "CRC check failed"),
            TransportError::WriteObjectBufferError => {
                write!(f, "object does not fit the transmission buffer")
            }
            TransportError::ReadObjectBufferError => {
                write!(f, "not enough payload bytes to read object")
            }
            TransportError::DelimiterNotFound => write!(f, "delimiter not found"),
            TransportError::DelimiterFoundTooEarly => write!(f, "delimiter found too early"),
            TransportError::PacketIncomplete => write!(f, "packet incomplete"),
            TransportError::TransmissionFailed => write!(f, "transmission failed"),
            TransportError::Cobs(error) => write!(f, "COBS: {}", error),
        }
    }
}

impl From<CobsError> for TransportError {
    fn from(error: CobsError) -> Self {
        TransportError::Cobs(error)
    }
}

/// Outcome of the most recent transport operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportStatus {
    Standby,
    PacketSent,
    PacketReceived,
    ObjectWritten,
    ObjectRead,
    Failed(TransportError),
}

impl TransportStatus {
    /// Status code reported to the host
    pub fn code(self) -> u8 {
        match self {
            TransportStatus::Standby => 101,
            TransportStatus::PacketSent => 103,
            TransportStatus::PacketReceived => 114,
            TransportStatus::ObjectWritten => 116,
            TransportStatus::ObjectRead => 118,
            TransportStatus::Failed(error) => error.code(),
        }
    }
}

/// Reception state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceptionState {
    /// Nothing received since construction or reset
    Idle,
    /// Discarding bytes until the start byte
    ScanningForStart,
    /// Start byte seen, waiting for LENGTH
    ReadingLength,
    /// Collecting OVERHEAD and the encoded payload
    ReadingPayload,
    /// Waiting for the delimiter
    ValidatingDelimiter,
    /// Collecting and checking the CRC
    ValidatingCrc,
    /// Payload decoded and readable
    Ready,
}

/// Serial packet transport with fixed transmission and reception buffers
pub struct TransportLayer<S, C, W: CrcWord = u16> {
    stream: S,
    clock: C,
    crc: CrcProcessor<W>,
    config: TransportConfig,
    tx_buffer: [u8; MAX_PACKET_SIZE],
    tx_payload_len: usize,
    /// OVERHEAD through CRC of the packet being received
    rx_buffer: Vec<u8, MAX_PACKET_SIZE>,
    rx_payload_len: usize,
    rx_read_index: usize,
    expected_payload_len: usize,
    packet_started_us: u64,
    state: ReceptionState,
    status: TransportStatus,
}

impl<S, C, W> TransportLayer<S, C, W>
where
    S: SerialStream,
    C: MonotonicClock,
    W: CrcWord,
{
    /// Create a transport over `stream`
    pub fn new(stream: S, clock: C, config: TransportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            stream,
            clock,
            crc: CrcProcessor::from_config(&config.crc),
            config,
            tx_buffer: [0; MAX_PACKET_SIZE],
            tx_payload_len: 0,
            rx_buffer: Vec::new(),
            rx_payload_len: 0,
            rx_read_index: 0,
            expected_payload_len: 0,
            packet_started_us: 0,
            state: ReceptionState::Idle,
            status: TransportStatus::Standby,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Outcome of the most recent operation
    pub fn status(&self) -> TransportStatus {
        self.status
    }

    /// Current reception state
    pub fn reception_state(&self) -> ReceptionState {
        self.state
    }

    /// Payload bytes written since the last send
    pub fn bytes_in_transmission_buffer(&self) -> usize {
        self.tx_payload_len
    }

    /// Payload bytes of the last decoded packet
    pub fn bytes_in_reception_buffer(&self) -> usize {
        self.rx_payload_len
    }

    /// Decoded payload of the last received packet
    pub fn received_payload(&self) -> &[u8] {
        self.rx_buffer
            .get(1..1 + self.rx_payload_len)
            .unwrap_or(&[])
    }

    /// Underlying stream
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Underlying stream (mutable)
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Release the stream and clock
    pub fn release(self) -> (S, C) {
        (self.stream, self.clock)
    }

    /// Discard any payload written since the last send
    pub fn reset_transmission_buffer(&mut self) {
        self.tx_payload_len = 0;
    }

    /// Discard the received payload and any partially received packet
    pub fn reset_reception_buffer(&mut self) {
        self.clear_reception();
        self.state = ReceptionState::Idle;
    }

    /// Write `value` at payload `offset`
    ///
    /// Returns the offset just past the object. Writing past the end of the
    /// current payload extends it.
    pub fn write_object_at<T: Wire>(&mut self, value: &T, offset: usize) -> Result<usize, TransportError> {
        let end = match offset.checked_add(T::SIZE) {
            Some(end) if end <= usize::from(self.config.max_payload_size) => end,
            _ => {
                self.status = TransportStatus::Failed(TransportError::WriteObjectBufferError);
                return Err(TransportError::WriteObjectBufferError);
            }
        };

        value.encode(&mut self.tx_buffer[PAYLOAD_OFFSET + offset..PAYLOAD_OFFSET + end]);
        self.tx_payload_len = self.tx_payload_len.max(end);
        self.status = TransportStatus::ObjectWritten;
        Ok(end)
    }

    /// Append `value` to the payload
    pub fn write_object<T: Wire>(&mut self, value: &T) -> Result<usize, TransportError> {
        self.write_object_at(value, self.tx_payload_len)
    }

    /// Read an object at payload `offset` of the last received packet
    ///
    /// Returns the object and the offset just past it.
    pub fn read_object_at<T: Wire>(&mut self, offset: usize) -> Result<(T, usize), TransportError> {
        let end = match offset.checked_add(T::SIZE) {
            Some(end) if end <= self.rx_payload_len => end,
            _ => {
                self.status = TransportStatus::Failed(TransportError::ReadObjectBufferError);
                return Err(TransportError::ReadObjectBufferError);
            }
        };

        // Payload starts after the overhead byte
        let value = T::decode(&self.rx_buffer[1 + offset..1 + end]);
        self.status = TransportStatus::ObjectRead;
        Ok((value, end))
    }

    /// Read the next object after the read cursor and advance it
    pub fn read_object<T: Wire>(&mut self) -> Result<T, TransportError> {
        let (value, end) = self.read_object_at(self.rx_read_index)?;
        self.rx_read_index = end;
        Ok(value)
    }

    /// Frame the written payload and push it to the stream
    ///
    /// The payload region is reset whether or not transmission succeeds.
    pub fn send(&mut self) -> Result<(), TransportError> {
        let result = self.transmit();
        self.tx_payload_len = 0;
        self.status = match result {
            Ok(()) => TransportStatus::PacketSent,
            Err(error) => TransportStatus::Failed(error),
        };
        result
    }

    fn transmit(&mut self) -> Result<(), TransportError> {
        let payload_len = self.tx_payload_len;
        let packet_len = cobs::encode(&mut self.tx_buffer[PREAMBLE_SIZE..], payload_len)?;

        self.tx_buffer[0] = self.config.start_byte;
        self.tx_buffer[1] = payload_len as u8;

        let packet_end = PREAMBLE_SIZE + packet_len;
        let checksum = self.crc.checksum(&self.tx_buffer[PREAMBLE_SIZE..packet_end]);
        let end = self
            .crc
            .write_checksum(&mut self.tx_buffer, packet_end, checksum)
            .ok_or(TransportError::Cobs(CobsError::BufferTooSmall))?;

        match self.stream.write(&self.tx_buffer[..end]) {
            Ok(written) if written == end => {}
            _ => return Err(TransportError::TransmissionFailed),
        }
        self.stream
            .flush()
            .map_err(|_| TransportError::TransmissionFailed)
    }

    /// Advance reception with whatever the stream currently holds
    ///
    /// Returns the payload size once a complete, valid packet has been
    /// decoded. Transient outcomes ([`TransportError::is_transient`]) keep
    /// the partial packet for the next call.
    pub fn receive(&mut self) -> Result<usize, TransportError> {
        let result = self.advance_reception();
        self.status = match result {
            Ok(_) => TransportStatus::PacketReceived,
            Err(error) => TransportStatus::Failed(error),
        };
        result
    }

    fn advance_reception(&mut self) -> Result<usize, TransportError> {
        loop {
            match self.state {
                ReceptionState::Idle | ReceptionState::Ready => {
                    self.state = ReceptionState::ScanningForStart;
                }
                ReceptionState::ScanningForStart => {
                    if !self.scan_for_start() {
                        return Err(TransportError::NoBytesToParse);
                    }
                    // The previous payload stays readable until here
                    self.clear_reception();
                    self.packet_started_us = self.clock.now_micros();
                    self.state = ReceptionState::ReadingLength;
                }
                ReceptionState::ReadingLength => {
                    let Some(length) = self.next_byte() else {
                        return self.pending();
                    };
                    let length = usize::from(length);
                    if length == 0 || length > usize::from(self.config.max_payload_size) {
                        return self.reject(TransportError::InvalidPayloadSize);
                    }
                    self.expected_payload_len = length;
                    self.state = ReceptionState::ReadingPayload;
                }
                ReceptionState::ReadingPayload => {
                    // OVERHEAD + payload; neither may hold the delimiter
                    while self.rx_buffer.len() < self.expected_payload_len + 1 {
                        let Some(byte) = self.next_byte() else {
                            return self.pending();
                        };
                        if byte == DELIMITER {
                            return self.reject(TransportError::DelimiterFoundTooEarly);
                        }
                        self.store(byte)?;
                    }
                    self.state = ReceptionState::ValidatingDelimiter;
                }
                ReceptionState::ValidatingDelimiter => {
                    let Some(byte) = self.next_byte() else {
                        return self.pending();
                    };
                    if byte != DELIMITER {
                        return self.reject(TransportError::DelimiterNotFound);
                    }
                    self.store(byte)?;
                    self.state = ReceptionState::ValidatingCrc;
                }
                ReceptionState::ValidatingCrc => {
                    let packet_len = self.expected_payload_len + COBS_OVERHEAD;
                    while self.rx_buffer.len() < packet_len + W::WIDTH {
                        let Some(byte) = self.next_byte() else {
                            return self.pending();
                        };
                        self.store(byte)?;
                    }

                    if !self.crc.verify(&self.rx_buffer, packet_len) {
                        return self.reject(TransportError::CrcCheckFailed);
                    }
                    let payload_len = match cobs::decode(&mut self.rx_buffer[..packet_len]) {
                        Ok(len) => len,
                        Err(error) => return self.reject(error.into()),
                    };

                    self.rx_payload_len = payload_len;
                    self.rx_read_index = 0;
                    self.state = ReceptionState::Ready;
                    return Ok(payload_len);
                }
            }
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        if self.stream.available() == 0 {
            return None;
        }
        self.stream.read_byte()
    }

    fn scan_for_start(&mut self) -> bool {
        while let Some(byte) = self.next_byte() {
            if byte == self.config.start_byte {
                return true;
            }
        }
        false
    }

    fn store(&mut self, byte: u8) -> Result<(), TransportError> {
        if self.rx_buffer.push(byte).is_err() {
            self.reject(TransportError::InvalidPayloadSize)?;
        }
        Ok(())
    }

    /// Partial packet: wait for more bytes unless the timeout has expired
    fn pending(&mut self) -> Result<usize, TransportError> {
        let elapsed = self
            .clock
            .now_micros()
            .saturating_sub(self.packet_started_us);
        if elapsed > u64::from(self.config.timeout_us) {
            return self.reject(TransportError::PacketTimeout);
        }
        Err(TransportError::PacketIncomplete)
    }

    /// Drop the packet being received and resynchronize on the next start byte
    fn reject(&mut self, error: TransportError) -> Result<usize, TransportError> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Dropping packet: {:?}", error);

        self.clear_reception();
        self.state = ReceptionState::ScanningForStart;
        Err(error)
    }

    fn clear_reception(&mut self) {
        self.rx_buffer.clear();
        self.rx_payload_len = 0;
        self.rx_read_index = 0;
        self.expected_payload_len = 0;
    }
}
