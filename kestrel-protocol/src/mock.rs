//! Host-side stand-ins for the hardware collaborators, used by unit tests

use core::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

use kestrel_hal::{MonotonicClock, OutputPin, SerialStream};

use crate::config::TransportConfig;
use crate::transport::TransportLayer;

/// In-memory serial link
#[derive(Debug, Default)]
pub struct MockStream {
    /// Bytes waiting to be received by the controller
    pub rx: VecDeque<u8>,
    /// Bytes the controller has sent
    pub tx: Vec<u8>,
    /// Make every write fail
    pub fail_writes: bool,
}

impl MockStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for reception
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl SerialStream for MockStream {
    type Error = ();

    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(());
        }
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, micros: u64) {
        self.now.set(self.now.get() + micros);
    }
}

impl MonotonicClock for MockClock {
    fn now_micros(&self) -> u64 {
        self.now.get()
    }
}

/// Fault indicator that remembers its state
#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.high = true;
    }

    fn set_low(&mut self) {
        self.high = false;
    }
}

/// Frame `payload` the way the host driver does, with the default configuration
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let clock = MockClock::new();
    let mut transport: TransportLayer<MockStream, &MockClock> =
        TransportLayer::new(MockStream::new(), &clock, TransportConfig::default()).unwrap();
    for byte in payload {
        transport.write_object(byte).unwrap();
    }
    transport.send().unwrap();
    let (stream, _) = transport.release();
    stream.tx
}
