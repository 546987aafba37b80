//! Serial byte stream abstraction
//!
//! The communication stack treats the USB / UART link as an ordered, pollable
//! byte source and sink. Reception never blocks: callers ask how many bytes are
//! buffered and pull them one at a time.

/// Bidirectional serial byte stream
pub trait SerialStream {
    /// Error type for write operations
    type Error;

    /// Number of received bytes that can be read without blocking
    fn available(&mut self) -> usize;

    /// Read one received byte, or `None` if nothing is buffered
    fn read_byte(&mut self) -> Option<u8>;

    /// Write data to the stream
    ///
    /// Returns the number of bytes accepted. A short count is a failed
    /// transmission.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: SerialStream + ?Sized> SerialStream for &mut T {
    type Error = T::Error;

    fn available(&mut self) -> usize {
        T::available(self)
    }

    fn read_byte(&mut self) -> Option<u8> {
        T::read_byte(self)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        T::write(self, data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        T::flush(self)
    }
}

/// [`SerialStream`] over an `embedded-io` peripheral
///
/// `embedded-io` only reports whether data is ready, so [`SerialStream::available`]
/// returns 1 while at least one byte can be read.
#[cfg(feature = "embedded-io")]
pub struct IoStream<T> {
    inner: T,
}

#[cfg(feature = "embedded-io")]
impl<T> IoStream<T> {
    /// Wrap a peripheral
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Release the wrapped peripheral
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(feature = "embedded-io")]
impl<T> SerialStream for IoStream<T>
where
    T: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write,
{
    type Error = T::Error;

    fn available(&mut self) -> usize {
        match self.inner.read_ready() {
            Ok(true) => 1,
            _ => 0,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.inner.write_all(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}
