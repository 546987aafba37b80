//! Fixed-layout wire encoding
//!
//! Every value that crosses the link has a fixed byte size and an explicit
//! field order. Multi-byte integers are little-endian, floats are IEEE-754,
//! booleans are one byte. Nothing here depends on the in-memory layout of
//! the host type.

/// A value with a fixed-size wire representation
///
/// The transport layer checks bounds before calling `encode` or `decode`,
/// so implementations can assume the slice is exactly [`Wire::SIZE`] bytes.
///
/// Implement this for parameter structures to make them extractable from
/// module parameter messages:
///
/// ```
/// use kestrel_protocol::wire::{FieldReader, FieldWriter, Wire};
///
/// struct PulseParameters {
///     duration_us: u32,
///     inverted: bool,
/// }
///
/// impl Wire for PulseParameters {
///     const SIZE: usize = 5;
///
///     fn encode(&self, out: &mut [u8]) {
///         let mut writer = FieldWriter::new(out);
///         writer.put(&self.duration_us);
///         writer.put(&self.inverted);
///     }
///
///     fn decode(bytes: &[u8]) -> Self {
///         let mut reader = FieldReader::new(bytes);
///         Self {
///             duration_us: reader.take(),
///             inverted: reader.take(),
///         }
///     }
/// }
/// ```
pub trait Wire: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Write the value into `out` (`out.len() == SIZE`)
    fn encode(&self, out: &mut [u8]);

    /// Read a value from `bytes` (`bytes.len() == SIZE`)
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! impl_wire_le {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Wire for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                fn encode(&self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                fn decode(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_wire_le!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Wire for bool {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }

    fn decode(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl<T: Wire + Copy + Default, const N: usize> Wire for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn encode(&self, out: &mut [u8]) {
        for (item, chunk) in self.iter().zip(out.chunks_exact_mut(T::SIZE)) {
            item.encode(chunk);
        }
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut items = [T::default(); N];
        for (item, chunk) in items.iter_mut().zip(bytes.chunks_exact(T::SIZE)) {
            *item = T::decode(chunk);
        }
        items
    }
}

/// Sequential field writer for [`Wire::encode`] implementations
pub struct FieldWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> FieldWriter<'a> {
    /// Start writing at the beginning of `out`
    pub fn new(out: &'a mut [u8]) -> Self {
        Self { out, pos: 0 }
    }

    /// Append one field
    pub fn put<T: Wire>(&mut self, value: &T) {
        let end = self.pos + T::SIZE;
        value.encode(&mut self.out[self.pos..end]);
        self.pos = end;
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// Sequential field reader for [`Wire::decode`] implementations
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    /// Start reading at the beginning of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Read the next field
    pub fn take<T: Wire>(&mut self) -> T {
        let end = self.pos + T::SIZE;
        let value = T::decode(&self.bytes[self.pos..end]);
        self.pos = end;
        value
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }
}
