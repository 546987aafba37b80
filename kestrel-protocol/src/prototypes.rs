//! Prototype codes for data message objects
//!
//! A data message carries a trailing object whose shape the receiver learns
//! from a one-byte prototype code: N scalars of one type, N in 1..=15.
//! Codes are assigned in ascending order of the object's byte footprint; within
//! one footprint, scalar kinds follow [`ScalarKind::ALL`]. The resulting table
//! (codes 1..=165) is part of the wire contract.

use core::fmt;

/// Element type of a prototype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScalarKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
}

impl ScalarKind {
    /// Kinds in code assignment order
    pub const ALL: [ScalarKind; 11] = [
        ScalarKind::Bool,
        ScalarKind::U8,
        ScalarKind::I8,
        ScalarKind::U16,
        ScalarKind::I16,
        ScalarKind::U32,
        ScalarKind::I32,
        ScalarKind::F32,
        ScalarKind::U64,
        ScalarKind::I64,
        ScalarKind::F64,
    ];

    /// Size of one element in bytes
    pub const fn size(self) -> usize {
        match self {
            ScalarKind::Bool | ScalarKind::U8 | ScalarKind::I8 => 1,
            ScalarKind::U16 | ScalarKind::I16 => 2,
            ScalarKind::U32 | ScalarKind::I32 | ScalarKind::F32 => 4,
            ScalarKind::U64 | ScalarKind::I64 | ScalarKind::F64 => 8,
        }
    }
}

/// Largest element count of a prototype
pub const MAX_PROTOTYPE_COUNT: usize = 15;

/// Number of defined prototype codes
pub const PROTOTYPE_COUNT: usize = ScalarKind::ALL.len() * MAX_PROTOTYPE_COUNT;

/// Largest object a prototype can describe (bytes)
pub const MAX_PROTOTYPE_SIZE: usize = 8 * MAX_PROTOTYPE_COUNT;

/// `(kind, count)` for code `index + 1`
const PROTOTYPE_TABLE: [(ScalarKind, u8); PROTOTYPE_COUNT] = build_table();

const fn build_table() -> [(ScalarKind, u8); PROTOTYPE_COUNT] {
    let mut table = [(ScalarKind::Bool, 0u8); PROTOTYPE_COUNT];
    let mut next = 0;
    let mut size = 1;
    while size <= MAX_PROTOTYPE_SIZE {
        let mut k = 0;
        while k < ScalarKind::ALL.len() {
            let kind = ScalarKind::ALL[k];
            let width = kind.size();
            if size % width == 0 && size / width <= MAX_PROTOTYPE_COUNT {
                table[next] = (kind, (size / width) as u8);
                next += 1;
            }
            k += 1;
        }
        size += 1;
    }
    table
}

const fn code_of(kind: ScalarKind, count: u8) -> u8 {
    let mut index = 0;
    while index < PROTOTYPE_COUNT {
        let (k, c) = PROTOTYPE_TABLE[index];
        if k as u8 == kind as u8 && c == count {
            return (index + 1) as u8;
        }
        index += 1;
    }
    panic!("no prototype for this element count");
}

/// Shape of a data message object
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Prototype(u8);

impl Prototype {
    pub const ONE_BOOL: Self = Self::of(ScalarKind::Bool, 1);
    pub const ONE_UINT8: Self = Self::of(ScalarKind::U8, 1);
    pub const ONE_INT8: Self = Self::of(ScalarKind::I8, 1);
    pub const TWO_UINT8S: Self = Self::of(ScalarKind::U8, 2);
    pub const ONE_UINT16: Self = Self::of(ScalarKind::U16, 1);
    pub const ONE_INT16: Self = Self::of(ScalarKind::I16, 1);
    pub const ONE_UINT32: Self = Self::of(ScalarKind::U32, 1);
    pub const ONE_INT32: Self = Self::of(ScalarKind::I32, 1);
    pub const ONE_FLOAT32: Self = Self::of(ScalarKind::F32, 1);
    pub const ONE_UINT64: Self = Self::of(ScalarKind::U64, 1);
    pub const ONE_INT64: Self = Self::of(ScalarKind::I64, 1);
    pub const ONE_FLOAT64: Self = Self::of(ScalarKind::F64, 1);

    /// Lookup for the named constants; an unknown shape fails the build
    const fn of(kind: ScalarKind, count: u8) -> Self {
        Self(code_of(kind, count))
    }

    /// Prototype of `count` elements of `kind`, if one exists
    pub fn new(kind: ScalarKind, count: u8) -> Option<Self> {
        PROTOTYPE_TABLE
            .iter()
            .position(|&entry| entry == (kind, count))
            .map(|index| Self(index as u8 + 1))
    }

    /// Look up a prototype by wire code
    pub fn from_code(code: u8) -> Option<Self> {
        let index = usize::from(code).checked_sub(1)?;
        (index < PROTOTYPE_COUNT).then_some(Self(code))
    }

    /// Wire code
    pub fn code(self) -> u8 {
        self.0
    }

    fn entry(self) -> (ScalarKind, u8) {
        PROTOTYPE_TABLE[usize::from(self.0) - 1]
    }

    /// Element type
    pub fn kind(self) -> ScalarKind {
        self.entry().0
    }

    /// Number of elements
    pub fn count(self) -> u8 {
        self.entry().1
    }

    /// Object size in bytes
    pub fn size(self) -> usize {
        self.kind().size() * usize::from(self.count())
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prototype({} x {:?})", self.count(), self.kind())
    }
}
