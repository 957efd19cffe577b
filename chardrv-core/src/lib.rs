//! Character driver core data types
//!
//! This crate provides basic data type definitions used by other chardrv crates.
//! Driver users should not depend on this crate directly. Use `chardrv::core` reexport instead.
#![no_std]

use embassy_time::Duration;

/// Set of byte values
///
/// A 256-bit map with one bit per byte value. Used to describe line terminators and
/// exceptional characters without any allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ByteSet([u64; 4]);

impl ByteSet {
    pub const NONE: Self = Self([0; 4]);
    pub const ALL: Self = Self([u64::MAX; 4]);

    pub const fn from_bytes(bytes: &[u8]) -> Self {
        let mut set = Self::NONE;
        let mut i = 0;
        while i < bytes.len() {
            set.insert(bytes[i]);
            i += 1;
        }
        set
    }

    pub const fn new_eq(byte: u8) -> Self {
        let mut set = Self::NONE;
        set.insert(byte);
        set
    }

    pub const fn contains(&self, byte: u8) -> bool {
        (self.0[(byte >> 6) as usize] >> (byte & 0x3f)) & 0x1 != 0
    }

    pub const fn insert(&mut self, byte: u8) {
        self.0[(byte >> 6) as usize] |= 1u64 << (byte & 0x3f);
    }

    pub const fn remove(&mut self, byte: u8) {
        self.0[(byte >> 6) as usize] &= !(1u64 << (byte & 0x3f));
    }

    pub const fn union(self, other: Self) -> Self {
        Self([
            self.0[0] | other.0[0],
            self.0[1] | other.0[1],
            self.0[2] | other.0[2],
            self.0[3] | other.0[3],
        ])
    }

    pub const fn difference(self, other: Self) -> Self {
        Self([
            self.0[0] & !other.0[0],
            self.0[1] & !other.0[1],
            self.0[2] & !other.0[2],
            self.0[3] & !other.0[3],
        ])
    }

    pub const fn len(&self) -> usize {
        (self.0[0].count_ones()
            + self.0[1].count_ones()
            + self.0[2].count_ones()
            + self.0[3].count_ones()) as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.0[0] == 0 && self.0[1] == 0 && self.0[2] == 0 && self.0[3] == 0
    }

    pub const fn first(&self) -> Option<u8> {
        let mut word = 0;
        while word < self.0.len() {
            if self.0[word] != 0 {
                return Some((word as u8) << 6 | self.0[word].trailing_zeros() as u8);
            }
            word += 1;
        }
        None
    }
}

impl Default for ByteSet {
    fn default() -> Self {
        ByteSet::NONE
    }
}

impl core::ops::Not for ByteSet {
    type Output = Self;
    fn not(self) -> Self::Output {
        Self(self.0.map(|word| !word))
    }
}

impl core::ops::BitAnd<ByteSet> for ByteSet {
    type Output = Self;
    fn bitand(self, rhs: ByteSet) -> Self::Output {
        self.difference(!rhs)
    }
}

impl core::ops::BitOr<ByteSet> for ByteSet {
    type Output = Self;
    fn bitor(self, rhs: ByteSet) -> Self::Output {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign<ByteSet> for ByteSet {
    fn bitor_assign(&mut self, rhs: ByteSet) {
        *self = self.union(rhs);
    }
}

impl core::iter::IntoIterator for ByteSet {
    type Item = u8;
    type IntoIter = ByteSetIterator;
    fn into_iter(self) -> Self::IntoIter {
        ByteSetIterator { residual: self }
    }
}

impl core::iter::FromIterator<u8> for ByteSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = ByteSet::NONE;
        for byte in iter {
            set.insert(byte);
        }
        set
    }
}

pub struct ByteSetIterator {
    residual: ByteSet,
}

impl core::iter::Iterator for ByteSetIterator {
    type Item = u8;
    fn next(&mut self) -> Option<Self::Item> {
        let first = self.residual.first();
        if let Some(byte) = first {
            self.residual.remove(byte);
        }
        first
    }
}

/// Blocking wait limit
///
/// `Forever` waits until the awaited condition occurs. `After(Duration::MIN)` polls once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    Forever,
    After(Duration),
}

impl Timeout {
    pub const ZERO: Timeout = Timeout::After(Duration::MIN);

    pub const fn from_millis(millis: u64) -> Self {
        Timeout::After(Duration::from_millis(millis))
    }

    pub const fn from_micros(micros: u64) -> Self {
        Timeout::After(Duration::from_micros(micros))
    }

    pub const fn is_forever(&self) -> bool {
        matches!(self, Timeout::Forever)
    }

    /// Remaining duration, `None` for `Forever`
    pub const fn duration(&self) -> Option<Duration> {
        match self {
            Timeout::Forever => None,
            Timeout::After(duration) => Some(*duration),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(value: Duration) -> Self {
        Timeout::After(value)
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::Forever
    }
}

/// Event group bit mask
///
/// The encoding matches the common RTOS event group layout: the lower 24 bits are usable,
/// the upper byte is reserved by some kernels and is never produced by `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventBits(u32);

impl EventBits {
    pub const MAX_BIT: u8 = 23;
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self((1 << (Self::MAX_BIT + 1)) - 1);

    pub const fn new(bit: u8) -> Option<Self> {
        if bit <= Self::MAX_BIT {
            Some(Self(1 << bit))
        } else {
            None
        }
    }

    pub const fn from_bits_truncating(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn into_bits(self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: EventBits) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: EventBits) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == Self::NONE.0
    }
}

impl Default for EventBits {
    fn default() -> Self {
        EventBits::NONE
    }
}

impl core::ops::Not for EventBits {
    type Output = Self;
    fn not(self) -> Self::Output {
        Self(!self.0 & Self::ALL.0)
    }
}

impl core::ops::BitAnd<EventBits> for EventBits {
    type Output = Self;
    fn bitand(self, rhs: EventBits) -> Self::Output {
        EventBits(self.0 & rhs.0)
    }
}

impl core::ops::BitAndAssign<EventBits> for EventBits {
    fn bitand_assign(&mut self, rhs: EventBits) {
        self.0 &= rhs.0
    }
}

impl core::ops::BitOr<EventBits> for EventBits {
    type Output = Self;
    fn bitor(self, rhs: EventBits) -> Self::Output {
        EventBits(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign<EventBits> for EventBits {
    fn bitor_assign(&mut self, rhs: EventBits) {
        self.0 |= rhs.0;
    }
}
