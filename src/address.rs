use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::Add;
use std::ops::Sub;


/// A memory address in the address space of a process.
///
/// Arithmetic with signed offsets is supported. Over- or underflowing
/// the 64-bit address space is a bug on the caller's side and causes a
/// panic; use [`Address::checked_add`] where wraparound is a possibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address {
    /// The lowest possible address.
    pub const LOWEST: Address = Address(0);
    /// The highest possible address.
    pub const HIGHEST: Address = Address(u64::MAX);

    /// Create an `Address` from its raw value.
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Retrieve the raw value of the address.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Offset the address by `offset`, returning `None` on wraparound.
    #[inline]
    pub fn checked_add(self, offset: i64) -> Option<Self> {
        self.0.checked_add_signed(offset).map(Self)
    }

    /// Compute the distance from `other` to `self`, returning `None`
    /// if `other` is the larger of the two.
    #[inline]
    pub fn checked_distance_from(self, other: Self) -> Option<u64> {
        self.0.checked_sub(other.0)
    }
}

impl From<u64> for Address {
    #[inline]
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl From<Address> for u64 {
    #[inline]
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl Add<i64> for Address {
    type Output = Address;

    fn add(self, offset: i64) -> Self::Output {
        self.checked_add(offset)
            .unwrap_or_else(|| panic!("address {self} + {offset} wraps around"))
    }
}

impl Sub<i64> for Address {
    type Output = Address;

    fn sub(self, offset: i64) -> Self::Output {
        let result = if offset >= 0 {
            self.0.checked_sub(offset.unsigned_abs())
        } else {
            self.0.checked_add(offset.unsigned_abs())
        };
        result
            .map(Self)
            .unwrap_or_else(|| panic!("address {self} - {offset} wraps around"))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "0x{:016X}", self.0)
    }
}
