use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::error::IntoError as _;
use crate::message::AddressBitmapMsg;
use crate::Address;
use crate::AddressRange;
use crate::Error;
use crate::Result;


/// Compute the number of bytes needed to hold `width` bits.
///
/// At least one byte is always used.
fn byte_len(width: u64) -> Option<usize> {
    let len = usize::try_from(width.div_ceil(8)).ok()?;
    Some(len.max(1))
}


/// A set of addresses within a bounded range, represented with one bit
/// per address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AddressBitmap {
    /// The range of addresses covered.
    range: AddressRange,
    /// The membership bits, packed least significant bit first.
    bits: Box<[u8]>,
}

impl AddressBitmap {
    /// Create a bitmap covering `range` with no address set.
    ///
    /// # Panics
    /// Panics if `range` is empty or too wide to be represented in
    /// memory.
    pub fn new(range: AddressRange) -> Self {
        assert!(!range.is_empty(), "cannot create bitmap for empty range {range}");
        let len = byte_len(range.width())
            .unwrap_or_else(|| panic!("range {range} is too wide for a bitmap"));

        Self {
            range,
            bits: vec![0; len].into_boxed_slice(),
        }
    }

    /// Create the smallest bitmap containing exactly the provided
    /// addresses, or `None` if there are none.
    pub fn from_addresses(addrs: &BTreeSet<Address>) -> Option<Self> {
        let first = addrs.first()?;
        let last = addrs.last()?;
        let mut bitmap = Self::new(AddressRange::new(*first, *last + 1));
        let () = addrs.iter().for_each(|addr| bitmap.set(*addr, true));
        Some(bitmap)
    }

    /// Retrieve the range of addresses covered by the bitmap.
    #[inline]
    pub fn range(&self) -> AddressRange {
        self.range
    }

    fn bit_index(&self, addr: Address) -> (usize, u8) {
        assert!(
            self.range.contains(addr),
            "address {addr} lies outside of bitmap range {}",
            self.range
        );
        // The index fits, because the allocation covers it.
        let offset = (addr.get() - self.range.begin().get()) as usize;
        (offset / 8, 1 << (offset % 8))
    }

    /// Check whether `addr` is part of the set.
    ///
    /// # Panics
    /// Panics if `addr` lies outside of the bitmap's range.
    pub fn get(&self, addr: Address) -> bool {
        let (idx, mask) = self.bit_index(addr);
        self.bits[idx] & mask != 0
    }

    /// Add `addr` to or remove it from the set.
    ///
    /// # Panics
    /// Panics if `addr` lies outside of the bitmap's range.
    pub fn set(&mut self, addr: Address, value: bool) {
        let (idx, mask) = self.bit_index(addr);
        if value {
            self.bits[idx] |= mask;
        } else {
            self.bits[idx] &= !mask;
        }
    }

    /// Set all addresses in `range` to `value`.
    pub(crate) fn set_range(&mut self, range: AddressRange, value: bool) {
        let mut addr = range.begin();
        while addr < range.end() {
            let () = self.set(addr, value);
            addr = addr + 1;
        }
    }

    /// Retrieve the maximal runs of addresses whose bit equals `value`.
    pub fn contiguous_ranges(&self, value: bool) -> BTreeSet<AddressRange> {
        let mut ranges = BTreeSet::new();
        let mut start = None;
        let mut addr = self.range.begin();

        while addr < self.range.end() {
            let bit = self.get(addr);
            match (bit == value, start) {
                (true, None) => start = Some(addr),
                (false, Some(begin)) => {
                    let _new = ranges.insert(AddressRange::new(begin, addr));
                    start = None;
                }
                _ => (),
            }
            addr = addr + 1;
        }

        if let Some(begin) = start {
            let _new = ranges.insert(AddressRange::new(begin, self.range.end()));
        }
        ranges
    }

    /// Count the number of addresses in the set.
    pub fn count_ones(&self) -> u64 {
        self.bits
            .iter()
            .map(|byte| u64::from(byte.count_ones()))
            .sum()
    }
}

impl TryFrom<&AddressBitmapMsg> for AddressBitmap {
    type Error = Error;

    fn try_from(other: &AddressBitmapMsg) -> Result<Self, Self::Error> {
        let range = AddressRange::from(other.range);
        if range.is_empty() {
            return Err(Error::with_invalid_data(format!(
                "address bitmap covers empty range {range}"
            )))
        }

        let expected = byte_len(range.width())
            .ok_or_invalid_data(|| format!("address bitmap range {range} is too wide"))?;
        if expected != other.bitmap.len() {
            return Err(Error::with_invalid_data(format!(
                "address bitmap for range {range} has {} bytes; expected {expected}",
                other.bitmap.len(),
            )))
        }

        let used = range.width() % 8;
        let padding = other.bitmap.last().map_or(0, |last| {
            if used == 0 {
                0
            } else {
                last & !((1u8 << used) - 1)
            }
        });
        if padding != 0 {
            return Err(Error::with_invalid_data(format!(
                "address bitmap for range {range} has bits set past its end"
            )))
        }

        Ok(Self {
            range,
            bits: other.bitmap.clone().into_boxed_slice(),
        })
    }
}

impl From<&AddressBitmap> for AddressBitmapMsg {
    fn from(other: &AddressBitmap) -> Self {
        Self {
            range: other.range.into(),
            bitmap: other.bits.to_vec(),
        }
    }
}

impl Display for AddressBitmap {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let () = write!(f, "{}: ", self.range)?;

        let count = self.count_ones();
        let width = self.range.width();
        if width > 8 && count == 0 {
            f.write_str("0...0")
        } else if width > 8 && count == width {
            f.write_str("1...1")
        } else {
            let mut addr = self.range.begin();
            while addr < self.range.end() {
                let () = f.write_str(if self.get(addr) { "1" } else { "0" })?;
                addr = addr + 1;
            }
            Ok(())
        }
    }
}
