use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::BitAnd;
use std::ops::BitOr;
use std::ops::Range;

use crate::message::AddressRangeMsg;
use crate::Address;
use crate::Time;


/// A half-open interval `[begin, end)` over addresses or points in
/// time.
///
/// An interval whose end does not lie past its beginning is empty: it
/// contains nothing, intersects nothing, and has a width of zero.
/// Intervals are ordered by their beginning first and their end
/// second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval<T> {
    begin: T,
    end: T,
}

/// A half-open range of addresses.
pub type AddressRange = Interval<Address>;
/// A half-open interval of time.
pub type TimeInterval = Interval<Time>;

impl<T> Interval<T>
where
    T: Copy + Ord + Into<u64>,
{
    /// Create a new interval `[begin, end)`.
    #[inline]
    pub const fn new(begin: T, end: T) -> Self {
        Self { begin, end }
    }

    /// Retrieve the (inclusive) beginning of the interval.
    #[inline]
    pub fn begin(&self) -> T {
        self.begin
    }

    /// Retrieve the (exclusive) end of the interval.
    #[inline]
    pub fn end(&self) -> T {
        self.end
    }

    /// Check whether the interval is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Retrieve the number of points covered by the interval.
    #[inline]
    pub fn width(&self) -> u64 {
        let begin = self.begin.into();
        let end = self.end.into();
        end.saturating_sub(begin)
    }

    /// Check whether `value` lies within the interval.
    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.begin <= value && value < self.end
    }

    /// Check whether `other` lies entirely within the interval.
    ///
    /// Empty intervals neither contain nor are contained in anything.
    #[inline]
    pub fn contains_range(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.begin <= other.begin
            && other.end <= self.end
    }

    /// Check whether the interval shares at least one point with
    /// `other`.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.begin < other.end
            && other.begin < self.end
    }
}

impl<T> BitOr for Interval<T>
where
    T: Copy + Ord + Into<u64>,
{
    type Output = Self;

    /// Compute the smallest interval spanning both operands, including
    /// any gap between them. An empty operand does not contribute.
    fn bitor(self, other: Self) -> Self::Output {
        if self.is_empty() {
            other
        } else if other.is_empty() {
            self
        } else {
            Self::new(self.begin.min(other.begin), self.end.max(other.end))
        }
    }
}

impl<T> BitAnd for Interval<T>
where
    T: Copy + Ord + Into<u64>,
{
    type Output = Self;

    /// Compute the overlap of both operands, which may be empty.
    fn bitand(self, other: Self) -> Self::Output {
        let begin = self.begin.max(other.begin);
        let end = self.end.min(other.end);
        if begin < end {
            Self::new(begin, end)
        } else {
            Self::new(begin, begin)
        }
    }
}

impl<T> From<Range<u64>> for Interval<T>
where
    T: Copy + Ord + Into<u64> + From<u64>,
{
    fn from(range: Range<u64>) -> Self {
        Self::new(T::from(range.start), T::from(range.end))
    }
}

impl<T> Display for Interval<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

impl TimeInterval {
    /// The interval covering all representable points in time.
    #[inline]
    pub const fn forever() -> Self {
        Self::new(Time::THE_BEGINNING, Time::THE_END)
    }
}

impl AddressRange {
    /// Create the range containing only `addr`.
    ///
    /// # Panics
    /// Panics if `addr` is the highest address, which cannot be the
    /// beginning of a non-empty half-open range.
    #[inline]
    pub fn single(addr: Address) -> Self {
        assert!(
            addr != Address::HIGHEST,
            "address {addr} has no single-address range"
        );
        Self::new(addr, addr + 1)
    }
}

impl From<AddressRangeMsg> for AddressRange {
    fn from(other: AddressRangeMsg) -> Self {
        Self::new(Address::new(other.begin), Address::new(other.end))
    }
}

impl From<AddressRange> for AddressRangeMsg {
    fn from(other: AddressRange) -> Self {
        Self {
            begin: other.begin.get(),
            end: other.end.get(),
        }
    }
}


/// Sort `ranges`, drop empty ones, and merge overlapping as well as
/// adjacent ranges.
///
/// The result is the canonical representation of the set of addresses
/// covered: a sorted list of non-empty ranges with gaps between any two
/// of them.
pub(crate) fn normalize<I>(ranges: I) -> Vec<AddressRange>
where
    I: IntoIterator<Item = AddressRange>,
{
    let mut ranges = ranges
        .into_iter()
        .filter(|range| !range.is_empty())
        .collect::<Vec<_>>();
    let () = ranges.sort_unstable();

    let mut merged = Vec::<AddressRange>::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.begin <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
