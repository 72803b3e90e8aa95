//! Partitioning of sparse address sets into dense address bitmaps.
//!
//! Representing a set of addresses by a single bitmap spanning from its
//! lowest to its highest address wastes space whenever the set contains
//! large gaps. Representing it by a list of address ranges wastes space
//! whenever the set is fragmented into many small runs. The partitioner
//! recursively splits the set at its widest gap until every remaining
//! subset is dense enough for a bitmap to be the cheaper encoding.

use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::mem::size_of;

use crate::interval::normalize;
use crate::log::debug;
use crate::Address;
use crate::AddressBitmap;
use crate::AddressRange;


/// The widest gap, in addresses, tolerated within a single bitmap.
///
/// This is the number of bits needed to encode one extra bitmap: two
/// 64-bit addresses plus at least one byte of bitmap data. Gaps wider
/// than this are cheaper to express by starting a new bitmap.
pub const PARTITIONING_CRITERION: u64 = 8 * (2 * size_of::<u64>() + size_of::<u8>()) as u64;


/// Find the index of the range following the widest gap.
///
/// Ties are resolved in favor of the lowest gap.
fn widest_gap(ranges: &[AddressRange]) -> Option<(usize, u64)> {
    let mut widest = None::<(usize, u64)>;
    for (idx, pair) in ranges.windows(2).enumerate() {
        let gap = pair[1].begin().get() - pair[0].end().get();
        if widest.map_or(true, |(_, width)| gap > width) {
            widest = Some((idx + 1, gap));
        }
    }
    widest
}

fn make_bitmap(ranges: &[AddressRange]) -> Option<AddressBitmap> {
    let first = ranges.first()?;
    let last = ranges.last()?;
    let mut bitmap = AddressBitmap::new(AddressRange::new(first.begin(), last.end()));
    let () = ranges
        .iter()
        .for_each(|range| bitmap.set_range(*range, true));
    Some(bitmap)
}


/// Partition the set of addresses covered by `ranges` into address
/// bitmaps.
///
/// The ranges may be unsorted, overlapping, or empty. The resulting
/// bitmaps are sorted by range, do not overlap each other, and together
/// contain exactly the covered addresses.
#[cfg_attr(feature = "tracing", crate::log::instrument(skip_all))]
pub fn partition_ranges<I>(ranges: I) -> Vec<AddressBitmap>
where
    I: IntoIterator<Item = AddressRange>,
{
    let ranges = normalize(ranges);
    let mut bitmaps = Vec::new();
    let mut worklist = VecDeque::from([ranges.as_slice()]);

    while let Some(subset) = worklist.pop_front() {
        match widest_gap(subset) {
            Some((idx, gap)) if gap > PARTITIONING_CRITERION => {
                let (lower, upper) = subset.split_at(idx);
                let () = worklist.push_back(lower);
                let () = worklist.push_back(upper);
            }
            _ => {
                if let Some(bitmap) = make_bitmap(subset) {
                    let () = bitmaps.push(bitmap);
                }
            }
        }
    }

    let () = bitmaps.sort_unstable_by_key(AddressBitmap::range);
    debug!(
        "partitioned {} ranges into {} bitmaps",
        ranges.len(),
        bitmaps.len()
    );
    bitmaps
}

/// Partition a set of addresses into address bitmaps.
///
/// See [`partition_ranges`] for the properties of the result.
///
/// # Panics
/// Panics if `addrs` contains [`Address::HIGHEST`], which no half-open
/// range can cover.
pub fn partition(addrs: &BTreeSet<Address>) -> Vec<AddressBitmap> {
    partition_ranges(addrs.iter().map(|addr| AddressRange::single(*addr)))
}

/// Recover the set of addresses contained in `bitmaps`, as sorted and
/// maximally merged address ranges.
pub fn extract<'bitmap, I>(bitmaps: I) -> BTreeSet<AddressRange>
where
    I: IntoIterator<Item = &'bitmap AddressBitmap>,
{
    let ranges = bitmaps
        .into_iter()
        .flat_map(|bitmap| bitmap.contiguous_ranges(true));
    normalize(ranges).into_iter().collect()
}
