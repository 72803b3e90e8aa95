use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::Address;
use crate::AddressRange;


/// An index from address ranges to the identifiers of the entries
/// occupying them.
///
/// Each entry owns a set of non-overlapping ranges; ranges of different
/// entries may overlap arbitrarily. Rows are keyed by the beginning of
/// their range. Because no row is wider than `max_width`, all rows
/// containing an address `A` begin within `(A - max_width, A]`, which
/// bounds every lookup to a logarithmic search plus a scan of that
/// window.
#[derive(Clone, Debug)]
pub(crate) struct AddressRangeIndex<Id> {
    /// Rows, keyed by the beginning of their range.
    by_begin: BTreeMap<Address, Vec<(Address, Id)>>,
    /// The ranges each entry is currently indexed under.
    by_id: BTreeMap<Id, Box<[AddressRange]>>,
    /// The widest range ever inserted.
    max_width: u64,
}

impl<Id> AddressRangeIndex<Id>
where
    Id: Copy + Ord,
{
    pub(crate) fn new() -> Self {
        Self {
            by_begin: BTreeMap::new(),
            by_id: BTreeMap::new(),
            max_width: 0,
        }
    }

    /// Replace whatever `id` is indexed under with `ranges`.
    pub(crate) fn insert<I>(&mut self, id: Id, ranges: I)
    where
        I: IntoIterator<Item = AddressRange>,
    {
        let () = self.remove(id);

        let ranges = ranges
            .into_iter()
            .filter(|range| !range.is_empty())
            .collect::<Box<[_]>>();
        for range in ranges.iter() {
            self.max_width = self.max_width.max(range.width());
            let () = self
                .by_begin
                .entry(range.begin())
                .or_default()
                .push((range.end(), id));
        }
        let _prev = self.by_id.insert(id, ranges);
    }

    /// Remove all rows of `id`.
    pub(crate) fn remove(&mut self, id: Id) {
        let Some(ranges) = self.by_id.remove(&id) else {
            return
        };

        for range in ranges.iter() {
            if let Some(rows) = self.by_begin.get_mut(&range.begin()) {
                let () = rows.retain(|(end, row_id)| !(*end == range.end() && *row_id == id));
                if rows.is_empty() {
                    let _rows = self.by_begin.remove(&range.begin());
                }
            }
        }
    }

    /// Retrieve the ranges `id` is indexed under.
    #[cfg(test)]
    pub(crate) fn ranges(&self, id: Id) -> Option<&[AddressRange]> {
        self.by_id.get(&id).map(|ranges| &**ranges)
    }

    /// Find the identifiers of all entries with a range containing
    /// `addr`.
    pub(crate) fn find_at(&self, addr: Address) -> BTreeSet<Id> {
        let low = Address::new(addr.get().saturating_sub(self.max_width));
        self.by_begin
            .range(low..=addr)
            .flat_map(|(_begin, rows)| rows.iter())
            .filter(|(end, _id)| addr < *end)
            .map(|(_end, id)| *id)
            .collect()
    }

    /// Find the identifiers of all entries with a range intersecting
    /// `range`.
    pub(crate) fn find_intersecting(&self, range: &AddressRange) -> BTreeSet<Id> {
        if range.is_empty() {
            return BTreeSet::new()
        }

        let low = Address::new(range.begin().get().saturating_sub(self.max_width));
        self.by_begin
            .range(low..range.end())
            .flat_map(|(_begin, rows)| rows.iter())
            .filter(|(end, _id)| range.begin() < *end)
            .map(|(_end, id)| *id)
            .collect()
    }
}
