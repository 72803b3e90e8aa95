//! The time-versioned address space of a process.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::IntoError as _;
use crate::log::debug;
use crate::log::warn;
use crate::message::LinkedObjectGroupMsg;
use crate::message::LinkedObjectMsg;
use crate::message::LoadedLinkedObjectMsg;
use crate::message::SymbolTableMsg;
use crate::message::ThreadNameMsg;
use crate::message::UnloadedLinkedObjectMsg;
use crate::symtab::AddressRangeIndex;
use crate::Address;
use crate::AddressRange;
use crate::Error;
use crate::ErrorExt as _;
use crate::FileName;
use crate::LinkedObject;
use crate::Result;
use crate::SymbolTable;
use crate::Time;
use crate::TimeInterval;


/// A linked object occupying an address range for a period of time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    linked_object: LinkedObject,
    is_executable: bool,
    range: AddressRange,
    interval: TimeInterval,
}

impl Mapping {
    /// Retrieve the mapped linked object.
    #[inline]
    pub fn linked_object(&self) -> &LinkedObject {
        &self.linked_object
    }

    /// Check whether the mapped linked object is the executable.
    #[inline]
    pub fn is_executable(&self) -> bool {
        self.is_executable
    }

    /// Retrieve the address range occupied.
    #[inline]
    pub fn range(&self) -> AddressRange {
        self.range
    }

    /// Retrieve the time interval during which the range was occupied.
    #[inline]
    pub fn interval(&self) -> TimeInterval {
        self.interval
    }

    /// Translate `addr` into an address relative to the beginning of
    /// the mapping, as used by the linked object's symbol table.
    pub fn relative(&self, addr: Address) -> Option<Address> {
        if !self.range.contains(addr) {
            return None
        }
        addr.checked_distance_from(self.range.begin())
            .map(Address::new)
    }

    fn describe(&self) -> String {
        format!(
            "{} at {} during [{}, {})",
            self.linked_object.file_name(),
            self.range,
            self.interval.begin().as_nanos(),
            self.interval.end().as_nanos()
        )
    }
}


/// The address space of a process, tracking which linked object
/// occupied which address range at which point in time.
///
/// Two mappings occupying intersecting address ranges never have
/// intersecting time intervals.
#[derive(Clone, Debug)]
pub struct AddressSpace {
    /// All mappings, in order of insertion.
    mappings: Vec<Mapping>,
    /// Index from address range to position in `mappings`.
    index: AddressRangeIndex<usize>,
    /// All known linked objects, mapped or not.
    linked_objects: Vec<LinkedObject>,
}

impl AddressSpace {
    /// Create an empty address space.
    pub fn new() -> Self {
        Self {
            mappings: Vec::new(),
            index: AddressRangeIndex::new(),
            linked_objects: Vec::new(),
        }
    }

    fn register(&mut self, linked_object: &LinkedObject) {
        if !self.linked_objects.contains(linked_object) {
            let () = self.linked_objects.push(linked_object.clone());
        }
    }

    fn find_linked_object(&self, file_name: &FileName) -> Option<LinkedObject> {
        self.linked_objects
            .iter()
            .find(|linked_object| linked_object.file_name().matches(file_name))
            .cloned()
    }

    /// Find a known linked object matching `file_name` or create a new
    /// one. A new linked object only becomes known once mapped.
    fn find_or_create_linked_object(&self, file_name: FileName) -> LinkedObject {
        self.find_linked_object(&file_name)
            .unwrap_or_else(|| LinkedObject::from_file_name(file_name))
    }

    fn insert(&mut self, mapping: Mapping) -> Result<()> {
        let conflict = self
            .index
            .find_intersecting(&mapping.range)
            .into_iter()
            .map(|idx| &self.mappings[idx])
            .find(|other| other.interval.intersects(&mapping.interval));

        if let Some(other) = conflict {
            let msg = format!(
                "mapping of {} conflicts with existing mapping of {}",
                mapping.describe(),
                other.describe()
            );
            warn!("{msg}");
            return Err(Error::with_invalid_input(msg))
        }

        let idx = self.mappings.len();
        let () = self.index.insert(idx, [mapping.range]);
        let () = self.register(&mapping.linked_object);
        let () = self.mappings.push(mapping);
        Ok(())
    }

    fn add(
        &mut self,
        linked_object: &LinkedObject,
        is_executable: bool,
        range: AddressRange,
        interval: TimeInterval,
    ) -> Result<()> {
        assert!(!range.is_empty(), "cannot map empty address range {range}");
        assert!(
            interval.begin() <= interval.end(),
            "cannot map during inverted time interval"
        );

        self.insert(Mapping {
            linked_object: linked_object.clone(),
            is_executable,
            range,
            interval,
        })
    }

    /// Map `linked_object` at `range` during `interval`.
    ///
    /// Use [`TimeInterval::forever`] for a linked object that was
    /// mapped for the whole life time of the process. An error of kind
    /// [`ErrorKind::InvalidInput`][crate::ErrorKind::InvalidInput] is
    /// reported, and nothing is changed, if the mapping would overlap
    /// an existing one both in space and in time.
    ///
    /// # Panics
    /// Panics if `range` is empty or `interval` is inverted.
    pub fn add_linked_object(
        &mut self,
        linked_object: &LinkedObject,
        range: AddressRange,
        interval: TimeInterval,
    ) -> Result<()> {
        self.add(linked_object, false, range, interval)
    }

    /// Map `linked_object` as the process' executable. See
    /// [`AddressSpace::add_linked_object`].
    pub fn add_executable(
        &mut self,
        linked_object: &LinkedObject,
        range: AddressRange,
        interval: TimeInterval,
    ) -> Result<()> {
        self.add(linked_object, true, range, interval)
    }

    /// Apply an event reporting that a linked object got loaded.
    ///
    /// The linked object is mapped from the time of the event onwards.
    /// A known linked object with a matching file name is reused;
    /// otherwise a new one is created.
    pub fn apply_loaded(&mut self, msg: &LoadedLinkedObjectMsg) -> Result<LinkedObject> {
        let range = AddressRange::from(msg.range);
        if range.is_empty() {
            return Err(Error::with_invalid_data(format!(
                "linked object {} loaded at empty range {range}",
                msg.linked_object.path.display()
            )))
        }

        let linked_object = self.find_or_create_linked_object(FileName::from(&msg.linked_object));
        let time = Time::from_nanos(msg.time);
        let () = self.insert(Mapping {
            linked_object: linked_object.clone(),
            is_executable: msg.is_executable,
            range,
            interval: TimeInterval::new(time, Time::THE_END),
        })?;

        debug!(
            "loaded {} at {range} at time {}",
            msg.linked_object.path.display(),
            msg.time
        );
        Ok(linked_object)
    }

    /// Apply an event reporting that a linked object got unloaded.
    ///
    /// The open mapping of the same linked object at the same range is
    /// closed at the time of the event. An event without such a
    /// mapping, or predating the load of the linked object, is reported
    /// as an error of kind
    /// [`ErrorKind::InvalidInput`][crate::ErrorKind::InvalidInput] and
    /// leaves the address space unchanged.
    pub fn apply_unloaded(&mut self, msg: &UnloadedLinkedObjectMsg) -> Result<()> {
        let range = AddressRange::from(msg.range);
        let file_name = FileName::from(&msg.linked_object);
        let time = Time::from_nanos(msg.time);

        let mapping = self
            .mappings
            .iter_mut()
            .find(|mapping| {
                mapping.range == range
                    && mapping.interval.end() == Time::THE_END
                    && mapping.linked_object.file_name().matches(&file_name)
            })
            .ok_or_invalid_input(|| {
                format!("no loaded linked object {file_name} at {range} to unload")
            });
        let mapping = match mapping {
            Ok(mapping) => mapping,
            Err(err) => {
                warn!("{err}");
                return Err(err)
            }
        };

        if time < mapping.interval.begin() {
            let msg = format!(
                "unload of {file_name} at time {} predates its load at time {}",
                time.as_nanos(),
                mapping.interval.begin().as_nanos()
            );
            warn!("{msg}");
            return Err(Error::with_invalid_input(msg))
        }

        mapping.interval = TimeInterval::new(mapping.interval.begin(), time);
        debug!(
            "unloaded {} at {range} at time {}",
            file_name.path().display(),
            msg.time
        );
        Ok(())
    }

    /// Apply a symbol table to the matching linked object.
    ///
    /// The table replaces the symbol table of a known linked object
    /// with a matching file name, visibly to all copies of that linked
    /// object. Otherwise a new, unmapped, linked object is registered.
    pub fn apply_symbol_table(&mut self, msg: &SymbolTableMsg) -> Result<LinkedObject> {
        let table = SymbolTable::try_from(msg).with_context(|| {
            format!(
                "failed to decode symbol table of {}",
                msg.linked_object.path.display()
            )
        })?;

        let linked_object = match self.find_linked_object(table.file_name()) {
            Some(linked_object) => {
                let () = linked_object.replace_symbol_table(table);
                linked_object
            }
            None => {
                let linked_object = LinkedObject::from_symbol_table(table);
                let () = self.register(&linked_object);
                linked_object
            }
        };
        Ok(linked_object)
    }

    /// Find the mapping containing `addr` at `time`.
    ///
    /// Use [`Time::now`] or [`AddressSpace::mapping_at_now`] to query the
    /// current state.
    pub fn mapping_at(&self, addr: Address, time: Time) -> Option<&Mapping> {
        self.index
            .find_at(addr)
            .into_iter()
            .map(|idx| &self.mappings[idx])
            .find(|mapping| mapping.interval.contains(time))
    }

    /// Find the linked object containing `addr` at `time`.
    pub fn linked_object_at(&self, addr: Address, time: Time) -> Option<LinkedObject> {
        self.mapping_at(addr, time)
            .map(|mapping| mapping.linked_object.clone())
    }

    /// Find the mapping containing `addr` right now.
    #[inline]
    pub fn mapping_at_now(&self, addr: Address) -> Option<&Mapping> {
        self.mapping_at(addr, Time::now())
    }

    /// Find the linked object containing `addr` right now.
    #[inline]
    pub fn linked_object_at_now(&self, addr: Address) -> Option<LinkedObject> {
        self.linked_object_at(addr, Time::now())
    }

    /// Retrieve all known linked objects.
    pub fn linked_objects(&self) -> BTreeSet<LinkedObject> {
        self.linked_objects.iter().cloned().collect()
    }

    /// Retrieve all known linked objects with the path `path`.
    pub fn linked_objects_by_path(&self, path: &Path) -> BTreeSet<LinkedObject> {
        self.linked_objects
            .iter()
            .filter(|linked_object| linked_object.path() == path)
            .cloned()
            .collect()
    }

    /// Retrieve all mappings, in order of insertion.
    #[inline]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Retrieve the mappings intersecting `range` during `interval`.
    pub fn mappings_intersecting(
        &self,
        range: &AddressRange,
        interval: &TimeInterval,
    ) -> Vec<&Mapping> {
        self.index
            .find_intersecting(range)
            .into_iter()
            .map(|idx| &self.mappings[idx])
            .filter(|mapping| mapping.interval.intersects(interval))
            .collect()
    }

    /// Convert the address space into a linked object group message
    /// describing the address space of `thread`.
    pub fn to_message(&self, thread: ThreadNameMsg) -> LinkedObjectGroupMsg {
        LinkedObjectGroupMsg {
            thread,
            linked_objects: self
                .mappings
                .iter()
                .map(|mapping| LinkedObjectMsg {
                    linked_object: (&mapping.linked_object.file_name()).into(),
                    range: mapping.range.into(),
                    time_begin: mapping.interval.begin().as_nanos(),
                    time_end: mapping.interval.end().as_nanos(),
                    is_executable: mapping.is_executable,
                })
                .collect(),
        }
    }

    /// Check whether `other` maps equally named linked objects at the
    /// same ranges during the same intervals.
    pub fn equivalent(&self, other: &AddressSpace) -> bool {
        let describe = |space: &AddressSpace| {
            space
                .mappings
                .iter()
                .map(|mapping| {
                    (
                        mapping.range,
                        mapping.interval,
                        mapping.is_executable,
                        mapping.linked_object.file_name(),
                    )
                })
                .collect::<BTreeSet<_>>()
        };

        self.mappings.len() == other.mappings.len() && describe(self) == describe(other)
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<&LinkedObjectGroupMsg> for AddressSpace {
    type Error = Error;

    fn try_from(msg: &LinkedObjectGroupMsg) -> Result<Self, Self::Error> {
        let mut space = Self::new();

        for entry in &msg.linked_objects {
            let range = AddressRange::from(entry.range);
            let interval = TimeInterval::new(
                Time::from_nanos(entry.time_begin),
                Time::from_nanos(entry.time_end),
            );
            if range.is_empty() || interval.begin() > interval.end() {
                return Err(Error::with_invalid_data(format!(
                    "linked object {} mapped at malformed range {range} or interval [{}, {})",
                    entry.linked_object.path.display(),
                    entry.time_begin,
                    entry.time_end,
                )))
            }

            let linked_object =
                space.find_or_create_linked_object(FileName::from(&entry.linked_object));
            let () = space.insert(Mapping {
                linked_object,
                is_executable: entry.is_executable,
                range,
                interval,
            })?;
        }
        Ok(space)
    }
}
