//! Plain data representations of the messages exchanged with the
//! collection and transport layer.
//!
//! These types only describe the shape of the data. Serialization to
//! bytes is left to the transport. Conversions to and from the engine's
//! types live next to the respective engine type.

use std::path::PathBuf;


/// A file name along with a checksum of the file's contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FileNameMsg {
    /// The path of the file.
    pub path: PathBuf,
    /// The CRC-64 checksum of the file's contents, or zero if unknown.
    pub checksum: u64,
}

/// A half-open address range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AddressRangeMsg {
    /// The first address of the range.
    pub begin: u64,
    /// The first address past the range.
    pub end: u64,
}

/// An address range with one membership bit per address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AddressBitmapMsg {
    /// The range covered by the bitmap.
    pub range: AddressRangeMsg,
    /// The packed membership bits. Address `range.begin + i` maps to
    /// bit `i % 8` (least significant first) of byte `i / 8`.
    pub bitmap: Vec<u8>,
}

/// A function entry of a symbol table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FunctionEntryMsg {
    /// The mangled name of the function.
    pub name: String,
    /// The addresses occupied by the function.
    pub bitmaps: Vec<AddressBitmapMsg>,
}

/// A statement entry of a symbol table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatementEntryMsg {
    /// The source file containing the statement.
    pub path: PathBuf,
    /// The one-based line number of the statement.
    pub line: u32,
    /// The one-based column number of the statement, or zero.
    pub column: u32,
    /// The addresses occupied by the statement.
    pub bitmaps: Vec<AddressBitmapMsg>,
}

/// The symbol table of a single linked object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SymbolTableMsg {
    /// The linked object described by the table.
    pub linked_object: FileNameMsg,
    /// All function entries, in unique identifier order.
    pub functions: Vec<FunctionEntryMsg>,
    /// All statement entries, in unique identifier order.
    pub statements: Vec<StatementEntryMsg>,
}

/// The identity of a thread.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ThreadNameMsg {
    /// The name of the host the thread runs on.
    pub host: String,
    /// The process identifier.
    pub pid: u64,
    /// The POSIX thread identifier, if known.
    pub posix_tid: Option<u64>,
}

/// A linked object mapped into an address space for a period of time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LinkedObjectMsg {
    /// The linked object that was mapped.
    pub linked_object: FileNameMsg,
    /// The address range it occupied.
    pub range: AddressRangeMsg,
    /// The time at which it was loaded.
    pub time_begin: u64,
    /// The time at which it was unloaded.
    pub time_end: u64,
    /// Whether the linked object is the executable.
    pub is_executable: bool,
}

/// The linked objects of an address space.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LinkedObjectGroupMsg {
    /// The thread whose address space is described.
    pub thread: ThreadNameMsg,
    /// The mappings of the address space.
    pub linked_objects: Vec<LinkedObjectMsg>,
}

/// An event reporting that a linked object got loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LoadedLinkedObjectMsg {
    /// The threads sharing the affected address space.
    pub threads: Vec<ThreadNameMsg>,
    /// The time at which the linked object got loaded.
    pub time: u64,
    /// The address range the linked object got loaded at.
    pub range: AddressRangeMsg,
    /// The linked object that got loaded.
    pub linked_object: FileNameMsg,
    /// Whether the linked object is the executable.
    pub is_executable: bool,
}

/// An event reporting that a linked object got unloaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UnloadedLinkedObjectMsg {
    /// The threads sharing the affected address space.
    pub threads: Vec<ThreadNameMsg>,
    /// The time at which the linked object got unloaded.
    pub time: u64,
    /// The address range the linked object was loaded at.
    pub range: AddressRangeMsg,
    /// The linked object that got unloaded.
    pub linked_object: FileNameMsg,
}
