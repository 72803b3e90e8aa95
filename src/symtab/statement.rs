use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::path::PathBuf;

use crate::AddressRange;

use super::Function;
use super::LinkedObject;
use super::UniqueId;


/// A source statement of a linked object.
///
/// Like [`Function`], a `Statement` is a handle referring to an entry
/// of its linked object's symbol table and compares by table and
/// identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Statement {
    linked_object: LinkedObject,
    uid: UniqueId,
}

impl Statement {
    /// Add a statement located at `path:line:column` to
    /// `linked_object`.
    pub fn new<P>(linked_object: &LinkedObject, path: P, line: u32, column: u32) -> Self
    where
        P: Into<PathBuf>,
    {
        let uid = linked_object.write().add_statement(path, line, column);
        Self::from_parts(linked_object.clone(), uid)
    }

    pub(crate) fn from_parts(linked_object: LinkedObject, uid: UniqueId) -> Self {
        Self { linked_object, uid }
    }

    /// Retrieve the linked object containing this statement.
    #[inline]
    pub fn linked_object(&self) -> &LinkedObject {
        &self.linked_object
    }

    /// Retrieve the identifier of the statement within its symbol
    /// table.
    #[inline]
    pub fn uid(&self) -> UniqueId {
        self.uid
    }

    /// Retrieve the source file containing the statement.
    pub fn path(&self) -> PathBuf {
        self.linked_object
            .read()
            .statement_path(self.uid)
            .to_path_buf()
    }

    /// Retrieve the line number of the statement.
    pub fn line(&self) -> u32 {
        self.linked_object.read().statement_line(self.uid)
    }

    /// Retrieve the column number of the statement.
    pub fn column(&self) -> u32 {
        self.linked_object.read().statement_column(self.uid)
    }

    /// Retrieve the addresses occupied by the statement.
    pub fn address_ranges(&self) -> BTreeSet<AddressRange> {
        self.linked_object
            .read()
            .statement_address_ranges(self.uid)
    }

    /// Add `ranges` to the addresses occupied by the statement.
    pub fn add_address_ranges<I>(&self, ranges: I)
    where
        I: IntoIterator<Item = AddressRange>,
    {
        self.linked_object
            .write()
            .add_statement_address_ranges(self.uid, ranges)
    }

    /// Copy this statement into `linked_object`.
    pub fn clone_to(&self, linked_object: &LinkedObject) -> Statement {
        let uid = if self.linked_object == *linked_object {
            linked_object.write().duplicate_statement(self.uid)
        } else {
            let source = self.linked_object.read();
            let uid = linked_object.write().clone_statement(&source, self.uid);
            uid
        };
        Self::from_parts(linked_object.clone(), uid)
    }

    /// Retrieve the functions sharing addresses with this statement.
    pub fn functions(&self) -> BTreeSet<Function> {
        let uids = self.linked_object.read().statement_functions(self.uid);
        uids.into_iter()
            .map(|uid| Function::from_parts(self.linked_object.clone(), uid))
            .collect()
    }

    /// Check whether `other` has the same location and addresses, no
    /// matter which symbol table it belongs to.
    pub fn equivalent(&self, other: &Statement) -> bool {
        self.path() == other.path()
            && self.line() == other.line()
            && self.column() == other.column()
            && self.address_ranges() == other.address_ranges()
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let table = self.linked_object.read();
        write!(
            f,
            "{}:{}:{}",
            table.statement_path(self.uid).display(),
            table.statement_line(self.uid),
            table.statement_column(self.uid)
        )
    }
}
