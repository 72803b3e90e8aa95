use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::demangle::demangle;
use crate::AddressRange;

use super::LinkedObject;
use super::Statement;
use super::UniqueId;


/// A function of a linked object.
///
/// A `Function` is a lightweight handle referring to an entry of its
/// linked object's symbol table. Handles are equal if they refer to
/// the same entry of the same symbol table; two functions with the same
/// name in different tables are different functions.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Function {
    linked_object: LinkedObject,
    uid: UniqueId,
}

impl Function {
    /// Add a function named `name` (in mangled form) to
    /// `linked_object`.
    pub fn new<S>(linked_object: &LinkedObject, name: S) -> Self
    where
        S: Into<String>,
    {
        let uid = linked_object.write().add_function(name);
        Self::from_parts(linked_object.clone(), uid)
    }

    pub(crate) fn from_parts(linked_object: LinkedObject, uid: UniqueId) -> Self {
        Self { linked_object, uid }
    }

    /// Retrieve the linked object containing this function.
    #[inline]
    pub fn linked_object(&self) -> &LinkedObject {
        &self.linked_object
    }

    /// Retrieve the identifier of the function within its symbol
    /// table.
    #[inline]
    pub fn uid(&self) -> UniqueId {
        self.uid
    }

    /// Retrieve the mangled name of the function.
    pub fn mangled_name(&self) -> String {
        self.linked_object.read().function_name(self.uid).to_string()
    }

    /// Retrieve the demangled name of the function, or the mangled one
    /// if it cannot be demangled.
    pub fn demangled_name(&self) -> String {
        let table = self.linked_object.read();
        demangle(table.function_name(self.uid)).into_owned()
    }

    /// Retrieve the addresses occupied by the function.
    pub fn address_ranges(&self) -> BTreeSet<AddressRange> {
        self.linked_object
            .read()
            .function_address_ranges(self.uid)
    }

    /// Add `ranges` to the addresses occupied by the function.
    pub fn add_address_ranges<I>(&self, ranges: I)
    where
        I: IntoIterator<Item = AddressRange>,
    {
        self.linked_object
            .write()
            .add_function_address_ranges(self.uid, ranges)
    }

    /// Copy this function into `linked_object`.
    ///
    /// The copy starts out with the same name and addresses, but is
    /// otherwise independent of this function.
    pub fn clone_to(&self, linked_object: &LinkedObject) -> Function {
        let uid = if self.linked_object == *linked_object {
            linked_object.write().duplicate_function(self.uid)
        } else {
            let source = self.linked_object.read();
            let uid = linked_object.write().clone_function(&source, self.uid);
            uid
        };
        Self::from_parts(linked_object.clone(), uid)
    }

    /// Retrieve the statements defining this function, i.e., those
    /// containing its lowest address.
    pub fn definitions(&self) -> BTreeSet<Statement> {
        let uids = self.linked_object.read().function_definitions(self.uid);
        uids.into_iter()
            .map(|uid| Statement::from_parts(self.linked_object.clone(), uid))
            .collect()
    }

    /// Retrieve the statements sharing addresses with this function.
    pub fn statements(&self) -> BTreeSet<Statement> {
        let uids = self.linked_object.read().function_statements(self.uid);
        uids.into_iter()
            .map(|uid| Statement::from_parts(self.linked_object.clone(), uid))
            .collect()
    }

    /// Check whether `other` has the same name and addresses, no
    /// matter which symbol table it belongs to.
    pub fn equivalent(&self, other: &Function) -> bool {
        self.mangled_name() == other.mangled_name()
            && self.address_ranges() == other.address_ranges()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.demangled_name())
    }
}
