use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::Hash;
use std::hash::Hasher;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use crate::message::SymbolTableMsg;
use crate::Address;
use crate::AddressRange;
use crate::Error;
use crate::FileName;
use crate::Result;

use super::Function;
use super::Statement;
use super::SymbolTable;


/// An executable or shared library, along with its symbol table.
///
/// Copies of a `LinkedObject` share the same symbol table: changes made
/// through one copy are visible through all others. Two linked objects
/// compare equal if and only if they share their symbol table.
#[derive(Clone, Debug)]
pub struct LinkedObject {
    table: Arc<RwLock<SymbolTable>>,
}

impl LinkedObject {
    /// Create a linked object with an empty symbol table for the file
    /// at `path`, checksumming the file's contents.
    pub fn new<P>(path: P) -> Result<Self>
    where
        P: Into<PathBuf>,
    {
        let file_name = FileName::from_path(path)?;
        Ok(Self::from_file_name(file_name))
    }

    /// Create a linked object with an empty symbol table for
    /// `file_name`.
    pub fn from_file_name(file_name: FileName) -> Self {
        Self::from_symbol_table(SymbolTable::new(file_name))
    }

    /// Create a linked object owning `table`.
    pub fn from_symbol_table(table: SymbolTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// Create a linked object that owns an independent copy of this
    /// one's symbol table.
    pub fn deep_clone(&self) -> Self {
        Self::from_symbol_table(self.read().clone())
    }

    /// Replace the symbol table, for every copy of this linked object.
    pub fn replace_symbol_table(&self, table: SymbolTable) {
        *self.write() = table;
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, SymbolTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, SymbolTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retrieve the file name of the linked object.
    pub fn file_name(&self) -> FileName {
        self.read().file_name().clone()
    }

    /// Retrieve the path of the linked object.
    pub fn path(&self) -> PathBuf {
        self.read().file_name().path().to_path_buf()
    }

    /// Retrieve the checksum of the linked object's contents.
    pub fn checksum(&self) -> u64 {
        self.read().file_name().checksum()
    }

    /// Convert the symbol table into its message representation.
    pub fn to_message(&self) -> SymbolTableMsg {
        SymbolTableMsg::from(&*self.read())
    }

    fn functions_from(&self, uids: BTreeSet<usize>) -> BTreeSet<Function> {
        uids.into_iter()
            .map(|uid| Function::from_parts(self.clone(), uid))
            .collect()
    }

    fn statements_from(&self, uids: BTreeSet<usize>) -> BTreeSet<Statement> {
        uids.into_iter()
            .map(|uid| Statement::from_parts(self.clone(), uid))
            .collect()
    }

    /// Retrieve all functions.
    pub fn functions(&self) -> BTreeSet<Function> {
        let uids = self.read().functions().collect();
        self.functions_from(uids)
    }

    /// Find the functions containing `addr`.
    pub fn functions_at(&self, addr: Address) -> BTreeSet<Function> {
        let uids = self.read().functions_at(addr);
        self.functions_from(uids)
    }

    /// Find the functions with at least one address in `range`.
    pub fn functions_intersecting(&self, range: &AddressRange) -> BTreeSet<Function> {
        let uids = self.read().functions_intersecting(range);
        self.functions_from(uids)
    }

    /// Find the functions with the mangled name `name`.
    pub fn functions_by_name(&self, name: &str) -> BTreeSet<Function> {
        let uids = self.read().functions_by_name(name);
        self.functions_from(uids)
    }

    /// Retrieve all statements.
    pub fn statements(&self) -> BTreeSet<Statement> {
        let uids = self.read().statements().collect();
        self.statements_from(uids)
    }

    /// Find the statements containing `addr`.
    pub fn statements_at(&self, addr: Address) -> BTreeSet<Statement> {
        let uids = self.read().statements_at(addr);
        self.statements_from(uids)
    }

    /// Find the statements with at least one address in `range`.
    pub fn statements_intersecting(&self, range: &AddressRange) -> BTreeSet<Statement> {
        let uids = self.read().statements_intersecting(range);
        self.statements_from(uids)
    }

    /// Find the statements located in the source file `path`.
    pub fn statements_by_source_file(&self, path: &Path) -> BTreeSet<Statement> {
        let uids = self.read().statements_by_source_file(path);
        self.statements_from(uids)
    }

    #[inline]
    fn as_ptr(&self) -> *const RwLock<SymbolTable> {
        Arc::as_ptr(&self.table)
    }
}

impl TryFrom<&SymbolTableMsg> for LinkedObject {
    type Error = Error;

    fn try_from(msg: &SymbolTableMsg) -> Result<Self, Self::Error> {
        SymbolTable::try_from(msg).map(Self::from_symbol_table)
    }
}

impl PartialEq for LinkedObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }
}

impl Eq for LinkedObject {}

impl PartialOrd for LinkedObject {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LinkedObject {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_ptr().cmp(&other.as_ptr())
    }
}

impl Hash for LinkedObject {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.as_ptr().hash(state)
    }
}
