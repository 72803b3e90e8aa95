use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use crate::log::debug;
use crate::message::AddressBitmapMsg;
use crate::message::FunctionEntryMsg;
use crate::message::StatementEntryMsg;
use crate::message::SymbolTableMsg;
use crate::partition::extract;
use crate::partition::partition_ranges;
use crate::Address;
use crate::AddressBitmap;
use crate::AddressRange;
use crate::Error;
use crate::ErrorExt as _;
use crate::FileName;
use crate::Result;

use super::index::AddressRangeIndex;


/// The identifier of a function or statement within its symbol table.
///
/// Identifiers are assigned in order of insertion, starting at zero,
/// and are never reused.
pub type UniqueId = usize;


#[derive(Clone, Debug, PartialEq, Eq)]
struct FunctionItem {
    name: String,
    bitmaps: Vec<AddressBitmap>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct StatementItem {
    path: PathBuf,
    line: u32,
    column: u32,
    bitmaps: Vec<AddressBitmap>,
}


#[cold]
#[track_caller]
fn out_of_bounds(kind: &str, uid: UniqueId, count: usize) -> ! {
    panic!("{kind} {uid} out of bounds for symbol table with {count} {kind}s")
}

fn decode_bitmaps(bitmaps: &[AddressBitmapMsg]) -> Result<Vec<AddressBitmap>> {
    bitmaps.iter().map(AddressBitmap::try_from).collect()
}

fn encode_bitmaps(bitmaps: &[AddressBitmap]) -> Vec<AddressBitmapMsg> {
    bitmaps.iter().map(AddressBitmapMsg::from).collect()
}

/// Merge `ranges` into the address set encoded by `bitmaps`, returning
/// the merged set.
fn accumulate<I>(bitmaps: &mut Vec<AddressBitmap>, ranges: I) -> BTreeSet<AddressRange>
where
    I: IntoIterator<Item = AddressRange>,
{
    let current = extract(bitmaps.iter());
    *bitmaps = partition_ranges(current.into_iter().chain(ranges));
    extract(bitmaps.iter())
}


/// The functions and statements of a single linked object.
///
/// Every function and statement is associated with a set of addresses.
/// Sets are stored as partitioned address bitmaps and are indexed, so
/// that the entries containing a given address can be found in
/// logarithmic time.
///
/// Addressing an entry with an identifier that was not handed out by
/// the same table is a bug and causes a panic.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    /// The linked object described by this table.
    file_name: FileName,
    functions: Vec<FunctionItem>,
    statements: Vec<StatementItem>,
    function_index: AddressRangeIndex<UniqueId>,
    statement_index: AddressRangeIndex<UniqueId>,
}

impl SymbolTable {
    /// Create an empty symbol table for the linked object `file_name`.
    pub fn new(file_name: FileName) -> Self {
        Self {
            file_name,
            functions: Vec::new(),
            statements: Vec::new(),
            function_index: AddressRangeIndex::new(),
            statement_index: AddressRangeIndex::new(),
        }
    }

    /// Retrieve the name of the linked object described by this table.
    #[inline]
    pub fn file_name(&self) -> &FileName {
        &self.file_name
    }

    fn function(&self, uid: UniqueId) -> &FunctionItem {
        let count = self.functions.len();
        self.functions
            .get(uid)
            .unwrap_or_else(|| out_of_bounds("function", uid, count))
    }

    fn statement(&self, uid: UniqueId) -> &StatementItem {
        let count = self.statements.len();
        self.statements
            .get(uid)
            .unwrap_or_else(|| out_of_bounds("statement", uid, count))
    }

    /// Add a function without any addresses.
    pub fn add_function<S>(&mut self, name: S) -> UniqueId
    where
        S: Into<String>,
    {
        let uid = self.functions.len();
        let () = self.functions.push(FunctionItem {
            name: name.into(),
            bitmaps: Vec::new(),
        });
        uid
    }

    /// Add `ranges` to the addresses of function `uid`.
    pub fn add_function_address_ranges<I>(&mut self, uid: UniqueId, ranges: I)
    where
        I: IntoIterator<Item = AddressRange>,
    {
        let count = self.functions.len();
        let item = self
            .functions
            .get_mut(uid)
            .unwrap_or_else(|| out_of_bounds("function", uid, count));
        let ranges = accumulate(&mut item.bitmaps, ranges);
        let () = self.function_index.insert(uid, ranges);
    }

    /// Add a statement without any addresses.
    pub fn add_statement<P>(&mut self, path: P, line: u32, column: u32) -> UniqueId
    where
        P: Into<PathBuf>,
    {
        let uid = self.statements.len();
        let () = self.statements.push(StatementItem {
            path: path.into(),
            line,
            column,
            bitmaps: Vec::new(),
        });
        uid
    }

    /// Add `ranges` to the addresses of statement `uid`.
    pub fn add_statement_address_ranges<I>(&mut self, uid: UniqueId, ranges: I)
    where
        I: IntoIterator<Item = AddressRange>,
    {
        let count = self.statements.len();
        let item = self
            .statements
            .get_mut(uid)
            .unwrap_or_else(|| out_of_bounds("statement", uid, count));
        let ranges = accumulate(&mut item.bitmaps, ranges);
        let () = self.statement_index.insert(uid, ranges);
    }

    fn push_function(&mut self, item: FunctionItem) -> UniqueId {
        let ranges = extract(item.bitmaps.iter());
        let uid = self.functions.len();
        let () = self.functions.push(item);
        let () = self.function_index.insert(uid, ranges);
        uid
    }

    fn push_statement(&mut self, item: StatementItem) -> UniqueId {
        let ranges = extract(item.bitmaps.iter());
        let uid = self.statements.len();
        let () = self.statements.push(item);
        let () = self.statement_index.insert(uid, ranges);
        uid
    }

    /// Copy function `uid` of `other` into this table, returning the
    /// identifier of the copy.
    pub fn clone_function(&mut self, other: &SymbolTable, uid: UniqueId) -> UniqueId {
        let item = other.function(uid).clone();
        self.push_function(item)
    }

    /// Copy function `uid` of this table, returning the identifier of
    /// the copy.
    pub fn duplicate_function(&mut self, uid: UniqueId) -> UniqueId {
        let item = self.function(uid).clone();
        self.push_function(item)
    }

    /// Copy statement `uid` of `other` into this table, returning the
    /// identifier of the copy.
    pub fn clone_statement(&mut self, other: &SymbolTable, uid: UniqueId) -> UniqueId {
        let item = other.statement(uid).clone();
        self.push_statement(item)
    }

    /// Copy statement `uid` of this table, returning the identifier of
    /// the copy.
    pub fn duplicate_statement(&mut self, uid: UniqueId) -> UniqueId {
        let item = self.statement(uid).clone();
        self.push_statement(item)
    }

    /// Retrieve the identifiers of all functions.
    pub fn functions(&self) -> impl ExactSizeIterator<Item = UniqueId> {
        0..self.functions.len()
    }

    /// Retrieve the identifiers of all statements.
    pub fn statements(&self) -> impl ExactSizeIterator<Item = UniqueId> {
        0..self.statements.len()
    }

    /// Retrieve the mangled name of function `uid`.
    pub fn function_name(&self, uid: UniqueId) -> &str {
        &self.function(uid).name
    }

    /// Retrieve the addresses of function `uid`.
    pub fn function_address_ranges(&self, uid: UniqueId) -> BTreeSet<AddressRange> {
        extract(self.function(uid).bitmaps.iter())
    }

    /// Retrieve the source file of statement `uid`.
    pub fn statement_path(&self, uid: UniqueId) -> &Path {
        &self.statement(uid).path
    }

    /// Retrieve the line number of statement `uid`.
    pub fn statement_line(&self, uid: UniqueId) -> u32 {
        self.statement(uid).line
    }

    /// Retrieve the column number of statement `uid`.
    pub fn statement_column(&self, uid: UniqueId) -> u32 {
        self.statement(uid).column
    }

    /// Retrieve the addresses of statement `uid`.
    pub fn statement_address_ranges(&self, uid: UniqueId) -> BTreeSet<AddressRange> {
        extract(self.statement(uid).bitmaps.iter())
    }

    /// Find the functions containing `addr`.
    pub fn functions_at(&self, addr: Address) -> BTreeSet<UniqueId> {
        self.function_index.find_at(addr)
    }

    /// Find the functions with at least one address in `range`.
    pub fn functions_intersecting(&self, range: &AddressRange) -> BTreeSet<UniqueId> {
        self.function_index.find_intersecting(range)
    }

    /// Find the functions with the mangled name `name`.
    pub fn functions_by_name(&self, name: &str) -> BTreeSet<UniqueId> {
        self.functions
            .iter()
            .enumerate()
            .filter(|(_uid, item)| item.name == name)
            .map(|(uid, _item)| uid)
            .collect()
    }

    /// Find the statements containing `addr`.
    pub fn statements_at(&self, addr: Address) -> BTreeSet<UniqueId> {
        self.statement_index.find_at(addr)
    }

    /// Find the statements with at least one address in `range`.
    pub fn statements_intersecting(&self, range: &AddressRange) -> BTreeSet<UniqueId> {
        self.statement_index.find_intersecting(range)
    }

    /// Find the statements located in the source file `path`.
    pub fn statements_by_source_file(&self, path: &Path) -> BTreeSet<UniqueId> {
        self.statements
            .iter()
            .enumerate()
            .filter(|(_uid, item)| item.path == path)
            .map(|(uid, _item)| uid)
            .collect()
    }

    /// Find the statements defining function `uid`, i.e., those
    /// containing its lowest address.
    pub fn function_definitions(&self, uid: UniqueId) -> BTreeSet<UniqueId> {
        match self.function_address_ranges(uid).first() {
            Some(range) => self.statements_at(range.begin()),
            None => BTreeSet::new(),
        }
    }

    /// Find the statements sharing at least one address with function
    /// `uid`.
    pub fn function_statements(&self, uid: UniqueId) -> BTreeSet<UniqueId> {
        self.function_address_ranges(uid)
            .iter()
            .flat_map(|range| self.statements_intersecting(range))
            .collect()
    }

    /// Find the functions sharing at least one address with statement
    /// `uid`.
    pub fn statement_functions(&self, uid: UniqueId) -> BTreeSet<UniqueId> {
        self.statement_address_ranges(uid)
            .iter()
            .flat_map(|range| self.functions_intersecting(range))
            .collect()
    }
}

impl TryFrom<&SymbolTableMsg> for SymbolTable {
    type Error = Error;

    #[cfg_attr(feature = "tracing", crate::log::instrument(skip_all, fields(path = ?msg.linked_object.path)))]
    fn try_from(msg: &SymbolTableMsg) -> Result<Self, Self::Error> {
        let mut table = Self::new(FileName::from(&msg.linked_object));

        for function in &msg.functions {
            let bitmaps = decode_bitmaps(&function.bitmaps)
                .with_context(|| format!("invalid addresses for function `{}`", function.name))?;
            let _uid = table.push_function(FunctionItem {
                name: function.name.clone(),
                bitmaps,
            });
        }

        for statement in &msg.statements {
            let bitmaps = decode_bitmaps(&statement.bitmaps).with_context(|| {
                format!(
                    "invalid addresses for statement {}:{}:{}",
                    statement.path.display(),
                    statement.line,
                    statement.column
                )
            })?;
            let _uid = table.push_statement(StatementItem {
                path: statement.path.clone(),
                line: statement.line,
                column: statement.column,
                bitmaps,
            });
        }

        debug!(
            "decoded symbol table for {} with {} functions and {} statements",
            table.file_name,
            table.functions.len(),
            table.statements.len()
        );
        Ok(table)
    }
}

impl From<&SymbolTable> for SymbolTableMsg {
    fn from(table: &SymbolTable) -> Self {
        Self {
            linked_object: (&table.file_name).into(),
            functions: table
                .functions
                .iter()
                .map(|item| FunctionEntryMsg {
                    name: item.name.clone(),
                    bitmaps: encode_bitmaps(&item.bitmaps),
                })
                .collect(),
            statements: table
                .statements
                .iter()
                .map(|item| StatementEntryMsg {
                    path: item.path.clone(),
                    line: item.line,
                    column: item.column,
                    bitmaps: encode_bitmaps(&item.bitmaps),
                })
                .collect(),
        }
    }
}
