//! Population of symbol tables from debug information.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::PathBuf;

use crate::log::debug;
use crate::log::trace;
use crate::AddressRange;
use crate::Error;
use crate::ErrorExt as _;
use crate::LinkedObject;
use crate::Result;


/// Debug information about a function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionInfo {
    /// The mangled name of the function.
    pub name: String,
    /// Addresses occupied by the function, relative to the start of
    /// the linked object.
    pub range: AddressRange,
}

/// Debug information about a source statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementInfo {
    /// The source file containing the statement.
    pub path: PathBuf,
    /// The line of the statement.
    pub line: u32,
    /// The column of the statement.
    pub column: u32,
    /// Addresses occupied by the statement, relative to the start of
    /// the linked object.
    pub range: AddressRange,
}


/// A source of debug information for a single linked object.
///
/// A function or statement may be reported multiple times, once for
/// each of its address ranges.
pub trait DebugInfo
where
    Self: Debug,
{
    /// Retrieve the functions of the linked object.
    fn functions(&self) -> Result<Vec<FunctionInfo>>;

    /// Retrieve the source statements of the linked object.
    fn statements(&self) -> Result<Vec<StatementInfo>>;
}


/// Add the functions and statements described by `info` to the symbol
/// table of `linked_object`.
///
/// Records describing the same function (by name) or the same
/// statement (by location) are merged into a single entry. Debug
/// information is only trusted if the file backing the linked object
/// still has the recorded checksum; a linked object with an unknown
/// checksum is not checked.
#[cfg_attr(feature = "tracing", crate::log::instrument(skip_all, fields(path = ?linked_object.path())))]
pub fn resolve(linked_object: &LinkedObject, info: &dyn DebugInfo) -> Result<()> {
    let file_name = linked_object.file_name();
    if file_name.checksum() != 0 && !file_name.is_current()? {
        return Err(Error::with_invalid_data(format!(
            "{} changed since it was loaded",
            file_name.path().display()
        )))
    }

    let mut functions = BTreeMap::<String, Vec<AddressRange>>::new();
    for function in info
        .functions()
        .with_context(|| format!("failed to read functions of {info:?}"))?
    {
        trace!("function {} at {}", function.name, function.range);
        let () = functions
            .entry(function.name)
            .or_default()
            .push(function.range);
    }

    let mut statements = BTreeMap::<(PathBuf, u32, u32), Vec<AddressRange>>::new();
    for statement in info
        .statements()
        .with_context(|| format!("failed to read statements of {info:?}"))?
    {
        let () = statements
            .entry((statement.path, statement.line, statement.column))
            .or_default()
            .push(statement.range);
    }

    debug!(
        "adding {} functions and {} statements to {}",
        functions.len(),
        statements.len(),
        file_name.path().display()
    );

    let mut table = linked_object.write();
    for (name, ranges) in functions {
        let uid = table.add_function(name);
        let () = table.add_function_address_ranges(uid, ranges);
    }
    for ((path, line, column), ranges) in statements {
        let uid = table.add_statement(path, line, column);
        let () = table.add_statement_address_ranges(uid, ranges);
    }
    Ok(())
}
