//! Symbol tables of linked objects and the handles referring into
//! them.

mod function;
mod index;
mod linked_object;
mod statement;
mod table;

pub(crate) use index::AddressRangeIndex;

pub use function::Function;
pub use linked_object::LinkedObject;
pub use statement::Statement;
pub use table::SymbolTable;
pub use table::UniqueId;
