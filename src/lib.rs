//! **symspace** is a library for keeping track of the symbols of a
//! profiled process: the functions and source statements of every
//! linked object and which linked object occupied which addresses at
//! which time.
#![doc = include_str!("../README.md")]

mod address;
mod address_space;
mod bitmap;
mod demangle;
mod error;
mod file_name;
mod interval;
mod log;
pub mod message;
mod mmap;
pub mod partition;
mod resolve;
mod symtab;
mod time;
mod util;


pub use crate::address::Address;
pub use crate::address_space::AddressSpace;
pub use crate::address_space::Mapping;
pub use crate::bitmap::AddressBitmap;
pub use crate::demangle::demangle;
pub use crate::error::Error;
pub use crate::error::ErrorExt;
pub use crate::error::ErrorKind;
pub use crate::error::IntoCowStr;
pub use crate::error::Result;
pub use crate::file_name::FileName;
pub use crate::interval::AddressRange;
pub use crate::interval::Interval;
pub use crate::interval::TimeInterval;
pub use crate::resolve::resolve;
pub use crate::resolve::DebugInfo;
pub use crate::resolve::FunctionInfo;
pub use crate::resolve::StatementInfo;
pub use crate::symtab::Function;
pub use crate::symtab::LinkedObject;
pub use crate::symtab::Statement;
pub use crate::symtab::SymbolTable;
pub use crate::symtab::UniqueId;
pub use crate::time::Time;
