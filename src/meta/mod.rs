//! Backend metadata — typed filters and result sets, per-kind capability
//! readers, plugin composition, the generic INFORMATION_SCHEMA reader and
//! the describe/list writers.

mod filter;
mod infoschema;
mod reader;
mod resultset;
mod types;
pub mod writer;

pub use filter::*;
pub use infoschema::*;
pub use reader::*;
pub use resultset::*;
pub use types::*;
