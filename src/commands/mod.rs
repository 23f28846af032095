//! CLI commands implementation

pub mod compare;
pub mod init;
pub mod parse;
pub mod report;
pub mod track;

pub use compare::*;
pub use init::*;
pub use parse::*;
pub use report::*;
pub use track::*;
