//! Command implementations

pub mod completions;
pub mod eval;
pub mod init;
pub mod quote;
pub mod validate;
