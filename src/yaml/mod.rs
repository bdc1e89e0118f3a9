//! Document parsing diagnostics

pub mod diagnostics;

pub use diagnostics::SyntaxError;
