//! File discovery: resource selection and tree rendering

pub mod selector;
pub mod tree;

pub use selector::{SelectError, matches_pattern, select};
