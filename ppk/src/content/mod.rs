//! Per-file content transformation: decoding, import stripping, formatting

pub mod extract;
pub mod format;
pub mod imports;
pub mod reader;

pub use extract::{DocumentExtractor, UnavailableExtractor};
pub use reader::read_to_text;
