//! Wikitext parsing: the nested-construct grammar, the fixed-point
//! extractor built on it, and the invocation parser that turns an
//! extracted template string into a name and an ordered parameter map.

pub mod extractor;
pub mod grammar;
pub mod invocation;

pub use extractor::{extract, Extraction};
pub use invocation::{parse as parse_invocation, Invocation};
