//! Pagination engine: flow content into fixed pages.
//!
//! Measurement (line wrapping, block extents) is pure and runs in parallel
//! across blocks; packing is a sequential walk in document order so page
//! boundaries never depend on processing order.

mod engine;
mod measure;

pub use engine::{paginate, PaginationRules};
pub use measure::{text_width, wrap, Fragment, WrappedLine};
