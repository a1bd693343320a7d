/// lib.rs — a sorted, memory-mappable on-disk table of protein motifs,
/// with a k-way stream merger and usable-motif selector on top.
pub mod codec;
pub mod error;
pub mod merge;
pub mod stream;
pub mod table;
pub mod usable;

pub use error::{OligoError, Result};
