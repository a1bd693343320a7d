/// stream/mod.rs — line-oriented text streams, grounded on
/// `original_source/merge_and_build_kmers.cc`'s `FileSource`/`RawFileSource`/
/// `GzipFileSource`/`DataReader` hierarchy.
mod dedup;
mod source;

pub use dedup::DedupLines;
pub use source::StreamSource;
