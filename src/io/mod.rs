//! Container framing and the byte-source/byte-sink endpoints.
//!
//! The pipeline is agnostic of where bytes come from or go to: jobs carry a
//! boxed [`ByteReader`] and [`ByteWriter`], with file-backed and in-memory
//! implementations of each.

pub mod container;
pub mod sink;
pub mod source;

pub use container::{
    block_prefix, container_header, parse_block_prefix, parse_container_header, BLOCK_PREFIX_LEN,
    CONTAINER_HEADER_LEN, CONTAINER_MAGIC,
};
pub use sink::{ByteWriter, FileSink, MemorySink};
pub use source::{ByteReader, FileSource, MemorySource};
