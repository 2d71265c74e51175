//! Fragmented MP4 (fMP4) init segment serialization.
//!
//! The init segment is `ftyp` followed by a `moov` describing every track
//! with empty sample tables and an `mvex` announcing that samples arrive
//! in movie fragments.

mod boxes;
mod writer;

pub use writer::{encode_init, init_segment_tree};
