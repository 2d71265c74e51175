//! MP4 init segment parsing.

mod reader;

pub use reader::decode_init;
