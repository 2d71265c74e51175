//! H.264 / AVC bitstream helpers

mod nal;
mod sps;

pub use nal::{remove_emulation_prevention, NalUnitType};
pub use sps::Sps;
