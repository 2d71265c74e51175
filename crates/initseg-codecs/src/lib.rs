//! Initseg-Codecs: codec bitstream helpers for init segment construction
//!
//! The container layer needs a small amount of codec knowledge that lives
//! below the box level:
//!
//! - `h264` - NAL unit types, emulation prevention removal and a sequence
//!   parameter set parser that recovers the cropped picture dimensions
//! - `mpeg4audio` - AudioSpecificConfig encode/decode (ISO/IEC 14496-3)
//!
//! Both parsers operate on bits through `bitstream-io`.

pub mod error;
pub mod h264;
pub mod mpeg4audio;

pub use error::{CodecError, Result};
pub use h264::{NalUnitType, Sps};
pub use mpeg4audio::{AudioSpecificConfig, ObjectType};
