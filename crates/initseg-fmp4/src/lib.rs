//! Initseg-Fmp4: fragmented MP4 initialization segments for HLS
//!
//! An init segment (`ftyp` + `moov`) tells a player which tracks exist and
//! how to configure their decoders before any media fragment arrives. This
//! crate builds one from high-level codec parameters and parses one back.
//!
//! # Modules
//!
//! - `boxes` - Box envelope encoding/decoding and the `BoxNode` tree
//! - `codec` - Per-codec adapters (`avcC` for H.264, `esds` for MPEG-4 audio)
//! - `fmp4` - Init segment construction
//! - `mp4` - Init segment parsing
//! - `track` - Track and codec parameter types
//!
//! # Example
//!
//! ```no_run
//! use initseg_fmp4::{decode_init, encode_init, AudioSpecificConfig, Track};
//!
//! let audio = Track::mpeg4_audio(
//!     1,
//!     48000,
//!     AudioSpecificConfig { object_type: 2, sample_rate: 48000, channel_count: 2 },
//! );
//! let bytes = encode_init(&[audio.clone()]).unwrap();
//! assert_eq!(decode_init(&bytes).unwrap(), vec![audio]);
//! ```

pub mod boxes;
pub mod codec;
pub mod error;
pub mod fmp4;
pub mod mp4;
mod segment;
pub mod track;

pub use error::{Error, Result};
pub use fmp4::encode_init;
pub use mp4::decode_init;
pub use segment::InitSegment;
pub use track::{
    AudioSpecificConfig, CodecParams, H264Params, HandlerType, Mpeg4AudioParams, Track,
};
