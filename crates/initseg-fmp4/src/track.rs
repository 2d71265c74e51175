//! Track model shared by the encoder and decoder.

use std::fmt;

pub use initseg_codecs::AudioSpecificConfig;

use crate::boxes::FourCc;

/// RTP payload type reported for decoded tracks.
pub const DEFAULT_PAYLOAD_TYPE: u8 = 96;

/// H.264 packetization mode (non-interleaved) reported for decoded tracks.
pub const DEFAULT_PACKETIZATION_MODE: u8 = 1;

/// AU-header field widths (RFC 3640 AAC-hbr) reported for decoded tracks.
pub const DEFAULT_SIZE_LENGTH: u8 = 13;
pub const DEFAULT_INDEX_LENGTH: u8 = 3;
pub const DEFAULT_INDEX_DELTA_LENGTH: u8 = 3;

/// One media track of an init segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Track identifier, non-zero and unique within a segment.
    pub id: u32,
    /// Ticks per second for this track's media timeline.
    pub time_scale: u32,
    pub codec: CodecParams,
}

impl Track {
    /// H.264 video track with default RTP parameters.
    pub fn h264(id: u32, time_scale: u32, sps: Vec<u8>, pps: Vec<u8>) -> Self {
        Self {
            id,
            time_scale,
            codec: CodecParams::H264(H264Params::new(sps, pps)),
        }
    }

    /// MPEG-4 audio track with default RTP parameters.
    pub fn mpeg4_audio(id: u32, time_scale: u32, config: AudioSpecificConfig) -> Self {
        Self {
            id,
            time_scale,
            codec: CodecParams::Mpeg4Audio(Mpeg4AudioParams::new(config)),
        }
    }

    pub fn handler(&self) -> HandlerType {
        self.codec.handler()
    }
}

/// Codec parameters, one variant per supported codec family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecParams {
    H264(H264Params),
    Mpeg4Audio(Mpeg4AudioParams),
}

impl CodecParams {
    pub fn handler(&self) -> HandlerType {
        match self {
            Self::H264(_) => HandlerType::Video,
            Self::Mpeg4Audio(_) => HandlerType::Audio,
        }
    }

    /// Sample entry type written to `stsd`.
    pub fn sample_entry_kind(&self) -> FourCc {
        match self {
            Self::H264(_) => FourCc::AVC1,
            Self::Mpeg4Audio(_) => FourCc::MP4A,
        }
    }
}

/// H.264 parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct H264Params {
    pub payload_type: u8,
    /// Sequence parameter set NAL unit, header byte included.
    pub sps: Vec<u8>,
    /// Picture parameter set NAL unit, header byte included.
    pub pps: Vec<u8>,
    pub packetization_mode: u8,
}

impl H264Params {
    pub fn new(sps: Vec<u8>, pps: Vec<u8>) -> Self {
        Self {
            payload_type: DEFAULT_PAYLOAD_TYPE,
            sps,
            pps,
            packetization_mode: DEFAULT_PACKETIZATION_MODE,
        }
    }
}

/// MPEG-4 audio parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mpeg4AudioParams {
    pub payload_type: u8,
    pub config: AudioSpecificConfig,
    pub size_length: u8,
    pub index_length: u8,
    pub index_delta_length: u8,
}

impl Mpeg4AudioParams {
    pub fn new(config: AudioSpecificConfig) -> Self {
        Self {
            payload_type: DEFAULT_PAYLOAD_TYPE,
            config,
            size_length: DEFAULT_SIZE_LENGTH,
            index_length: DEFAULT_INDEX_LENGTH,
            index_delta_length: DEFAULT_INDEX_DELTA_LENGTH,
        }
    }
}

/// Handler type from `hdlr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerType {
    Video,
    Audio,
}

impl HandlerType {
    pub fn from_fourcc(code: FourCc) -> Option<Self> {
        match &code.0 {
            b"vide" => Some(Self::Video),
            b"soun" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn fourcc(&self) -> FourCc {
        match self {
            Self::Video => FourCc(*b"vide"),
            Self::Audio => FourCc(*b"soun"),
        }
    }

    /// Human-readable name written into `hdlr`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "VideoHandler",
            Self::Audio => "SoundHandler",
        }
    }
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fourcc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_round_trip() {
        for handler in [HandlerType::Video, HandlerType::Audio] {
            assert_eq!(HandlerType::from_fourcc(handler.fourcc()), Some(handler));
        }
        assert_eq!(HandlerType::from_fourcc(FourCc(*b"text")), None);
    }

    #[test]
    fn test_constructors_use_defaults() {
        let video = Track::h264(1, 90000, vec![0x67; 4], vec![0x68]);
        match &video.codec {
            CodecParams::H264(p) => {
                assert_eq!(p.payload_type, 96);
                assert_eq!(p.packetization_mode, 1);
            }
            other => panic!("unexpected codec {:?}", other),
        }
        assert_eq!(video.handler(), HandlerType::Video);

        let audio = Track::mpeg4_audio(
            2,
            48000,
            AudioSpecificConfig {
                object_type: 2,
                sample_rate: 48000,
                channel_count: 2,
            },
        );
        match &audio.codec {
            CodecParams::Mpeg4Audio(p) => {
                assert_eq!((p.size_length, p.index_length, p.index_delta_length), (13, 3, 3));
            }
            other => panic!("unexpected codec {:?}", other),
        }
        assert_eq!(audio.codec.sample_entry_kind(), FourCc::MP4A);
    }
}
