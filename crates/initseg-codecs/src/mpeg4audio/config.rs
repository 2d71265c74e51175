//! AudioSpecificConfig encoding and decoding

use std::fmt;
use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::error::{CodecError, Result};

/// Sampling frequencies addressable by samplingFrequencyIndex 0..=12
pub const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Escape value for an explicit 24-bit sampling frequency
const EXPLICIT_FREQUENCY_INDEX: u8 = 15;

/// Escape value for audioObjectTypeExt
const OBJECT_TYPE_ESCAPE: u8 = 31;

/// Audio object types that matter for HLS delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    AacMain,
    /// AAC Low Complexity, the common case
    AacLc,
    AacSsr,
    AacLtp,
    /// Spectral band replication (HE-AAC)
    Sbr,
    AacScalable,
    /// Parametric stereo (HE-AACv2)
    Ps,
    Other(u8),
}

impl From<u8> for ObjectType {
    fn from(value: u8) -> Self {
        match value {
            1 => ObjectType::AacMain,
            2 => ObjectType::AacLc,
            3 => ObjectType::AacSsr,
            4 => ObjectType::AacLtp,
            5 => ObjectType::Sbr,
            6 => ObjectType::AacScalable,
            29 => ObjectType::Ps,
            v => ObjectType::Other(v),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::AacMain => write!(f, "AAC Main"),
            ObjectType::AacLc => write!(f, "AAC-LC"),
            ObjectType::AacSsr => write!(f, "AAC SSR"),
            ObjectType::AacLtp => write!(f, "AAC LTP"),
            ObjectType::Sbr => write!(f, "HE-AAC (SBR)"),
            ObjectType::AacScalable => write!(f, "AAC Scalable"),
            ObjectType::Ps => write!(f, "HE-AACv2 (PS)"),
            ObjectType::Other(v) => write!(f, "object type {}", v),
        }
    }
}

/// MPEG-4 AudioSpecificConfig with a GASpecificConfig tail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// audioObjectType (2 = AAC-LC)
    pub object_type: u8,
    /// Sampling frequency in Hz
    pub sample_rate: u32,
    /// Number of output channels
    pub channel_count: u8,
}

impl AudioSpecificConfig {
    /// Object type as an enum.
    pub fn kind(&self) -> ObjectType {
        ObjectType::from(self.object_type)
    }

    /// Serialize to the byte-aligned bitstream carried in DecoderSpecificInfo.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.object_type == 0 || self.object_type == OBJECT_TYPE_ESCAPE || self.object_type > 95
        {
            return Err(CodecError::invalid_config(format!(
                "audio object type {} cannot be encoded",
                self.object_type
            )));
        }
        if self.sample_rate == 0 || self.sample_rate > 0x00FF_FFFF {
            return Err(CodecError::invalid_config(format!(
                "sample rate {} out of range",
                self.sample_rate
            )));
        }
        let channel_config: u8 = match self.channel_count {
            1..=6 => self.channel_count,
            8 => 7,
            n => {
                return Err(CodecError::invalid_config(format!(
                    "{} channels has no channel configuration",
                    n
                )))
            }
        };

        let mut writer = BitWriter::endian(Vec::with_capacity(5), BigEndian);

        if self.object_type > OBJECT_TYPE_ESCAPE {
            writer.write(5, OBJECT_TYPE_ESCAPE).map_err(write_error)?;
            writer
                .write(6, self.object_type - 32)
                .map_err(write_error)?;
        } else {
            writer.write(5, self.object_type).map_err(write_error)?;
        }

        match SAMPLING_FREQUENCIES
            .iter()
            .position(|&rate| rate == self.sample_rate)
        {
            Some(index) => writer.write(4, index as u8).map_err(write_error)?,
            None => {
                writer
                    .write(4, EXPLICIT_FREQUENCY_INDEX)
                    .map_err(write_error)?;
                writer.write(24, self.sample_rate).map_err(write_error)?;
            }
        }

        writer.write(4, channel_config).map_err(write_error)?;

        // GASpecificConfig: frameLengthFlag, dependsOnCoreCoder, extensionFlag
        writer.write(3, 0u8).map_err(write_error)?;
        writer.byte_align().map_err(write_error)?;

        Ok(writer.into_writer())
    }

    /// Parse an AudioSpecificConfig. Trailing GASpecificConfig bits are ignored.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::endian(data, BigEndian);

        let mut object_type: u8 = reader.read(5).map_err(read_error)?;
        if object_type == OBJECT_TYPE_ESCAPE {
            let ext: u8 = reader.read(6).map_err(read_error)?;
            object_type = 32 + ext;
        }
        if object_type == 0 {
            return Err(CodecError::invalid_config("audio object type 0"));
        }
        if matches!(ObjectType::from(object_type), ObjectType::Sbr | ObjectType::Ps) {
            return Err(CodecError::invalid_config(
                "explicit SBR/PS signalling is not supported",
            ));
        }

        let frequency_index: u8 = reader.read(4).map_err(read_error)?;
        let sample_rate = match frequency_index {
            0..=12 => SAMPLING_FREQUENCIES[frequency_index as usize],
            EXPLICIT_FREQUENCY_INDEX => reader.read::<u32>(24).map_err(read_error)?,
            reserved => {
                return Err(CodecError::invalid_config(format!(
                    "reserved sampling frequency index {}",
                    reserved
                )))
            }
        };
        if sample_rate == 0 {
            return Err(CodecError::invalid_config("sample rate 0"));
        }

        let channel_config: u8 = reader.read(4).map_err(read_error)?;
        let channel_count = match channel_config {
            0 => {
                return Err(CodecError::invalid_config(
                    "channel configuration 0 (program config element) is not supported",
                ))
            }
            1..=6 => channel_config,
            7 => 8,
            reserved => {
                return Err(CodecError::invalid_config(format!(
                    "reserved channel configuration {}",
                    reserved
                )))
            }
        };

        Ok(Self {
            object_type,
            sample_rate,
            channel_count,
        })
    }
}

fn read_error(_: io::Error) -> CodecError {
    CodecError::Truncated("AudioSpecificConfig")
}

fn write_error(e: io::Error) -> CodecError {
    CodecError::invalid_config(e.to_string())
}
