use anyhow::{Context, Result};
use initseg_fmp4::{AudioSpecificConfig, Track};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
}

impl Config {
    /// Convert every configured track, in declaration order.
    pub fn tracks(&self) -> Result<Vec<Track>> {
        self.tracks.iter().map(TrackConfig::to_track).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. "initseg=debug,initseg_fmp4=trace".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub filter: Option<String>,
}

/// A track declared in `[[tracks]]`, tagged by its `codec` key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "codec", rename_all = "kebab-case")]
pub enum TrackConfig {
    H264 {
        id: u32,

        #[serde(default = "default_video_timescale")]
        timescale: u32,

        /// Sequence parameter set NAL unit, hex encoded
        sps: String,

        /// Picture parameter set NAL unit, hex encoded
        pps: String,
    },
    Mpeg4Audio {
        id: u32,

        /// Defaults to the sample rate
        #[serde(default)]
        timescale: Option<u32>,

        #[serde(default = "default_object_type")]
        object_type: u8,

        sample_rate: u32,

        channels: u8,
    },
}

fn default_video_timescale() -> u32 {
    90000
}

/// AAC-LC
fn default_object_type() -> u8 {
    2
}

impl TrackConfig {
    pub fn id(&self) -> u32 {
        match self {
            Self::H264 { id, .. } | Self::Mpeg4Audio { id, .. } => *id,
        }
    }

    pub fn to_track(&self) -> Result<Track> {
        match self {
            Self::H264 {
                id,
                timescale,
                sps,
                pps,
            } => {
                let sps = hex::decode(sps.trim())
                    .with_context(|| format!("Track {}: SPS is not valid hex", id))?;
                let pps = hex::decode(pps.trim())
                    .with_context(|| format!("Track {}: PPS is not valid hex", id))?;
                Ok(Track::h264(*id, *timescale, sps, pps))
            }
            Self::Mpeg4Audio {
                id,
                timescale,
                object_type,
                sample_rate,
                channels,
            } => Ok(Track::mpeg4_audio(
                *id,
                timescale.unwrap_or(*sample_rate),
                AudioSpecificConfig {
                    object_type: *object_type,
                    sample_rate: *sample_rate,
                    channel_count: *channels,
                },
            )),
        }
    }
}
