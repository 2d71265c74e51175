//! Human and JSON views of decoded tracks.

use std::fmt;

use initseg_codecs::Sps;
use initseg_fmp4::{CodecParams, Track};
use serde::Serialize;

/// Summary of one decoded track.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub id: u32,
    pub timescale: u32,
    /// "video" or "audio"
    pub kind: &'static str,
    /// RFC 6381 codec string, as used in HLS `CODECS` attributes
    pub codec: String,
    #[serde(flatten)]
    pub details: CodecDetails,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CodecDetails {
    Video {
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        sps: String,
        pps: String,
    },
    Audio {
        object_type: u8,
        sample_rate: u32,
        channels: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        config: Option<String>,
    },
}

impl TrackSummary {
    pub fn from_track(track: &Track) -> Self {
        let (kind, codec, details) = match &track.codec {
            CodecParams::H264(params) => {
                // Parameter sets from a decoded segment are not validated
                let sps = Sps::parse(&params.sps).ok();
                let codec = match params.sps.get(1..4) {
                    Some(ptl) => format!("avc1.{}", hex::encode(ptl)),
                    None => "avc1".to_string(),
                };
                (
                    "video",
                    codec,
                    CodecDetails::Video {
                        width: sps.as_ref().map(|s| s.width),
                        height: sps.as_ref().map(|s| s.height),
                        sps: hex::encode(&params.sps),
                        pps: hex::encode(&params.pps),
                    },
                )
            }
            CodecParams::Mpeg4Audio(params) => {
                let config = &params.config;
                (
                    "audio",
                    format!("mp4a.40.{}", config.object_type),
                    CodecDetails::Audio {
                        object_type: config.object_type,
                        sample_rate: config.sample_rate,
                        channels: config.channel_count,
                        config: config.encode().ok().map(hex::encode),
                    },
                )
            }
        };

        Self {
            id: track.id,
            timescale: track.time_scale,
            kind,
            codec,
            details,
        }
    }
}

impl fmt::Display for TrackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.id, self.kind, self.codec)?;
        match &self.details {
            CodecDetails::Video {
                width: Some(width),
                height: Some(height),
                ..
            } => write!(f, " {}x{}", width, height)?,
            CodecDetails::Video { .. } => {}
            CodecDetails::Audio {
                sample_rate,
                channels,
                ..
            } => write!(f, " {} Hz {}ch", sample_rate, channels)?,
        }
        write!(f, ", timescale {}", self.timescale)
    }
}

/// Summaries for all tracks, in segment order.
pub fn summarize(tracks: &[Track]) -> Vec<TrackSummary> {
    tracks.iter().map(TrackSummary::from_track).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use initseg_fmp4::AudioSpecificConfig;

    const SPS_1080P: [u8; 25] = [
        0x67, 0x42, 0xc0, 0x28, 0xd9, 0x00, 0x78, 0x02, 0x27, 0xe5, 0x84, 0x00, 0x00, 0x03, 0x00,
        0x04, 0x00, 0x00, 0x03, 0x00, 0xf0, 0x3c, 0x60, 0xc9, 0x20,
    ];

    #[test]
    fn test_video_summary() {
        let track = Track::h264(1, 90000, SPS_1080P.to_vec(), vec![0x68, 0xce]);
        let summary = TrackSummary::from_track(&track);

        assert_eq!(summary.codec, "avc1.42c028");
        assert_eq!(
            summary.to_string(),
            "[1] video avc1.42c028 1920x1080, timescale 90000"
        );

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["width"], 1920);
        assert_eq!(json["pps"], "68ce");
    }

    #[test]
    fn test_video_summary_with_unparseable_sps() {
        let track = Track::h264(3, 90000, vec![0x67, 0x42], vec![0x68]);
        let summary = TrackSummary::from_track(&track);

        assert_eq!(summary.codec, "avc1");
        assert_eq!(summary.to_string(), "[3] video avc1, timescale 90000");

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("width").is_none());
    }

    #[test]
    fn test_audio_summary() {
        let track = Track::mpeg4_audio(
            2,
            44100,
            AudioSpecificConfig {
                object_type: 2,
                sample_rate: 44100,
                channel_count: 2,
            },
        );
        let summary = TrackSummary::from_track(&track);

        assert_eq!(
            summary.to_string(),
            "[2] audio mp4a.40.2 44100 Hz 2ch, timescale 44100"
        );

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kind"], "audio");
        assert_eq!(json["channels"], 2);
        assert_eq!(json["config"], "1210");
    }
}
