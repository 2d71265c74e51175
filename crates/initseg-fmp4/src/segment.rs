//! Owned init segment description.

use bytes::Bytes;

use crate::error::Result;
use crate::track::Track;
use crate::{decode_init, encode_init};

/// Ordered track list of an init segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitSegment {
    pub tracks: Vec<Track>,
}

impl InitSegment {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Serialize to `ftyp` + `moov`.
    pub fn marshal(&self) -> Result<Bytes> {
        encode_init(&self.tracks)
    }

    /// Parse from `ftyp` + `moov` bytes.
    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        Ok(Self {
            tracks: decode_init(data)?,
        })
    }

    /// Look up a track by id.
    pub fn track(&self, id: u32) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }
}
