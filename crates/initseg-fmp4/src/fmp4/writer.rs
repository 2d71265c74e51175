//! High-level init segment writer.

use std::collections::HashSet;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use super::boxes;
use crate::boxes::BoxNode;
use crate::error::{Error, Result};
use crate::track::Track;

/// Build the top-level boxes (`ftyp`, `moov`) for the given tracks.
pub fn init_segment_tree(tracks: &[Track]) -> Result<Vec<BoxNode>> {
    validate_tracks(tracks)?;
    Ok(vec![boxes::ftyp(), boxes::moov(tracks)?])
}

/// Generate an fMP4 initialization segment (ftyp + moov).
///
/// Tracks appear in the output in the order given. An empty track list
/// produces a segment with an empty `mvex`.
pub fn encode_init(tracks: &[Track]) -> Result<Bytes> {
    let tree = init_segment_tree(tracks)?;

    let mut buf = BytesMut::with_capacity(1024);
    for node in &tree {
        buf.put_slice(&node.encode());
    }

    debug!(tracks = tracks.len(), bytes = buf.len(), "encoded init segment");
    Ok(buf.freeze())
}

fn validate_tracks(tracks: &[Track]) -> Result<()> {
    let mut seen = HashSet::with_capacity(tracks.len());
    for track in tracks {
        if track.id == 0 {
            return Err(Error::invalid_track("track id must be non-zero"));
        }
        if track.time_scale == 0 {
            return Err(Error::invalid_track(format!(
                "track {} has a zero time scale",
                track.id
            )));
        }
        if !seen.insert(track.id) {
            return Err(Error::invalid_track(format!("duplicate track id {}", track.id)));
        }
    }
    Ok(())
}
