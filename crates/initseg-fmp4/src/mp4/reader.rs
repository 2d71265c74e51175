//! Init segment reader: recursive descent over the box tree.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::boxes::{BoxIter, ByteReader, FourCc, RawBox};
use crate::codec;
use crate::error::{Error, Result};
use crate::track::{HandlerType, Track};

/// Parse an init segment into its tracks, in order of appearance.
///
/// Unknown boxes are skipped once their size has been validated. Any error
/// aborts the whole decode.
pub fn decode_init(data: &[u8]) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    let mut found_moov = false;

    for item in BoxIter::new(data) {
        let item = item?;
        match item.kind() {
            FourCc::MOOV => {
                found_moov = true;
                parse_moov(item.payload, &mut tracks)?;
            }
            other => skip(&item, other),
        }
    }

    if !found_moov {
        return Err(Error::MissingRequiredBox("moov"));
    }

    let mut seen = HashSet::with_capacity(tracks.len());
    for track in &tracks {
        if !seen.insert(track.id) {
            return Err(Error::invalid_track(format!("duplicate track id {}", track.id)));
        }
    }

    debug!(tracks = tracks.len(), bytes = data.len(), "decoded init segment");
    Ok(tracks)
}

fn skip(item: &RawBox<'_>, kind: FourCc) {
    trace!(box_type = %kind, size = item.header.size, "skipping box");
}

fn parse_moov(payload: &[u8], tracks: &mut Vec<Track>) -> Result<()> {
    for item in BoxIter::new(payload) {
        let item = item?;
        match item.kind() {
            FourCc::TRAK => {
                let mut state = TrackState::default();
                parse_trak_children(item.payload, &mut state)?;
                let track = state.finish()?;
                trace!(
                    track_id = track.id,
                    handler = %track.handler(),
                    sample_entry = %track.codec.sample_entry_kind(),
                    "decoded track"
                );
                tracks.push(track);
            }
            FourCc::MVEX => validate_children(item.payload)?,
            other => skip(&item, other),
        }
    }
    Ok(())
}

/// Walk a box scope only to validate its sizes.
fn validate_children(payload: &[u8]) -> Result<()> {
    for item in BoxIter::new(payload) {
        let item = item?;
        skip(&item, item.kind());
    }
    Ok(())
}

/// Fields collected while walking one `trak`. The sample entry is kept
/// raw until the handler is known.
#[derive(Debug, Default)]
struct TrackState<'a> {
    id: Option<u32>,
    time_scale: Option<u32>,
    handler: Option<HandlerType>,
    sample_entry: Option<RawBox<'a>>,
}

impl TrackState<'_> {
    fn finish(self) -> Result<Track> {
        let id = self.id.ok_or(Error::MissingRequiredBox("tkhd"))?;
        let time_scale = self.time_scale.ok_or(Error::MissingRequiredBox("mdhd"))?;
        let handler = self.handler.ok_or(Error::MissingRequiredBox("hdlr"))?;
        let entry = self.sample_entry.ok_or(Error::MissingRequiredBox("stsd"))?;

        if id == 0 {
            return Err(Error::invalid_track("track id 0"));
        }
        if time_scale == 0 {
            return Err(Error::invalid_track(format!(
                "track {} has a zero time scale",
                id
            )));
        }

        // The handler decides which adapter may run
        match codec::sample_entry_handler(entry.kind()) {
            Some(entry_handler) if entry_handler == handler => {}
            Some(_) => {
                return Err(Error::unsupported(format!(
                    "track {}: {} sample entry under a {} handler",
                    id,
                    entry.kind(),
                    handler
                )))
            }
            None => {
                return Err(Error::unsupported(format!(
                    "track {}: sample entry {}",
                    id,
                    entry.kind()
                )))
            }
        }
        let params = codec::parse_sample_entry(&entry)?;

        Ok(Track {
            id,
            time_scale,
            codec: params,
        })
    }
}

/// Descend through `trak` and the containers below it.
fn parse_trak_children<'a>(payload: &'a [u8], state: &mut TrackState<'a>) -> Result<()> {
    for item in BoxIter::new(payload) {
        let item = item?;
        match item.kind() {
            FourCc::MDIA | FourCc::MINF | FourCc::STBL => parse_trak_children(item.payload, state)?,
            FourCc::DINF => validate_children(item.payload)?,
            FourCc::TKHD => state.id = Some(parse_tkhd(item.payload)?),
            FourCc::MDHD => state.time_scale = Some(parse_mdhd(item.payload)?),
            FourCc::HDLR => state.handler = Some(parse_hdlr(item.payload)?),
            FourCc::STSD => state.sample_entry = Some(parse_stsd(item.payload)?),
            other => skip(&item, other),
        }
    }
    Ok(())
}

fn parse_tkhd(payload: &[u8]) -> Result<u32> {
    let mut r = ByteReader::new(payload, "tkhd");
    let (version, _flags) = r.full_box_header()?;
    // creation_time, modification_time
    if version == 1 {
        r.skip(16)?;
    } else {
        r.skip(8)?;
    }
    r.u32()
}

fn parse_mdhd(payload: &[u8]) -> Result<u32> {
    let mut r = ByteReader::new(payload, "mdhd");
    let (version, _flags) = r.full_box_header()?;
    if version == 1 {
        r.skip(16)?;
    } else {
        r.skip(8)?;
    }
    r.u32()
}

fn parse_hdlr(payload: &[u8]) -> Result<HandlerType> {
    let mut r = ByteReader::new(payload, "hdlr");
    r.full_box_header()?;
    r.u32()?; // pre_defined
    let code = r.fourcc()?;
    HandlerType::from_fourcc(code).ok_or_else(|| Error::unsupported(format!("handler {}", code)))
}

/// Locate the first sample entry. Decoding it waits for the handler.
fn parse_stsd(payload: &[u8]) -> Result<RawBox<'_>> {
    let mut r = ByteReader::new(payload, "stsd");
    r.full_box_header()?;
    let entry_count = r.u32()?;
    if entry_count == 0 {
        return Err(Error::MissingRequiredBox("sample entry"));
    }

    let mut entries = BoxIter::new(r.rest());
    let first = entries
        .next()
        .ok_or(Error::MissingRequiredBox("sample entry"))??;

    // Further entries are not used but must still be well-formed
    for entry in entries {
        let entry = entry?;
        skip(&entry, entry.kind());
    }

    Ok(first)
}
