//! Codec adapters: translate between `CodecParams` and sample entries.
//!
//! - `avc` - `avc1` sample entries carrying an `avcC` record
//! - `aac` - `mp4a` sample entries carrying an `esds` descriptor
//! - `descriptor` - MPEG-4 Systems descriptor framing used by `esds`

pub mod aac;
pub mod avc;
pub mod descriptor;

use tracing::trace;

use crate::boxes::{BoxIter, ByteReader, FourCc, RawBox};
use crate::error::{Error, Result};
use crate::track::{CodecParams, HandlerType};

/// Fixed fields of a VisualSampleEntry before its child boxes.
pub const VISUAL_SAMPLE_ENTRY_SIZE: usize = 78;

/// Fixed fields of an AudioSampleEntry (version 0) before its child boxes.
pub const AUDIO_SAMPLE_ENTRY_SIZE: usize = 28;

/// Extra fields in QuickTime sound sample description versions 1 and 2.
const SOUND_V1_EXTRA: usize = 16;
const SOUND_V2_EXTRA: usize = 36;

/// Handler a sample entry type belongs under, or `None` if no adapter
/// handles it.
pub fn sample_entry_handler(kind: FourCc) -> Option<HandlerType> {
    match kind {
        FourCc::AVC1 => Some(HandlerType::Video),
        FourCc::MP4A => Some(HandlerType::Audio),
        _ => None,
    }
}

/// Decode codec parameters from one sample entry inside `stsd`.
pub fn parse_sample_entry(entry: &RawBox<'_>) -> Result<CodecParams> {
    match entry.kind() {
        FourCc::AVC1 => {
            let children = entry_children(entry, VISUAL_SAMPLE_ENTRY_SIZE)?;
            let avcc = find_child(children, FourCc::AVCC)?.ok_or(Error::MissingRequiredBox("avcC"))?;
            Ok(CodecParams::H264(avc::decode_avcc(avcc.payload)?))
        }
        FourCc::MP4A => {
            let mut r = ByteReader::new(entry.payload, "mp4a");
            r.skip(8)?; // reserved + data_reference_index
            let fixed = match r.u16()? {
                1 => AUDIO_SAMPLE_ENTRY_SIZE + SOUND_V1_EXTRA,
                2 => AUDIO_SAMPLE_ENTRY_SIZE + SOUND_V2_EXTRA,
                _ => AUDIO_SAMPLE_ENTRY_SIZE,
            };
            let children = entry_children(entry, fixed)?;
            let esds = find_child(children, FourCc::ESDS)?.ok_or(Error::MissingRequiredBox("esds"))?;
            Ok(CodecParams::Mpeg4Audio(aac::decode_esds(esds.payload)?))
        }
        other => Err(Error::unsupported(format!("sample entry {}", other))),
    }
}

/// Bytes holding the child boxes of a sample entry.
fn entry_children<'a>(entry: &RawBox<'a>, fixed: usize) -> Result<&'a [u8]> {
    if entry.payload.len() < fixed {
        return Err(Error::truncated(
            entry.kind(),
            fixed as u64,
            entry.payload.len() as u64,
        ));
    }
    Ok(&entry.payload[fixed..])
}

/// Find a child box by type. Every child is size-checked, matched or not.
fn find_child(scope: &[u8], kind: FourCc) -> Result<Option<RawBox<'_>>> {
    let mut found = None;
    for child in BoxIter::new(scope) {
        let child = child?;
        if child.kind() == kind && found.is_none() {
            found = Some(child);
        } else {
            trace!(box_type = %child.kind(), size = child.header.size, "skipping sample entry child");
        }
    }
    Ok(found)
}
