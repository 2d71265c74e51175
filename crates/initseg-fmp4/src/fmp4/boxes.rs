//! Box builders for the init segment hierarchy.
//!
//! Every function returns a `BoxNode`; sizes are only fixed when the tree
//! is encoded.

use bytes::BufMut;

use crate::boxes::{fullbox_header, BoxNode, FourCc};
use crate::codec::{aac, avc};
use crate::error::Result;
use crate::track::{CodecParams, HandlerType, H264Params, Mpeg4AudioParams, Track};

/// Movie timescale written to `mvhd`.
pub(crate) const MOVIE_TIMESCALE: u32 = 1000;

/// Packed ISO 639-2 code for "und".
pub(crate) const LANGUAGE_UND: u16 = 0x55C4;

/// Bitrate advertised in the video `btrt`.
pub(crate) const VIDEO_BITRATE: u32 = 1_000_000;

/// Identity transformation matrix (16.16 and 2.30 fixed point)
const IDENTITY_MATRIX: [u32; 9] = [0x00010000, 0, 0, 0, 0x00010000, 0, 0, 0, 0x40000000];

fn put_matrix(content: &mut Vec<u8>) {
    for value in IDENTITY_MATRIX {
        content.put_u32(value);
    }
}

// ---------------------------------------------------------------------------
// ftyp box
// ---------------------------------------------------------------------------

/// Generate the `ftyp` box.
/// Major brand: "mp42", minor version: 1,
/// Compatible brands: ["mp41", "mp42", "isom", "hlsf"].
pub(crate) fn ftyp() -> BoxNode {
    let mut content = Vec::with_capacity(24);
    // Major brand
    content.put_slice(b"mp42");
    // Minor version
    content.put_u32(1);
    // Compatible brands
    content.put_slice(b"mp41");
    content.put_slice(b"mp42");
    content.put_slice(b"isom");
    content.put_slice(b"hlsf");
    BoxNode::leaf(FourCc::FTYP, content)
}

// ---------------------------------------------------------------------------
// mvhd box (movie header, version 0)
// ---------------------------------------------------------------------------

pub(crate) fn mvhd() -> BoxNode {
    let mut content = Vec::with_capacity(100);
    content.put_slice(&fullbox_header(0, 0));
    content.put_u32(0); // creation_time
    content.put_u32(0); // modification_time
    content.put_u32(MOVIE_TIMESCALE);
    content.put_u32(0); // duration
    content.put_u32(0x00010000); // rate = 1.0
    content.put_u16(0x0100); // volume = 1.0
    // reserved (2 + 8 bytes)
    content.put_slice(&[0u8; 10]);
    put_matrix(&mut content);
    // pre_defined (6 * 4 bytes)
    content.put_slice(&[0u8; 24]);
    // next_track_ID: unknown, players must pick their own
    content.put_u32(0xFFFFFFFF);
    BoxNode::leaf(FourCc::MVHD, content)
}

// ---------------------------------------------------------------------------
// trak > tkhd (track header, version 0)
// ---------------------------------------------------------------------------

/// Track is enabled and used in the presentation.
const TKHD_FLAGS: u32 = 0x000003;

pub(crate) fn tkhd(track_id: u32, handler: HandlerType, width: u16, height: u16) -> BoxNode {
    let (alternate_group, volume) = match handler {
        HandlerType::Video => (0u16, 0u16),
        HandlerType::Audio => (1, 0x0100),
    };

    let mut content = Vec::with_capacity(84);
    content.put_slice(&fullbox_header(0, TKHD_FLAGS));
    content.put_u32(0); // creation_time
    content.put_u32(0); // modification_time
    content.put_u32(track_id);
    content.put_u32(0); // reserved
    content.put_u32(0); // duration
    content.put_slice(&[0u8; 8]); // reserved
    content.put_u16(0); // layer
    content.put_u16(alternate_group);
    content.put_u16(volume);
    content.put_u16(0); // reserved
    put_matrix(&mut content);
    // width / height (16.16 fixed point)
    content.put_u32(u32::from(width) << 16);
    content.put_u32(u32::from(height) << 16);
    BoxNode::leaf(FourCc::TKHD, content)
}

// ---------------------------------------------------------------------------
// mdia > mdhd, hdlr
// ---------------------------------------------------------------------------

pub(crate) fn mdhd(timescale: u32) -> BoxNode {
    let mut content = Vec::with_capacity(24);
    content.put_slice(&fullbox_header(0, 0));
    content.put_u32(0); // creation_time
    content.put_u32(0); // modification_time
    content.put_u32(timescale);
    content.put_u32(0); // duration
    content.put_u16(LANGUAGE_UND);
    content.put_u16(0); // pre_defined
    BoxNode::leaf(FourCc::MDHD, content)
}

pub(crate) fn hdlr(handler: HandlerType) -> BoxNode {
    let name = handler.name();
    let mut content = Vec::with_capacity(25 + name.len());
    content.put_slice(&fullbox_header(0, 0));
    content.put_u32(0); // pre_defined
    content.put_slice(&handler.fourcc().0);
    content.put_slice(&[0u8; 12]); // reserved
    content.put_slice(name.as_bytes());
    content.put_u8(0); // null terminator
    BoxNode::leaf(FourCc::HDLR, content)
}

// ---------------------------------------------------------------------------
// minf > vmhd / smhd, dinf
// ---------------------------------------------------------------------------

pub(crate) fn vmhd() -> BoxNode {
    let mut content = Vec::with_capacity(12);
    // flags = 1 (no lean ahead)
    content.put_slice(&fullbox_header(0, 1));
    content.put_u16(0); // graphicsmode
    content.put_slice(&[0u8; 6]); // opcolor
    BoxNode::leaf(FourCc::VMHD, content)
}

pub(crate) fn smhd() -> BoxNode {
    let mut content = Vec::with_capacity(8);
    content.put_slice(&fullbox_header(0, 0));
    content.put_u16(0); // balance
    content.put_u16(0); // reserved
    BoxNode::leaf(FourCc::SMHD, content)
}

/// `dinf` > `dref` with a single self-contained `url ` entry.
pub(crate) fn dinf() -> BoxNode {
    // flags = 1: media data is in the same file
    let url = BoxNode::leaf(FourCc::URL, fullbox_header(0, 1).to_vec());

    let mut dref_fields = Vec::with_capacity(8);
    dref_fields.put_slice(&fullbox_header(0, 0));
    dref_fields.put_u32(1); // entry_count

    BoxNode::container(
        FourCc::DINF,
        vec![BoxNode::with_fields(FourCc::DREF, dref_fields, vec![url])],
    )
}

// ---------------------------------------------------------------------------
// stbl: stsd + empty sample tables (samples live in fragments)
// ---------------------------------------------------------------------------

fn empty_table(kind: FourCc) -> BoxNode {
    let mut content = Vec::with_capacity(8);
    content.put_slice(&fullbox_header(0, 0));
    content.put_u32(0); // entry_count
    BoxNode::leaf(kind, content)
}

fn empty_stsz() -> BoxNode {
    let mut content = Vec::with_capacity(12);
    content.put_slice(&fullbox_header(0, 0));
    content.put_u32(0); // sample_size
    content.put_u32(0); // sample_count
    BoxNode::leaf(FourCc::STSZ, content)
}

pub(crate) fn stbl(sample_entry: BoxNode) -> BoxNode {
    let mut stsd_fields = Vec::with_capacity(8);
    stsd_fields.put_slice(&fullbox_header(0, 0));
    stsd_fields.put_u32(1); // entry_count

    BoxNode::container(
        FourCc::STBL,
        vec![
            BoxNode::with_fields(FourCc::STSD, stsd_fields, vec![sample_entry]),
            empty_table(FourCc::STTS),
            empty_table(FourCc::STSC),
            empty_stsz(),
            empty_table(FourCc::STCO),
        ],
    )
}

// ---------------------------------------------------------------------------
// Sample entries
// ---------------------------------------------------------------------------

fn btrt(bitrate: u32) -> BoxNode {
    let mut content = Vec::with_capacity(12);
    content.put_u32(0); // bufferSizeDB
    content.put_u32(bitrate); // maxBitrate
    content.put_u32(bitrate); // avgBitrate
    BoxNode::leaf(FourCc::BTRT, content)
}

/// `avc1` VisualSampleEntry with `avcC` and `btrt`.
pub(crate) fn avc1(params: &H264Params, width: u16, height: u16) -> Result<BoxNode> {
    let avcc = avc::encode_avcc(params)?;

    let mut fields = Vec::with_capacity(78);
    fields.put_slice(&[0u8; 6]); // reserved
    fields.put_u16(1); // data_reference_index
    fields.put_u16(0); // pre_defined
    fields.put_u16(0); // reserved
    fields.put_slice(&[0u8; 12]); // pre_defined
    fields.put_u16(width);
    fields.put_u16(height);
    fields.put_u32(0x00480000); // horizresolution = 72 dpi
    fields.put_u32(0x00480000); // vertresolution = 72 dpi
    fields.put_u32(0); // reserved
    fields.put_u16(1); // frame_count
    fields.put_slice(&[0u8; 32]); // compressorname
    fields.put_u16(0x0018); // depth
    fields.put_i16(-1); // pre_defined

    Ok(BoxNode::with_fields(
        FourCc::AVC1,
        fields,
        vec![BoxNode::leaf(FourCc::AVCC, avcc), btrt(VIDEO_BITRATE)],
    ))
}

/// `mp4a` AudioSampleEntry with `esds` and `btrt`.
pub(crate) fn mp4a(track_id: u32, params: &Mpeg4AudioParams) -> Result<BoxNode> {
    // ES_ID is 16 bits wide
    let esds = aac::encode_esds(track_id as u16, params)?;

    let mut fields = Vec::with_capacity(28);
    fields.put_slice(&[0u8; 6]); // reserved
    fields.put_u16(1); // data_reference_index
    fields.put_slice(&[0u8; 8]); // reserved
    fields.put_u16(u16::from(params.config.channel_count));
    fields.put_u16(16); // samplesize
    fields.put_u16(0); // pre_defined
    fields.put_u16(0); // reserved
    // samplerate (16.16 fixed point)
    fields.put_u32((params.config.sample_rate & 0xFFFF) << 16);

    Ok(BoxNode::with_fields(
        FourCc::MP4A,
        fields,
        vec![BoxNode::leaf(FourCc::ESDS, esds), btrt(aac::AUDIO_BITRATE)],
    ))
}

// ---------------------------------------------------------------------------
// trak / mvex assembly
// ---------------------------------------------------------------------------

pub(crate) fn trak(track: &Track) -> Result<BoxNode> {
    let handler = track.handler();
    let ((width, height), sample_entry, media_header) = match &track.codec {
        CodecParams::H264(params) => {
            let (width, height) = avc::picture_size(params)?;
            ((width, height), avc1(params, width, height)?, vmhd())
        }
        CodecParams::Mpeg4Audio(params) => ((0, 0), mp4a(track.id, params)?, smhd()),
    };

    let minf = BoxNode::container(FourCc::MINF, vec![media_header, dinf(), stbl(sample_entry)]);
    let mdia = BoxNode::container(
        FourCc::MDIA,
        vec![mdhd(track.time_scale), hdlr(handler), minf],
    );

    Ok(BoxNode::container(
        FourCc::TRAK,
        vec![tkhd(track.id, handler, width, height), mdia],
    ))
}

pub(crate) fn trex(track_id: u32) -> BoxNode {
    let mut content = Vec::with_capacity(24);
    content.put_slice(&fullbox_header(0, 0));
    content.put_u32(track_id);
    content.put_u32(1); // default_sample_description_index
    content.put_u32(0); // default_sample_duration
    content.put_u32(0); // default_sample_size
    content.put_u32(0); // default_sample_flags
    BoxNode::leaf(FourCc::TREX, content)
}

pub(crate) fn mvex(tracks: &[Track]) -> BoxNode {
    BoxNode::container(FourCc::MVEX, tracks.iter().map(|t| trex(t.id)).collect())
}

pub(crate) fn moov(tracks: &[Track]) -> Result<BoxNode> {
    let mut children = Vec::with_capacity(tracks.len() + 2);
    children.push(mvhd());
    for track in tracks {
        children.push(trak(track)?);
    }
    children.push(mvex(tracks));
    Ok(BoxNode::container(FourCc::MOOV, children))
}
