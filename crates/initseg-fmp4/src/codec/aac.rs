//! MPEG-4 audio adapter: `esds` elementary stream descriptor (ISO/IEC 14496-14).

use bytes::BufMut;
use initseg_codecs::AudioSpecificConfig;

use super::descriptor::{
    write_descriptor, DescriptorIter, DECODER_CONFIG_DESCRIPTOR_TAG, DECODER_SPECIFIC_INFO_TAG,
    ES_DESCRIPTOR_TAG, SL_CONFIG_DESCRIPTOR_TAG,
};
use crate::boxes::{fullbox_header, ByteReader};
use crate::error::{Error, Result};
use crate::track::Mpeg4AudioParams;

/// objectTypeIndication for MPEG-4 audio (ISO/IEC 14496-3)
pub const OBJECT_TYPE_MPEG4_AUDIO: u8 = 0x40;

/// streamType 0x05 (audio) << 2 | upStream 0 << 1 | reserved 1
const STREAM_TYPE_AUDIO: u8 = 0x15;

/// Bitrate advertised in DecoderConfigDescriptor and `btrt`.
pub const AUDIO_BITRATE: u32 = 128_825;

/// SLConfigDescriptor predefined value reserved for MP4 files.
const SL_PREDEFINED_MP4: u8 = 0x02;

/// Build the `esds` payload (full box prefix included).
pub fn encode_esds(es_id: u16, params: &Mpeg4AudioParams) -> Result<Vec<u8>> {
    let asc = params.config.encode()?;
    if asc.is_empty() {
        return Err(Error::invalid_descriptor("empty AudioSpecificConfig"));
    }

    let mut decoder_config = Vec::with_capacity(20);
    decoder_config.put_u8(OBJECT_TYPE_MPEG4_AUDIO);
    decoder_config.put_u8(STREAM_TYPE_AUDIO);
    // bufferSizeDB (24 bits)
    decoder_config.put_slice(&[0, 0, 0]);
    decoder_config.put_u32(AUDIO_BITRATE); // maxBitrate
    decoder_config.put_u32(AUDIO_BITRATE); // avgBitrate
    decoder_config.put_slice(&write_descriptor(DECODER_SPECIFIC_INFO_TAG, &asc)?);

    let mut es = Vec::with_capacity(34);
    es.put_u16(es_id);
    // streamDependenceFlag, URL_Flag, OCRstreamFlag, streamPriority
    es.put_u8(0);
    es.put_slice(&write_descriptor(DECODER_CONFIG_DESCRIPTOR_TAG, &decoder_config)?);
    es.put_slice(&write_descriptor(SL_CONFIG_DESCRIPTOR_TAG, &[SL_PREDEFINED_MP4])?);

    let mut payload = Vec::with_capacity(4 + 5 + es.len());
    payload.put_slice(&fullbox_header(0, 0));
    payload.put_slice(&write_descriptor(ES_DESCRIPTOR_TAG, &es)?);
    Ok(payload)
}

/// Parse an `esds` payload (full box prefix included).
pub fn decode_esds(payload: &[u8]) -> Result<Mpeg4AudioParams> {
    let mut r = ByteReader::new(payload, "esds");
    r.full_box_header().map_err(Error::into_descriptor_error)?;

    let es = DescriptorIter::new(r.rest())
        .next()
        .ok_or_else(|| Error::invalid_descriptor("esds is empty"))??;
    if es.tag != ES_DESCRIPTOR_TAG {
        return Err(Error::invalid_descriptor(format!(
            "expected ES_Descriptor, found tag 0x{:02x}",
            es.tag
        )));
    }

    let config = parse_es_descriptor(es.body)?;
    Ok(Mpeg4AudioParams::new(config))
}

fn parse_es_descriptor(body: &[u8]) -> Result<AudioSpecificConfig> {
    let mut r = ByteReader::new(body, "ES_Descriptor");
    let skip_optional_fields = |r: &mut ByteReader<'_>| -> Result<()> {
        r.u16()?; // ES_ID
        let flags = r.u8()?;
        if flags & 0x80 != 0 {
            r.skip(2)?; // dependsOn_ES_ID
        }
        if flags & 0x40 != 0 {
            let url_len = usize::from(r.u8()?);
            r.skip(url_len)?;
        }
        if flags & 0x20 != 0 {
            r.skip(2)?; // OCR_ES_Id
        }
        Ok(())
    };
    skip_optional_fields(&mut r).map_err(Error::into_descriptor_error)?;

    for descriptor in DescriptorIter::new(r.rest()) {
        let descriptor = descriptor?;
        if descriptor.tag == DECODER_CONFIG_DESCRIPTOR_TAG {
            return parse_decoder_config(descriptor.body);
        }
    }

    Err(Error::invalid_descriptor("ES_Descriptor has no DecoderConfigDescriptor"))
}

fn parse_decoder_config(body: &[u8]) -> Result<AudioSpecificConfig> {
    let mut r = ByteReader::new(body, "DecoderConfigDescriptor");
    let object_type = r.u8().map_err(Error::into_descriptor_error)?;
    if object_type != OBJECT_TYPE_MPEG4_AUDIO {
        return Err(Error::unsupported(format!(
            "objectTypeIndication 0x{:02x}",
            object_type
        )));
    }
    // streamType, bufferSizeDB, maxBitrate, avgBitrate
    r.skip(12).map_err(Error::into_descriptor_error)?;

    for descriptor in DescriptorIter::new(r.rest()) {
        let descriptor = descriptor?;
        if descriptor.tag == DECODER_SPECIFIC_INFO_TAG {
            return Ok(AudioSpecificConfig::decode(descriptor.body)?);
        }
    }

    Err(Error::invalid_descriptor("DecoderConfigDescriptor has no DecoderSpecificInfo"))
}
