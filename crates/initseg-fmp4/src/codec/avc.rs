//! H.264 adapter: `avcC` AVCDecoderConfigurationRecord (ISO/IEC 14496-15 5.3.3).

use initseg_codecs::Sps;

use crate::boxes::ByteReader;
use crate::error::{Error, Result};
use crate::track::H264Params;

/// NAL unit length field size minus one (4-byte lengths).
const LENGTH_SIZE_MINUS_ONE: u8 = 0x03;

/// Build the `avcC` payload from one SPS and one PPS.
pub fn encode_avcc(params: &H264Params) -> Result<Vec<u8>> {
    let sps = &params.sps;
    let pps = &params.pps;

    if sps.len() < 4 {
        return Err(Error::invalid_descriptor(format!(
            "SPS of {} bytes lacks profile and level",
            sps.len()
        )));
    }
    if pps.is_empty() {
        return Err(Error::invalid_descriptor("PPS is empty"));
    }
    let sps_len = u16::try_from(sps.len())
        .map_err(|_| Error::invalid_descriptor(format!("SPS of {} bytes", sps.len())))?;
    let pps_len = u16::try_from(pps.len())
        .map_err(|_| Error::invalid_descriptor(format!("PPS of {} bytes", pps.len())))?;

    let mut record = Vec::with_capacity(11 + sps.len() + pps.len());
    // configurationVersion
    record.push(1);
    // AVCProfileIndication, profile_compatibility, AVCLevelIndication
    record.extend_from_slice(&sps[1..4]);
    record.push(LENGTH_SIZE_MINUS_ONE);
    // numOfSequenceParameterSets
    record.push(1);
    record.extend_from_slice(&sps_len.to_be_bytes());
    record.extend_from_slice(sps);
    // numOfPictureParameterSets
    record.push(1);
    record.extend_from_slice(&pps_len.to_be_bytes());
    record.extend_from_slice(pps);

    Ok(record)
}

/// Parse an `avcC` payload, keeping the first SPS and first PPS.
pub fn decode_avcc(payload: &[u8]) -> Result<H264Params> {
    parse_record(payload).map_err(Error::into_descriptor_error)
}

fn parse_record(payload: &[u8]) -> Result<H264Params> {
    let mut r = ByteReader::new(payload, "avcC");

    r.u8()?; // configurationVersion
    r.skip(3)?; // profile, compatibility, level (repeated in the SPS)
    let _length_size = (r.u8()? & 0x03) + 1;

    let num_sps = r.u8()? & 0x1F;
    if num_sps == 0 {
        return Err(Error::invalid_descriptor("avcC carries no SPS"));
    }
    let sps = read_parameter_sets(&mut r, usize::from(num_sps))?;

    let num_pps = r.u8()?;
    if num_pps == 0 {
        return Err(Error::invalid_descriptor("avcC carries no PPS"));
    }
    let pps = read_parameter_sets(&mut r, usize::from(num_pps))?;

    Ok(H264Params::new(sps, pps))
}

/// Read `count` length-prefixed parameter sets and return the first.
fn read_parameter_sets(r: &mut ByteReader<'_>, count: usize) -> Result<Vec<u8>> {
    let mut first = None;
    for _ in 0..count {
        let len = usize::from(r.u16()?);
        let nal = r.bytes(len)?;
        if first.is_none() {
            first = Some(nal.to_vec());
        }
    }
    first.ok_or_else(|| Error::invalid_descriptor("empty parameter set list"))
}

/// Cropped picture size from the SPS, as stored in 16-bit sample entry fields.
pub fn picture_size(params: &H264Params) -> Result<(u16, u16)> {
    let sps = Sps::parse(&params.sps)?;
    let width = u16::try_from(sps.width)
        .map_err(|_| Error::invalid_descriptor(format!("picture width {}", sps.width)))?;
    let height = u16::try_from(sps.height)
        .map_err(|_| Error::invalid_descriptor(format!("picture height {}", sps.height)))?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SPS: [u8; 25] = [
        0x67, 0x42, 0xc0, 0x28, 0xd9, 0x00, 0x78, 0x02, 0x27, 0xe5, 0x84, 0x00, 0x00, 0x03, 0x00,
        0x04, 0x00, 0x00, 0x03, 0x00, 0xf0, 0x3c, 0x60, 0xc9, 0x20,
    ];

    fn params() -> H264Params {
        H264Params::new(SPS.to_vec(), vec![0x08])
    }

    #[test]
    fn test_encode_avcc_layout() {
        let record = encode_avcc(&params()).unwrap();
        assert_eq!(&record[..8], &[0x01, 0x42, 0xc0, 0x28, 0x03, 0x01, 0x00, 0x19]);
        assert_eq!(&record[8..33], &SPS[..]);
        assert_eq!(&record[33..], &[0x01, 0x00, 0x01, 0x08]);
    }

    #[test]
    fn test_decode_avcc_masks_reserved_bits() {
        let mut record = encode_avcc(&params()).unwrap();
        record[4] = 0xFF;
        record[5] = 0xE1;
        let decoded = decode_avcc(&record).unwrap();
        assert_eq!(decoded, params());
    }

    #[test]
    fn test_decode_avcc_keeps_first_of_several() {
        let mut record = vec![0x01, 0x64, 0x00, 0x1F, 0xFF, 0xE2];
        record.extend_from_slice(&[0x00, 0x04, 0x67, 0x64, 0x00, 0x1F]);
        record.extend_from_slice(&[0x00, 0x04, 0x67, 0x64, 0x00, 0x20]);
        record.extend_from_slice(&[0x01, 0x00, 0x02, 0x68, 0xEE]);

        let decoded = decode_avcc(&record).unwrap();
        assert_eq!(decoded.sps, vec![0x67, 0x64, 0x00, 0x1F]);
        assert_eq!(decoded.pps, vec![0x68, 0xEE]);
    }

    #[test]
    fn test_decode_avcc_requires_parameter_sets() {
        let no_sps = [0x01, 0x42, 0xc0, 0x1f, 0xFF, 0xE0, 0x01, 0x00, 0x01, 0x68];
        assert_matches!(decode_avcc(&no_sps), Err(Error::InvalidDescriptor(_)));

        let no_pps = [0x01, 0x42, 0xc0, 0x1f, 0xFF, 0xE1, 0x00, 0x01, 0x67, 0x00];
        assert_matches!(decode_avcc(&no_pps), Err(Error::InvalidDescriptor(_)));
    }

    #[test]
    fn test_decode_avcc_overrun_is_descriptor_error() {
        let record = [0x01, 0x42, 0xc0, 0x1f, 0xFF, 0xE1, 0x00, 0x40, 0x67];
        assert_matches!(decode_avcc(&record), Err(Error::InvalidDescriptor(_)));
    }

    #[test]
    fn test_encode_avcc_rejects_bad_parameter_sets() {
        let short = H264Params::new(vec![0x67, 0x42], vec![0x68]);
        assert_matches!(encode_avcc(&short), Err(Error::InvalidDescriptor(_)));

        let no_pps = H264Params::new(SPS.to_vec(), vec![]);
        assert_matches!(encode_avcc(&no_pps), Err(Error::InvalidDescriptor(_)));

        let huge = H264Params::new(SPS.to_vec(), vec![0x68; 70_000]);
        assert_matches!(encode_avcc(&huge), Err(Error::InvalidDescriptor(_)));
    }

    #[test]
    fn test_picture_size() {
        assert_eq!(picture_size(&params()).unwrap(), (1920, 1080));
    }
}
