//! H.264 Sequence Parameter Set (SPS) parsing
//!
//! Only the fields up to and including the frame cropping window are
//! interpreted; VUI and anything after it is ignored.

use bitstream_io::{BigEndian, BitRead, BitReader};

use super::nal::{remove_emulation_prevention, NalUnitType};
use crate::error::{CodecError, Result};

/// Profiles that carry the chroma format / bit depth / scaling matrix block
const HIGH_PROFILES: [u8; 13] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134, 135];

/// Sequence Parameter Set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sps {
    /// profile_idc
    pub profile_idc: u8,
    /// constraint_set0..5 flags plus reserved bits, as one byte
    pub constraint_flags: u8,
    /// level_idc
    pub level_idc: u8,
    pub seq_parameter_set_id: u32,
    /// 0 = monochrome, 1 = 4:2:0, 2 = 4:2:2, 3 = 4:4:4
    pub chroma_format_idc: u32,
    /// Bit depth for luma samples
    pub bit_depth_luma: u8,
    /// Bit depth for chroma samples
    pub bit_depth_chroma: u8,
    /// Progressive (true) or field/MBAFF coded (false)
    pub frame_mbs_only: bool,
    /// Picture width in luma samples after cropping
    pub width: u32,
    /// Picture height in luma samples after cropping
    pub height: u32,
}

impl Sps {
    /// Parse an SPS NAL unit, header byte included.
    pub fn parse(nal: &[u8]) -> Result<Self> {
        if nal.len() < 4 {
            return Err(CodecError::invalid_sps(format!(
                "{} bytes is too short for an SPS",
                nal.len()
            )));
        }

        let nal_type = NalUnitType::from_header(nal[0]);
        if nal_type != NalUnitType::Sps {
            return Err(CodecError::invalid_sps(format!(
                "expected SPS NAL unit, got {:?}",
                nal_type
            )));
        }

        let rbsp = remove_emulation_prevention(&nal[1..]);
        let mut reader = RbspReader::new(&rbsp);

        let profile_idc = reader.read_bits(8)? as u8;
        let constraint_flags = reader.read_bits(8)? as u8;
        let level_idc = reader.read_bits(8)? as u8;

        let seq_parameter_set_id = reader.read_ue()?;
        if seq_parameter_set_id > 31 {
            return Err(CodecError::invalid_sps(format!(
                "seq_parameter_set_id {} out of range",
                seq_parameter_set_id
            )));
        }

        let mut chroma_format_idc = 1;
        let mut separate_colour_plane = false;
        let mut bit_depth_luma = 8;
        let mut bit_depth_chroma = 8;

        if HIGH_PROFILES.contains(&profile_idc) {
            chroma_format_idc = reader.read_ue()?;
            if chroma_format_idc > 3 {
                return Err(CodecError::invalid_sps(format!(
                    "chroma_format_idc {} out of range",
                    chroma_format_idc
                )));
            }
            if chroma_format_idc == 3 {
                separate_colour_plane = reader.read_flag()?;
            }

            // bit_depth_luma_minus8 / bit_depth_chroma_minus8
            let luma = reader.read_ue()?;
            let chroma = reader.read_ue()?;
            if luma > 6 || chroma > 6 {
                return Err(CodecError::invalid_sps("bit depth above 14"));
            }
            bit_depth_luma = luma as u8 + 8;
            bit_depth_chroma = chroma as u8 + 8;

            // qpprime_y_zero_transform_bypass_flag
            reader.read_flag()?;

            // seq_scaling_matrix_present_flag
            if reader.read_flag()? {
                let lists = if chroma_format_idc != 3 { 8 } else { 12 };
                for i in 0..lists {
                    if reader.read_flag()? {
                        skip_scaling_list(&mut reader, if i < 6 { 16 } else { 64 })?;
                    }
                }
            }
        }

        // log2_max_frame_num_minus4
        reader.read_ue()?;

        let pic_order_cnt_type = reader.read_ue()?;
        match pic_order_cnt_type {
            0 => {
                // log2_max_pic_order_cnt_lsb_minus4
                reader.read_ue()?;
            }
            1 => {
                reader.read_flag()?; // delta_pic_order_always_zero_flag
                reader.read_se()?; // offset_for_non_ref_pic
                reader.read_se()?; // offset_for_top_to_bottom_field
                let cycle = reader.read_ue()?;
                if cycle > 255 {
                    return Err(CodecError::invalid_sps(format!(
                        "num_ref_frames_in_pic_order_cnt_cycle {} out of range",
                        cycle
                    )));
                }
                for _ in 0..cycle {
                    reader.read_se()?; // offset_for_ref_frame
                }
            }
            2 => {}
            other => {
                return Err(CodecError::invalid_sps(format!(
                    "pic_order_cnt_type {} out of range",
                    other
                )));
            }
        }

        // max_num_ref_frames
        reader.read_ue()?;
        // gaps_in_frame_num_value_allowed_flag
        reader.read_flag()?;

        let pic_width_in_mbs_minus1 = reader.read_ue()?;
        let pic_height_in_map_units_minus1 = reader.read_ue()?;

        let frame_mbs_only = reader.read_flag()?;
        if !frame_mbs_only {
            // mb_adaptive_frame_field_flag
            reader.read_flag()?;
        }

        // direct_8x8_inference_flag
        reader.read_flag()?;

        let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0, 0, 0, 0);
        if reader.read_flag()? {
            crop_left = reader.read_ue()?;
            crop_right = reader.read_ue()?;
            crop_top = reader.read_ue()?;
            crop_bottom = reader.read_ue()?;
        }

        let chroma_array_type = if separate_colour_plane {
            0
        } else {
            chroma_format_idc
        };
        let field_factor: u64 = if frame_mbs_only { 1 } else { 2 };
        let (crop_unit_x, crop_unit_y) = match chroma_array_type {
            0 => (1, field_factor),
            1 => (2, 2 * field_factor),
            2 => (2, field_factor),
            _ => (1, field_factor),
        };

        let coded_width = (u64::from(pic_width_in_mbs_minus1) + 1) * 16;
        let coded_height = field_factor * (u64::from(pic_height_in_map_units_minus1) + 1) * 16;

        let width = coded_width
            .checked_sub((u64::from(crop_left) + u64::from(crop_right)) * crop_unit_x)
            .and_then(|w| u32::try_from(w).ok())
            .ok_or_else(|| CodecError::invalid_sps("horizontal cropping exceeds picture width"))?;
        let height = coded_height
            .checked_sub((u64::from(crop_top) + u64::from(crop_bottom)) * crop_unit_y)
            .and_then(|h| u32::try_from(h).ok())
            .ok_or_else(|| CodecError::invalid_sps("vertical cropping exceeds picture height"))?;

        Ok(Self {
            profile_idc,
            constraint_flags,
            level_idc,
            seq_parameter_set_id,
            chroma_format_idc,
            bit_depth_luma,
            bit_depth_chroma,
            frame_mbs_only,
            width,
            height,
        })
    }
}

/// Skip a scaling_list() structure of `size` coefficients
fn skip_scaling_list(reader: &mut RbspReader<'_>, size: usize) -> Result<()> {
    let mut last_scale: i64 = 8;
    let mut next_scale: i64 = 8;

    for _ in 0..size {
        if next_scale != 0 {
            let delta_scale = i64::from(reader.read_se()?);
            next_scale = (last_scale + delta_scale).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }

    Ok(())
}

/// Exp-Golomb capable reader over RBSP data
struct RbspReader<'a> {
    bits: BitReader<&'a [u8], BigEndian>,
}

impl<'a> RbspReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            bits: BitReader::endian(data, BigEndian),
        }
    }

    /// Read n bits (1 to 32)
    fn read_bits(&mut self, n: u32) -> Result<u32> {
        self.bits
            .read::<u32>(n)
            .map_err(|_| CodecError::Truncated("SPS"))
    }

    fn read_flag(&mut self) -> Result<bool> {
        self.bits
            .read_bit()
            .map_err(|_| CodecError::Truncated("SPS"))
    }

    /// Read unsigned Exp-Golomb coded value
    fn read_ue(&mut self) -> Result<u32> {
        let mut leading_zeros = 0u32;
        while !self.read_flag()? {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(CodecError::invalid_sps("Exp-Golomb code exceeds 32 bits"));
            }
        }

        if leading_zeros == 0 {
            return Ok(0);
        }

        let suffix = self.read_bits(leading_zeros)?;
        Ok((1u32 << leading_zeros) - 1 + suffix)
    }

    /// Read signed Exp-Golomb coded value
    fn read_se(&mut self) -> Result<i32> {
        let code = i64::from(self.read_ue()?);
        let magnitude = (code + 1) / 2;
        let value = if code % 2 == 1 { magnitude } else { -magnitude };
        Ok(value as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream_io::{BitWrite, BitWriter};

    const SPS_1080P: [u8; 25] = [
        0x67, 0x42, 0xc0, 0x28, 0xd9, 0x00, 0x78, 0x02, 0x27, 0xe5, 0x84, 0x00, 0x00, 0x03, 0x00,
        0x04, 0x00, 0x00, 0x03, 0x00, 0xf0, 0x3c, 0x60, 0xc9, 0x20,
    ];

    const SPS_540P: [u8; 25] = [
        0x67, 0x42, 0xc0, 0x1f, 0xd9, 0x00, 0xf0, 0x11, 0x7e, 0xf0, 0x11, 0x00, 0x00, 0x03, 0x00,
        0x01, 0x00, 0x00, 0x03, 0x00, 0x30, 0x8f, 0x18, 0x32, 0x48,
    ];

    /// Bit-level SPS builder for fields the fixtures don't cover
    struct SpsWriter {
        bits: BitWriter<Vec<u8>, BigEndian>,
    }

    impl SpsWriter {
        fn new(profile_idc: u8) -> Self {
            let mut bits = BitWriter::endian(Vec::new(), BigEndian);
            bits.write(8, profile_idc).unwrap();
            bits.write(8, 0u8).unwrap(); // constraint flags
            bits.write(8, 0x1Fu8).unwrap(); // level 3.1
            Self { bits }
        }

        fn ue(&mut self, value: u32) -> &mut Self {
            let coded = value + 1;
            let len = 32 - coded.leading_zeros();
            for _ in 1..len {
                self.bits.write_bit(false).unwrap();
            }
            self.bits.write(len, coded).unwrap();
            self
        }

        fn flag(&mut self, value: bool) -> &mut Self {
            self.bits.write_bit(value).unwrap();
            self
        }

        fn finish(mut self) -> Vec<u8> {
            // rbsp_stop_one_bit
            self.bits.write_bit(true).unwrap();
            self.bits.byte_align().unwrap();
            let mut nal = vec![0x67];
            nal.extend(self.bits.into_writer());
            nal
        }
    }

    #[test]
    fn test_parse_baseline_1080p() {
        let sps = Sps::parse(&SPS_1080P).unwrap();
        assert_eq!(sps.profile_idc, 66);
        assert_eq!(sps.constraint_flags, 0xc0);
        assert_eq!(sps.level_idc, 40);
        assert_eq!(sps.width, 1920);
        assert_eq!(sps.height, 1080);
        assert!(sps.frame_mbs_only);
        assert_eq!(sps.chroma_format_idc, 1);
        assert_eq!(sps.bit_depth_luma, 8);
    }

    #[test]
    fn test_parse_baseline_540p() {
        let sps = Sps::parse(&SPS_540P).unwrap();
        assert_eq!(sps.level_idc, 31);
        assert_eq!(sps.width, 960);
        assert_eq!(sps.height, 540);
    }

    #[test]
    fn test_parse_high_profile() {
        let mut w = SpsWriter::new(100);
        w.ue(0) // seq_parameter_set_id
            .ue(1) // chroma_format_idc
            .ue(2) // bit_depth_luma_minus8
            .ue(2) // bit_depth_chroma_minus8
            .flag(false) // qpprime
            .flag(false) // no scaling matrix
            .ue(0) // log2_max_frame_num_minus4
            .ue(0) // pic_order_cnt_type
            .ue(2) // log2_max_pic_order_cnt_lsb_minus4
            .ue(4) // max_num_ref_frames
            .flag(false)
            .ue(79) // 1280 wide
            .ue(44) // 720 high
            .flag(true) // frame_mbs_only
            .flag(true) // direct_8x8
            .flag(false); // no cropping
        let sps = Sps::parse(&w.finish()).unwrap();

        assert_eq!(sps.profile_idc, 100);
        assert_eq!(sps.bit_depth_luma, 10);
        assert_eq!(sps.bit_depth_chroma, 10);
        assert_eq!((sps.width, sps.height), (1280, 720));
    }

    #[test]
    fn test_parse_interlaced_with_cropping() {
        let mut w = SpsWriter::new(77);
        w.ue(0)
            .ue(0)
            .ue(2) // pic_order_cnt_type 2
            .ue(1)
            .flag(false)
            .ue(119) // 1920 wide
            .ue(33) // 34 map units -> 1088 lines in field mode
            .flag(false) // frame_mbs_only
            .flag(true) // mb_adaptive_frame_field
            .flag(true)
            .flag(true) // cropping
            .ue(0)
            .ue(0)
            .ue(0)
            .ue(2); // 2 * (2 * 2) = 8 lines
        let sps = Sps::parse(&w.finish()).unwrap();

        assert!(!sps.frame_mbs_only);
        assert_eq!((sps.width, sps.height), (1920, 1080));
    }

    #[test]
    fn test_parse_scaling_lists_and_poc_type_1() {
        let mut w = SpsWriter::new(100);
        w.ue(0).ue(1).ue(0).ue(0).flag(false);
        // seq_scaling_matrix_present with one explicit 4x4 list
        w.flag(true).flag(true);
        for _ in 0..16 {
            w.ue(0); // delta_scale 0
        }
        for _ in 1..8 {
            w.flag(false);
        }
        w.ue(0)
            .ue(1) // pic_order_cnt_type 1
            .flag(false)
            .ue(1) // offset_for_non_ref_pic = +1
            .ue(2) // offset_for_top_to_bottom_field = -1
            .ue(2) // two cycle entries
            .ue(1)
            .ue(1)
            .ue(1)
            .flag(false)
            .ue(39)
            .ue(29)
            .flag(true)
            .flag(true)
            .flag(false);
        let sps = Sps::parse(&w.finish()).unwrap();

        assert_eq!((sps.width, sps.height), (640, 480));
    }

    #[test]
    fn test_parse_truncated() {
        let result = Sps::parse(&SPS_1080P[..6]);
        assert!(matches!(result, Err(CodecError::Truncated(_))));
    }

    #[test]
    fn test_parse_rejects_other_nal_types() {
        let mut pps_like = SPS_1080P;
        pps_like[0] = 0x68;
        assert!(matches!(
            Sps::parse(&pps_like),
            Err(CodecError::InvalidSps(_))
        ));
    }

    #[test]
    fn test_parse_too_short() {
        assert!(matches!(
            Sps::parse(&[0x67, 0x42]),
            Err(CodecError::InvalidSps(_))
        ));
    }

    #[test]
    fn test_read_ue() {
        // 1 -> 0, 010 -> 1, 011 -> 2, 00100 -> 3
        let data = [0b10100110, 0b01000000];
        let mut reader = RbspReader::new(&data);

        assert_eq!(reader.read_ue().unwrap(), 0);
        assert_eq!(reader.read_ue().unwrap(), 1);
        assert_eq!(reader.read_ue().unwrap(), 2);
        assert_eq!(reader.read_ue().unwrap(), 3);
    }

    #[test]
    fn test_read_se() {
        // 010 -> +1, 011 -> -1, 00100 -> +2
        let data = [0b01001100, 0b10000000];
        let mut reader = RbspReader::new(&data);

        assert_eq!(reader.read_se().unwrap(), 1);
        assert_eq!(reader.read_se().unwrap(), -1);
        assert_eq!(reader.read_se().unwrap(), 2);
    }
}
