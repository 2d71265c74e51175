//! H.264 NAL unit parsing

/// H.264 NAL unit types (ITU-T H.264 Table 7-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    /// Coded slice of a non-IDR picture
    Slice,
    /// Coded slice data partition A
    SliceDataA,
    /// Coded slice data partition B
    SliceDataB,
    /// Coded slice data partition C
    SliceDataC,
    /// Coded slice of an IDR picture
    Idr,
    /// Supplemental enhancement information
    Sei,
    /// Sequence parameter set
    Sps,
    /// Picture parameter set
    Pps,
    /// Access unit delimiter
    Aud,
    EndOfSequence,
    EndOfStream,
    Filler,
    /// Unknown/other
    Unknown(u8),
}

impl NalUnitType {
    /// Type of the NAL unit whose one-byte header is `header`.
    pub fn from_header(header: u8) -> Self {
        Self::from(header & 0x1F)
    }
}

impl From<u8> for NalUnitType {
    fn from(value: u8) -> Self {
        match value {
            1 => NalUnitType::Slice,
            2 => NalUnitType::SliceDataA,
            3 => NalUnitType::SliceDataB,
            4 => NalUnitType::SliceDataC,
            5 => NalUnitType::Idr,
            6 => NalUnitType::Sei,
            7 => NalUnitType::Sps,
            8 => NalUnitType::Pps,
            9 => NalUnitType::Aud,
            10 => NalUnitType::EndOfSequence,
            11 => NalUnitType::EndOfStream,
            12 => NalUnitType::Filler,
            v => NalUnitType::Unknown(v),
        }
    }
}

/// Remove emulation prevention bytes (0x000003 -> 0x0000)
pub fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut zeros = 0usize;

    for &byte in data {
        if zeros >= 2 && byte == 0x03 {
            zeros = 0;
            continue;
        }
        if byte == 0 {
            zeros += 1;
        } else {
            zeros = 0;
        }
        result.push(byte);
    }

    result
}
