//! ISO BMFF box envelope: type codes, the box tree, and bounds-checked reading.
//!
//! Each box follows the standard layout: 4-byte size (big-endian u32),
//! 4-byte type (ASCII), then box-specific content. A size of 1 moves the
//! real size into a 64-bit field after the type; a size of 0 means the box
//! runs to the end of its enclosing scope.

use std::fmt;

use bytes::BufMut;

use crate::error::{Error, Result};

/// Compact box header length.
pub const HEADER_SIZE: u64 = 8;

/// Box header length when the 64-bit size field is present.
pub const EXTENDED_HEADER_SIZE: u64 = 16;

/// Four-character box type code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MVHD: Self = Self(*b"mvhd");
    pub const TRAK: Self = Self(*b"trak");
    pub const TKHD: Self = Self(*b"tkhd");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const HDLR: Self = Self(*b"hdlr");
    pub const MINF: Self = Self(*b"minf");
    pub const VMHD: Self = Self(*b"vmhd");
    pub const SMHD: Self = Self(*b"smhd");
    pub const DINF: Self = Self(*b"dinf");
    pub const DREF: Self = Self(*b"dref");
    pub const URL: Self = Self(*b"url ");
    pub const STBL: Self = Self(*b"stbl");
    pub const STSD: Self = Self(*b"stsd");
    pub const STTS: Self = Self(*b"stts");
    pub const STSC: Self = Self(*b"stsc");
    pub const STSZ: Self = Self(*b"stsz");
    pub const STCO: Self = Self(*b"stco");
    pub const MVEX: Self = Self(*b"mvex");
    pub const TREX: Self = Self(*b"trex");
    pub const AVC1: Self = Self(*b"avc1");
    pub const AVCC: Self = Self(*b"avcC");
    pub const MP4A: Self = Self(*b"mp4a");
    pub const ESDS: Self = Self(*b"esds");
    pub const BTRT: Self = Self(*b"btrt");
    pub const FREE: Self = Self(*b"free");
    pub const SKIP: Self = Self(*b"skip");

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({:?})", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Box tree
// ---------------------------------------------------------------------------

/// A box to be serialized.
///
/// Containers may carry fixed fields ahead of their children; this covers
/// full-box containers such as `stsd` and `dref` as well as sample entries
/// whose codec configuration follows the fixed sample description fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxNode {
    /// Box whose content is opaque bytes.
    Leaf { kind: FourCc, payload: Vec<u8> },
    /// Box whose content is `fields` followed by child boxes in order.
    Container {
        kind: FourCc,
        fields: Vec<u8>,
        children: Vec<BoxNode>,
    },
}

impl BoxNode {
    pub fn leaf(kind: FourCc, payload: Vec<u8>) -> Self {
        Self::Leaf { kind, payload }
    }

    /// Plain container with no fixed fields.
    pub fn container(kind: FourCc, children: Vec<BoxNode>) -> Self {
        Self::Container {
            kind,
            fields: Vec::new(),
            children,
        }
    }

    /// Container with fixed fields written before the children.
    pub fn with_fields(kind: FourCc, fields: Vec<u8>, children: Vec<BoxNode>) -> Self {
        Self::Container {
            kind,
            fields,
            children,
        }
    }

    pub fn kind(&self) -> FourCc {
        match self {
            Self::Leaf { kind, .. } | Self::Container { kind, .. } => *kind,
        }
    }

    pub fn children(&self) -> &[BoxNode] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Container { children, .. } => children,
        }
    }

    /// Serialize the box. Children are materialized before the enclosing
    /// header is written, so every size field is exact.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Leaf { kind, payload } => write_box(*kind, payload),
            Self::Container {
                kind,
                fields,
                children,
            } => {
                let mut content = fields.clone();
                for child in children {
                    content.extend_from_slice(&child.encode());
                }
                write_box(*kind, &content)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Low-level box writing helpers
// ---------------------------------------------------------------------------

/// Write a complete box: size + type + content.
pub fn write_box(kind: FourCc, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + EXTENDED_HEADER_SIZE as usize);
    write_box_header(&mut out, kind, content.len() as u64);
    out.put_slice(content);
    out
}

/// Write the header of a box holding `content_len` bytes. Falls back to the
/// 64-bit size form when the box does not fit a 32-bit length.
pub fn write_box_header(out: &mut Vec<u8>, kind: FourCc, content_len: u64) {
    let compact = HEADER_SIZE + content_len;
    if compact <= u64::from(u32::MAX) {
        out.put_u32(compact as u32);
        out.put_slice(&kind.0);
    } else {
        out.put_u32(1);
        out.put_slice(&kind.0);
        out.put_u64(EXTENDED_HEADER_SIZE + content_len);
    }
}

/// Write a full box header (version + flags) and return just that header portion.
pub fn fullbox_header(version: u8, flags: u32) -> [u8; 4] {
    let val = ((version as u32) << 24) | (flags & 0x00FFFFFF);
    val.to_be_bytes()
}

// ---------------------------------------------------------------------------
// Box reading
// ---------------------------------------------------------------------------

/// Parsed box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// Box type code.
    pub kind: FourCc,
    /// Box size including header.
    pub size: u64,
    /// Size of the header (8 or 16 bytes).
    pub header_size: u8,
}

impl BoxHeader {
    /// Get the content size (size - header).
    pub fn content_size(&self) -> u64 {
        self.size - u64::from(self.header_size)
    }
}

/// Read the header of the box starting at `pos`, with `scope` being the
/// bytes of the enclosing box (or the whole buffer at the top level).
pub fn read_box_header(scope: &[u8], pos: usize) -> Result<BoxHeader> {
    let remaining = scope.len().saturating_sub(pos) as u64;
    if remaining < HEADER_SIZE {
        return Err(Error::truncated("box header", HEADER_SIZE, remaining));
    }

    let size32 = u32::from_be_bytes([scope[pos], scope[pos + 1], scope[pos + 2], scope[pos + 3]]);
    let kind = FourCc([scope[pos + 4], scope[pos + 5], scope[pos + 6], scope[pos + 7]]);

    let (size, header_size) = match size32 {
        // Box extends to end of scope
        0 => (remaining, HEADER_SIZE as u8),
        1 => {
            if remaining < EXTENDED_HEADER_SIZE {
                return Err(Error::truncated(
                    format!("{} extended size", kind),
                    EXTENDED_HEADER_SIZE,
                    remaining,
                ));
            }
            let mut ext = [0u8; 8];
            ext.copy_from_slice(&scope[pos + 8..pos + 16]);
            let size = u64::from_be_bytes(ext);
            if size < EXTENDED_HEADER_SIZE {
                return Err(Error::InvalidBoxSize { kind, size });
            }
            (size, EXTENDED_HEADER_SIZE as u8)
        }
        s if u64::from(s) < HEADER_SIZE => {
            return Err(Error::InvalidBoxSize {
                kind,
                size: u64::from(s),
            });
        }
        s => (u64::from(s), HEADER_SIZE as u8),
    };

    if size > remaining {
        return Err(Error::truncated(kind, size, remaining));
    }

    Ok(BoxHeader {
        kind,
        size,
        header_size,
    })
}

/// A box located inside a buffer.
#[derive(Debug, Clone, Copy)]
pub struct RawBox<'a> {
    pub header: BoxHeader,
    /// Content after the header.
    pub payload: &'a [u8],
}

impl RawBox<'_> {
    pub fn kind(&self) -> FourCc {
        self.header.kind
    }
}

/// Iterator over consecutive boxes in a scope. Every header is validated
/// against the scope; iteration stops after the first error.
pub struct BoxIter<'a> {
    scope: &'a [u8],
    pos: usize,
}

impl<'a> BoxIter<'a> {
    pub fn new(scope: &'a [u8]) -> Self {
        Self { scope, pos: 0 }
    }
}

impl<'a> Iterator for BoxIter<'a> {
    type Item = Result<RawBox<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.scope.len() {
            return None;
        }

        match read_box_header(self.scope, self.pos) {
            Ok(header) => {
                // size <= remaining was checked, so these fit in usize
                let start = self.pos + header.header_size as usize;
                let end = self.pos + header.size as usize;
                self.pos = end;
                Some(Ok(RawBox {
                    header,
                    payload: &self.scope[start..end],
                }))
            }
            Err(e) => {
                self.pos = self.scope.len();
                Some(Err(e))
            }
        }
    }
}

/// Bounds-checked big-endian reader over a box payload.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> ByteReader<'a> {
    /// `context` names the structure being read, for error messages.
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            context,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Everything not yet consumed.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::truncated(
                self.context,
                (self.pos + n) as u64,
                self.data.len() as u64,
            ));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.bytes(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u24(&mut self) -> Result<u32> {
        let b = self.bytes(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn fourcc(&mut self) -> Result<FourCc> {
        let b = self.bytes(4)?;
        Ok(FourCc([b[0], b[1], b[2], b[3]]))
    }

    /// Read a full box prefix, returning (version, flags).
    pub fn full_box_header(&mut self) -> Result<(u8, u32)> {
        let word = self.u32()?;
        Ok(((word >> 24) as u8, word & 0x00FF_FFFF))
    }
}
