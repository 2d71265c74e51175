//! MPEG-4 Systems descriptors (ISO/IEC 14496-1 clause 7.2).
//!
//! A descriptor is a one-byte tag, a size of one to four bytes where the
//! top bit of each byte signals continuation, then `size` bytes of body.

use crate::error::{Error, Result};

pub const ES_DESCRIPTOR_TAG: u8 = 0x03;
pub const DECODER_CONFIG_DESCRIPTOR_TAG: u8 = 0x04;
pub const DECODER_SPECIFIC_INFO_TAG: u8 = 0x05;
pub const SL_CONFIG_DESCRIPTOR_TAG: u8 = 0x06;

/// Largest body expressible with four size bytes.
const MAX_DESCRIPTOR_SIZE: usize = 0x0FFF_FFFF;

/// A descriptor located inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor<'a> {
    pub tag: u8,
    pub body: &'a [u8],
}

/// Write a descriptor with its size in the padded four-byte form.
pub fn write_descriptor(tag: u8, body: &[u8]) -> Result<Vec<u8>> {
    if body.len() > MAX_DESCRIPTOR_SIZE {
        return Err(Error::invalid_descriptor(format!(
            "descriptor 0x{:02x} body of {} bytes exceeds size field",
            tag,
            body.len()
        )));
    }

    let size = body.len() as u32;
    let mut out = Vec::with_capacity(5 + body.len());
    out.push(tag);
    out.push(0x80 | ((size >> 21) & 0x7F) as u8);
    out.push(0x80 | ((size >> 14) & 0x7F) as u8);
    out.push(0x80 | ((size >> 7) & 0x7F) as u8);
    out.push((size & 0x7F) as u8);
    out.extend_from_slice(body);
    Ok(out)
}

/// Iterator over consecutive descriptors. Stops after the first error.
pub struct DescriptorIter<'a> {
    data: &'a [u8],
}

impl<'a> DescriptorIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = Result<Descriptor<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        match read_descriptor(self.data) {
            Ok((descriptor, rest)) => {
                self.data = rest;
                Some(Ok(descriptor))
            }
            Err(e) => {
                self.data = &[];
                Some(Err(e))
            }
        }
    }
}

/// Read one descriptor, returning it and the bytes that follow it.
pub fn read_descriptor(data: &[u8]) -> Result<(Descriptor<'_>, &[u8])> {
    let (&tag, mut rest) = data
        .split_first()
        .ok_or_else(|| Error::invalid_descriptor("missing descriptor tag"))?;

    let mut size = 0usize;
    let mut complete = false;
    for _ in 0..4 {
        let (&b, tail) = rest.split_first().ok_or_else(|| {
            Error::invalid_descriptor(format!("descriptor 0x{:02x} size is truncated", tag))
        })?;
        rest = tail;
        size = (size << 7) | usize::from(b & 0x7F);
        if b & 0x80 == 0 {
            complete = true;
            break;
        }
    }
    if !complete {
        return Err(Error::invalid_descriptor(format!(
            "descriptor 0x{:02x} size exceeds four bytes",
            tag
        )));
    }

    if size > rest.len() {
        return Err(Error::invalid_descriptor(format!(
            "descriptor 0x{:02x} declares {} bytes, {} available",
            tag,
            size,
            rest.len()
        )));
    }

    let (body, rest) = rest.split_at(size);
    Ok((Descriptor { tag, body }, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_write_descriptor_padded_size() {
        let d = write_descriptor(SL_CONFIG_DESCRIPTOR_TAG, &[0x02]).unwrap();
        assert_eq!(d, vec![0x06, 0x80, 0x80, 0x80, 0x01, 0x02]);
    }

    #[test]
    fn test_write_descriptor_multi_byte_size() {
        let body = vec![0u8; 300];
        let d = write_descriptor(DECODER_SPECIFIC_INFO_TAG, &body).unwrap();
        // 300 = 0b10_0101100
        assert_eq!(&d[..5], &[0x05, 0x80, 0x80, 0x82, 0x2C]);
        let (parsed, rest) = read_descriptor(&d).unwrap();
        assert_eq!(parsed.body.len(), 300);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_read_descriptor_single_byte_size() {
        let data = [0x05, 0x02, 0x11, 0x90, 0x06, 0x01, 0x02];
        let descriptors: Vec<_> = DescriptorIter::new(&data)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            descriptors,
            vec![
                Descriptor {
                    tag: 0x05,
                    body: &[0x11, 0x90]
                },
                Descriptor {
                    tag: 0x06,
                    body: &[0x02]
                },
            ]
        );
    }

    #[test]
    fn test_read_descriptor_overrun() {
        assert_matches!(
            read_descriptor(&[0x05, 0x04, 0x11]),
            Err(Error::InvalidDescriptor(_))
        );
    }

    #[test]
    fn test_read_descriptor_unterminated_size() {
        assert_matches!(
            read_descriptor(&[0x03, 0x80, 0x80, 0x80, 0x80, 0x01]),
            Err(Error::InvalidDescriptor(_))
        );
        assert_matches!(
            read_descriptor(&[0x03, 0x80]),
            Err(Error::InvalidDescriptor(_))
        );
    }
}
