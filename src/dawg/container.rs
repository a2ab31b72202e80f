//! A self-describing wrapper around a raw record array.
//!
//! The record array itself carries no header, so a reader has to know the
//! layout it was written with. The container prefixes it with the layout, the
//! slot and word counts, and a CRC-32 of the records:
//!
//! ```text
//! magic "PDWG" | version u8 | label_width u8 | inline_edges u8 | index bytes u8
//! | sentinel u8 | reserved u8 | slot_count u32 | word_count u32 | crc32 u32 | records
//! ```
//!
//! All integers are little-endian.

use crc32fast::Hasher as Crc32Hasher;

use super::error::{BuilderError, DecodeError};
use super::layout::{IndexWidth, Layout};
use super::reader::WordList;

/// Magic bytes opening every container.
pub const MAGIC: [u8; 4] = *b"PDWG";

/// Container format version written by this crate.
pub const VERSION: u8 = 1;

/// Size of the container header in bytes.
pub const HEADER_SIZE: usize = 22;

/// The decoded container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Layout of the records that follow.
    pub layout: Layout,
    /// Number of record slots.
    pub slot_count: u32,
    /// Number of stored words.
    pub word_count: u32,
    /// CRC-32 of the record bytes.
    pub checksum: u32,
}

impl Header {
    /// Builds the header describing `records`.
    ///
    /// Fails if the slot or word count does not fit in 32 bits.
    pub fn describe(records: &[u8], layout: Layout, word_count: usize) -> Result<Self, BuilderError> {
        Ok(Header {
            layout,
            slot_count: header_count("slot count", records.len() / layout.record_size())?,
            word_count: header_count("word count", word_count)?,
            checksum: checksum(records),
        })
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = VERSION;
        buf[5] = self.layout.label_width as u8;
        buf[6] = self.layout.inline_edges as u8;
        buf[7] = self.layout.index_width.bytes() as u8;
        buf[8] = self.layout.sentinel;
        buf[10..14].copy_from_slice(&self.slot_count.to_le_bytes());
        buf[14..18].copy_from_slice(&self.word_count.to_le_bytes());
        buf[18..22].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Parses a header from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DecodeError::Truncated {
                len: bytes.len(),
                needed: HEADER_SIZE,
            });
        }
        if bytes[0..4] != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        if bytes[4] != VERSION {
            return Err(DecodeError::UnsupportedVersion(bytes[4]));
        }
        let layout = Layout {
            label_width: usize::from(bytes[5]),
            inline_edges: usize::from(bytes[6]),
            index_width: IndexWidth::from_bytes(bytes[7])?,
            sentinel: bytes[8],
        };
        layout.validate()?;
        let u32_at = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        Ok(Header {
            layout,
            slot_count: u32_at(10),
            word_count: u32_at(14),
            checksum: u32_at(18),
        })
    }
}

fn header_count(field: &'static str, value: usize) -> Result<u32, BuilderError> {
    u32::try_from(value).map_err(|_| BuilderError::CountOverflow { field, value })
}

/// CRC-32 of a record array.
pub fn checksum(records: &[u8]) -> u32 {
    let mut hasher = Crc32Hasher::new();
    hasher.update(records);
    hasher.finalize()
}

/// Prefixes `records` with a header describing them.
pub fn wrap(records: &[u8], layout: Layout, word_count: usize) -> Result<Vec<u8>, BuilderError> {
    let header = Header::describe(records, layout, word_count)?;
    let mut out = Vec::with_capacity(HEADER_SIZE + records.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(records);
    Ok(out)
}

/// Checks a container and returns its header and record bytes.
///
/// The container must end exactly where its records do.
pub fn unwrap(bytes: &[u8]) -> Result<(Header, &[u8]), DecodeError> {
    let header = Header::from_bytes(bytes)?;
    let needed = HEADER_SIZE + header.slot_count as usize * header.layout.record_size();
    if bytes.len() < needed {
        return Err(DecodeError::Truncated {
            len: bytes.len(),
            needed,
        });
    }
    if bytes.len() > needed {
        return Err(DecodeError::TrailingBytes {
            len: bytes.len(),
            expected: needed,
        });
    }
    let records = &bytes[HEADER_SIZE..];
    let computed = checksum(records);
    if computed != header.checksum {
        return Err(DecodeError::ChecksumMismatch {
            stored: header.checksum,
            computed,
        });
    }
    Ok((header, records))
}

impl<'a> WordList<'a> {
    /// Opens a container produced by [`wrap`] or
    /// [`Packed::to_container`](super::builder::Packed::to_container).
    pub fn from_container(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let (header, records) = unwrap(bytes)?;
        WordList::new(records, header.layout)
    }
}
