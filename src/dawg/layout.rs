//! The fixed record layout of a packed word graph.
//!
//! A packed graph is a flat array of equally sized records; record 0 is the root.
//!
//! ```text
//! [label: W bytes][edge count: u8][edge 0]..[edge K-1]   (record_size bytes)
//! [edge K]..........................................   (overflow slots, only when edge count > K)
//! ```
//!
//! Edges are slot indices measured from the start of the array, written
//! little-endian with the configured [`IndexWidth`]. Edge `i` always lives at
//! byte `W + 1 + i * index_bytes` from the start of its record, so edges past the
//! inline capacity simply continue into the raw bytes of the slots reserved
//! after the record. Those slots are never node headers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::LayoutError;
use super::label::DEFAULT_SENTINEL;

/// Width of a packed edge index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IndexWidth {
    /// One byte, for lists of at most 256 slots.
    U8,
    /// Two bytes.
    #[default]
    U16,
    /// Four bytes.
    U32,
}

impl IndexWidth {
    /// Size of one index in bytes.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            IndexWidth::U8 => 1,
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }

    /// Largest slot index this width can address.
    pub const fn max_index(self) -> usize {
        match self {
            IndexWidth::U8 => u8::MAX as usize,
            IndexWidth::U16 => u16::MAX as usize,
            IndexWidth::U32 => u32::MAX as usize,
        }
    }

    /// Picks the width matching a byte count stored in a container header.
    pub fn from_bytes(bytes: u8) -> Result<Self, LayoutError> {
        match bytes {
            1 => Ok(IndexWidth::U8),
            2 => Ok(IndexWidth::U16),
            4 => Ok(IndexWidth::U32),
            other => Err(LayoutError::UnsupportedIndexWidth(other)),
        }
    }

    /// Decodes an index from the first [`bytes`](Self::bytes) bytes of `src`.
    #[inline]
    pub(crate) fn read(self, src: &[u8]) -> usize {
        match self {
            IndexWidth::U8 => usize::from(src[0]),
            IndexWidth::U16 => usize::from(u16::from_le_bytes([src[0], src[1]])),
            IndexWidth::U32 => u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize,
        }
    }

    /// Encodes `index` into the first [`bytes`](Self::bytes) bytes of `dst`.
    ///
    /// The caller has checked `index <= self.max_index()`.
    #[inline]
    pub(crate) fn write(self, index: usize, dst: &mut [u8]) {
        match self {
            IndexWidth::U8 => dst[0] = index as u8,
            IndexWidth::U16 => dst[..2].copy_from_slice(&(index as u16).to_le_bytes()),
            IndexWidth::U32 => dst[..4].copy_from_slice(&(index as u32).to_le_bytes()),
        }
    }
}

/// Shape of a packed record. Builder and reader must agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    /// Label field width `W`.
    pub label_width: usize,
    /// Edges stored inline in a record, `K`.
    pub inline_edges: usize,
    /// Width of every edge index.
    pub index_width: IndexWidth,
    /// Byte appended to every word to mark its end.
    pub sentinel: u8,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            label_width: 4,
            inline_edges: 2,
            index_width: IndexWidth::U16,
            sentinel: DEFAULT_SENTINEL,
        }
    }
}

impl Layout {
    /// Checks that the layout can describe a record.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.label_width == 0 {
            return Err(LayoutError::ZeroLabelWidth);
        }
        if self.label_width > usize::from(u8::MAX) {
            return Err(LayoutError::LabelWidthTooLarge(self.label_width));
        }
        if self.inline_edges > usize::from(u8::MAX) {
            return Err(LayoutError::InlineEdgesTooLarge(self.inline_edges));
        }
        if self.sentinel == 0 {
            return Err(LayoutError::NulSentinel);
        }
        Ok(())
    }

    /// Size of one record in bytes.
    #[inline]
    pub const fn record_size(&self) -> usize {
        self.label_width + 1 + self.inline_edges * self.index_width.bytes()
    }

    /// Extra slots a record with `edge_count` edges reserves for its overflow edges.
    #[inline]
    pub const fn overflow_slots(&self, edge_count: usize) -> usize {
        let extra = edge_count.saturating_sub(self.inline_edges);
        (extra * self.index_width.bytes()).div_ceil(self.record_size())
    }

    /// Total slots occupied by a record with `edge_count` edges.
    #[inline]
    pub const fn slots_for(&self, edge_count: usize) -> usize {
        1 + self.overflow_slots(edge_count)
    }

    /// Byte offset of edge `i` from the start of its record.
    #[inline]
    pub(crate) const fn edge_offset(&self, i: usize) -> usize {
        self.label_width + 1 + i * self.index_width.bytes()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_record_is_nine_bytes() {
        let layout = Layout::default();
        assert_eq!(layout.record_size(), 9);
        assert_eq!(layout.edge_offset(0), 5);
        assert_eq!(layout.edge_offset(2), 9);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn overflow_slot_arithmetic() {
        let layout = Layout::default();
        assert_eq!(layout.overflow_slots(0), 0);
        assert_eq!(layout.overflow_slots(2), 0);
        // 1..=4 extra edges fit in one 9-byte slot, the fifth needs a second.
        assert_eq!(layout.overflow_slots(3), 1);
        assert_eq!(layout.overflow_slots(6), 1);
        assert_eq!(layout.overflow_slots(7), 2);
        assert_eq!(layout.slots_for(20), 5);
        assert_eq!(layout.slots_for(255), 58);
    }

    #[test]
    fn wide_indices_use_more_overflow() {
        let layout = Layout {
            index_width: IndexWidth::U32,
            ..Layout::default()
        };
        assert_eq!(layout.record_size(), 13);
        assert_eq!(layout.overflow_slots(3), 1);
        assert_eq!(layout.overflow_slots(6), 2);
    }

    #[test]
    fn index_round_trip_is_little_endian() {
        let mut buf = [0u8; 4];
        IndexWidth::U16.write(0x1234, &mut buf);
        assert_eq!(buf, [0x34, 0x12, 0, 0]);
        assert_eq!(IndexWidth::U16.read(&buf), 0x1234);
        IndexWidth::U32.write(0x0102_0304, &mut buf);
        assert_eq!(buf, [4, 3, 2, 1]);
        assert_eq!(IndexWidth::U8.read(&buf), 4);
    }

    #[test]
    fn invalid_layouts() {
        let zero = Layout {
            label_width: 0,
            ..Layout::default()
        };
        assert_eq!(zero.validate(), Err(LayoutError::ZeroLabelWidth));
        let nul = Layout {
            sentinel: 0,
            ..Layout::default()
        };
        assert_eq!(nul.validate(), Err(LayoutError::NulSentinel));
        assert_eq!(IndexWidth::from_bytes(3), Err(LayoutError::UnsupportedIndexWidth(3)));
        assert_eq!(IndexWidth::from_bytes(2), Ok(IndexWidth::U16));
    }
}
