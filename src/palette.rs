//! Color tables.

use alloc::format;
use alloc::vec::Vec;

use crate::error::GifError;

/// Most entries a GIF color table can hold.
pub const MAX_COLORS: usize = 256;

/// An ordered list of RGB colors, 1 to 256 entries.
///
/// On the wire a table always holds a power of two entries (at least 2);
/// the slots past [`Palette::len`] are written as black.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    /// Build a palette from packed RGB triples.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Result<Self, GifError> {
        if bytes.is_empty() {
            return Err(GifError::InvalidPalette("palette is empty".into()));
        }
        if bytes.len() % 3 != 0 {
            return Err(GifError::InvalidPalette(format!(
                "palette length {} is not a multiple of 3",
                bytes.len()
            )));
        }
        if bytes.len() > MAX_COLORS * 3 {
            return Err(GifError::InvalidPalette(format!(
                "palette length {} exceeds {} bytes",
                bytes.len(),
                MAX_COLORS * 3
            )));
        }
        Ok(Self {
            colors: bytes.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        })
    }

    /// Build a palette from a list of colors.
    pub fn from_colors(colors: Vec<[u8; 3]>) -> Result<Self, GifError> {
        if colors.is_empty() || colors.len() > MAX_COLORS {
            return Err(GifError::InvalidPalette(format!(
                "palette must hold 1 to {MAX_COLORS} colors, got {}",
                colors.len()
            )));
        }
        Ok(Self { colors })
    }

    /// Number of real entries.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; a palette holds at least one color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.colors.get(index as usize).copied()
    }

    /// Packed RGB triples of the real entries.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }

    /// The 3-bit size field of the table flags: the table holds `2^(bits+1)` entries.
    pub fn table_size_bits(&self) -> u8 {
        table_size_bits(self.colors.len())
    }

    /// Number of entries written on the wire.
    pub fn table_len(&self) -> usize {
        2 << self.table_size_bits()
    }

    /// LZW minimum code size for images indexing this palette.
    pub fn min_code_size(&self) -> u8 {
        (self.table_size_bits() + 1).max(2)
    }

    /// Append the padded table.
    pub(crate) fn write_table(&self, out: &mut Vec<u8>) {
        for color in &self.colors {
            out.extend_from_slice(color);
        }
        let filler = self.table_len() - self.colors.len();
        out.extend(core::iter::repeat_n(0u8, filler * 3));
    }

    /// Parse a table of `2^(bits+1)` entries at `pos`. Returns the palette and the position after it.
    pub(crate) fn read_table(data: &[u8], pos: usize, bits: u8) -> Result<(Self, usize), GifError> {
        let len = 2usize << (bits & 0x07);
        let end = pos + len * 3;
        let bytes = data.get(pos..end).ok_or(GifError::TruncatedStream)?;
        Ok((Self::from_rgb_bytes(bytes)?, end))
    }

    /// Index of the entry closest to `rgb` by squared Euclidean distance.
    ///
    /// The lowest index wins ties.
    pub fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let mut best = 0usize;
        let mut best_dist = u32::MAX;
        for (i, color) in self.colors.iter().enumerate() {
            let dist = distance_sq(*color, rgb);
            if dist < best_dist {
                best = i;
                best_dist = dist;
                if dist == 0 {
                    break;
                }
            }
        }
        best as u8
    }
}

/// Smallest `bits` such that `2^(bits+1) >= len`.
pub(crate) fn table_size_bits(len: usize) -> u8 {
    let mut bits = 0u8;
    while bits < 7 && (2usize << bits) < len {
        bits += 1;
    }
    bits
}

pub(crate) fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            (d * d) as u32
        })
        .sum()
}

/// Check that every index addresses one of `palette_len` entries.
pub fn validate_indices(pixels: &[u8], palette_len: usize) -> Result<(), GifError> {
    match pixels.iter().find(|&&p| p as usize >= palette_len) {
        Some(&index) => Err(GifError::PaletteIndexOutOfRange {
            index,
            len: palette_len,
        }),
        None => Ok(()),
    }
}
