//! GIF row interlacing.
//!
//! Interlaced images store rows in four passes: every 8th row from 0, every
//! 8th row from 4, every 4th row from 2, then every 2nd row from 1.

use alloc::vec::Vec;

const PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Image row indices in the order they appear in an interlaced stream.
pub(crate) fn row_order(height: usize) -> impl Iterator<Item = usize> {
    PASSES
        .into_iter()
        .flat_map(move |(start, step)| (start..height).step_by(step))
}

/// Reorder rows from image order into stream order.
pub(crate) fn interlace(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len());
    for row in row_order(height) {
        out.extend_from_slice(&pixels[row * width..(row + 1) * width]);
    }
    out
}

/// Reorder rows from stream order into image order.
pub(crate) fn deinterlace(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = alloc::vec![0u8; pixels.len()];
    for (stream_row, row) in row_order(height).enumerate() {
        out[row * width..(row + 1) * width]
            .copy_from_slice(&pixels[stream_row * width..(stream_row + 1) * width]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn pass_order() {
        let order: Vec<usize> = row_order(10).collect();
        assert_eq!(order, vec![0, 8, 4, 2, 6, 1, 3, 5, 7, 9]);
    }

    #[test]
    fn covers_every_row_once() {
        for height in 1..40 {
            let mut rows: Vec<usize> = row_order(height).collect();
            rows.sort_unstable();
            assert_eq!(rows, (0..height).collect::<Vec<_>>(), "height {height}");
        }
    }

    #[test]
    fn interlace_then_deinterlace() {
        let (w, h) = (3, 11);
        let pixels: Vec<u8> = (0..(w * h) as u8).collect();
        let stream = interlace(&pixels, w, h);
        assert_eq!(&stream[3..6], &[24, 25, 26]); // row 8 comes second
        assert_eq!(deinterlace(&stream, w, h), pixels);
    }
}
