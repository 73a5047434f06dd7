/// Pixel memory layout of a frame buffer.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// One byte per pixel, an index into the frame's color table.
    Indexed8,
    /// 3 channels, 8-bit RGB.
    Rgb8,
    /// 4 channels, 8-bit RGBA.
    Rgba8,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Indexed8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }

    /// Buffer length for a `width` x `height` image, or `None` on overflow.
    pub(crate) fn buffer_len(&self, width: u16, height: u16) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|wh| wh.checked_mul(self.bytes_per_pixel()))
    }
}

/// Output mode for decoded frame buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorOutput {
    /// Each pixel expanded through the palette into red, green, blue and alpha.
    Rgba,
    /// Each pixel left as an index into the frame's palette.
    #[default]
    IndexedPixels,
}

impl ColorOutput {
    /// Layout of the frame buffers produced in this mode.
    pub fn layout(&self) -> PixelLayout {
        match self {
            Self::Rgba => PixelLayout::Rgba8,
            Self::IndexedPixels => PixelLayout::Indexed8,
        }
    }
}
