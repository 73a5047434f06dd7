//! One image of a GIF stream: pixels plus presentation metadata.

use alloc::vec::Vec;

#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::error::GifError;
use crate::palette::{self, Palette};
use crate::pixel::PixelLayout;
use crate::quantize::{self, QuantizeOptions};

/// What happens to a frame's area before the next frame is drawn.
///
/// Recorded and round-tripped only; the codec never composites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DisposalMethod {
    /// No disposal specified.
    #[default]
    Any = 0,
    /// Leave the frame in place.
    Keep = 1,
    /// Restore the area to the background color.
    Background = 2,
    /// Restore the area to what was there before.
    Previous = 3,
}

impl DisposalMethod {
    /// Decode the 3-bit wire field. Reserved values 4..=7 read as [`DisposalMethod::Any`].
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Keep,
            2 => Self::Background,
            3 => Self::Previous,
            _ => Self::Any,
        }
    }
}

impl From<DisposalMethod> for u8 {
    fn from(method: DisposalMethod) -> u8 {
        method as u8
    }
}

/// Construction input for a [`Frame`].
///
/// Every variant resolves into the same canonical frame: indexed pixels plus
/// an optional local palette.
#[derive(Clone, Debug)]
pub enum FrameSource {
    /// Packed RGBA, 4 bytes per pixel. Quantized on construction.
    Rgba(Vec<u8>),
    /// Packed RGB, 3 bytes per pixel. Quantized on construction.
    Rgb(Vec<u8>),
    /// One palette index per pixel, with an optional local palette as RGB triples.
    Indexed {
        pixels: Vec<u8>,
        palette: Option<Vec<u8>>,
    },
}

/// Frame metadata without pixel data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: u16,
    pub height: u16,
    /// Horizontal offset within the canvas.
    pub left: u16,
    /// Vertical offset within the canvas.
    pub top: u16,
    /// Display time in hundredths of a second. 0 means as fast as possible.
    pub delay: u16,
    pub dispose: DisposalMethod,
    /// Palette index rendered as transparent.
    pub transparent: Option<u8>,
    pub needs_user_input: bool,
    pub interlaced: bool,
    /// Local color table.
    pub palette: Option<Palette>,
}

impl FrameInfo {
    /// True when no graphic control field differs from its default.
    pub(crate) fn has_default_control(&self) -> bool {
        self.delay == 0
            && self.dispose == DisposalMethod::Any
            && self.transparent.is_none()
            && !self.needs_user_input
    }
}

/// A single GIF image.
///
/// Frames built for encoding carry [`PixelLayout::Indexed8`] pixels. Decoded
/// frames carry `Indexed8` or `Rgba8` pixels depending on the decoder's
/// [`ColorOutput`](crate::ColorOutput).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    info: FrameInfo,
    buffer: Vec<u8>,
    layout: PixelLayout,
}

impl Frame {
    /// Build a frame from palette indices.
    ///
    /// `palette` is packed RGB triples used as the local color table. When it
    /// is given, every index and the transparent index must address it.
    pub fn from_indexed_pixels(
        width: u16,
        height: u16,
        pixels: Vec<u8>,
        palette: Option<&[u8]>,
        transparent: Option<u8>,
    ) -> Result<Self, GifError> {
        check_buffer(width, height, PixelLayout::Indexed8, pixels.len())?;
        let palette = palette.map(Palette::from_rgb_bytes).transpose()?;
        if let Some(palette) = &palette {
            palette::validate_indices(&pixels, palette.len())?;
            if let Some(index) = transparent {
                palette::validate_indices(&[index], palette.len())?;
            }
        }
        Ok(Self {
            info: FrameInfo {
                width,
                height,
                transparent,
                palette,
                ..FrameInfo::default()
            },
            buffer: pixels,
            layout: PixelLayout::Indexed8,
        })
    }

    /// Build a frame from packed RGBA pixels, quantizing to a local palette.
    ///
    /// Pixels with alpha below 128 share one transparent palette slot.
    /// `speed` is 1..=30, defaulting to [`quantize::DEFAULT_SPEED`].
    pub fn from_rgba(width: u16, height: u16, rgba: &[u8], speed: Option<u8>) -> Result<Self, GifError> {
        Self::from_true_color(width, height, rgba, PixelLayout::Rgba8, speed)
    }

    /// Build a frame from packed RGB pixels, quantizing to a local palette.
    pub fn from_rgb(width: u16, height: u16, rgb: &[u8], speed: Option<u8>) -> Result<Self, GifError> {
        Self::from_true_color(width, height, rgb, PixelLayout::Rgb8, speed)
    }

    /// Build a frame from one `#RRGGBB[AA]` color string per pixel.
    pub fn from_hex(width: u16, height: u16, hex: &[&str], speed: Option<u8>) -> Result<Self, GifError> {
        let rgba = crate::hex::hex_to_rgba(hex)?;
        Self::from_rgba(width, height, &rgba, speed)
    }

    /// Resolve a [`FrameSource`] into a frame. True-color input uses the default speed.
    pub fn from_source(width: u16, height: u16, source: FrameSource) -> Result<Self, GifError> {
        match source {
            FrameSource::Rgba(bytes) => Self::from_rgba(width, height, &bytes, None),
            FrameSource::Rgb(bytes) => Self::from_rgb(width, height, &bytes, None),
            FrameSource::Indexed { pixels, palette } => {
                Self::from_indexed_pixels(width, height, pixels, palette.as_deref(), None)
            }
        }
    }

    fn from_true_color(
        width: u16,
        height: u16,
        pixels: &[u8],
        layout: PixelLayout,
        speed: Option<u8>,
    ) -> Result<Self, GifError> {
        check_buffer(width, height, layout, pixels.len())?;
        let options = QuantizeOptions::default().with_speed(speed.unwrap_or(quantize::DEFAULT_SPEED));
        let quantized = quantize::quantize_pixels(pixels, layout, &options)?;
        Ok(Self {
            info: FrameInfo {
                width,
                height,
                transparent: quantized.transparent,
                palette: Some(quantized.palette),
                ..FrameInfo::default()
            },
            buffer: quantized.indices,
            layout: PixelLayout::Indexed8,
        })
    }

    /// Assemble a decoded frame. The buffer length is checked by the decoder.
    pub(crate) fn from_parts(info: FrameInfo, buffer: Vec<u8>, layout: PixelLayout) -> Self {
        Self { info, buffer, layout }
    }

    pub fn with_delay(mut self, delay: u16) -> Self {
        self.info.delay = delay;
        self
    }

    pub fn with_dispose(mut self, dispose: DisposalMethod) -> Self {
        self.info.dispose = dispose;
        self
    }

    pub fn with_transparent(mut self, transparent: Option<u8>) -> Self {
        self.info.transparent = transparent;
        self
    }

    pub fn with_needs_user_input(mut self, needs_user_input: bool) -> Self {
        self.info.needs_user_input = needs_user_input;
        self
    }

    /// Place the frame at (`left`, `top`) on the canvas.
    pub fn with_offset(mut self, left: u16, top: u16) -> Self {
        self.info.left = left;
        self.info.top = top;
        self
    }

    /// Store rows in interlaced order when encoded.
    pub fn with_interlaced(mut self, interlaced: bool) -> Self {
        self.info.interlaced = interlaced;
        self
    }

    pub fn width(&self) -> u16 {
        self.info.width
    }

    pub fn height(&self) -> u16 {
        self.info.height
    }

    pub fn left(&self) -> u16 {
        self.info.left
    }

    pub fn top(&self) -> u16 {
        self.info.top
    }

    pub fn delay(&self) -> u16 {
        self.info.delay
    }

    pub fn dispose(&self) -> DisposalMethod {
        self.info.dispose
    }

    pub fn transparent(&self) -> Option<u8> {
        self.info.transparent
    }

    pub fn needs_user_input(&self) -> bool {
        self.info.needs_user_input
    }

    pub fn interlaced(&self) -> bool {
        self.info.interlaced
    }

    /// Local color table, if the frame has one.
    pub fn palette(&self) -> Option<&Palette> {
        self.info.palette.as_ref()
    }

    pub fn info(&self) -> &FrameInfo {
        &self.info
    }

    /// Layout of [`Frame::buffer`].
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    /// View an RGBA frame as typed pixels.
    ///
    /// Returns [`GifError::UnsupportedLayout`] for indexed frames.
    #[cfg(feature = "rgb")]
    pub fn as_rgba(&self) -> Result<&[rgb::RGBA8], GifError> {
        if self.layout != PixelLayout::Rgba8 {
            return Err(GifError::UnsupportedLayout(self.layout));
        }
        Ok(self.buffer.as_pixels())
    }

    /// Zero-copy 2D view of an RGBA frame.
    #[cfg(feature = "imgref")]
    pub fn as_imgref(&self) -> Result<imgref::ImgRef<'_, rgb::RGBA8>, GifError> {
        let pixels = self.as_rgba()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.info.width as usize,
            self.info.height as usize,
        ))
    }

    /// Zero-copy 2D view of an indexed frame's palette indices.
    #[cfg(feature = "imgref")]
    pub fn as_indexed_imgref(&self) -> Result<imgref::ImgRef<'_, u8>, GifError> {
        if self.layout != PixelLayout::Indexed8 {
            return Err(GifError::UnsupportedLayout(self.layout));
        }
        Ok(imgref::ImgRef::new(
            &self.buffer,
            self.info.width as usize,
            self.info.height as usize,
        ))
    }
}

fn check_buffer(width: u16, height: u16, layout: PixelLayout, actual: usize) -> Result<(), GifError> {
    if width == 0 || height == 0 {
        return Err(GifError::InvalidArgument(alloc::format!(
            "frame dimensions must be non-zero, got {width}x{height}"
        )));
    }
    let expected = layout
        .buffer_len(width, height)
        .ok_or_else(|| GifError::LimitExceeded("frame buffer size overflows usize".into()))?;
    if expected != actual {
        return Err(GifError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}
