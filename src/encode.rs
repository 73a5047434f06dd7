//! GIF encoder.
//!
//! Frames are validated when added and buffered; every call to
//! [`Encoder::encode`] serializes the whole accumulated sequence.

use alloc::vec::Vec;

use enough::{Stop, Unstoppable};

use crate::bits::BitWriter;
use crate::block::{self, GraphicControl, ImageDescriptor, ScreenDescriptor};
use crate::error::GifError;
use crate::frame::Frame;
use crate::interlace;
use crate::lzw;
use crate::palette::{self, Palette};
use crate::pixel::PixelLayout;
use crate::screen::{LogicalScreen, Repeat};

/// Assembles frames into a GIF89a stream.
///
/// ```
/// use zengif::{Encoder, Frame};
///
/// let mut encoder = Encoder::new(2, 1, Some(&[0, 0, 0, 255, 255, 255]))?;
/// encoder.set_repeat(0);
/// encoder.add_frame(Frame::from_indexed_pixels(2, 1, vec![0, 1], None, None)?)?;
/// let gif = encoder.get_buffer()?;
/// assert_eq!(&gif[..6], b"GIF89a");
/// # Ok::<(), zengif::GifError>(())
/// ```
#[derive(Debug)]
pub struct Encoder {
    screen: LogicalScreen,
    frames: Vec<Frame>,
    finalized: bool,
}

impl Encoder {
    /// Start a stream with a `width` x `height` canvas and an optional global
    /// palette given as packed RGB triples.
    pub fn new(width: u16, height: u16, palette: Option<&[u8]>) -> Result<Self, GifError> {
        if width == 0 || height == 0 {
            return Err(GifError::InvalidArgument(alloc::format!(
                "canvas dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let global_palette = palette.map(Palette::from_rgb_bytes).transpose()?;
        Ok(Self {
            screen: LogicalScreen {
                width,
                height,
                global_palette,
                background_index: 0,
                pixel_aspect_ratio: 0,
                repeat: None,
            },
            frames: Vec::new(),
            finalized: false,
        })
    }

    /// Set the loop count: negative for no looping extension, 0 to loop
    /// forever, otherwise the number of loops (clamped to 65535).
    ///
    /// Has no effect once the stream has been serialized.
    pub fn set_repeat(&mut self, count: i32) {
        if self.finalized {
            log::warn!("set_repeat({count}) ignored: stream already serialized");
            return;
        }
        self.screen.repeat = Repeat::from_count(count);
    }

    pub fn repeat(&self) -> Option<Repeat> {
        self.screen.repeat
    }

    pub fn set_background_index(&mut self, index: u8) {
        self.screen.background_index = index;
    }

    pub fn set_pixel_aspect_ratio(&mut self, ratio: u8) {
        self.screen.pixel_aspect_ratio = ratio;
    }

    /// The global palette.
    pub fn palette(&self) -> Option<&Palette> {
        self.screen.global_palette.as_ref()
    }

    pub fn screen(&self) -> &LogicalScreen {
        &self.screen
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Queue a frame.
    ///
    /// The frame must hold indexed pixels, fit the canvas at its offset, and
    /// index only entries of its local palette or, lacking one, the global
    /// palette. Nothing is queued on error.
    pub fn add_frame(&mut self, frame: Frame) -> Result<(), GifError> {
        if frame.layout() != PixelLayout::Indexed8 {
            return Err(GifError::UnsupportedLayout(frame.layout()));
        }
        let fits = u32::from(frame.left()) + u32::from(frame.width())
            <= u32::from(self.screen.width)
            && u32::from(frame.top()) + u32::from(frame.height()) <= u32::from(self.screen.height);
        if !fits {
            return Err(GifError::DimensionMismatch {
                left: frame.left(),
                top: frame.top(),
                width: frame.width(),
                height: frame.height(),
                canvas_width: self.screen.width,
                canvas_height: self.screen.height,
            });
        }
        let palette = self.palette_for(&frame)?;
        palette::validate_indices(frame.buffer(), palette.len())?;
        if let Some(index) = frame.transparent() {
            palette::validate_indices(&[index], palette.len())?;
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Serialize all frames queued so far.
    pub fn get_buffer(&mut self) -> Result<Vec<u8>, GifError> {
        self.encode(Unstoppable)
    }

    /// Serialize all frames queued so far, checking `stop` between frames
    /// and during compression.
    pub fn encode(&mut self, stop: impl Stop) -> Result<Vec<u8>, GifError> {
        let out = self.write_stream(&stop)?;
        self.finalized = true;
        Ok(out)
    }

    fn palette_for<'a>(&'a self, frame: &'a Frame) -> Result<&'a Palette, GifError> {
        frame
            .palette()
            .or(self.screen.global_palette.as_ref())
            .ok_or(GifError::MissingColorTable)
    }

    fn write_stream(&self, stop: &dyn Stop) -> Result<Vec<u8>, GifError> {
        stop.check()?;
        let pixel_total: usize = self.frames.iter().map(|f| f.buffer().len()).sum();
        let mut out = Vec::with_capacity(block::HEADER_LEN + 768 + pixel_total / 2);

        block::write_header(&mut out);
        let global = self.screen.global_palette.as_ref();
        ScreenDescriptor {
            width: self.screen.width,
            height: self.screen.height,
            global_table_bits: global.map(Palette::table_size_bits),
            background_index: self.screen.background_index,
            pixel_aspect_ratio: self.screen.pixel_aspect_ratio,
        }
        .write(&mut out);
        if let Some(palette) = global {
            palette.write_table(&mut out);
        }
        if let Some(repeat) = self.screen.repeat {
            block::write_netscape_loop(&mut out, repeat.wire_count());
        }

        for (i, frame) in self.frames.iter().enumerate() {
            stop.check()?;
            log::trace!(
                "encoding frame {i}: {}x{} at ({}, {})",
                frame.width(),
                frame.height(),
                frame.left(),
                frame.top()
            );
            self.write_frame(frame, &mut out, stop)?;
        }

        out.push(block::TRAILER);
        Ok(out)
    }

    fn write_frame(&self, frame: &Frame, out: &mut Vec<u8>, stop: &dyn Stop) -> Result<(), GifError> {
        let info = frame.info();
        if !info.has_default_control() {
            GraphicControl {
                disposal: info.dispose,
                user_input: info.needs_user_input,
                transparent: info.transparent,
                delay: info.delay,
            }
            .write(out);
        }

        ImageDescriptor {
            left: info.left,
            top: info.top,
            width: info.width,
            height: info.height,
            interlaced: info.interlaced,
            local_table_bits: info.palette.as_ref().map(Palette::table_size_bits),
        }
        .write(out);
        if let Some(local) = &info.palette {
            local.write_table(out);
        }

        let min_code_size = self.palette_for(frame)?.min_code_size();
        out.push(min_code_size);
        let interlaced;
        let pixels = if info.interlaced {
            interlaced = interlace::interlace(frame.buffer(), info.width.into(), info.height.into());
            &interlaced[..]
        } else {
            frame.buffer()
        };
        let mut writer = BitWriter::new(out);
        lzw::encode_indices(pixels, min_code_size, &mut writer, stop)?;
        writer.finish();
        Ok(())
    }
}
