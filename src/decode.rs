//! Streaming GIF decoder.
//!
//! [`DecodeOptions::read_info`] parses everything up to the first image and
//! returns a [`Decoder`] session. Each [`Decoder::read_next_frame`] call then
//! advances an explicit cursor over the input by exactly one image, folding
//! any extensions met on the way into the frame or the session metadata.

use alloc::borrow::Cow;
use alloc::vec;
use alloc::vec::Vec;

use enough::{Stop, Unstoppable};

use crate::bits::{self, BitReader};
use crate::block::{self, Cursor, GraphicControl, ImageDescriptor, ScreenDescriptor};
use crate::error::GifError;
use crate::frame::{Frame, FrameInfo};
use crate::interlace;
use crate::limits::{Limits, MemoryLimit};
use crate::lzw;
use crate::palette::{self, Palette};
use crate::pixel::ColorOutput;
use crate::screen::{LogicalScreen, Repeat};

/// Decoder configuration.
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    color_output: ColorOutput,
    memory_limit: MemoryLimit,
    limits: Limits,
    check_frame_consistency: bool,
    check_lzw_end_code: bool,
    allow_unknown_blocks: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape of decoded frame buffers. Defaults to [`ColorOutput::IndexedPixels`].
    pub fn set_color_output(&mut self, color_output: ColorOutput) {
        self.color_output = color_output;
    }

    /// Byte budget for the buffers of one decoded frame.
    ///
    /// Negative means unlimited; zero is rejected with [`GifError::InvalidArgument`].
    pub fn set_memory_limit(&mut self, limit: i64) -> Result<(), GifError> {
        self.memory_limit = MemoryLimit::from_i64(limit)?;
        Ok(())
    }

    /// Dimension and frame count ceilings.
    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Also validate indexed output against the applicable palette.
    pub fn check_frame_consistency(&mut self, check: bool) {
        self.check_frame_consistency = check;
    }

    /// Treat image data that ends without an LZW end code as corrupt.
    pub fn check_lzw_end_code(&mut self, check: bool) {
        self.check_lzw_end_code = check;
    }

    /// Skip blocks with an unknown introducer instead of failing.
    pub fn allow_unknown_blocks(&mut self, allow: bool) {
        self.allow_unknown_blocks = allow;
    }

    pub fn color_output(&self) -> ColorOutput {
        self.color_output
    }

    pub fn memory_limit(&self) -> MemoryLimit {
        self.memory_limit
    }

    /// Start a session over `data`.
    ///
    /// Reads the header, the logical screen descriptor, the global color
    /// table and any extensions before the first image, so the loop count
    /// of a typical animation is known on return.
    pub fn read_info<'a>(self, data: impl Into<Cow<'a, [u8]>>) -> Result<Decoder<'a>, GifError> {
        let data = data.into();
        block::read_header(&data)?;
        let mut cursor = Cursor::new(&data, 6);
        let descriptor = ScreenDescriptor::read(&mut cursor)?;
        self.limits
            .check(u32::from(descriptor.width), u32::from(descriptor.height))?;

        let mut pos = cursor.position();
        let global_palette = match descriptor.global_table_bits {
            Some(bits) => {
                let (palette, end) = Palette::read_table(&data, pos, bits)?;
                pos = end;
                Some(palette)
            }
            None => None,
        };

        let mut decoder = Decoder {
            data,
            pos,
            options: self,
            screen: LogicalScreen {
                width: descriptor.width,
                height: descriptor.height,
                global_palette,
                background_index: descriptor.background_index,
                pixel_aspect_ratio: descriptor.pixel_aspect_ratio,
                repeat: None,
            },
            comments: Vec::new(),
            pending_control: None,
            frame_palette: None,
            frames_read: 0,
            state: State::Reading,
        };
        let seek = decoder.seek_image();
        decoder.guard(seek)?;
        Ok(decoder)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Reading,
    Done,
    Failed,
}

/// A decode session over one GIF stream.
///
/// Metadata found after the first image (late comments, a trailing loop
/// extension) shows up in the accessors once decoding has passed it.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: Cow<'a, [u8]>,
    pos: usize,
    options: DecodeOptions,
    screen: LogicalScreen,
    comments: Vec<Vec<u8>>,
    pending_control: Option<GraphicControl>,
    frame_palette: Option<Palette>,
    frames_read: u64,
    state: State,
}

impl<'a> Decoder<'a> {
    pub fn width(&self) -> u16 {
        self.screen.width
    }

    pub fn height(&self) -> u16 {
        self.screen.height
    }

    pub fn global_palette(&self) -> Option<&Palette> {
        self.screen.global_palette.as_ref()
    }

    pub fn background_index(&self) -> u8 {
        self.screen.background_index
    }

    /// Global palette color at the background index.
    pub fn background_color(&self) -> Option<[u8; 3]> {
        self.screen.background_color()
    }

    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.screen.pixel_aspect_ratio
    }

    /// `None` when no looping extension has been seen.
    pub fn loop_count(&self) -> Option<Repeat> {
        self.screen.repeat
    }

    /// Comment extension payloads seen so far, in stream order.
    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }

    pub fn screen(&self) -> &LogicalScreen {
        &self.screen
    }

    /// Palette of the frame read or skipped last: its local table, else the global one.
    pub fn palette(&self) -> Option<&Palette> {
        self.frame_palette.as_ref()
    }

    /// Frames read or skipped so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Decode the next frame. Returns `Ok(None)` at the trailer.
    ///
    /// After an error the session is finished and yields no more frames.
    pub fn read_next_frame(&mut self, stop: impl Stop) -> Result<Option<Frame>, GifError> {
        self.next_frame(&stop)
    }

    fn next_frame(&mut self, stop: &dyn Stop) -> Result<Option<Frame>, GifError> {
        if self.state != State::Reading {
            return Ok(None);
        }
        let result = self.decode_frame(stop);
        self.guard(result)
    }

    /// Metadata of the next frame, skipping its image data without decoding it.
    pub fn next_frame_info(&mut self) -> Result<Option<FrameInfo>, GifError> {
        if self.state != State::Reading {
            return Ok(None);
        }
        let result = self.skip_frame();
        self.guard(result)
    }

    /// Iterate over the remaining frames.
    pub fn frames(&mut self) -> Frames<'_, 'a> {
        Frames { decoder: self }
    }

    /// Tear down the session, keeping the screen metadata.
    pub fn into_screen(self) -> LogicalScreen {
        self.screen
    }

    fn guard<T>(&mut self, result: Result<T, GifError>) -> Result<T, GifError> {
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }

    /// Process blocks up to the next image separator, leaving the cursor on it.
    ///
    /// Returns false once the trailer has been consumed.
    fn seek_image(&mut self) -> Result<bool, GifError> {
        loop {
            let introducer = *self.data.get(self.pos).ok_or(GifError::TruncatedStream)?;
            match introducer {
                block::IMAGE_SEPARATOR => return Ok(true),
                block::TRAILER => {
                    self.pos += 1;
                    self.state = State::Done;
                    log::trace!("trailer after {} frames", self.frames_read);
                    return Ok(false);
                }
                block::EXTENSION_INTRODUCER => {
                    let label = *self
                        .data
                        .get(self.pos + 1)
                        .ok_or(GifError::TruncatedStream)?;
                    self.pos = self.read_extension(label, self.pos + 2)?;
                }
                other if self.options.allow_unknown_blocks => {
                    log::warn!("skipping unknown block 0x{other:02X} at offset {}", self.pos);
                    self.pos = bits::skip_sub_blocks(&self.data, self.pos + 1)?;
                }
                other => return Err(GifError::UnknownBlock(other)),
            }
        }
    }

    /// Handle one extension whose body starts at `pos`. Returns the position after it.
    fn read_extension(&mut self, label: u8, pos: usize) -> Result<usize, GifError> {
        let data = &self.data[..];
        match label {
            block::EXT_GRAPHIC_CONTROL => {
                let (control, end) = GraphicControl::read(data, pos)?;
                if self.pending_control.is_some() {
                    log::debug!("graphic control extension replaces an unused one");
                }
                self.pending_control = Some(control);
                Ok(end)
            }
            block::EXT_COMMENT => {
                let (comment, end) = bits::read_sub_blocks(data, pos)?;
                self.comments.push(comment);
                Ok(end)
            }
            block::EXT_APPLICATION => {
                let len = *data.get(pos).ok_or(GifError::TruncatedStream)? as usize;
                let identifier = data
                    .get(pos + 1..pos + 1 + len)
                    .ok_or(GifError::TruncatedStream)?;
                let (payload, end) = bits::read_sub_blocks(data, pos + 1 + len)?;
                match block::parse_loop_count(identifier, &payload) {
                    Some(count) => self.screen.repeat = Some(Repeat::from_wire(count)),
                    None => log::debug!("skipping application extension {identifier:?}"),
                }
                Ok(end)
            }
            block::EXT_PLAIN_TEXT => {
                // plain text is a graphic rendering block and consumes the control
                log::debug!("skipping plain text extension");
                self.pending_control = None;
                bits::skip_sub_blocks(data, pos)
            }
            other => {
                log::debug!("skipping unknown extension 0x{other:02X}");
                bits::skip_sub_blocks(data, pos)
            }
        }
    }

    /// Read the next image descriptor and local table. `None` at the trailer.
    fn read_frame_header(&mut self) -> Result<Option<FrameInfo>, GifError> {
        if !self.seek_image()? {
            return Ok(None);
        }
        let mut cursor = Cursor::new(&self.data, self.pos + 1);
        let descriptor = ImageDescriptor::read(&mut cursor)?;
        let mut pos = cursor.position();
        let palette = match descriptor.local_table_bits {
            Some(bits) => {
                let (palette, end) = Palette::read_table(&self.data, pos, bits)?;
                pos = end;
                Some(palette)
            }
            None => None,
        };
        self.pos = pos;

        if !descriptor.fits(self.screen.width, self.screen.height) {
            return Err(GifError::DimensionMismatch {
                left: descriptor.left,
                top: descriptor.top,
                width: descriptor.width,
                height: descriptor.height,
                canvas_width: self.screen.width,
                canvas_height: self.screen.height,
            });
        }
        let control = self.pending_control.take().unwrap_or_default();
        self.frame_palette = palette
            .clone()
            .or_else(|| self.screen.global_palette.clone());
        Ok(Some(FrameInfo {
            width: descriptor.width,
            height: descriptor.height,
            left: descriptor.left,
            top: descriptor.top,
            delay: control.delay,
            dispose: control.disposal,
            transparent: control.transparent,
            needs_user_input: control.user_input,
            interlaced: descriptor.interlaced,
            palette,
        }))
    }

    fn skip_frame(&mut self) -> Result<Option<FrameInfo>, GifError> {
        let Some(info) = self.read_frame_header()? else {
            return Ok(None);
        };
        // minimum code size byte, then the data sub-blocks
        self.pos = bits::skip_sub_blocks(&self.data, self.pos + 1)?;
        self.frames_read += 1;
        Ok(Some(info))
    }

    fn decode_frame(&mut self, stop: &dyn Stop) -> Result<Option<Frame>, GifError> {
        stop.check()?;
        let Some(info) = self.read_frame_header()? else {
            return Ok(None);
        };
        self.options.limits.check_frames(self.frames_read + 1)?;
        self.options
            .limits
            .check(u32::from(info.width), u32::from(info.height))?;

        let pixel_count = u64::from(info.width) * u64::from(info.height);
        let output = self.options.color_output;
        let needed = match output {
            ColorOutput::IndexedPixels => pixel_count,
            ColorOutput::Rgba => pixel_count * 5,
        };
        self.options.memory_limit.check(needed)?;
        let palette = info
            .palette
            .as_ref()
            .or(self.screen.global_palette.as_ref());
        if output == ColorOutput::Rgba && palette.is_none() {
            return Err(GifError::MissingColorTable);
        }

        let min_code_size = *self.data.get(self.pos).ok_or(GifError::TruncatedStream)?;
        log::trace!(
            "frame {}: {}x{} at ({}, {}), min code size {min_code_size}",
            self.frames_read,
            info.width,
            info.height,
            info.left,
            info.top
        );
        let mut indices = vec![0u8; pixel_count as usize];
        let mut reader = BitReader::new(&self.data, self.pos + 1);
        lzw::decode_indices(
            &mut reader,
            min_code_size,
            &mut indices,
            self.options.check_lzw_end_code,
            stop,
        )?;
        self.pos = reader.skip_to_end()?;

        let width = usize::from(info.width);
        let height = usize::from(info.height);
        if info.interlaced {
            indices = interlace::deinterlace(&indices, width, height);
        }
        if self.options.check_frame_consistency {
            if let Some(palette) = palette {
                palette::validate_indices(&indices, palette.len())?;
            }
        }

        let (buffer, layout) = match (output, palette) {
            (ColorOutput::Rgba, Some(palette)) => (
                expand_rgba(&indices, width, palette, info.transparent, stop)?,
                output.layout(),
            ),
            _ => (indices, output.layout()),
        };
        self.frames_read += 1;
        Ok(Some(Frame::from_parts(info, buffer, layout)))
    }
}

/// Map indices through `palette`; the transparent index becomes `[0, 0, 0, 0]`.
fn expand_rgba(
    indices: &[u8],
    width: usize,
    palette: &Palette,
    transparent: Option<u8>,
    stop: &dyn Stop,
) -> Result<Vec<u8>, GifError> {
    let mut out = Vec::with_capacity(indices.len() * 4);
    for (y, row) in indices.chunks(width.max(1)).enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        for &index in row {
            if Some(index) == transparent {
                out.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let [r, g, b] = palette.get(index).ok_or(GifError::PaletteIndexOutOfRange {
                index,
                len: palette.len(),
            })?;
            out.extend_from_slice(&[r, g, b, 255]);
        }
    }
    Ok(out)
}

/// Iterator over the remaining frames of a [`Decoder`].
pub struct Frames<'d, 'a> {
    decoder: &'d mut Decoder<'a>,
}

impl Iterator for Frames<'_, '_> {
    type Item = Result<Frame, GifError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.read_next_frame(Unstoppable).transpose()
    }
}

/// A fully decoded stream.
#[derive(Clone, Debug)]
pub struct GifImage {
    pub screen: LogicalScreen,
    pub frames: Vec<Frame>,
    pub comments: Vec<Vec<u8>>,
}

/// Decode every frame of `data`.
pub fn decode_all(data: &[u8], options: DecodeOptions, stop: impl Stop) -> Result<GifImage, GifError> {
    let mut decoder = options.read_info(data)?;
    let mut frames = Vec::new();
    while let Some(frame) = decoder.next_frame(&stop)? {
        frames.push(frame);
    }
    Ok(GifImage {
        screen: decoder.screen,
        frames,
        comments: decoder.comments,
    })
}
