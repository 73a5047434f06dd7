//! GIF block structure.
//!
//! A stream is laid out as:
//!
//! * header (`GIF87a` / `GIF89a`)
//! * logical screen descriptor, then the global color table if flagged
//! * any number of extensions and images, each image being
//!   - an optional graphic control extension
//!   - the image descriptor, then the local color table if flagged
//!   - the LZW minimum code size byte and the image data sub-blocks
//! * trailer (`;`)

use alloc::vec::Vec;

use crate::error::GifError;
use crate::frame::DisposalMethod;

pub(crate) const SIGNATURE: &[u8; 3] = b"GIF";
pub(crate) const VERSION_87A: &[u8; 3] = b"87a";
pub(crate) const VERSION_89A: &[u8; 3] = b"89a";

/// Header plus logical screen descriptor.
pub(crate) const HEADER_LEN: usize = 13;

pub(crate) const IMAGE_SEPARATOR: u8 = 0x2C;
pub(crate) const EXTENSION_INTRODUCER: u8 = 0x21;
pub(crate) const TRAILER: u8 = 0x3B;

pub(crate) const EXT_PLAIN_TEXT: u8 = 0x01;
pub(crate) const EXT_GRAPHIC_CONTROL: u8 = 0xF9;
pub(crate) const EXT_COMMENT: u8 = 0xFE;
pub(crate) const EXT_APPLICATION: u8 = 0xFF;

pub(crate) const NETSCAPE_ID: &[u8; 11] = b"NETSCAPE2.0";
pub(crate) const ANIMEXTS_ID: &[u8; 11] = b"ANIMEXTS1.0";

const TABLE_PRESENT: u8 = 0b1000_0000;
const COLOR_RESOLUTION: u8 = 0b0111_0000;
const TABLE_SIZE: u8 = 0b0000_0111;
const INTERLACED: u8 = 0b0100_0000;

// ── Cursor for reading from &[u8] ───────────────────────────────────

/// Read position over the whole input buffer.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, GifError> {
        let b = *self.data.get(self.pos).ok_or(GifError::TruncatedStream)?;
        self.pos += 1;
        Ok(b)
    }

    pub(crate) fn read_u16_le(&mut self) -> Result<u16, GifError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], GifError> {
        let end = self.pos.checked_add(n).ok_or(GifError::TruncatedStream)?;
        let bytes = self.data.get(self.pos..end).ok_or(GifError::TruncatedStream)?;
        self.pos = end;
        Ok(bytes)
    }
}

// ── Logical screen descriptor ───────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
    /// Size bits of the global table, when one follows.
    pub global_table_bits: Option<u8>,
    pub background_index: u8,
    pub pixel_aspect_ratio: u8,
}

impl ScreenDescriptor {
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        let flags = match self.global_table_bits {
            // color resolution mirrors the table size: 8 bits per channel at 256 entries
            Some(bits) => TABLE_PRESENT | (bits << 4) | bits,
            None => 0,
        };
        out.push(flags);
        out.push(self.background_index);
        out.push(self.pixel_aspect_ratio);
    }

    pub(crate) fn read(cursor: &mut Cursor<'_>) -> Result<Self, GifError> {
        let width = cursor.read_u16_le()?;
        let height = cursor.read_u16_le()?;
        let flags = cursor.read_u8()?;
        let background_index = cursor.read_u8()?;
        let pixel_aspect_ratio = cursor.read_u8()?;
        log::trace!(
            "screen {width}x{height}, flags {flags:#04x}, color resolution {}",
            ((flags & COLOR_RESOLUTION) >> 4) + 1
        );
        Ok(Self {
            width,
            height,
            global_table_bits: (flags & TABLE_PRESENT != 0).then_some(flags & TABLE_SIZE),
            background_index,
            pixel_aspect_ratio,
        })
    }
}

/// Write the header and check the signature when reading.
pub(crate) fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(SIGNATURE);
    out.extend_from_slice(VERSION_89A);
}

pub(crate) fn read_header(data: &[u8]) -> Result<(), GifError> {
    if data.len() < 6 {
        return Err(GifError::TruncatedHeader);
    }
    if &data[0..3] != SIGNATURE || (&data[3..6] != VERSION_87A && &data[3..6] != VERSION_89A) {
        return Err(GifError::InvalidSignature);
    }
    if data.len() < HEADER_LEN {
        return Err(GifError::TruncatedHeader);
    }
    Ok(())
}

// ── Graphic control extension ───────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct GraphicControl {
    pub disposal: DisposalMethod,
    pub user_input: bool,
    pub transparent: Option<u8>,
    pub delay: u16,
}

impl GraphicControl {
    const BLOCK_SIZE: u8 = 4;

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.push(EXTENSION_INTRODUCER);
        out.push(EXT_GRAPHIC_CONTROL);
        out.push(Self::BLOCK_SIZE);
        let mut flags = u8::from(self.disposal) << 2;
        if self.user_input {
            flags |= 0b10;
        }
        if self.transparent.is_some() {
            flags |= 0b01;
        }
        out.push(flags);
        out.extend_from_slice(&self.delay.to_le_bytes());
        out.push(self.transparent.unwrap_or(0));
        out.push(0);
    }

    /// Parse the extension body (everything after the label).
    ///
    /// Returns the parsed fields and the position after the terminator.
    pub(crate) fn read(data: &[u8], pos: usize) -> Result<(Self, usize), GifError> {
        let mut cursor = Cursor::new(data, pos);
        let size = cursor.read_u8()?;
        if size < Self::BLOCK_SIZE {
            return Err(GifError::TruncatedStream);
        }
        let body = cursor.read_bytes(size as usize)?;
        let flags = body[0];
        let control = Self {
            disposal: DisposalMethod::from_bits((flags >> 2) & 0b111),
            user_input: flags & 0b10 != 0,
            transparent: (flags & 0b01 != 0).then_some(body[3]),
            delay: u16::from_le_bytes([body[1], body[2]]),
        };
        let end = crate::bits::skip_sub_blocks(data, cursor.position())?;
        Ok((control, end))
    }
}

// ── Application extension: loop count ──────────────────────────────

/// Write a NETSCAPE2.0 looping extension with the wire loop count (0 = forever).
pub(crate) fn write_netscape_loop(out: &mut Vec<u8>, loops: u16) {
    out.push(EXTENSION_INTRODUCER);
    out.push(EXT_APPLICATION);
    out.push(NETSCAPE_ID.len() as u8);
    out.extend_from_slice(NETSCAPE_ID);
    out.push(3);
    out.push(1);
    out.extend_from_slice(&loops.to_le_bytes());
    out.push(0);
}

/// Extract the loop count from an application extension payload, if it is a looping extension.
///
/// `identifier` is the 11-byte application block; `payload` the concatenated data sub-blocks.
pub(crate) fn parse_loop_count(identifier: &[u8], payload: &[u8]) -> Option<u16> {
    if identifier != NETSCAPE_ID && identifier != ANIMEXTS_ID {
        return None;
    }
    match payload {
        [1, lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

// ── Image descriptor ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    /// Size bits of the local table, when one follows.
    pub local_table_bits: Option<u8>,
}

impl ImageDescriptor {
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.push(IMAGE_SEPARATOR);
        out.extend_from_slice(&self.left.to_le_bytes());
        out.extend_from_slice(&self.top.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        let mut flags = 0;
        if let Some(bits) = self.local_table_bits {
            flags |= TABLE_PRESENT | bits;
        }
        if self.interlaced {
            flags |= INTERLACED;
        }
        out.push(flags);
    }

    /// Parse the descriptor body (everything after the separator).
    pub(crate) fn read(cursor: &mut Cursor<'_>) -> Result<Self, GifError> {
        let left = cursor.read_u16_le()?;
        let top = cursor.read_u16_le()?;
        let width = cursor.read_u16_le()?;
        let height = cursor.read_u16_le()?;
        let flags = cursor.read_u8()?;
        Ok(Self {
            left,
            top,
            width,
            height,
            interlaced: flags & INTERLACED != 0,
            local_table_bits: (flags & TABLE_PRESENT != 0).then_some(flags & TABLE_SIZE),
        })
    }

    /// Whether the image lies inside a `canvas_width` x `canvas_height` screen.
    pub(crate) fn fits(&self, canvas_width: u16, canvas_height: u16) -> bool {
        u32::from(self.left) + u32::from(self.width) <= u32::from(canvas_width)
            && u32::from(self.top) + u32::from(self.height) <= u32::from(canvas_height)
    }
}
