//! Variable-width code packing over GIF sub-blocks.
//!
//! Codes are packed LSB first. The packed bytes travel in sub-blocks of at
//! most 255 bytes, each preceded by its length, and the chain ends with a
//! zero-length block.

use alloc::vec::Vec;

use crate::error::GifError;

/// Largest payload of a single sub-block.
pub(crate) const MAX_SUB_BLOCK: usize = 255;

/// Packs codes into length-prefixed sub-blocks appended to `out`.
pub(crate) struct BitWriter<'a> {
    out: &'a mut Vec<u8>,
    acc: u32,
    nbits: u8,
    block: [u8; MAX_SUB_BLOCK],
    block_len: usize,
}

impl<'a> BitWriter<'a> {
    pub(crate) fn new(out: &'a mut Vec<u8>) -> Self {
        Self {
            out,
            acc: 0,
            nbits: 0,
            block: [0; MAX_SUB_BLOCK],
            block_len: 0,
        }
    }

    /// Append the `width` low bits of `code`.
    pub(crate) fn write(&mut self, code: u16, width: u8) {
        debug_assert!((2..=12).contains(&width), "code width {width} out of range");
        let mask = (1u32 << width) - 1;
        self.acc |= (u32::from(code) & mask) << self.nbits;
        self.nbits += width;
        while self.nbits >= 8 {
            self.push_byte(self.acc as u8);
            self.acc >>= 8;
            self.nbits -= 8;
        }
    }

    fn push_byte(&mut self, byte: u8) {
        self.block[self.block_len] = byte;
        self.block_len += 1;
        if self.block_len == MAX_SUB_BLOCK {
            self.flush_block();
        }
    }

    fn flush_block(&mut self) {
        if self.block_len == 0 {
            return;
        }
        self.out.push(self.block_len as u8);
        self.out.extend_from_slice(&self.block[..self.block_len]);
        self.block_len = 0;
    }

    /// Flush the partial byte (zero padded) and pending block, then write the terminator.
    pub(crate) fn finish(mut self) {
        if self.nbits > 0 {
            self.push_byte(self.acc as u8);
            self.acc = 0;
            self.nbits = 0;
        }
        self.flush_block();
        self.out.push(0);
    }
}

/// Reads codes out of a sub-block chain starting at `pos` in `data`.
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    /// Next unread byte of `data`.
    pos: usize,
    /// Bytes left in the current sub-block.
    block_left: usize,
    acc: u32,
    nbits: u8,
    terminated: bool,
}

impl<'a> BitReader<'a> {
    /// `pos` must point at the length byte of the first sub-block.
    pub(crate) fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            block_left: 0,
            acc: 0,
            nbits: 0,
            terminated: false,
        }
    }

    /// Whether the zero-length terminator has been consumed.
    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Next payload byte, crossing sub-block boundaries. `None` once the chain ends.
    fn next_byte(&mut self) -> Result<Option<u8>, GifError> {
        while self.block_left == 0 {
            if self.terminated {
                return Ok(None);
            }
            let len = *self.data.get(self.pos).ok_or(GifError::TruncatedStream)?;
            self.pos += 1;
            if len == 0 {
                self.terminated = true;
                return Ok(None);
            }
            self.block_left = len as usize;
        }
        let byte = *self.data.get(self.pos).ok_or(GifError::TruncatedStream)?;
        self.pos += 1;
        self.block_left -= 1;
        Ok(Some(byte))
    }

    /// Read a `width`-bit code.
    ///
    /// Fails with `TruncatedStream` when fewer than `width` bits remain, either
    /// because the chain terminated or because the input ran out.
    pub(crate) fn read(&mut self, width: u8) -> Result<u16, GifError> {
        debug_assert!((2..=12).contains(&width), "code width {width} out of range");
        while self.nbits < width {
            match self.next_byte()? {
                Some(byte) => {
                    self.acc |= u32::from(byte) << self.nbits;
                    self.nbits += 8;
                }
                None => return Err(GifError::TruncatedStream),
            }
        }
        let code = (self.acc & ((1u32 << width) - 1)) as u16;
        self.acc >>= width;
        self.nbits -= width;
        Ok(code)
    }

    /// Consume whatever is left of the chain, including the terminator.
    ///
    /// Returns the position just past the terminator.
    pub(crate) fn skip_to_end(mut self) -> Result<usize, GifError> {
        self.pos = self
            .pos
            .checked_add(self.block_left)
            .filter(|&p| p <= self.data.len())
            .ok_or(GifError::TruncatedStream)?;
        self.block_left = 0;
        if !self.terminated {
            self.pos = skip_sub_blocks(self.data, self.pos)?;
        }
        Ok(self.pos)
    }
}

/// Skip a sub-block chain starting at `pos`, returning the position after the terminator.
pub(crate) fn skip_sub_blocks(data: &[u8], mut pos: usize) -> Result<usize, GifError> {
    loop {
        let len = *data.get(pos).ok_or(GifError::TruncatedStream)? as usize;
        pos += 1;
        if len == 0 {
            return Ok(pos);
        }
        pos += len;
        if pos > data.len() {
            return Err(GifError::TruncatedStream);
        }
    }
}

/// Concatenate the payload of a sub-block chain starting at `pos`.
///
/// Returns the payload and the position after the terminator.
pub(crate) fn read_sub_blocks(data: &[u8], mut pos: usize) -> Result<(Vec<u8>, usize), GifError> {
    let mut payload = Vec::new();
    loop {
        let len = *data.get(pos).ok_or(GifError::TruncatedStream)? as usize;
        pos += 1;
        if len == 0 {
            return Ok((payload, pos));
        }
        let block = data.get(pos..pos + len).ok_or(GifError::TruncatedStream)?;
        payload.extend_from_slice(block);
        pos += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn write_sub_blocks(out: &mut Vec<u8>, payload: &[u8]) {
        for chunk in payload.chunks(MAX_SUB_BLOCK) {
            out.push(chunk.len() as u8);
            out.extend_from_slice(chunk);
        }
        out.push(0);
    }

    #[test]
    fn reader_writer() {
        let codes: Vec<u16> = (0..1000u16).map(|i| (i * 7) % 1024).collect();
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        for &code in &codes {
            writer.write(code, 10);
        }
        writer.finish();

        let mut reader = BitReader::new(&out, 0);
        for &code in &codes {
            assert_eq!(reader.read(10).unwrap(), code);
        }
        // 1000 codes * 10 bits = 1250 bytes, no padding bits left
        assert!(matches!(reader.read(10), Err(GifError::TruncatedStream)));
        assert!(reader.is_terminated());
    }

    #[test]
    fn lsb_first_packing() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        writer.write(0b100, 3);
        writer.write(0b00001, 5);
        writer.write(0b11, 2);
        writer.finish();
        // first byte: 00001_100, second byte: padding + 11
        assert_eq!(out, vec![2, 0b0000_1100, 0b0000_0011, 0]);
    }

    #[test]
    fn sub_blocks_are_capped_at_255_bytes() {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out);
        for _ in 0..600 {
            writer.write(0xAB, 8);
        }
        writer.finish();
        assert_eq!(out[0], 255);
        assert_eq!(out[256], 255);
        assert_eq!(out[512], 90);
        assert_eq!(out[603], 0);
        assert_eq!(out.len(), 604);
    }

    #[test]
    fn reader_crosses_block_boundaries() {
        // two blocks of one byte each carry a single 12-bit code
        let data = [1u8, 0xFF, 1, 0x0A, 0];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(reader.read(12).unwrap(), 0xAFF);
        assert!(!reader.is_terminated());
        assert_eq!(reader.skip_to_end().unwrap(), data.len());
    }

    #[test]
    fn missing_terminator_is_truncation() {
        let data = [2u8, 0x12];
        let mut reader = BitReader::new(&data, 0);
        assert_eq!(reader.read(8).unwrap(), 0x12);
        assert!(matches!(reader.read(8), Err(GifError::TruncatedStream)));
        assert!(!reader.is_terminated());
    }

    #[test]
    fn skip_to_end_consumes_unread_blocks() {
        let data = [3u8, 1, 2, 3, 2, 4, 5, 0, 0x3B];
        let mut reader = BitReader::new(&data, 0);
        reader.read(8).unwrap();
        assert_eq!(reader.skip_to_end().unwrap(), 8);
    }

    #[test]
    fn sub_block_helpers() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(300).collect();
        let mut out = Vec::new();
        write_sub_blocks(&mut out, &payload);
        assert_eq!(skip_sub_blocks(&out, 0).unwrap(), out.len());
        let (read, end) = read_sub_blocks(&out, 0).unwrap();
        assert_eq!(read, payload);
        assert_eq!(end, out.len());
        assert!(matches!(
            read_sub_blocks(&out[..100], 0),
            Err(GifError::TruncatedStream)
        ));
    }
}
