//! GIF-variant Lempel–Ziv–Welch compression.
//!
//! Both directions keep their dictionary in fixed 4096-entry arrays indexed
//! by code and grow the code width at the same points, so the encoder and
//! decoder stay in lock step:
//!
//! - the decoder widens when, after inserting, `next_code == 1 << width`;
//! - the encoder inserts one entry earlier than the decoder, so it widens
//!   when `next_code > 1 << width`.
//!
//! Widths cap at 12 bits. The encoder emits `Clear` whenever its dictionary
//! fills up; the decoder simply stops inserting when full.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::bits::{BitReader, BitWriter};
use crate::error::GifError;

const MAX_CODE_SIZE: u8 = 12;
const MAX_ENTRIES: usize = 1 << MAX_CODE_SIZE;

/// Sentinel for "no code". Code 0 is always a root, never a child or prefix link.
const NO_CODE: u16 = 0;

/// Symbols per stop check.
const STOP_INTERVAL: usize = 1 << 16;

/// Check a minimum code size read from a stream or supplied by a caller.
pub(crate) fn validate_min_code_size(min_code_size: u8) -> Result<(), GifError> {
    if (1..=8).contains(&min_code_size) {
        Ok(())
    } else {
        Err(GifError::CorruptLzwStream(format!(
            "invalid minimum code size {min_code_size}"
        )))
    }
}

// ── Encoding ────────────────────────────────────────────────────────

/// Encoder dictionary: a trie stored as first-child / next-sibling links.
struct EncodeTable {
    first_child: Vec<u16>,
    next_sibling: Vec<u16>,
    symbol: Vec<u8>,
    clear_code: u16,
    next_code: u16,
}

impl EncodeTable {
    fn new(min_code_size: u8) -> Self {
        let mut table = Self {
            first_child: vec![NO_CODE; MAX_ENTRIES],
            next_sibling: vec![NO_CODE; MAX_ENTRIES],
            symbol: vec![0; MAX_ENTRIES],
            clear_code: 1 << min_code_size,
            next_code: 0,
        };
        table.reset();
        table
    }

    fn reset(&mut self) {
        let roots = self.clear_code as usize;
        self.first_child[..roots].fill(NO_CODE);
        self.next_code = self.clear_code + 2;
    }

    fn find(&self, prefix: u16, symbol: u8) -> Option<u16> {
        let mut child = self.first_child[prefix as usize];
        while child != NO_CODE {
            if self.symbol[child as usize] == symbol {
                return Some(child);
            }
            child = self.next_sibling[child as usize];
        }
        None
    }

    fn insert(&mut self, prefix: u16, symbol: u8) {
        let code = self.next_code as usize;
        self.symbol[code] = symbol;
        self.first_child[code] = NO_CODE;
        self.next_sibling[code] = self.first_child[prefix as usize];
        self.first_child[prefix as usize] = self.next_code;
        self.next_code += 1;
    }

    fn is_full(&self) -> bool {
        self.next_code as usize >= MAX_ENTRIES
    }
}

/// Compress `indices` into `writer`. Every index must be below `1 << min_code_size`.
pub(crate) fn encode_indices(
    indices: &[u8],
    min_code_size: u8,
    writer: &mut BitWriter<'_>,
    stop: &dyn Stop,
) -> Result<(), GifError> {
    let mut table = EncodeTable::new(min_code_size);
    let clear_code = table.clear_code;
    let end_code = clear_code + 1;
    let reset_width = min_code_size + 1;
    let mut width = reset_width;

    writer.write(clear_code, width);

    let mut current: Option<u16> = None;
    for (i, &symbol) in indices.iter().enumerate() {
        if i % STOP_INTERVAL == 0 {
            stop.check()?;
        }
        if u16::from(symbol) >= clear_code {
            return Err(GifError::InvalidArgument(format!(
                "index {symbol} does not fit minimum code size {min_code_size}"
            )));
        }
        let Some(prefix) = current else {
            current = Some(u16::from(symbol));
            continue;
        };
        if let Some(code) = table.find(prefix, symbol) {
            current = Some(code);
            continue;
        }
        writer.write(prefix, width);
        table.insert(prefix, symbol);
        if u32::from(table.next_code) > (1u32 << width) && width < MAX_CODE_SIZE {
            width += 1;
        }
        if table.is_full() {
            writer.write(clear_code, width);
            table.reset();
            width = reset_width;
        }
        current = Some(u16::from(symbol));
    }

    if let Some(prefix) = current {
        writer.write(prefix, width);
        // The decoder inserts after reading this code and may widen before End.
        if u32::from(table.next_code) >= (1u32 << width) && width < MAX_CODE_SIZE {
            width += 1;
        }
    }
    writer.write(end_code, width);
    Ok(())
}

/// Compress `indices` into a sub-block chain (without the leading code size byte).
pub fn compress(indices: &[u8], min_code_size: u8) -> Result<Vec<u8>, GifError> {
    if !(2..=8).contains(&min_code_size) {
        return Err(GifError::InvalidArgument(format!(
            "minimum code size {min_code_size} outside 2..=8"
        )));
    }
    let mut out = Vec::with_capacity(indices.len() / 2 + 16);
    let mut writer = BitWriter::new(&mut out);
    encode_indices(indices, min_code_size, &mut writer, &enough::Unstoppable)?;
    writer.finish();
    Ok(out)
}

// ── Decoding ────────────────────────────────────────────────────────

/// Decoder dictionary: each code stores its prefix code, last symbol,
/// first symbol and string length.
struct DecodeTable {
    prefix: Vec<u16>,
    suffix: Vec<u8>,
    first: Vec<u8>,
    len: Vec<u16>,
    next_code: u16,
}

impl DecodeTable {
    fn new(min_code_size: u8) -> Self {
        let mut table = Self {
            prefix: vec![NO_CODE; MAX_ENTRIES],
            suffix: vec![0; MAX_ENTRIES],
            first: vec![0; MAX_ENTRIES],
            len: vec![0; MAX_ENTRIES],
            next_code: 0,
        };
        let clear_code = 1u16 << min_code_size;
        for root in 0..clear_code {
            let i = root as usize;
            table.suffix[i] = root as u8;
            table.first[i] = root as u8;
            table.len[i] = 1;
        }
        table.next_code = clear_code + 2;
        table
    }

    fn insert(&mut self, prefix: u16, symbol: u8) {
        let code = self.next_code as usize;
        self.prefix[code] = prefix;
        self.suffix[code] = symbol;
        self.first[code] = self.first[prefix as usize];
        self.len[code] = self.len[prefix as usize] + 1;
        self.next_code += 1;
    }

    /// Write the string for `code` at `pos`, clipping anything past the end of `out`.
    fn emit(&self, code: u16, out: &mut [u8], pos: usize) -> usize {
        let len = self.len[code as usize] as usize;
        if pos < out.len() {
            let mut c = code;
            for i in (0..len).rev() {
                if let Some(slot) = out.get_mut(pos + i) {
                    *slot = self.suffix[c as usize];
                }
                c = self.prefix[c as usize];
            }
        }
        len
    }
}

/// Decompress codes from `reader` into `out`, which must be sized to the frame.
///
/// Stops at the end code, or when the sub-block chain terminates unless
/// `require_end_code` is set. Fails with `TruncatedStream` when fewer than
/// `out.len()` indices were produced.
pub(crate) fn decode_indices(
    reader: &mut BitReader<'_>,
    min_code_size: u8,
    out: &mut [u8],
    require_end_code: bool,
    stop: &dyn Stop,
) -> Result<(), GifError> {
    validate_min_code_size(min_code_size)?;
    let clear_code = 1u16 << min_code_size;
    let end_code = clear_code + 1;
    let reset_width = min_code_size + 1;
    let mut width = reset_width;
    let mut table = DecodeTable::new(min_code_size);
    let mut prev: Option<u16> = None;
    let mut pos = 0usize;
    let mut codes = 0usize;

    loop {
        if codes % 4096 == 0 {
            stop.check()?;
        }
        codes += 1;

        let code = match reader.read(width) {
            Ok(code) => code,
            Err(GifError::TruncatedStream) if reader.is_terminated() => {
                if require_end_code {
                    return Err(GifError::CorruptLzwStream(
                        "image data ended without an end code".into(),
                    ));
                }
                log::debug!("LZW data ended without an end code");
                break;
            }
            Err(e) => return Err(e),
        };

        if code == clear_code {
            table.next_code = clear_code + 2;
            width = reset_width;
            prev = None;
            continue;
        }
        if code == end_code {
            break;
        }

        match prev {
            None => {
                if code >= clear_code {
                    return Err(GifError::CorruptLzwStream(format!(
                        "first code {code} after clear is not a root code"
                    )));
                }
            }
            Some(p) => {
                let symbol = if code < table.next_code {
                    table.first[code as usize]
                } else if code == table.next_code {
                    table.first[p as usize]
                } else {
                    return Err(GifError::CorruptLzwStream(format!(
                        "code {code} exceeds dictionary size {}",
                        table.next_code
                    )));
                };
                if (table.next_code as usize) < MAX_ENTRIES {
                    table.insert(p, symbol);
                    if u32::from(table.next_code) >= (1u32 << width) && width < MAX_CODE_SIZE {
                        width += 1;
                    }
                }
            }
        }

        pos += table.emit(code, out, pos);
        prev = Some(code);
    }

    if pos < out.len() {
        return Err(GifError::TruncatedStream);
    }
    if pos > out.len() {
        log::debug!("discarding {} indices past the end of the frame", pos - out.len());
    }
    Ok(())
}

/// Decompress a sub-block chain into exactly `expected_len` indices.
pub fn decompress(data: &[u8], min_code_size: u8, expected_len: usize) -> Result<Vec<u8>, GifError> {
    let mut out = vec![0u8; expected_len];
    let mut reader = BitReader::new(data, 0);
    decode_indices(
        &mut reader,
        min_code_size,
        &mut out,
        false,
        &enough::Unstoppable,
    )?;
    Ok(out)
}
