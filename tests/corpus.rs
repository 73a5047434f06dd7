//! Test corpus: roundtrips with various patterns, sizes and palettes, plus
//! malformed-input handling.

use enough::Unstoppable;
use zengif::*;

fn checkerboard(w: usize, h: usize, colors: u8) -> Vec<u8> {
    let mut pixels = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            pixels[y * w + x] = ((x / 2 + y / 2) % colors as usize) as u8;
        }
    }
    pixels
}

fn noise_pattern(len: usize, colors: u16) -> Vec<u8> {
    let mut state: u32 = 0xDEAD_BEEF;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % u32::from(colors)) as u8
        })
        .collect()
}

fn gray_palette(colors: u16) -> Vec<u8> {
    (0..colors).flat_map(|i| [i as u8; 3]).collect()
}

fn encode_single(w: u16, h: u16, pixels: &[u8], palette: &[u8], interlaced: bool) -> Vec<u8> {
    let mut encoder = Encoder::new(w, h, Some(palette)).unwrap();
    let frame = Frame::from_indexed_pixels(w, h, pixels.to_vec(), None, None)
        .unwrap()
        .with_interlaced(interlaced);
    encoder.add_frame(frame).unwrap();
    encoder.get_buffer().unwrap()
}

fn decode_indexed(gif: &[u8]) -> Vec<Frame> {
    decode_all(gif, DecodeOptions::new(), Unstoppable)
        .unwrap()
        .frames
}

// ── Indexed roundtrips ───────────────────────────────────────────────

#[test]
fn checkerboards_every_palette_size() {
    for colors in [1u16, 2, 3, 4, 5, 8, 16, 17, 64, 128, 129, 255, 256] {
        let pixels = checkerboard(13, 7, colors.min(255) as u8);
        let palette = gray_palette(colors);
        let gif = encode_single(13, 7, &pixels, &palette, false);
        let frames = decode_indexed(&gif);
        assert_eq!(frames[0].buffer(), &pixels[..], "{colors} colors");
    }
}

#[test]
fn noise_every_palette_size() {
    for colors in [2u16, 4, 7, 16, 100, 256] {
        let pixels = noise_pattern(97 * 53, colors);
        let palette = gray_palette(colors);
        let gif = encode_single(97, 53, &pixels, &palette, false);
        let frames = decode_indexed(&gif);
        assert_eq!(frames[0].buffer(), &pixels[..], "{colors} colors");
    }
}

#[test]
fn large_noise_resets_dictionary() {
    // enough distinct strings to fill the 4096-entry table several times
    let (w, h) = (400u16, 300u16);
    let pixels = noise_pattern(usize::from(w) * usize::from(h), 256);
    let gif = encode_single(w, h, &pixels, &gray_palette(256), true);
    let frames = decode_indexed(&gif);
    assert_eq!(frames[0].buffer(), &pixels[..]);
}

#[test]
fn long_runs_compress_well() {
    let (w, h) = (256u16, 256u16);
    let pixels = vec![3u8; usize::from(w) * usize::from(h)];
    let gif = encode_single(w, h, &pixels, &gray_palette(4), false);
    assert!(gif.len() < 2000, "solid frame took {} bytes", gif.len());
    assert_eq!(decode_indexed(&gif)[0].buffer(), &pixels[..]);
}

#[test]
fn extreme_dimensions() {
    for (w, h) in [(1u16, 1u16), (1, 300), (300, 1), (2, 2)] {
        let pixels = noise_pattern(usize::from(w) * usize::from(h), 2);
        for interlaced in [false, true] {
            let gif = encode_single(w, h, &pixels, &[0, 0, 0, 255, 255, 255], interlaced);
            assert_eq!(decode_indexed(&gif)[0].buffer(), &pixels[..], "{w}x{h}");
        }
    }
}

#[test]
fn many_frames() {
    let palette = gray_palette(16);
    let mut encoder = Encoder::new(9, 9, Some(&palette)).unwrap();
    encoder.set_repeat(0);
    let sources: Vec<Vec<u8>> = (0..40)
        .map(|i| noise_pattern(81 + i, 16)[i..].to_vec())
        .collect();
    for (i, pixels) in sources.iter().enumerate() {
        let frame = Frame::from_indexed_pixels(9, 9, pixels.clone(), None, None)
            .unwrap()
            .with_delay(i as u16);
        encoder.add_frame(frame).unwrap();
    }
    let gif = encoder.get_buffer().unwrap();

    let mut decoder = DecodeOptions::new().read_info(gif).unwrap();
    let mut count = 0;
    for (i, frame) in decoder.frames().enumerate() {
        let frame = frame.unwrap();
        assert_eq!(frame.delay(), i as u16);
        assert_eq!(frame.buffer(), &sources[i][..]);
        count += 1;
    }
    assert_eq!(count, 40);
    assert_eq!(decoder.loop_count(), Some(Repeat::Infinite));
}

// ── True-color input ────────────────────────────────────────────────

fn gradient_rgba(w: usize, h: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        for x in 0..w {
            let (r, g) = (x * 255 / w, y * 255 / h);
            out.extend_from_slice(&[r as u8, g as u8, ((r + g) / 2) as u8, 255]);
        }
    }
    out
}

#[test]
fn many_colors_are_reduced() {
    let (w, h) = (64usize, 64usize);
    let rgba = gradient_rgba(w, h);
    let frame = Frame::from_rgba(w as u16, h as u16, &rgba, None).unwrap();
    let palette = frame.palette().unwrap();
    assert!(palette.len() <= 256);
    assert!(frame.buffer().iter().all(|&i| usize::from(i) < palette.len()));

    let mut encoder = Encoder::new(w as u16, h as u16, None).unwrap();
    encoder.add_frame(frame).unwrap();
    let gif = encoder.get_buffer().unwrap();
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::Rgba);
    let decoded = decode_all(&gif, options, Unstoppable).unwrap();

    // reduction stays close to the source
    let total_error: u64 = decoded.frames[0]
        .buffer()
        .iter()
        .zip(&rgba)
        .map(|(&a, &b)| u64::from(a.abs_diff(b)))
        .sum();
    let mean_error = total_error as f64 / (w * h * 3) as f64;
    assert!(mean_error < 16.0, "mean channel error {mean_error}");
}

#[test]
fn quantization_is_deterministic() {
    let rgba = gradient_rgba(50, 40);
    for speed in [1, 10, 30] {
        let a = Frame::from_rgba(50, 40, &rgba, Some(speed)).unwrap();
        let b = Frame::from_rgba(50, 40, &rgba, Some(speed)).unwrap();
        assert_eq!(a, b, "speed {speed}");
    }
    let options = QuantizeOptions::default().with_max_colors(16);
    assert_eq!(quantize(&rgba, &options).unwrap(), quantize(&rgba, &options).unwrap());
}

#[test]
fn rgb_and_hex_sources_agree() {
    let rgb = [255, 0, 0, 0, 0, 255, 0, 0, 255, 255, 0, 0];
    let from_rgb = Frame::from_rgb(2, 2, &rgb, None).unwrap();
    let hex = hex::rgb_to_hex(&rgb, false).unwrap();
    let hex: Vec<&str> = hex.iter().map(String::as_str).collect();
    let from_hex = Frame::from_hex(2, 2, &hex, None).unwrap();
    assert_eq!(from_rgb, from_hex);
    assert_eq!(from_rgb.buffer(), &[0, 1, 1, 0]);
}

// ── Malformed input ─────────────────────────────────────────────────

#[test]
fn every_truncation_is_an_error() {
    let pixels = noise_pattern(20 * 20, 8);
    let gif = encode_single(20, 20, &pixels, &gray_palette(8), false);
    for len in 0..gif.len() {
        let result = decode_all(&gif[..len], DecodeOptions::new(), Unstoppable);
        assert!(result.is_err(), "prefix of {len} bytes decoded");
    }
    assert!(decode_all(&gif, DecodeOptions::new(), Unstoppable).is_ok());
}

/// Stream skeleton with a 2-entry global table around one 2x2 image.
fn wrap_image_data(min_code_size: u8, data: &[u8]) -> Vec<u8> {
    let mut gif = Vec::new();
    gif.extend_from_slice(b"GIF89a");
    gif.extend_from_slice(&[2, 0, 2, 0, 0x80, 0, 0]);
    gif.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
    gif.extend_from_slice(&[0x2C, 0, 0, 0, 0, 2, 0, 2, 0, 0]);
    gif.push(min_code_size);
    gif.extend_from_slice(data);
    gif.push(0x3B);
    gif
}

/// Pack `(code, width)` pairs LSB-first into one sub-block with terminator.
fn pack_codes(codes: &[(u16, u8)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    let (mut acc, mut nbits) = (0u32, 0u8);
    for &(code, width) in codes {
        acc |= u32::from(code) << nbits;
        nbits += width;
        while nbits >= 8 {
            bytes.push(acc as u8);
            acc >>= 8;
            nbits -= 8;
        }
    }
    if nbits > 0 {
        bytes.push(acc as u8);
    }
    let mut out = vec![bytes.len() as u8];
    out.extend_from_slice(&bytes);
    out.push(0);
    out
}

#[test]
fn kwkwk_code_decodes() {
    // clear, 1, then 6 before it is defined ("1" + "1"), 1, end at the grown width
    let gif = wrap_image_data(2, &pack_codes(&[(4, 3), (1, 3), (6, 3), (1, 3), (5, 4)]));
    assert_eq!(decode_indexed(&gif)[0].buffer(), &[1, 1, 1, 1]);
}

#[test]
fn one_bit_code_size_widens_after_first_insert() {
    // clear and the first two roots at 2 bits, then the 3-bit "01" entry and end
    let data = pack_codes(&[(2, 2), (0, 2), (1, 2), (4, 3), (3, 3)]);
    assert_eq!(lzw::decompress(&data, 1, 4).unwrap(), vec![0, 1, 0, 1]);
    let gif = wrap_image_data(1, &data);
    assert_eq!(decode_indexed(&gif)[0].buffer(), &[0, 1, 0, 1]);
}

#[test]
fn undefined_code_is_corrupt() {
    let gif = wrap_image_data(2, &pack_codes(&[(4, 3), (1, 3), (7, 3), (5, 3)]));
    assert!(matches!(
        decode_all(&gif, DecodeOptions::new(), Unstoppable),
        Err(GifError::CorruptLzwStream(_))
    ));
}

#[test]
fn short_image_data_is_truncation() {
    let gif = wrap_image_data(2, &pack_codes(&[(4, 3), (1, 3), (0, 3), (5, 3)]));
    assert!(matches!(
        decode_all(&gif, DecodeOptions::new(), Unstoppable),
        Err(GifError::TruncatedStream)
    ));
}

#[test]
fn missing_end_code_policy() {
    // four pixels in exactly two bytes, then the chain ends without an end code
    let gif = wrap_image_data(2, &pack_codes(&[(4, 3), (1, 3), (0, 3), (1, 3), (0, 4)]));
    assert_eq!(decode_indexed(&gif)[0].buffer(), &[1, 0, 1, 0]);

    let mut strict = DecodeOptions::new();
    strict.check_lzw_end_code(true);
    assert!(matches!(
        decode_all(&gif, strict, Unstoppable),
        Err(GifError::CorruptLzwStream(_))
    ));
}

#[test]
fn invalid_min_code_size_is_corrupt() {
    let gif = wrap_image_data(12, &pack_codes(&[(4, 3), (1, 3), (5, 3)]));
    assert!(matches!(
        decode_all(&gif, DecodeOptions::new(), Unstoppable),
        Err(GifError::CorruptLzwStream(_))
    ));
}

#[test]
fn out_of_range_index_in_rgba_mode() {
    // index 3 with a 2-entry table
    let gif = wrap_image_data(2, &pack_codes(&[(4, 3), (3, 3), (3, 3), (3, 3), (3, 4), (5, 4)]));
    assert_eq!(decode_indexed(&gif)[0].buffer(), &[3, 3, 3, 3]);

    let mut consistent = DecodeOptions::new();
    consistent.check_frame_consistency(true);
    assert!(matches!(
        decode_all(&gif, consistent, Unstoppable),
        Err(GifError::PaletteIndexOutOfRange { index: 3, len: 2 })
    ));

    let mut rgba = DecodeOptions::new();
    rgba.set_color_output(ColorOutput::Rgba);
    assert!(matches!(
        decode_all(&gif, rgba, Unstoppable),
        Err(GifError::PaletteIndexOutOfRange { index: 3, len: 2 })
    ));
}

#[test]
fn canvas_limits() {
    let gif = encode_single(300, 2, &vec![0; 600], &gray_palette(2), false);
    let mut options = DecodeOptions::new();
    options.set_limits(Limits {
        max_width: Some(256),
        ..Limits::default()
    });
    assert!(matches!(
        options.read_info(&gif[..]),
        Err(GifError::LimitExceeded(_))
    ));
}
