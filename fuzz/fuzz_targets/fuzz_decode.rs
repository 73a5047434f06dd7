#![no_main]
use libfuzzer_sys::fuzz_target;
use zengif::*;

fuzz_target!(|data: &[u8]| {
    // Both output modes, lenient and strict, must never panic
    for output in [ColorOutput::IndexedPixels, ColorOutput::Rgba] {
        let mut options = DecodeOptions::new();
        options.set_color_output(output);
        let _ = options.set_memory_limit(1 << 24);
        options.allow_unknown_blocks(output == ColorOutput::Rgba);
        options.check_lzw_end_code(output == ColorOutput::IndexedPixels);
        let _ = decode_all(data, options, enough::Unstoppable);
    }

    // Metadata-only walk
    if let Ok(mut decoder) = DecodeOptions::new().read_info(data) {
        while let Ok(Some(_)) = decoder.next_frame_info() {}
    }
});
