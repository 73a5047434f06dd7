#![no_main]
use libfuzzer_sys::fuzz_target;
use zengif::*;

fuzz_target!(|data: &[u8]| {
    // If we can decode it, re-encoding and decoding again must produce identical frames
    let mut options = DecodeOptions::new();
    let _ = options.set_memory_limit(1 << 24);
    let Ok(image) = decode_all(data, options.clone(), enough::Unstoppable) else {
        return;
    };
    let screen = &image.screen;
    let global = screen.global_palette.as_ref().map(Palette::to_rgb_bytes);
    let Ok(mut encoder) = Encoder::new(screen.width, screen.height, global.as_deref()) else {
        return;
    };
    encoder.set_repeat(Repeat::to_count(screen.repeat));
    for frame in &image.frames {
        // streams that index past their palette are decodable but not encodable
        if encoder.add_frame(frame.clone()).is_err() {
            return;
        }
    }

    let reencoded = encoder.get_buffer().expect("encoding validated frames failed");
    let Ok(image2) = decode_all(&reencoded, options, enough::Unstoppable) else {
        panic!("re-encoded data failed to decode");
    };

    assert_eq!(image.frames, image2.frames, "roundtrip frame mismatch");
    assert_eq!(image.screen.repeat, image2.screen.repeat);
});
