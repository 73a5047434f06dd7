#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    let header = |version: &[u8], w: u8, h: u8, flags: u8| {
        let mut out = b"GIF".to_vec();
        out.extend_from_slice(version);
        out.extend_from_slice(&[w, 0, h, 0, flags, 0, 0]);
        out
    };

    // 1x1, 2-color global table, one pixel of index 1 (clear, 1, end at 3 bits)
    let mut one = header(b"89a", 1, 1, 0x80);
    one.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
    one.extend_from_slice(&[0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0]);
    one.extend_from_slice(&[2, 2, 0x4C, 0x01, 0, 0x3B]);
    fs::write(format!("{dir}/one_pixel.gif"), &one).unwrap();

    // Same image as GIF87a
    let mut old = one.clone();
    old[3..6].copy_from_slice(b"87a");
    fs::write(format!("{dir}/one_pixel_87a.gif"), old).unwrap();

    // Looping animation with a graphic control extension and a comment
    let mut anim = header(b"89a", 1, 1, 0x80);
    anim.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
    anim.extend_from_slice(&[0x21, 0xFF, 11]);
    anim.extend_from_slice(b"NETSCAPE2.0");
    anim.extend_from_slice(&[3, 1, 0, 0, 0]);
    anim.extend_from_slice(&[0x21, 0xFE, 3, b'z', b'e', b'n', 0]);
    for delay in [10u8, 20] {
        anim.extend_from_slice(&[0x21, 0xF9, 4, 0b0000_1001, delay, 0, 0, 0]);
        anim.extend_from_slice(&[0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0]);
        anim.extend_from_slice(&[2, 2, 0x4C, 0x01, 0]);
    }
    anim.push(0x3B);
    fs::write(format!("{dir}/anim_loop.gif"), anim).unwrap();

    // Interlaced frame with a local table and no global table
    let mut local = header(b"89a", 1, 1, 0x00);
    local.extend_from_slice(&[0x2C, 0, 0, 0, 0, 1, 0, 1, 0, 0b1100_0000]);
    local.extend_from_slice(&[255, 0, 0, 0, 255, 0]);
    local.extend_from_slice(&[2, 2, 0x4C, 0x01, 0, 0x3B]);
    fs::write(format!("{dir}/local_interlaced.gif"), local).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/just_signature.bin"), b"GIF89a").unwrap();
    fs::write(format!("{dir}/no_trailer.gif"), &one[..one.len() - 1]).unwrap();
    let mut unknown = one.clone();
    unknown.insert(one.len() - 1, 0x99);
    fs::write(format!("{dir}/unknown_block.gif"), unknown).unwrap();

    println!("Generated seed corpus in {dir}/");
}
