//! Hex color string helpers.
//!
//! Accepted input forms are `#RGB`, `#RGBA`, `#RRGGBB` and `#RRGGBBAA`; the
//! leading `#` is optional. Output is uppercase.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::GifError;

/// Format packed RGBA pixels as one hex string each.
///
/// Alpha is written only when it is not 255, unless `always_include_alpha`.
/// With `allow_short`, colors whose digits all come in pairs use the
/// 3- or 4-digit form.
pub fn rgba_to_hex(
    rgba: &[u8],
    always_include_alpha: bool,
    allow_short: bool,
) -> Result<Vec<String>, GifError> {
    if rgba.len() % 4 != 0 {
        return Err(GifError::InvalidArgument(format!(
            "RGBA length {} is not a multiple of 4",
            rgba.len()
        )));
    }
    Ok(rgba
        .chunks_exact(4)
        .map(|px| {
            if always_include_alpha || px[3] != 255 {
                format_hex(px, allow_short)
            } else {
                format_hex(&px[..3], allow_short)
            }
        })
        .collect())
}

/// Format packed RGB pixels as one hex string each.
pub fn rgb_to_hex(rgb: &[u8], allow_short: bool) -> Result<Vec<String>, GifError> {
    if rgb.len() % 3 != 0 {
        return Err(GifError::InvalidArgument(format!(
            "RGB length {} is not a multiple of 3",
            rgb.len()
        )));
    }
    Ok(rgb
        .chunks_exact(3)
        .map(|px| format_hex(px, allow_short))
        .collect())
}

/// Parse hex colors into packed RGBA. Colors without alpha are opaque.
pub fn hex_to_rgba(hex: &[&str]) -> Result<Vec<u8>, GifError> {
    let mut out = Vec::with_capacity(hex.len() * 4);
    for color in hex {
        let channels = parse_hex(color)?;
        out.extend_from_slice(&channels[..3]);
        out.push(channels.get(3).copied().unwrap_or(255));
    }
    Ok(out)
}

/// Parse hex colors into packed RGB. Alpha digits are rejected.
pub fn hex_to_rgb(hex: &[&str]) -> Result<Vec<u8>, GifError> {
    let mut out = Vec::with_capacity(hex.len() * 3);
    for color in hex {
        let channels = parse_hex(color)?;
        if channels.len() != 3 {
            return Err(GifError::InvalidArgument(format!("invalid RGB hex color {color:?}")));
        }
        out.extend_from_slice(&channels);
    }
    Ok(out)
}

/// Expand palette indices into packed RGBA.
///
/// `palette` is packed RGB triples. The transparent index becomes
/// `[0, 0, 0, 0]`; everything else is opaque.
pub fn indexed_to_rgba(pixels: &[u8], palette: &[u8], transparent: Option<u8>) -> Result<Vec<u8>, GifError> {
    let len = palette.len() / 3;
    let mut out = Vec::with_capacity(pixels.len() * 4);
    for &index in pixels {
        if Some(index) == transparent {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let start = index as usize * 3;
        let rgb = palette
            .get(start..start + 3)
            .ok_or(GifError::PaletteIndexOutOfRange { index, len })?;
        out.extend_from_slice(rgb);
        out.push(255);
    }
    Ok(out)
}

/// Format palette indices as hex colors.
///
/// Pixels resolve as in [`indexed_to_rgba`] and format as in [`rgba_to_hex`],
/// so the transparent index prints as `#00000000`.
pub fn indexed_to_hex(
    pixels: &[u8],
    palette: &[u8],
    transparent: Option<u8>,
    always_include_alpha: bool,
    allow_short: bool,
) -> Result<Vec<String>, GifError> {
    let rgba = indexed_to_rgba(pixels, palette, transparent)?;
    rgba_to_hex(&rgba, always_include_alpha, allow_short)
}

fn format_hex(channels: &[u8], allow_short: bool) -> String {
    let mut s = String::with_capacity(1 + channels.len() * 2);
    s.push('#');
    let short = allow_short && channels.iter().all(|c| c >> 4 == c & 0x0F);
    for c in channels {
        if short {
            s.push_str(&format!("{:X}", c & 0x0F));
        } else {
            s.push_str(&format!("{c:02X}"));
        }
    }
    s
}

fn parse_hex(color: &str) -> Result<Vec<u8>, GifError> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    let invalid = || GifError::InvalidArgument(format!("invalid hex color {color:?}"));
    let nibbles = digits
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(invalid)?;
    match nibbles.len() {
        3 | 4 => Ok(nibbles.iter().map(|n| n << 4 | n).collect()),
        6 | 8 => Ok(nibbles.chunks_exact(2).map(|p| p[0] << 4 | p[1]).collect()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn rgba_formatting() {
        let hex = rgba_to_hex(&[255, 0, 0, 255, 255, 128, 0, 128], false, false).unwrap();
        assert_eq!(hex, vec!["#FF0000", "#FF800080"]);
        let hex = rgba_to_hex(&[255, 0, 0, 255], true, false).unwrap();
        assert_eq!(hex, vec!["#FF0000FF"]);
        let hex = rgba_to_hex(&[255, 0, 0, 255, 0x11, 0x22, 0x33, 0x44], false, true).unwrap();
        assert_eq!(hex, vec!["#F00", "#1234"]);
        assert!(matches!(
            rgba_to_hex(&[1, 2, 3], false, false),
            Err(GifError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rgb_formatting() {
        let hex = rgb_to_hex(&[255, 0, 0, 255, 128, 0], true).unwrap();
        assert_eq!(hex, vec!["#F00", "#FF8000"]);
        assert!(rgb_to_hex(&[1, 2], false).is_err());
    }

    #[test]
    fn parsing() {
        assert_eq!(
            hex_to_rgba(&["#FF0000FF", "800080", "#abc"]).unwrap(),
            vec![255, 0, 0, 255, 128, 0, 128, 255, 0xAA, 0xBB, 0xCC, 255]
        );
        assert_eq!(hex_to_rgb(&["#FF8000", "#0f0"]).unwrap(), vec![255, 128, 0, 0, 255, 0]);
        assert!(hex_to_rgb(&["#FF800080"]).is_err());
        assert!(hex_to_rgba(&["#12345"]).is_err());
        assert!(hex_to_rgba(&["#GG0000"]).is_err());
    }

    #[test]
    fn formatting_then_parsing_preserves_colors() {
        let rgba = [1, 2, 3, 255, 250, 251, 252, 7];
        let hex = rgba_to_hex(&rgba, false, true).unwrap();
        let strs: Vec<&str> = hex.iter().map(String::as_str).collect();
        assert_eq!(hex_to_rgba(&strs).unwrap(), rgba);
    }

    #[test]
    fn indexed_expansion() {
        let palette = [10, 20, 30, 40, 50, 60];
        assert_eq!(
            indexed_to_rgba(&[0, 1, 1], &palette, Some(1)).unwrap(),
            vec![10, 20, 30, 255, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            indexed_to_rgba(&[1], &palette, None).unwrap(),
            vec![40, 50, 60, 255]
        );
        assert!(matches!(
            indexed_to_rgba(&[2], &palette, None),
            Err(GifError::PaletteIndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn indexed_formatting() {
        let palette = [0xFF, 0x00, 0x00, 0x12, 0x34, 0x56];
        let hex = indexed_to_hex(&[0, 1, 0], &palette, Some(1), false, false).unwrap();
        assert_eq!(hex, vec!["#FF0000", "#00000000", "#FF0000"]);
        let hex = indexed_to_hex(&[0, 1], &palette, None, true, true).unwrap();
        assert_eq!(hex, vec!["#F00F", "#123456FF"]);
        assert!(matches!(
            indexed_to_hex(&[5], &palette, None, false, false),
            Err(GifError::PaletteIndexOutOfRange { index: 5, len: 2 })
        ));
    }
}
