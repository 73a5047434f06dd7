//! True-color to indexed conversion.
//!
//! Images with few enough distinct colors get an exact palette in
//! first-seen order. Anything else is reduced by median cut: the color box
//! with the widest channel range is split at its count-weighted median until
//! the palette is full, and each box contributes its weighted mean color.
//! Pixels then map to the nearest palette entry (squared Euclidean RGB
//! distance, lowest index on ties), so identical input always produces
//! identical output.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::vec::Vec;

use crate::error::GifError;
use crate::palette::{MAX_COLORS, Palette};
use crate::pixel::PixelLayout;

/// Default pixel sampling step.
pub const DEFAULT_SPEED: u8 = 10;

/// Settings for [`quantize`].
#[derive(Clone, Debug)]
pub struct QuantizeOptions {
    /// Palette size ceiling, 2..=256. Includes the transparent slot when one is needed.
    pub max_colors: usize,
    /// Pixels with alpha below this value become transparent. `None` ignores alpha.
    pub transparency_threshold: Option<u8>,
    /// 1..=30. Only every `speed`-th pixel feeds the reduction, unless that
    /// sample holds fewer colors than the palette has slots; every pixel is
    /// still mapped. Has no effect when an exact palette fits.
    pub speed: u8,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            max_colors: MAX_COLORS,
            transparency_threshold: Some(128),
            speed: DEFAULT_SPEED,
        }
    }
}

impl QuantizeOptions {
    pub fn with_max_colors(mut self, max_colors: usize) -> Self {
        self.max_colors = max_colors;
        self
    }

    pub fn with_transparency_threshold(mut self, threshold: Option<u8>) -> Self {
        self.transparency_threshold = threshold;
        self
    }

    pub fn with_speed(mut self, speed: u8) -> Self {
        self.speed = speed;
        self
    }

    fn validate(&self) -> Result<(), GifError> {
        if !(2..=MAX_COLORS).contains(&self.max_colors) {
            return Err(GifError::InvalidArgument(format!(
                "max_colors {} outside 2..={MAX_COLORS}",
                self.max_colors
            )));
        }
        validate_speed(self.speed)
    }
}

pub(crate) fn validate_speed(speed: u8) -> Result<(), GifError> {
    if (1..=30).contains(&speed) {
        Ok(())
    } else {
        Err(GifError::InvalidArgument(format!(
            "speed {speed} outside 1..=30"
        )))
    }
}

/// Result of [`quantize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quantized {
    pub palette: Palette,
    /// One palette index per input pixel.
    pub indices: Vec<u8>,
    /// Palette slot reserved for transparent pixels, if any pixel was transparent.
    pub transparent: Option<u8>,
}

/// Quantize packed RGBA pixels.
pub fn quantize(rgba: &[u8], options: &QuantizeOptions) -> Result<Quantized, GifError> {
    quantize_pixels(rgba, PixelLayout::Rgba8, options)
}

/// Quantize packed RGB or RGBA pixels.
pub(crate) fn quantize_pixels(
    pixels: &[u8],
    layout: PixelLayout,
    options: &QuantizeOptions,
) -> Result<Quantized, GifError> {
    options.validate()?;
    let bpp = layout.bytes_per_pixel();
    if layout == PixelLayout::Indexed8 {
        return Err(GifError::UnsupportedLayout(layout));
    }
    if pixels.len() % bpp != 0 {
        return Err(GifError::BufferSizeMismatch {
            expected: pixels.len() - pixels.len() % bpp,
            actual: pixels.len(),
        });
    }

    let threshold = if bpp == 4 {
        options.transparency_threshold
    } else {
        None
    };
    let is_transparent = |px: &[u8]| threshold.is_some_and(|t| px[3] < t);

    // Histogram keyed by packed RGB, plus first-seen order.
    let mut histogram: BTreeMap<u32, u32> = BTreeMap::new();
    let mut order: Vec<u32> = Vec::new();
    let mut has_transparent = false;
    for px in pixels.chunks_exact(bpp) {
        if is_transparent(px) {
            has_transparent = true;
            continue;
        }
        let key = pack(px);
        let count = histogram.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    let slots = options.max_colors - usize::from(has_transparent);
    let mut colors: Vec<[u8; 3]> = if order.len() <= slots {
        order.iter().map(|&key| unpack(key)).collect()
    } else {
        log::debug!(
            "reducing {} distinct colors to {} by median cut",
            order.len(),
            slots
        );
        // Every `speed`-th pixel feeds the reduction. A sample too sparse to
        // fill the palette falls back to the full histogram.
        let mut sampled: BTreeMap<u32, u32> = BTreeMap::new();
        for px in pixels.chunks_exact(bpp).step_by(usize::from(options.speed)) {
            if !is_transparent(px) {
                *sampled.entry(pack(px)).or_insert(0) += 1;
            }
        }
        let source = if sampled.len() >= slots {
            &sampled
        } else {
            &histogram
        };
        let entries: Vec<HistEntry> = source
            .iter()
            .map(|(&key, &count)| HistEntry {
                rgb: unpack(key),
                key,
                count,
            })
            .collect();
        median_cut(entries, slots)
    };
    let exact = order.len() <= slots;

    let transparent = if has_transparent {
        colors.push([0, 0, 0]);
        Some((colors.len() - 1) as u8)
    } else {
        None
    };
    let opaque_len = colors.len() - usize::from(has_transparent);
    let palette = Palette::from_colors(colors)?;

    // Map each distinct color once.
    let mut mapping: BTreeMap<u32, u8> = BTreeMap::new();
    if exact {
        for (i, &key) in order.iter().enumerate() {
            mapping.insert(key, i as u8);
        }
    } else {
        let opaque = Palette::from_colors(palette.colors()[..opaque_len].to_vec())?;
        for &key in &order {
            mapping.insert(key, opaque.nearest(unpack(key)));
        }
    }

    let indices = pixels
        .chunks_exact(bpp)
        .map(|px| match transparent {
            Some(t) if is_transparent(px) => t,
            _ => mapping.get(&pack(px)).copied().unwrap_or(0),
        })
        .collect();

    Ok(Quantized {
        palette,
        indices,
        transparent,
    })
}

/// A palette learned once from sample pixels, for mapping pixels one at a time.
///
/// Alpha takes no part: every palette entry is opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quantizer {
    palette: Palette,
}

impl Quantizer {
    /// Learn a palette of at most `colors` entries from packed RGBA `pixels`,
    /// sampling every `sample`-th pixel (1..=30).
    pub fn new(sample: u8, colors: usize, pixels: &[u8]) -> Result<Self, GifError> {
        let options = QuantizeOptions {
            max_colors: colors,
            transparency_threshold: None,
            speed: sample,
        };
        let quantized = quantize(pixels, &options)?;
        Ok(Self {
            palette: quantized.palette,
        })
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Index of the entry closest to an RGBA pixel.
    pub fn index_of(&self, pixel: [u8; 4]) -> u8 {
        self.palette.nearest([pixel[0], pixel[1], pixel[2]])
    }

    /// RGBA color of entry `index`.
    pub fn lookup(&self, index: u8) -> Option<[u8; 4]> {
        self.palette.get(index).map(|[r, g, b]| [r, g, b, 255])
    }

    /// Replace the color channels of `pixel` with its closest entry. Alpha is kept.
    pub fn map_pixel(&self, pixel: &mut [u8; 4]) {
        if let Some(rgb) = self.palette.get(self.index_of(*pixel)) {
            pixel[..3].copy_from_slice(&rgb);
        }
    }

    pub fn color_map_rgb(&self) -> Vec<u8> {
        self.palette.to_rgb_bytes()
    }

    pub fn color_map_rgba(&self) -> Vec<u8> {
        self.palette
            .colors()
            .iter()
            .flat_map(|&[r, g, b]| [r, g, b, 255])
            .collect()
    }
}

fn pack(px: &[u8]) -> u32 {
    (u32::from(px[0]) << 16) | (u32::from(px[1]) << 8) | u32::from(px[2])
}

fn unpack(key: u32) -> [u8; 3] {
    [(key >> 16) as u8, (key >> 8) as u8, key as u8]
}

#[derive(Clone, Copy, Debug)]
struct HistEntry {
    rgb: [u8; 3],
    key: u32,
    count: u32,
}

struct ColorBox {
    entries: Vec<HistEntry>,
}

impl ColorBox {
    /// Widest channel and its range.
    fn widest_channel(&self) -> (usize, u8) {
        let mut best = (0usize, 0u8);
        for channel in 0..3 {
            let (lo, hi) = self
                .entries
                .iter()
                .fold((u8::MAX, u8::MIN), |(lo, hi), e| {
                    (lo.min(e.rgb[channel]), hi.max(e.rgb[channel]))
                });
            let range = hi.saturating_sub(lo);
            if range > best.1 {
                best = (channel, range);
            }
        }
        best
    }

    /// Split at the count-weighted median along `channel`.
    fn split(mut self, channel: usize) -> (ColorBox, ColorBox) {
        self.entries
            .sort_by_key(|e| (e.rgb[channel], e.key));
        let total: u64 = self.entries.iter().map(|e| u64::from(e.count)).sum();
        let mut running = 0u64;
        let mut at = self.entries.len() - 1;
        for (i, e) in self.entries.iter().enumerate() {
            running += u64::from(e.count);
            if running * 2 >= total {
                at = i + 1;
                break;
            }
        }
        let at = at.clamp(1, self.entries.len() - 1);
        let upper = self.entries.split_off(at);
        (self, ColorBox { entries: upper })
    }

    fn mean(&self) -> [u8; 3] {
        let total: u64 = self.entries.iter().map(|e| u64::from(e.count)).sum();
        let mut out = [0u8; 3];
        for (channel, slot) in out.iter_mut().enumerate() {
            let sum: u64 = self
                .entries
                .iter()
                .map(|e| u64::from(e.rgb[channel]) * u64::from(e.count))
                .sum();
            *slot = ((sum + total / 2) / total) as u8;
        }
        out
    }
}

fn median_cut(entries: Vec<HistEntry>, slots: usize) -> Vec<[u8; 3]> {
    let mut boxes = alloc::vec![ColorBox { entries }];
    while boxes.len() < slots {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.entries.len() > 1)
            .map(|(i, b)| (i, b.widest_channel()))
            .fold(None, |best: Option<(usize, (usize, u8))>, cur| match best {
                Some(b) if b.1.1 >= cur.1.1 => Some(b),
                _ => Some(cur),
            });
        let Some((index, (channel, _))) = candidate else {
            break;
        };
        let (lower, upper) = boxes.remove(index).split(channel);
        boxes.insert(index, upper);
        boxes.insert(index, lower);
    }
    boxes.iter().map(ColorBox::mean).collect()
}
