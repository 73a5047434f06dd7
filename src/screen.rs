//! Canvas-wide stream properties.

use alloc::borrow::Cow;

use crate::decode::DecodeOptions;
use crate::error::GifError;
use crate::palette::Palette;

/// Animation looping, as carried by the NETSCAPE2.0 application extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Repeat {
    /// Loop forever (wire count 0).
    Infinite,
    /// Loop this many times (wire count n, n >= 1).
    Finite(u16),
}

impl Repeat {
    /// Map a signed loop count: negative means no looping extension, 0
    /// loops forever, anything else is a finite count clamped to 65535.
    pub fn from_count(count: i32) -> Option<Self> {
        match count {
            i32::MIN..=-1 => None,
            0 => Some(Self::Infinite),
            n => Some(Self::Finite(u16::try_from(n).unwrap_or(u16::MAX))),
        }
    }

    /// The signed form accepted by [`Repeat::from_count`].
    pub fn to_count(repeat: Option<Self>) -> i32 {
        match repeat {
            None => -1,
            Some(Self::Infinite) => 0,
            Some(Self::Finite(n)) => i32::from(n),
        }
    }

    pub(crate) fn from_wire(count: u16) -> Self {
        match count {
            0 => Self::Infinite,
            n => Self::Finite(n),
        }
    }

    pub(crate) fn wire_count(self) -> u16 {
        match self {
            Self::Infinite => 0,
            Self::Finite(n) => n,
        }
    }
}

/// Canvas size, global color table and looping of a GIF stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicalScreen {
    pub width: u16,
    pub height: u16,
    pub global_palette: Option<Palette>,
    /// Global palette index of the background color.
    pub background_index: u8,
    /// Raw aspect ratio byte. 0 means square pixels.
    pub pixel_aspect_ratio: u8,
    /// `None` when the stream has no looping extension.
    pub repeat: Option<Repeat>,
}

impl LogicalScreen {
    /// Probe a GIF stream without decoding any frame.
    ///
    /// Reads the header, the logical screen descriptor, the global color
    /// table and any extensions preceding the first image.
    pub fn from_bytes(data: &[u8]) -> Result<Self, GifError> {
        let decoder = DecodeOptions::new().read_info(Cow::Borrowed(data))?;
        Ok(decoder.screen().clone())
    }

    /// The background color, when a global palette holds the background index.
    pub fn background_color(&self) -> Option<[u8; 3]> {
        self.global_palette
            .as_ref()
            .and_then(|p| p.get(self.background_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_counts() {
        assert_eq!(Repeat::from_count(-1), None);
        assert_eq!(Repeat::from_count(-40), None);
        assert_eq!(Repeat::from_count(0), Some(Repeat::Infinite));
        assert_eq!(Repeat::from_count(3), Some(Repeat::Finite(3)));
        assert_eq!(Repeat::from_count(100_000), Some(Repeat::Finite(u16::MAX)));
        for count in [-1, 0, 1, 65535] {
            assert_eq!(Repeat::to_count(Repeat::from_count(count)), count);
        }
    }

    #[test]
    fn wire_counts() {
        assert_eq!(Repeat::from_wire(0), Repeat::Infinite);
        assert_eq!(Repeat::from_wire(9), Repeat::Finite(9));
        assert_eq!(Repeat::Finite(9).wire_count(), 9);
        assert_eq!(Repeat::Infinite.wire_count(), 0);
    }
}
