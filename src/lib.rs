//! # zengif
//!
//! GIF89a animation encoder and decoder.
//!
//! ## Encoding
//!
//! An [`Encoder`] takes a canvas size and an optional global palette, then
//! buffers [`Frame`]s. Frames come from palette indices or from true-color
//! pixels, which are quantized to a local palette on construction.
//! [`Encoder::get_buffer`] serializes everything added so far.
//!
//! ## Decoding
//!
//! [`DecodeOptions::read_info`] opens a [`Decoder`] session that yields one
//! frame per [`Decoder::read_next_frame`] call, either as palette indices or
//! expanded to RGBA, within an optional per-frame memory budget.
//! Disposal methods are reported, never applied: there is no compositing.
//!
//! ## Non-Goals
//!
//! - Resizing, filtering or color management
//! - Animation playback
//! - Repairing damaged streams
//!
//! ## Usage
//!
//! ```
//! use zengif::{ColorOutput, DecodeOptions, Encoder, Frame, Unstoppable};
//!
//! let mut encoder = Encoder::new(2, 2, None)?;
//! encoder.set_repeat(0);
//! let rgba = [
//!     255, 0, 0, 255, 0, 0, 255, 255, //
//!     0, 0, 255, 255, 255, 0, 0, 255,
//! ];
//! encoder.add_frame(Frame::from_rgba(2, 2, &rgba, None)?.with_delay(50))?;
//! let gif = encoder.get_buffer()?;
//!
//! let mut options = DecodeOptions::new();
//! options.set_color_output(ColorOutput::Rgba);
//! options.set_memory_limit(1 << 20)?;
//! let mut decoder = options.read_info(&gif[..])?;
//! while let Some(frame) = decoder.read_next_frame(Unstoppable)? {
//!     assert_eq!(frame.buffer(), &rgba[..]);
//! }
//! # Ok::<(), zengif::GifError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod bits;
mod block;
mod decode;
mod encode;
mod error;
mod frame;
pub mod hex;
mod interlace;
mod limits;
pub mod lzw;
mod palette;
mod pixel;
pub mod quantize;
mod screen;

// Re-exports
pub use decode::{DecodeOptions, Decoder, Frames, GifImage, decode_all};
pub use encode::Encoder;
pub use enough::{Stop, Unstoppable};
pub use error::GifError;
pub use frame::{DisposalMethod, Frame, FrameInfo, FrameSource};
pub use limits::{Limits, MemoryLimit};
pub use palette::{MAX_COLORS, Palette, validate_indices};
pub use pixel::{ColorOutput, PixelLayout};
pub use quantize::{QuantizeOptions, Quantized, Quantizer, quantize};
pub use screen::{LogicalScreen, Repeat};
