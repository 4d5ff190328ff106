//! ThumbHash - a compact (20-35 byte) placeholder hash for raster images.
//!
//! A ThumbHash is produced by downscaling an image to a small RGBA proxy
//! (longest side <= 100px), converting it to a luma/chroma/alpha color space
//! (`LPQA`), running a low-order discrete cosine transform over each channel,
//! and bit-packing the DC term plus a handful of quantized AC terms.
//! Decoding runs the inverse transform and reconstructs a tiny placeholder
//! bitmap (longest side <= 32px) suitable for painting while the real image
//! loads.
//!
//! ```text
//! encode: source image -> proxy RGBA -> LPQA coefficients -> packed bytes
//! decode: packed bytes -> fields + AC array -> RGBA proxy (+ post-process)
//! ```
//!
//! The wire format is bit-exact and documented field-by-field in [`pack`].
//! Two implementations that disagree on a single field width will silently
//! corrupt color, so treat [`pack`]'s layout as load-bearing.
//!
//! # Features
//!
//! The crate is `no_std` plus `alloc` unconditionally: every coefficient
//! array and the returned hash/bitmap are heap-allocated `Vec`s, so there is
//! no allocation-free tier to opt out of.
//!
//! - `std` (default) additionally unlocks the work-buffer [`pool`], the
//!   cached YCbCr lookup table used by the planar proxy fast paths, and
//!   `log` instrumentation around pool acquire/release and decode errors.
//!   Disabling it keeps the crate usable on targets with an allocator but
//!   no operating system, at the cost of rebuilding the YCbCr LUT and a
//!   fresh proxy/bitmap buffer on every call.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod color;
pub mod dct;
mod error;
pub mod image;
pub mod options;
pub mod pack;
#[cfg(feature = "std")]
pub mod pool;
pub mod proxy;
mod round;
mod ycbcr;

mod decode;
mod encode;

pub use crate::decode::{approximate_aspect_ratio, average_rgba, decode};
pub use crate::encode::encode;
pub use crate::error::{DecodeError, EncodeError};
pub use crate::image::{PixelSource, Subsampling};
pub use crate::options::DecodeOptions;

/// Longest side, in pixels, of the proxy image built by the encoder.
pub const MAX_PROXY_SIDE: usize = 100;

/// Longest side, in pixels, of the bitmap produced by the decoder.
pub const MAX_DECODED_SIDE: usize = 32;
