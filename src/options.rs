//! Decode-time configuration: a plain struct passed by value rather than a
//! builder, since it has only two independent knobs and no invalid
//! combination to reject at construction.

/// Tuning knobs for [`crate::decode`].
///
/// `Default::default()` reproduces the reference decode exactly: full
/// chroma strength and no bias-correction target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeOptions {
    /// Strength of a BT.709 luma-preserving attenuation applied to the
    /// decoded RGB after reconstruction: each channel is pulled toward its
    /// own luma by this factor. `1.0` (the default) is a no-op; `0.0`
    /// produces a grayscale placeholder. Ignored when `target_mean` is
    /// `Some`: the two knobs are mutually exclusive, and the
    /// bias-correction pass picks its own attenuation strength instead.
    pub chroma: f32,

    /// When set, the decoded bitmap's mean color is nudged toward this
    /// target (e.g. the page background) instead of left as reconstructed.
    /// `None` disables bias correction.
    pub target_mean: Option<[f32; 3]>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            chroma: 1.0,
            target_mean: None,
        }
    }
}
