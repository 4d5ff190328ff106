//! A single tie-to-even rounding primitive shared by every dimension and
//! quantization formula in the encoder and decoder.
//!
//! Every integer field here rounds half-to-even (the IEEE default), not
//! half-away-from-zero. `f32::round()` ties away from zero instead, so a
//! coefficient or dimension that lands exactly on a `.5` boundary after
//! scaling (e.g. a DC/AC value at `k + 0.5` after multiplying by
//! 63/31/15, or a basis dimension landing on `n.5` for even `n`) would pack
//! to a different field than a decoder expects. This crate has no external
//! crate providing `round_ties_even` under edition 2018, so it is written
//! by hand here instead.

/// Rounds `v` to the nearest integer, breaking an exact `.5` tie toward
/// whichever neighbor is even, matching IEEE 754 `roundTiesToEven`.
#[inline]
pub(crate) fn round_ties_even(v: f32) -> f32 {
    let floor = v.floor();
    let diff = v - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}
