//! LPQA color space conversion and the average-color statistic.
//!
//! `LPQA` trades RGB for a luma channel (`L`), two chroma channels (`P`,
//! `Q`) that roughly track orange-blue and red-cyan, and a copy of alpha.
//! Luma carries the most visually important detail, so it alone gets a
//! wide DCT basis; chroma is compressed far harder.

/// Mean of each of the four channels over the proxy, in reading order
/// (row-major, four floats per pixel). Used to decide [`has_alpha`] and, at
/// decode time, as the bias-correction target.
pub fn average_color(rgba: &[f32]) -> [f32; 4] {
    debug_assert!(!rgba.is_empty() && rgba.len() % 4 == 0);
    let mut sum = [0f32; 4];
    let mut count = 0f32;
    for px in rgba.chunks_exact(4) {
        sum[0] += px[0];
        sum[1] += px[1];
        sum[2] += px[2];
        sum[3] += px[3];
        count += 1.0;
    }
    [sum[0] / count, sum[1] / count, sum[2] / count, sum[3] / count]
}

/// An image whose average alpha is below full opacity gets the alpha
/// channel's own DCT basis; otherwise alpha is dropped entirely and assumed
/// `1.0` everywhere at decode time.
pub fn has_alpha(avg_a: f32) -> bool {
    avg_a < 1.0
}

/// Converts `rgba` to `lpqa` in place: premultiplies RGB by alpha, then
/// rotates the premultiplied channels into `L`/`P`/`Q`. Alpha itself is
/// left untouched in the fourth slot: it is encoded as its own channel,
/// not derived from the others.
pub fn to_lpqa(rgba: &mut [f32]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        let r = px[0] * a;
        let g = px[1] * a;
        let b = px[2] * a;
        px[0] = (r + g + b) / 3.0;
        px[1] = (r + g) / 2.0 - b;
        px[2] = r - g;
    }
}

/// Inverse of [`to_lpqa`] for a single pixel's reconstructed coefficients,
/// used by the decoder to turn `(l, p, q, a)` back into straight (not
/// premultiplied) RGB.
#[inline]
pub fn lpqa_to_rgb(l: f32, p: f32, q: f32, a: f32) -> [f32; 3] {
    let [r, g, b] = lpqa_dc_to_premultiplied_rgb(l, p, q);
    let inv_a = if a > 0.0 { 1.0 / a } else { 0.0 };
    [
        (r * inv_a).clamp(0.0, 1.0),
        (g * inv_a).clamp(0.0, 1.0),
        (b * inv_a).clamp(0.0, 1.0),
    ]
}

/// The bare `L`/`P`/`Q` -> premultiplied-RGB rotation, without the
/// un-premultiply division [`lpqa_to_rgb`] applies. [`average_rgba`]'s
/// header-only reconstruction reports this premultiplied triple directly
/// rather than dividing by the header's single alpha sample.
///
/// [`average_rgba`]: crate::average_rgba
#[inline]
pub fn lpqa_dc_to_premultiplied_rgb(l: f32, p: f32, q: f32) -> [f32; 3] {
    let b = l - (2.0 / 3.0) * p;
    let r = (3.0 * l - b + q) / 2.0;
    let g = r - q;
    [r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_uniform_image_is_itself() {
        let rgba = [0.2f32, 0.4, 0.6, 1.0, 0.2, 0.4, 0.6, 1.0];
        assert_eq!(average_color(&rgba), [0.2, 0.4, 0.6, 1.0]);
    }

    #[test]
    fn opaque_image_has_no_alpha_channel() {
        assert!(!has_alpha(1.0));
        assert!(has_alpha(0.999));
        assert!(has_alpha(0.0));
    }

    #[test]
    fn lpqa_roundtrips_through_premultiply() {
        let mut px = [0.5f32, 0.25, 0.75, 0.8];
        let original_rgb = [px[0], px[1], px[2]];
        to_lpqa(&mut px);
        let back = lpqa_to_rgb(px[0], px[1], px[2], 0.8);
        for i in 0..3 {
            assert!((back[i] - original_rgb[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn gray_has_zero_chroma() {
        let mut px = [0.5f32, 0.5, 0.5, 1.0];
        to_lpqa(&mut px);
        assert!((px[1]).abs() < 1e-6);
        assert!((px[2]).abs() < 1e-6);
    }
}
