//! Builds the small RGBA proxy (longest side <= [`crate::MAX_PROXY_SIDE`])
//! the encoder runs its DCT over, from any [`PixelSource`] layout.
//!
//! All paths write through the same per-destination-pixel area-averaging
//! loop; direct extraction for sources already small enough to hash 1:1 is
//! the case where every destination span collapses to exactly one source
//! sample, which the span formula produces without a separate code path.
//! Determinism follows from the fixed destination-order scan: every
//! reduction is a sum over a fixed span computed in a fixed order, so no
//! floating-point or integer accumulation order varies with thread count or
//! iteration direction.

use crate::image::{PixelSource, Subsampling};
use crate::round::round_ties_even;
use crate::ycbcr::lut;

/// Computes `(dstW, dstH)` for a source of size `w x h`: the longer side
/// clamped to [`crate::MAX_PROXY_SIDE`], the shorter side scaled
/// proportionally and never less than 1.
pub fn proxy_dims(w: usize, h: usize) -> (usize, usize) {
    debug_assert!(w > 0 && h > 0);
    let max_side = crate::MAX_PROXY_SIDE;
    if w <= max_side && h <= max_side {
        return (w, h);
    }
    if w >= h {
        let dst_h = round_ties_even((h * max_side) as f32 / w as f32).max(1.0) as usize;
        (max_side, dst_h)
    } else {
        let dst_w = round_ties_even((w * max_side) as f32 / h as f32).max(1.0) as usize;
        (dst_w, max_side)
    }
}

/// Maps destination index `idx` of `dst_len` cells onto a half-open span of
/// `src_len` source indices: integer-divided endpoints, widened to at least
/// one element, clamped to the source extent.
#[inline]
fn span(idx: usize, dst_len: usize, src_len: usize) -> (usize, usize) {
    let mut s0 = idx * src_len / dst_len;
    let mut s1 = (idx + 1) * src_len / dst_len;
    if s1 <= s0 {
        s1 = s0 + 1;
    }
    if s1 > src_len {
        s1 = src_len;
    }
    (s0, s1)
}

/// Fills `out[..dst_w*dst_h*4]` with the RGBA proxy for `source`, which must
/// cover exactly `(src_w, src_h)` source pixels starting at `(min_x, min_y)`.
/// `out` must be at least `dst_w * dst_h * 4` floats; the caller (the work
/// buffer or a freshly sized `Vec`) owns the allocation.
pub fn build_proxy(
    source: &PixelSource<'_>,
    min_x: usize,
    min_y: usize,
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    out: &mut [f32],
) {
    debug_assert!(out.len() >= dst_w * dst_h * 4);
    match source {
        PixelSource::PackedRgba {
            data,
            stride,
            premultiplied,
        } => build_packed_rgba(
            data,
            *stride,
            *premultiplied,
            min_x,
            min_y,
            src_w,
            src_h,
            dst_w,
            dst_h,
            out,
        ),
        PixelSource::PlanarYCbCr {
            y,
            y_stride,
            cb,
            cb_stride,
            cr,
            cr_stride,
            subsampling,
        } => build_planar_ycbcr(
            y, *y_stride, cb, *cb_stride, cr, *cr_stride, *subsampling, min_x, min_y, src_w,
            src_h, dst_w, dst_h, out,
        ),
        PixelSource::Gray8 { data, stride } => {
            build_gray8(data, *stride, min_x, min_y, src_w, src_h, dst_w, dst_h, out)
        }
        PixelSource::Generic(at) => {
            build_generic(at, min_x, min_y, src_w, src_h, dst_w, dst_h, out)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_packed_rgba(
    data: &[u8],
    stride: usize,
    premultiplied: bool,
    min_x: usize,
    min_y: usize,
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    out: &mut [f32],
) {
    for dy in 0..dst_h {
        let (sy0, sy1) = span(dy, dst_h, src_h);
        for dx in 0..dst_w {
            let (sx0, sx1) = span(dx, dst_w, src_w);
            let span_len = ((sx1 - sx0) * (sy1 - sy0)) as u32;

            let mut sum_r = 0u32;
            let mut sum_g = 0u32;
            let mut sum_b = 0u32;
            let mut sum_a = 0u32;
            for sy in sy0..sy1 {
                let row = (min_y + sy) * stride + min_x * 4;
                for sx in sx0..sx1 {
                    let px = row + sx * 4;
                    sum_r += data[px] as u32;
                    sum_g += data[px + 1] as u32;
                    sum_b += data[px + 2] as u32;
                    sum_a += data[px + 3] as u32;
                }
            }

            let out_idx = (dy * dst_w + dx) * 4;
            if premultiplied {
                let a = sum_a as f32 / (span_len as f32 * 255.0);
                if sum_a > 0 {
                    out[out_idx] = sum_r as f32 / sum_a as f32;
                    out[out_idx + 1] = sum_g as f32 / sum_a as f32;
                    out[out_idx + 2] = sum_b as f32 / sum_a as f32;
                } else {
                    out[out_idx] = 0.0;
                    out[out_idx + 1] = 0.0;
                    out[out_idx + 2] = 0.0;
                }
                out[out_idx + 3] = a;
            } else {
                let denom = span_len as f32 * 255.0;
                out[out_idx] = sum_r as f32 / denom;
                out[out_idx + 1] = sum_g as f32 / denom;
                out[out_idx + 2] = sum_b as f32 / denom;
                out[out_idx + 3] = sum_a as f32 / denom;
            }
        }
    }
}

fn build_gray8(
    data: &[u8],
    stride: usize,
    min_x: usize,
    min_y: usize,
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    out: &mut [f32],
) {
    for dy in 0..dst_h {
        let (sy0, sy1) = span(dy, dst_h, src_h);
        for dx in 0..dst_w {
            let (sx0, sx1) = span(dx, dst_w, src_w);
            let span_len = (sx1 - sx0) * (sy1 - sy0);

            let mut sum = 0u32;
            for sy in sy0..sy1 {
                let row = (min_y + sy) * stride + min_x;
                for sx in sx0..sx1 {
                    sum += data[row + sx] as u32;
                }
            }

            let v = sum as f32 / (span_len as f32 * 255.0);
            let out_idx = (dy * dst_w + dx) * 4;
            out[out_idx] = v;
            out[out_idx + 1] = v;
            out[out_idx + 2] = v;
            out[out_idx + 3] = 1.0;
        }
    }
}

fn build_generic(
    at: &dyn Fn(usize, usize) -> [u16; 4],
    min_x: usize,
    min_y: usize,
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    out: &mut [f32],
) {
    for dy in 0..dst_h {
        let (sy0, sy1) = span(dy, dst_h, src_h);
        for dx in 0..dst_w {
            let (sx0, sx1) = span(dx, dst_w, src_w);
            let span_len = ((sx1 - sx0) * (sy1 - sy0)) as f32;

            let mut sum_r = 0f32;
            let mut sum_g = 0f32;
            let mut sum_b = 0f32;
            let mut sum_a = 0f32;
            for sy in sy0..sy1 {
                for sx in sx0..sx1 {
                    let [r, g, b, a] = at(min_x + sx, min_y + sy);
                    let af = a as f32 / 65535.0;
                    // Un-premultiply each sample before accumulating so the
                    // mean is taken in non-premultiplied space.
                    if a > 0 {
                        sum_r += r as f32 / a as f32;
                        sum_g += g as f32 / a as f32;
                        sum_b += b as f32 / a as f32;
                    }
                    sum_a += af;
                }
            }

            let out_idx = (dy * dst_w + dx) * 4;
            out[out_idx] = sum_r / span_len;
            out[out_idx + 1] = sum_g / span_len;
            out[out_idx + 2] = sum_b / span_len;
            out[out_idx + 3] = sum_a / span_len;
        }
    }
}

/// Area-averages a planar Y/Cb/Cr source at any subsampling ratio. 4:2:0 and
/// 4:2:2 get a two-pass average-then-combine treatment; every other ratio
/// (4:4:4, 4:4:0, 4:1:1, 4:1:0) gets a single-pass per-source-pixel
/// reconstruction, since for those the chroma-to-luma mapping is uneven or
/// many-to-one and averaging the distinct chroma cells directly (rather than
/// weighting each by how many luma samples reference it) would not agree
/// with a per-pixel sum.
#[allow(clippy::too_many_arguments)]
fn build_planar_ycbcr(
    y_plane: &[u8],
    y_stride: usize,
    cb_plane: &[u8],
    cb_stride: usize,
    cr_plane: &[u8],
    cr_stride: usize,
    subsampling: Subsampling,
    min_x: usize,
    min_y: usize,
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    out: &mut [f32],
) {
    match subsampling {
        Subsampling::Yuv420 | Subsampling::Yuv422 => build_planar_ycbcr_two_pass(
            y_plane, y_stride, cb_plane, cb_stride, cr_plane, cr_stride, subsampling, min_x,
            min_y, src_w, src_h, dst_w, dst_h, out,
        ),
        _ => build_planar_ycbcr_single_pass(
            y_plane, y_stride, cb_plane, cb_stride, cr_plane, cr_stride, subsampling, min_x,
            min_y, src_w, src_h, dst_w, dst_h, out,
        ),
    }
}

/// 4:2:0 / 4:2:2: average luma over the destination's luma-space span,
/// average chroma separately over that span re-mapped into chroma-plane
/// coordinates, then combine the two averages once per destination pixel
/// through the shared fixed-point YCbCr LUT.
#[allow(clippy::too_many_arguments)]
fn build_planar_ycbcr_two_pass(
    y_plane: &[u8],
    y_stride: usize,
    cb_plane: &[u8],
    cb_stride: usize,
    cr_plane: &[u8],
    cr_stride: usize,
    subsampling: Subsampling,
    min_x: usize,
    min_y: usize,
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    out: &mut [f32],
) {
    let (chroma_w, chroma_h) = subsampling.chroma_size(src_w, src_h);
    let (chroma_min_x, chroma_min_y) = subsampling.chroma_origin(min_x, min_y);
    let lut = lut();

    for dy in 0..dst_h {
        let (sy0, sy1) = span(dy, dst_h, src_h);
        let (cy0, cy1) = chroma_span(sy0, sy1, src_h, chroma_h);
        for dx in 0..dst_w {
            let (sx0, sx1) = span(dx, dst_w, src_w);
            let (cx0, cx1) = chroma_span(sx0, sx1, src_w, chroma_w);

            let mut sum_y = 0u32;
            for sy in sy0..sy1 {
                let row = (min_y + sy) * y_stride + min_x;
                for sx in sx0..sx1 {
                    sum_y += y_plane[row + sx] as u32;
                }
            }
            let y_avg = (sum_y / ((sx1 - sx0) * (sy1 - sy0)) as u32) as u8;

            let mut sum_cb = 0u32;
            let mut sum_cr = 0u32;
            for cy in cy0..cy1 {
                let cb_row = (chroma_min_y + cy) * cb_stride + chroma_min_x;
                let cr_row = (chroma_min_y + cy) * cr_stride + chroma_min_x;
                for cx in cx0..cx1 {
                    sum_cb += cb_plane[cb_row + cx] as u32;
                    sum_cr += cr_plane[cr_row + cx] as u32;
                }
            }
            let chroma_span_len = ((cx1 - cx0) * (cy1 - cy0)) as u32;
            let cb_avg = (sum_cb / chroma_span_len) as u8;
            let cr_avg = (sum_cr / chroma_span_len) as u8;

            let (r, g, b) = lut.to_rgb(y_avg, cb_avg, cr_avg);
            let out_idx = (dy * dst_w + dx) * 4;
            out[out_idx] = r as f32 / 255.0;
            out[out_idx + 1] = g as f32 / 255.0;
            out[out_idx + 2] = b as f32 / 255.0;
            out[out_idx + 3] = 1.0;
        }
    }
}

/// 4:4:4 / 4:4:0 / 4:1:1 / 4:1:0: reconstruct RGB per source pixel (each
/// luma sample paired with the chroma sample it maps to through
/// [`Subsampling::chroma_origin`]), sum those RGB triples over the
/// destination span, and divide by `span * 255`. This implicitly weights
/// each chroma sample by how many luma pixels in the span reference it,
/// unlike the two-pass average above.
#[allow(clippy::too_many_arguments)]
fn build_planar_ycbcr_single_pass(
    y_plane: &[u8],
    y_stride: usize,
    cb_plane: &[u8],
    cb_stride: usize,
    cr_plane: &[u8],
    cr_stride: usize,
    subsampling: Subsampling,
    min_x: usize,
    min_y: usize,
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    out: &mut [f32],
) {
    let lut = lut();

    for dy in 0..dst_h {
        let (sy0, sy1) = span(dy, dst_h, src_h);
        for dx in 0..dst_w {
            let (sx0, sx1) = span(dx, dst_w, src_w);
            let span_len = ((sx1 - sx0) * (sy1 - sy0)) as u32;

            let mut sum_r = 0u32;
            let mut sum_g = 0u32;
            let mut sum_b = 0u32;
            for sy in sy0..sy1 {
                let y_row = (min_y + sy) * y_stride + min_x;
                for sx in sx0..sx1 {
                    let y = y_plane[y_row + sx];
                    let (chroma_x, chroma_y) = subsampling.chroma_origin(min_x + sx, min_y + sy);
                    let cb = cb_plane[chroma_y * cb_stride + chroma_x];
                    let cr = cr_plane[chroma_y * cr_stride + chroma_x];
                    let (r, g, b) = lut.to_rgb(y, cb, cr);
                    sum_r += r as u32;
                    sum_g += g as u32;
                    sum_b += b as u32;
                }
            }

            let denom = span_len as f32 * 255.0;
            let out_idx = (dy * dst_w + dx) * 4;
            out[out_idx] = (sum_r as f32 / denom).clamp(0.0, 1.0);
            out[out_idx + 1] = (sum_g as f32 / denom).clamp(0.0, 1.0);
            out[out_idx + 2] = (sum_b as f32 / denom).clamp(0.0, 1.0);
            out[out_idx + 3] = 1.0;
        }
    }
}

/// Re-maps a luma-space span `[s0, s1)` of a `luma_len`-wide axis into the
/// corresponding chroma-space span of a `chroma_len`-wide axis, widened to
/// at least one sample.
#[inline]
fn chroma_span(s0: usize, s1: usize, luma_len: usize, chroma_len: usize) -> (usize, usize) {
    let mut c0 = s0 * chroma_len / luma_len;
    let mut c1 = (s1 * chroma_len + luma_len - 1) / luma_len;
    if c1 <= c0 {
        c1 = c0 + 1;
    }
    if c1 > chroma_len {
        c1 = chroma_len;
    }
    (c0, c1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_dims_passthrough_for_small_images() {
        assert_eq!(proxy_dims(64, 64), (64, 64));
        assert_eq!(proxy_dims(100, 100), (100, 100));
    }

    #[test]
    fn proxy_dims_clamps_longer_side() {
        assert_eq!(proxy_dims(200, 100), (100, 50));
        assert_eq!(proxy_dims(100, 200), (50, 100));
        assert_eq!(proxy_dims(256, 256), (100, 100));
    }

    #[test]
    fn proxy_dims_never_zero() {
        for &(w, h) in &[(4000usize, 1usize), (1, 4000), (4000, 4000)] {
            let (dw, dh) = proxy_dims(w, h);
            assert!(dw >= 1 && dh >= 1);
            assert!(dw.max(dh) <= crate::MAX_PROXY_SIDE);
        }
    }

    #[test]
    fn packed_rgba_direct_extraction_is_exact() {
        let data = [255u8, 0, 0, 255, 0, 255, 0, 255];
        let mut out = vec![0f32; 2 * 1 * 4];
        build_packed_rgba(&data, 8, false, 0, 0, 2, 1, 2, 1, &mut out);
        assert_eq!(out, vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn packed_rgba_premultiplied_unpremultiplies() {
        // A single half-alpha red pixel premultiplied: (128, 0, 0, 128).
        let data = [128u8, 0, 0, 128];
        let mut out = vec![0f32; 4];
        build_packed_rgba(&data, 4, true, 0, 0, 1, 1, 1, 1, &mut out);
        assert!((out[0] - 1.0).abs() < 1e-3);
        assert!((out[3] - 128.0 / 255.0).abs() < 1e-3);
    }

    #[test]
    fn gray_broadcasts_to_opaque_rgb() {
        let data = [10u8, 200];
        let mut out = vec![0f32; 2 * 4];
        build_gray8(&data, 2, 0, 0, 2, 1, 2, 1, &mut out);
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn planar_yuv411_single_pass_weights_chroma_by_luma_coverage() {
        // 8-wide, 1-tall Y plane; 4:1:1 chroma is ceil(8/4) = 2 samples wide.
        let y = [100u8; 8];
        let cb = [128u8, 128u8];
        let cr = [80u8, 200u8];

        let mut out = vec![0f32; 3 * 1 * 4];
        build_proxy(
            &PixelSource::PlanarYCbCr {
                y: &y,
                y_stride: 8,
                cb: &cb,
                cb_stride: 2,
                cr: &cr,
                cr_stride: 2,
                subsampling: Subsampling::Yuv411,
            },
            0,
            0,
            8,
            1,
            3,
            1,
            &mut out,
        );

        // Destination column 1 spans luma pixels [2, 5): x=2 and x=3 map to
        // chroma cell 0 (cr=80), x=4 maps to cell 1 (cr=200). The single-pass
        // reconstruction sums the per-pixel RGB (weighting cell 0 2:1 over
        // cell 1), not an unweighted average of the two distinct chroma
        // cells.
        let (r0, _, _) = lut().to_rgb(100, 128, 80);
        let (r1, _, _) = lut().to_rgb(100, 128, 200);
        let weighted_r = (2 * r0 as u32 + r1 as u32) as f32 / (3.0 * 255.0);
        let unweighted_r = (r0 as u32 + r1 as u32) as f32 / (2.0 * 255.0);

        let out_r = out[4];
        assert!(
            (out_r - weighted_r).abs() < 1e-4,
            "expected 2:1-weighted red {weighted_r}, got {out_r}"
        );
        assert!(
            (out_r - unweighted_r).abs() > 1e-4,
            "single-pass result matched the unweighted two-pass average, regression"
        );
    }

    #[test]
    fn planar_yuv420_two_pass_averages_chroma_plane_directly() {
        // 4-wide, 2-tall Y plane downsampled to a single destination pixel;
        // 4:2:0 chroma is a single 2x1 sample. Unlike the 4:1:1 case above,
        // the two-pass path averages Cb/Cr over the chroma-plane span before
        // any RGB reconstruction, so the result must match `lut.to_rgb` on
        // the chroma plane's own unweighted average, not a per-pixel sum.
        let y = [100u8; 4 * 2];
        let cb = [100u8, 156u8];
        let cr = [80u8, 200u8];

        let mut out = vec![0f32; 4];
        build_proxy(
            &PixelSource::PlanarYCbCr {
                y: &y,
                y_stride: 4,
                cb: &cb,
                cb_stride: 2,
                cr: &cr,
                cr_stride: 2,
                subsampling: Subsampling::Yuv420,
            },
            0,
            0,
            4,
            2,
            1,
            1,
            &mut out,
        );

        let (r, g, b) = lut().to_rgb(100, 128, 140);
        assert!((out[0] - r as f32 / 255.0).abs() < 1e-3);
        assert!((out[1] - g as f32 / 255.0).abs() < 1e-3);
        assert!((out[2] - b as f32 / 255.0).abs() < 1e-3);
    }
}
