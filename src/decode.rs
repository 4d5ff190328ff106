//! Decoder: packed bytes -> header + AC array -> RGBA bitmap, plus the two
//! header-only queries that skip the inverse transform entirely.

use alloc::vec;
use alloc::vec::Vec;

use crate::color;
use crate::dct;
use crate::error::DecodeError;
use crate::options::DecodeOptions;
use crate::pack::{self, Header};
use crate::round::round_ties_even;

/// Decodes `hash` into `(width, height, rgba)`.
///
/// `rgba` is row-major, four bytes per pixel, with the longer side clamped
/// to [`crate::MAX_DECODED_SIDE`]. See [`DecodeOptions`] for the optional
/// chroma attenuation and bias-correction passes.
#[cfg(feature = "std")]
pub fn decode(hash: &[u8], options: &DecodeOptions) -> Result<(usize, usize, Vec<u8>), DecodeError> {
    let pool = crate::pool::default_pool();
    let mut buf = pool.acquire();
    let (w, h, len) = decode_fields(hash, &mut buf.decoded)?;
    let rgba = finish(&buf.decoded[..len], w, h, options);
    pool.release(buf);
    Ok((w, h, rgba))
}

#[cfg(not(feature = "std"))]
pub fn decode(hash: &[u8], options: &DecodeOptions) -> Result<(usize, usize, Vec<u8>), DecodeError> {
    let mut scratch = vec![0f32; crate::MAX_DECODED_SIDE * crate::MAX_DECODED_SIDE * 4];
    let (w, h, len) = decode_fields(hash, &mut scratch)?;
    Ok((w, h, finish(&scratch[..len], w, h, options)))
}

/// Parses `hash` and fills `lpqa[..w*h*4]` with the reconstructed (not yet
/// post-processed) L/P/Q/A samples, returning `(w, h, w*h*4)`.
fn decode_fields(hash: &[u8], lpqa: &mut [f32]) -> Result<(usize, usize, usize), DecodeError> {
    let header = parse_header(hash)?;

    let (lx_raw, ly_raw) = header.luma_dims();
    let (lx, ly) = pack::transform_dims(lx_raw, ly_raw);
    let l_ac_n = dct::ac_count(lx, ly);
    let pq_ac_n = dct::ac_count(3, 3);
    let a_ac_n = if header.has_alpha { dct::ac_count(5, 5) } else { 0 };

    // The header occupies bytes 0-5; a present alpha header adds bytes 6-7
    // before the nibble stream starts.
    let (a_dc, a_scale) = if header.has_alpha {
        let (dc_raw, scale_raw) = pack::unpack_alpha_header(hash[6]);
        (
            pack::dequantize_scale(dc_raw, 4),
            pack::dequantize_scale(scale_raw, 4),
        )
    } else {
        (1.0, 0.0)
    };
    let header_bytes = if header.has_alpha { 8 } else { 6 };

    let total_nibbles = l_ac_n + 2 * pq_ac_n + a_ac_n;
    let nibbles = pack::read_nibbles(hash, header_bytes * 2, total_nibbles)
        .ok_or(DecodeError::MalformedBasis)?;

    let l_scale = pack::dequantize_scale(header.l_scale, 5);
    let p_scale = pack::dequantize_scale(header.p_scale, 6);
    let q_scale = pack::dequantize_scale(header.q_scale, 6);

    let mut idx = 0;
    let l_ac: Vec<f32> = nibbles[idx..idx + l_ac_n]
        .iter()
        .map(|&n| pack::dequantize_ac(n) * l_scale)
        .collect();
    idx += l_ac_n;
    let p_ac: Vec<f32> = nibbles[idx..idx + pq_ac_n]
        .iter()
        .map(|&n| pack::dequantize_ac(n) * p_scale)
        .collect();
    idx += pq_ac_n;
    let q_ac: Vec<f32> = nibbles[idx..idx + pq_ac_n]
        .iter()
        .map(|&n| pack::dequantize_ac(n) * q_scale)
        .collect();
    idx += pq_ac_n;
    let a_ac: Vec<f32> = if header.has_alpha {
        nibbles[idx..idx + a_ac_n]
            .iter()
            .map(|&n| pack::dequantize_ac(n) * a_scale)
            .collect()
    } else {
        Vec::new()
    };

    let l_dc = pack::dequantize_dc(header.l_dc);
    let p_dc = pack::dequantize_signed_dc(header.p_dc);
    let q_dc = pack::dequantize_signed_dc(header.q_dc);

    let (w, h) = output_dims(lx_raw, ly_raw);
    #[cfg(feature = "std")]
    log::debug!("decode: reconstructing {w}x{h} from basis ({lx}x{ly})");

    let n = w * h;
    let (l, rest) = lpqa.split_at_mut(n);
    let (p, rest) = rest.split_at_mut(n);
    let (q, a) = rest.split_at_mut(n);

    dct::inverse(l_dc, &l_ac, lx, ly, w, h, l);
    dct::inverse(p_dc, &p_ac, 3, 3, w, h, p);
    dct::inverse(q_dc, &q_ac, 3, 3, w, h, q);
    if header.has_alpha {
        dct::inverse(a_dc, &a_ac, 5, 5, w, h, a);
    } else {
        a.iter_mut().for_each(|v| *v = 1.0);
    }

    Ok((w, h, n * 4))
}

fn parse_header(hash: &[u8]) -> Result<Header, DecodeError> {
    if hash.len() < 3 {
        return Err(DecodeError::TruncatedHash);
    }
    let has_alpha = (hash[2] & 0x80) != 0;
    let min_len = if has_alpha { 8 } else { 6 };
    if hash.len() < min_len {
        return Err(DecodeError::TruncatedHash);
    }
    Ok(Header::unpack([
        hash[0], hash[1], hash[2], hash[3], hash[4], hash[5],
    ]))
}

/// Bitmap size for a reconstructed basis `(lx, ly)`: the longer axis is
/// [`crate::MAX_DECODED_SIDE`], the shorter is scaled by the same aspect
/// ratio [`approximate_aspect_ratio`] reports.
fn output_dims(lx: usize, ly: usize) -> (usize, usize) {
    let max_side = crate::MAX_DECODED_SIDE as f32;
    let ratio = lx as f32 / ly as f32;
    if ratio >= 1.0 {
        let h = round_ties_even(max_side / ratio).max(1.0);
        (max_side as usize, h as usize)
    } else {
        let w = round_ties_even(max_side * ratio).max(1.0);
        (w as usize, max_side as usize)
    }
}

/// Converts reconstructed LPQA samples to an RGBA byte buffer and applies
/// whichever post-processing pass `options` selects.
fn finish(lpqa: &[f32], w: usize, h: usize, options: &DecodeOptions) -> Vec<u8> {
    let n = w * h;
    let l = &lpqa[0..n];
    let p = &lpqa[n..2 * n];
    let q = &lpqa[2 * n..3 * n];
    let a = &lpqa[3 * n..4 * n];

    let mut rgba = Vec::with_capacity(n * 4);
    for i in 0..n {
        let rgb = color::lpqa_to_rgb(l[i], p[i], q[i], a[i].clamp(0.0, 1.0));
        rgba.push(round_ties_even(rgb[0] * 255.0).clamp(0.0, 255.0) as u8);
        rgba.push(round_ties_even(rgb[1] * 255.0).clamp(0.0, 255.0) as u8);
        rgba.push(round_ties_even(rgb[2] * 255.0).clamp(0.0, 255.0) as u8);
        rgba.push(round_ties_even(a[i].clamp(0.0, 1.0) * 255.0).clamp(0.0, 255.0) as u8);
    }

    if let Some(target) = options.target_mean {
        adaptive_chroma_and_bias(&mut rgba, target);
    } else if options.chroma < 1.0 {
        attenuate(&mut rgba, options.chroma);
    }
    rgba
}

/// BT.709 luma-preserving chroma attenuation. `chroma = 0` collapses every
/// pixel to its own luma.
fn attenuate(rgba: &mut [u8], chroma: f32) {
    for px in rgba.chunks_exact_mut(4) {
        let r = px[0] as f32;
        let g = px[1] as f32;
        let b = px[2] as f32;
        let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        px[0] = round_ties_even(y + (r - y) * chroma).clamp(0.0, 255.0) as u8;
        px[1] = round_ties_even(y + (g - y) * chroma).clamp(0.0, 255.0) as u8;
        px[2] = round_ties_even(y + (b - y) * chroma).clamp(0.0, 255.0) as u8;
    }
}

fn mean_rgb(rgba: &[u8]) -> [f32; 3] {
    let mut sum = [0f32; 3];
    let mut count = 0f32;
    for px in rgba.chunks_exact(4) {
        sum[0] += px[0] as f32;
        sum[1] += px[1] as f32;
        sum[2] += px[2] as f32;
        count += 1.0;
    }
    [sum[0] / count, sum[1] / count, sum[2] / count]
}

/// The adaptive chroma + bias-correction pipeline: picks an attenuation
/// strength from how far the raw mean color sits from the caller's target,
/// then nudges the attenuated mean the rest of the way.
fn adaptive_chroma_and_bias(rgba: &mut [u8], target: [f32; 3]) {
    let raw_mean = mean_rgb(rgba);
    let dist = ((raw_mean[0] - target[0]).powi(2)
        + (raw_mean[1] - target[1]).powi(2)
        + (raw_mean[2] - target[2]).powi(2))
    .sqrt();

    let ac = if dist < 20.0 {
        0.55
    } else if dist < 45.0 {
        0.40
    } else {
        0.28
    };
    attenuate(rgba, ac);

    let attenuated_mean = mean_rgb(rgba);
    let bias = [
        (target[0] - attenuated_mean[0]) * 0.45,
        (target[1] - attenuated_mean[1]) * 0.45,
        (target[2] - attenuated_mean[2]) * 0.45,
    ];
    for px in rgba.chunks_exact_mut(4) {
        px[0] = round_ties_even(px[0] as f32 + bias[0]).clamp(0.0, 255.0) as u8;
        px[1] = round_ties_even(px[1] as f32 + bias[1]).clamp(0.0, 255.0) as u8;
        px[2] = round_ties_even(px[2] as f32 + bias[2]).clamp(0.0, 255.0) as u8;
    }
}

/// The header's average color, without running the inverse transform.
/// Premultiplied-by-alpha, matching the hash's own DC convention.
pub fn average_rgba(hash: &[u8]) -> Result<[f32; 4], DecodeError> {
    let header = parse_header(hash)?;
    let l = pack::dequantize_dc(header.l_dc);
    let p = pack::dequantize_signed_dc(header.p_dc);
    let q = pack::dequantize_signed_dc(header.q_dc);
    let a = if header.has_alpha {
        pack::dequantize_scale(pack::unpack_alpha_header(hash[6]).0, 4)
    } else {
        1.0
    };
    let rgb = color::lpqa_dc_to_premultiplied_rgb(l, p, q);
    Ok([rgb[0], rgb[1], rgb[2], a])
}

/// The image's approximate `width / height` ratio, without running the
/// inverse transform.
pub fn approximate_aspect_ratio(hash: &[u8]) -> Result<f32, DecodeError> {
    let header = parse_header(hash)?;
    let (lx, ly) = header.luma_dims();
    Ok(lx as f32 / ly as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use crate::image::{PixelSource, SourceImage};

    fn solid_image(w: usize, h: usize, rgba: [u8; 4]) -> Vec<u8> {
        let mut data = Vec::with_capacity(w * h * 4);
        for _ in 0..w * h {
            data.extend_from_slice(&rgba);
        }
        data
    }

    #[test]
    fn truncated_hash_is_rejected() {
        let opts = DecodeOptions::default();
        assert_eq!(decode(&[], &opts), Err(DecodeError::TruncatedHash));
        assert_eq!(decode(&[0, 0, 0, 0, 0], &opts), Err(DecodeError::TruncatedHash));
    }

    #[test]
    fn roundtrip_recovers_dominant_channel() {
        let data = solid_image(16, 16, [220, 40, 40, 255]);
        let image = SourceImage::new(
            16,
            16,
            PixelSource::PackedRgba {
                data: &data,
                stride: 16 * 4,
                premultiplied: false,
            },
        );
        let hash = encode(&image);
        let (w, h, rgba) = decode(&hash, &DecodeOptions::default()).unwrap();
        assert_eq!((w, h), (32, 32));
        let mean = mean_rgb(&rgba);
        assert!(mean[0] > mean[1] && mean[0] > mean[2]);
    }

    #[test]
    fn zero_chroma_is_gray() {
        let data = solid_image(16, 16, [220, 40, 40, 255]);
        let image = SourceImage::new(
            16,
            16,
            PixelSource::PackedRgba {
                data: &data,
                stride: 16 * 4,
                premultiplied: false,
            },
        );
        let hash = encode(&image);
        let opts = DecodeOptions {
            chroma: 0.0,
            target_mean: None,
        };
        let (_, _, rgba) = decode(&hash, &opts).unwrap();
        for px in rgba.chunks_exact(4) {
            assert!((px[0] as i16 - px[1] as i16).abs() <= 1);
            assert!((px[1] as i16 - px[2] as i16).abs() <= 1);
        }
    }

    #[test]
    fn bias_correction_is_idempotent_against_its_own_mean() {
        let data = solid_image(16, 16, [100, 150, 200, 255]);
        let image = SourceImage::new(
            16,
            16,
            PixelSource::PackedRgba {
                data: &data,
                stride: 16 * 4,
                premultiplied: false,
            },
        );
        let hash = encode(&image);
        let (_, _, raw) = decode(&hash, &DecodeOptions::default()).unwrap();
        let target = mean_rgb(&raw);
        let opts = DecodeOptions {
            chroma: 1.0,
            target_mean: Some(target),
        };
        let (_, _, biased) = decode(&hash, &opts).unwrap();
        let result_mean = mean_rgb(&biased);
        let dist = ((result_mean[0] - target[0]).powi(2)
            + (result_mean[1] - target[1]).powi(2)
            + (result_mean[2] - target[2]).powi(2))
        .sqrt();
        assert!(dist <= 1.0, "expected near-exact match, got distance {dist}");
    }

    #[test]
    fn average_rgba_and_aspect_ratio_match_full_decode() {
        let data = solid_image(40, 20, [30, 200, 30, 255]);
        let image = SourceImage::new(
            40,
            20,
            PixelSource::PackedRgba {
                data: &data,
                stride: 40 * 4,
                premultiplied: false,
            },
        );
        let hash = encode(&image);
        let avg = average_rgba(&hash).unwrap();
        assert!(avg[1] > avg[0] && avg[1] > avg[2]);

        let ratio = approximate_aspect_ratio(&hash).unwrap();
        assert!(ratio > 1.0, "expected landscape ratio, got {ratio}");
    }
}
