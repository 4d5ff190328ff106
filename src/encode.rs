//! Encoder: proxy RGBA -> LPQA -> per-channel DCT -> packed bytes.

use alloc::vec;
use alloc::vec::Vec;

use crate::color;
use crate::dct;
use crate::image::SourceImage;
use crate::pack::{self, Header};

/// Encodes `image` into a ThumbHash byte string.
///
/// An empty image (zero width or height) produces an empty hash; encoding
/// otherwise never fails, since every quantization step clamps by
/// construction rather than rejecting out-of-range input.
#[cfg(feature = "std")]
pub fn encode(image: &SourceImage<'_>) -> Vec<u8> {
    if image.is_empty() {
        return Vec::new();
    }
    let pool = crate::pool::default_pool();
    let mut buf = pool.acquire();
    let (dst_w, dst_h) = crate::proxy::proxy_dims(image.width, image.height);
    let len = dst_w * dst_h * 4;
    buf.clear_proxy(len);
    let hash = encode_into(image, dst_w, dst_h, &mut buf.proxy[..len]);
    pool.release(buf);
    hash
}

#[cfg(not(feature = "std"))]
pub fn encode(image: &SourceImage<'_>) -> Vec<u8> {
    if image.is_empty() {
        return Vec::new();
    }
    let (dst_w, dst_h) = crate::proxy::proxy_dims(image.width, image.height);
    let mut proxy = vec![0f32; dst_w * dst_h * 4];
    encode_into(image, dst_w, dst_h, &mut proxy)
}

fn encode_into(image: &SourceImage<'_>, dst_w: usize, dst_h: usize, rgba: &mut [f32]) -> Vec<u8> {
    crate::proxy::build_proxy(
        &image.pixels,
        image.min_x,
        image.min_y,
        image.width,
        image.height,
        dst_w,
        dst_h,
        rgba,
    );

    let avg = color::average_color(rgba);
    let has_alpha = color::has_alpha(avg[3]);
    color::to_lpqa(rgba);

    let n = dst_w * dst_h;
    let mut l = vec![0f32; n];
    let mut p = vec![0f32; n];
    let mut q = vec![0f32; n];
    let mut a = vec![0f32; n];
    for (i, px) in rgba.chunks_exact(4).enumerate() {
        l[i] = px[0];
        p[i] = px[1];
        q[i] = px[2];
        a[i] = px[3];
    }

    let (lx_raw, ly_raw) = pack::basis_dims(dst_w, dst_h, has_alpha);
    let (lx, ly) = pack::transform_dims(lx_raw, ly_raw);

    let l_coeffs = dct::forward(&l, dst_w, dst_h, lx, ly);
    let p_coeffs = dct::forward(&p, dst_w, dst_h, 3, 3);
    let q_coeffs = dct::forward(&q, dst_w, dst_h, 3, 3);
    let a_coeffs = if has_alpha {
        Some(dct::forward(&a, dst_w, dst_h, 5, 5))
    } else {
        None
    };

    let l_scale_f = l_coeffs.ac_scale();
    let p_scale_f = p_coeffs.ac_scale();
    let q_scale_f = q_coeffs.ac_scale();
    let a_scale_f = a_coeffs.as_ref().map(dct::Coefficients::ac_scale).unwrap_or(0.0);

    // Strict: a square proxy is not landscape (the comparison is `W > H`).
    let is_landscape = dst_w > dst_h;
    let l_min = if is_landscape { ly_raw } else { lx_raw };

    let header = Header {
        l_dc: pack::quantize_dc(l_coeffs.dc),
        p_dc: pack::quantize_signed_dc(p_coeffs.dc),
        q_dc: pack::quantize_signed_dc(q_coeffs.dc),
        l_scale: pack::quantize_scale(l_scale_f, 5),
        has_alpha,
        l_min: l_min as u8,
        is_landscape,
        p_scale: pack::quantize_scale(p_scale_f, 6),
        q_scale: pack::quantize_scale(q_scale_f, 6),
    };

    #[cfg(feature = "std")]
    log::debug!("encode: {dst_w}x{dst_h} proxy, basis ({lx}x{ly}), has_alpha={has_alpha}");

    let n_nibbles = nibble_count(&l_coeffs, &p_coeffs, &q_coeffs, a_coeffs.as_ref());
    let mut out = Vec::with_capacity(6 + n_nibbles.div_ceil(2));
    out.extend_from_slice(&header.pack());
    if let Some(ref a_coeffs) = a_coeffs {
        let a_dc_q = pack::quantize_scale(a_coeffs.dc, 4);
        let a_scale_q = pack::quantize_scale(a_scale_f, 4);
        out.extend_from_slice(&pack::pack_alpha_header(a_dc_q, a_scale_q));
    }

    // AC nibbles follow, in order: L, P, Q, and (if present) A, each
    // normalized by its own channel's scale before quantizing.
    let mut nibbles: Vec<u8> = Vec::new();
    for &c in &l_coeffs.ac {
        let v = if l_scale_f > 0.0 { c / l_scale_f } else { 0.0 };
        nibbles.push(pack::quantize_ac(v));
    }
    for &c in &p_coeffs.ac {
        let v = if p_scale_f > 0.0 { c / p_scale_f } else { 0.0 };
        nibbles.push(pack::quantize_ac(v));
    }
    for &c in &q_coeffs.ac {
        let v = if q_scale_f > 0.0 { c / q_scale_f } else { 0.0 };
        nibbles.push(pack::quantize_ac(v));
    }
    if let Some(a_coeffs) = &a_coeffs {
        for &c in &a_coeffs.ac {
            let v = if a_scale_f > 0.0 { c / a_scale_f } else { 0.0 };
            nibbles.push(pack::quantize_ac(v));
        }
    }

    out.extend(pack::pack_nibbles(&nibbles));
    out
}

fn nibble_count(
    l: &dct::Coefficients,
    p: &dct::Coefficients,
    q: &dct::Coefficients,
    a: Option<&dct::Coefficients>,
) -> usize {
    l.ac.len() + p.ac.len() + q.ac.len() + a.map(|a| a.ac.len()).unwrap_or(0)
}
