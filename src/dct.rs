//! Low-order discrete cosine transform over a single proxy channel.
//!
//! Every channel gets its own `(nx, ny)` basis size; the coefficient grid is
//! the full `nx * ny` rectangle enumerated column-major, minus the `(0, 0)`
//! DC term, so `acCount` is exactly `nx*ny - 1` with no triangular or
//! elliptical clipping.

use alloc::vec;
use alloc::vec::Vec;

/// Coefficients produced by [`forward`]: a DC term plus the `nx*ny - 1` AC
/// terms, column-major, each still in the channel's native range (not yet
/// quantized or scale-normalized).
pub struct Coefficients {
    pub dc: f32,
    pub ac: Vec<f32>,
    pub nx: usize,
    pub ny: usize,
}

impl Coefficients {
    /// Largest absolute AC coefficient, or `0.0` for a flat channel. This is
    /// the normalization factor packed into the wire format's scale field.
    pub fn ac_scale(&self) -> f32 {
        self.ac.iter().fold(0.0f32, |m, v| m.max(v.abs()))
    }
}

/// Runs the forward transform of `data` (row-major, `w * h` samples) over a
/// basis of `nx` horizontal and `ny` vertical frequencies.
pub fn forward(data: &[f32], w: usize, h: usize, nx: usize, ny: usize) -> Coefficients {
    debug_assert_eq!(data.len(), w * h);

    let fx_table = cosine_table(w, nx);
    let fy_table = cosine_table(h, ny);

    let mut dc = 0.0f32;
    let mut ac = Vec::new();
    for cx in 0..nx {
        for cy in 0..ny {
            let fx = &fx_table[cx * w..cx * w + w];
            let fy = &fy_table[cy * h..cy * h + h];

            let mut sum = 0.0f32;
            for y in 0..h {
                let row = &data[y * w..y * w + w];
                let fy_y = fy[y];
                for x in 0..w {
                    sum += row[x] * fx[x] * fy_y;
                }
            }
            let coeff = sum / (w * h) as f32;
            if cx == 0 && cy == 0 {
                dc = coeff;
            } else {
                ac.push(coeff);
            }
        }
    }

    Coefficients { dc, ac, nx, ny }
}

/// Reconstructs a `w x h` sample grid from `dc`/`ac` (already dequantized
/// and descaled into real coefficient units) over a basis of `(nx, ny)`.
pub fn inverse(dc: f32, ac: &[f32], nx: usize, ny: usize, w: usize, h: usize, out: &mut [f32]) {
    debug_assert_eq!(out.len(), w * h);

    let fx_table = cosine_table(w, nx);
    let fy_table = cosine_table(h, ny);

    out.iter_mut().for_each(|v| *v = 0.0);

    let mut ac_idx = 0;
    for cx in 0..nx {
        for cy in 0..ny {
            let coeff = if cx == 0 && cy == 0 {
                dc
            } else {
                let v = ac.get(ac_idx).copied().unwrap_or(0.0);
                ac_idx += 1;
                v
            };
            if coeff == 0.0 {
                continue;
            }

            let fx = &fx_table[cx * w..cx * w + w];
            let fy = &fy_table[cy * h..cy * h + h];
            for y in 0..h {
                let fy_y = fy[y] * coeff;
                let row = &mut out[y * w..y * w + w];
                for x in 0..w {
                    row[x] += fx[x] * fy_y;
                }
            }
        }
    }
}

/// Number of AC coefficients a `(nx, ny)` basis contributes, not counting
/// the DC term: `nx*ny - 1`. Used by [`crate::pack`] to size the nibble
/// stream before any transform runs.
pub fn ac_count(nx: usize, ny: usize) -> usize {
    nx * ny - 1
}

/// `table[c * len + i] == cos(pi / len * c * (i + 0.5))` for `c in 0..count`,
/// `i in 0..len`, precomputed once per channel per call rather than per
/// coefficient.
fn cosine_table(len: usize, count: usize) -> Vec<f32> {
    let mut table = vec![0f32; count * len];
    for c in 0..count {
        for i in 0..len {
            table[c * len + i] =
                (core::f32::consts::PI / len as f32 * c as f32 * (i as f32 + 0.5)).cos();
        }
    }
    table
}
