//! The source-image contract consumed by the encoder's proxy builder.
//!
//! The encoder dispatches on a small tagged enum rather than per-pixel
//! virtual calls: the measured cost of dynamic dispatch inside the
//! downsampling inner loop is a 2-5x slowdown, so only [`PixelSource::Generic`]
//! pays for an indirect call per pixel.

/// Chroma subsampling ratio of a planar Y/Cb/Cr source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subsampling {
    /// No subsampling: chroma planes match the luma plane dimensions.
    Yuv444,
    /// Chroma halved horizontally only.
    Yuv422,
    /// Chroma halved both horizontally and vertically.
    Yuv420,
    /// Chroma halved vertically only.
    Yuv440,
    /// Chroma quartered horizontally only.
    Yuv411,
    /// Chroma quartered both horizontally and vertically.
    Yuv410,
}

impl Subsampling {
    /// Horizontal and vertical chroma-to-luma reduction factors.
    fn ratio(&self) -> (usize, usize) {
        match self {
            Subsampling::Yuv444 => (1, 1),
            Subsampling::Yuv422 => (2, 1),
            Subsampling::Yuv420 => (2, 2),
            Subsampling::Yuv440 => (1, 2),
            Subsampling::Yuv411 => (4, 1),
            Subsampling::Yuv410 => (4, 4),
        }
    }

    /// Dimensions of the chroma planes for a luma plane of size `w x h`.
    pub fn chroma_size(&self, w: usize, h: usize) -> (usize, usize) {
        let (rx, ry) = self.ratio();
        let ceil_div = |n: usize, d: usize| (n + d - 1) / d;
        (ceil_div(w, rx), ceil_div(h, ry))
    }

    /// Maps a luma-plane coordinate to its containing chroma-plane sample.
    /// Unlike [`Subsampling::chroma_size`] this is a coordinate, not an
    /// extent, so it floor-divides rather than ceil-divides.
    pub(crate) fn chroma_origin(&self, x: usize, y: usize) -> (usize, usize) {
        let (rx, ry) = self.ratio();
        (x / rx, y / ry)
    }
}

/// A typed, borrowed view into one pixel layout the proxy builder knows how
/// to average without per-pixel dynamic dispatch, plus a generic fallback.
///
/// Every packed/planar variant stores a row `stride` in elements (bytes for
/// 8-bit planes) so a sub-rectangle of a larger canvas can be referenced
/// directly without copying.
pub enum PixelSource<'a> {
    /// Packed 8-bit RGBA, four bytes per pixel, row-major.
    PackedRgba {
        data: &'a [u8],
        stride: usize,
        premultiplied: bool,
    },
    /// Planar Y/Cb/Cr at an arbitrary subsampling ratio.
    PlanarYCbCr {
        y: &'a [u8],
        y_stride: usize,
        cb: &'a [u8],
        cb_stride: usize,
        cr: &'a [u8],
        cr_stride: usize,
        subsampling: Subsampling,
    },
    /// Packed 8-bit grayscale, one byte per pixel, row-major.
    Gray8 { data: &'a [u8], stride: usize },
    /// Generic per-pixel accessor returning alpha-premultiplied 16-bit
    /// channels `[r, g, b, a]`, each in `0..=65535`.
    Generic(&'a dyn Fn(usize, usize) -> [u16; 4]),
}

/// A source image: a pixel layout plus the rectangle of it the encoder
/// should read (`width`/`height` may be smaller than the layout's own
/// dimensions when the caller only wants to hash a crop).
pub struct SourceImage<'a> {
    pub min_x: usize,
    pub min_y: usize,
    pub width: usize,
    pub height: usize,
    pub pixels: PixelSource<'a>,
}

impl<'a> SourceImage<'a> {
    /// A source image covering the whole of `pixels` at `(0, 0, width, height)`.
    pub fn new(width: usize, height: usize, pixels: PixelSource<'a>) -> Self {
        SourceImage {
            min_x: 0,
            min_y: 0,
            width,
            height,
            pixels,
        }
    }

    pub fn max_x(&self) -> usize {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> usize {
        self.min_y + self.height
    }

    /// `true` when the rectangle has zero area: the encoder short-circuits
    /// to an empty hash for these rather than invoking the proxy builder.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
