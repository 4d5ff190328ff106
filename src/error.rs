use core::fmt::{self, Display};

/// Reserved for forward compatibility.
///
/// Every current encode operation is infallible: an empty source image
/// produces an empty hash rather than an error (see [`crate::encode`]), and
/// every quantization step clamps by construction instead of rejecting
/// out-of-range input. This type has no variants today, so a `Result<_,
/// EncodeError>` can never actually hold an `Err`; it exists so a future
/// fallible encode path (e.g. a caller-supplied output slice too small to
/// hold the hash) can be added without changing the shape of the public
/// API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncodeError {}

impl Display for EncodeError {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Errors that may occur while decoding a ThumbHash.
///
/// Encoding never fails: an empty source image produces an empty hash
/// rather than an error (see [`crate::encode`]), and every quantization
/// step clamps by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeError {
    /// The byte string is shorter than the minimum required for its
    /// `hasAlpha` bit (6 bytes without alpha, 8 bytes with).
    TruncatedHash,

    /// The AC nibble stream ended before all coefficients declared by the
    /// header could be read.
    MalformedBasis,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TruncatedHash => {
                f.write_str("hash is shorter than the minimum length for its header")
            }
            DecodeError::MalformedBasis => {
                f.write_str("AC nibble stream ended before all basis coefficients were read")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
