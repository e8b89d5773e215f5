//! Error type for BSDF file conversions.
//!
//! Only conditions that abort a single conversion job are errors; recoverable
//! conditions (a declared axis count that does not match the parsed token
//! count, a degenerate zero-valued normalization integral) are reported
//! through the `log` facade and processing continues with best-effort values.

/// Fatal failure of a single conversion job.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The Speos file predates the v8.0 anisotropic BSDF grammar.
    #[error(
        "unsupported Speos BSDF format v{found}: the format must be v8.0 or newer, re-save the \
         file with a compatible BSDF viewer"
    )]
    UnsupportedVersion {
        /// Version number parsed from the file header.
        found: f64,
    },

    /// The Speos file declares binary-encoded data.
    #[error("binary-encoded Speos BSDF data is not supported")]
    BinaryData,

    /// A header line could not be understood well enough to establish the
    /// axis lengths of the dataset.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// A data line does not fit the declared block shape.
    #[error("malformed data section: {0}")]
    MalformedData(String),

    /// The scatter type is neither `BRDF` nor `BTDF`.
    #[error("unknown scatter type '{0}', expected BRDF or BTDF")]
    UnknownScatterType(String),

    /// The symmetry is none of the values the Zemax grammar allows.
    #[error("unknown symmetry '{0}', expected Asymmetrical, Asymmetrical4D or PlaneSymmetrical")]
    UnknownSymmetry(String),

    /// An angular axis came out empty, leaving nothing to resample.
    #[error("empty {0} axis, nothing to resample")]
    EmptyAxis(&'static str),
}
