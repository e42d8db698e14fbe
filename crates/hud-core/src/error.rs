//! Error types for font loading and text rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for font operations.
pub type Result<T> = std::result::Result<T, FontError>;

/// Errors that can occur while loading, rendering or releasing a font.
#[derive(Error, Debug)]
pub enum FontError {
    /// Font or image file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bitmap font image could not be decoded.
    #[error("failed to decode font image: {0}")]
    Image(#[from] image::ImageError),

    /// TrueType data could not be parsed.
    #[error("failed to parse font: {0}")]
    Parse(String),

    /// A single glyph could not be turned into a texture.
    #[error("failed to rasterize glyph U+{code:04X}: {reason}")]
    Rasterize { code: u32, reason: String },

    /// Character range or glyph table is inconsistent.
    #[error("invalid charset: {0}")]
    InvalidCharset(String),

    /// Scale factor or pixel height is zero or overflows.
    #[error("invalid scale: {0}")]
    InvalidScale(String),

    /// Character outside the loaded range under the `Reject` policy.
    #[error("glyph U+{0:04X} is outside the loaded range")]
    UnsupportedGlyph(u32),

    /// The font has been released.
    #[error("font has been released")]
    Released,

    /// Graphics backend rejected an operation.
    #[error("backend error: {0}")]
    Backend(String),
}
