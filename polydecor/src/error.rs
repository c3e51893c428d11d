//! Error types.
//!
//! ## Rust Lesson #20: Error Handling
//!
//! Rust uses `Result<T, E>` instead of exceptions. `thiserror` derives the
//! `Display` and `std::error::Error` impls from the `#[error(...)]` strings,
//! so each variant documents its own message.

use thiserror::Error;

/// A pattern parameter (offset, end offset, repeat) that could not be parsed
/// strictly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("empty pattern value")]
    Empty,

    #[error("invalid number in pattern value: {0:?}")]
    InvalidNumber(String),

    #[error("unexpected trailing text in pattern value: {0:?}")]
    TrailingText(String),
}

/// A color string that is not `#rgb` or `#rrggbb`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid hex color: {0:?}")]
pub struct ColorError(pub String);

/// Error type for SVG parsing.
#[derive(Error, Debug)]
pub enum SvgError {
    #[error("SVG parse error: {0}")]
    ParseError(String),

    #[error("No paths found in SVG")]
    NoPaths,
}
