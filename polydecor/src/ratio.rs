//! Pattern parameters and their normalization to path-length ratios.
//!
//! Offsets and repeat intervals are given either in pixels (`12`, `"12"`)
//! or as a percentage of the path length (`"25%"`). Before projection,
//! every parameter is turned into a ratio of the current path length.

use crate::error::ParameterError;

/// A single offset / end offset / repeat value.
///
/// ## Rust Lesson #10: Enums (Sum Types)
///
/// Unlike TypeScript's union types, Rust enums can carry data.
/// The unit (pixels or fraction) travels with the number, so the two
/// can never be confused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternParameter {
    /// Distance in pixels. Always positive.
    Absolute(f64),
    /// Fraction of the total path length.
    Relative(f64),
}

impl Default for PatternParameter {
    fn default() -> Self {
        PatternParameter::Relative(0.0)
    }
}

impl PatternParameter {
    /// A pixel distance. Non-positive values carry no pixel dependency and
    /// are stored as relative values; they normalize to the same ratio sign.
    pub fn pixels(value: f64) -> Self {
        if value > 0.0 {
            PatternParameter::Absolute(value)
        } else {
            PatternParameter::Relative(value)
        }
    }

    /// A percentage of the path length (`50.0` = half way).
    pub fn percent(value: f64) -> Self {
        PatternParameter::Relative(value / 100.0)
    }

    /// Permissive parse: anything that isn't a number becomes `0`.
    ///
    /// `"25%"` is relative, `"12"` or `"12px"` is 12 pixels.
    pub fn parse(raw: &str) -> Self {
        match leading_number(raw) {
            Some((value, _)) if raw.contains('%') => Self::percent(value),
            Some((value, _)) => Self::pixels(value),
            None => Self::pixels(0.0),
        }
    }

    /// Strict parse: the whole string must be a number, optionally
    /// followed by `%`.
    pub fn try_parse(raw: &str) -> Result<Self, ParameterError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParameterError::Empty);
        }

        let (value, rest) = leading_number(trimmed)
            .ok_or_else(|| ParameterError::InvalidNumber(raw.to_string()))?;

        match rest.trim() {
            "" => Ok(Self::pixels(value)),
            "%" => Ok(Self::percent(value)),
            _ => Err(ParameterError::TrailingText(raw.to_string())),
        }
    }

    /// True if the value is measured in pixels, so its placement changes
    /// whenever the pixel length of the path does (e.g. on zoom).
    #[inline]
    pub fn is_in_pixels(&self) -> bool {
        matches!(self, PatternParameter::Absolute(_))
    }

    /// Normalize against the current total path length.
    ///
    /// Relative values pass through. Absolute values are divided by the
    /// length; a zero length yields a non-finite ratio, so zero-length
    /// paths must be rejected before calling this.
    #[inline]
    pub fn as_ratio(&self, total_length: f64) -> f64 {
        match *self {
            PatternParameter::Absolute(pixels) => pixels / total_length,
            PatternParameter::Relative(ratio) => ratio,
        }
    }
}

impl From<f64> for PatternParameter {
    fn from(value: f64) -> Self {
        Self::pixels(value)
    }
}

impl From<&str> for PatternParameter {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Offset, end offset and repeat interval of a pattern, as ratios of the
/// total path length.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProjectionRatios {
    pub offset: f64,
    pub end_offset: f64,
    pub repeat: f64,
}

/// Where along a path symbols go: first symbol at `offset`, then every
/// `repeat`, stopping `end_offset` before the end.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pattern {
    pub offset: PatternParameter,
    pub end_offset: PatternParameter,
    pub repeat: PatternParameter,
}

impl Pattern {
    pub fn new(
        offset: impl Into<PatternParameter>,
        end_offset: impl Into<PatternParameter>,
        repeat: impl Into<PatternParameter>,
    ) -> Self {
        Self {
            offset: offset.into(),
            end_offset: end_offset.into(),
            repeat: repeat.into(),
        }
    }

    /// True if any parameter is in pixels.
    pub fn is_in_pixels(&self) -> bool {
        self.offset.is_in_pixels() || self.end_offset.is_in_pixels() || self.repeat.is_in_pixels()
    }

    /// Normalize all three parameters against `total_length`.
    pub fn ratios(&self, total_length: f64) -> ProjectionRatios {
        ProjectionRatios {
            offset: self.offset.as_ratio(total_length),
            end_offset: self.end_offset.as_ratio(total_length),
            repeat: self.repeat.as_ratio(total_length),
        }
    }
}

/// Parse the numeric prefix of `s` (after leading whitespace), returning the
/// value and the unparsed remainder. Accepts an optional sign, digits with an
/// optional fractional part, and an optional exponent.
fn leading_number(s: &str) -> Option<(f64, &str)> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts if at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let value = s[..end].parse::<f64>().ok()?;
    Some((value, &s[end..]))
}

// ============================================================================
// TESTS
// ============================================================================
