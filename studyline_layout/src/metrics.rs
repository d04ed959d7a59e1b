// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Text measurement capability injected by the host.
///
/// The layout engine never owns a font system. Hosts wrap their toolkit's
/// text measurement in this trait; headless callers use [`FixedAdvanceMetrics`].
pub trait FontMetrics {
    /// Advance width of `text` set at `size`.
    fn text_width(&self, text: &str, size: f64) -> f64;

    /// Baseline-to-baseline distance at `size`.
    fn line_height(&self, size: f64) -> f64 {
        size * 1.2
    }
}

impl<T: FontMetrics + ?Sized> FontMetrics for &T {
    fn text_width(&self, text: &str, size: f64) -> f64 {
        (**self).text_width(text, size)
    }

    fn line_height(&self, size: f64) -> f64 {
        (**self).line_height(size)
    }
}

/// Monospace-style metrics: every character advances by `advance * size`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedAdvanceMetrics {
    /// Advance per character, in ems.
    pub advance: f64,
}

impl Default for FixedAdvanceMetrics {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl FontMetrics for FixedAdvanceMetrics {
    #[allow(
        clippy::cast_precision_loss,
        reason = "character counts stay far below 2^52"
    )]
    fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * self.advance * size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_advance_scales_with_length_and_size() {
        let m = FixedAdvanceMetrics { advance: 0.5 };
        assert_eq!(m.text_width("abcd", 10.0), 20.0);
        assert_eq!(m.text_width("", 10.0), 0.0);
        assert_eq!((&m).text_width("ab", 11.0), 11.0);
        assert!((m.line_height(10.0) - 12.0).abs() < 1e-9);
    }
}
