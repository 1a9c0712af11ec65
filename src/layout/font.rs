//! Font metrics for layout

use crate::document::{Font, BODY_FONT_FAMILY};
use rustc_hash::FxHashMap;

/// Metrics for one font family, in em units so one table serves every size
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Natural line height per em
    pub line_height: f32,
    /// Advance of ASCII characters (0-127) per em
    pub char_widths: Vec<f32>,
    /// Advance of any other character per em
    pub default_width: f32,
    /// Advance multiplier for bold faces
    pub bold_scale: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        // Roughly a book serif: 0.5em average advance, 1.2em leading
        let mut char_widths = vec![0.5; 128];
        char_widths[b' ' as usize] = 0.25;
        for c in b'A'..=b'Z' {
            char_widths[c as usize] = 0.65;
        }
        for c in [b'i', b'l', b'j', b'.', b',', b'\'', b'!', b':', b';'] {
            char_widths[c as usize] = 0.28;
        }
        for c in [b'm', b'w', b'M', b'W'] {
            char_widths[c as usize] = 0.85;
        }

        Self {
            line_height: 1.2,
            char_widths,
            default_width: 0.6,
            bold_scale: 1.05,
        }
    }
}

impl FontMetrics {
    pub fn new(line_height: f32, char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            line_height,
            char_widths,
            default_width,
            bold_scale: 1.0,
        }
    }

    /// Every character the same width
    pub fn monospace(width: f32, line_height: f32) -> Self {
        Self::new(line_height, vec![width; 128], width)
    }

    /// Width of a character per em
    pub fn width(&self, c: char) -> f32 {
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }

    /// Advance of a character at a concrete font
    pub fn advance(&self, c: char, font: &Font) -> f32 {
        let scale = if font.is_bold() { self.bold_scale } else { 1.0 };
        self.width(c) * font.size * scale
    }

    pub fn line_height_for(&self, font: &Font) -> f32 {
        self.line_height * font.size
    }
}

/// Metrics by family name, with a fallback for unknown families
#[derive(Debug, Clone)]
pub struct FontLibrary {
    fonts: FxHashMap<String, FontMetrics>,
    fallback: FontMetrics,
}

impl Default for FontLibrary {
    fn default() -> Self {
        let mut fonts = FxHashMap::default();
        fonts.insert(BODY_FONT_FAMILY.to_string(), FontMetrics::default());

        Self {
            fonts,
            fallback: FontMetrics::default(),
        }
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A library where every family uses the same metrics
    pub fn uniform(metrics: FontMetrics) -> Self {
        Self {
            fonts: FxHashMap::default(),
            fallback: metrics,
        }
    }

    /// Set metrics for a family
    pub fn set(&mut self, family: impl Into<String>, metrics: FontMetrics) {
        self.fonts.insert(family.into(), metrics);
    }

    /// Metrics for a family, falling back to the default metrics
    pub fn get(&self, family: &str) -> &FontMetrics {
        self.fonts.get(family).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_scales_with_size_and_weight() {
        let metrics = FontMetrics::default();
        let regular = Font::resolve("Georgia", 10.0, false, false);
        let bold = Font::resolve("Georgia", 10.0, true, false);
        assert_eq!(metrics.advance('a', &regular), 5.0);
        assert!(metrics.advance('a', &bold) > 5.0);
        assert!((metrics.advance('\u{e9}', &regular) - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_unknown_family_falls_back() {
        let mut library = FontLibrary::uniform(FontMetrics::monospace(0.5, 1.0));
        library.set("Courier", FontMetrics::monospace(0.6, 1.1));
        assert_eq!(library.get("Courier").default_width, 0.6);
        assert_eq!(library.get("Nowhere Sans").default_width, 0.5);
        assert!(!library.contains("Nowhere Sans"));
    }
}
