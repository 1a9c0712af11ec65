//! Character and paragraph attributes

use crate::document::Attachment;
use serde::{Deserialize, Serialize};

/// Family of the canonical body font
pub const BODY_FONT_FAMILY: &str = "Georgia";

/// Point size of the canonical body font
pub const BODY_FONT_SIZE: f32 = 16.0;

/// Token of the universal fallback style
pub const BODY_STYLE_NAME: &str = "Body";

/// Symbolic traits of a resolved font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FontTraits {
    pub bold: bool,
    pub italic: bool,
}

impl FontTraits {
    pub const REGULAR: Self = Self {
        bold: false,
        italic: false,
    };

    pub fn new(bold: bool, italic: bool) -> Self {
        Self { bold, italic }
    }

    /// Union of two trait sets
    pub fn union(self, other: Self) -> Self {
        Self {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
        }
    }

    fn suffix(&self) -> Option<&'static str> {
        match (self.bold, self.italic) {
            (false, false) => None,
            (true, false) => Some("Bold"),
            (false, true) => Some("Italic"),
            (true, true) => Some("BoldItalic"),
        }
    }
}

/// A resolved font: family, size and the traits baked into the face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub size: f32,
    pub traits: FontTraits,
}

impl Default for Font {
    fn default() -> Self {
        Self::body()
    }
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            traits: FontTraits::REGULAR,
        }
    }

    /// The canonical body font
    pub fn body() -> Self {
        Self::new(BODY_FONT_FAMILY, BODY_FONT_SIZE)
    }

    /// Trait-aware font construction.
    ///
    /// `token` may be a plain family ("Times") or a face name carrying its own
    /// traits ("Times-Bold"); requested traits are merged with the face's, so
    /// `resolve("Times", 12.0, true, false)` and `resolve("Times-Bold", 12.0,
    /// false, false)` produce the same font.
    pub fn resolve(token: &str, size: f32, bold: bool, italic: bool) -> Self {
        let (family, face_traits) = split_face_name(token);
        let family = if family.is_empty() {
            BODY_FONT_FAMILY
        } else {
            family
        };
        let size = if size.is_finite() && size > 0.0 {
            size
        } else {
            BODY_FONT_SIZE
        };
        Self {
            family: family.to_string(),
            size,
            traits: face_traits.union(FontTraits::new(bold, italic)),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.traits.bold
    }

    pub fn is_italic(&self) -> bool {
        self.traits.italic
    }

    /// Same family and traits at a different size
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Same family and size with different traits
    pub fn with_traits(&self, traits: FontTraits) -> Self {
        Self {
            traits,
            ..self.clone()
        }
    }

    /// Face name in `Family-Trait` form, e.g. `Times-BoldItalic`
    pub fn face_name(&self) -> String {
        match self.traits.suffix() {
            Some(suffix) => format!("{}-{}", self.family, suffix),
            None => self.family.clone(),
        }
    }
}

fn split_face_name(token: &str) -> (&str, FontTraits) {
    let token = token.trim();
    if let Some((family, face)) = token.rsplit_once('-') {
        let traits = match face {
            "Bold" | "Semibold" | "Heavy" | "Black" => Some(FontTraits::new(true, false)),
            "Italic" | "Oblique" => Some(FontTraits::new(false, true)),
            "BoldItalic" | "BoldOblique" => Some(FontTraits::new(true, true)),
            "Regular" | "Roman" | "Book" => Some(FontTraits::REGULAR),
            _ => None,
        };
        if let Some(traits) = traits {
            return (family, traits);
        }
    }
    (token, FontTraits::REGULAR)
}

/// An sRGB color with alpha, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Gray values (black and white included) follow the light/dark theme
    /// and are never stored as explicit colors.
    pub fn is_theme_adaptive(&self) -> bool {
        self.r == self.g && self.g == self.b
    }

    /// Near-white colors that vanish on a white export page
    pub fn is_light(&self) -> bool {
        self.r.min(self.g).min(self.b) >= 0xE6
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not opaque
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }
}

/// Paragraph text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Natural,
    Left,
    Center,
    Right,
    Justified,
}

/// Paragraph formatting. Zero means "not customized" for every field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphFormat {
    pub alignment: Alignment,
    pub line_height_multiple: f32,
    pub line_spacing: f32,
    pub spacing_before: f32,
    pub spacing_after: f32,
    pub first_line_head_indent: f32,
    pub head_indent: f32,
    pub tail_indent: f32,
    pub minimum_line_height: f32,
    pub maximum_line_height: f32,
}

impl ParagraphFormat {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the multiple and the min/max clamps to a natural line height
    pub fn adjust_line_height(&self, natural: f32) -> f32 {
        let mut height = natural;
        if self.line_height_multiple > 0.0 {
            height *= self.line_height_multiple;
        }
        if self.minimum_line_height > 0.0 {
            height = height.max(self.minimum_line_height);
        }
        if self.maximum_line_height > 0.0 {
            height = height.min(self.maximum_line_height);
        }
        height + self.line_spacing.max(0.0)
    }

    /// Usable line width after indents. A positive tail indent is measured
    /// from the leading edge, zero or negative from the trailing edge.
    pub fn line_width(&self, container_width: f32, first_line: bool) -> f32 {
        let head = if first_line {
            self.first_line_head_indent
        } else {
            self.head_indent
        };
        let trailing = if self.tail_indent > 0.0 {
            self.tail_indent.min(container_width)
        } else {
            container_width + self.tail_indent
        };
        (trailing - head.max(0.0)).max(1.0)
    }
}

/// The effective attributes of one run of characters
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSet {
    pub font: Font,
    /// Underline weight; zero means none
    pub underline: i32,
    /// Strikethrough weight; zero means none
    pub strikethrough: i32,
    /// `None` follows the current theme's default text color
    pub foreground: Option<Color>,
    pub paragraph: ParagraphFormat,
    pub style_name: Option<String>,
    pub attachment: Option<Attachment>,
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::body()
    }
}

impl AttributeSet {
    /// Body-style attributes applied to text without stored formatting
    pub fn body() -> Self {
        Self {
            font: Font::body(),
            underline: 0,
            strikethrough: 0,
            foreground: None,
            paragraph: ParagraphFormat::default(),
            style_name: Some(BODY_STYLE_NAME.to_string()),
            attachment: None,
        }
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn with_paragraph(mut self, paragraph: ParagraphFormat) -> Self {
        self.paragraph = paragraph;
        self
    }

    pub fn with_style(mut self, name: impl Into<String>) -> Self {
        self.style_name = Some(name.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_aware_font_resolution() {
        let from_family = Font::resolve("Times", 12.0, true, false);
        let from_face = Font::resolve("Times-Bold", 12.0, false, false);
        assert_eq!(from_family, from_face);
        assert_eq!(from_family.face_name(), "Times-Bold");

        let both = Font::resolve("Times-Italic", 12.0, true, false);
        assert_eq!(both.face_name(), "Times-BoldItalic");
    }

    #[test]
    fn test_font_resolution_keeps_hyphenated_families() {
        let font = Font::resolve("Noto-Serif", 11.0, false, false);
        assert_eq!(font.family, "Noto-Serif");
        assert_eq!(font.traits, FontTraits::REGULAR);
    }

    #[test]
    fn test_font_resolution_rejects_bad_size() {
        let font = Font::resolve("", f32::NAN, false, false);
        assert_eq!(font.family, BODY_FONT_FAMILY);
        assert_eq!(font.size, BODY_FONT_SIZE);
    }

    #[test]
    fn test_gray_colors_are_theme_adaptive() {
        assert!(Color::BLACK.is_theme_adaptive());
        assert!(Color::WHITE.is_theme_adaptive());
        assert!(Color::rgb(0x80, 0x80, 0x80).is_theme_adaptive());
        assert!(!Color::rgb(0x80, 0x80, 0x81).is_theme_adaptive());
    }

    #[test]
    fn test_color_hex() {
        let red = Color::rgb(0xCC, 0x11, 0x00);
        assert_eq!(red.to_hex(), "#CC1100");
        assert_eq!(Color::from_hex("#CC1100"), Some(red));
        assert_eq!(Color::from_hex("cc110080").map(|c| c.a), Some(0x80));
        assert_eq!(Color::from_hex("#12"), None);
        assert_eq!(Color::from_hex("#ZZ1100"), None);
    }

    #[test]
    fn test_paragraph_line_height() {
        let format = ParagraphFormat {
            line_height_multiple: 1.5,
            maximum_line_height: 20.0,
            ..Default::default()
        };
        assert_eq!(format.adjust_line_height(10.0), 15.0);
        assert_eq!(format.adjust_line_height(16.0), 20.0);
        assert_eq!(ParagraphFormat::default().adjust_line_height(12.0), 12.0);
    }

    #[test]
    fn test_paragraph_line_width() {
        let format = ParagraphFormat {
            first_line_head_indent: 36.0,
            head_indent: 0.0,
            tail_indent: -18.0,
            ..Default::default()
        };
        assert_eq!(format.line_width(468.0, true), 414.0);
        assert_eq!(format.line_width(468.0, false), 450.0);
    }
}
