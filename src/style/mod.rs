//! Named paragraph styles

mod resolver;

pub use resolver::StyleResolver;

use crate::document::{
    Alignment, AttributeSet, Font, ParagraphFormat, BODY_FONT_FAMILY, BODY_FONT_SIZE,
    BODY_STYLE_NAME,
};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A named style: the font and paragraph formatting it applies
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefinition {
    pub name: String,
    pub font: Font,
    pub paragraph: ParagraphFormat,
    /// Shipped with the application; never deletable
    pub is_system: bool,
}

impl StyleDefinition {
    pub fn new(name: impl Into<String>, font: Font, paragraph: ParagraphFormat) -> Self {
        Self {
            name: name.into(),
            font,
            paragraph,
            is_system: false,
        }
    }

    /// The universal fallback style
    pub fn body() -> Self {
        Self {
            is_system: true,
            ..Self::new(BODY_STYLE_NAME, Font::body(), ParagraphFormat::default())
        }
    }

    fn system(name: &str, font: Font, paragraph: ParagraphFormat) -> Self {
        Self {
            is_system: true,
            ..Self::new(name, font, paragraph)
        }
    }

    /// Concrete attributes for text set in this style
    pub fn attributes(&self) -> AttributeSet {
        AttributeSet::body()
            .with_font(self.font.clone())
            .with_paragraph(self.paragraph)
            .with_style(self.name.clone())
    }
}

/// Styles by name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    styles: BTreeMap<String, StyleDefinition>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stylesheet every project falls back to
    pub fn system_default() -> &'static Stylesheet {
        static DEFAULT: OnceLock<Stylesheet> = OnceLock::new();
        DEFAULT.get_or_init(build_system_default)
    }

    pub fn get(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    /// Add or replace a style, returning the one it replaced
    pub fn insert(&mut self, style: StyleDefinition) -> Option<StyleDefinition> {
        self.styles.insert(style.name.clone(), style)
    }

    pub fn remove(&mut self, name: &str) -> Option<StyleDefinition> {
        self.styles.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleDefinition> {
        self.styles.values()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn build_system_default() -> Stylesheet {
    let serif = |size: f32, bold: bool, italic: bool| {
        Font::resolve(BODY_FONT_FAMILY, size, bold, italic)
    };

    let mut sheet = Stylesheet::new();
    sheet.insert(StyleDefinition::body());
    sheet.insert(StyleDefinition::system(
        "Title",
        serif(28.0, true, false),
        ParagraphFormat {
            alignment: Alignment::Center,
            spacing_after: 24.0,
            ..Default::default()
        },
    ));
    for (name, size, italic, before) in [
        ("Heading 1", 22.0, false, 24.0),
        ("Heading 2", 19.0, false, 18.0),
        ("Heading 3", BODY_FONT_SIZE, true, 12.0),
    ] {
        sheet.insert(StyleDefinition::system(
            name,
            serif(size, true, italic),
            ParagraphFormat {
                spacing_before: before,
                spacing_after: 6.0,
                ..Default::default()
            },
        ));
    }
    sheet.insert(StyleDefinition::system(
        "Block Quote",
        serif(15.0, false, false),
        ParagraphFormat {
            first_line_head_indent: 36.0,
            head_indent: 36.0,
            tail_indent: -36.0,
            spacing_before: 6.0,
            spacing_after: 6.0,
            ..Default::default()
        },
    ));
    sheet.insert(StyleDefinition::system(
        "Footnote",
        serif(10.0, false, false),
        ParagraphFormat::default(),
    ));
    sheet.insert(StyleDefinition::system(
        "Caption",
        serif(12.0, false, true),
        ParagraphFormat {
            alignment: Alignment::Center,
            ..Default::default()
        },
    ));
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_default_catalogue() {
        let sheet = Stylesheet::system_default();
        let names: Vec<_> = sheet.names().collect();
        assert_eq!(
            names,
            vec![
                "Block Quote",
                "Body",
                "Caption",
                "Footnote",
                "Heading 1",
                "Heading 2",
                "Heading 3",
                "Title"
            ]
        );
        assert!(sheet.iter().all(|style| style.is_system));
    }

    #[test]
    fn test_body_attributes_match_unstyled_text() {
        assert_eq!(StyleDefinition::body().attributes(), AttributeSet::body());
    }

    #[test]
    fn test_heading_attributes() {
        let heading = Stylesheet::system_default().get("Heading 1").unwrap();
        let attrs = heading.attributes();
        assert_eq!(attrs.style_name.as_deref(), Some("Heading 1"));
        assert!(attrs.font.is_bold());
        assert_eq!(attrs.paragraph.spacing_before, 24.0);
    }
}
