//! Footnotes and document versions

use crate::document::{AttributeSet, StyledText};
use std::borrow::Cow;
use uuid::Uuid;

/// Footnote body, stored either formatted or as plain text
#[derive(Debug, Clone, PartialEq)]
pub enum FootnoteBody {
    Plain(String),
    Styled(StyledText),
}

impl FootnoteBody {
    pub fn text(&self) -> &str {
        match self {
            FootnoteBody::Plain(text) => text,
            FootnoteBody::Styled(styled) => styled.text(),
        }
    }

    /// Styled form; plain bodies take `attributes` across their whole length
    pub fn to_styled(&self, attributes: &AttributeSet) -> Cow<'_, StyledText> {
        match self {
            FootnoteBody::Plain(text) => {
                Cow::Owned(StyledText::new(text.clone(), attributes.clone()))
            }
            FootnoteBody::Styled(styled) => Cow::Borrowed(styled),
        }
    }
}

/// A footnote anchored in a version's plain text
#[derive(Debug, Clone, PartialEq)]
pub struct Footnote {
    pub id: Uuid,
    /// Character offset of the footnote marker
    pub anchor_offset: usize,
    pub number: u32,
    pub body: FootnoteBody,
    /// Soft-deleted footnotes stay in the store but never lay out
    pub deleted: bool,
}

impl Footnote {
    pub fn new(anchor_offset: usize, number: u32, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            anchor_offset,
            number,
            body: FootnoteBody::Plain(body.into()),
            deleted: false,
        }
    }

    pub fn styled(anchor_offset: usize, number: u32, body: StyledText) -> Self {
        Self {
            id: Uuid::new_v4(),
            anchor_offset,
            number,
            body: FootnoteBody::Styled(body),
            deleted: false,
        }
    }
}

/// One saved state of a document: its content and the footnotes it owns
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    pub id: Uuid,
    pub content: StyledText,
    pub footnotes: Vec<Footnote>,
}

impl Version {
    pub fn new(content: StyledText) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            footnotes: Vec::new(),
        }
    }

    pub fn with_footnotes(mut self, footnotes: Vec<Footnote>) -> Self {
        self.footnotes = footnotes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_body_to_styled() {
        let body = FootnoteBody::Plain("See chapter 2.".to_string());
        let styled = body.to_styled(&AttributeSet::body());
        assert_eq!(styled.text(), "See chapter 2.");
        assert_eq!(styled.runs().len(), 1);
    }

    #[test]
    fn test_styled_body_is_borrowed() {
        let body = FootnoteBody::Styled(StyledText::plain("Ibid."));
        assert!(matches!(body.to_styled(&AttributeSet::body()), Cow::Borrowed(_)));
        assert_eq!(body.text(), "Ibid.");
    }
}
