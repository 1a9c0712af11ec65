//! Footnote directory: which footnotes a page owns and how tall they are

use crate::document::{AttributeSet, Font, Footnote, StyledText, Version, BODY_FONT_FAMILY};
use crate::error::LayoutError;
use crate::layout::{FontLibrary, LayoutResult, LineBreaker};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

/// Thickness of the rule above a page's footnotes
pub const SEPARATOR_RULE: f32 = 0.5;

/// Padding above and below the rule
pub const SEPARATOR_PADDING: f32 = 6.0;

/// How footnote blocks are set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FootnoteStyle {
    /// Face and size for footnote text; bold and italic runs keep their traits
    pub font: Font,
    /// Rule plus the padding around it
    pub separator_height: f32,
    /// Gap between consecutive footnotes
    pub spacing: f32,
}

impl Default for FootnoteStyle {
    fn default() -> Self {
        Self {
            font: Font::new(BODY_FONT_FAMILY, 10.0),
            separator_height: SEPARATOR_RULE + 2.0 * SEPARATOR_PADDING,
            spacing: 4.0,
        }
    }
}

/// Active footnotes of one version, sorted by anchor
#[derive(Debug, Clone)]
pub struct FootnoteDirectory {
    footnotes: Vec<Footnote>,
    style: FootnoteStyle,
    fonts: Arc<FontLibrary>,
}

impl FootnoteDirectory {
    /// Keeps only live footnotes, ordered by anchor offset
    pub fn new(footnotes: Vec<Footnote>, style: FootnoteStyle, fonts: Arc<FontLibrary>) -> Self {
        Self {
            footnotes: active_footnotes(footnotes),
            style,
            fonts,
        }
    }

    pub fn for_version(version: &Version, style: FootnoteStyle, fonts: Arc<FontLibrary>) -> Self {
        Self::new(version.footnotes.clone(), style, fonts)
    }

    pub fn active_footnotes(&self) -> &[Footnote] {
        &self.footnotes
    }

    pub fn style(&self) -> &FootnoteStyle {
        &self.style
    }

    pub fn is_empty(&self) -> bool {
        self.footnotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.footnotes.len()
    }

    /// Footnotes anchored in `range`; `include_end` also takes an anchor at
    /// `range.end`, which only the last page of a document should do
    pub fn in_range(&self, range: &Range<usize>, include_end: bool) -> Vec<&Footnote> {
        let first = self
            .footnotes
            .partition_point(|footnote| footnote.anchor_offset < range.start);
        self.footnotes[first..]
            .iter()
            .take_while(|footnote| {
                footnote.anchor_offset < range.end
                    || (include_end && footnote.anchor_offset == range.end)
            })
            .collect()
    }

    /// Footnotes anchored on a laid-out page
    pub fn footnotes_on_page(&self, page_index: usize, result: &LayoutResult) -> Vec<&Footnote> {
        match result.character_range(page_index) {
            Some(range) => self.in_range(&range, page_index + 1 == result.page_count()),
            None => Vec::new(),
        }
    }

    /// Height a block of footnotes needs at `width`: the separator, each
    /// numbered body wrapped in the footnote font, and the gaps between them.
    /// Zero for no footnotes.
    pub fn estimated_height(&self, footnotes: &[&Footnote], width: f32) -> Result<f32, LayoutError> {
        if footnotes.is_empty() {
            return Ok(0.0);
        }
        let breaker = LineBreaker::new(&self.fonts);
        let mut height = self.style.separator_height;
        for (idx, footnote) in footnotes.iter().enumerate() {
            if idx > 0 {
                height += self.style.spacing;
            }
            let body = self.display_text(footnote);
            height += breaker
                .layout(&body, width)?
                .iter()
                .map(|line| line.height)
                .sum::<f32>();
        }
        Ok(height)
    }

    /// A footnote as set on the page: its number, a space, then the body in
    /// the footnote font
    pub fn display_text(&self, footnote: &Footnote) -> StyledText {
        let base = AttributeSet::body().with_font(self.style.font.clone());
        let body = footnote.body.to_styled(&base);

        let mut display = StyledText::default();
        display.push(&format!("{} ", footnote.number), base);
        let restyled = body.map_attributes(|attrs| {
            let mut attrs = attrs.clone();
            attrs.font = self.style.font.with_traits(attrs.font.traits);
            attrs
        });
        for run in restyled.runs() {
            display.push(restyled.slice(run.range()), run.attributes.clone());
        }
        display
    }
}

/// Live footnotes sorted ascending by anchor offset
pub fn active_footnotes(footnotes: Vec<Footnote>) -> Vec<Footnote> {
    let mut active: Vec<Footnote> = footnotes
        .into_iter()
        .filter(|footnote| !footnote.deleted)
        .collect();
    active.sort_by_key(|footnote| footnote.anchor_offset);
    active
}
