//! Display list: render-ready representation of laid-out pages

use crate::document::{Color, Font, StyledText};
use crate::error::LayoutError;
use crate::footnotes::{FootnoteDirectory, SEPARATOR_RULE};
use crate::layout::{FontLibrary, LayoutResult, LineBreaker, LineLayout, PageInfo, PageSetup, PreparedText};
use crate::{Point, Rect};
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;
use uuid::Uuid;

/// Share of the content width the footnote rule spans
const RULE_WIDTH_RATIO: f32 = 1.0 / 3.0;

/// Unique identifier for a display item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayItemId {
    pub page_index: u32,
    pub line_index: u32,
    pub run_index: u32,
}

impl DisplayItemId {
    pub fn new(page_index: usize, line_index: usize, run_index: usize) -> Self {
        Self {
            page_index: page_index as u32,
            line_index: line_index as u32,
            run_index: run_index as u32,
        }
    }
}

/// A display item to render. Positions are baseline origins in page
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DisplayItem {
    /// Body text sharing one attribute run within a line
    #[serde(rename_all = "camelCase")]
    TextRun {
        id: DisplayItemId,
        position: Point,
        text: String,
        char_range: Range<usize>,
        font: Font,
        color: Option<Color>,
    },
    /// Rule separating body text from footnotes
    FootnoteRule { rect: Rect },
    /// Band where body text runs under the footnote block, on a page
    /// relaxation left overfull
    Overfull { rect: Rect },
    /// One line of a footnote block
    #[serde(rename_all = "camelCase")]
    FootnoteLine {
        footnote_id: Uuid,
        position: Point,
        text: String,
    },
}

impl DisplayItem {
    /// Get the ID of this item, if it has one
    pub fn id(&self) -> Option<DisplayItemId> {
        match self {
            DisplayItem::TextRun { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Display list for a single page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPage {
    pub page_index: usize,
    /// Where the page sits when pages are stacked vertically
    pub bounds: Rect,
    pub items: Vec<DisplayItem>,
}

impl DisplayPage {
    /// Plain text of the body runs, in order
    pub fn body_text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| match item {
                DisplayItem::TextRun { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Builds display pages from a layout result
pub struct PageRenderer {
    fonts: Arc<FontLibrary>,
}

impl PageRenderer {
    pub fn new(fonts: Arc<FontLibrary>) -> Self {
        Self { fonts }
    }

    /// Display lists for every page
    pub fn render(
        &self,
        text: &StyledText,
        result: &LayoutResult,
        setup: &PageSetup,
        footnotes: Option<&FootnoteDirectory>,
    ) -> Result<Vec<DisplayPage>, LayoutError> {
        self.render_pages(text, result, setup, footnotes, 0..result.page_count())
    }

    /// Display lists for the pages a viewport over the stacked pages touches
    pub fn render_viewport(
        &self,
        text: &StyledText,
        result: &LayoutResult,
        setup: &PageSetup,
        footnotes: Option<&FootnoteDirectory>,
        viewport: Rect,
    ) -> Result<Vec<DisplayPage>, LayoutError> {
        let page_height = setup.page_rect().height;
        if page_height <= 0.0 {
            return Ok(Vec::new());
        }
        let first_visible = (viewport.y / page_height).floor().max(0.0) as usize;
        let past_visible = ((viewport.y + viewport.height) / page_height).ceil().max(0.0) as usize;
        let end = past_visible.max(first_visible + 1).min(result.page_count());
        self.render_pages(text, result, setup, footnotes, first_visible.min(end)..end)
    }

    fn render_pages(
        &self,
        text: &StyledText,
        result: &LayoutResult,
        setup: &PageSetup,
        footnotes: Option<&FootnoteDirectory>,
        pages: Range<usize>,
    ) -> Result<Vec<DisplayPage>, LayoutError> {
        let prepared = PreparedText::new(text.text());
        let page_rect = setup.page_rect();
        let content = setup.content_rect();
        let breaker = LineBreaker::new(&self.fonts);

        result.pages[pages]
            .iter()
            .map(|page| {
                let mut items = Vec::new();
                let lines =
                    breaker.layout_range(text, &prepared, page.character_range.clone(), content.width)?;
                self.body_items(text, page, &lines, content, &mut items);
                if let Some(directory) = footnotes {
                    self.footnote_items(directory, page, &breaker, content, &mut items)?;
                }
                Ok(DisplayPage {
                    page_index: page.page_index,
                    bounds: Rect::new(
                        0.0,
                        page.page_index as f32 * page_rect.height,
                        page_rect.width,
                        page_rect.height,
                    ),
                    items,
                })
            })
            .collect()
    }

    fn body_items(
        &self,
        text: &StyledText,
        page: &PageInfo,
        lines: &[LineLayout],
        content: Rect,
        items: &mut Vec<DisplayItem>,
    ) {
        let mut y = content.y;
        for (line_index, line) in lines.iter().enumerate() {
            let mut x = content.x + line.x;
            let baseline = y + line.baseline;
            let mut run_index = 0;

            for run in text.runs() {
                let start = run.start.max(line.char_range.start);
                let end = run.end().min(line.char_range.end);
                if start >= end {
                    continue;
                }
                let segment = text.slice(start..end).trim_end_matches('\n');
                if segment.is_empty() {
                    continue;
                }
                let font = &run.attributes.font;
                let metrics = self.fonts.get(&font.family);

                items.push(DisplayItem::TextRun {
                    id: DisplayItemId::new(page.page_index, line_index, run_index),
                    position: Point::new(x, baseline),
                    text: segment.to_string(),
                    char_range: start..end,
                    font: font.clone(),
                    color: run.attributes.foreground,
                });
                x += segment.chars().map(|c| metrics.advance(c, font)).sum::<f32>();
                run_index += 1;
            }
            y += line.height;
        }
    }

    fn footnote_items(
        &self,
        directory: &FootnoteDirectory,
        page: &PageInfo,
        breaker: &LineBreaker<'_>,
        content: Rect,
        items: &mut Vec<DisplayItem>,
    ) -> Result<(), LayoutError> {
        let notes: Vec<_> = directory
            .active_footnotes()
            .iter()
            .filter(|footnote| page.footnote_ids.contains(&footnote.id))
            .collect();
        if notes.is_empty() {
            return Ok(());
        }

        let style = directory.style();
        let top = content.max_y() - page.footnote_height;
        if page.is_overfull() {
            log::debug!("Page {} is overfull; footnotes overlap body text", page.page_index);
            items.push(DisplayItem::Overfull {
                rect: Rect::new(
                    content.x,
                    top,
                    content.width,
                    (content.y + page.used_height - top).max(0.0),
                ),
            });
        }
        let rule_y = top + (style.separator_height - SEPARATOR_RULE).max(0.0) / 2.0;
        items.push(DisplayItem::FootnoteRule {
            rect: Rect::new(content.x, rule_y, content.width * RULE_WIDTH_RATIO, SEPARATOR_RULE),
        });

        let mut y = top + style.separator_height;
        for (idx, footnote) in notes.iter().enumerate() {
            if idx > 0 {
                y += style.spacing;
            }
            let display = directory.display_text(footnote);
            for line in breaker.layout(&display, content.width)? {
                items.push(DisplayItem::FootnoteLine {
                    footnote_id: footnote.id,
                    position: Point::new(content.x + line.x, y + line.baseline),
                    text: display.slice(line.char_range.clone()).trim_end().to_string(),
                });
                y += line.height;
            }
        }
        Ok(())
    }
}
