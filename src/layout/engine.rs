//! Paginated layout engine
//!
//! Owns the text, the page setup and one cached [`LayoutResult`]. Whoever
//! changes the text or the setup goes through the setters, which invalidate
//! the cache in the same call.

use crate::document::StyledText;
use crate::error::LayoutError;
use crate::footnotes::{FootnoteDirectory, FootnoteStyle};
use crate::layout::font::FontLibrary;
use crate::layout::geometry::PageSetup;
use crate::layout::line_break::{LineBreakMeasurer, TextMeasurer};
use crate::layout::pagination::{paginate, relax, LayoutResult, PageInfo, Snapshot};
use crate::Size;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::ops::Range;
use std::sync::Arc;

/// Most relaxation passes any layout runs
pub const MAX_RELAXATION_ITERATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LayoutStatus {
    #[default]
    Invalid,
    Computing,
    Valid,
}

/// Tunables for pagination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Relaxation passes, clamped to `1..=MAX_RELAXATION_ITERATIONS`
    pub max_iterations: usize,
    /// Smallest body container a footnote reservation may leave
    pub min_container_height: f32,
    /// Footnote presentation used when building a directory for this layout
    pub footnote: FootnoteStyle,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_RELAXATION_ITERATIONS,
            min_container_height: 1.0,
            footnote: FootnoteStyle::default(),
        }
    }
}

impl LayoutConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn iteration_budget(&self) -> usize {
        self.max_iterations.clamp(1, MAX_RELAXATION_ITERATIONS)
    }
}

/// Layout engine for one document
pub struct PaginatedLayout<M: TextMeasurer = LineBreakMeasurer> {
    text: StyledText,
    setup: PageSetup,
    config: LayoutConfig,
    measurer: M,
    status: LayoutStatus,
    cached: Option<Arc<LayoutResult>>,
}

impl PaginatedLayout<LineBreakMeasurer> {
    pub fn new(text: StyledText, setup: PageSetup, fonts: Arc<FontLibrary>) -> Self {
        Self::with_measurer(text, setup, LineBreakMeasurer::new(fonts))
    }
}

impl<M: TextMeasurer> PaginatedLayout<M> {
    pub fn with_measurer(text: StyledText, setup: PageSetup, measurer: M) -> Self {
        Self {
            text,
            setup,
            config: LayoutConfig::default(),
            measurer,
            status: LayoutStatus::Invalid,
            cached: None,
        }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn status(&self) -> LayoutStatus {
        self.status
    }

    pub fn text(&self) -> &StyledText {
        &self.text
    }

    pub fn page_setup(&self) -> &PageSetup {
        &self.setup
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn set_text(&mut self, text: StyledText) {
        self.text = text;
        self.invalidate();
    }

    pub fn set_page_setup(&mut self, setup: PageSetup) {
        self.setup = setup;
        self.invalidate();
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.invalidate();
    }

    /// Drop the cached result; the next query needs `calculate_layout`
    pub fn invalidate(&mut self) {
        self.status = LayoutStatus::Invalid;
        self.cached = None;
        self.measurer.reset();
    }

    /// The last computed result, if still valid
    pub fn layout(&self) -> Option<Arc<LayoutResult>> {
        self.cached.clone()
    }

    /// Paginate the text, reserving footnote space when a directory is given.
    ///
    /// Always yields at least one page. Fails only when the measurement
    /// primitive does; the engine is then left `Invalid`.
    pub fn calculate_layout(
        &mut self,
        footnotes: Option<&FootnoteDirectory>,
    ) -> Result<Arc<LayoutResult>, LayoutError> {
        let started = current_millis();
        self.status = LayoutStatus::Computing;

        match self.compute(footnotes) {
            Ok(mut result) => {
                result.compute_time_ms = (current_millis() - started).max(0.0);
                log::info!(
                    "Laid out {} chars into {} page(s) in {:.2}ms ({} pass(es){})",
                    result.text_length,
                    result.pages.len(),
                    result.compute_time_ms,
                    result.iterations,
                    if result.converged { "" } else { ", not converged" }
                );
                let result = Arc::new(result);
                self.cached = Some(Arc::clone(&result));
                self.status = LayoutStatus::Valid;
                Ok(result)
            }
            Err(e) => {
                log::error!("Layout failed: {e}");
                self.cached = None;
                self.status = LayoutStatus::Invalid;
                Err(e)
            }
        }
    }

    fn compute(&mut self, footnotes: Option<&FootnoteDirectory>) -> Result<LayoutResult, LayoutError> {
        let page = self.setup.page_rect();
        let content = self.setup.content_rect().size();
        let text_length = self.text.len();

        if !content.is_usable() {
            log::warn!(
                "Page setup leaves no content area ({} x {}); returning one empty page",
                content.width,
                content.height
            );
            return Ok(LayoutResult {
                pages: vec![empty_page(content.height.max(0.0))],
                content_size: page.size(),
                compute_time_ms: 0.0,
                converged: true,
                iterations: 0,
                truncated: text_length > 0,
                text_length,
            });
        }

        let min_container = self.config.min_container_height;
        let directory = footnotes.filter(|directory| !directory.is_empty());

        let (snapshot, iterations, converged) = match directory {
            None => {
                let snapshot =
                    paginate(&mut self.measurer, &self.text, content, min_container, |_| Ok(0.0))?;
                (snapshot, 1, true)
            }
            Some(directory) => {
                let relaxation = relax(
                    &mut self.measurer,
                    &self.text,
                    content,
                    min_container,
                    self.config.iteration_budget(),
                    |range, is_last| {
                        let on_page = directory.in_range(range, is_last);
                        directory.estimated_height(&on_page, content.width)
                    },
                )?;
                if !relaxation.converged {
                    log::warn!(
                        "Footnote layout did not settle after {} passes; using the last one",
                        relaxation.iterations
                    );
                }
                (relaxation.snapshot, relaxation.iterations, relaxation.converged)
            }
        };

        let pages = finalize_pages(&snapshot, directory, content, min_container)?;
        for page in pages.iter().filter(|page| page.is_overfull()) {
            log::warn!(
                "Page {} overfull: {:.1}pt of text beside {:.1}pt of footnotes",
                page.page_index,
                page.used_height,
                page.footnote_height
            );
        }

        Ok(LayoutResult {
            content_size: Size::new(page.width, page.height * pages.len() as f32),
            pages,
            compute_time_ms: 0.0,
            converged,
            iterations,
            truncated: snapshot.truncated,
            text_length,
        })
    }

    pub fn page_count(&self) -> usize {
        self.cached.as_ref().map_or(0, |result| result.page_count())
    }

    pub fn page_index(&self, char_offset: usize) -> Option<usize> {
        self.cached.as_ref()?.page_index_for_offset(char_offset)
    }

    pub fn character_range(&self, page_index: usize) -> Option<Range<usize>> {
        self.cached.as_ref()?.character_range(page_index)
    }

    /// Byte range of a page's text, for renderers slicing the string
    pub fn glyph_range(&self, page_index: usize) -> Option<Range<usize>> {
        self.character_range(page_index)
            .map(|range| self.text.byte_range(range))
    }

    pub fn page_info(&self, page_index: usize) -> Option<&PageInfo> {
        self.cached.as_deref()?.page_info(page_index)
    }
}

/// Final pass: each page's footnotes and reservation from its own range
fn finalize_pages(
    snapshot: &Snapshot,
    directory: Option<&FootnoteDirectory>,
    content: Size,
    min_container: f32,
) -> Result<Vec<PageInfo>, LayoutError> {
    let last = snapshot.pages.len().saturating_sub(1);
    snapshot
        .pages
        .iter()
        .enumerate()
        .map(|(page_index, slice)| {
            let mut info = PageInfo {
                page_index,
                character_range: slice.range.clone(),
                used_height: slice.used_height,
                container_height: content.height,
                footnote_height: 0.0,
                footnote_ids: SmallVec::new(),
            };
            if let Some(directory) = directory {
                let on_page = directory.in_range(&slice.range, page_index == last);
                let height = directory.estimated_height(&on_page, content.width)?;
                if height > 0.0 {
                    info.container_height = (content.height - height).max(min_container);
                }
                info.footnote_height = height;
                info.footnote_ids = on_page.iter().map(|footnote| footnote.id).collect();
            }
            Ok(info)
        })
        .collect()
}

fn empty_page(container_height: f32) -> PageInfo {
    PageInfo {
        page_index: 0,
        character_range: 0..0,
        used_height: 0.0,
        container_height,
        footnote_height: 0.0,
        footnote_ids: SmallVec::new(),
    }
}

/// Get current timestamp in milliseconds
fn current_millis() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}
