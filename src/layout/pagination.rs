//! Pagination passes and their results
//!
//! A pass fills pages from the start of the text, shrinking each page's
//! container by a reservation. Footnote-aware layout runs passes until two
//! consecutive snapshots agree on every page boundary.

use crate::document::StyledText;
use crate::error::LayoutError;
use crate::layout::line_break::TextMeasurer;
use crate::Size;
use serde::Serialize;
use smallvec::SmallVec;
use std::ops::Range;
use uuid::Uuid;

/// Tolerance when comparing text height with its container
const OVERFULL_EPSILON: f32 = 0.01;

/// Layout information for a page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Page index (0-based)
    pub page_index: usize,
    pub character_range: Range<usize>,
    /// Height of the body text placed on the page
    pub used_height: f32,
    /// Content height left for body text after the footnote reservation
    pub container_height: f32,
    /// Height reserved for this page's footnotes
    pub footnote_height: f32,
    pub footnote_ids: SmallVec<[Uuid; 2]>,
}

impl PageInfo {
    /// The body text placed here does not fit beside the footnotes the page
    /// ends up owning. Only possible when relaxation did not converge.
    pub fn is_overfull(&self) -> bool {
        self.used_height > self.container_height + OVERFULL_EPSILON
    }
}

/// Pages for one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    /// Never empty
    pub pages: Vec<PageInfo>,
    /// All pages stacked vertically
    pub content_size: Size,
    pub compute_time_ms: f64,
    /// Consecutive passes agreed on every page boundary
    pub converged: bool,
    /// Pagination passes run
    pub iterations: usize,
    /// Pagination stopped before the end of the text
    pub truncated: bool,
    /// Length of the paginated text in characters
    pub text_length: usize,
}

impl LayoutResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page containing a character offset. The end-of-text offset maps to
    /// the last page.
    pub fn page_index_for_offset(&self, offset: usize) -> Option<usize> {
        if let Some(page) = self
            .pages
            .iter()
            .find(|page| page.character_range.contains(&offset))
        {
            return Some(page.page_index);
        }
        if offset == self.text_length {
            return self.pages.last().map(|page| page.page_index);
        }
        None
    }

    pub fn character_range(&self, page_index: usize) -> Option<Range<usize>> {
        self.page_info(page_index)
            .map(|page| page.character_range.clone())
    }

    pub fn page_info(&self, page_index: usize) -> Option<&PageInfo> {
        self.pages.get(page_index)
    }

    pub fn overfull_pages(&self) -> impl Iterator<Item = &PageInfo> {
        self.pages.iter().filter(|page| page.is_overfull())
    }
}

/// One page boundary from a single pass
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PageSlice {
    pub range: Range<usize>,
    pub used_height: f32,
    pub container_height: f32,
}

/// The immutable outcome of one pass
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Snapshot {
    /// Never empty
    pub pages: Vec<PageSlice>,
    pub truncated: bool,
}

impl Snapshot {
    pub fn same_boundaries(&self, other: &Snapshot) -> bool {
        self.pages.len() == other.pages.len()
            && self
                .pages
                .iter()
                .zip(&other.pages)
                .all(|(a, b)| a.range == b.range)
    }
}

/// Fill pages of `content` size, shrinking page `i` by `reservation(i)`.
pub(crate) fn paginate<M, R>(
    measurer: &mut M,
    text: &StyledText,
    content: Size,
    min_container_height: f32,
    mut reservation: R,
) -> Result<Snapshot, LayoutError>
where
    M: TextMeasurer + ?Sized,
    R: FnMut(usize) -> Result<f32, LayoutError>,
{
    let len = text.len();
    let mut pages: Vec<PageSlice> = Vec::new();
    let mut truncated = false;
    let mut cursor = 0;

    while cursor < len {
        let reserved = reservation(pages.len())?;
        let container_height = if reserved > 0.0 {
            (content.height - reserved).max(min_container_height)
        } else {
            content.height
        };

        let fit = measurer.fit(text, cursor, Size::new(content.width, container_height))?;
        if fit.char_range.end <= cursor {
            log::warn!(
                "Pagination made no progress at offset {cursor} of {len}; keeping {} page(s)",
                pages.len()
            );
            truncated = true;
            break;
        }

        cursor = fit.char_range.end;
        pages.push(PageSlice {
            range: fit.char_range,
            used_height: fit.used_height,
            container_height,
        });
    }

    if pages.is_empty() {
        pages.push(PageSlice {
            range: 0..0,
            used_height: 0.0,
            container_height: content.height,
        });
    }

    Ok(Snapshot { pages, truncated })
}

/// Outcome of bounded relaxation
#[derive(Debug, Clone)]
pub(crate) struct Relaxation {
    pub snapshot: Snapshot,
    pub iterations: usize,
    pub converged: bool,
}

/// Run passes until boundaries stop moving or `max_iterations` is spent.
///
/// The first pass reserves nothing. Each later pass reserves, for page `i`,
/// `reserve(range, is_last)` of the previous snapshot's page `i`.
pub(crate) fn relax<M, F>(
    measurer: &mut M,
    text: &StyledText,
    content: Size,
    min_container_height: f32,
    max_iterations: usize,
    mut reserve: F,
) -> Result<Relaxation, LayoutError>
where
    M: TextMeasurer + ?Sized,
    F: FnMut(&Range<usize>, bool) -> Result<f32, LayoutError>,
{
    let mut previous = paginate(measurer, text, content, min_container_height, |_| Ok(0.0))?;
    let mut iterations = 1;
    let mut converged = false;

    while iterations < max_iterations {
        let last_page = previous.pages.len().saturating_sub(1);
        let next = paginate(measurer, text, content, min_container_height, |page| {
            match previous.pages.get(page) {
                Some(slice) => reserve(&slice.range, page == last_page),
                None => Ok(0.0),
            }
        })?;
        iterations += 1;

        let settled = next.same_boundaries(&previous);
        log::debug!(
            "Relaxation pass {iterations}: {} page(s), settled: {settled}",
            next.pages.len()
        );
        previous = next;
        if settled {
            converged = true;
            break;
        }
    }

    Ok(Relaxation {
        snapshot: previous,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AttributeSet;
    use crate::layout::line_break::Fit;

    /// Ten characters per 10pt of container height
    struct FixedRate;

    impl TextMeasurer for FixedRate {
        fn fit(
            &mut self,
            text: &StyledText,
            start: usize,
            container: Size,
        ) -> Result<Fit, LayoutError> {
            let lines = (container.height / 10.0).floor().max(1.0) as usize;
            let end = (start + lines * 10).min(text.len());
            Ok(Fit {
                char_range: start..end,
                used_height: ((end - start) as f32 / 10.0).ceil() * 10.0,
                lines: Vec::new(),
            })
        }
    }

    struct Stalled;

    impl TextMeasurer for Stalled {
        fn fit(&mut self, _: &StyledText, start: usize, _: Size) -> Result<Fit, LayoutError> {
            Ok(Fit {
                char_range: start..start,
                ..Default::default()
            })
        }
    }

    fn text(len: usize) -> StyledText {
        StyledText::new("x".repeat(len), AttributeSet::body())
    }

    fn ranges(snapshot: &Snapshot) -> Vec<Range<usize>> {
        snapshot.pages.iter().map(|page| page.range.clone()).collect()
    }

    #[test]
    fn test_paginate_covers_text() {
        let snapshot =
            paginate(&mut FixedRate, &text(250), Size::new(100.0, 100.0), 1.0, |_| Ok(0.0)).unwrap();
        assert_eq!(ranges(&snapshot), vec![0..100, 100..200, 200..250]);
        assert_eq!(snapshot.pages[2].used_height, 50.0);
        assert!(!snapshot.truncated);
    }

    #[test]
    fn test_empty_text_yields_one_page() {
        let snapshot =
            paginate(&mut FixedRate, &text(0), Size::new(100.0, 100.0), 1.0, |_| Ok(0.0)).unwrap();
        assert_eq!(ranges(&snapshot), vec![0..0]);
    }

    #[test]
    fn test_reservation_shrinks_container() {
        let snapshot = paginate(&mut FixedRate, &text(250), Size::new(100.0, 100.0), 1.0, |page| {
            Ok(if page == 0 { 30.0 } else { 0.0 })
        })
        .unwrap();
        assert_eq!(ranges(&snapshot), vec![0..70, 70..170, 170..250]);
        assert_eq!(snapshot.pages[0].container_height, 70.0);
    }

    #[test]
    fn test_huge_reservation_keeps_minimum_container() {
        let snapshot = paginate(&mut FixedRate, &text(30), Size::new(100.0, 100.0), 1.0, |_| {
            Ok(500.0)
        })
        .unwrap();
        assert_eq!(snapshot.pages[0].container_height, 1.0);
        assert_eq!(ranges(&snapshot), vec![0..10, 10..20, 20..30]);
    }

    #[test]
    fn test_stalled_measurer_truncates() {
        let snapshot =
            paginate(&mut Stalled, &text(30), Size::new(100.0, 100.0), 1.0, |_| Ok(0.0)).unwrap();
        assert!(snapshot.truncated);
        assert_eq!(ranges(&snapshot), vec![0..0]);
    }

    #[test]
    fn test_relax_converges_on_stable_reservation() {
        // 40pt reserved for any page holding offset 150
        let relaxation = relax(&mut FixedRate, &text(300), Size::new(100.0, 100.0), 1.0, 5, |range, _| {
            Ok(if range.contains(&150) { 40.0 } else { 0.0 })
        })
        .unwrap();
        assert!(relaxation.converged);
        assert_eq!(relaxation.iterations, 3);
        assert_eq!(
            ranges(&relaxation.snapshot),
            vec![0..100, 100..160, 160..260, 260..300]
        );
    }

    #[test]
    fn test_relax_respects_iteration_cap() {
        // Reservation depends on page length parity, so boundaries keep moving
        let relaxation = relax(&mut FixedRate, &text(1000), Size::new(100.0, 100.0), 1.0, 5, |range, _| {
            Ok(if range.len() == 100 { 50.0 } else { 0.0 })
        })
        .unwrap();
        assert!(!relaxation.converged);
        assert_eq!(relaxation.iterations, 5);
    }

    #[test]
    fn test_page_lookup_sentinels() {
        let page = |index: usize, range: Range<usize>| PageInfo {
            page_index: index,
            character_range: range,
            used_height: 0.0,
            container_height: 0.0,
            footnote_height: 0.0,
            footnote_ids: SmallVec::new(),
        };
        let result = LayoutResult {
            pages: vec![page(0, 0..10), page(1, 10..15)],
            content_size: Size::new(100.0, 200.0),
            compute_time_ms: 0.0,
            converged: true,
            iterations: 1,
            truncated: false,
            text_length: 15,
        };
        assert_eq!(result.page_index_for_offset(9), Some(0));
        assert_eq!(result.page_index_for_offset(10), Some(1));
        assert_eq!(result.page_index_for_offset(15), Some(1));
        assert_eq!(result.page_index_for_offset(16), None);
        assert_eq!(result.character_range(2), None);
    }
}
