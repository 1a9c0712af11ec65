//! Line breaking: the text-flow primitive pagination measures with

use crate::document::{Alignment, ParagraphFormat, StyledText};
use crate::error::LayoutError;
use crate::layout::font::FontLibrary;
use crate::Size;
use rustc_hash::FxHashMap;
use std::ops::Range;
use std::sync::Arc;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

/// Tolerance for accumulated line heights against a container
const HEIGHT_EPSILON: f32 = 0.01;

/// Ascent as a share of the natural line height
const ASCENT_RATIO: f32 = 0.8;

/// Layout result for a single line
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    /// Character range, including a trailing newline
    pub char_range: Range<usize>,
    /// Height including paragraph spacing on first and last lines
    pub height: f32,
    /// Baseline offset from top of line
    pub baseline: f32,
    /// Horizontal offset from indents and alignment
    pub x: f32,
    /// Width of visible content, trailing whitespace excluded
    pub width: f32,
}

/// Text that fit into one container
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fit {
    pub char_range: Range<usize>,
    pub used_height: f32,
    pub lines: Vec<LineLayout>,
}

/// Measures how much text fits into a container.
///
/// `fit` must place at least one character when `container.height > 0`
/// and text remains; otherwise pagination stops making progress.
pub trait TextMeasurer {
    fn fit(&mut self, text: &StyledText, start: usize, container: Size)
        -> Result<Fit, LayoutError>;

    /// Drop anything cached for the previous text
    fn reset(&mut self) {}
}

/// Per-character break and cluster data for one text
#[derive(Debug, Clone, Default)]
pub struct PreparedText {
    chars: Vec<char>,
    /// A line may break before this character; one entry past the end
    break_before: Vec<bool>,
    /// This character starts a grapheme cluster
    cluster_start: Vec<bool>,
}

impl PreparedText {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();

        let mut char_at_byte = FxHashMap::default();
        for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
            char_at_byte.insert(byte_idx, char_idx);
        }
        char_at_byte.insert(text.len(), n);

        let mut break_before = vec![false; n + 1];
        for (byte_idx, opportunity) in linebreaks(text) {
            if let Some(&char_idx) = char_at_byte.get(&byte_idx) {
                break_before[char_idx] = matches!(
                    opportunity,
                    BreakOpportunity::Allowed | BreakOpportunity::Mandatory
                );
            }
        }

        let mut cluster_start = vec![false; n];
        for (byte_idx, _) in text.grapheme_indices(true) {
            if let Some(&char_idx) = char_at_byte.get(&byte_idx) {
                if char_idx < n {
                    cluster_start[char_idx] = true;
                }
            }
        }

        Self {
            chars,
            break_before,
            cluster_start,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn starts_paragraph(&self, offset: usize) -> bool {
        offset == 0 || self.chars.get(offset - 1) == Some(&'\n')
    }
}

/// Line breaker
pub struct LineBreaker<'a> {
    fonts: &'a FontLibrary,
}

impl<'a> LineBreaker<'a> {
    pub fn new(fonts: &'a FontLibrary) -> Self {
        Self { fonts }
    }

    /// Layout a whole text into lines at a width
    pub fn layout(&self, text: &StyledText, width: f32) -> Result<Vec<LineLayout>, LayoutError> {
        let prepared = PreparedText::new(text.text());
        self.layout_range(text, &prepared, 0..prepared.len(), width)
    }

    /// Layout the lines covering `range`, which must start on a line start
    pub fn layout_range(
        &self,
        text: &StyledText,
        prepared: &PreparedText,
        range: Range<usize>,
        width: f32,
    ) -> Result<Vec<LineLayout>, LayoutError> {
        let mut lines = Vec::new();
        let mut cursor = range.start;
        while cursor < range.end.min(prepared.len()) {
            let line = self.line_at(text, prepared, cursor, width)?;
            cursor = line.char_range.end;
            lines.push(line);
        }
        Ok(lines)
    }

    /// Break one line starting at `start`
    pub fn line_at(
        &self,
        text: &StyledText,
        prepared: &PreparedText,
        start: usize,
        container_width: f32,
    ) -> Result<LineLayout, LayoutError> {
        let n = prepared.len();
        let first_line = prepared.starts_paragraph(start);
        let paragraph = text
            .attributes_at(start)
            .map(|attrs| attrs.paragraph)
            .unwrap_or_default();
        let max_width = paragraph.line_width(container_width, first_line);

        let runs = text.runs();
        let mut run_idx = text.run_index_at(start).unwrap_or(runs.len());
        let mut x: f32 = 0.0;
        let mut visible_width: f32 = 0.0;
        let mut last_break: Option<(usize, f32)> = None;
        let mut end = n;

        let mut i = start;
        while i < n {
            while run_idx < runs.len() && runs[run_idx].end() <= i {
                run_idx += 1;
            }
            let Some(run) = runs.get(run_idx) else {
                break;
            };
            let font = &run.attributes.font;
            if !font.size.is_finite() || font.size <= 0.0 {
                return Err(LayoutError::Measurement {
                    offset: i,
                    reason: format!("invalid font size {} for {}", font.size, font.family),
                });
            }
            let metrics = self.fonts.get(&font.family);

            let c = prepared.chars[i];
            if c == '\n' {
                end = i + 1;
                break;
            }
            if i > start && prepared.break_before[i] {
                last_break = Some((i, visible_width));
            }

            let advance = if !prepared.cluster_start[i] || (c.is_control() && c != '\t') {
                0.0
            } else if c == '\t' {
                metrics.advance(' ', font) * 4.0
            } else {
                metrics.advance(c, font)
            };
            if !advance.is_finite() {
                return Err(LayoutError::Measurement {
                    offset: i,
                    reason: format!("non-finite advance for {c:?} in {}", font.family),
                });
            }

            if c.is_whitespace() {
                // Trailing whitespace hangs past the edge
                x += advance;
                i += 1;
                continue;
            }

            if i > start && x + advance > max_width {
                end = match last_break {
                    Some((offset, width)) => {
                        visible_width = width;
                        offset
                    }
                    None => {
                        let offset = emergency_break(prepared, start, i);
                        visible_width = x;
                        offset
                    }
                };
                break;
            }

            x += advance;
            visible_width = x;
            i += 1;
        }

        let natural = self.natural_height(text, start..end)?;
        let ends_paragraph = end == n || prepared.chars.get(end - 1) == Some(&'\n');
        let before = if first_line {
            paragraph.spacing_before.max(0.0)
        } else {
            0.0
        };
        let after = if ends_paragraph {
            paragraph.spacing_after.max(0.0)
        } else {
            0.0
        };

        Ok(LineLayout {
            char_range: start..end,
            height: before + paragraph.adjust_line_height(natural) + after,
            baseline: before + natural * ASCENT_RATIO,
            x: line_offset(&paragraph, first_line, max_width, visible_width),
            width: visible_width,
        })
    }

    /// Tallest natural line height among the fonts covering `range`
    fn natural_height(&self, text: &StyledText, range: Range<usize>) -> Result<f32, LayoutError> {
        let mut natural: f32 = 0.0;
        for run in text.runs() {
            if run.end() <= range.start || run.start >= range.end {
                continue;
            }
            let height = self.fonts.get(&run.attributes.font.family).line_height_for(&run.attributes.font);
            if !height.is_finite() {
                return Err(LayoutError::Measurement {
                    offset: run.start.max(range.start),
                    reason: format!("non-finite line height for {}", run.attributes.font.family),
                });
            }
            natural = natural.max(height);
        }
        Ok(natural)
    }
}

/// Break inside a word: the last cluster boundary before `overflow`, or
/// after the first cluster when even that does not fit
fn emergency_break(prepared: &PreparedText, start: usize, overflow: usize) -> usize {
    if let Some(boundary) = (start + 1..=overflow)
        .rev()
        .find(|&idx| prepared.cluster_start[idx])
    {
        return boundary;
    }
    (overflow + 1..prepared.len())
        .find(|&idx| prepared.cluster_start[idx])
        .unwrap_or(prepared.len())
}

fn line_offset(paragraph: &ParagraphFormat, first_line: bool, max_width: f32, width: f32) -> f32 {
    let head = if first_line {
        paragraph.first_line_head_indent
    } else {
        paragraph.head_indent
    }
    .max(0.0);
    let slack = (max_width - width).max(0.0);
    match paragraph.alignment {
        Alignment::Center => head + slack / 2.0,
        Alignment::Right => head + slack,
        Alignment::Natural | Alignment::Left | Alignment::Justified => head,
    }
}

/// Line-breaking measurer with a per-text line cache
pub struct LineBreakMeasurer {
    fonts: Arc<FontLibrary>,
    prepared: Option<PreparedText>,
    /// Lines keyed by start offset and container width bits
    lines: FxHashMap<(usize, u32), LineLayout>,
}

impl LineBreakMeasurer {
    pub fn new(fonts: Arc<FontLibrary>) -> Self {
        Self {
            fonts,
            prepared: None,
            lines: FxHashMap::default(),
        }
    }

    pub fn fonts(&self) -> &Arc<FontLibrary> {
        &self.fonts
    }
}

impl TextMeasurer for LineBreakMeasurer {
    fn fit(
        &mut self,
        text: &StyledText,
        start: usize,
        container: Size,
    ) -> Result<Fit, LayoutError> {
        let stale = self
            .prepared
            .as_ref()
            .map_or(true, |prepared| prepared.len() != text.len());
        if stale {
            self.lines.clear();
            self.prepared = Some(PreparedText::new(text.text()));
        }
        let Some(prepared) = self.prepared.as_ref() else {
            return Ok(Fit::default());
        };

        let breaker = LineBreaker::new(&self.fonts);
        let mut fit = Fit {
            char_range: start..start,
            used_height: 0.0,
            lines: Vec::new(),
        };
        if container.height <= 0.0 {
            return Ok(fit);
        }

        let mut cursor = start;
        while cursor < prepared.len() {
            let key = (cursor, container.width.to_bits());
            let line = match self.lines.get(&key) {
                Some(line) => line.clone(),
                None => {
                    let line = breaker.line_at(text, prepared, cursor, container.width)?;
                    self.lines.insert(key, line.clone());
                    line
                }
            };
            // The first line always goes in, however tall
            if !fit.lines.is_empty()
                && fit.used_height + line.height > container.height + HEIGHT_EPSILON
            {
                break;
            }
            cursor = line.char_range.end;
            fit.used_height += line.height;
            fit.lines.push(line);
        }
        fit.char_range = start..cursor;
        Ok(fit)
    }

    fn reset(&mut self) {
        self.prepared = None;
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AttributeSet, Font, ParagraphFormat, BODY_FONT_FAMILY};
    use crate::layout::font::FontMetrics;

    /// 8pt text at 1em advance and 1.25em leading: 8pt per char, 10pt lines
    fn library() -> FontLibrary {
        FontLibrary::uniform(FontMetrics::monospace(1.0, 1.25))
    }

    fn styled(text: &str) -> StyledText {
        StyledText::new(
            text,
            AttributeSet::body().with_font(Font::resolve(BODY_FONT_FAMILY, 8.0, false, false)),
        )
    }

    fn ranges(lines: &[LineLayout]) -> Vec<Range<usize>> {
        lines.iter().map(|line| line.char_range.clone()).collect()
    }

    #[test]
    fn test_single_line() {
        let lib = library();
        let lines = LineBreaker::new(&lib).layout(&styled("Hello"), 100.0).unwrap();
        assert_eq!(ranges(&lines), vec![0..5]);
        assert_eq!(lines[0].width, 40.0);
        assert_eq!(lines[0].height, 10.0);
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        let lib = library();
        let lines = LineBreaker::new(&lib).layout(&styled(""), 100.0).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_line_wrap_at_word_boundary() {
        let lib = library();
        // 40pt = 5 chars per line
        let lines = LineBreaker::new(&lib).layout(&styled("Hello World"), 40.0).unwrap();
        assert_eq!(ranges(&lines), vec![0..6, 6..11]);
        assert_eq!(lines[0].width, 40.0);
    }

    #[test]
    fn test_explicit_newline() {
        let lib = library();
        let lines = LineBreaker::new(&lib)
            .layout(&styled("Hello\n\nWorld"), 1000.0)
            .unwrap();
        assert_eq!(ranges(&lines), vec![0..6, 6..7, 7..12]);
    }

    #[test]
    fn test_emergency_break_in_long_word() {
        let lib = library();
        let lines = LineBreaker::new(&lib)
            .layout(&styled("abcdefghijkl"), 40.0)
            .unwrap();
        assert_eq!(ranges(&lines), vec![0..5, 5..10, 10..12]);
    }

    #[test]
    fn test_cluster_is_never_split() {
        let lib = library();
        // e + combining acute is one cluster
        let lines = LineBreaker::new(&lib)
            .layout(&styled("abcde\u{301}fg"), 40.0)
            .unwrap();
        assert_eq!(ranges(&lines), vec![0..6, 6..8]);
    }

    #[test]
    fn test_paragraph_spacing_and_indent() {
        let lib = library();
        let text = StyledText::new(
            "aaaa aaaa\nbb",
            AttributeSet::body()
                .with_font(Font::resolve(BODY_FONT_FAMILY, 8.0, false, false))
                .with_paragraph(ParagraphFormat {
                    spacing_before: 3.0,
                    spacing_after: 5.0,
                    first_line_head_indent: 16.0,
                    ..Default::default()
                }),
        );
        // 56pt container: the indented first line holds 5 chars
        let lines = LineBreaker::new(&lib).layout(&text, 56.0).unwrap();
        assert_eq!(ranges(&lines), vec![0..5, 5..10, 10..12]);
        assert_eq!(lines[0].height, 13.0);
        assert_eq!(lines[0].x, 16.0);
        assert_eq!(lines[1].height, 15.0);
        assert_eq!(lines[1].x, 0.0);
        assert_eq!(lines[2].height, 18.0);
    }

    #[test]
    fn test_invalid_font_size_is_a_measurement_error() {
        let lib = library();
        let mut attrs = AttributeSet::body();
        attrs.font.size = f32::NAN;
        let text = StyledText::new("abc", attrs);
        let err = LineBreaker::new(&lib).layout(&text, 100.0).unwrap_err();
        assert!(matches!(err, LayoutError::Measurement { offset: 0, .. }));
    }

    #[test]
    fn test_fit_fills_container() {
        let mut measurer = LineBreakMeasurer::new(Arc::new(library()));
        let text = styled(&"abcd ".repeat(20));
        // 5 chars per line, 3 lines per container
        let fit = measurer.fit(&text, 0, Size::new(40.0, 30.0)).unwrap();
        assert_eq!(fit.char_range, 0..15);
        assert_eq!(fit.used_height, 30.0);
        assert_eq!(fit.lines.len(), 3);

        let next = measurer.fit(&text, 15, Size::new(40.0, 30.0)).unwrap();
        assert_eq!(next.char_range, 15..30);
    }

    #[test]
    fn test_fit_always_places_first_line() {
        let mut measurer = LineBreakMeasurer::new(Arc::new(library()));
        let text = styled("abcd abcd");
        let fit = measurer.fit(&text, 0, Size::new(40.0, 1.0)).unwrap();
        assert_eq!(fit.char_range, 0..5);

        let empty = measurer.fit(&text, 0, Size::new(40.0, 0.0)).unwrap();
        assert_eq!(empty.char_range, 0..0);
    }
}
