//! Styled-text model: plain content plus non-overlapping attribute runs

mod attachment;
mod attributes;
mod footnote;

pub use attachment::{
    Attachment, Caption, CommentAttachment, FootnoteAttachment, ImageAlignment, ImageAttachment,
    ATTACHMENT_CHAR,
};
pub use attributes::{
    Alignment, AttributeSet, Color, Font, FontTraits, ParagraphFormat, BODY_FONT_FAMILY,
    BODY_FONT_SIZE, BODY_STYLE_NAME,
};
pub use footnote::{Footnote, FootnoteBody, Version};

use std::ops::Range;

/// Characters between entries of the byte offset index
const BYTE_INDEX_STRIDE: usize = 64;

/// A contiguous character range sharing one attribute set.
/// Offsets count Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub start: usize,
    pub length: usize,
    pub attributes: AttributeSet,
}

impl Run {
    pub fn new(start: usize, length: usize, attributes: AttributeSet) -> Self {
        Self {
            start,
            length,
            attributes,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Plain text with attribute runs that partition `[0, len)`.
///
/// Every character has exactly one effective [`AttributeSet`]. Runs are kept
/// maximal: adjacent runs never carry equal attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledText {
    text: String,
    char_len: usize,
    runs: Vec<Run>,
    /// Byte offset of every `BYTE_INDEX_STRIDE`th character
    byte_index: Vec<usize>,
}

impl StyledText {
    /// Text with one attribute set across its whole length
    pub fn new(text: impl Into<String>, attributes: AttributeSet) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        let runs = if char_len > 0 {
            vec![Run::new(0, char_len, attributes)]
        } else {
            Vec::new()
        };
        let mut styled = Self {
            text,
            char_len,
            runs,
            byte_index: Vec::new(),
        };
        styled.index_bytes(0, 0);
        styled
    }

    /// Text in the body style
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, AttributeSet::body())
    }

    /// Build from explicit runs. Returns `None` unless the runs partition the
    /// text exactly, in order.
    pub fn from_runs(text: impl Into<String>, runs: Vec<Run>) -> Option<Self> {
        let text = text.into();
        let char_len = text.chars().count();
        let mut expected = 0;
        for run in &runs {
            if run.start != expected || run.length == 0 {
                return None;
            }
            expected = run.end();
        }
        if expected != char_len {
            return None;
        }
        let mut styled = Self {
            text,
            char_len,
            runs,
            byte_index: Vec::new(),
        };
        styled.index_bytes(0, 0);
        styled.coalesce();
        Some(styled)
    }

    /// Append text carrying `attributes`
    pub fn push(&mut self, text: &str, attributes: AttributeSet) {
        let added = text.chars().count();
        if added == 0 {
            return;
        }
        let from_byte = self.text.len();
        self.text.push_str(text);
        self.index_bytes(self.char_len, from_byte);
        match self.runs.last_mut() {
            Some(last) if last.attributes == attributes => last.length += added,
            _ => self.runs.push(Run::new(self.char_len, added, attributes)),
        }
        self.char_len += added;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Index of the run covering `offset`
    pub fn run_index_at(&self, offset: usize) -> Option<usize> {
        if offset >= self.char_len {
            return None;
        }
        let idx = self.runs.partition_point(|run| run.end() <= offset);
        (idx < self.runs.len()).then_some(idx)
    }

    /// Effective attributes at a character offset
    pub fn attributes_at(&self, offset: usize) -> Option<&AttributeSet> {
        self.run_index_at(offset).map(|idx| &self.runs[idx].attributes)
    }

    /// Byte offset of a character offset; offsets past the end clamp to the
    /// byte length
    pub fn byte_offset(&self, char_offset: usize) -> usize {
        if char_offset >= self.char_len {
            return self.text.len();
        }
        if self.text.len() == self.char_len {
            return char_offset;
        }
        let (from, skip) = match self.byte_index.get(char_offset / BYTE_INDEX_STRIDE) {
            Some(&byte) => (byte, char_offset % BYTE_INDEX_STRIDE),
            None => (0, char_offset),
        };
        self.text[from..]
            .char_indices()
            .nth(skip)
            .map_or(self.text.len(), |(idx, _)| from + idx)
    }

    /// Byte range of a character range
    pub fn byte_range(&self, range: Range<usize>) -> Range<usize> {
        let start = self.byte_offset(range.start);
        let end = self.byte_offset(range.end.max(range.start));
        start..end
    }

    /// Plain text of a character range
    pub fn slice(&self, range: Range<usize>) -> &str {
        &self.text[self.byte_range(range)]
    }

    /// Replace the attributes of a character range
    pub fn set_attributes(&mut self, range: Range<usize>, attributes: &AttributeSet) {
        self.update_attributes(range, |current| *current = attributes.clone());
    }

    /// Edit the attributes of every run inside a character range
    pub fn update_attributes<F>(&mut self, range: Range<usize>, mut update: F)
    where
        F: FnMut(&mut AttributeSet),
    {
        let start = range.start.min(self.char_len);
        let end = range.end.min(self.char_len);
        if start >= end {
            return;
        }
        let first = self.split_at(start);
        let last = self.split_at(end);
        for run in &mut self.runs[first..last] {
            update(&mut run.attributes);
        }
        self.coalesce_window(first.saturating_sub(1)..last + 1);
    }

    /// New text with every run's attributes transformed
    pub fn map_attributes<F>(&self, mut map: F) -> Self
    where
        F: FnMut(&AttributeSet) -> AttributeSet,
    {
        let mut mapped = Self {
            text: self.text.clone(),
            char_len: self.char_len,
            runs: self
                .runs
                .iter()
                .map(|run| Run::new(run.start, run.length, map(&run.attributes)))
                .collect(),
            byte_index: self.byte_index.clone(),
        };
        mapped.coalesce();
        mapped
    }

    /// Merge adjacent runs with equal attributes
    pub fn coalesce(&mut self) {
        self.coalesce_window(0..self.runs.len());
    }

    /// Merge equal neighbours among the runs at `window` indices only
    fn coalesce_window(&mut self, window: Range<usize>) {
        let end = window.end.min(self.runs.len());
        let start = window.start.min(end);
        let tail = self.runs.split_off(end);
        let mut merged: Vec<Run> = self.runs.split_off(start);
        merged.dedup_by(|run, prev| {
            let equal = prev.attributes == run.attributes;
            if equal {
                prev.length += run.length;
            }
            equal
        });
        self.runs.append(&mut merged);
        self.runs.extend(tail);
    }

    /// Split the run covering `offset` so a run boundary falls on it.
    /// Returns the index of the run starting at `offset`.
    fn split_at(&mut self, offset: usize) -> usize {
        let Some(idx) = self.run_index_at(offset) else {
            return self.runs.len();
        };
        let run = &mut self.runs[idx];
        if run.start == offset {
            return idx;
        }
        let tail_len = run.end() - offset;
        run.length = offset - run.start;
        let tail = Run::new(offset, tail_len, run.attributes.clone());
        self.runs.insert(idx + 1, tail);
        idx + 1
    }

    /// Extend the byte offset index over text appended at `from_char`
    fn index_bytes(&mut self, from_char: usize, from_byte: usize) {
        let appended = self.text[from_byte..].char_indices();
        for (n, (byte, _)) in appended.enumerate() {
            if (from_char + n) % BYTE_INDEX_STRIDE == 0 {
                self.byte_index.push(from_byte + byte);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> AttributeSet {
        AttributeSet::body().with_font(Font::resolve(BODY_FONT_FAMILY, BODY_FONT_SIZE, true, false))
    }

    #[test]
    fn test_empty_text_has_no_runs() {
        let text = StyledText::plain("");
        assert!(text.is_empty());
        assert!(text.runs().is_empty());
        assert_eq!(text.attributes_at(0), None);
    }

    #[test]
    fn test_set_attributes_splits_runs() {
        let mut text = StyledText::plain("Hello, World");
        text.set_attributes(7..12, &bold());

        assert_eq!(text.runs().len(), 2);
        assert_eq!(text.runs()[0].range(), 0..7);
        assert_eq!(text.runs()[1].range(), 7..12);
        assert!(text.attributes_at(8).map(|a| a.font.is_bold()).unwrap_or(false));
        assert!(!text.attributes_at(6).map(|a| a.font.is_bold()).unwrap_or(true));
    }

    #[test]
    fn test_middle_range_makes_three_runs() {
        let mut text = StyledText::plain("abcdefghij");
        text.set_attributes(3..6, &bold());
        let ranges: Vec<_> = text.runs().iter().map(Run::range).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_coalesce_restores_maximal_runs() {
        let mut text = StyledText::plain("abcdefghij");
        text.set_attributes(3..6, &bold());
        text.set_attributes(3..6, &AttributeSet::body());
        assert_eq!(text.runs().len(), 1);
    }

    #[test]
    fn test_char_offsets_are_not_bytes() {
        let mut text = StyledText::plain("héllo wörld");
        assert_eq!(text.len(), 11);
        assert_eq!(text.byte_offset(2), 3);
        assert_eq!(text.slice(6..11), "wörld");

        text.set_attributes(6..11, &bold());
        assert_eq!(text.runs()[1].range(), 6..11);
    }

    #[test]
    fn test_from_runs_validates_partition() {
        let runs = vec![
            Run::new(0, 3, AttributeSet::body()),
            Run::new(3, 2, bold()),
        ];
        assert!(StyledText::from_runs("abcde", runs.clone()).is_some());
        assert!(StyledText::from_runs("abcdef", runs).is_none());

        let gap = vec![Run::new(0, 2, AttributeSet::body()), Run::new(3, 2, bold())];
        assert!(StyledText::from_runs("abcde", gap).is_none());
    }

    #[test]
    fn test_push_appends_runs() {
        let mut text = StyledText::default();
        text.push("Plain ", AttributeSet::body());
        text.push("bold", bold());
        text.push("", AttributeSet::body());
        assert_eq!(text.text(), "Plain bold");
        assert_eq!(text.runs().len(), 2);
        assert_eq!(text.runs()[1].range(), 6..10);
    }

    #[test]
    fn test_push_merges_with_last_run() {
        let mut text = StyledText::default();
        for _ in 0..1000 {
            text.push("ab", AttributeSet::body());
            text.push("c", bold());
        }
        text.push("tail", bold());
        assert_eq!(text.len(), 3004);
        assert_eq!(text.runs().len(), 2000);
        assert_eq!(text.runs()[1999].range(), 2999..3004);
    }

    #[test]
    fn test_byte_offsets_across_index_entries() {
        let mut text = StyledText::default();
        for i in 0..300 {
            let piece = if i % 3 == 0 { "é😀x" } else { "ab" };
            text.push(piece, if i % 2 == 0 { bold() } else { AttributeSet::body() });
        }
        let expected: Vec<usize> = text.text().char_indices().map(|(idx, _)| idx).collect();
        assert_eq!(expected.len(), text.len());
        for (offset, byte) in expected.iter().enumerate() {
            assert_eq!(text.byte_offset(offset), *byte);
        }
        assert_eq!(text.byte_offset(text.len()), text.text().len());
        assert_eq!(text.slice(0..3), "é😀x");
    }

    #[test]
    fn test_update_merges_only_neighbours() {
        let mut text = StyledText::plain("abcdefghij");
        text.set_attributes(2..4, &bold());
        text.set_attributes(6..8, &bold());
        text.set_attributes(4..6, &bold());
        let ranges: Vec<_> = text.runs().iter().map(Run::range).collect();
        assert_eq!(ranges, vec![0..2, 2..8, 8..10]);
        assert!(text.attributes_at(5).unwrap().font.is_bold());
    }

    #[test]
    fn test_update_clamps_to_length() {
        let mut text = StyledText::plain("abc");
        text.update_attributes(1..99, |attrs| attrs.underline = 1);
        assert_eq!(text.runs().len(), 2);
        assert_eq!(text.runs()[1].range(), 1..3);
    }
}
