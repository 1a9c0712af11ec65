//! RTF interchange bridge
//!
//! The writer emits a small, regular subset: a font table, a color table,
//! then one `\pard` per paragraph followed by one group per run. The reader
//! accepts general RTF, ignoring destinations it has no use for.

use crate::codec::strip_adaptive_colors;
use crate::document::{
    Alignment, AttributeSet, Color, Font, ParagraphFormat, StyledText, BODY_FONT_FAMILY,
};
use crate::error::ConvertError;
use rustc_hash::FxHashMap;
use std::fmt::Write as _;

/// Size correction for text authored by the predecessor desktop application
pub const LEGACY_FONT_SCALE: f32 = 1.8;

const NBSP: char = '\u{00A0}';

fn twips(points: f32) -> i32 {
    (points * 20.0).round() as i32
}

/// Serialize styled text as RTF
pub fn to_rtf(text: &StyledText) -> Result<Vec<u8>, ConvertError> {
    let mut fonts: Vec<&str> = Vec::new();
    let mut colors: Vec<Color> = Vec::new();
    for run in text.runs() {
        let font = &run.attributes.font;
        if !font.size.is_finite() || font.size <= 0.0 {
            return Err(ConvertError::Unrepresentable(format!(
                "font size {} at offset {}",
                font.size, run.start
            )));
        }
        if !fonts.contains(&font.family.as_str()) {
            fonts.push(&font.family);
        }
        if let Some(color) = run.attributes.foreground {
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
    }

    let mut out = String::with_capacity(text.text().len() * 2 + 256);
    out.push_str("{\\rtf1\\ansi\\ansicpg1252\\uc0\\deff0\n{\\fonttbl");
    for (idx, family) in fonts.iter().enumerate() {
        let _ = write!(out, "{{\\f{idx}\\fnil ");
        escape_into(&mut out, family);
        out.push_str(";}");
    }
    out.push_str("}\n{\\colortbl;");
    for color in &colors {
        let _ = write!(out, "\\red{}\\green{}\\blue{};", color.r, color.g, color.b);
    }
    out.push_str("}\n");

    let mut at_paragraph_start = true;
    for run in text.runs() {
        let attrs = &run.attributes;
        let font_idx = fonts
            .iter()
            .position(|family| *family == attrs.font.family)
            .unwrap_or(0);
        let color_idx = attrs
            .foreground
            .and_then(|color| colors.iter().position(|c| *c == color))
            .map(|idx| idx + 1)
            .unwrap_or(0);

        let run_text = text.slice(run.range());
        let mut segments = run_text.split('\n').peekable();
        while let Some(segment) = segments.next() {
            let ends_paragraph = segments.peek().is_some();
            if at_paragraph_start && (ends_paragraph || !segment.is_empty()) {
                write_paragraph(&mut out, &attrs.paragraph);
                at_paragraph_start = false;
            }
            if !segment.is_empty() {
                out.push('{');
                let _ = write!(out, "\\f{font_idx}\\fs{}", (attrs.font.size * 2.0).round() as i32);
                if attrs.font.is_bold() {
                    out.push_str("\\b");
                }
                if attrs.font.is_italic() {
                    out.push_str("\\i");
                }
                match attrs.underline {
                    0 => {}
                    1 => out.push_str("\\ul"),
                    _ => out.push_str("\\ulth"),
                }
                if attrs.strikethrough != 0 {
                    out.push_str("\\strike");
                }
                if color_idx > 0 {
                    let _ = write!(out, "\\cf{color_idx}");
                }
                out.push(' ');
                escape_into(&mut out, segment);
                out.push('}');
            }
            if ends_paragraph {
                out.push_str("\\par\n");
                at_paragraph_start = true;
            }
        }
    }
    out.push('}');
    Ok(out.into_bytes())
}

fn write_paragraph(out: &mut String, format: &ParagraphFormat) {
    out.push_str("\\pard");
    match format.alignment {
        Alignment::Natural => {}
        Alignment::Left => out.push_str("\\ql"),
        Alignment::Center => out.push_str("\\qc"),
        Alignment::Right => out.push_str("\\qr"),
        Alignment::Justified => out.push_str("\\qj"),
    }
    if format.head_indent != 0.0 {
        let _ = write!(out, "\\li{}", twips(format.head_indent));
    }
    if format.first_line_head_indent != format.head_indent {
        let _ = write!(
            out,
            "\\fi{}",
            twips(format.first_line_head_indent - format.head_indent)
        );
    }
    if format.tail_indent < 0.0 {
        let _ = write!(out, "\\ri{}", twips(-format.tail_indent));
    }
    if format.spacing_before != 0.0 {
        let _ = write!(out, "\\sb{}", twips(format.spacing_before));
    }
    if format.spacing_after != 0.0 {
        let _ = write!(out, "\\sa{}", twips(format.spacing_after));
    }
    if format.line_height_multiple > 0.0 {
        let _ = write!(out, "\\sl{}\\slmult1", (format.line_height_multiple * 240.0).round() as i32);
    } else if format.minimum_line_height > 0.0 {
        let _ = write!(out, "\\sl{}\\slmult0", twips(format.minimum_line_height));
    }
    out.push(' ');
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\t' => out.push_str("\\tab "),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{} ", *unit as i16);
                }
            }
        }
    }
}

/// Where text inside the current group goes
#[derive(Debug, Clone, Copy, PartialEq)]
enum Destination {
    Text,
    FontTable,
    ColorTable,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct ParagraphState {
    alignment: Alignment,
    left: i32,
    first: i32,
    right: i32,
    before: i32,
    after: i32,
    line: i32,
    line_multiple: bool,
}

impl ParagraphState {
    fn format(&self) -> ParagraphFormat {
        let mut format = ParagraphFormat {
            alignment: self.alignment,
            head_indent: self.left as f32 / 20.0,
            first_line_head_indent: (self.left + self.first) as f32 / 20.0,
            tail_indent: -(self.right as f32) / 20.0,
            spacing_before: self.before as f32 / 20.0,
            spacing_after: self.after as f32 / 20.0,
            ..Default::default()
        };
        if self.line_multiple && self.line > 0 {
            format.line_height_multiple = self.line as f32 / 240.0;
        } else if self.line > 0 {
            format.minimum_line_height = self.line as f32 / 20.0;
        } else if self.line < 0 {
            format.minimum_line_height = -self.line as f32 / 20.0;
            format.maximum_line_height = format.minimum_line_height;
        }
        format
    }
}

#[derive(Debug, Clone)]
struct GroupState {
    destination: Destination,
    font: i32,
    half_points: i32,
    bold: bool,
    italic: bool,
    underline: i32,
    strike: bool,
    color: usize,
    skip_per_unicode: usize,
    paragraph: ParagraphState,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            destination: Destination::Text,
            font: 0,
            half_points: 24,
            bold: false,
            italic: false,
            underline: 0,
            strike: false,
            color: 0,
            skip_per_unicode: 1,
            paragraph: ParagraphState::default(),
        }
    }
}

impl GroupState {
    fn reset_character(&mut self) {
        let defaults = Self::default();
        self.font = defaults.font;
        self.half_points = defaults.half_points;
        self.bold = false;
        self.italic = false;
        self.underline = 0;
        self.strike = false;
        self.color = 0;
    }
}

struct RtfReader<'a> {
    input: &'a [u8],
    pos: usize,
    stack: Vec<GroupState>,
    state: GroupState,
    fonts: FxHashMap<i32, String>,
    font_name: String,
    colors: Vec<Option<Color>>,
    color: (u8, u8, u8, bool),
    skip: usize,
    high_surrogate: Option<u16>,
    output: StyledText,
    pending: String,
    pending_attrs: AttributeSet,
    dirty: bool,
}

impl<'a> RtfReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::new(),
            state: GroupState::default(),
            fonts: FxHashMap::default(),
            font_name: String::new(),
            colors: Vec::new(),
            color: (0, 0, 0, false),
            skip: 0,
            high_surrogate: None,
            output: StyledText::default(),
            pending: String::new(),
            pending_attrs: AttributeSet::body(),
            dirty: true,
        }
    }

    fn read(mut self) -> Result<StyledText, ConvertError> {
        let mut opened = false;
        while self.pos < self.input.len() {
            let byte = self.input[self.pos];
            self.pos += 1;
            match byte {
                b'{' => {
                    self.stack.push(self.state.clone());
                    opened = true;
                }
                b'}' => {
                    self.close_group()?;
                    if self.stack.is_empty() && opened {
                        break;
                    }
                }
                b'\\' => self.control(),
                b'\r' | b'\n' => {}
                byte => {
                    if self.stack.is_empty() {
                        continue;
                    }
                    self.text_char(decode_cp1252(byte));
                }
            }
        }
        if !self.stack.is_empty() {
            return Err(ConvertError::Unbalanced(self.input.len()));
        }
        self.flush();
        Ok(self.output)
    }

    fn close_group(&mut self) -> Result<(), ConvertError> {
        let Some(outer) = self.stack.pop() else {
            return Err(ConvertError::Unbalanced(self.pos - 1));
        };
        if self.state.destination == Destination::FontTable {
            self.finish_font_name();
        }
        self.state = outer;
        self.dirty = true;
        Ok(())
    }

    fn finish_font_name(&mut self) {
        let name = self.font_name.trim().trim_end_matches(';').trim().to_string();
        if !name.is_empty() {
            self.fonts.insert(self.state.font, name);
        }
        self.font_name.clear();
    }

    fn control(&mut self) {
        let Some(&next) = self.input.get(self.pos) else {
            return;
        };
        if !next.is_ascii_alphabetic() {
            self.pos += 1;
            match next {
                b'\\' | b'{' | b'}' => self.text_char(next as char),
                b'\'' => {
                    let hex = self.input.get(self.pos..self.pos + 2);
                    self.pos += 2;
                    let byte = hex
                        .and_then(|h| std::str::from_utf8(h).ok())
                        .and_then(|h| u8::from_str_radix(h, 16).ok());
                    if let Some(byte) = byte {
                        self.text_char(decode_cp1252(byte));
                    }
                }
                b'~' => self.text_char(NBSP),
                b'_' => self.text_char('\u{2011}'),
                b'*' => self.state.destination = Destination::Skip,
                b'\n' | b'\r' => self.text_char('\n'),
                _ => {}
            }
            return;
        }

        let start = self.pos;
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_alphabetic() {
            self.pos += 1;
        }
        let word = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();

        let param_start = self.pos;
        if self.input.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let param = std::str::from_utf8(&self.input[param_start..self.pos])
            .ok()
            .and_then(|p| p.parse::<i32>().ok());
        if self.input.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }

        self.keyword(&word, param);
    }

    fn keyword(&mut self, word: &str, param: Option<i32>) {
        let on = param.map_or(true, |p| p != 0);
        let value = param.unwrap_or(0);
        let state = &mut self.state;
        match word {
            "fonttbl" => state.destination = Destination::FontTable,
            "colortbl" => state.destination = Destination::ColorTable,
            "stylesheet" | "info" | "pict" | "header" | "headerl" | "headerr" | "footer"
            | "footerl" | "footerr" | "footnote" | "listtable" | "listoverridetable"
            | "fldinst" | "object" | "themedata" | "datastore" | "latentstyles" => {
                state.destination = Destination::Skip;
            }
            "f" if state.destination == Destination::FontTable => {
                self.finish_font_name();
                self.state.font = value;
            }
            "f" => state.font = value,
            "fs" => state.half_points = if value > 0 { value } else { 24 },
            "b" => state.bold = on,
            "i" => state.italic = on,
            "ul" | "uld" | "uldb" | "ulw" | "uldash" => state.underline = i32::from(on),
            "ulth" => state.underline = if on { 2 } else { 0 },
            "ulnone" => state.underline = 0,
            "strike" => state.strike = on,
            "cf" => state.color = value.max(0) as usize,
            "plain" => state.reset_character(),
            "pard" => state.paragraph = ParagraphState::default(),
            "ql" => state.paragraph.alignment = Alignment::Left,
            "qc" => state.paragraph.alignment = Alignment::Center,
            "qr" => state.paragraph.alignment = Alignment::Right,
            "qj" => state.paragraph.alignment = Alignment::Justified,
            "li" => state.paragraph.left = value,
            "fi" => state.paragraph.first = value,
            "ri" => state.paragraph.right = value,
            "sb" => state.paragraph.before = value,
            "sa" => state.paragraph.after = value,
            "sl" => state.paragraph.line = value,
            "slmult" => state.paragraph.line_multiple = on,
            "uc" => state.skip_per_unicode = value.max(0) as usize,
            "red" => self.color = (value.clamp(0, 255) as u8, self.color.1, self.color.2, true),
            "green" => self.color = (self.color.0, value.clamp(0, 255) as u8, self.color.2, true),
            "blue" => self.color = (self.color.0, self.color.1, value.clamp(0, 255) as u8, true),
            "par" => self.text_char('\n'),
            "line" => self.text_char('\u{2028}'),
            "tab" => self.text_char('\t'),
            "emdash" => self.text_char('\u{2014}'),
            "endash" => self.text_char('\u{2013}'),
            "bullet" => self.text_char('\u{2022}'),
            "lquote" => self.text_char('\u{2018}'),
            "rquote" => self.text_char('\u{2019}'),
            "ldblquote" => self.text_char('\u{201C}'),
            "rdblquote" => self.text_char('\u{201D}'),
            "emspace" => self.text_char('\u{2003}'),
            "enspace" => self.text_char('\u{2002}'),
            "u" => {
                self.unicode_unit(value as i16 as u16);
                self.skip = self.state.skip_per_unicode;
                return;
            }
            _ => return,
        }
        self.dirty = true;
    }

    fn unicode_unit(&mut self, unit: u16) {
        match unit {
            0xD800..=0xDBFF => self.high_surrogate = Some(unit),
            0xDC00..=0xDFFF => {
                if let Some(high) = self.high_surrogate.take() {
                    let decoded = char::decode_utf16([high, unit])
                        .next()
                        .and_then(|c| c.ok());
                    if let Some(c) = decoded {
                        self.emit(c);
                    }
                }
            }
            unit => {
                self.high_surrogate = None;
                if let Some(c) = char::from_u32(u32::from(unit)) {
                    self.emit(c);
                }
            }
        }
    }

    /// A character from the input stream, subject to `\u` fallback skipping
    fn text_char(&mut self, c: char) {
        if self.skip > 0 {
            self.skip -= 1;
            return;
        }
        self.emit(c);
    }

    fn emit(&mut self, c: char) {
        match self.state.destination {
            Destination::Text => {
                if self.dirty {
                    let attrs = self.attributes();
                    if attrs != self.pending_attrs {
                        self.flush();
                        self.pending_attrs = attrs;
                    }
                    self.dirty = false;
                }
                self.pending.push(c);
            }
            Destination::FontTable => {
                if c == ';' {
                    self.finish_font_name();
                } else {
                    self.font_name.push(c);
                }
            }
            Destination::ColorTable => {
                if c == ';' {
                    let (r, g, b, set) = self.color;
                    self.colors.push(set.then(|| Color::rgb(r, g, b)));
                    self.color = (0, 0, 0, false);
                }
            }
            Destination::Skip => {}
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.output.push(&text, self.pending_attrs.clone());
        }
    }

    fn attributes(&self) -> AttributeSet {
        let state = &self.state;
        let family = self
            .fonts
            .get(&state.font)
            .map(String::as_str)
            .unwrap_or(BODY_FONT_FAMILY);
        let mut attrs = AttributeSet::body();
        attrs.font = Font::resolve(family, state.half_points as f32 / 2.0, state.bold, state.italic);
        attrs.underline = state.underline;
        attrs.strikethrough = i32::from(state.strike);
        attrs.foreground = self.colors.get(state.color).copied().flatten();
        attrs.paragraph = state.paragraph.format();
        attrs
    }
}

fn decode_cp1252(byte: u8) -> char {
    const HIGH: [char; 32] = [
        '\u{20AC}', '\u{FFFD}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}',
        '\u{2021}', '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{FFFD}',
        '\u{017D}', '\u{FFFD}', '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
        '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}',
        '\u{0153}', '\u{FFFD}', '\u{017E}', '\u{0178}',
    ];
    match byte {
        0x80..=0x9F => HIGH[(byte - 0x80) as usize],
        byte => byte as char,
    }
}

/// Parse RTF into styled text.
///
/// With `legacy_font_scale`, text from the predecessor application is
/// corrected: its multiple-space placeholders become plain spaces and every
/// font becomes the body font at [`LEGACY_FONT_SCALE`] times its size,
/// keeping only bold and italic.
pub fn from_rtf(bytes: &[u8], legacy_font_scale: bool) -> Result<StyledText, ConvertError> {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .ok_or(ConvertError::Empty)?;
    if !bytes[start..].starts_with(b"{\\rtf") {
        return Err(ConvertError::MissingHeader);
    }

    let parsed = RtfReader::new(&bytes[start..]).read()?;
    let parsed = strip_adaptive_colors(&parsed);
    if !legacy_font_scale {
        return Ok(parsed);
    }

    let restored = restore_spaces(parsed.text());
    let rescaled = parsed.map_attributes(|attrs| {
        let mut attrs = attrs.clone();
        attrs.font = Font::resolve(
            BODY_FONT_FAMILY,
            attrs.font.size * LEGACY_FONT_SCALE,
            attrs.font.is_bold(),
            attrs.font.is_italic(),
        );
        attrs
    });
    // Placeholder replacement keeps the character count, so runs carry over.
    Ok(StyledText::from_runs(restored, rescaled.runs().to_vec()).unwrap_or(rescaled))
}

/// Non-breaking spaces adjacent to another space are multiple-space
/// placeholders; turn them back into ordinary spaces.
fn restore_spaces(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_space = |c: Option<&char>| matches!(c.copied(), Some(' ') | Some(NBSP));
    chars
        .iter()
        .enumerate()
        .map(|(idx, &c)| {
            let before = idx.checked_sub(1).and_then(|i| chars.get(i));
            if c == NBSP && (is_space(before) || is_space(chars.get(idx + 1))) {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Plain text survives an RTF round trip unchanged
pub fn validate_round_trip(text: &StyledText) -> bool {
    match to_rtf(text).and_then(|bytes| from_rtf(&bytes, false)) {
        Ok(decoded) => decoded.text() == text.text(),
        Err(e) => {
            log::warn!("RTF round trip failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled_sample() -> StyledText {
        let mut text = StyledText::default();
        text.push(
            "Title {draft}\n",
            AttributeSet::body().with_font(Font::resolve("Helvetica", 20.0, true, false)),
        );
        text.push(
            "Caf\u{e9} na\u{ef}ve \u{201C}quoted\u{201D}\tand a \\ backslash ",
            AttributeSet::body().with_paragraph(ParagraphFormat {
                alignment: Alignment::Center,
                first_line_head_indent: 18.0,
                spacing_after: 6.0,
                ..Default::default()
            }),
        );
        text.push("red 😀", AttributeSet::body().with_foreground(Color::rgb(200, 10, 10)));
        text.push("\nlast", AttributeSet::body());
        text
    }

    #[test]
    fn test_round_trip_keeps_plain_text() {
        assert!(validate_round_trip(&styled_sample()));
        assert!(validate_round_trip(&StyledText::plain("")));
        assert!(validate_round_trip(&StyledText::plain("\n\n{}\\")));
    }

    #[test]
    fn test_round_trip_keeps_basic_formatting() {
        let original = styled_sample();
        let rtf = to_rtf(&original).unwrap();
        let parsed = from_rtf(&rtf, false).unwrap();

        let title = parsed.attributes_at(0).unwrap();
        assert_eq!(title.font.face_name(), "Helvetica-Bold");
        assert_eq!(title.font.size, 20.0);

        let body = parsed.attributes_at(16).unwrap();
        assert_eq!(body.paragraph.alignment, Alignment::Center);
        assert_eq!(body.paragraph.first_line_head_indent, 18.0);
        assert_eq!(body.paragraph.spacing_after, 6.0);

        // The emoji just before the trailing "\nlast" run
        let red_offset = original.len() - 6;
        assert_eq!(parsed.attributes_at(red_offset).unwrap().foreground, Some(Color::rgb(200, 10, 10)));
    }

    #[test]
    fn test_rejects_non_rtf() {
        assert_eq!(from_rtf(b"", false), Err(ConvertError::Empty));
        assert_eq!(from_rtf(b"hello", false), Err(ConvertError::MissingHeader));
        assert!(matches!(
            from_rtf(b"{\\rtf1 {\\b unclosed", false),
            Err(ConvertError::Unbalanced(_))
        ));
    }

    #[test]
    fn test_reads_foreign_rtf() {
        let rtf = br"{\rtf1\ansi\ansicpg1252\cocoartf2639
{\fonttbl\f0\fswiss\fcharset0 Helvetica;\f1\froman\fcharset0 Times-Roman;}
{\colortbl;\red255\green255\blue255;\red0\green0\blue0;\red20\green80\blue160;}
{\*\expandedcolortbl;;\csgray\c0;}
\pard\tx560\pardirnatural\partightenfactor0
\f0\fs24 \cf2 Plain black, \b bold\b0  then \i italic\i0 .\par
\f1\cf3 Blue Times \'e9l\'e8ve\uc1\u8364 E\par
}";
        let parsed = from_rtf(rtf, false).unwrap();
        assert_eq!(
            parsed.text(),
            "Plain black, bold then italic.\nBlue Times \u{e9}l\u{e8}ve\u{20AC}\n"
        );
        assert!(parsed.attributes_at(13).unwrap().font.is_bold());
        assert!(!parsed.attributes_at(18).unwrap().font.is_bold());
        // Explicit black is theme-adaptive after import.
        assert_eq!(parsed.attributes_at(0).unwrap().foreground, None);
        let blue = parsed.attributes_at(32).unwrap();
        assert_eq!(blue.foreground, Some(Color::rgb(20, 80, 160)));
        assert_eq!(blue.font.family, "Times");
        assert_eq!(blue.font.size, 12.0);
    }

    #[test]
    fn test_legacy_import_scales_fonts_and_restores_spaces() {
        let rtf = br"{\rtf1\ansi{\fonttbl{\f0\fnil Courier;}}\f0\fs20 Two\~\~ spaces {\b bold}}";
        let parsed = from_rtf(rtf, true).unwrap();
        assert_eq!(parsed.text(), "Two   spaces bold");

        let plain = parsed.attributes_at(0).unwrap();
        assert_eq!(plain.font.family, BODY_FONT_FAMILY);
        assert_eq!(plain.font.size, 18.0);

        let bold = parsed.attributes_at(14).unwrap();
        assert!(bold.font.is_bold());
        assert_eq!(bold.font.size, 18.0);
    }

    #[test]
    fn test_single_nbsp_is_kept() {
        assert_eq!(restore_spaces("10\u{a0}km"), "10\u{a0}km");
        assert_eq!(restore_spaces("a \u{a0}\u{a0}b"), "a   b");
    }
}
