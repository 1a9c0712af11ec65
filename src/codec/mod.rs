//! Rich-text attribute codec
//!
//! Converts [`StyledText`] runs to and from a versioned JSON record list
//! stored next to a version's plain text, and bridges to RTF for
//! interchange. Formatting problems degrade to body styling; only the RTF
//! bridge reports errors.

mod color;
mod legacy;
mod record;
mod rtf;

pub use color::{prepare_for_export, prepare_for_html_export, strip_adaptive_colors};
pub use legacy::{LegacyAttributes, LegacyRun};
pub use record::{Envelope, SerializedRun, WireAttachment, FORMAT_VERSION};
pub use rtf::{from_rtf, to_rtf, validate_round_trip, LEGACY_FONT_SCALE};

use crate::document::{AttributeSet, Run, StyledText};
use serde::Deserialize;
use std::ops::Range;

/// The two accepted wire shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum WireFormat {
    Current(Envelope),
    Legacy(Vec<LegacyRun>),
}

/// Serialize the attribute runs of `text`.
///
/// Returns an empty buffer if serialization fails; callers treat empty bytes
/// as "no formatting".
pub fn encode(text: &StyledText) -> Vec<u8> {
    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        runs: text.runs().iter().map(SerializedRun::from_run).collect(),
    };
    match serde_json::to_vec(&envelope) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Attribute encode failed: {e}");
            Vec::new()
        }
    }
}

/// Rebuild styled text from stored attributes and the version's plain text.
///
/// Starts from body styling across the whole text, applies each record that
/// lies inside the text, then strips theme-adaptive colors.
pub fn decode(bytes: &[u8], plain_text: &str) -> StyledText {
    let base = AttributeSet::body();
    let mut styled = StyledText::new(plain_text, base.clone());
    if bytes.is_empty() || plain_text.is_empty() {
        return styled;
    }

    let records: Vec<SerializedRun> = match serde_json::from_slice::<WireFormat>(bytes) {
        Ok(WireFormat::Current(envelope)) => {
            if envelope.format_version > FORMAT_VERSION {
                log::warn!(
                    "Attribute format version {} is newer than {}; decoding best-effort",
                    envelope.format_version,
                    FORMAT_VERSION
                );
            }
            envelope.runs
        }
        Ok(WireFormat::Legacy(runs)) => runs.into_iter().map(SerializedRun::from).collect(),
        Err(e) => {
            log::warn!("Unreadable attribute data ({} bytes), using body style: {e}", bytes.len());
            return styled;
        }
    };

    let len = styled.len() as i64;
    let applied: Vec<(Range<usize>, AttributeSet)> = records
        .iter()
        .filter_map(|record| {
            let (location, length) = (record.location, record.length);
            if location < 0 || length < 0 || location.saturating_add(length) > len {
                log::warn!(
                    "Skipping attribute run {location}+{length} outside text of length {len}"
                );
                return None;
            }
            let start = location as usize;
            Some((start..start + length as usize, record.to_attributes(&base)))
        })
        .collect();

    let styled = match partition(plain_text, styled.len(), &applied, &base) {
        Some(partitioned) => partitioned,
        None => {
            // Overlapping records: later ones win
            for (range, attributes) in &applied {
                styled.set_attributes(range.clone(), attributes);
            }
            styled
        }
    };
    strip_adaptive_colors(&styled)
}

/// Runs for records that do not overlap, with body styling in the gaps.
/// `None` when any two records overlap.
fn partition(
    plain_text: &str,
    len: usize,
    records: &[(Range<usize>, AttributeSet)],
    base: &AttributeSet,
) -> Option<StyledText> {
    let mut ordered: Vec<_> = records.iter().filter(|(range, _)| !range.is_empty()).collect();
    ordered.sort_by_key(|(range, _)| range.start);

    let mut runs = Vec::with_capacity(ordered.len() * 2 + 1);
    let mut cursor = 0;
    for (range, attributes) in ordered {
        if range.start < cursor {
            return None;
        }
        if range.start > cursor {
            runs.push(Run::new(cursor, range.start - cursor, base.clone()));
        }
        runs.push(Run::new(range.start, range.len(), attributes.clone()));
        cursor = range.end;
    }
    if cursor < len {
        runs.push(Run::new(cursor, len - cursor, base.clone()));
    }
    StyledText::from_runs(plain_text, runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        Alignment, Attachment, Color, CommentAttachment, Font, FootnoteAttachment,
        ParagraphFormat, BODY_FONT_FAMILY,
    };
    use uuid::Uuid;

    fn sample() -> StyledText {
        let mut text = StyledText::default();
        text.push("Chapter One\n", AttributeSet::body().with_style("Heading 1").with_font(
            Font::resolve("Helvetica", 24.0, true, false),
        ));
        text.push(
            "It was a dark and stormy night",
            AttributeSet::body().with_paragraph(ParagraphFormat {
                alignment: Alignment::Justified,
                line_height_multiple: 1.2,
                first_line_head_indent: 36.0,
                ..Default::default()
            }),
        );
        text.push(
            "\u{FFFC}",
            AttributeSet::body().with_attachment(Attachment::Footnote(FootnoteAttachment {
                id: Uuid::new_v4(),
                number: 1,
            })),
        );
        text.push("; the rain ", AttributeSet::body().with_foreground(Color::rgb(200, 0, 0)));
        text.push("fell", AttributeSet::body().with_foreground(Color::BLACK));
        text
    }

    #[test]
    fn test_round_trip_preserves_text_and_runs() {
        let original = sample();
        let decoded = decode(&encode(&original), original.text());

        assert_eq!(decoded.text(), original.text());
        assert_eq!(decoded.runs()[0].attributes.font.face_name(), "Helvetica-Bold");
        assert_eq!(decoded.runs()[0].attributes.style_name.as_deref(), Some("Heading 1"));
        assert_eq!(decoded.runs()[1].attributes.paragraph.alignment, Alignment::Justified);
        assert!(matches!(
            decoded.runs()[2].attributes.attachment,
            Some(Attachment::Footnote(FootnoteAttachment { number: 1, .. }))
        ));
    }

    #[test]
    fn test_decode_is_stable_after_first_pass() {
        let original = sample();
        let once = decode(&encode(&original), original.text());
        let twice = decode(&encode(&once), once.text());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_adaptive_colors_never_written() {
        let original = sample();
        let json: serde_json::Value = serde_json::from_slice(&encode(&original)).unwrap();
        let colors: Vec<_> = json["runs"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|run| run.get("color"))
            .collect();
        assert_eq!(colors, vec![&serde_json::json!("#C80000")]);
    }

    #[test]
    fn test_grays_and_white_never_written() {
        let mut text = StyledText::plain("theme");
        for (word, color) in [
            (" white", Color::WHITE),
            (" gray", Color::rgb(7, 7, 7)),
            (" mid", Color::rgb(128, 128, 128)),
            (" warm", Color::rgb(7, 7, 8)),
        ] {
            text.push(word, AttributeSet::body().with_foreground(color));
        }
        let json: serde_json::Value = serde_json::from_slice(&encode(&text)).unwrap();
        let colors: Vec<_> = json["runs"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|run| run.get("color"))
            .collect();
        assert_eq!(colors, vec![&serde_json::json!("#070708")]);
    }

    #[test]
    fn test_many_runs_decode_in_order() {
        let mut text = StyledText::default();
        for i in 0..5000 {
            let attrs = if i % 2 == 0 {
                AttributeSet::body()
            } else {
                AttributeSet::body().with_font(Font::resolve(BODY_FONT_FAMILY, 12.0, true, false))
            };
            text.push("wörd ", attrs);
        }
        let decoded = decode(&encode(&text), text.text());
        assert_eq!(decoded.runs().len(), 5000);
        assert_eq!(decoded.text(), text.text());
        assert_eq!(decoded.runs()[4999].range(), 24_995..25_000);
        assert!(decoded.attributes_at(24_999).unwrap().font.is_bold());
    }

    #[test]
    fn test_overlapping_records_later_wins() {
        let bytes = br#"{"formatVersion":1,"runs":[
            {"location":0,"length":4,"bold":true},
            {"location":2,"length":3,"italic":true}
        ]}"#;
        let decoded = decode(bytes, "Hello");
        let ranges: Vec<_> = decoded.runs().iter().map(Run::range).collect();
        assert_eq!(ranges, vec![0..2, 2..5]);
        assert!(decoded.attributes_at(1).unwrap().font.is_bold());
        let later = decoded.attributes_at(3).unwrap();
        assert!(later.font.is_italic());
        assert!(!later.font.is_bold());
    }

    #[test]
    fn test_unordered_records_fill_gaps_with_body() {
        let bytes = br#"{"formatVersion":1,"runs":[
            {"location":6,"length":5,"italic":true},
            {"location":0,"length":2,"bold":true}
        ]}"#;
        let decoded = decode(bytes, "Hello world");
        let ranges: Vec<_> = decoded.runs().iter().map(Run::range).collect();
        assert_eq!(ranges, vec![0..2, 2..6, 6..11]);
        assert_eq!(decoded.runs()[1].attributes, AttributeSet::body());
    }

    #[test]
    fn test_empty_inputs_yield_body_style() {
        let decoded = decode(b"", "Hello");
        assert_eq!(decoded.runs().len(), 1);
        assert_eq!(decoded.runs()[0].attributes, AttributeSet::body());

        let decoded = decode(&encode(&sample()), "");
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_garbage_degrades_to_body_style() {
        let decoded = decode(b"{\"formatVersion\":1,\"runs\":[{\"loc", "Hello");
        assert_eq!(decoded.text(), "Hello");
        assert_eq!(decoded.runs()[0].attributes.font.family, BODY_FONT_FAMILY);
    }

    #[test]
    fn test_out_of_bounds_runs_are_skipped() {
        let bytes = br#"{"formatVersion":1,"runs":[
            {"location":0,"length":2,"bold":true},
            {"location":3,"length":10,"italic":true},
            {"location":-1,"length":2,"italic":true}
        ]}"#;
        let decoded = decode(bytes, "Hello");
        assert!(decoded.attributes_at(0).unwrap().font.is_bold());
        assert!(!decoded.attributes_at(4).unwrap().font.is_italic());
        assert_eq!(decoded.runs().len(), 2);
    }

    #[test]
    fn test_stored_gray_is_normalized() {
        let bytes = br##"{"formatVersion":1,"runs":[{"location":0,"length":5,"color":"#FFFFFF"}]}"##;
        let decoded = decode(bytes, "Hello");
        assert_eq!(decoded.runs()[0].attributes.foreground, None);
    }

    #[test]
    fn test_legacy_dictionaries_are_accepted() {
        let bytes = br##"[
            {"range":[0,5],"attributes":{"font":"Times-Bold","size":13}},
            {"range":[6,5],"attributes":{"color":"#0000FF","underline":1}}
        ]"##;
        let decoded = decode(bytes, "Hello world");
        let first = decoded.attributes_at(0).unwrap();
        assert_eq!(first.font.face_name(), "Times-Bold");
        assert_eq!(first.font.size, 13.0);
        let last = decoded.attributes_at(7).unwrap();
        assert_eq!(last.foreground, Some(Color::rgb(0, 0, 255)));
        assert_eq!(last.underline, 1);
    }

    #[test]
    fn test_unknown_attachment_is_dropped_but_run_kept() {
        let comment = Attachment::Comment(CommentAttachment {
            id: Uuid::new_v4(),
            resolved: true,
        });
        let mut text = StyledText::plain("a");
        text.push("\u{FFFC}", AttributeSet::body().with_attachment(comment.clone()));
        let decoded = decode(&encode(&text), text.text());
        assert_eq!(decoded.attributes_at(1).unwrap().attachment, Some(comment));

        let future = br#"{"formatVersion":2,"runs":[{"location":0,"length":1,"underline":2,
            "attachment":{"kind":"equation","latex":"x^2"}}]}"#;
        let decoded = decode(future, "\u{FFFC}");
        let attrs = decoded.attributes_at(0).unwrap();
        assert_eq!(attrs.attachment, None);
        assert_eq!(attrs.underline, 2);
    }
}
