//! On-disk record for one attribute run

use crate::document::{
    Alignment, Attachment, AttributeSet, Caption, Color, CommentAttachment, Font,
    FootnoteAttachment, ImageAlignment, ImageAttachment, ParagraphFormat, Run,
};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current record layout version
pub const FORMAT_VERSION: u32 = 1;

/// Versioned envelope around the ordered run records
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub format_version: u32,
    pub runs: Vec<SerializedRun>,
}

/// Flattened attribute run. Fields equal to their "not customized" value are
/// omitted rather than written as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRun {
    pub location: i64,
    pub length: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<i32>,
    /// `#RRGGBB` or `#RRGGBBAA`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height_multiple: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_spacing_before: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_spacing: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line_head_indent: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_indent: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_indent: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_line_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_line_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<WireAttachment>,
}

/// Tagged attachment record. Tags this reader does not know decode to
/// `Unknown` and are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WireAttachment {
    #[serde(rename_all = "camelCase")]
    Image {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        #[serde(default = "default_scale")]
        display_scale: f32,
        #[serde(default)]
        alignment: WireImageAlignment,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption_style: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_file_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_filename: Option<String>,
    },
    Comment {
        id: String,
        #[serde(default)]
        resolved: bool,
    },
    Footnote {
        id: String,
        #[serde(default)]
        number: u32,
    },
    #[serde(other)]
    Unknown,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireImageAlignment {
    Left,
    #[default]
    Center,
    Right,
    Inline,
}

impl From<ImageAlignment> for WireImageAlignment {
    fn from(alignment: ImageAlignment) -> Self {
        match alignment {
            ImageAlignment::Left => Self::Left,
            ImageAlignment::Center => Self::Center,
            ImageAlignment::Right => Self::Right,
            ImageAlignment::Inline => Self::Inline,
        }
    }
}

impl From<WireImageAlignment> for ImageAlignment {
    fn from(alignment: WireImageAlignment) -> Self {
        match alignment {
            WireImageAlignment::Left => Self::Left,
            WireImageAlignment::Center => Self::Center,
            WireImageAlignment::Right => Self::Right,
            WireImageAlignment::Inline => Self::Inline,
        }
    }
}

fn nonzero(value: f32) -> Option<f32> {
    (value != 0.0 && value.is_finite()).then_some(value)
}

fn positive(value: f32) -> Option<f32> {
    (value > 0.0 && value.is_finite()).then_some(value)
}

impl SerializedRun {
    /// Flatten a run. Bold and italic come from the font's traits.
    pub fn from_run(run: &Run) -> Self {
        let attrs = &run.attributes;
        let paragraph = &attrs.paragraph;
        Self {
            location: run.start as i64,
            length: run.length as i64,
            font_name: Some(attrs.font.family.clone()),
            font_size: Some(attrs.font.size),
            bold: attrs.font.is_bold().then_some(true),
            italic: attrs.font.is_italic().then_some(true),
            underline: (attrs.underline != 0).then_some(attrs.underline),
            strikethrough: (attrs.strikethrough != 0).then_some(attrs.strikethrough),
            color: attrs
                .foreground
                .filter(|color| !color.is_theme_adaptive())
                .map(|color| color.to_hex()),
            alignment: (paragraph.alignment != Alignment::Natural).then_some(paragraph.alignment),
            line_height_multiple: positive(paragraph.line_height_multiple),
            line_spacing: nonzero(paragraph.line_spacing),
            paragraph_spacing_before: nonzero(paragraph.spacing_before),
            paragraph_spacing: nonzero(paragraph.spacing_after),
            first_line_head_indent: nonzero(paragraph.first_line_head_indent),
            head_indent: nonzero(paragraph.head_indent),
            tail_indent: nonzero(paragraph.tail_indent),
            minimum_line_height: positive(paragraph.minimum_line_height),
            maximum_line_height: positive(paragraph.maximum_line_height),
            style_name: attrs.style_name.clone(),
            attachment: attrs.attachment.as_ref().map(WireAttachment::from_attachment),
        }
    }

    /// Rebuild the attribute set, starting from `base` for absent fields
    pub fn to_attributes(&self, base: &AttributeSet) -> AttributeSet {
        let font = Font::resolve(
            self.font_name.as_deref().unwrap_or(&base.font.family),
            self.font_size.unwrap_or(base.font.size),
            self.bold.unwrap_or(false),
            self.italic.unwrap_or(false),
        );

        let mut paragraph = ParagraphFormat::default();
        if let Some(alignment) = self.alignment {
            paragraph.alignment = alignment;
        }
        if let Some(value) = self.line_height_multiple.and_then(positive) {
            paragraph.line_height_multiple = value;
        }
        if let Some(value) = self.minimum_line_height.and_then(positive) {
            paragraph.minimum_line_height = value;
        }
        if let Some(value) = self.maximum_line_height.and_then(positive) {
            paragraph.maximum_line_height = value;
        }
        if let Some(value) = self.line_spacing.and_then(nonzero) {
            paragraph.line_spacing = value;
        }
        if let Some(value) = self.paragraph_spacing_before.and_then(nonzero) {
            paragraph.spacing_before = value;
        }
        if let Some(value) = self.paragraph_spacing.and_then(nonzero) {
            paragraph.spacing_after = value;
        }
        if let Some(value) = self.first_line_head_indent.and_then(nonzero) {
            paragraph.first_line_head_indent = value;
        }
        if let Some(value) = self.head_indent.and_then(nonzero) {
            paragraph.head_indent = value;
        }
        if let Some(value) = self.tail_indent.and_then(nonzero) {
            paragraph.tail_indent = value;
        }

        AttributeSet {
            font,
            underline: self.underline.filter(|weight| *weight > 0).unwrap_or(0),
            strikethrough: self.strikethrough.filter(|weight| *weight > 0).unwrap_or(0),
            foreground: self.color.as_deref().and_then(Color::from_hex),
            paragraph,
            style_name: self.style_name.clone().or_else(|| base.style_name.clone()),
            attachment: self.attachment.as_ref().and_then(WireAttachment::to_attachment),
        }
    }
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

impl WireAttachment {
    pub fn from_attachment(attachment: &Attachment) -> Self {
        match attachment {
            Attachment::Image(image) => WireAttachment::Image {
                id: image.id.to_string(),
                data: image.bytes.as_ref().map(|bytes| BASE64_STANDARD.encode(bytes)),
                display_scale: image.display_scale,
                alignment: image.alignment.into(),
                caption: image.caption.as_ref().map(|c| c.text.clone()),
                caption_style: image.caption.as_ref().map(|c| c.style_name.clone()),
                source_file_id: image.source_file_id.map(|id| id.to_string()),
                original_filename: image.original_filename.clone(),
            },
            Attachment::Comment(comment) => WireAttachment::Comment {
                id: comment.id.to_string(),
                resolved: comment.resolved,
            },
            Attachment::Footnote(footnote) => WireAttachment::Footnote {
                id: footnote.id.to_string(),
                number: footnote.number,
            },
        }
    }

    /// `None` for unknown kinds and records with unreadable ids
    pub fn to_attachment(&self) -> Option<Attachment> {
        let attachment = match self {
            WireAttachment::Image {
                id,
                data,
                display_scale,
                alignment,
                caption,
                caption_style,
                source_file_id,
                original_filename,
            } => {
                let bytes = match data {
                    Some(encoded) => match BASE64_STANDARD.decode(encoded) {
                        Ok(bytes) => Some(bytes),
                        Err(e) => {
                            log::warn!("Dropping undecodable image data for {id}: {e}");
                            None
                        }
                    },
                    None => None,
                };
                Attachment::Image(ImageAttachment {
                    id: parse_id(id)?,
                    bytes,
                    display_scale: if *display_scale > 0.0 { *display_scale } else { 1.0 },
                    alignment: (*alignment).into(),
                    caption: caption.as_ref().map(|text| Caption {
                        text: text.clone(),
                        style_name: caption_style
                            .clone()
                            .unwrap_or_else(|| "Caption".to_string()),
                    }),
                    source_file_id: source_file_id.as_deref().and_then(parse_id),
                    original_filename: original_filename.clone(),
                })
            }
            WireAttachment::Comment { id, resolved } => Attachment::Comment(CommentAttachment {
                id: parse_id(id)?,
                resolved: *resolved,
            }),
            WireAttachment::Footnote { id, number } => Attachment::Footnote(FootnoteAttachment {
                id: parse_id(id)?,
                number: *number,
            }),
            WireAttachment::Unknown => {
                log::warn!("Skipping attachment of unknown kind");
                return None;
            }
        };
        Some(attachment)
    }
}
