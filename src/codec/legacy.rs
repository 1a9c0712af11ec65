//! Per-run attribute dictionaries exported by the predecessor application.
//!
//! Shape: `[{"range": [location, length], "attributes": {...}}, ...]`. Each
//! record is mapped onto a [`SerializedRun`] and decoded by the same path as
//! the current format.

use crate::codec::record::SerializedRun;
use crate::document::{Alignment, Font};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LegacyRun {
    pub range: (i64, i64),
    #[serde(default)]
    pub attributes: LegacyAttributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAttributes {
    /// Face name, e.g. `Times-Bold`
    pub font: Option<String>,
    pub size: Option<f32>,
    pub color: Option<String>,
    pub underline: Option<i32>,
    pub strikethrough: Option<i32>,
    pub style: Option<String>,
    pub alignment: Option<String>,
    pub line_height_multiple: Option<f32>,
    pub spacing_before: Option<f32>,
    pub spacing_after: Option<f32>,
    pub first_line_indent: Option<f32>,
    pub head_indent: Option<f32>,
    pub tail_indent: Option<f32>,
}

fn legacy_alignment(value: &str) -> Option<Alignment> {
    match value.to_ascii_lowercase().as_str() {
        "left" => Some(Alignment::Left),
        "center" | "centre" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        "justified" | "justify" => Some(Alignment::Justified),
        "natural" => Some(Alignment::Natural),
        _ => None,
    }
}

impl From<LegacyRun> for SerializedRun {
    fn from(legacy: LegacyRun) -> Self {
        let attrs = legacy.attributes;
        // Face names carry their traits; split them the same way fonts resolve.
        let font = attrs
            .font
            .as_deref()
            .map(|name| Font::resolve(name, attrs.size.unwrap_or(0.0), false, false));

        SerializedRun {
            location: legacy.range.0,
            length: legacy.range.1,
            font_name: font.as_ref().map(|f| f.family.clone()),
            font_size: attrs.size,
            bold: font.as_ref().and_then(|f| f.is_bold().then_some(true)),
            italic: font.as_ref().and_then(|f| f.is_italic().then_some(true)),
            underline: attrs.underline,
            strikethrough: attrs.strikethrough,
            color: attrs.color,
            alignment: attrs.alignment.as_deref().and_then(legacy_alignment),
            line_height_multiple: attrs.line_height_multiple,
            paragraph_spacing_before: attrs.spacing_before,
            paragraph_spacing: attrs.spacing_after,
            first_line_head_indent: attrs.first_line_indent,
            head_indent: attrs.head_indent,
            tail_indent: attrs.tail_indent,
            style_name: attrs.style,
            ..Default::default()
        }
    }
}
