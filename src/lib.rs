//! Folio: the pagination and rich-text attribute core of a manuscript editor
//!
//! This crate provides:
//! - A styled-text model with non-overlapping attribute runs
//! - A versioned attribute codec plus an RTF bridge for interchange
//! - Named-style resolution with a project → default → Body fallback chain
//! - A footnote directory that measures footnote blocks
//! - Footnote-aware pagination that converges page boundaries iteratively

pub mod codec;
pub mod document;
mod error;
pub mod footnotes;
pub mod layout;
pub mod render;
pub mod store;
pub mod style;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use document::{
    Alignment, Attachment, AttributeSet, Color, Font, FontTraits, Footnote, FootnoteBody,
    ParagraphFormat, Run, StyledText, Version,
};
pub use error::{ConvertError, LayoutError, StoreError, StyleError};
pub use footnotes::{FootnoteDirectory, FootnoteStyle};
pub use layout::{
    FontLibrary, FontMetrics, LayoutConfig, LayoutResult, LayoutStatus, LineBreakMeasurer,
    Orientation, PageInfo, PageSetup, PaginatedLayout, TextMeasurer,
};
pub use render::{DisplayItem, DisplayPage, PageRenderer};
pub use store::{DocumentRecord, MemoryStore, Project, ProjectStore};
pub use style::{StyleDefinition, StyleResolver, Stylesheet};

use serde::{Deserialize, Serialize};

/// Page coordinates in points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width and height in points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Page rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Shrink the rectangle by the given edge insets
    pub fn inset(&self, top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            width: self.width - left - right,
            height: self.height - top - bottom,
        }
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}
