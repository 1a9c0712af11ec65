//! Page geometry: paper, margins and header/footer bands

use crate::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Default header and footer band depth in points
pub const DEFAULT_BAND_DEPTH: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Margins {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }
}

/// Paper, margins and header/footer settings for a document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageSetup {
    pub paper_width: f32,
    pub paper_height: f32,
    pub margin_top: f32,
    pub margin_left: f32,
    pub margin_bottom: f32,
    pub margin_right: f32,
    pub has_headers: bool,
    pub header_depth: f32,
    pub has_footers: bool,
    pub footer_depth: f32,
    pub orientation: Orientation,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::letter()
    }
}

impl PageSetup {
    /// US Letter, one-inch margins
    pub fn letter() -> Self {
        Self::with_paper(612.0, 792.0)
    }

    /// ISO A4, one-inch margins
    pub fn a4() -> Self {
        Self::with_paper(595.28, 841.89)
    }

    fn with_paper(paper_width: f32, paper_height: f32) -> Self {
        Self {
            paper_width,
            paper_height,
            margin_top: 72.0,
            margin_left: 72.0,
            margin_bottom: 72.0,
            margin_right: 72.0,
            has_headers: false,
            header_depth: DEFAULT_BAND_DEPTH,
            has_footers: false,
            footer_depth: DEFAULT_BAND_DEPTH,
            orientation: Orientation::Portrait,
        }
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margin_top = margins.top;
        self.margin_left = margins.left;
        self.margin_bottom = margins.bottom;
        self.margin_right = margins.right;
        self
    }

    pub fn paper_size(&self) -> Size {
        Size::new(self.paper_width, self.paper_height)
    }

    pub fn margins(&self) -> Margins {
        Margins {
            top: self.margin_top,
            left: self.margin_left,
            bottom: self.margin_bottom,
            right: self.margin_right,
        }
    }

    pub fn page_rect(&self) -> Rect {
        page_rect(self.paper_size(), self.orientation)
    }

    pub fn text_rect(&self) -> Rect {
        text_rect(self.page_rect(), &self.margins())
    }

    /// The area body text and footnotes flow into
    pub fn content_rect(&self) -> Rect {
        content_rect(
            self.text_rect(),
            self.has_headers.then_some(self.header_depth),
            self.has_footers.then_some(self.footer_depth),
        )
    }
}

/// Paper rectangle at the origin; landscape swaps the dimensions
pub fn page_rect(paper: Size, orientation: Orientation) -> Rect {
    match orientation {
        Orientation::Portrait => Rect::new(0.0, 0.0, paper.width, paper.height),
        Orientation::Landscape => Rect::new(0.0, 0.0, paper.height, paper.width),
    }
}

pub fn text_rect(page: Rect, margins: &Margins) -> Rect {
    page.inset(margins.top, margins.left, margins.bottom, margins.right)
}

/// Text rectangle minus the enabled header and footer bands
pub fn content_rect(text: Rect, header_depth: Option<f32>, footer_depth: Option<f32>) -> Rect {
    text.inset(header_depth.unwrap_or(0.0), 0.0, footer_depth.unwrap_or(0.0), 0.0)
}
