//! Layout engine: page geometry, line breaking and footnote-aware pagination

mod engine;
pub mod font;
pub mod geometry;
mod line_break;
mod pagination;

pub use engine::{LayoutConfig, LayoutStatus, PaginatedLayout, MAX_RELAXATION_ITERATIONS};
pub use font::{FontLibrary, FontMetrics};
pub use geometry::{content_rect, page_rect, text_rect, Margins, Orientation, PageSetup};
pub use line_break::{Fit, LineBreakMeasurer, LineBreaker, LineLayout, PreparedText, TextMeasurer};
pub use pagination::{LayoutResult, PageInfo};
