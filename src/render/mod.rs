//! Render output: per-page display lists

mod display;

pub use display::{DisplayItem, DisplayItemId, DisplayPage, PageRenderer};
