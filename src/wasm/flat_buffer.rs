//! Flat page table for the WASM bridge
//!
//! Two parallel buffers JS can view without decoding JSON:
//!
//! ## u32 Buffer Layout:
//! ```text
//! Header:
//! [0]     MAGIC (0x464F4C49 = "FOLI" for validation)
//! [1]     SCHEMA_VERSION (currently 1)
//! [2]     page_count
//! [3]     text_length (chars)
//! [4]     iterations
//! [5]     flags: bit0=converged, bit1=truncated
//! [6..]   per-page: [page_index, range_start, range_end, footnote_count]
//! ```
//!
//! ## f32 Buffer Layout:
//! ```text
//! [0]     compute_time_ms
//! [1..]   per-page: [used_height, container_height, footnote_height]
//! ```

use crate::layout::LayoutResult;

/// Magic number for format validation: "FOLI"
pub const MAGIC: u32 = 0x464F_4C49;

/// Schema version for protocol compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Header size in u32 elements
pub const HEADER_SIZE: usize = 6;

/// Header size in f32 elements
pub const F32_HEADER_SIZE: usize = 1;

pub const FLAG_CONVERGED: u32 = 0b01;
pub const FLAG_TRUNCATED: u32 = 0b10;

/// [page_index, range_start, range_end, footnote_count]
pub const U32_PER_PAGE: usize = 4;

/// [used_height, container_height, footnote_height]
pub const F32_PER_PAGE: usize = 3;

/// Page table buffers, reused across layouts
#[derive(Debug, Default)]
pub struct PageTableBuffer {
    pub u32_data: Vec<u32>,
    pub f32_data: Vec<f32>,
}

impl PageTableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.u32_data.clear();
        self.f32_data.clear();
    }

    /// Rewrite both buffers from a layout result.
    /// Grows capacity only when the page count needs it.
    pub fn write(&mut self, result: &LayoutResult) {
        let pages = result.pages.len();
        self.clear();
        self.u32_data.reserve(HEADER_SIZE + pages * U32_PER_PAGE);
        self.f32_data.reserve(F32_HEADER_SIZE + pages * F32_PER_PAGE);

        let mut flags = 0;
        if result.converged {
            flags |= FLAG_CONVERGED;
        }
        if result.truncated {
            flags |= FLAG_TRUNCATED;
        }
        self.u32_data.push(MAGIC);
        self.u32_data.push(SCHEMA_VERSION);
        self.u32_data.push(pages as u32);
        self.u32_data.push(result.text_length as u32);
        self.u32_data.push(result.iterations as u32);
        self.u32_data.push(flags);
        self.f32_data.push(result.compute_time_ms as f32);

        for page in &result.pages {
            self.u32_data.push(page.page_index as u32);
            self.u32_data.push(page.character_range.start as u32);
            self.u32_data.push(page.character_range.end as u32);
            self.u32_data.push(page.footnote_ids.len() as u32);

            self.f32_data.push(page.used_height);
            self.f32_data.push(page.container_height);
            self.f32_data.push(page.footnote_height);
        }
    }

    pub fn page_count(&self) -> usize {
        self.u32_data.get(2).map_or(0, |count| *count as usize)
    }

    /// Character range of a page as stored in the table
    pub fn page_range(&self, page_index: usize) -> Option<(u32, u32)> {
        let base = HEADER_SIZE + page_index * U32_PER_PAGE;
        match self.u32_data.get(base + 1..base + 3) {
            Some(&[start, end]) => Some((start, end)),
            _ => None,
        }
    }

    // Accessors for WASM
    // Return u32 instead of usize for explicit WASM contract (wasm32 linear memory uses u32 offsets)

    pub fn u32_ptr(&self) -> u32 {
        self.u32_data.as_ptr() as u32
    }

    pub fn u32_len(&self) -> u32 {
        self.u32_data.len() as u32
    }

    pub fn f32_ptr(&self) -> u32 {
        self.f32_data.as_ptr() as u32
    }

    pub fn f32_len(&self) -> u32 {
        self.f32_data.len() as u32
    }
}
