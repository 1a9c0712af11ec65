//! WASM bindings for the paginator

pub mod flat_buffer;

use crate::codec;
use crate::document::{Footnote, StyledText};
use crate::footnotes::FootnoteDirectory;
use crate::layout::{FontLibrary, LayoutConfig, PageSetup, PaginatedLayout};
use flat_buffer::PageTableBuffer;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-exposed paginator for one document
#[wasm_bindgen]
pub struct WasmPaginator {
    layout: PaginatedLayout,
    fonts: Arc<FontLibrary>,
    footnotes: Vec<Footnote>,
    buffer: PageTableBuffer,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Empty document on a US Letter page
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let fonts = Arc::new(FontLibrary::default());
        Self {
            layout: PaginatedLayout::new(StyledText::default(), PageSetup::default(), Arc::clone(&fonts)),
            fonts,
            footnotes: Vec::new(),
            buffer: PageTableBuffer::new(),
        }
    }

    /// Replace the text with unformatted body text
    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, text: &str) {
        self.layout.set_text(StyledText::plain(text));
    }

    /// Apply serialized attribute runs to the current text
    #[wasm_bindgen(js_name = setAttributes)]
    pub fn set_attributes(&mut self, bytes: &[u8]) {
        let plain = self.layout.text().text().to_string();
        self.layout.set_text(codec::decode(bytes, &plain));
    }

    /// Page setup as JSON; omitted fields keep their defaults
    #[wasm_bindgen(js_name = setPageSetup)]
    pub fn set_page_setup(&mut self, json: &str) -> Result<(), JsValue> {
        let setup: PageSetup = serde_json::from_str(json).map_err(js_error)?;
        self.layout.set_page_setup(setup);
        Ok(())
    }

    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, json: &str) -> Result<(), JsValue> {
        let config = LayoutConfig::from_json(json).map_err(js_error)?;
        self.layout.set_config(config);
        Ok(())
    }

    /// Add a plain-text footnote anchored at a character offset.
    /// Returns its id.
    #[wasm_bindgen(js_name = addFootnote)]
    pub fn add_footnote(&mut self, anchor_offset: usize, number: u32, body: &str) -> String {
        let footnote = Footnote::new(anchor_offset, number, body);
        let id = footnote.id.to_string();
        self.footnotes.push(footnote);
        self.layout.invalidate();
        id
    }

    #[wasm_bindgen(js_name = clearFootnotes)]
    pub fn clear_footnotes(&mut self) {
        self.footnotes.clear();
        self.layout.invalidate();
    }

    /// Lay out the document, returning the page count
    #[wasm_bindgen(js_name = calculateLayout)]
    pub fn calculate_layout(&mut self) -> Result<usize, JsValue> {
        let directory = FootnoteDirectory::new(
            self.footnotes.clone(),
            self.layout.config().footnote.clone(),
            Arc::clone(&self.fonts),
        );
        let result = self.layout.calculate_layout(Some(&directory)).map_err(js_error)?;
        self.buffer.write(&result);
        Ok(result.page_count())
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    /// Page holding a character offset, or -1 when there is none
    #[wasm_bindgen(js_name = pageForOffset)]
    pub fn page_for_offset(&self, offset: usize) -> i32 {
        self.layout
            .page_index(offset)
            .map_or(-1, |page| page as i32)
    }

    /// The last layout result as JSON, or an empty string before layout
    #[wasm_bindgen(js_name = getLayoutJson)]
    pub fn layout_json(&self) -> String {
        self.layout
            .layout()
            .and_then(|result| serde_json::to_string(&*result).ok())
            .unwrap_or_default()
    }

    /// Page table from the last layout: `[Uint32Array, Float32Array]`
    #[wasm_bindgen(js_name = getPageTable)]
    pub fn page_table(&self) -> js_sys::Array {
        let indices = js_sys::Uint32Array::from(self.buffer.u32_data.as_slice());
        let metrics = js_sys::Float32Array::from(self.buffer.f32_data.as_slice());
        js_sys::Array::of2(&indices, &metrics)
    }

    /// Pointer into linear memory for a zero-copy view of the u32 table
    #[wasm_bindgen(js_name = pageTableU32Ptr)]
    pub fn page_table_u32_ptr(&self) -> u32 {
        self.buffer.u32_ptr()
    }

    #[wasm_bindgen(js_name = pageTableU32Len)]
    pub fn page_table_u32_len(&self) -> u32 {
        self.buffer.u32_len()
    }

    #[wasm_bindgen(js_name = pageTableF32Ptr)]
    pub fn page_table_f32_ptr(&self) -> u32 {
        self.buffer.f32_ptr()
    }

    #[wasm_bindgen(js_name = pageTableF32Len)]
    pub fn page_table_f32_len(&self) -> u32 {
        self.buffer.f32_len()
    }
}

impl Default for WasmPaginator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_one_page() {
        let mut paginator = WasmPaginator::new();
        assert_eq!(paginator.page_count(), 0);
        assert_eq!(paginator.layout_json(), "");

        assert_eq!(paginator.calculate_layout().ok(), Some(1));
        assert_eq!(paginator.page_for_offset(0), 0);
        assert_eq!(paginator.page_for_offset(1), -1);
        assert_eq!(paginator.buffer.page_count(), 1);
    }

    #[test]
    fn test_footnotes_reach_the_page_table() {
        let mut paginator = WasmPaginator::new();
        paginator.set_text("A sentence with a note.");
        paginator.add_footnote(10, 1, "The note.");
        assert_eq!(paginator.calculate_layout().ok(), Some(1));

        let row = flat_buffer::HEADER_SIZE;
        assert_eq!(paginator.buffer.u32_data[row + 2], 23);
        assert_eq!(paginator.buffer.u32_data[row + 3], 1);
        assert!(paginator.buffer.f32_data[3] > 0.0);

        let json = paginator.layout_json();
        assert!(json.contains("\"footnoteIds\""));
        assert!(json.contains("\"converged\":true"));
    }

    #[test]
    fn test_attributes_keep_text() {
        let mut paginator = WasmPaginator::new();
        paginator.set_text("Styled");
        paginator.set_attributes(b"not json");
        assert_eq!(paginator.layout.text().text(), "Styled");
        assert_eq!(paginator.calculate_layout().ok(), Some(1));
    }
}
