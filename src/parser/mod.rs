pub mod cell_text;
pub mod devanagari;
pub mod pdf_reader;
pub mod village;

pub use cell_text::parse_cell_text;
pub use pdf_reader::PdfReader;
pub use village::VillageResolver;

use anyhow::Result;
use std::path::Path;

/// Access to the embedded text layer of a PDF page.
pub trait TextLayerReader {
    /// Returns `Ok(None)` when the page carries no usable text.
    fn read_text_layer(&self, pdf_path: &Path, page_number: usize) -> Result<Option<String>>;
}
