pub mod bridge;
pub mod preprocess;
pub mod renderer;

pub use bridge::TesseractBridge;
pub use renderer::PageRenderer;

use anyhow::Result;
use image::{DynamicImage, GrayImage};
use std::path::Path;

/// Page segmentation strategy handed to the recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    /// A single uniform block of text (tesseract `--psm 6`).
    UniformBlock,
    /// As much text as possible in no particular order (tesseract `--psm 11`).
    SparseText,
}

impl PageLayout {
    pub fn psm(self) -> u8 {
        match self {
            PageLayout::UniformBlock => 6,
            PageLayout::SparseText => 11,
        }
    }
}

/// Language and layout configuration for one recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionProfile {
    pub lang: String,
    pub layout: PageLayout,
    pub engine_mode: Option<u8>,
}

impl RecognitionProfile {
    /// Whole-cell pass: block layout, both scripts.
    pub fn body(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            layout: PageLayout::UniformBlock,
            engine_mode: Some(3),
        }
    }

    /// Identity-code pass on the top of a cell: sparse layout, Latin only.
    pub fn header(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            layout: PageLayout::SparseText,
            engine_mode: Some(3),
        }
    }

    /// Page banner pass used to find the section name.
    pub fn village(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            layout: PageLayout::SparseText,
            engine_mode: None,
        }
    }
}

pub trait Rasterizer {
    /// Renders one 1-based page of `pdf_path` at `dpi`.
    fn rasterize(&self, pdf_path: &Path, page_number: usize, dpi: u32) -> Result<DynamicImage>;
}

pub trait Recognizer {
    fn recognize(&self, image: &GrayImage, profile: &RecognitionProfile) -> Result<String>;
}
