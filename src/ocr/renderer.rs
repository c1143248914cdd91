use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::ocr::Rasterizer;

/// Renders single pages through poppler's `pdftoppm`.
///
/// Each page lands in its own temporary directory which is removed as soon as
/// the image has been decoded, so only the in-memory raster outlives the call.
#[derive(Debug, Clone, Default)]
pub struct PageRenderer;

impl PageRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_page(&self, pdf_path: &Path, page_number: usize, dpi: u32) -> Result<DynamicImage> {
        let scratch = tempfile::Builder::new()
            .prefix("voteroll-page-")
            .tempdir()
            .with_context(|| "failed to create scratch directory for rendering")?;

        let prefix = scratch.path().join(format!("page_{:04}", page_number));
        let prefix_str = prefix
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF8 output path not supported"))?;

        // pdftoppm uses 1-based page indices; -singlefile drops the page suffix
        let status = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(pdf_path)
            .arg(prefix_str)
            .status()
            .with_context(|| "failed to invoke pdftoppm; is poppler-utils installed?")?;

        if !status.success() {
            anyhow::bail!("pdftoppm failed with status: {status}");
        }

        let image_path = prefix.with_extension("png");
        if !image_path.exists() {
            anyhow::bail!(
                "expected rendered image not found: {}",
                image_path.display()
            );
        }

        let image = image::open(&image_path)
            .with_context(|| format!("failed to decode {}", image_path.display()))?;
        debug!(
            page = page_number,
            width = image.width(),
            height = image.height(),
            "rasterized page"
        );
        Ok(image)
    }
}

impl Rasterizer for PageRenderer {
    fn rasterize(&self, pdf_path: &Path, page_number: usize, dpi: u32) -> Result<DynamicImage> {
        self.render_page(pdf_path, page_number, dpi)
    }
}
