use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::parser::TextLayerReader;

/// Poppler-backed access to document metadata and the embedded text layer.
#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("not a readable file: {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn page_count(&self) -> Result<usize> {
        get_page_count(&self.path)
    }
}

impl TextLayerReader for PdfReader {
    /// Runs `pdftotext` on one 1-based page.
    fn read_text_layer(&self, pdf_path: &Path, page_number: usize) -> Result<Option<String>> {
        extract_page_text(pdf_path, page_number)
    }
}

fn get_page_count(pdf_path: &Path) -> Result<usize> {
    let output = Command::new("pdfinfo")
        .arg(pdf_path)
        .output()
        .with_context(|| format!("failed to invoke pdfinfo on {}", pdf_path.display()))?;

    if !output.status.success() {
        anyhow::bail!("pdfinfo failed with status: {}", output.status);
    }

    parse_page_count(&String::from_utf8_lossy(&output.stdout)).with_context(|| {
        format!(
            "pdfinfo output did not contain a usable 'Pages:' line for {}",
            pdf_path.display()
        )
    })
}

fn parse_page_count(info: &str) -> Result<usize> {
    for line in info.lines() {
        if let Some(rest) = line.strip_prefix("Pages:") {
            let num_str = rest.trim();
            let pages: usize = num_str.parse().with_context(|| {
                format!("failed to parse page count from 'Pages:' line: {num_str}")
            })?;
            return Ok(pages);
        }
    }
    anyhow::bail!("no 'Pages:' line")
}

fn extract_page_text(pdf_path: &Path, page_number: usize) -> Result<Option<String>> {
    // "-" sends the text to stdout
    let output = Command::new("pdftotext")
        .arg("-f")
        .arg(page_number.to_string())
        .arg("-l")
        .arg(page_number.to_string())
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| "failed to invoke pdftotext; is poppler-utils installed?")?;

    if !output.status.success() {
        anyhow::bail!("pdftotext failed with status: {}", output.status);
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!(page = page_number, chars = text.len(), "read text layer");
    Ok(non_blank(text))
}

fn non_blank(text: String) -> Option<String> {
    // form feeds separate pages in pdftotext output
    if text.trim_matches(|c: char| c.is_whitespace() || c == '\u{c}').is_empty() {
        None
    } else {
        Some(text)
    }
}
