use anyhow::{Context, Result};
use image::{GrayImage, ImageFormat};
use std::io::Write;
use std::process::Command;
use tracing::trace;

use crate::ocr::{RecognitionProfile, Recognizer};

/// Recognition through the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct TesseractBridge {
    binary: String,
    tessdata_dir: Option<String>,
}

impl Default for TesseractBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractBridge {
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
            tessdata_dir: None,
        }
    }

    pub fn with_tessdata_dir(mut self, dir: impl Into<String>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    fn command(&self, image_path: &std::path::Path, profile: &RecognitionProfile) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&profile.lang)
            .arg("--psm")
            .arg(profile.layout.psm().to_string());
        if let Some(oem) = profile.engine_mode {
            cmd.arg("--oem").arg(oem.to_string());
        }
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd
    }
}

impl Recognizer for TesseractBridge {
    fn recognize(&self, image: &GrayImage, profile: &RecognitionProfile) -> Result<String> {
        let mut tmp = tempfile::Builder::new()
            .prefix("voteroll-")
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create temp file for recognition")?;
        image
            .write_to(&mut tmp, ImageFormat::Png)
            .with_context(|| "failed to write temp image for recognition")?;
        tmp.flush()?;

        let output = self
            .command(tmp.path(), profile)
            .output()
            .with_context(|| format!("failed to invoke {}; is tesseract installed?", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract failed ({}): {}", output.status, stderr.trim());
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        trace!(lang = %profile.lang, psm = profile.layout.psm(), chars = text.len(), "recognized");
        Ok(text)
    }
}
