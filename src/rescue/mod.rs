//! Escalating re-recognition of one voter cell.
//!
//! A cell gets a clean global-threshold read first. Cells that come back
//! without an identity code or a name get a second read on a locally
//! thresholded image, and cells still missing the code get a final read of
//! just the header band with a Latin-only profile.

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use tracing::{debug, warn};

use crate::core::model::{CellParse, VoterRecord, UNKNOWN};
use crate::ocr::preprocess::{adaptive_binarize, enlarge, otsu_binarize, top_band};
use crate::ocr::{RecognitionProfile, Recognizer};
use crate::parser::cell_text::{extract_epic, normalize_epic, parse_cell_text};

#[derive(Debug, Clone, PartialEq)]
pub struct RescueConfig {
    /// Enlargement applied to the padded cell before any thresholding.
    pub scale: f32,
    pub adaptive_block: u32,
    pub adaptive_offset: f32,
    /// Share of the cell height read by the identity-code pass.
    pub header_fraction: f32,
    pub body_profile: RecognitionProfile,
    pub header_profile: RecognitionProfile,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self {
            scale: 2.5,
            adaptive_block: 21,
            adaptive_offset: 10.0,
            header_fraction: 0.4,
            body_profile: RecognitionProfile::body("hin+eng"),
            header_profile: RecognitionProfile::header("eng"),
        }
    }
}

pub struct RescuePipeline<'a> {
    recognizer: &'a dyn Recognizer,
    config: RescueConfig,
}

impl<'a> RescuePipeline<'a> {
    pub fn new(recognizer: &'a dyn Recognizer, config: RescueConfig) -> Self {
        Self { recognizer, config }
    }

    /// Reads one padded cell. `Ok(None)` means the cell is marked deleted.
    ///
    /// The returned record may still be unidentified; callers decide whether
    /// to keep it.
    pub fn run(&self, cell: &DynamicImage) -> Result<Option<VoterRecord>> {
        let gray = enlarge(cell, self.config.scale).to_luma8();

        let text = self
            .recognizer
            .recognize(&otsu_binarize(&gray), &self.config.body_profile)
            .with_context(|| "cell recognition failed")?;
        let mut record = match parse_cell_text(&text) {
            CellParse::Record(record) => record,
            CellParse::Deleted => {
                debug!("cell carries a deletion marker");
                return Ok(None);
            }
        };

        if record.needs_rescue() {
            self.adaptive_pass(&gray, &mut record);
        }

        if !record.has_epic() {
            self.header_pass(&gray, &mut record);
        }

        Ok(Some(record))
    }

    fn adaptive_pass(&self, gray: &GrayImage, record: &mut VoterRecord) {
        let binary = adaptive_binarize(gray, self.config.adaptive_block, self.config.adaptive_offset);
        let text = self.recognize_or_empty(&binary, &self.config.body_profile, "adaptive");
        match parse_cell_text(&text) {
            CellParse::Record(alternate) => record.fill_missing_from(&alternate),
            // a marker only this read sees does not void the first read
            CellParse::Deleted => debug!("adaptive pass saw a deletion marker; ignored"),
        }
    }

    fn header_pass(&self, gray: &GrayImage, record: &mut VoterRecord) {
        let header = otsu_binarize(&top_band(gray, self.config.header_fraction));
        let text = self.recognize_or_empty(&header, &self.config.header_profile, "header");

        let mut epic = extract_epic(&text);
        if epic == UNKNOWN {
            epic = normalize_epic(&text);
        }
        if epic != UNKNOWN {
            debug!(epic = %epic, "identity code recovered from header");
            record.epic = epic;
        }
    }

    fn recognize_or_empty(&self, image: &GrayImage, profile: &RecognitionProfile, pass: &str) -> String {
        match self.recognizer.recognize(image, profile) {
            Ok(text) => text,
            Err(err) => {
                warn!(pass, error = %err, "rescue recognition failed");
                String::new()
            }
        }
    }
}
