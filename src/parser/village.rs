use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::ocr::preprocess::top_band_gray;
use crate::ocr::{RecognitionProfile, Recognizer};
use crate::parser::devanagari::clean_value;

// "अनुभाग संख्या व नाम : 1-रामपुर", "Section No. & Name : 2 - Rampur"
static LABELLED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:अनुभाग|Section|वार्ड|Ward|अनुमाग).*?(?:नाम|Name|नराम)\s*[:\-]*\s*(?:\d+)?\s*[-\s]*([^\n\r]{2,60})",
    )
    .expect("static regex")
});

static BARE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:अनुभाग|Section|वार्ड|Ward|अनुमाग)\s*(?:\d+)?\s*[-\s]*([^\n\r]{2,60})")
        .expect("static regex")
});

static NUMBERS_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s/]+$").expect("static regex"));

static LEADING_DASHES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-\s]+").expect("static regex"));

// Constituency or part-number text that follows the village on the same line
static TRAILING_METADATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:भाग|विधानसभा|निर्वाचन|संख्या|क्षेत्र|(?i:\b(?:part|assembly|constituency)\b)).*")
        .expect("static regex")
});

static NUMBER_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{2,}.*").expect("static regex"));

static LEADING_NUMBERING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\-\s/]+").expect("static regex"));

/// Resolves the section/village name printed in a page banner.
#[derive(Debug, Clone)]
pub struct VillageResolver {
    profile: RecognitionProfile,
    band_fraction: f32,
}

impl Default for VillageResolver {
    fn default() -> Self {
        Self::new(RecognitionProfile::village("hin"))
    }
}

impl VillageResolver {
    pub fn new(profile: RecognitionProfile) -> Self {
        Self {
            profile,
            band_fraction: 0.15,
        }
    }

    /// Looks in the text layer first and falls back to recognizing the top of
    /// the page. Returns an empty string when neither source names a village.
    pub fn resolve(
        &self,
        text_layer: Option<&str>,
        page: &DynamicImage,
        recognizer: &dyn Recognizer,
    ) -> String {
        if let Some(village) = text_layer.and_then(find_village) {
            debug!(village = %village, "village from text layer");
            return village;
        }

        let banner = top_band_gray(page, self.band_fraction);
        match recognizer.recognize(&banner, &self.profile) {
            Ok(text) => find_village(&text).unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "village banner recognition failed");
                String::new()
            }
        }
    }
}

/// Searches `text` for a section/ward label and returns the cleaned village.
pub fn find_village(text: &str) -> Option<String> {
    let labelled = LABELLED_NAME_RE
        .captures(text)
        .map(|caps| strip_leading_dashes(caps[1].trim()))
        .filter(|v| !v.is_empty());

    let raw = labelled.or_else(|| {
        let caps = BARE_LABEL_RE.captures(text)?;
        let value = caps[1].trim();
        if NUMBERS_ONLY_RE.is_match(value) {
            return None;
        }
        Some(strip_leading_dashes(value)).filter(|v| !v.is_empty())
    })?;

    Some(clean_village(&raw)).filter(|v| !v.is_empty())
}

/// Drops constituency/part metadata and serial numbers around a village name.
pub fn clean_village(raw: &str) -> String {
    let village = TRAILING_METADATA_RE.replace(raw, "");
    let village = NUMBER_RUN_RE.replace(village.trim(), "");
    let village = LEADING_NUMBERING_RE.replace(village.trim(), "");
    village.trim().to_string()
}

fn strip_leading_dashes(value: &str) -> String {
    clean_value(&LEADING_DASHES_RE.replace(value, ""))
}
