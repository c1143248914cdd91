use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::core::model::{PageReport, VoterRecord};
use crate::layout::{BoxDetector, BoxDetectorConfig};
use crate::ocr::preprocess::crop;
use crate::ocr::{PageRenderer, RecognitionProfile, Rasterizer, Recognizer, TesseractBridge};
use crate::parser::{PdfReader, TextLayerReader, VillageResolver};
use crate::rescue::{RescueConfig, RescuePipeline};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub dpi: u32,
    /// Margin added around every detected cell before recognition.
    pub padding: u32,
    /// First page to process, 1-based.
    pub start_page: usize,
    /// Last page to process, inclusive. `None` runs to the end of the document.
    pub end_page: Option<usize>,
    pub rescue: RescueConfig,
    pub box_detector: BoxDetectorConfig,
    pub village_lang: String,
    /// Passed to tesseract as `--tessdata-dir` when set.
    pub tessdata_dir: Option<String>,
}

impl PipelineConfig {
    pub fn new(input: PathBuf, dpi: u32) -> Self {
        Self {
            input,
            dpi,
            padding: 15,
            start_page: 1,
            end_page: None,
            rescue: RescueConfig::default(),
            box_detector: BoxDetectorConfig::default(),
            village_lang: "hin".to_string(),
            tessdata_dir: None,
        }
    }

    pub fn with_page_range(mut self, start: Option<usize>, end: Option<usize>) -> Self {
        self.start_page = start.unwrap_or(1);
        self.end_page = end;
        self
    }

    /// Requested pages clamped to a document of `page_count` pages.
    /// `None` when nothing is left to process.
    pub fn page_range(&self, page_count: usize) -> Option<RangeInclusive<usize>> {
        let start = self.start_page.max(1);
        let end = self.end_page.unwrap_or(page_count).min(page_count);
        (start <= end).then(|| start..=end)
    }
}

/// Records of a run plus per-page diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub records: Vec<VoterRecord>,
    pub reports: Vec<PageReport>,
    pub failed_pages: Vec<usize>,
}

/// Drives one document page by page: raster, village, cells, rescue.
pub struct PageOrchestrator<'a> {
    rasterizer: &'a dyn Rasterizer,
    text_layer: &'a dyn TextLayerReader,
    recognizer: &'a dyn Recognizer,
    config: &'a PipelineConfig,
    detector: BoxDetector,
    village: VillageResolver,
}

impl<'a> PageOrchestrator<'a> {
    pub fn new(
        rasterizer: &'a dyn Rasterizer,
        text_layer: &'a dyn TextLayerReader,
        recognizer: &'a dyn Recognizer,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            rasterizer,
            text_layer,
            recognizer,
            config,
            detector: BoxDetector::new(config.box_detector.clone()),
            village: VillageResolver::new(RecognitionProfile::village(config.village_lang.clone())),
        }
    }

    /// Processes every requested page of a `page_count`-page document.
    ///
    /// A failing page is logged and skipped; the run itself only fails on
    /// conditions that affect every page.
    pub fn run(&self, page_count: usize) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        let Some(pages) = self.config.page_range(page_count) else {
            warn!(
                start = self.config.start_page,
                end = ?self.config.end_page,
                page_count,
                "requested page range is empty"
            );
            return result;
        };

        for page_number in pages {
            match self.process_page(page_number) {
                Ok((records, report)) => {
                    info!(
                        page = report.page_number,
                        village = %report.village,
                        boxes = report.candidate_boxes,
                        parsed = report.parsed,
                        "page done"
                    );
                    result.records.extend(records);
                    result.reports.push(report);
                }
                Err(err) => {
                    warn!(page = page_number, error = %format!("{err:#}"), "page skipped");
                    result.failed_pages.push(page_number);
                }
            }
        }

        info!(
            pages = result.reports.len(),
            failed = result.failed_pages.len(),
            records = result.records.len(),
            "extraction finished"
        );
        result
    }

    /// Extracts the records of one page in reading order.
    pub fn process_page(&self, page_number: usize) -> Result<(Vec<VoterRecord>, PageReport)> {
        let input = &self.config.input;
        let image = self
            .rasterizer
            .rasterize(input, page_number, self.config.dpi)
            .with_context(|| format!("failed to rasterize page {page_number}"))?;

        let text_layer = match self.text_layer.read_text_layer(input, page_number) {
            Ok(text) => text,
            Err(err) => {
                debug!(page = page_number, error = %err, "text layer unavailable");
                None
            }
        };
        let village = self
            .village
            .resolve(text_layer.as_deref(), &image, self.recognizer);

        let boxes = self.detector.detect(&image);
        debug!(page = page_number, boxes = boxes.len(), "candidate cells");

        let rescue = RescuePipeline::new(self.recognizer, self.config.rescue.clone());
        let (width, height) = (image.width(), image.height());
        let mut records = Vec::new();

        for (idx, bbox) in boxes.iter().enumerate() {
            let region = bbox.padded(self.config.padding, width, height);
            if region.is_empty() {
                continue;
            }
            let cell = crop(&image, region);

            let mut record = match rescue.run(&cell) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) => {
                    warn!(page = page_number, cell = idx + 1, error = %format!("{err:#}"), "cell skipped");
                    continue;
                }
            };

            record.stamp(idx + 1, page_number, &village);
            if record.is_identified() {
                records.push(record);
            } else {
                debug!(page = page_number, cell = idx + 1, "cell without name or code dropped");
            }
        }

        let report = PageReport {
            page_number,
            village,
            candidate_boxes: boxes.len(),
            parsed: records.len(),
        };
        Ok((records, report))
    }
}

/// Runs the whole document through the poppler and tesseract adapters.
pub fn extract_document(config: &PipelineConfig) -> Result<ExtractionResult> {
    let reader = PdfReader::new(config.input.clone())
        .with_context(|| format!("failed to open {}", config.input.display()))?;
    let page_count = reader
        .page_count()
        .with_context(|| format!("failed to read page count of {}", config.input.display()))?;
    info!(pages = page_count, input = %config.input.display(), "document opened");

    let renderer = PageRenderer::new();
    let bridge = match &config.tessdata_dir {
        Some(dir) => TesseractBridge::new().with_tessdata_dir(dir.clone()),
        None => TesseractBridge::new(),
    };
    let orchestrator = PageOrchestrator::new(&renderer, &reader, &bridge, config);
    Ok(orchestrator.run(page_count))
}
