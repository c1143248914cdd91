use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, grayscale_dilate, grayscale_erode, Mask};
use tracing::debug;

use crate::core::geometry::BoundingBox;
use crate::ocr::preprocess::otsu_binarize_inverted;

// Structuring elements are built from an image whose side must stay below 512.
const MAX_RULE_LENGTH: u32 = 511;

/// Tunables for ruling extraction and cell filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxDetectorConfig {
    /// Length of the line kernels used to pull out horizontal and vertical rulings.
    pub rule_length: u32,
    pub rule_iterations: u32,
    /// Square kernel that fuses ruling fragments into closed cell borders.
    pub fuse_size: u32,
    pub fuse_iterations: u32,
    /// A cell must be larger than `page_area / min_area_divisor`.
    pub min_area_divisor: u64,
    /// A cell must be smaller than `page_area / max_area_divisor`.
    pub max_area_divisor: u64,
    /// Boxes whose top edges differ by less than `page_height / row_band_divisor` share a row.
    pub row_band_divisor: f64,
}

impl Default for BoxDetectorConfig {
    fn default() -> Self {
        Self {
            rule_length: 60,
            rule_iterations: 2,
            fuse_size: 5,
            fuse_iterations: 3,
            min_area_divisor: 150,
            max_area_divisor: 5,
            row_band_divisor: 40.0,
        }
    }
}

/// Finds printed voter cells on a page and returns them in reading order.
#[derive(Debug, Clone, Default)]
pub struct BoxDetector {
    config: BoxDetectorConfig,
}

impl BoxDetector {
    pub fn new(config: BoxDetectorConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, page: &DynamicImage) -> Vec<BoundingBox> {
        let gray = page.to_luma8();
        self.detect_gray(&gray)
    }

    pub fn detect_gray(&self, gray: &GrayImage) -> Vec<BoundingBox> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let grid = self.ruling_mask(gray);
        let candidates = external_rects(&grid);
        let accepted = filter_by_area(candidates, self.area_bounds(width, height));
        debug!(accepted = accepted.len(), "cell candidates after area filter");

        let band = height as f64 / self.config.row_band_divisor;
        group_rows(accepted, band).into_iter().flatten().collect()
    }

    /// Exclusive `(min, max)` cell area for a page of the given size.
    pub fn area_bounds(&self, width: u32, height: u32) -> (u64, u64) {
        let page_area = width as u64 * height as u64;
        (
            page_area / self.config.min_area_divisor.max(1),
            page_area / self.config.max_area_divisor.max(1),
        )
    }

    /// Binarizes the page and keeps only long horizontal and vertical strokes,
    /// fused into closed borders.
    fn ruling_mask(&self, gray: &GrayImage) -> GrayImage {
        let binary = otsu_binarize_inverted(gray);
        let cfg = &self.config;

        let horizontal = open_rules(&binary, cfg.rule_length, Orientation::Horizontal, cfg.rule_iterations);
        let vertical = open_rules(&binary, cfg.rule_length, Orientation::Vertical, cfg.rule_iterations);
        drop(binary);

        let radius = (cfg.fuse_size / 2).min(u8::MAX as u32) as u8;
        let mut fused = add_weighted(&horizontal, 0.5, &vertical, 0.5);
        for _ in 0..cfg.fuse_iterations {
            fused = dilate(&fused, Norm::LInf, radius);
        }
        fused
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Horizontal,
    Vertical,
}

/// One-pixel-thick line element of `length` pixels.
///
/// `reflected` mirrors the anchor, which keeps an even-length opening from
/// shifting shapes by a pixel.
fn line_mask(length: u32, orientation: Orientation, reflected: bool) -> Mask {
    let length = length.clamp(1, MAX_RULE_LENGTH);
    let anchor = if reflected { length - 1 - length / 2 } else { length / 2 } as u8;
    match orientation {
        Orientation::Horizontal => {
            Mask::from_image(&GrayImage::from_pixel(length, 1, Luma([255])), anchor, 0)
        }
        Orientation::Vertical => {
            Mask::from_image(&GrayImage::from_pixel(1, length, Luma([255])), 0, anchor)
        }
    }
}

/// Erodes `iterations` times, then dilates as often with the reflected element.
fn open_rules(binary: &GrayImage, length: u32, orientation: Orientation, iterations: u32) -> GrayImage {
    let erode_mask = line_mask(length, orientation, false);
    let dilate_mask = line_mask(length, orientation, true);

    let mut mask = binary.clone();
    for _ in 0..iterations {
        mask = grayscale_erode(&mask, &erode_mask);
    }
    for _ in 0..iterations {
        mask = grayscale_dilate(&mask, &dilate_mask);
    }
    mask
}

/// Per-pixel weighted sum of two masks, rounded and saturated to `u8`.
fn add_weighted(a: &GrayImage, alpha: f32, b: &GrayImage, beta: f32) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let va = a.get_pixel(x, y)[0] as f32;
        let vb = b.get_pixel(x, y)[0] as f32;
        Luma([(va * alpha + vb * beta).round().clamp(0.0, 255.0) as u8])
    })
}

/// Bounding rectangles of the outermost contours in a mask.
fn external_rects(mask: &GrayImage) -> Vec<BoundingBox> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| BoundingBox::from_points(contour.points.iter().map(|p| (p.x, p.y))))
        .collect()
}

/// Keeps boxes whose area lies strictly between `min` and `max`.
pub fn filter_by_area(boxes: Vec<BoundingBox>, (min, max): (u64, u64)) -> Vec<BoundingBox> {
    boxes
        .into_iter()
        .filter(|b| {
            let area = b.area();
            area > min && area < max
        })
        .collect()
}

/// Groups boxes into rows of similar top edge, each row ordered left to right.
///
/// Boxes are scanned top-down. A box joins the open row while its top edge is
/// within `band` of the row's first box; otherwise the row closes and the box
/// opens the next one.
pub fn group_rows(mut boxes: Vec<BoundingBox>, band: f64) -> Vec<Vec<BoundingBox>> {
    boxes.sort_by_key(|b| b.y);

    let mut rows: Vec<Vec<BoundingBox>> = Vec::new();
    let mut current: Vec<BoundingBox> = Vec::new();
    let mut reference_y = 0u32;

    for bbox in boxes {
        if current.is_empty() {
            reference_y = bbox.y;
        } else if (bbox.y as f64 - reference_y as f64).abs() >= band {
            current.sort_by_key(|b| b.x);
            rows.push(std::mem::take(&mut current));
            reference_y = bbox.y;
        }
        current.push(bbox);
    }

    if !current.is_empty() {
        current.sort_by_key(|b| b.x);
        rows.push(current);
    }

    rows
}
