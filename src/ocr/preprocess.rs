use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;

use crate::core::geometry::BoundingBox;

const INK: u8 = 0;
const PAPER: u8 = 255;

/// Crops `region` out of `image`. The region must already lie inside the image.
pub fn crop(image: &DynamicImage, region: BoundingBox) -> DynamicImage {
    image.crop_imm(region.x, region.y, region.width, region.height)
}

/// Linear enlargement with a cubic filter.
pub fn enlarge(image: &DynamicImage, factor: f32) -> DynamicImage {
    let width = ((image.width() as f32) * factor).round().max(1.0) as u32;
    let height = ((image.height() as f32) * factor).round().max(1.0) as u32;
    image.resize_exact(width, height, FilterType::CatmullRom)
}

/// Global Otsu threshold: pixels above the level become white, the rest black.
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    threshold(gray, otsu_level(gray), ThresholdType::Binary)
}

/// Global Otsu threshold with ink promoted to foreground (ink = 255).
pub fn otsu_binarize_inverted(gray: &GrayImage) -> GrayImage {
    threshold(gray, otsu_level(gray), ThresholdType::BinaryInverted)
}

/// Local Gaussian-weighted threshold over a `block_size` neighbourhood.
///
/// A pixel turns white when it is brighter than its neighbourhood mean minus
/// `offset`, which keeps text readable under uneven illumination.
pub fn adaptive_binarize(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let block_size = block_size.max(3) | 1;
    // Same sigma a Gaussian kernel of this size gets when none is given.
    let sigma = 0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let local_mean = gaussian_blur_f32(gray, sigma);

    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let mean = local_mean.get_pixel(x, y)[0] as f32;
        let value = if pixel[0] as f32 > mean - offset {
            PAPER
        } else {
            INK
        };
        out.put_pixel(x, y, Luma([value]));
    }
    out
}

/// Top `fraction` of the image, at least one row high.
pub fn top_band(gray: &GrayImage, fraction: f32) -> GrayImage {
    let height = ((gray.height() as f32) * fraction.clamp(0.0, 1.0)) as u32;
    let height = height.clamp(1, gray.height().max(1));
    imageops::crop_imm(gray, 0, 0, gray.width(), height).to_image()
}

/// Top `fraction` of a color page, converted to gray.
pub fn top_band_gray(image: &DynamicImage, fraction: f32) -> GrayImage {
    top_band(&image.to_luma8(), fraction)
}
