use image::{imageops, DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

/// Longest side Tesseract gets to see; larger scans are scaled down.
const MAX_SIDE: u32 = 2800;

/// Gaussian sigma for the denoise pass. Enough to knock out scanner speckle
/// without merging strokes of small print.
const DENOISE_SIGMA: f32 = 0.8;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Could not decode scan: {0}")]
    Load(#[from] image::ImageError),
    #[error("Could not re-encode binarized scan: {0}")]
    Encode(String),
}

/// Decode an uploaded scan and return it binarized, as PNG bytes.
pub fn prepare_for_ocr_from_bytes(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let scan = image::load_from_memory(data)?;
    encode_as_png(&binarize(scan))
}

/// Grayscale, denoise, then Otsu threshold to pure black and white.
fn binarize(img: DynamicImage) -> DynamicImage {
    let img = if img.width() > MAX_SIDE || img.height() > MAX_SIDE {
        img.resize(MAX_SIDE, MAX_SIDE, imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let gray = img.to_luma8();

    let first = gray.pixels().next().map_or(0, |p| p[0]);
    if gray.pixels().all(|p| p[0] == first) {
        // Uniform image, nothing to separate.
        return DynamicImage::ImageLuma8(gray);
    }

    let denoised = imageops::blur(&gray, DENOISE_SIGMA);
    let threshold = otsu_threshold(&denoised);
    let binary: GrayImage = ImageBuffer::from_fn(denoised.width(), denoised.height(), |x, y| {
        if denoised.get_pixel(x, y)[0] > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    DynamicImage::ImageLuma8(binary)
}

/// Threshold maximizing between-class variance of the intensity histogram.
fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for p in gray.pixels() {
        histogram[p[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background = 0u64;
    let mut background_sum = 0f64;
    let mut best = (0u8, f64::MIN);

    for (level, &count) in histogram.iter().enumerate() {
        background += count;
        if background == 0 {
            continue;
        }
        let foreground = total - background;
        if foreground == 0 {
            break;
        }
        background_sum += level as f64 * count as f64;
        let mean_bg = background_sum / background as f64;
        let mean_fg = (weighted_total - background_sum) / foreground as f64;
        let variance = background as f64 * foreground as f64 * (mean_bg - mean_fg).powi(2);
        if variance > best.1 {
            best = (level as u8, variance);
        }
    }

    best.0
}

fn encode_as_png(img: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(png.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_page(side: u32, level: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_pixel(side, side, Luma([level])))
    }

    /// Dark "ink" block on a light page.
    fn ink_on_paper() -> GrayImage {
        ImageBuffer::from_fn(40, 40, |x, y| {
            if (10..30).contains(&x) && (10..30).contains(&y) {
                Luma([40u8])
            } else {
                Luma([210u8])
            }
        })
    }

    #[test]
    fn otsu_splits_two_levels() {
        let t = otsu_threshold(&ink_on_paper());
        assert!((40..210).contains(&t), "threshold was {t}");
    }

    #[test]
    fn binarize_yields_only_black_and_white() {
        let result = binarize(DynamicImage::ImageLuma8(ink_on_paper())).to_luma8();
        assert!(result.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(result.get_pixel(20, 20)[0], 0);
        assert_eq!(result.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn uniform_image_is_left_alone() {
        let result = binarize(flat_page(10, 128)).to_luma8();
        assert_eq!(result.dimensions(), (10, 10));
        assert!(result.pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn prepared_scan_is_png() {
        let upload = encode_as_png(&DynamicImage::ImageLuma8(ink_on_paper())).unwrap();
        let prepared = prepare_for_ocr_from_bytes(&upload).unwrap();
        assert_eq!(&prepared[..4], b"\x89PNG");
        let decoded = image::load_from_memory(&prepared).unwrap().to_luma8();
        assert_eq!(decoded.get_pixel(20, 20)[0], 0);
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        assert!(matches!(
            prepare_for_ocr_from_bytes(b"not an image"),
            Err(PreprocessError::Load(_))
        ));
    }

    #[test]
    fn oversized_scan_is_scaled_down() {
        let tall: GrayImage = ImageBuffer::from_fn(1000, 3600, |_, y| Luma([(y % 256) as u8]));
        let result = binarize(DynamicImage::ImageLuma8(tall));
        assert_eq!(result.height(), MAX_SIDE);
        assert!(result.width() < 1000);
    }
}
