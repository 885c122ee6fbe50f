use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use super::errors::ProcessingError;
use super::types::{
    BatchOperation, BatchReport, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, OcrResult,
    SUPPORTED_EXTENSIONS,
};
use crate::command;

const CONTRAST_FACTOR: f32 = 1.5;
const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 0;
const MEDIAN_RADIUS: u32 = 1;
const RESIZE_JPEG_QUALITY: u8 = 90;
const OCR_TIMEOUT: Duration = Duration::from_secs(120);
const TESSERACT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Prepare an image for OCR: grayscale, stronger contrast, sharpen, then a
/// 3x3 median pass to knock out speckle.
///
/// Writes to `output`, or `<stem>_enhanced.<ext>` next to the input.
pub fn enhance_image(path: &Path, output: Option<&Path>) -> Result<PathBuf, ProcessingError> {
    ensure_exists(path)?;
    let destination = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| suffixed(path, "enhanced"));

    let gray = image::open(path)?.to_luma8();
    let contrasted = stretch_contrast(&gray, CONTRAST_FACTOR);
    let sharpened = image::imageops::unsharpen(&contrasted, SHARPEN_SIGMA, SHARPEN_THRESHOLD);
    let denoised = imageproc::filter::median_filter(&sharpened, MEDIAN_RADIUS, MEDIAN_RADIUS);

    denoised.save(&destination)?;
    info!(
        event = "core.processing.enhance_completed",
        input = %path.display(),
        output = %destination.display()
    );
    Ok(destination)
}

/// Run tesseract over an enhanced copy of `path` and return the trimmed text.
pub fn extract_text(path: &Path, language: &str) -> Result<String, ProcessingError> {
    ensure_exists(path)?;
    let scratch = std::env::temp_dir().join(format!(
        "autosnap_ocr_{}.png",
        uuid::Uuid::new_v4().simple()
    ));
    enhance_image(path, Some(&scratch))?;

    let mut cmd = Command::new("tesseract");
    cmd.arg(&scratch)
        .arg("stdout")
        .args(["--psm", "6", "-l", language]);
    let result = command::run_checked(cmd, OCR_TIMEOUT);

    if let Err(e) = fs::remove_file(&scratch) {
        debug!(
            event = "core.processing.scratch_cleanup_failed",
            path = %scratch.display(),
            error = %e
        );
    }

    let output = result?;
    let text = output.stdout.trim().to_string();
    info!(
        event = "core.processing.ocr_completed",
        input = %path.display(),
        language = language,
        characters = text.chars().count()
    );
    Ok(text)
}

/// Shrink an image to fit within `max_width` x `max_height`, keeping its
/// aspect ratio. Images already inside the box are re-saved unchanged.
pub fn resize_image(
    path: &Path,
    max_width: u32,
    max_height: u32,
    output: Option<&Path>,
) -> Result<PathBuf, ProcessingError> {
    ensure_exists(path)?;
    let destination = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| suffixed(path, "resized"));

    let img = image::open(path)?;
    let resized = if img.width() > max_width || img.height() > max_height {
        img.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        img
    };
    save_resized(&resized, &destination)?;

    info!(
        event = "core.processing.resize_completed",
        input = %path.display(),
        output = %destination.display(),
        width = resized.width(),
        height = resized.height()
    );
    Ok(destination)
}

/// Group files with identical content. Missing files are ignored.
pub fn find_duplicates<P: AsRef<Path>>(paths: &[P]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut by_hash: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for path in paths {
        let path: &Path = path.as_ref();
        match fs::read(path) {
            Ok(bytes) => {
                let digest = format!("{:x}", Sha256::digest(&bytes));
                by_hash.entry(digest).or_default().push(path.to_path_buf());
            }
            Err(e) => {
                debug!(
                    event = "core.processing.hash_skipped",
                    path = %path.display(),
                    error = %e
                );
            }
        }
    }

    by_hash.retain(|_, files| files.len() > 1);
    if !by_hash.is_empty() {
        info!(
            event = "core.processing.duplicates_found",
            groups = by_hash.len()
        );
    }
    by_hash
}

/// Supported images directly inside `dir`, sorted by path.
pub fn find_images(dir: &Path) -> Result<Vec<PathBuf>, ProcessingError> {
    if !dir.is_dir() {
        return Err(ProcessingError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    images.sort();
    Ok(images)
}

/// Apply `operations` to every image in `dir`.
///
/// An empty operation list means enhance only. A failure on one file is
/// logged and the file is skipped for the remaining operations.
pub fn process_batch(
    dir: &Path,
    operations: &[BatchOperation],
    language: &str,
) -> Result<BatchReport, ProcessingError> {
    let operations = if operations.is_empty() {
        &[BatchOperation::Enhance][..]
    } else {
        operations
    };
    let images = find_images(dir)?;

    info!(
        event = "core.processing.batch_started",
        dir = %dir.display(),
        images = images.len(),
        operations = ?operations
    );

    let mut report = BatchReport::default();
    if operations.contains(&BatchOperation::Deduplicate) {
        report.duplicates = find_duplicates(&images);
    }

    for image_path in &images {
        report.processed_files.push(image_path.clone());
        if let Err(e) = process_one(image_path, operations, language, &mut report) {
            error!(
                event = "core.processing.file_failed",
                path = %image_path.display(),
                error = %e
            );
        }
    }

    info!(
        event = "core.processing.batch_completed",
        processed = report.processed_files.len(),
        enhanced = report.enhanced_files.len(),
        ocr = report.ocr_results.len(),
        resized = report.resized_files.len()
    );
    Ok(report)
}

/// Whether the tesseract binary answers `--version` in time.
pub fn check_tesseract() -> bool {
    let mut cmd = Command::new("tesseract");
    cmd.arg("--version");
    match command::run_checked(cmd, TESSERACT_CHECK_TIMEOUT) {
        Ok(_) => true,
        Err(e) => {
            warn!(event = "core.processing.tesseract_unavailable", error = %e);
            false
        }
    }
}

fn process_one(
    path: &Path,
    operations: &[BatchOperation],
    language: &str,
    report: &mut BatchReport,
) -> Result<(), ProcessingError> {
    if operations.contains(&BatchOperation::Enhance) {
        report.enhanced_files.push(enhance_image(path, None)?);
    }
    if operations.contains(&BatchOperation::Ocr) {
        let text = extract_text(path, language)?;
        report.ocr_results.push(OcrResult {
            file: path.to_path_buf(),
            text,
        });
    }
    if operations.contains(&BatchOperation::Resize) {
        report
            .resized_files
            .push(resize_image(path, DEFAULT_MAX_WIDTH, DEFAULT_MAX_HEIGHT, None)?);
    }
    Ok(())
}

/// Scale every pixel's distance from the mean intensity by `factor`.
fn stretch_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let pixel_count = (image.width() as u64 * image.height() as u64).max(1);
    let sum: u64 = image.pixels().map(|p| p.0[0] as u64).sum();
    let mean = (sum as f32 / pixel_count as f32).round();

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y).0[0] as f32;
        let stretched = mean + (value - mean) * factor;
        Luma([stretched.round().clamp(0.0, 255.0) as u8])
    })
}

fn save_resized(img: &DynamicImage, destination: &Path) -> Result<(), ProcessingError> {
    if has_extension(destination, &["jpg", "jpeg"]) {
        let writer = BufWriter::new(File::create(destination)?);
        let mut encoder = JpegEncoder::new_with_quality(writer, RESIZE_JPEG_QUALITY);
        encoder.encode_image(&img.to_rgb8())?;
    } else {
        img.save(destination)?;
    }
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<(), ProcessingError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ProcessingError::ImageNotFound {
            path: path.to_path_buf(),
        })
    }
}

fn is_supported(path: &Path) -> bool {
    has_extension(path, SUPPORTED_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

/// `dir/name.ext` -> `dir/name_<suffix>.ext`
fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_image(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_enhance_writes_grayscale_next_to_input() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("page_001.png");
        write_image(&input, 40, 30);

        let output = enhance_image(&input, None).unwrap();
        assert_eq!(output, tmp.path().join("page_001_enhanced.png"));

        let enhanced = image::open(&output).unwrap();
        assert_eq!((enhanced.width(), enhanced.height()), (40, 30));
        assert!(matches!(enhanced, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_enhance_missing_file() {
        let err = enhance_image(Path::new("/nonexistent/page.png"), None).unwrap_err();
        assert!(matches!(err, ProcessingError::ImageNotFound { .. }));
    }

    #[test]
    fn test_extract_text_missing_file_fails_before_running_tesseract() {
        let err = extract_text(Path::new("/nonexistent/page.png"), "eng").unwrap_err();
        assert!(matches!(err, ProcessingError::ImageNotFound { .. }));
    }

    #[test]
    fn test_stretch_contrast_moves_values_away_from_mean() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 100 } else { 140 }]));
        let out = stretch_contrast(&img, 1.5);
        assert_eq!(out.get_pixel(0, 0).0[0], 90);
        assert_eq!(out.get_pixel(1, 0).0[0], 150);
    }

    #[test]
    fn test_stretch_contrast_clamps() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }]));
        let out = stretch_contrast(&img, 3.0);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("wide.png");
        write_image(&input, 400, 100);

        let output = resize_image(&input, 200, 200, None).unwrap();
        assert_eq!(output, tmp.path().join("wide_resized.png"));
        let resized = image::open(&output).unwrap();
        assert_eq!((resized.width(), resized.height()), (200, 50));
    }

    #[test]
    fn test_resize_does_not_upscale() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("small.jpg");
        write_image(&input, 50, 20);

        let output = resize_image(&input, 1920, 1080, None).unwrap();
        let resized = image::open(&output).unwrap();
        assert_eq!((resized.width(), resized.height()), (50, 20));
    }

    #[test]
    fn test_find_duplicates_groups_identical_files() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        let c = tmp.path().join("c.png");
        fs::write(&a, b"same").unwrap();
        fs::write(&b, b"same").unwrap();
        fs::write(&c, b"different").unwrap();
        let missing = tmp.path().join("missing.png");

        let dupes = find_duplicates(&[&a, &b, &c, &missing]);
        assert_eq!(dupes.len(), 1);
        let group = dupes.values().next().unwrap();
        assert_eq!(group, &vec![a, b]);
    }

    #[test]
    fn test_find_images_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.PNG"), b"x").unwrap();
        fs::write(tmp.path().join("a.jpeg"), b"x").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(tmp.path().join("sub.png")).unwrap();

        let images = find_images(tmp.path()).unwrap();
        assert_eq!(
            images,
            vec![tmp.path().join("a.jpeg"), tmp.path().join("b.PNG")]
        );
    }

    #[test]
    fn test_process_batch_enhance_resize_and_dedup() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("page_001.png");
        let second = tmp.path().join("page_002.png");
        write_image(&first, 60, 40);
        fs::copy(&first, &second).unwrap();

        let report = process_batch(
            tmp.path(),
            &[
                BatchOperation::Enhance,
                BatchOperation::Resize,
                BatchOperation::Deduplicate,
            ],
            "eng",
        )
        .unwrap();

        assert_eq!(report.processed_files, vec![first.clone(), second.clone()]);
        assert_eq!(report.enhanced_files.len(), 2);
        assert_eq!(report.resized_files.len(), 2);
        assert_eq!(report.duplicates.len(), 1);
        assert!(report.ocr_results.is_empty());
    }

    #[test]
    fn test_process_batch_skips_unreadable_file() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good.png");
        let bad = tmp.path().join("bad.png");
        write_image(&good, 10, 10);
        fs::write(&bad, b"not an image").unwrap();

        let report = process_batch(tmp.path(), &[], "eng").unwrap();
        assert_eq!(report.processed_files.len(), 2);
        assert_eq!(report.enhanced_files, vec![tmp.path().join("good_enhanced.png")]);
    }

    #[test]
    fn test_process_batch_rejects_missing_dir() {
        let err = process_batch(Path::new("/nonexistent/dir"), &[], "eng").unwrap_err();
        assert!(matches!(err, ProcessingError::NotADirectory { .. }));
    }

    #[test]
    fn test_suffixed() {
        assert_eq!(
            suffixed(Path::new("/tmp/page.png"), "enhanced"),
            PathBuf::from("/tmp/page_enhanced.png")
        );
        assert_eq!(
            suffixed(Path::new("/tmp/page"), "resized"),
            PathBuf::from("/tmp/page_resized")
        );
    }
}
