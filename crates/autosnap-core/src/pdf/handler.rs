use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use tracing::{info, warn};

use super::errors::PdfError;
use super::types::{ImageValidation, PDF_IMAGE_EXTENSIONS, PdfInfo, PdfOptions, size_mb};

const POINTS_PER_INCH: f32 = 72.0;

/// Sort `paths` into valid, invalid, missing and unsupported.
///
/// An image is valid when its header decodes to a size.
pub fn validate_images_for_pdf<P: AsRef<Path>>(paths: &[P]) -> ImageValidation {
    let mut report = ImageValidation::default();
    let mut total_bytes = 0u64;

    for path in paths {
        let path: &Path = path.as_ref();
        if !path.exists() {
            report.missing_files.push(path.to_path_buf());
            continue;
        }
        if !is_pdf_image(path) {
            report.unsupported_formats.push(path.to_path_buf());
            continue;
        }
        match image::image_dimensions(path) {
            Ok(_) => {
                total_bytes += fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                report.valid_images.push(path.to_path_buf());
            }
            Err(e) => {
                warn!(
                    event = "core.pdf.invalid_image",
                    path = %path.display(),
                    error = %e
                );
                report.invalid_images.push(path.to_path_buf());
            }
        }
    }

    report.total_size_mb = size_mb(total_bytes);
    info!(
        event = "core.pdf.validation_completed",
        valid = report.valid_images.len(),
        invalid = report.invalid_images.len(),
        missing = report.missing_files.len(),
        unsupported = report.unsupported_formats.len()
    );
    report
}

/// Write one PDF page per image to `destination`.
///
/// Missing files and unsupported formats are dropped with a warning. Each
/// page is sized so the image renders at `options.dpi`.
pub fn images_to_pdf<P: AsRef<Path>>(
    paths: &[P],
    destination: &Path,
    options: &PdfOptions,
) -> Result<PathBuf, PdfError> {
    let mut pages: Vec<PathBuf> = Vec::new();
    for path in paths {
        let path: &Path = path.as_ref();
        if !path.exists() {
            warn!(event = "core.pdf.file_not_found", path = %path.display());
        } else if !is_pdf_image(path) {
            warn!(event = "core.pdf.unsupported_format", path = %path.display());
        } else {
            pages.push(path.to_path_buf());
        }
    }
    if pages.is_empty() {
        return Err(PdfError::NoValidImages);
    }
    if options.sort_files {
        pages.sort();
    }

    info!(
        event = "core.pdf.conversion_started",
        pages = pages.len(),
        destination = %destination.display()
    );

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut doc = build_document(&pages, options)?;
    doc.compress();
    doc.save(destination).map_err(|e| PdfError::WriteFailed {
        path: destination.to_path_buf(),
        message: e.to_string(),
    })?;

    info!(
        event = "core.pdf.conversion_completed",
        pages = pages.len(),
        destination = %destination.display()
    );
    Ok(destination.to_path_buf())
}

/// Convert every supported image in `dir` whose stem matches `pattern`.
pub fn directory_to_pdf(
    dir: &Path,
    destination: &Path,
    pattern: &str,
    options: &PdfOptions,
) -> Result<PathBuf, PdfError> {
    let mut found = BTreeSet::new();
    for ext in PDF_IMAGE_EXTENSIONS {
        for variant in [ext.to_string(), ext.to_ascii_uppercase()] {
            let glob_pattern = dir.join(format!("{}.{}", pattern, variant));
            let glob_pattern = glob_pattern.to_string_lossy();
            let entries = glob::glob(&glob_pattern).map_err(|e| PdfError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
            found.extend(entries.filter_map(Result::ok).filter(|p| p.is_file()));
        }
    }

    if found.is_empty() {
        return Err(PdfError::NoImagesInDirectory {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    info!(
        event = "core.pdf.directory_scanned",
        dir = %dir.display(),
        images = found.len()
    );
    let images: Vec<PathBuf> = found.into_iter().collect();
    images_to_pdf(&images, destination, &options.clone().with_sort(true))
}

/// Size and page count of a PDF on disk.
pub fn pdf_info(path: &Path) -> PdfInfo {
    let Ok(metadata) = fs::metadata(path) else {
        return PdfInfo {
            path: path.to_path_buf(),
            exists: false,
            size_bytes: 0,
            size_mb: 0.0,
            page_count: None,
        };
    };

    let page_count = match Document::load(path) {
        Ok(doc) => Some(doc.get_pages().len()),
        Err(e) => {
            warn!(event = "core.pdf.load_failed", path = %path.display(), error = %e);
            None
        }
    };

    PdfInfo {
        path: path.to_path_buf(),
        exists: true,
        size_bytes: metadata.len(),
        size_mb: size_mb(metadata.len()),
        page_count,
    }
}

fn build_document(pages: &[PathBuf], options: &PdfOptions) -> Result<Document, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let dpi = options.dpi.max(1) as f32;
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for path in pages {
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut pixels = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            rgb.into_raw(),
        );
        pixels.compress()?;
        let image_id = doc.add_object(pixels);

        let page_width = width as f32 * POINTS_PER_INCH / dpi;
        let page_height = height as f32 * POINTS_PER_INCH / dpi;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(page_width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(page_height),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_width),
                Object::Real(page_height),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(options.title.as_str()),
        "Producer" => Object::string_literal("autosnap"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    Ok(doc)
}

fn is_pdf_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PDF_IMAGE_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_image(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([200, 30, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_validate_sorts_inputs_into_buckets() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good.png");
        let corrupt = tmp.path().join("corrupt.png");
        let gif = tmp.path().join("anim.gif");
        write_image(&good, 4, 4);
        fs::write(&corrupt, b"garbage").unwrap();
        fs::write(&gif, b"GIF89a").unwrap();
        let missing = tmp.path().join("missing.png");

        let report = validate_images_for_pdf(&[&good, &corrupt, &gif, &missing]);
        assert_eq!(report.valid_images, vec![good]);
        assert_eq!(report.invalid_images, vec![corrupt]);
        assert_eq!(report.unsupported_formats, vec![gif]);
        assert_eq!(report.missing_files, vec![missing]);
        assert!(report.has_problems());
    }

    #[test]
    fn test_images_to_pdf_one_page_per_image() {
        let tmp = tempfile::tempdir().unwrap();
        let second = tmp.path().join("page_002.png");
        let first = tmp.path().join("page_001.png");
        write_image(&first, 300, 150);
        write_image(&second, 150, 300);
        let destination = tmp.path().join("nested").join("doc.pdf");

        let written = images_to_pdf(
            &[&second, &first],
            &destination,
            &PdfOptions::default().with_title(Some("Quarterly")),
        )
        .unwrap();

        assert_eq!(written, destination);
        let info = pdf_info(&destination);
        assert!(info.exists);
        assert!(info.size_bytes > 0);
        assert_eq!(info.page_count, Some(2));

        let doc = Document::load(&destination).unwrap();
        let info_dict = doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .unwrap();
        let title = info_dict.get(b"Title").and_then(Object::as_str).unwrap();
        assert_eq!(title, b"Quarterly");
    }

    #[test]
    fn test_page_size_follows_dpi() {
        let tmp = tempfile::tempdir().unwrap();
        let image = tmp.path().join("page.png");
        write_image(&image, 300, 150);
        let destination = tmp.path().join("doc.pdf");

        images_to_pdf(&[&image], &destination, &PdfOptions::default()).unwrap();

        let doc = Document::load(&destination).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").and_then(Object::as_array).unwrap();
        let width = media_box[2].as_float().unwrap();
        let height = media_box[3].as_float().unwrap();
        assert!((width - 144.0).abs() < 0.01);
        assert!((height - 72.0).abs() < 0.01);
    }

    #[test]
    fn test_images_to_pdf_without_valid_images() {
        let tmp = tempfile::tempdir().unwrap();
        let text = tmp.path().join("notes.txt");
        fs::write(&text, b"x").unwrap();

        let err = images_to_pdf(
            &[text, tmp.path().join("missing.png")],
            &tmp.path().join("out.pdf"),
            &PdfOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PdfError::NoValidImages));
        assert!(!tmp.path().join("out.pdf").exists());
    }

    #[test]
    fn test_directory_to_pdf_matches_pattern() {
        let tmp = tempfile::tempdir().unwrap();
        write_image(&tmp.path().join("page_001.png"), 10, 10);
        write_image(&tmp.path().join("page_002.PNG"), 10, 10);
        write_image(&tmp.path().join("cover.png"), 10, 10);
        let destination = tmp.path().join("doc.pdf");

        directory_to_pdf(tmp.path(), &destination, "page_*", &PdfOptions::default()).unwrap();
        assert_eq!(pdf_info(&destination).page_count, Some(2));
    }

    #[test]
    fn test_directory_to_pdf_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let err = directory_to_pdf(
            tmp.path(),
            &tmp.path().join("doc.pdf"),
            "*",
            &PdfOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PdfError::NoImagesInDirectory { .. }));
    }

    #[test]
    fn test_pdf_info_missing_file() {
        let info = pdf_info(Path::new("/nonexistent/doc.pdf"));
        assert!(!info.exists);
        assert_eq!(info.size_bytes, 0);
        assert_eq!(info.page_count, None);
    }
}
