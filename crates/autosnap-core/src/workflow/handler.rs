use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::errors::WorkflowError;
use super::types::{WorkflowReport, WorkflowRequest, WorkflowStep};
use crate::backend::DesktopBackend;
use crate::cleanup::{self, CleanupError};
use crate::config::SnapConfig;
use crate::pdf::{self, PdfOptions};
use crate::processing;
use crate::session::MultiPageCaptureOrchestrator;
use crate::window::WindowHandle;

/// Capture, enhance, convert, then drop the capture directory if it is
/// temporary.
///
/// A page that fails to enhance goes into the PDF unenhanced.
pub fn run_workflow<B: DesktopBackend + ?Sized>(
    backend: &B,
    config: &SnapConfig,
    temp_root: &Path,
    request: &WorkflowRequest,
) -> Result<WorkflowReport, WorkflowError> {
    info!(
        event = "core.workflow.started",
        window_id = %request.window_id,
        page_count = request.page_count,
        output_pdf = %request.output_pdf.display()
    );
    let mut steps = Vec::new();

    let handle = WindowHandle::from_id(request.window_id.as_str());
    let capture = MultiPageCaptureOrchestrator::from_config(backend, config).capture_document(
        &handle,
        request.page_count,
        &request.capture_dir,
        request.key,
        request.delay_secs,
    )?;
    steps.push(WorkflowStep::Capture {
        files_captured: capture.pages.len(),
        pages_skipped: capture.skipped.len(),
        output_directory: request.capture_dir.clone(),
    });
    if capture.is_empty() {
        return Err(WorkflowError::NothingCaptured {
            window_id: request.window_id.clone(),
        });
    }

    let mut pages = capture.paths();
    if request.enhance {
        let (enhanced, count) = enhance_pages(&pages);
        pages = enhanced;
        steps.push(WorkflowStep::Processing {
            enhanced_files: count,
        });
    }

    let title = request.title_or_default();
    let options = PdfOptions::from_config(config).with_title(Some(title.as_str()));
    let final_pdf = pdf::images_to_pdf(&pages, &request.output_pdf, &options)?;
    let pdf_info = pdf::pdf_info(&final_pdf);
    steps.push(WorkflowStep::PdfConversion {
        output_pdf: final_pdf.clone(),
        pdf_info: pdf_info.clone(),
    });

    match cleanup::remove_capture_dir(&request.capture_dir, temp_root) {
        Ok(true) => steps.push(WorkflowStep::Cleanup {
            cleaned_directory: request.capture_dir.clone(),
        }),
        Ok(false) | Err(CleanupError::NotTemporary { .. }) => {}
        Err(e) => warn!(
            event = "core.workflow.cleanup_failed",
            dir = %request.capture_dir.display(),
            error = %e
        ),
    }

    info!(
        event = "core.workflow.completed",
        window_id = %request.window_id,
        pages_captured = capture.pages.len(),
        final_pdf = %final_pdf.display()
    );
    Ok(WorkflowReport {
        window_id: request.window_id.clone(),
        pages_captured: capture.pages.len(),
        final_pdf,
        pdf_info,
        steps,
    })
}

fn enhance_pages(pages: &[PathBuf]) -> (Vec<PathBuf>, usize) {
    let mut enhanced_count = 0;
    let paths = pages
        .iter()
        .map(|page| match processing::enhance_image(page, None) {
            Ok(enhanced) => {
                enhanced_count += 1;
                enhanced
            }
            Err(e) => {
                warn!(
                    event = "core.workflow.enhance_failed",
                    path = %page.display(),
                    error = %e
                );
                page.clone()
            }
        })
        .collect();
    (paths, enhanced_count)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::backend::fake::FakeDesktop;
    use crate::errors::SnapError;
    use crate::window::WindowVisibility;

    fn fake() -> FakeDesktop {
        let mut fake = FakeDesktop::new(WindowVisibility::Normal, true);
        fake.write_files = true;
        fake
    }

    fn request(tmp: &Path, capture_dir: &str) -> WorkflowRequest {
        let mut request = WorkflowRequest::new("42", 3, tmp.join("out").join("doc.pdf"));
        request.capture_dir = tmp.join(capture_dir);
        request.delay_secs = 0.0;
        request
    }

    #[test]
    fn test_workflow_produces_pdf_and_removes_temp_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let fake = fake();
        let request = request(tmp.path(), "temp_captures");

        let report =
            run_workflow(&fake, &SnapConfig::default(), Path::new("/nonexistent"), &request)
                .unwrap();

        assert_eq!(report.pages_captured, 3);
        assert_eq!(report.pdf_info.page_count, Some(3));
        assert!(!request.capture_dir.exists());
        assert!(matches!(
            report.steps.as_slice(),
            [
                WorkflowStep::Capture { files_captured: 3, .. },
                WorkflowStep::Processing { enhanced_files: 3 },
                WorkflowStep::PdfConversion { .. },
                WorkflowStep::Cleanup { .. },
            ]
        ));
    }

    #[test]
    fn test_workflow_keeps_non_temporary_capture_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let fake = fake();
        let mut request = request(tmp.path(), "captures");
        request.enhance = false;

        let report =
            run_workflow(&fake, &SnapConfig::default(), Path::new("/nonexistent"), &request)
                .unwrap();

        assert!(request.capture_dir.join("page_001.png").exists());
        assert_eq!(report.steps.len(), 2);
    }

    #[test]
    fn test_workflow_with_no_pages_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut fake = fake();
        fake.failing_captures = HashSet::from([1, 2, 3]);

        let err = run_workflow(
            &fake,
            &SnapConfig::default(),
            Path::new("/nonexistent"),
            &request(tmp.path(), "temp_captures"),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "NOTHING_CAPTURED");
    }

    #[test]
    fn test_default_title_names_window() {
        let request = WorkflowRequest::new("0x1234", 1, PathBuf::from("doc.pdf"));
        assert_eq!(
            request.title_or_default(),
            "Document captured from window 0x1234"
        );
    }
}
