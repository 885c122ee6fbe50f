//! JSON-in/JSON-out operations shared by the subcommands and `call`.
//!
//! Every tool returns a JSON envelope whose `status` is `success`, `warning`
//! or `error`. Operational failures are reported inside the envelope;
//! only malformed requests surface as [`ToolError`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

use autosnap_core::SnapError;
use autosnap_core::context::SnapContext;
use autosnap_core::events;
use autosnap_core::pdf::{self, PdfOptions, size_mb};
use autosnap_core::processing::{self, BatchOperation};
use autosnap_core::window::NavigationKey;
use autosnap_core::workflow::{DEFAULT_CAPTURE_DIR, WorkflowError, WorkflowRequest};

pub const TOOL_NAMES: &[&str] = &[
    "list_windows",
    "capture_window",
    "capture_full_screen",
    "capture_document_pages",
    "process_images",
    "convert_to_pdf",
    "directory_to_pdf",
    "full_document_workflow",
    "check_system_dependencies",
    "environment_info",
];

/// A request that could not be turned into a tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl ToolError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "UNKNOWN_TOOL",
            ToolError::InvalidParameters(_) => "INVALID_PARAMETERS",
        }
    }

    pub fn to_envelope(&self) -> Value {
        json!({
            "status": "error",
            "error": self.to_string(),
            "error_code": self.error_code(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureWindowParams {
    pub window_id: String,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureFullScreenParams {
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureDocumentParams {
    pub window_id: String,
    pub page_count: i64,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_navigation_key")]
    pub navigation_key: String,
    #[serde(default)]
    pub delay_seconds: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessImagesParams {
    pub image_dir: PathBuf,
    #[serde(default)]
    pub operations: Vec<String>,
    #[serde(default = "default_language")]
    pub ocr_language: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertToPdfParams {
    pub image_paths: Vec<PathBuf>,
    pub output_path: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub sort_files: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryToPdfParams {
    pub image_dir: PathBuf,
    pub output_path: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowParams {
    pub window_id: String,
    pub page_count: i64,
    pub output_pdf: PathBuf,
    #[serde(default = "default_capture_dir")]
    pub capture_dir: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_navigation_key")]
    pub navigation_key: String,
    #[serde(default = "default_delay")]
    pub delay_seconds: f64,
    #[serde(default = "default_true")]
    pub process_images_flag: bool,
}

fn default_navigation_key() -> String {
    NavigationKey::PageDown.name().to_string()
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pattern() -> String {
    "*".to_string()
}

fn default_capture_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CAPTURE_DIR)
}

fn default_delay() -> f64 {
    1.0
}

/// Run `tool` with JSON `params`. A `null` params value means "no
/// parameters".
pub fn dispatch(ctx: &SnapContext, tool: &str, params: Value) -> Result<Value, ToolError> {
    info!(event = "cli.tool_dispatch_started", tool = tool);
    let params = if params.is_null() { json!({}) } else { params };

    match tool {
        "list_windows" => Ok(list_windows(ctx)),
        "capture_window" => Ok(capture_window(ctx, parse(params)?)),
        "capture_full_screen" => Ok(capture_full_screen(ctx, parse(params)?)),
        "capture_document_pages" => capture_document(ctx, parse(params)?),
        "process_images" => process_images(parse(params)?),
        "convert_to_pdf" => Ok(convert_to_pdf(ctx, parse(params)?)),
        "directory_to_pdf" => Ok(directory_to_pdf(ctx, parse(params)?)),
        "full_document_workflow" => full_workflow(ctx, parse(params)?),
        "check_system_dependencies" => Ok(check_dependencies(ctx)),
        "environment_info" => Ok(environment_info(ctx)),
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, ToolError> {
    serde_json::from_value(params).map_err(|e| ToolError::InvalidParameters(e.to_string()))
}

fn parse_key(name: &str) -> Result<NavigationKey, ToolError> {
    name.parse::<NavigationKey>()
        .map_err(|e| ToolError::InvalidParameters(e.to_string()))
}

/// Error envelope carrying the error's code, merged with `context` fields.
fn failure(err: &dyn SnapError, context: Value) -> Value {
    events::log_app_error(err);
    let mut envelope = json!({
        "status": "error",
        "error": err.to_string(),
        "error_code": err.error_code(),
    });
    merge(&mut envelope, context);
    envelope
}

fn merge(target: &mut Value, extra: Value) {
    if let (Some(target), Value::Object(extra)) = (target.as_object_mut(), extra) {
        target.extend(extra);
    }
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

pub fn list_windows(ctx: &SnapContext) -> Value {
    let windows = ctx.list_windows();
    json!({
        "status": "success",
        "count": windows.len(),
        "windows": windows,
        "environment": ctx.environment(),
    })
}

pub fn capture_window(ctx: &SnapContext, params: CaptureWindowParams) -> Value {
    match ctx.capture_window(&params.window_id, params.output_path.as_deref()) {
        Ok(path) => json!({
            "status": "success",
            "window_id": params.window_id,
            "file_exists": path.exists(),
            "file_size_mb": size_mb(file_size(&path)),
            "output_path": path,
        }),
        Err(e) => failure(
            &e,
            json!({ "window_id": params.window_id, "output_path": params.output_path }),
        ),
    }
}

pub fn capture_full_screen(ctx: &SnapContext, params: CaptureFullScreenParams) -> Value {
    match ctx.capture_full_screen(params.output_path.as_deref()) {
        Ok(path) => json!({
            "status": "success",
            "file_exists": path.exists(),
            "file_size_mb": size_mb(file_size(&path)),
            "output_path": path,
        }),
        Err(e) => failure(&e, json!({ "output_path": params.output_path })),
    }
}

pub fn capture_document(
    ctx: &SnapContext,
    params: CaptureDocumentParams,
) -> Result<Value, ToolError> {
    let key = parse_key(&params.navigation_key)?;
    let output_dir = ctx.document_dir(params.output_dir.as_deref());

    let envelope = match ctx.capture_document(
        &params.window_id,
        params.page_count,
        Some(&output_dir),
        key,
        params.delay_seconds,
    ) {
        Ok(capture) => {
            let total: u64 = capture.pages.iter().map(|p| file_size(&p.path)).sum();
            let status = if capture.skipped.is_empty() && capture.restored {
                "success"
            } else {
                "warning"
            };
            json!({
                "status": status,
                "window_id": params.window_id,
                "pages_captured": capture.pages.len(),
                "output_directory": output_dir,
                "captured_files": capture.paths(),
                "skipped_pages": capture.skipped,
                "window_restored": capture.restored,
                "total_size_mb": size_mb(total),
            })
        }
        Err(failed) => failure(
            &failed.error,
            json!({
                "window_id": params.window_id,
                "page_count": params.page_count,
                "output_directory": output_dir,
                "captured_files": failed.paths(),
                "skipped_pages": failed.skipped,
            }),
        ),
    };
    Ok(envelope)
}

pub fn process_images(params: ProcessImagesParams) -> Result<Value, ToolError> {
    let operations = BatchOperation::parse_all(&params.operations)
        .map_err(|e| ToolError::InvalidParameters(e.to_string()))?;

    let envelope = match processing::process_batch(
        &params.image_dir,
        &operations,
        &params.ocr_language,
    ) {
        Ok(report) => json!({
            "status": "success",
            "image_directory": params.image_dir,
            "operations": operations,
            "ocr_language": params.ocr_language,
            "results": report,
        }),
        Err(e) => failure(
            &e,
            json!({ "image_directory": params.image_dir, "operations": operations }),
        ),
    };
    Ok(envelope)
}

pub fn convert_to_pdf(ctx: &SnapContext, params: ConvertToPdfParams) -> Value {
    let validation = pdf::validate_images_for_pdf(&params.image_paths);
    if validation.valid_images.is_empty() {
        return failure(
            &pdf::PdfError::NoValidImages,
            json!({ "validation": validation, "output_pdf": params.output_path }),
        );
    }

    let options = PdfOptions::from_config(ctx.config())
        .with_title(params.title.as_deref())
        .with_sort(params.sort_files);
    match pdf::images_to_pdf(&validation.valid_images, &params.output_path, &options) {
        Ok(path) => json!({
            "status": if validation.has_problems() { "warning" } else { "success" },
            "input_images": params.image_paths.len(),
            "valid_images": validation.valid_images.len(),
            "pdf_info": pdf::pdf_info(&path),
            "output_pdf": path,
            "validation": validation,
        }),
        Err(e) => failure(
            &e,
            json!({
                "input_images": params.image_paths.len(),
                "output_pdf": params.output_path,
            }),
        ),
    }
}

pub fn directory_to_pdf(ctx: &SnapContext, params: DirectoryToPdfParams) -> Value {
    let options = PdfOptions::from_config(ctx.config()).with_title(params.title.as_deref());
    match pdf::directory_to_pdf(
        &params.image_dir,
        &params.output_path,
        &params.pattern,
        &options,
    ) {
        Ok(path) => json!({
            "status": "success",
            "input_directory": params.image_dir,
            "pattern": params.pattern,
            "pdf_info": pdf::pdf_info(&path),
            "output_pdf": path,
        }),
        Err(e) => failure(
            &e,
            json!({
                "input_directory": params.image_dir,
                "output_pdf": params.output_path,
            }),
        ),
    }
}

pub fn full_workflow(ctx: &SnapContext, params: WorkflowParams) -> Result<Value, ToolError> {
    let key = parse_key(&params.navigation_key)?;
    let request = WorkflowRequest {
        window_id: params.window_id.clone(),
        page_count: params.page_count,
        output_pdf: params.output_pdf.clone(),
        capture_dir: params.capture_dir,
        title: params.title,
        key,
        delay_secs: params.delay_seconds,
        enhance: params.process_images_flag,
    };

    let envelope = match ctx.full_workflow(&request) {
        Ok(report) => {
            let mut envelope = json!({ "status": "success" });
            merge(&mut envelope, json!(report));
            envelope
        }
        Err(e) => {
            let captured: Vec<&Path> = match &e {
                WorkflowError::Capture { source } => source.paths(),
                _ => Vec::new(),
            };
            failure(
                &e,
                json!({
                    "window_id": params.window_id,
                    "page_count": params.page_count,
                    "output_pdf": params.output_pdf,
                    "captured_files": captured,
                }),
            )
        }
    };
    Ok(envelope)
}

pub fn check_dependencies(ctx: &SnapContext) -> Value {
    let report = ctx.check_dependencies();
    let dependencies: serde_json::Map<String, Value> = report
        .dependencies
        .iter()
        .map(|d| (d.name.to_string(), json!(d.available)))
        .collect();
    let install_commands: serde_json::Map<String, Value> = report
        .dependencies
        .iter()
        .map(|d| (d.name.to_string(), json!(d.install_hint)))
        .collect();

    let mut envelope = json!({
        "status": "success",
        "environment": report.environment,
        "dependencies": dependencies,
        "missing_dependencies": report.missing(),
        "install_commands": install_commands,
    });
    if !report.all_available() {
        merge(
            &mut envelope,
            json!({ "status": "warning", "message": "Some dependencies are missing" }),
        );
    }
    envelope
}

pub fn environment_info(ctx: &SnapContext) -> Value {
    let mut envelope = json!({ "status": "success" });
    merge(&mut envelope, json!(ctx.environment_info()));
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_document_params_defaults() {
        let params: CaptureDocumentParams =
            parse(json!({ "window_id": "42", "page_count": 3 })).unwrap();
        assert_eq!(params.navigation_key, "PageDown");
        assert!(params.output_dir.is_none());
        assert!(params.delay_seconds.is_none());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = parse::<CaptureWindowParams>(json!({ "window_id": "1", "bogus": true }))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETERS");
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let err = parse::<ConvertToPdfParams>(json!({ "image_paths": [] })).unwrap_err();
        assert!(err.to_string().contains("output_path"));
    }

    #[test]
    fn test_workflow_params_defaults() {
        let params: WorkflowParams = parse(json!({
            "window_id": "42",
            "page_count": 2,
            "output_pdf": "doc.pdf"
        }))
        .unwrap();
        assert_eq!(params.capture_dir, PathBuf::from("temp_captures"));
        assert_eq!(params.navigation_key, "PageDown");
        assert_eq!(params.delay_seconds, 1.0);
        assert!(params.process_images_flag);
    }

    #[test]
    fn test_parse_key_rejects_unknown() {
        let err = parse_key("F13").unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters(_)));
        assert_eq!(parse_key("Page_Down").unwrap(), NavigationKey::PageDown);
    }

    #[test]
    fn test_merge_overrides_fields() {
        let mut target = json!({ "status": "success", "a": 1 });
        merge(&mut target, json!({ "status": "warning", "b": 2 }));
        assert_eq!(target, json!({ "status": "warning", "a": 1, "b": 2 }));
    }

    #[test]
    fn test_tool_error_envelope() {
        let envelope = ToolError::UnknownTool("nope".to_string()).to_envelope();
        assert_eq!(envelope["status"], "error");
        assert_eq!(envelope["error"], "Unknown tool 'nope'");
        assert_eq!(envelope["error_code"], "UNKNOWN_TOOL");
    }
}
