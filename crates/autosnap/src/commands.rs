use std::io::Read;
use std::path::PathBuf;

use clap::ArgMatches;
use serde_json::{Value, json};
use tracing::{error, info};

use autosnap_core::{DesktopBackend, SnapError};
use autosnap_core::context::SnapContext;
use autosnap_core::events;

use crate::tools::{
    self, CaptureDocumentParams, CaptureFullScreenParams, CaptureWindowParams, ConvertToPdfParams,
    DirectoryToPdfParams, ProcessImagesParams, ToolError, WorkflowParams,
};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn run_command(matches: &ArgMatches) -> CommandResult {
    let ctx = match SnapContext::initialize() {
        Ok(ctx) => ctx,
        Err(e) => {
            events::log_app_error(&e);
            print_json(&json!({
                "status": "error",
                "error": e.to_string(),
                "error_code": e.error_code(),
            }))?;
            return Err(e.into());
        }
    };
    events::log_app_startup(ctx.environment(), ctx.backend().name());

    if let Some(summary) = ctx.prune_temp() {
        info!(
            event = "cli.temp_prune_completed",
            expired = summary.expired.len(),
            over_limit = summary.over_limit.len(),
            failed = summary.failed.len()
        );
    }

    let result = match matches.subcommand() {
        Some(("list-windows", _)) => emit(tools::list_windows(&ctx)),
        Some(("capture-window", sub_matches)) => handle_capture_window_command(&ctx, sub_matches),
        Some(("capture-full-screen", sub_matches)) => {
            handle_capture_full_screen_command(&ctx, sub_matches)
        }
        Some(("capture-document", sub_matches)) => {
            handle_capture_document_command(&ctx, sub_matches)
        }
        Some(("process-images", sub_matches)) => handle_process_images_command(sub_matches),
        Some(("convert-to-pdf", sub_matches)) => handle_convert_to_pdf_command(&ctx, sub_matches),
        Some(("directory-to-pdf", sub_matches)) => {
            handle_directory_to_pdf_command(&ctx, sub_matches)
        }
        Some(("full-workflow", sub_matches)) => handle_full_workflow_command(&ctx, sub_matches),
        Some(("check-dependencies", _)) => emit(tools::check_dependencies(&ctx)),
        Some(("environment", _)) => emit(tools::environment_info(&ctx)),
        Some(("call", sub_matches)) => handle_call_command(&ctx, sub_matches),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    };

    events::log_app_shutdown();
    result
}

fn handle_capture_window_command(ctx: &SnapContext, matches: &ArgMatches) -> CommandResult {
    let params = CaptureWindowParams {
        window_id: required(matches, "window-id")?,
        output_path: matches.get_one::<String>("output").map(PathBuf::from),
    };
    info!(event = "cli.capture_window_started", window_id = %params.window_id);
    emit(tools::capture_window(ctx, params))
}

fn handle_capture_full_screen_command(ctx: &SnapContext, matches: &ArgMatches) -> CommandResult {
    let params = CaptureFullScreenParams {
        output_path: matches.get_one::<String>("output").map(PathBuf::from),
    };
    emit(tools::capture_full_screen(ctx, params))
}

fn handle_capture_document_command(ctx: &SnapContext, matches: &ArgMatches) -> CommandResult {
    let params = CaptureDocumentParams {
        window_id: required(matches, "window-id")?,
        page_count: matches.get_one::<i64>("pages").copied().unwrap_or(0),
        output_dir: matches.get_one::<String>("output-dir").map(PathBuf::from),
        navigation_key: required(matches, "key")?,
        delay_seconds: matches.get_one::<f64>("delay").copied(),
    };
    info!(
        event = "cli.capture_document_started",
        window_id = %params.window_id,
        page_count = params.page_count
    );
    let result = tools::capture_document(ctx, params);
    if let Ok(envelope) = &result {
        info!(
            event = "cli.capture_document_completed",
            status = ?envelope["status"].as_str(),
            pages_captured = ?envelope["pages_captured"].as_u64()
        );
    }
    emit_or_reject(result)
}

fn handle_process_images_command(matches: &ArgMatches) -> CommandResult {
    let params = ProcessImagesParams {
        image_dir: PathBuf::from(required(matches, "dir")?),
        operations: matches
            .get_many::<String>("operation")
            .map(|ops| ops.cloned().collect())
            .unwrap_or_default(),
        ocr_language: required(matches, "language")?,
    };
    emit_or_reject(tools::process_images(params))
}

fn handle_convert_to_pdf_command(ctx: &SnapContext, matches: &ArgMatches) -> CommandResult {
    let params = ConvertToPdfParams {
        image_paths: matches
            .get_many::<String>("images")
            .map(|images| images.map(PathBuf::from).collect())
            .unwrap_or_default(),
        output_path: PathBuf::from(required(matches, "output")?),
        title: matches.get_one::<String>("title").cloned(),
        sort_files: !matches.get_flag("no-sort"),
    };
    emit(tools::convert_to_pdf(ctx, params))
}

fn handle_directory_to_pdf_command(ctx: &SnapContext, matches: &ArgMatches) -> CommandResult {
    let params = DirectoryToPdfParams {
        image_dir: PathBuf::from(required(matches, "dir")?),
        output_path: PathBuf::from(required(matches, "output")?),
        title: matches.get_one::<String>("title").cloned(),
        pattern: required(matches, "pattern")?,
    };
    emit(tools::directory_to_pdf(ctx, params))
}

fn handle_full_workflow_command(ctx: &SnapContext, matches: &ArgMatches) -> CommandResult {
    let params = WorkflowParams {
        window_id: required(matches, "window-id")?,
        page_count: matches.get_one::<i64>("pages").copied().unwrap_or(0),
        output_pdf: PathBuf::from(required(matches, "output-pdf")?),
        capture_dir: PathBuf::from(required(matches, "capture-dir")?),
        title: matches.get_one::<String>("title").cloned(),
        navigation_key: required(matches, "key")?,
        delay_seconds: matches.get_one::<f64>("delay").copied().unwrap_or(1.0),
        process_images_flag: !matches.get_flag("no-enhance"),
    };
    info!(
        event = "cli.full_workflow_started",
        window_id = %params.window_id,
        page_count = params.page_count
    );
    let result = tools::full_workflow(ctx, params);
    if let Ok(envelope) = &result {
        info!(
            event = "cli.full_workflow_completed",
            status = ?envelope["status"].as_str()
        );
    }
    emit_or_reject(result)
}

fn handle_call_command(ctx: &SnapContext, matches: &ArgMatches) -> CommandResult {
    let tool = required(matches, "tool")?;
    let raw = match matches.get_one::<String>("params") {
        Some(raw) => raw.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let params = match parse_params(&raw) {
        Ok(params) => params,
        Err(e) => return reject(e),
    };
    emit_or_reject(tools::dispatch(ctx, &tool, params))
}

/// Blank input means no parameters.
fn parse_params(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidParameters(e.to_string()))
}

fn required(matches: &ArgMatches, name: &str) -> Result<String, Box<dyn std::error::Error>> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("Missing required argument '{}'", name).into())
}

fn print_json(value: &Value) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a tool envelope. Tool failures stay in-band and exit zero.
fn emit(envelope: Value) -> CommandResult {
    if envelope["status"] == "error" {
        info!(event = "cli.command_reported_error", error_code = ?envelope["error_code"].as_str());
    }
    print_json(&envelope)
}

fn emit_or_reject(result: Result<Value, ToolError>) -> CommandResult {
    match result {
        Ok(envelope) => emit(envelope),
        Err(e) => reject(e),
    }
}

fn reject(e: ToolError) -> CommandResult {
    error!(event = "cli.tool_rejected", error = %e, error_code = e.error_code());
    print_json(&e.to_envelope())?;
    Err(e.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_blank_is_null() {
        assert_eq!(parse_params("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_params_object() {
        let value = parse_params(r#"{"window_id": "42"}"#).unwrap();
        assert_eq!(value["window_id"], "42");
    }

    #[test]
    fn test_parse_params_invalid_json() {
        let err = parse_params("{not json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETERS");
    }

    #[test]
    fn test_emit_error_status_stays_in_band() {
        assert!(emit(json!({ "status": "error", "error": "boom" })).is_ok());
    }

    #[test]
    fn test_reject_fails_the_command() {
        let result = reject(ToolError::UnknownTool("nope".to_string()));
        assert!(result.unwrap_err().to_string().contains("nope"));
    }
}
