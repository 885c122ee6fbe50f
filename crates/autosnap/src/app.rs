use clap::{Arg, ArgAction, Command};

use crate::tools::TOOL_NAMES;

pub fn build_cli() -> Command {
    Command::new("autosnap")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Window capture, multi-page document capture, OCR and PDF assembly")
        .long_about(
            "autosnap enumerates and captures desktop windows on native Linux (X11), native \
             Windows and WSL, drives a document viewer page by page to capture every page, \
             and assembles the result into a PDF. Every command prints one JSON document \
             to stdout; logs go to stderr.",
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("list-windows").about("List capturable windows"))
        .subcommand(
            Command::new("capture-window")
                .about("Capture a single window")
                .arg(window_id_arg())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Destination file (default: configured output directory)"),
                ),
        )
        .subcommand(
            Command::new("capture-full-screen")
                .about("Capture the primary screen")
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Destination file (default: configured output directory)"),
                ),
        )
        .subcommand(
            Command::new("capture-document")
                .about("Capture several pages of a document, navigating between captures")
                .arg(window_id_arg())
                .arg(pages_arg())
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .short('o')
                        .help("Directory for page_NNN images (default: configured output directory)"),
                )
                .arg(key_arg())
                .arg(delay_arg(None)),
        )
        .subcommand(
            Command::new("process-images")
                .about("Enhance, OCR, resize or deduplicate images in a directory")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .short('d')
                        .help("Directory containing images")
                        .required(true),
                )
                .arg(
                    Arg::new("operation")
                        .long("operation")
                        .help("Operation to apply; repeatable (enhance, ocr, resize, deduplicate)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .help("OCR language")
                        .default_value("eng"),
                ),
        )
        .subcommand(
            Command::new("convert-to-pdf")
                .about("Convert images to a PDF, one page per image")
                .arg(
                    Arg::new("images")
                        .help("Image files")
                        .required(true)
                        .num_args(1..),
                )
                .arg(pdf_output_arg())
                .arg(title_arg())
                .arg(
                    Arg::new("no-sort")
                        .long("no-sort")
                        .help("Keep the given order instead of sorting by name")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("directory-to-pdf")
                .about("Convert every image in a directory to a PDF")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .short('d')
                        .help("Directory containing images")
                        .required(true),
                )
                .arg(pdf_output_arg())
                .arg(title_arg())
                .arg(
                    Arg::new("pattern")
                        .long("pattern")
                        .help("File stem pattern to match")
                        .default_value("*"),
                ),
        )
        .subcommand(
            Command::new("full-workflow")
                .about("Capture a document, enhance the pages and write a PDF")
                .arg(window_id_arg())
                .arg(pages_arg())
                .arg(
                    Arg::new("output-pdf")
                        .long("output-pdf")
                        .help("Destination PDF")
                        .required(true),
                )
                .arg(
                    Arg::new("capture-dir")
                        .long("capture-dir")
                        .help("Where pages are captured; removed afterwards when named temp_*")
                        .default_value("temp_captures"),
                )
                .arg(title_arg())
                .arg(key_arg())
                .arg(delay_arg(Some("1.0")))
                .arg(
                    Arg::new("no-enhance")
                        .long("no-enhance")
                        .help("Skip image enhancement before conversion")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("check-dependencies")
                .about("Report which external tools are installed"),
        )
        .subcommand(
            Command::new("environment").about("Show the detected environment and backend"),
        )
        .subcommand(
            Command::new("call")
                .about("Invoke a tool by name with JSON parameters")
                .arg(
                    Arg::new("tool")
                        .help("Tool name")
                        .required(true)
                        .value_parser(TOOL_NAMES.to_vec()),
                )
                .arg(
                    Arg::new("params")
                        .help("JSON object of parameters (default: read from stdin)"),
                ),
        )
}

fn window_id_arg() -> Arg {
    Arg::new("window-id")
        .long("window-id")
        .short('w')
        .help("Window ID from list-windows")
        .required(true)
}

fn pages_arg() -> Arg {
    Arg::new("pages")
        .long("pages")
        .short('p')
        .help("Number of pages to capture (1-999)")
        .value_parser(clap::value_parser!(i64))
        .allow_negative_numbers(true)
        .required(true)
}

fn key_arg() -> Arg {
    Arg::new("key")
        .long("key")
        .short('k')
        .help("Navigation key (Down, PageDown, Right, Up, Left, Space, Enter, Tab)")
        .default_value("PageDown")
}

fn delay_arg(default: Option<&'static str>) -> Arg {
    let arg = Arg::new("delay")
        .long("delay")
        .help("Seconds to wait after each navigation key")
        .value_parser(clap::value_parser!(f64))
        .allow_negative_numbers(true);
    match default {
        Some(value) => arg.default_value(value),
        None => arg,
    }
}

fn pdf_output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Destination PDF")
        .required(true)
}

fn title_arg() -> Arg {
    Arg::new("title").long("title").help("PDF document title")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build() {
        let app = build_cli();
        assert_eq!(app.get_name(), "autosnap");
    }

    #[test]
    fn test_cli_capture_document() {
        let matches = build_cli()
            .try_get_matches_from(vec![
                "autosnap",
                "capture-document",
                "--window-id",
                "0x04a00007",
                "--pages",
                "3",
                "--key",
                "Page_Down",
                "--delay",
                "0.5",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("capture-document").unwrap();
        assert_eq!(sub.get_one::<String>("window-id").unwrap(), "0x04a00007");
        assert_eq!(*sub.get_one::<i64>("pages").unwrap(), 3);
        assert_eq!(sub.get_one::<String>("key").unwrap(), "Page_Down");
        assert_eq!(*sub.get_one::<f64>("delay").unwrap(), 0.5);
        assert!(sub.get_one::<String>("output-dir").is_none());
    }

    #[test]
    fn test_cli_capture_document_requires_pages() {
        let result = build_cli().try_get_matches_from(vec![
            "autosnap",
            "capture-document",
            "--window-id",
            "42",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_process_images_repeated_operations() {
        let matches = build_cli()
            .try_get_matches_from(vec![
                "autosnap",
                "process-images",
                "--dir",
                "pages",
                "--operation",
                "enhance",
                "--operation",
                "ocr",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("process-images").unwrap();
        let ops: Vec<&String> = sub.get_many::<String>("operation").unwrap().collect();
        assert_eq!(ops, vec!["enhance", "ocr"]);
        assert_eq!(sub.get_one::<String>("language").unwrap(), "eng");
    }

    #[test]
    fn test_cli_convert_to_pdf_multiple_images() {
        let matches = build_cli()
            .try_get_matches_from(vec![
                "autosnap",
                "convert-to-pdf",
                "a.png",
                "b.png",
                "--output",
                "doc.pdf",
                "--no-sort",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("convert-to-pdf").unwrap();
        assert_eq!(sub.get_many::<String>("images").unwrap().count(), 2);
        assert!(sub.get_flag("no-sort"));
    }

    #[test]
    fn test_cli_full_workflow_defaults() {
        let matches = build_cli()
            .try_get_matches_from(vec![
                "autosnap",
                "full-workflow",
                "-w",
                "42",
                "-p",
                "2",
                "--output-pdf",
                "out.pdf",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("full-workflow").unwrap();
        assert_eq!(sub.get_one::<String>("capture-dir").unwrap(), "temp_captures");
        assert_eq!(*sub.get_one::<f64>("delay").unwrap(), 1.0);
        assert!(!sub.get_flag("no-enhance"));
    }

    #[test]
    fn test_cli_call_rejects_unknown_tool() {
        let result = build_cli().try_get_matches_from(vec!["autosnap", "call", "format_disk"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_is_global() {
        let matches = build_cli()
            .try_get_matches_from(vec!["autosnap", "environment", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }
}
