//! Output directory and filename resolution.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};

use crate::config::types::{ImageFormat, NamingConfig, OutputConfig, SnapConfig, TimestampFormat};

const MAX_BASE_NAME_LEN: usize = 50;
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// What a single default-path capture is of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind<'a> {
    Window(&'a str),
    FullScreen,
}

/// Resolves where files go and what they are called.
///
/// Built once from the loaded [`SnapConfig`]; the session id is fixed at
/// construction so every directory resolved through one resolver agrees.
#[derive(Debug, Clone)]
pub struct PathResolver {
    output: OutputConfig,
    naming: NamingConfig,
    session_id: Option<String>,
}

impl PathResolver {
    pub fn new(config: &SnapConfig) -> Self {
        let session_id = if config.output.use_session_subdirs() {
            Some(config.output.session_id.clone().unwrap_or_else(|| {
                let id = uuid::Uuid::new_v4().simple().to_string();
                format!("session_{}", &id[..8])
            }))
        } else {
            None
        };

        Self {
            output: config.output.clone(),
            naming: config.naming.clone(),
            session_id,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn image_format(&self) -> ImageFormat {
        self.naming.image_format()
    }

    /// Compute the output directory without touching the filesystem.
    ///
    /// A caller-supplied directory is used verbatim.
    pub fn output_dir_path(&self, custom: Option<&Path>) -> PathBuf {
        if let Some(dir) = custom {
            return dir.to_path_buf();
        }

        let mut dir = self.output.dir();
        if self.output.use_date_subdirs() {
            dir.push(Local::now().format("%Y-%m-%d").to_string());
        }
        if let Some(session) = &self.session_id {
            dir.push(session);
        }
        if let Some(project) = &self.output.project_name {
            dir.push(project);
        }
        dir
    }

    /// Resolve the output directory and create it if needed.
    pub fn output_dir(&self, custom: Option<&Path>) -> std::io::Result<PathBuf> {
        let dir = self.output_dir_path(custom);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Resolve the temp directory and create it if needed.
    pub fn temp_dir(&self, custom: Option<&Path>) -> std::io::Result<PathBuf> {
        let dir = custom
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.output.temp_dir());
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Configured temp directory, without creating it.
    pub fn temp_dir_path(&self) -> PathBuf {
        self.output.temp_dir()
    }

    /// Expand the naming template for one page.
    ///
    /// `{page}` and `{page:03d}` are the only recognised placeholders.
    pub fn generate_filename(
        &self,
        page: u32,
        base_name: Option<&str>,
        extension: Option<&str>,
    ) -> String {
        let template = self.naming.file_name_template();
        let mut name = template
            .replace("{page:03d}", &format!("{:03}", page))
            .replace("{page}", &page.to_string());

        if self.naming.include_timestamp() {
            name = format!("{}_{}", name, self.timestamp());
        }

        if let Some(base) = base_name {
            let safe = sanitize_filename(base);
            if !safe.is_empty() {
                name = format!("{}_{}", safe, name);
            }
        }

        let extension = extension.unwrap_or_else(|| self.naming.image_format().extension());
        format!("{}.{}", name, extension)
    }

    /// Default destination for a single capture with no explicit path.
    pub fn default_capture_path(&self, kind: CaptureKind<'_>) -> std::io::Result<PathBuf> {
        let dir = self.output_dir(None)?;
        let stamp = Utc::now().timestamp();
        let extension = self.naming.image_format().extension();
        let file = match kind {
            CaptureKind::Window(id) => {
                format!("window_{}_{}.{}", sanitize_filename(id), stamp, extension)
            }
            CaptureKind::FullScreen => format!("fullscreen_{}.{}", stamp, extension),
        };
        Ok(dir.join(file))
    }

    fn timestamp(&self) -> String {
        let now = Local::now();
        match self.naming.timestamp_format() {
            TimestampFormat::Unix => now.timestamp().to_string(),
            TimestampFormat::Custom => now
                .format(self.naming.custom_timestamp_pattern())
                .to_string(),
            TimestampFormat::Iso => now.format("%Y%m%d_%H%M%S").to_string(),
        }
    }
}

/// Strip characters that are invalid in filenames, replace spaces with
/// underscores and cap the length.
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_BASE_NAME_LEN)
        .collect();
    cleaned.trim_matches('_').to_string()
}
