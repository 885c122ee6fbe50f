use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use super::errors::CleanupError;
use super::operations;
use super::types::PruneSummary;

/// Delete a capture directory, but only one that is clearly temporary:
/// its name starts with `temp_` or it lives inside `temp_root`.
///
/// Returns `false` when the directory was already gone.
pub fn remove_capture_dir(dir: &Path, temp_root: &Path) -> Result<bool, CleanupError> {
    if !operations::is_disposable(dir, temp_root) {
        warn!(event = "core.cleanup.remove_refused", path = %dir.display());
        return Err(CleanupError::NotTemporary {
            path: dir.to_path_buf(),
        });
    }
    if !dir.exists() {
        debug!(event = "core.cleanup.remove_skipped", path = %dir.display());
        return Ok(false);
    }

    fs::remove_dir_all(dir).map_err(|source| CleanupError::RemoveFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    info!(event = "core.cleanup.remove_completed", path = %dir.display());
    Ok(true)
}

/// Delete expired files from `temp_dir`, then the oldest beyond `max_files`.
///
/// Only regular files directly inside `temp_dir` are considered. A file that
/// cannot be removed is recorded in `failed` and skipped.
pub fn prune_temp_dir(
    temp_dir: &Path,
    retention: Duration,
    max_files: usize,
) -> Result<PruneSummary, CleanupError> {
    if !temp_dir.is_dir() {
        return Ok(PruneSummary::default());
    }

    let files = fs::read_dir(temp_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            Some((entry.path(), metadata.modified().ok()?))
        })
        .collect();

    let (expired, over_limit) =
        operations::select_for_pruning(files, SystemTime::now(), retention, max_files);

    let mut summary = PruneSummary::default();
    for (path, bucket) in expired
        .into_iter()
        .map(|p| (p, true))
        .chain(over_limit.into_iter().map(|p| (p, false)))
    {
        match fs::remove_file(&path) {
            Ok(()) if bucket => summary.expired.push(path),
            Ok(()) => summary.over_limit.push(path),
            Err(e) => {
                warn!(
                    event = "core.cleanup.prune_file_failed",
                    path = %path.display(),
                    error = %e
                );
                summary.failed.push(path);
            }
        }
    }

    if summary.removed() > 0 || !summary.failed.is_empty() {
        info!(
            event = "core.cleanup.prune_completed",
            temp_dir = %temp_dir.display(),
            expired = summary.expired.len(),
            over_limit = summary.over_limit.len(),
            failed = summary.failed.len()
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_remove_temp_named_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let captures = tmp.path().join("temp_captures");
        fs::create_dir(&captures).unwrap();
        fs::write(captures.join("page_001.png"), b"x").unwrap();

        assert!(remove_capture_dir(&captures, Path::new("/nonexistent-temp-root")).unwrap());
        assert!(!captures.exists());
        assert!(!remove_capture_dir(&captures, Path::new("/nonexistent-temp-root")).unwrap());
    }

    #[test]
    fn test_remove_refuses_ordinary_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let captures = tmp.path().join("captures");
        fs::create_dir(&captures).unwrap();

        let err = remove_capture_dir(&captures, Path::new("/nonexistent-temp-root")).unwrap_err();
        assert!(matches!(err, CleanupError::NotTemporary { .. }));
        assert!(captures.exists());
    }

    #[test]
    fn test_prune_removes_expired_and_excess() {
        let tmp = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        for (name, age_hours) in [("old.png", 48), ("a.png", 3), ("b.png", 2), ("c.png", 1)] {
            let path = tmp.path().join(name);
            let file = File::create(&path).unwrap();
            file.set_modified(now - Duration::from_secs(age_hours * 3600))
                .unwrap();
        }
        fs::create_dir(tmp.path().join("subdir")).unwrap();

        let summary = prune_temp_dir(tmp.path(), Duration::from_secs(24 * 3600), 2).unwrap();
        assert_eq!(summary.expired, vec![tmp.path().join("old.png")]);
        assert_eq!(summary.over_limit, vec![tmp.path().join("a.png")]);
        assert!(tmp.path().join("b.png").exists());
        assert!(tmp.path().join("c.png").exists());
        assert!(tmp.path().join("subdir").exists());
    }

    #[test]
    fn test_prune_missing_dir_is_noop() {
        let summary = prune_temp_dir(
            Path::new("/nonexistent/auto-snap-temp"),
            Duration::from_secs(3600),
            10,
        )
        .unwrap();
        assert_eq!(summary, PruneSummary::default());
    }
}
