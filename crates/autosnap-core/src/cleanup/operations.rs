use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::types::TEMP_DIR_PREFIX;

/// Which files to delete, split into (expired, over_limit).
///
/// Files older than `retention` expire. Of the rest, everything beyond the
/// `max_files` newest goes too.
pub(super) fn select_for_pruning(
    mut files: Vec<(PathBuf, SystemTime)>,
    now: SystemTime,
    retention: Duration,
    max_files: usize,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut expired = Vec::new();
    files.retain(|(path, modified)| {
        let age = now.duration_since(*modified).unwrap_or(Duration::ZERO);
        if age > retention {
            expired.push(path.clone());
            false
        } else {
            true
        }
    });

    // Newest first
    files.sort_by(|a, b| b.1.cmp(&a.1));
    let over_limit = files
        .into_iter()
        .skip(max_files)
        .map(|(path, _)| path)
        .collect();
    (expired, over_limit)
}

/// Whether `dir` is safe to delete wholesale.
pub(super) fn is_disposable(dir: &Path, temp_root: &Path) -> bool {
    let named_temp = dir
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(TEMP_DIR_PREFIX));
    let inside_temp_root = dir != temp_root && dir.starts_with(temp_root);
    named_temp || inside_temp_root
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_select_expired_and_over_limit() {
        let now = SystemTime::UNIX_EPOCH + HOUR * 100;
        let files = vec![
            (PathBuf::from("old"), now - HOUR * 30),
            (PathBuf::from("a"), now - HOUR * 3),
            (PathBuf::from("b"), now - HOUR),
            (PathBuf::from("c"), now - HOUR * 2),
        ];

        let (expired, over_limit) = select_for_pruning(files, now, HOUR * 24, 2);
        assert_eq!(expired, vec![PathBuf::from("old")]);
        assert_eq!(over_limit, vec![PathBuf::from("a")]);
    }

    #[test]
    fn test_future_mtime_is_not_expired() {
        let now = SystemTime::UNIX_EPOCH + HOUR;
        let files = vec![(PathBuf::from("skewed"), now + HOUR)];
        let (expired, over_limit) = select_for_pruning(files, now, HOUR, 10);
        assert!(expired.is_empty());
        assert!(over_limit.is_empty());
    }

    #[test]
    fn test_is_disposable() {
        let temp_root = Path::new("/tmp/auto-snap-temp");
        assert!(is_disposable(Path::new("/home/u/temp_captures"), temp_root));
        assert!(is_disposable(Path::new("/tmp/auto-snap-temp/run1"), temp_root));
        assert!(!is_disposable(temp_root, temp_root));
        assert!(!is_disposable(Path::new("/home/u/captures"), temp_root));
    }
}
