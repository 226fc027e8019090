//! Platform-specific directory paths.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "datatable";
const APPLICATION: &str = "datatable";

/// Archived logs kept by [`rotate_logs`].
const MAX_OLD_LOGS: usize = 25;

const LATEST_LOG: &str = "latest.log";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Directory for persistent data (the preferences database).
///
/// - Linux: `$XDG_DATA_HOME/datatable` or `~/.local/share/datatable`
/// - macOS: `~/Library/Application Support/dev.datatable.datatable`
/// - Windows: `C:\Users\<User>\AppData\Roaming\datatable\datatable\data`
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Directory for regenerable data (logs).
///
/// - Linux: `$XDG_CACHE_HOME/datatable` or `~/.cache/datatable`
/// - macOS: `~/Library/Caches/dev.datatable.datatable`
/// - Windows: `C:\Users\<User>\AppData\Local\datatable\datatable\cache`
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Default location of the preferences database.
pub fn preferences_db() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("preferences.db"))
}

/// Archives the previous run's log as `<YYYYmmdd_HHMMSS>.log`, prunes old
/// archives and returns the path for this run's log.
///
/// Returns `None` when there is no cache directory or it cannot be created.
pub fn rotate_logs() -> Option<PathBuf> {
    let cache = cache_dir()?;
    fs::create_dir_all(&cache).ok()?;
    let latest = cache.join(LATEST_LOG);

    if latest.exists() {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let _ = fs::rename(&latest, cache.join(format!("{stamp}.log")));
    }

    prune_archives(&cache, MAX_OLD_LOGS);
    Some(latest)
}

/// Deletes all but the `keep` newest archives. Archive names are timestamps,
/// so name order is age order.
fn prune_archives(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else { return };

    let mut archives: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "log")
                && path.file_name().is_some_and(|name| name != LATEST_LOG)
        })
        .collect();
    archives.sort();

    let excess = archives.len().saturating_sub(keep);
    for path in archives.into_iter().take(excess) {
        if let Err(e) = fs::remove_file(&path) {
            log::debug!("[paths] Could not remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_keeps_latest_and_newest_archives() {
        let dir = std::env::temp_dir().join(format!("datatable-logs-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for name in [
            "latest.log",
            "20260101_090000.log",
            "20260301_090000.log",
            "20260201_090000.log",
            "notes.txt",
        ] {
            fs::write(dir.join(name), name).unwrap();
        }

        prune_archives(&dir, 1);

        let mut left: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, ["20260301_090000.log", "latest.log", "notes.txt"]);
        let _ = fs::remove_dir_all(&dir);
    }
}
