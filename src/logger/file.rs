//! Log file sink with size based rotation at startup.

use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::debug;

use crate::error::Result;

/// Open `path` for appending.
///
/// When the current file is at least `max_bytes` long it is renamed to
/// `<stem>.<timestamp>.<ext>` first, and only the newest `retention`
/// rotated files are kept. `max_bytes == 0` disables rotation.
pub fn open_log_file(path: &Path, max_bytes: u64, retention: usize) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if max_bytes > 0 {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if size >= max_bytes {
            let rotated = rotated_name(path);
            fs::rename(path, &rotated)?;
            debug!(from = %path.display(), to = %rotated.display(), size, "rotated log file");
            prune(path, retention)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

fn split_name(path: &Path) -> (String, Option<String>) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string());
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    (stem, ext)
}

fn rotated_name(path: &Path) -> PathBuf {
    let (stem, ext) = split_name(path);
    let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
    let name = match ext {
        Some(ext) => format!("{stem}.{stamp}.{ext}"),
        None => format!("{stem}.{stamp}"),
    };
    path.with_file_name(name)
}

/// Rotated siblings of `path`, oldest first.
pub fn rotated_files(path: &Path) -> Result<Vec<PathBuf>> {
    let (stem, ext) = split_name(path);
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    let prefix = format!("{stem}.");
    let suffix = ext.map(|e| format!(".{e}"));

    let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.as_path() != path)
        .filter(|p| {
            let Some(name) = p.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            let Some(rest) = name.strip_prefix(&prefix) else {
                return false;
            };
            match &suffix {
                Some(suffix) => rest.ends_with(suffix.as_str()) && rest.len() > suffix.len(),
                None => !rest.is_empty(),
            }
        })
        .collect();
    // timestamps sort lexically
    files.sort();
    Ok(files)
}

fn prune(path: &Path, retention: usize) -> Result<()> {
    let files = rotated_files(path)?;
    if files.len() > retention {
        let to_delete = files.len() - retention;
        for old in &files[..to_delete] {
            let _ = fs::remove_file(old);
        }
    }
    Ok(())
}
