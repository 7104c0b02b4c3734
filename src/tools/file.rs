//! File and directory helpers.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf, MAIN_SEPARATOR},
    time::SystemTime,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{MagicError, Result},
    tools::json::to_string_indented,
};

/// Read a whole file. A leading UTF-8 BOM is dropped.
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("'{}' is not a file", path.display()),
        )
        .into());
    }
    let text = fs::read_to_string(path)?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Lines of a file, trimmed, blank lines dropped.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    Ok(read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Overwrite `path` with `data`, creating parent directories.
pub fn write_str(path: impl AsRef<Path>, data: &str) -> Result<()> {
    let path = path.as_ref();
    make_dirs(path, true)?;
    fs::write(path, data)?;
    Ok(())
}

/// Append `line` followed by a newline.
pub fn append_line(path: impl AsRef<Path>, line: &str) -> Result<()> {
    append_lines(path, [line])
}

pub fn append_lines<I, S>(path: impl AsRef<Path>, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    make_dirs(path, true)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for line in lines {
        file.write_all(line.as_ref().as_bytes())?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Write `value` as pretty JSON indented by `indent` spaces.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T, indent: usize) -> Result<()> {
    write_str(path, &to_string_indented(value, indent)?)
}

/// Append `value` as one compact JSON line.
pub fn append_json_line<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    append_line(path, &serde_json::to_string(value)?)
}

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    Ok(serde_json::from_str(&read_to_string(path)?)?)
}

pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    Ok(fs::metadata(path)?.len())
}

pub fn modified_time(path: impl AsRef<Path>) -> Result<SystemTime> {
    Ok(fs::metadata(path)?.modified()?)
}

/// Create a directory tree. With `is_file` the path names a file and only
/// its parent directory is created.
pub fn make_dirs(path: impl AsRef<Path>, is_file: bool) -> Result<()> {
    let path = path.as_ref();
    let dir = if is_file { path.parent() } else { Some(path) };
    match dir {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

/// Remove a file; a missing file is not an error.
pub fn remove_file(path: impl AsRef<Path>) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Remove a directory. With `recursive` the whole tree goes, otherwise only
/// an empty directory is removed.
pub fn remove_dir(path: impl AsRef<Path>, recursive: bool) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    if recursive {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_dir(path)?;
    }
    Ok(())
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(source: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<u64> {
    let dest = dest.as_ref();
    make_dirs(dest, true)?;
    Ok(fs::copy(source, dest)?)
}

/// Join path parts with the platform separator.
///
/// Unlike [`Path::join`], an absolute part does not discard what came
/// before it: `join_path(["/data", "/logs"])` is `/data/logs`. Empty parts
/// are skipped.
pub fn join_path<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        if joined.is_empty() || joined.ends_with(MAIN_SEPARATOR) || part.starts_with(MAIN_SEPARATOR) {
            joined.push_str(part);
        } else {
            joined.push(MAIN_SEPARATOR);
            joined.push_str(part);
        }
    }
    joined
}

/// Entries under `dir` up to `depth` levels deep (1 = direct children),
/// sorted.
pub fn list_dir(dir: impl AsRef<Path>, depth: usize) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MagicError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("'{}' is not a directory", dir.display()),
        )));
    }
    let mut out = Vec::new();
    walk(dir, depth, &mut out)?;
    out.sort();
    Ok(out)
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) -> Result<()> {
    if depth == 0 {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, depth - 1, out)?;
        }
        out.push(path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_and_read_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/notes.txt");
        write_str(&path, "a\n\n  b  \n").unwrap();
        append_lines(&path, ["c", "d"]).unwrap();
        assert_eq!(read_lines(&path).unwrap(), vec!["a", "b", "c", "d"]);
        assert!(file_size(&path).unwrap() > 0);
    }

    #[test]
    fn json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.json");
        let value = serde_json::json!({"name": "张三", "age": 25});
        write_json(&path, &value, 2).unwrap();
        let back: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(back, value);
        assert!(read_to_string(&path).unwrap().contains("张三"));
    }

    #[test]
    fn json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        append_json_line(&path, &serde_json::json!({"n": 1})).unwrap();
        append_json_line(&path, &serde_json::json!({"n": 2})).unwrap();
        assert_eq!(read_lines(&path).unwrap(), vec!["{\"n\":1}", "{\"n\":2}"]);
    }

    #[test]
    fn bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.txt");
        fs::write(&path, "\u{feff}hello").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_to_string("/definitely/not/here.txt").is_err());
        assert!(remove_file("/definitely/not/here.txt").is_ok());
    }

    #[test]
    fn copy_and_remove() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("copy/b.txt");
        write_str(&src, "x").unwrap();
        assert_eq!(copy_file(&src, &dst).unwrap(), 1);
        remove_dir(dir.path().join("copy"), true).unwrap();
        assert!(!dst.exists());
    }

    #[test]
    fn joins_without_dropping_prefix() {
        let sep = MAIN_SEPARATOR.to_string();
        let abs = format!("{sep}logs");
        assert_eq!(
            join_path(["data", "", abs.as_str(), "app.log"]),
            format!("data{sep}logs{sep}app.log")
        );
    }

    #[test]
    fn listing_respects_depth() {
        let dir = tempdir().unwrap();
        write_str(dir.path().join("top.txt"), "").unwrap();
        write_str(dir.path().join("sub/inner.txt"), "").unwrap();
        assert_eq!(list_dir(dir.path(), 1).unwrap().len(), 2);
        assert_eq!(list_dir(dir.path(), 2).unwrap().len(), 3);
    }
}
