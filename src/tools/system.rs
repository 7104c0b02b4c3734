//! Platform facts and command-line flag parsing.

use std::{collections::BTreeMap, path::Path};

use serde::Serialize;
use sysinfo::{Disks, System};

use crate::error::Result;

/// `windows`, `linux`, `macos`, ...
pub fn system_type() -> &'static str {
    std::env::consts::OS
}

pub fn is_windows() -> bool {
    cfg!(windows)
}

pub fn is_linux() -> bool {
    cfg!(target_os = "linux")
}

pub fn host_name() -> String {
    System::host_name().unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeUnit {
    Bytes,
    #[default]
    Mb,
    Gb,
}

impl SizeUnit {
    fn divisor(self) -> f64 {
        match self {
            SizeUnit::Bytes => 1.0,
            SizeUnit::Mb => 1024.0 * 1024.0,
            SizeUnit::Gb => 1024.0 * 1024.0 * 1024.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskSpace {
    pub total: f64,
    pub free: f64,
    pub used: f64,
}

/// Size of the disk holding `path`. `Ok(None)` when no mounted disk
/// contains it.
pub fn disk_space(path: impl AsRef<Path>, unit: SizeUnit) -> Result<Option<DiskSpace>> {
    let path = std::fs::canonicalize(path)?;
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .filter(|d| path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    Ok(disk.map(|d| {
        let div = unit.divisor();
        let total = d.total_space() as f64;
        let free = d.available_space() as f64;
        DiskSpace {
            total: total / div,
            free: free / div,
            used: (total - free) / div,
        }
    }))
}

/// Whether the disk holding `path` has at least `size` free. `None` when
/// the disk is unknown.
pub fn has_free_space(path: impl AsRef<Path>, size: f64, unit: SizeUnit) -> Result<Option<bool>> {
    Ok(disk_space(path, unit)?.map(|space| space.free >= size))
}

/// Collect `--key=value` style flags into a map, later flags winning.
/// Arguments without `prefix` or `sep` are ignored.
pub fn parse_args<I, S>(args: I, prefix: &str, sep: &str) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .filter_map(|arg| {
            let rest = arg.as_ref().strip_prefix(prefix)?;
            let (key, value) = rest.split_once(sep)?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_flags_match_os() {
        assert_eq!(is_linux(), system_type() == "linux");
        assert_eq!(is_windows(), system_type() == "windows");
        assert!(!host_name().is_empty());
    }

    #[test]
    fn flag_parsing() {
        let args = ["prog", "--log=file", "--level=debug", "-x=1", "--flag", "--level=info"];
        let parsed = parse_args(args, "--", "=");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["log"], "file");
        assert_eq!(parsed["level"], "info");
    }

    #[test]
    fn value_may_contain_separator() {
        let parsed = parse_args(["--url=a=b"], "--", "=");
        assert_eq!(parsed["url"], "a=b");
    }

    #[test]
    fn free_space_is_consistent() {
        let dir = tempfile::tempdir().unwrap();
        if let Some(space) = disk_space(dir.path(), SizeUnit::Bytes).unwrap() {
            assert!(space.total >= space.free);
            assert_eq!(has_free_space(dir.path(), 0.0, SizeUnit::Bytes).unwrap(), Some(true));
        }
    }
}
