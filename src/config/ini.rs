//! Minimal INI reader.
//!
//! ```text
//! ; comment
//! [server]
//! host = localhost
//! Port: 8080
//! ```
//!
//! Key case is preserved and sections keep their file order.

use std::{collections::BTreeMap, path::Path};

use tracing::debug;

use crate::{
    error::{MagicError, Result},
    tools::file,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniConfig {
    sections: Vec<(String, Vec<(String, String)>)>,
}

impl IniConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = file::read_to_string(path)?;
        let ini = Self::parse(&text)?;
        debug!(path = %path.display(), sections = ini.sections.len(), "loaded ini file");
        Ok(ini)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut ini = IniConfig::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                if !ini.sections.iter().any(|(n, _)| *n == name) {
                    ini.sections.push((name, Vec::new()));
                }
                continue;
            }

            let (key, value) = split_entry(line).ok_or_else(|| {
                MagicError::invalid_config(format!("line {}: expected `key = value`, got {line:?}", idx + 1))
            })?;
            let Some((_, entries)) = ini.sections.last_mut() else {
                return Err(MagicError::invalid_config(format!(
                    "line {}: key {key:?} outside of a section",
                    idx + 1
                )));
            };
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.to_string(),
                None => entries.push((key.to_string(), value.to_string())),
            }
        }
        Ok(ini)
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    pub fn section(&self, name: &str) -> Option<&[(String, String)]> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All keys of all sections; later sections win on duplicates.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        self.sections
            .iter()
            .flat_map(|(_, entries)| entries.iter().cloned())
            .collect()
    }

    /// Nested JSON object `{section: {key: value}}`.
    pub fn to_value(&self) -> serde_json::Value {
        let map = self
            .sections
            .iter()
            .map(|(name, entries)| {
                let inner = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect::<serde_json::Map<_, _>>();
                (name.clone(), serde_json::Value::Object(inner))
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Split on the first `=` or `:`, whichever comes first.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(['=', ':'])?;
    let key = line[..pos].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[pos + 1..].trim()))
}
