use std::{
    collections::HashMap,
    env, fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

use crate::{
    decorate::Retry,
    error::{MagicError, Result},
    logger::{LogConfig, LogFormat},
};

pub mod ini;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::from_path(default_config_path())
    }

    /// Defaults, then `path` (when it exists), then the environment.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let config_path = path.into();
        let mut map = default_map();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(|l| l.ok()) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Environment takes precedence
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.trim().parse::<f64>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from)
    }

    /// Logging settings from the `MAGICKIT_LOG_*` keys.
    pub fn log_config(&self) -> Result<LogConfig> {
        let mut cfg = LogConfig::default();
        if let Some(level) = self.get("MAGICKIT_LOG_LEVEL") {
            cfg.level = level;
        }
        if let Some(format) = self.get("MAGICKIT_LOG_FORMAT") {
            cfg.format = format.parse::<LogFormat>()?;
        }
        cfg.file = self.get_path("MAGICKIT_LOG_FILE");
        if let Some(raw) = self.get("MAGICKIT_LOG_MAX_BYTES") {
            cfg.max_file_bytes = raw
                .trim()
                .parse()
                .map_err(|_| MagicError::invalid_config(format!("MAGICKIT_LOG_MAX_BYTES: {raw:?}")))?;
        }
        if let Some(raw) = self.get("MAGICKIT_LOG_RETENTION") {
            cfg.retention = raw
                .trim()
                .parse()
                .map_err(|_| MagicError::invalid_config(format!("MAGICKIT_LOG_RETENTION: {raw:?}")))?;
        }
        if self.get("MAGICKIT_LOG_CONSOLE").is_some() {
            cfg.console = self.get_bool("MAGICKIT_LOG_CONSOLE");
        }
        Ok(cfg)
    }

    /// Retry settings from the `MAGICKIT_RETRY_*` keys. Missing or
    /// unparsable values keep the [`Retry`] defaults.
    pub fn retry_policy(&self) -> Retry {
        let mut retry = Retry::new();
        if let Some(attempts) = self.get_usize("MAGICKIT_RETRY_ATTEMPTS") {
            retry = retry.attempts(u32::try_from(attempts).unwrap_or(u32::MAX));
        }
        if let Some(ms) = self.get_u64("MAGICKIT_RETRY_DELAY_MS") {
            retry = retry.delay(Duration::from_millis(ms));
        }
        if let Some(backoff) = self.get_f64("MAGICKIT_RETRY_BACKOFF") {
            retry = retry.backoff(backoff);
        }
        retry
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &["SHELL_NAME"];
    KEYS.contains(&k) || k.starts_with("MAGICKIT_")
}

fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("magickit")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join(".magickitrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("MAGICKIT_LOG_LEVEL".into(), "info".into());
    m.insert("MAGICKIT_LOG_FORMAT".into(), "full".into());
    m.insert("MAGICKIT_LOG_CONSOLE".into(), "true".into());
    m.insert("MAGICKIT_JSON_INDENT".into(), "2".into());
    m.insert("SHELL_NAME".into(), "auto".into());
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keys here are test-only so the environment overlay cannot interfere.
    fn write_rc(body: &str) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".magickitrc");
        fs::write(&path, body).unwrap();
        let cfg = Config::from_path(&path);
        (dir, cfg)
    }

    #[test]
    fn rc_file_overrides_defaults() {
        let (_dir, cfg) = write_rc("# comment\nMAGICKIT_TEST_RC_NAME = demo\n\nMAGICKIT_TEST_RC_COUNT=7\n");
        assert_eq!(cfg.get("MAGICKIT_TEST_RC_NAME").as_deref(), Some("demo"));
        assert_eq!(cfg.get_usize("MAGICKIT_TEST_RC_COUNT"), Some(7));
        assert_eq!(cfg.get("MAGICKIT_TEST_RC_MISSING"), None);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = Config::from_path("/definitely/not/here/.magickitrc");
        assert!(cfg.get("MAGICKIT_JSON_INDENT").is_some());
    }

    #[test]
    fn bool_values() {
        let (_dir, cfg) = write_rc("MAGICKIT_TEST_B1=yes\nMAGICKIT_TEST_B2=False\n");
        assert!(cfg.get_bool("MAGICKIT_TEST_B1"));
        assert!(!cfg.get_bool("MAGICKIT_TEST_B2"));
        assert!(!cfg.get_bool("MAGICKIT_TEST_B3"));
    }

    #[test]
    fn log_config_from_values() {
        let mut cfg = Config::from_path("/nope");
        cfg.set("MAGICKIT_LOG_FORMAT", "json");
        cfg.set("MAGICKIT_LOG_MAX_BYTES", "2048");
        cfg.set("MAGICKIT_LOG_FILE", "logs/test.log");
        let log = cfg.log_config().unwrap();
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.max_file_bytes, 2048);
        assert_eq!(log.file, Some(PathBuf::from("logs/test.log")));

        cfg.set("MAGICKIT_LOG_RETENTION", "many");
        assert!(matches!(cfg.log_config(), Err(MagicError::InvalidConfig(_))));
    }

    #[test]
    fn retry_policy_from_values() {
        let mut cfg = Config::from_path("/nope");
        cfg.set("MAGICKIT_RETRY_ATTEMPTS", "5");
        cfg.set("MAGICKIT_RETRY_DELAY_MS", "20");
        let retry = cfg.retry_policy();
        assert_eq!(retry.max_attempts(), 5);
        assert_eq!(retry.initial_delay(), Duration::from_millis(20));
    }

    #[test]
    fn retry_keys_are_unset_by_default() {
        let cfg = Config::from_path("/nope");
        if env::var_os("MAGICKIT_RETRY_ATTEMPTS").is_none() {
            assert_eq!(cfg.get("MAGICKIT_RETRY_ATTEMPTS"), None);
            assert_eq!(cfg.retry_policy().max_attempts(), Retry::new().max_attempts());
        }
    }

    #[test]
    fn shell_name_from_rc_file() {
        let (_dir, cfg) = write_rc("SHELL_NAME = powershell\n");
        if env::var_os("SHELL_NAME").is_none() {
            assert_eq!(cfg.get("SHELL_NAME").as_deref(), Some("powershell"));
        }
    }

    #[test]
    fn config_keys() {
        assert!(is_config_key("MAGICKIT_ANYTHING"));
        assert!(is_config_key("SHELL_NAME"));
        assert!(!is_config_key("OS_NAME"));
        assert!(!is_config_key("HOME"));
    }
}
