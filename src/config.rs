use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_filter: String,
    pub workspace: Option<PathBuf>,
    pub api_base: String,
    pub page_size: usize,
    pub search_debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            workspace: None,
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Config::default();
        if let Some(v) = get("SCHOOLD_LOG").filter(|v| !v.trim().is_empty()) {
            cfg.log_filter = v;
        }
        if let Some(v) = get("SCHOOLD_WORKSPACE").filter(|v| !v.trim().is_empty()) {
            cfg.workspace = Some(PathBuf::from(v));
        }
        if let Some(v) = get("SCHOOLD_API_BASE").filter(|v| !v.trim().is_empty()) {
            cfg.api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SCHOOLD_PAGE_SIZE") {
            let n: usize = v
                .trim()
                .parse()
                .with_context(|| format!("SCHOOLD_PAGE_SIZE must be a number, got {:?}", v))?;
            if n == 0 {
                anyhow::bail!("SCHOOLD_PAGE_SIZE must be greater than zero");
            }
            cfg.page_size = n;
        }
        if let Some(v) = get("SCHOOLD_SEARCH_DEBOUNCE_MS") {
            let ms: u64 = v.trim().parse().with_context(|| {
                format!("SCHOOLD_SEARCH_DEBOUNCE_MS must be a number, got {:?}", v)
            })?;
            cfg.search_debounce = Duration::from_millis(ms);
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("SCHOOLD_LOG", "schoold=debug"),
            ("SCHOOLD_API_BASE", "https://school.test/api/"),
            ("SCHOOLD_PAGE_SIZE", "25"),
            ("SCHOOLD_SEARCH_DEBOUNCE_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.log_filter, "schoold=debug");
        assert_eq!(cfg.api_base, "https://school.test/api");
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.search_debounce, Duration::ZERO);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(Config::from_lookup(lookup(&[("SCHOOLD_PAGE_SIZE", "ten")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SCHOOLD_PAGE_SIZE", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SCHOOLD_SEARCH_DEBOUNCE_MS", "-1")])).is_err());
    }
}
