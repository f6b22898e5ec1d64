use std::path::PathBuf;
use std::time::Duration;

use crate::artifact::ArtifactSource;
use crate::http_cache::app_cache_dir;
use crate::query::{DEFAULT_PAGE_SIZE, DEFAULT_QUIET};

const DEMO_ROWS: u64 = 2_000;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub artifact: Option<ArtifactSource>,
    pub page_size: usize,
    pub filter_debounce: Duration,
    pub bets_db: PathBuf,
    pub export_dir: PathBuf,
    pub demo_rows: usize,
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_string = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let env_parse = |key: &str| env_string(key).and_then(|v| v.parse::<u64>().ok());

        let artifact = env_string("ODDS_ARTIFACT").map(|raw| ArtifactSource::parse(&raw));
        let page_size = env_parse("ODDS_PAGE_SIZE")
            .unwrap_or(DEFAULT_PAGE_SIZE as u64)
            .clamp(5, 500) as usize;
        let debounce_ms = env_parse("ODDS_FILTER_DEBOUNCE_MS")
            .unwrap_or(DEFAULT_QUIET.as_millis() as u64)
            .clamp(0, 5_000);
        let bets_db = env_string("ODDS_BETS_DB")
            .map(PathBuf::from)
            .or_else(|| app_cache_dir().map(|dir| dir.join("bets.sqlite")))
            .unwrap_or_else(|| PathBuf::from("bets.sqlite"));
        let export_dir = env_string("ODDS_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let demo_rows = env_parse("ODDS_DEMO_ROWS")
            .unwrap_or(DEMO_ROWS)
            .clamp(1, 200_000) as usize;

        Self {
            artifact,
            page_size,
            filter_debounce: Duration::from_millis(debounce_ms),
            bets_db,
            export_dir,
            demo_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ViewerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ViewerConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]);
        assert!(cfg.artifact.is_none());
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.filter_debounce, DEFAULT_QUIET);
        assert_eq!(cfg.demo_rows, 2_000);
        assert_eq!(cfg.export_dir, PathBuf::from("."));
    }

    #[test]
    fn values_are_clamped() {
        let low = config(&[
            ("ODDS_PAGE_SIZE", "1"),
            ("ODDS_FILTER_DEBOUNCE_MS", "0"),
            ("ODDS_DEMO_ROWS", "0"),
        ]);
        assert_eq!(low.page_size, 5);
        assert_eq!(low.filter_debounce, Duration::ZERO);
        assert_eq!(low.demo_rows, 1);

        let high = config(&[
            ("ODDS_PAGE_SIZE", "9000"),
            ("ODDS_FILTER_DEBOUNCE_MS", "60000"),
            ("ODDS_DEMO_ROWS", "999999"),
        ]);
        assert_eq!(high.page_size, 500);
        assert_eq!(high.filter_debounce, Duration::from_millis(5_000));
        assert_eq!(high.demo_rows, 200_000);
    }

    #[test]
    fn junk_and_blank_values_fall_back() {
        let cfg = config(&[
            ("ODDS_PAGE_SIZE", "lots"),
            ("ODDS_ARTIFACT", "   "),
            ("ODDS_EXPORT_DIR", " out "),
            ("ODDS_BETS_DB", "/tmp/b.sqlite"),
        ]);
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert!(cfg.artifact.is_none());
        assert_eq!(cfg.export_dir, PathBuf::from("out"));
        assert_eq!(cfg.bets_db, PathBuf::from("/tmp/b.sqlite"));
    }
}
