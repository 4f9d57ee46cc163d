use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Lexscan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "lexscan=info,warn";

/// Hard cap on uploaded documents (50 MiB).
pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Get the application data directory (~/Lexscan/).
/// `None` when the platform reports no home directory.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Default location of the SQLite job database.
pub fn default_database_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("jobs.db"))
}

/// Default tracing filter. `LEXSCAN_LOG` overrides the built-in value.
pub fn default_log_filter() -> String {
    std::env::var("LEXSCAN_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Tunables for the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum non-whitespace characters for an extraction to count as usable.
    pub min_text_chars: usize,
    /// Inputs above this size are rejected before a job is created.
    pub max_file_size_bytes: u64,
    /// Characters inspected on each side of a match when labeling findings.
    pub context_window_chars: usize,
    /// Upper bound on findings kept per family (dates, financial, compliance).
    pub max_findings_per_family: usize,
    /// Upper bound on excerpts composed into one answer.
    pub max_answer_excerpts: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 50,
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            context_window_chars: 60,
            max_findings_per_family: 10,
            max_answer_excerpts: 3,
        }
    }
}

impl AnalysisConfig {
    /// Defaults overridden by `LEXSCAN_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        override_from(&lookup, "LEXSCAN_MIN_TEXT_CHARS", &mut config.min_text_chars);
        override_from(&lookup, "LEXSCAN_MAX_FILE_SIZE_BYTES", &mut config.max_file_size_bytes);
        override_from(&lookup, "LEXSCAN_CONTEXT_WINDOW_CHARS", &mut config.context_window_chars);
        override_from(&lookup, "LEXSCAN_MAX_FINDINGS", &mut config.max_findings_per_family);
        override_from(&lookup, "LEXSCAN_MAX_ANSWER_EXCERPTS", &mut config.max_answer_excerpts);
        config
    }
}

fn override_from<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!(key, "Ignoring unparsable configuration value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn app_data_dir_under_home() {
        let Some(dir) = app_data_dir() else {
            return;
        };
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Lexscan"));
    }

    #[test]
    fn database_path_under_app_data() {
        if let (Some(db), Some(app)) = (default_database_path(), app_data_dir()) {
            assert!(db.starts_with(app));
            assert!(db.ends_with("jobs.db"));
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn defaults_are_sane() {
        let config = AnalysisConfig::default();
        assert_eq!(config.min_text_chars, 50);
        assert_eq!(config.max_file_size_bytes, 50 * 1024 * 1024);
        assert!(config.max_answer_excerpts >= 1);
    }

    #[test]
    fn lookup_overrides_known_keys() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LEXSCAN_MIN_TEXT_CHARS", "80"),
            ("LEXSCAN_MAX_FINDINGS", " 4 "),
        ]);
        let config = AnalysisConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.min_text_chars, 80);
        assert_eq!(config.max_findings_per_family, 4);
        assert_eq!(config.context_window_chars, 60);
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let config = AnalysisConfig::from_lookup(|k| {
            (k == "LEXSCAN_CONTEXT_WINDOW_CHARS").then(|| "wide".to_string())
        });
        assert_eq!(config.context_window_chars, 60);
    }
}
