use crate::error::Result;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const DB_FILENAME: &str = "quickfill.json";
pub const HOME_ENV: &str = "QUICKFILL_HOME";
pub const LOG_ENV: &str = "QUICKFILL_LOG";
pub const DEFAULT_API_PORT: u16 = 3030;

/// Quiet period an edit must survive before shortcuts are checked
pub const DEBOUNCE_MS: u64 = 50;
/// Maximum nesting of placeholders resolved inside resolved values
pub const MAX_RESOLUTION_DEPTH: usize = 10;

/// How the trigger detector picks among several shortcuts matching the same text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// First snippet in list order whose shortcut is a suffix wins
    #[default]
    FirstInOrder,
    /// Longest matching shortcut wins; ties go to list order
    LongestSuffix,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub debounce: Duration,
    pub max_depth: usize,
    pub match_policy: MatchPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            max_depth: MAX_RESOLUTION_DEPTH,
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Get the quickfill configuration directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".quickfill"))
        .unwrap_or_else(|_| PathBuf::from(".quickfill"))
}

/// Get the path to the database file
pub fn get_db_file_path() -> PathBuf {
    get_config_dir().join(DB_FILENAME)
}

/// Ensure the directory holding `db_path` exists
pub fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Install the stderr log subscriber. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("quickfill=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
