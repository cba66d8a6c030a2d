//! Runtime configuration: where the database lives and how chatty logging is.
//!
//! Resolution order for the database path: `--db` flag, then `WEEKPLAN_DB`
//! (both handled by clap), then the platform data directory.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::WeekplanError;

pub const DB_ENV: &str = "WEEKPLAN_DB";
pub const LOG_ENV: &str = "WEEKPLAN_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";
const DB_FILE: &str = "weekplan.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
}

impl AppConfig {
    pub fn resolve(db_flag: Option<PathBuf>) -> Result<Self, WeekplanError> {
        let db_path = match db_flag {
            Some(path) => path,
            None => default_db_path()?,
        };
        Ok(Self { db_path })
    }
}

/// `<platform data dir>/weekplan.db`, e.g. `~/.local/share/weekplan/weekplan.db`.
pub fn default_db_path() -> Result<PathBuf, WeekplanError> {
    let dirs = ProjectDirs::from("", "", "weekplan").ok_or_else(|| {
        WeekplanError::database(format!(
            "Could not determine a data directory. Set {DB_ENV} or pass --db."
        ))
    })?;
    Ok(dirs.data_dir().join(DB_FILE))
}
