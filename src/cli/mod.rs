pub mod commands;
pub mod day;
pub mod init;
pub mod plan;
pub mod settings;
pub mod status;

pub use commands::*;

use std::path::PathBuf;

use crate::error::WeekplanError;
use crate::output;

/// Per-invocation options shared by every command.
pub struct Context {
    pub json: bool,
    pub db_path: PathBuf,
}

/// Map a handler result to an exit code, reporting the error.
pub fn finish(result: Result<i32, WeekplanError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                output::json::print(&output::json::error(&e));
            } else {
                output::text::print_error(&e);
            }
            1
        }
    }
}
