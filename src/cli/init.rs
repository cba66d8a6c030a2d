use serde_json::json;

use crate::cli::{finish, Context};
use crate::db::Database;
use crate::error::WeekplanError;
use crate::output;

pub fn run(ctx: &Context) -> i32 {
    finish(run_inner(ctx), ctx.json)
}

fn run_inner(ctx: &Context) -> Result<i32, WeekplanError> {
    Database::init(&ctx.db_path)?;
    tracing::info!(path = %ctx.db_path.display(), "initialized");

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "path": ctx.db_path.to_string_lossy()
        })));
    } else {
        println!("Initialized weekplan at {}", ctx.db_path.display());
    }
    Ok(0)
}
