use serde_json::json;

use crate::cli::commands::SettingsCommands;
use crate::cli::{finish, Context};
use crate::db::Database;
use crate::error::WeekplanError;
use crate::models::SettingsPatch;
use crate::output;
use crate::service::{PlanService, SettingsService};

pub fn run(cmd: SettingsCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        SettingsCommands::Show => run_show(ctx),
        SettingsCommands::Set {
            max_active_plans,
            full_screen,
            language,
        } => run_set(
            SettingsPatch {
                max_active_plans,
                is_full_screen: full_screen,
                language,
            },
            ctx,
        ),
    };
    finish(result, ctx.json)
}

fn run_show(ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db).get_settings()?;

    if ctx.json {
        output::json::print(&output::json::success(output::json::settings_json(&settings)));
    } else {
        output::text::print_settings(&settings);
    }
    Ok(0)
}

fn run_set(patch: SettingsPatch, ctx: &Context) -> Result<i32, WeekplanError> {
    if patch == SettingsPatch::default() {
        return Err(WeekplanError::validation(
            "Nothing to change. Pass --max-active-plans, --full-screen or --language.",
        ));
    }

    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let updated = settings.update_settings(patch)?;

    // The limit may now be below the active count; report it, change nothing.
    let status = PlanService::new(&db, &settings).capacity_status()?;
    let warning = output::json::over_limit_warning(&status);

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "settings": output::json::settings_json(&updated),
            "capacity": output::json::capacity_json(&status),
            "warning": warning
        })));
    } else {
        output::text::print_settings(&updated);
        if let Some(warning) = warning {
            println!("Warning: {warning}");
        }
    }
    Ok(0)
}
