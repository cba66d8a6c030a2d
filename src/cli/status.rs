use serde_json::json;

use crate::cli::{finish, Context};
use crate::db::Database;
use crate::error::WeekplanError;
use crate::output;
use crate::service::{PlanService, SettingsService};

pub fn run(ctx: &Context) -> i32 {
    finish(run_inner(ctx), ctx.json)
}

fn run_inner(ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);

    let status = service.capacity_status()?;
    let active = service.get_active_plans();
    let current = service.get_active_plan();
    let warning = output::json::over_limit_warning(&status);

    if ctx.json {
        let active_json: Vec<_> = active.iter().map(output::json::plan_json).collect();
        output::json::print(&output::json::success(json!({
            "capacity": output::json::capacity_json(&status),
            "active_plans": active_json,
            "current": output::json::plan_or_null(current.as_ref()),
            "warning": warning
        })));
    } else {
        output::text::print_capacity(&status);
        if let Some(ref warning) = warning {
            println!("Warning: {warning}");
        }
        match current {
            Some(ref plan) => println!("Current plan: {} ({})", plan.plan_name, plan.week_name),
            None => println!("No active plan."),
        }
        if !active.is_empty() {
            println!("\nActive:");
            output::text::print_plan_list(&active);
        }
    }
    Ok(0)
}
