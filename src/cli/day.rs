use serde_json::json;

use crate::cli::commands::DayCommands;
use crate::cli::{finish, Context};
use crate::db::Database;
use crate::error::WeekplanError;
use crate::models::NewPlanDay;
use crate::output;
use crate::service::{PlanService, SettingsService};

pub fn run(cmd: DayCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        DayCommands::List { reference } => run_list(&reference, ctx),
        DayCommands::Set { reference, days } => run_set(&reference, &days, ctx),
        DayCommands::Edit {
            reference,
            day,
            content,
        } => run_edit(&reference, day, &content, ctx),
    };
    finish(result, ctx.json)
}

fn run_list(reference: &str, ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let service = PlanService::new(&db, &settings);
    let plan = db.resolve_plan(reference)?;
    let days = service.get_plan_days(&plan.id)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "plan": { "id": plan.id, "name": plan.plan_name },
            "days": output::json::days_json(&days)
        })));
    } else {
        println!("{} ({})", plan.plan_name, plan.week_name);
        output::text::print_days(&days);
    }
    Ok(0)
}

fn run_set(reference: &str, days: &[NewPlanDay], ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);
    let plan = db.resolve_plan(reference)?;
    let stored = service.replace_plan_days(&plan.id, days)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "plan": { "id": plan.id, "name": plan.plan_name },
            "days": output::json::days_json(&stored)
        })));
    } else {
        println!("Replaced days of {}:", plan.plan_name);
        output::text::print_days(&stored);
    }
    Ok(0)
}

fn run_edit(reference: &str, day: u8, content: &str, ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);
    let plan = db.resolve_plan(reference)?;
    let stored = service.set_plan_day_content(&plan.id, day, content)?;

    if ctx.json {
        output::json::print(&output::json::success(output::json::day_json(&stored)));
    } else {
        println!("{} / {}: {}", plan.plan_name, stored.day_name, stored.content);
    }
    Ok(0)
}
