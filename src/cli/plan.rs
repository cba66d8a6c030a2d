use std::cell::RefCell;
use std::io::{self, Read};

use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::cli::commands::PlanCommands;
use crate::cli::{finish, Context};
use crate::db::Database;
use crate::error::WeekplanError;
use crate::models::{by_recency, NewPlanDay, Plan};
use crate::output;
use crate::service::{PlanEvent, PlanService, SettingsService};

pub fn run(cmd: PlanCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        PlanCommands::Create {
            name,
            description,
            year,
            week,
            days,
        } => {
            let input = PlanInput {
                name,
                description,
                year,
                week,
                days,
            };
            run_create(input, ctx)
        }
        PlanCommands::Load => run_load(ctx),
        PlanCommands::List => run_list(ctx),
        PlanCommands::Show { reference } => run_show(&reference, ctx),
        PlanCommands::Update {
            reference,
            name,
            description,
            year,
            week,
        } => run_update(&reference, name, description, year, week, ctx),
        PlanCommands::Delete { reference } => run_delete(&reference, ctx),
        PlanCommands::Activate { reference } => run_lifecycle(&reference, Lifecycle::Activate, ctx),
        PlanCommands::Deactivate { reference } => {
            run_lifecycle(&reference, Lifecycle::Deactivate, ctx)
        }
        PlanCommands::Complete { reference } => run_lifecycle(&reference, Lifecycle::Complete, ctx),
        PlanCommands::Open { reference } => run_lifecycle(&reference, Lifecycle::Open, ctx),
        PlanCommands::Active => run_active(ctx),
        PlanCommands::Last => run_last(ctx),
    };
    finish(result, ctx.json)
}

// --- plan create / load ---

#[derive(Deserialize)]
struct PlanInput {
    name: String,
    description: Option<String>,
    year: Option<i32>,
    week: Option<u32>,
    #[serde(default)]
    days: Vec<NewPlanDay>,
}

fn run_create(input: PlanInput, ctx: &Context) -> Result<i32, WeekplanError> {
    let today = Utc::now().iso_week();
    let year = input.year.unwrap_or_else(|| today.year());
    let week = input.week.unwrap_or_else(|| today.week());

    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let demoted = RefCell::new(Vec::new());
    let mut service = PlanService::new(&db, &settings);
    service.on_plan_data_changed(|event| {
        if let PlanEvent::Deactivated {
            plan_id,
            automatic: true,
        } = event
        {
            demoted.borrow_mut().push(plan_id.clone());
        }
    });

    let plan = service.create_plan(
        &input.name,
        input.description.as_deref(),
        year,
        week,
        &input.days,
    )?;
    let days = service.get_plan_days(&plan.id)?;
    let demoted: Vec<Plan> = demoted
        .borrow()
        .iter()
        .filter_map(|id| service.get_plan_by_id(id))
        .collect();

    if ctx.json {
        let mut data = output::json::plan_json(&plan);
        data["days"] = output::json::days_json(&days);
        data["deactivated"] = json!(demoted
            .iter()
            .map(|p| json!({ "id": p.id, "name": p.plan_name }))
            .collect::<Vec<_>>());
        output::json::print(&output::json::success(data));
    } else {
        println!("Created plan: {} ({})", plan.plan_name, plan.id);
        for p in &demoted {
            println!("Deactivated {} to stay within the active plan limit.", p.plan_name);
        }
    }
    Ok(0)
}

fn run_load(ctx: &Context) -> Result<i32, WeekplanError> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| WeekplanError::validation(e.to_string()))?;
    let input: PlanInput = serde_json::from_str(&raw)
        .map_err(|e| WeekplanError::validation(format!("Invalid JSON: {e}")))?;
    run_create(input, ctx)
}

// --- queries ---

fn run_list(ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);
    let mut plans = service.refresh()?.to_vec();
    // Active first, then most recently opened.
    plans.sort_by(|a, b| b.is_live().cmp(&a.is_live()).then_with(|| by_recency(b, a)));

    if ctx.json {
        let plans_json: Vec<_> = plans.iter().map(output::json::plan_json).collect();
        output::json::print(&output::json::success(json!({ "plans": plans_json })));
    } else {
        output::text::print_plan_list(&plans);
    }
    Ok(0)
}

fn run_show(reference: &str, ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let service = PlanService::new(&db, &settings);
    let plan = db.resolve_plan(reference)?;
    let days = service.get_plan_days(&plan.id)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "plan": output::json::plan_json(&plan),
            "days": output::json::days_json(&days)
        })));
    } else {
        output::text::print_plan(&plan);
        println!("\nDays:");
        output::text::print_days(&days);
    }
    Ok(0)
}

fn run_active(ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);
    let plan = service.get_active_plan();
    print_optional_plan(plan.as_ref(), "No active plan.", ctx);
    Ok(0)
}

fn run_last(ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);
    let plan = service.get_last_opened_plan();
    print_optional_plan(plan.as_ref(), "No plans yet.", ctx);
    Ok(0)
}

fn print_optional_plan(plan: Option<&Plan>, empty: &str, ctx: &Context) {
    if ctx.json {
        output::json::print(&output::json::success(json!({
            "plan": output::json::plan_or_null(plan)
        })));
    } else {
        match plan {
            Some(p) => output::text::print_plan(p),
            None => println!("{empty}"),
        }
    }
}

// --- mutations ---

fn run_update(
    reference: &str,
    name: Option<String>,
    description: Option<String>,
    year: Option<i32>,
    week: Option<u32>,
    ctx: &Context,
) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);
    let current = db.resolve_plan(reference)?;

    let mut changes = current.clone();
    if let Some(name) = name {
        changes.plan_name = name;
    }
    if let Some(description) = description {
        changes.description = Some(description);
    }
    if let Some(year) = year {
        changes.year = year;
    }
    if let Some(week) = week {
        changes.week = week;
    }
    let plan = service.update_plan(&changes)?;

    if ctx.json {
        output::json::print(&output::json::success(output::json::plan_json(&plan)));
    } else {
        println!("Updated plan: {} ({})", plan.plan_name, plan.week_name);
    }
    Ok(0)
}

fn run_delete(reference: &str, ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);
    let plan = db.resolve_plan(reference)?;
    service.delete_plan(&plan.id)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "deleted": { "id": plan.id, "name": plan.plan_name }
        })));
    } else {
        println!("Deleted plan: {} ({})", plan.plan_name, plan.id);
    }
    Ok(0)
}

#[derive(Clone, Copy)]
enum Lifecycle {
    Activate,
    Deactivate,
    Complete,
    Open,
}

impl Lifecycle {
    fn verb(self) -> &'static str {
        match self {
            Self::Activate => "Activated",
            Self::Deactivate => "Deactivated",
            Self::Complete => "Completed",
            Self::Open => "Opened",
        }
    }
}

fn run_lifecycle(reference: &str, action: Lifecycle, ctx: &Context) -> Result<i32, WeekplanError> {
    let db = Database::open(&ctx.db_path)?;
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);
    let plan = db.resolve_plan(reference)?;

    match action {
        Lifecycle::Activate => service.set_plan_active(&plan.id)?,
        Lifecycle::Deactivate => service.set_plan_inactive(&plan.id)?,
        Lifecycle::Complete => service.set_plan_completed(&plan.id)?,
        Lifecycle::Open => service.mark_plan_opened(&plan.id)?,
    }
    let plan = service
        .get_plan_by_id(&plan.id)
        .ok_or_else(|| WeekplanError::plan_not_found(&plan.id))?;

    if ctx.json {
        output::json::print(&output::json::success(output::json::plan_json(&plan)));
    } else {
        println!("{} plan: {} ({})", action.verb(), plan.plan_name, plan.id);
    }
    Ok(0)
}
