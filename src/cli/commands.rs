use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::{NewPlanDay, DAY_NAMES};

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "weekplan",
    version = VERSION,
    about = "Weekly plans with a bounded set of active plans",
    after_help = "\
NOTE:
  DB defaults to the platform data dir (e.g. ~/.local/share/weekplan/weekplan.db).
  Override with --db or WEEKPLAN_DB. Run `weekplan init` before any other command.
  Logging goes to stderr; set WEEKPLAN_LOG (e.g. `info`, `weekplan=debug`).

EXIT CODES:
  0  Success
  1  Error (DB, validation, name conflict, limit reached, etc.)

ACTIVE PLAN RULES:
  At most `max_active_plans` plans are active at once (settings, default 1).
  `plan create` always activates the new plan; if the limit is reached the
  least recently opened active plan is deactivated automatically.
  `plan activate` never deactivates anything: at the limit it fails with
  CAPACITY_EXCEEDED and lists the active plans to choose from.
  Lowering the limit does not deactivate plans; activations stay blocked
  until enough plans are deactivated by hand.
  `plan complete` is terminal: completed plans cannot be activated again."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the database file
    #[arg(long, global = true, env = "WEEKPLAN_DB")]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and default settings
    Init,

    /// Plan management
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Per-day content of a plan
    #[command(subcommand)]
    Day(DayCommands),

    /// Application settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Show active plans against the limit
    Status,
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a new plan (becomes active)
    Create {
        /// Plan name (unique, case-sensitive)
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Defaults to the current ISO year
        #[arg(long)]
        year: Option<i32>,
        /// 1-53; defaults to the current ISO week
        #[arg(long)]
        week: Option<u32>,
        /// Day content as DAY=TEXT, DAY being 0-6 (0 = Sunday) or a day name
        #[arg(long = "day", value_parser = parse_day_arg)]
        days: Vec<NewPlanDay>,
    },
    /// Create a plan from stdin JSON
    #[command(after_help = "\
STDIN FORMAT:
  {\"name\":\"...\", \"description\":\"...\", \"year\":2025, \"week\":12,
   \"days\":[{\"day_of_week\":1, \"content\":\"...\", \"day_name\":\"...\"}]}

NOTE:
  Atomic: plan and days are written together or not at all.
  Same activation rules as `plan create`.")]
    Load,
    /// List all plans
    List,
    /// Show plan details and days
    Show {
        /// Plan name or ID
        reference: String,
    },
    /// Edit name, description, year or week
    Update {
        /// Plan name or ID
        reference: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        week: Option<u32>,
    },
    /// Delete a plan and its days
    Delete {
        /// Plan name or ID
        reference: String,
    },
    /// Activate a plan (fails at the active-plan limit)
    Activate {
        /// Plan name or ID
        reference: String,
    },
    /// Deactivate a plan
    Deactivate {
        /// Plan name or ID
        reference: String,
    },
    /// Mark a plan completed (terminal)
    Complete {
        /// Plan name or ID
        reference: String,
    },
    /// Record that a plan was opened
    Open {
        /// Plan name or ID
        reference: String,
    },
    /// Show the most recently opened active plan
    Active,
    /// Show the most recently opened plan in any state
    Last,
}

#[derive(Subcommand)]
pub enum DayCommands {
    /// List the days of a plan
    List {
        /// Plan name or ID
        reference: String,
    },
    /// Replace all days of a plan
    Set {
        /// Plan name or ID
        reference: String,
        /// Day content as DAY=TEXT; pass none to clear every day
        #[arg(long = "day", value_parser = parse_day_arg)]
        days: Vec<NewPlanDay>,
    },
    /// Set the content of a single day
    Edit {
        /// Plan name or ID
        reference: String,
        /// 0-6 (0 = Sunday) or a day name
        #[arg(value_parser = parse_day_of_week)]
        day: u8,
        content: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show current settings
    Show,
    /// Change settings
    Set {
        /// Maximum number of simultaneously active plans
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
        max_active_plans: Option<u32>,
        #[arg(long)]
        full_screen: Option<bool>,
        #[arg(long)]
        language: Option<String>,
    },
}

/// `1`, `mon`, `Monday` → 1. Sunday is 0.
pub fn parse_day_of_week(s: &str) -> Result<u8, String> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        if n <= 6 {
            return Ok(n);
        }
        return Err(format!("day must be 0-6, got {n}"));
    }
    let lower = s.to_ascii_lowercase();
    if lower.len() >= 3 {
        if let Some(idx) = DAY_NAMES
            .iter()
            .position(|name| name.to_ascii_lowercase().starts_with(&lower))
        {
            return Ok(idx as u8);
        }
    }
    Err(format!("unknown day '{s}'"))
}

/// `DAY=TEXT`.
pub fn parse_day_arg(s: &str) -> Result<NewPlanDay, String> {
    let (day, content) = s
        .split_once('=')
        .ok_or_else(|| format!("expected DAY=TEXT, got '{s}'"))?;
    Ok(NewPlanDay::new(parse_day_of_week(day)?, content))
}
