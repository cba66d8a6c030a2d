use rusqlite::{params, Connection};

use crate::error::WeekplanError;
use crate::models::{SettingKey, DEFAULT_MAX_ACTIVE_PLANS};

pub fn run_migrations(conn: &Connection) -> Result<(), WeekplanError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS plans (
            id TEXT PRIMARY KEY,
            plan_name TEXT NOT NULL,
            description TEXT,
            year INTEGER NOT NULL,
            week INTEGER NOT NULL CHECK (week BETWEEN 1 AND 53),
            week_name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 0,
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            last_opened_at TEXT
        );

        CREATE TABLE IF NOT EXISTS plan_days (
            id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
            day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            day_name TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (plan_id, day_of_week)
        );

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        DROP INDEX IF EXISTS idx_plans_year_week;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_plans_plan_name ON plans(plan_name);
        CREATE INDEX IF NOT EXISTS idx_plans_active ON plans(is_active, is_completed);
        CREATE INDEX IF NOT EXISTS idx_plan_days_plan_id ON plan_days(plan_id);
        CREATE INDEX IF NOT EXISTS idx_plan_days_day_of_week ON plan_days(day_of_week);
        ",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
        params![
            SettingKey::MaxActivePlans.as_str(),
            DEFAULT_MAX_ACTIVE_PLANS.to_string()
        ],
    )?;
    tracing::debug!("schema migrations applied");
    Ok(())
}
