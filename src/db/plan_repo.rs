use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{is_unique_violation, WeekplanError};
use crate::models::Plan;

const PLAN_COLUMNS: &str = "id, plan_name, description, year, week, week_name, \
                            is_active, is_completed, created_at, last_opened_at";

pub fn create_plan(conn: &Connection, plan: &Plan) -> Result<Plan, WeekplanError> {
    conn.execute(
        "INSERT INTO plans (id, plan_name, description, year, week, week_name,
                            is_active, is_completed, created_at, last_opened_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            plan.id,
            plan.plan_name,
            plan.description,
            plan.year,
            plan.week,
            plan.week_name,
            plan.is_active,
            plan.is_completed,
            plan.created_at,
            plan.last_opened_at,
        ],
    )
    .map_err(|e| name_conflict_or(e, &plan.plan_name))?;

    get_plan_by_id(conn, &plan.id)
}

pub fn get_plan_by_id(conn: &Connection, id: &str) -> Result<Plan, WeekplanError> {
    find_plan_by_id(conn, id)?.ok_or_else(|| WeekplanError::plan_not_found(id))
}

pub fn find_plan_by_id(conn: &Connection, id: &str) -> Result<Option<Plan>, WeekplanError> {
    let plan = conn
        .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?1"),
            params![id],
            row_to_plan,
        )
        .optional()?;
    Ok(plan)
}

/// Exact, case-sensitive name lookup.
pub fn find_plan_by_name(conn: &Connection, name: &str) -> Result<Option<Plan>, WeekplanError> {
    let plan = conn
        .query_row(
            &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE plan_name = ?1"),
            params![name],
            row_to_plan,
        )
        .optional()?;
    Ok(plan)
}

/// Resolve a plan reference: exact name → ULID prefix → name partial match.
pub fn resolve_plan(conn: &Connection, reference: &str) -> Result<Plan, WeekplanError> {
    // 1. Exact name match
    if let Some(plan) = find_plan_by_name(conn, reference)? {
        return Ok(plan);
    }

    // 2. ID prefix match
    let by_id = query_plans(
        conn,
        &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id LIKE ?1 ESCAPE '\\'"),
        &format!("{}%", escape_like(reference)),
    )?;
    match by_id.as_slice() {
        [] => {}
        [plan] => return Ok(plan.clone()),
        _ => return Err(ambiguous(reference, &by_id)),
    }

    // 3. Name partial match
    let by_name = query_plans(
        conn,
        &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE plan_name LIKE ?1 ESCAPE '\\'"),
        &format!("%{}%", escape_like(reference)),
    )?;
    match by_name.as_slice() {
        [] => Err(WeekplanError::plan_not_found(reference)),
        [plan] => Ok(plan.clone()),
        _ => Err(ambiguous(reference, &by_name)),
    }
}

pub fn list_plans(conn: &Connection) -> Result<Vec<Plan>, WeekplanError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAN_COLUMNS} FROM plans ORDER BY created_at DESC"
    ))?;
    let plans = stmt
        .query_map([], row_to_plan)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(plans)
}

pub fn update_plan(conn: &Connection, plan: &Plan) -> Result<Plan, WeekplanError> {
    let changed = conn
        .execute(
            "UPDATE plans
             SET plan_name = ?1, description = ?2, year = ?3, week = ?4, week_name = ?5,
                 is_active = ?6, is_completed = ?7, last_opened_at = ?8
             WHERE id = ?9",
            params![
                plan.plan_name,
                plan.description,
                plan.year,
                plan.week,
                plan.week_name,
                plan.is_active,
                plan.is_completed,
                plan.last_opened_at,
                plan.id,
            ],
        )
        .map_err(|e| name_conflict_or(e, &plan.plan_name))?;
    if changed == 0 {
        return Err(WeekplanError::plan_not_found(&plan.id));
    }
    get_plan_by_id(conn, &plan.id)
}

pub fn delete_plan(conn: &Connection, id: &str) -> Result<(), WeekplanError> {
    let changed = conn.execute("DELETE FROM plans WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(WeekplanError::plan_not_found(id));
    }
    Ok(())
}

fn query_plans(conn: &Connection, sql: &str, arg: &str) -> Result<Vec<Plan>, WeekplanError> {
    let mut stmt = conn.prepare(sql)?;
    let plans = stmt
        .query_map(params![arg], row_to_plan)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(plans)
}

/// `%` and `_` in a user reference match literally.
fn escape_like(reference: &str) -> String {
    let mut escaped = String::with_capacity(reference.len());
    for c in reference.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn ambiguous(reference: &str, plans: &[Plan]) -> WeekplanError {
    let candidates: Vec<String> = plans
        .iter()
        .map(|p| format!("{} ({})", p.plan_name, p.id))
        .collect();
    WeekplanError::ambiguous_ref(reference, &candidates)
}

fn name_conflict_or(e: rusqlite::Error, name: &str) -> WeekplanError {
    if is_unique_violation(&e, "plans.plan_name") {
        WeekplanError::plan_name_conflict(name)
    } else {
        WeekplanError::from(e)
    }
}

fn row_to_plan(row: &rusqlite::Row) -> rusqlite::Result<Plan> {
    Ok(Plan {
        id: row.get(0)?,
        plan_name: row.get(1)?,
        description: row.get(2)?,
        year: row.get(3)?,
        week: row.get(4)?,
        week_name: row.get(5)?,
        is_active: row.get(6)?,
        is_completed: row.get(7)?,
        created_at: row.get(8)?,
        last_opened_at: row.get(9)?,
    })
}
