use rusqlite::{params, Connection};

use crate::error::{is_unique_violation, WeekplanError};
use crate::models::PlanDay;

pub fn create_plan_day(conn: &Connection, day: &PlanDay) -> Result<(), WeekplanError> {
    conn.execute(
        "INSERT INTO plan_days (id, plan_id, day_of_week, day_name, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            day.id,
            day.plan_id,
            day.day_of_week,
            day.day_name,
            day.content,
            day.created_at,
            day.updated_at,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e, "plan_days.day_of_week") {
            WeekplanError::validation(format!(
                "Plan {} already has an entry for day {}",
                day.plan_id, day.day_of_week
            ))
        } else {
            WeekplanError::from(e)
        }
    })?;
    Ok(())
}

pub fn get_plan_day_by_id(conn: &Connection, id: &str) -> Result<PlanDay, WeekplanError> {
    conn.query_row(
        "SELECT id, plan_id, day_of_week, day_name, content, created_at, updated_at
         FROM plan_days WHERE id = ?1",
        params![id],
        row_to_plan_day,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            WeekplanError::database(format!("Plan day not found: {id}"))
        }
        _ => WeekplanError::from(e),
    })
}

pub fn list_days_by_plan(conn: &Connection, plan_id: &str) -> Result<Vec<PlanDay>, WeekplanError> {
    let mut stmt = conn.prepare(
        "SELECT id, plan_id, day_of_week, day_name, content, created_at, updated_at
         FROM plan_days WHERE plan_id = ?1 ORDER BY day_of_week ASC",
    )?;
    let days = stmt
        .query_map(params![plan_id], row_to_plan_day)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(days)
}

/// Only content and `updated_at` are mutable; day and plan are fixed at creation.
pub fn update_plan_day(conn: &Connection, day: &PlanDay) -> Result<PlanDay, WeekplanError> {
    let changed = conn.execute(
        "UPDATE plan_days SET content = ?1, updated_at = ?2 WHERE id = ?3",
        params![day.content, day.updated_at, day.id],
    )?;
    if changed == 0 {
        return Err(WeekplanError::database(format!(
            "Plan day not found: {}",
            day.id
        )));
    }
    get_plan_day_by_id(conn, &day.id)
}

pub fn delete_days_by_plan(conn: &Connection, plan_id: &str) -> Result<usize, WeekplanError> {
    let removed = conn.execute("DELETE FROM plan_days WHERE plan_id = ?1", params![plan_id])?;
    Ok(removed)
}

fn row_to_plan_day(row: &rusqlite::Row) -> rusqlite::Result<PlanDay> {
    Ok(PlanDay {
        id: row.get(0)?,
        plan_id: row.get(1)?,
        day_of_week: row.get(2)?,
        day_name: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
