use serde::Serialize;
use thiserror::Error;

use crate::models::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    PlanNotFound,
    AmbiguousRef,
    PlanNameConflict,
    CapacityExceeded,
    PlanCompleted,
    ValidationError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::PlanNotFound => "PLAN_NOT_FOUND",
            Self::AmbiguousRef => "AMBIGUOUS_REF",
            Self::PlanNameConflict => "PLAN_NAME_CONFLICT",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::PlanCompleted => "PLAN_COMPLETED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

/// The active set at the moment an activation was refused.
#[derive(Debug, Clone, Serialize)]
pub struct CapacityConflict {
    pub active_plans: Vec<Plan>,
    pub limit: u32,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct WeekplanError {
    pub code: ErrorCode,
    pub message: String,
    pub capacity: Option<CapacityConflict>,
}

impl WeekplanError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            capacity: None,
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "weekplan is not initialized. Run `weekplan init` first.",
        )
    }

    pub fn plan_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::PlanNotFound,
            format!("Plan not found: {reference}"),
        )
    }

    pub fn ambiguous_ref(reference: &str, candidates: &[String]) -> Self {
        Self::new(
            ErrorCode::AmbiguousRef,
            format!(
                "Ambiguous reference '{}'. Candidates: {}",
                reference,
                candidates.join(", ")
            ),
        )
    }

    pub fn plan_name_conflict(name: &str) -> Self {
        Self::new(
            ErrorCode::PlanNameConflict,
            format!("Plan with name '{name}' already exists"),
        )
    }

    pub fn capacity_exceeded(active_plans: Vec<Plan>, limit: u32) -> Self {
        let mut err = Self::new(
            ErrorCode::CapacityExceeded,
            format!(
                "Active plan limit reached ({} of {limit}). Deactivate a plan or raise the limit first.",
                active_plans.len()
            ),
        );
        err.capacity = Some(CapacityConflict { active_plans, limit });
        err
    }

    pub fn plan_completed(name: &str) -> Self {
        Self::new(
            ErrorCode::PlanCompleted,
            format!("Plan '{name}' is completed and can no longer change state"),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl From<rusqlite::Error> for WeekplanError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<std::io::Error> for WeekplanError {
    fn from(e: std::io::Error) -> Self {
        Self::database(e.to_string())
    }
}

/// True when `e` is a UNIQUE constraint failure whose message names `column`.
pub(crate) fn is_unique_violation(e: &rusqlite::Error, column: &str) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, msg) => {
            err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && msg.as_deref().is_some_and(|m| m.contains(column))
        }
        _ => false,
    }
}
