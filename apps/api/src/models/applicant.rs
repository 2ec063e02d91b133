use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted signup. Rows are inserted once and never updated.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRow {
    pub id: Uuid,
    pub name: String,
    pub phone_no: String,
    pub email: String,
    pub resume_path: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub name: String,
    pub phone_no: String,
    pub email: String,
    pub resume_path: String,
}
