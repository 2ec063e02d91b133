//! Record Store — applicant rows keyed by UUID, unique by email.
//!
//! `AppState` carries an `Arc<dyn ApplicantStore>`; production wires in
//! `PgApplicantStore`, tests use the in-memory store below.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::applicant::{ApplicantRow, NewApplicant};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an applicant with this email already exists")]
    DuplicateEmail,

    #[error("malformed applicant id '{0}'")]
    MalformedId(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ApplicantStore: Send + Sync {
    /// Inserts a new applicant. Fails with `DuplicateEmail` when the email is taken.
    async fn insert(&self, applicant: NewApplicant) -> Result<ApplicantRow, StoreError>;

    /// Looks up an applicant by its raw path identifier.
    async fn find_by_id(&self, id: &str) -> Result<Option<ApplicantRow>, StoreError>;
}

fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::MalformedId(id.to_string()))
}

pub struct PgApplicantStore {
    pool: PgPool,
}

impl PgApplicantStore {
    pub fn new(pool: PgPool) -> Self {
        PgApplicantStore { pool }
    }
}

#[async_trait]
impl ApplicantStore for PgApplicantStore {
    async fn insert(&self, applicant: NewApplicant) -> Result<ApplicantRow, StoreError> {
        let NewApplicant {
            name,
            phone_no,
            email,
            resume_path,
        } = applicant;

        sqlx::query_as::<_, ApplicantRow>(
            r#"
            INSERT INTO applicants (id, name, phone_no, email, resume_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(phone_no)
        .bind(email)
        .bind(resume_path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::Database(other),
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ApplicantRow>, StoreError> {
        let id = parse_id(id)?;
        Ok(
            sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}
