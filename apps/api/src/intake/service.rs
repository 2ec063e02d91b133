//! Submission and retrieval flows over the Record Store and Blob Store.
//!
//! Submission order: validate, write blob, insert record. If the insert
//! fails the blob is removed again, so a failed signup leaves nothing behind
//! unless that cleanup itself fails (logged).

use std::path::PathBuf;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::intake::validation::{validate, SignupForm, UploadPolicy, ValidatedSignup};
use crate::models::applicant::{ApplicantRow, NewApplicant};
use crate::storage::blobs::{resolve, BlobStore};
use crate::storage::records::{ApplicantStore, StoreError};

/// Absolute location of a stored résumé, ready to be served.
#[derive(Debug, Clone)]
pub struct ResumeLocation {
    pub path: PathBuf,
    pub file_name: String,
}

pub async fn submit_signup(
    store: &dyn ApplicantStore,
    blobs: &BlobStore,
    policy: &UploadPolicy,
    form: SignupForm,
) -> Result<ApplicantRow, AppError> {
    let ValidatedSignup {
        name,
        phone_no,
        email,
        resume,
    } = validate(&form, policy).map_err(AppError::Validation)?;

    let blob = blobs
        .put(&resume.file_name, &resume.contents)
        .await
        .map_err(|e| AppError::SignupFailed(format!("blob write failed: {e}")))?;

    let applicant = NewApplicant {
        name,
        phone_no,
        email,
        resume_path: blob.path.to_string_lossy().into_owned(),
    };

    match store.insert(applicant).await {
        Ok(row) => {
            info!("Applicant {} signed up, resume stored as {}", row.id, blob.file_name);
            Ok(row)
        }
        Err(e) => {
            if let Err(cleanup) = blobs.remove(&blob.path).await {
                warn!(
                    "Could not remove orphaned blob {}: {cleanup}",
                    blob.path.display()
                );
            }
            Err(AppError::SignupFailed(e.to_string()))
        }
    }
}

pub async fn locate_resume(
    store: &dyn ApplicantStore,
    id: &str,
) -> Result<ResumeLocation, AppError> {
    let row = match store.find_by_id(id).await {
        Ok(Some(row)) => row,
        Ok(None) => return Err(AppError::NotFound),
        Err(StoreError::MalformedId(raw)) => {
            // Answered as a server error, same as any other failed lookup.
            warn!("Resume requested with malformed id '{raw}'");
            return Err(AppError::Retrieval(format!("malformed id '{raw}'")));
        }
        Err(e) => return Err(AppError::Retrieval(e.to_string())),
    };

    let path = resolve(&row.resume_path)
        .map_err(|e| AppError::Retrieval(format!("cannot resolve {}: {e}", row.resume_path)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());

    Ok(ResumeLocation { path, file_name })
}
