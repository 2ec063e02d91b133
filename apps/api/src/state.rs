use std::sync::Arc;

use crate::config::Config;
use crate::storage::blobs::BlobStore;
use crate::storage::records::ApplicantStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Record Store. `PgApplicantStore` in production.
    pub store: Arc<dyn ApplicantStore>,
    pub blobs: BlobStore,
    pub config: Config,
}
