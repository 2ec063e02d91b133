// Applicant intake: signup submission and résumé retrieval.
// Handlers stay thin; validation is pure and service owns the storage ordering.

pub mod handlers;
pub mod service;
pub mod validation;
