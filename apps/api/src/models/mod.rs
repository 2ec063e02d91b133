pub mod applicant;
