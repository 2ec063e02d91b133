pub mod blobs;
pub mod records;
