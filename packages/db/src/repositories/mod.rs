//! Repository implementations for database operations.

mod upload_repo;

pub use upload_repo::UploadRepository;
