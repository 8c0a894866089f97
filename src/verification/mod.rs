pub mod repo;
pub mod service;

pub use repo::VerificationRecord;
pub use service::{issue, verify, VerifyError, CODE_TTL_MINUTES};
