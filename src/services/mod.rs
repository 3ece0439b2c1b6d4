//! Business logic services.

pub mod documents;
pub mod storage;
pub mod workflow;

pub use storage::Storage;
