//! SeaORM entity definitions.

pub mod application;
pub mod application_document;
pub mod company;
pub mod offer;
pub mod user;
