//! API integration test suite.
//!
//! Runs the HTTP routes against an in-memory SQLite database and a temporary
//! local document store.
//!
//! Run with: cargo test --test api


mod test_applications;
mod test_auth;
mod test_companies;
mod test_documents;
mod test_offers;
