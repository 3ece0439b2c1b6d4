//! Handi server library.
//!
//! Job board API: applicant and recruiter accounts, companies, job offers,
//! applications and the CV / cover letter documents attached to them.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
