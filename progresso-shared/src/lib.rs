//! # Progresso Shared Library
//!
//! This crate contains the data layer, authentication primitives and
//! dashboard logic used by the Progresso API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and embedded migrations
//! - `models`: Database models (users, projects, memberships, tasks)
//! - `auth`: Password hashing, session tokens, login flow
//! - `dashboard`: Derived dashboard state (progress, deadlines, filtering)

pub mod auth;
pub mod dashboard;
pub mod db;
pub mod models;

/// Current version of the Progresso shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
