//! Database models for Progresso
//!
//! This module contains all database models and their queries.
//!
//! # Models
//!
//! - `user`: User accounts (credential store)
//! - `project`: Projects and their assembled details view
//! - `project_member`: User-project memberships
//! - `task`: Tasks and the task status cycle

pub mod project;
pub mod project_member;
pub mod task;
pub mod user;
