//! # Progresso API Server Library
//!
//! HTTP surface of Progresso: session login, projects, tasks, memberships
//! and the dashboard.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
