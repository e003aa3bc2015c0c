//! # roster
//!
//! Server and CLI front ends for the roster-core registry.
//!
//! - `api`: axum HTTP server over a shared `Manager`
//! - `cli`: clap commands for one-shot operations
//! - `config`: layered settings (defaults, TOML file, environment, flags)

pub mod api;
pub mod cli;
pub mod config;
