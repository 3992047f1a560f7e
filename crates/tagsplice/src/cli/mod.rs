//! Subcommand implementations.

pub mod compose;
pub mod config;
pub mod filter;
pub mod models;
pub mod run;
