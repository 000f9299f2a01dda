//! Schedule diff CLI library.
//!
//! This crate provides the command-line interface for the schedule snapshot
//! tools: extracting events from calendar exports, comparing two snapshots,
//! and small reporting helpers over one snapshot.

mod cli;
pub mod commands;
mod config;
pub mod report;

pub use cli::{Cli, Commands};
pub use config::Config;
