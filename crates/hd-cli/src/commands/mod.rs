//! CLI subcommand implementations.

pub mod diff;
pub mod extract;
pub mod groupe_profs;
