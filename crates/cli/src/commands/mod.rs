//! CLI subcommands

pub mod apps;
pub mod users;
