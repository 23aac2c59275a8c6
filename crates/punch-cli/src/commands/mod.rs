//! CLI subcommand implementations.

pub mod clock;
pub mod hours;
pub mod report;
pub mod status;
pub mod users;
mod util;
