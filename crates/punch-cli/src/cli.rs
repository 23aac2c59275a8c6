//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use punch_core::Role;

/// Shift clock for tracked work time.
///
/// Records clock-in/clock-out shifts with breaks and reports actual
/// worked time per worker, day, and month.
#[derive(Debug, Parser)]
#[command(name = "punch", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clock in and start a new shift.
    In {
        /// The worker clocking in.
        #[arg(long)]
        user: String,
    },

    /// Start a break on the current shift.
    Pause {
        #[arg(long)]
        user: String,
    },

    /// End the current break and get back to work.
    Resume {
        #[arg(long)]
        user: String,
    },

    /// Clock out and end the shift.
    Out {
        #[arg(long)]
        user: String,
    },

    /// Show the current shift and time worked so far.
    Status {
        #[arg(long)]
        user: String,
    },

    /// Show a worker's own shifts grouped by day.
    Hours {
        #[arg(long)]
        user: String,

        /// Output as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// All workers' shifts grouped by day (admin only).
    Report {
        /// The acting user; must have the admin role.
        #[arg(long = "as")]
        acting: String,

        /// Output as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// One worker's monthly breakdown (admin only).
    ///
    /// Without --year/--month, lists the years and months that have
    /// recorded shifts.
    Month {
        /// The acting user; must have the admin role.
        #[arg(long = "as")]
        acting: String,

        /// The worker to report on.
        #[arg(long)]
        user: String,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long, requires = "year")]
        month: Option<u32>,

        /// Output as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Manage users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

/// User management actions.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Register a user, or update their name and role.
    Add {
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: String,

        /// Either "admin" or "worker".
        #[arg(long, default_value = "worker")]
        role: Role,
    },

    /// List all users.
    List,

    /// Delete a user and, with them, all their shifts and breaks.
    Remove {
        #[arg(long)]
        id: String,
    },
}
