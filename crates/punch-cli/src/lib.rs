//! Shift clock CLI library.
//!
//! This crate provides the CLI interface for the punch shift clock.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, UserAction};
pub use config::Config;
