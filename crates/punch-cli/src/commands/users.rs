//! User management commands.

use std::io::Write;

use anyhow::{Context, Result};

use punch_core::{Role, UserId};
use punch_db::Database;

fn parse_user(id: &str) -> Result<UserId> {
    UserId::new(id).with_context(|| format!("invalid user ID: {id:?}"))
}

/// Registers a user or updates their name and role.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    id: &str,
    name: &str,
    role: Role,
) -> Result<()> {
    let id = parse_user(id)?;
    db.upsert_user(&id, name, role)?;
    tracing::info!(user = %id, %role, "user saved");
    writeln!(writer, "Saved user {id} ({name}, {role}).")?;
    Ok(())
}

/// Lists all users.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let users = db.list_users()?;
    if users.is_empty() {
        writeln!(writer, "No users.")?;
        return Ok(());
    }
    for user in users {
        writeln!(writer, "{} ({}): {}", user.name, user.id, user.role)?;
    }
    Ok(())
}

/// Deletes a user; their shifts and breaks go with them.
pub fn remove<W: Write>(writer: &mut W, db: &mut Database, id: &str) -> Result<()> {
    let id = parse_user(id)?;
    if db.remove_user(&id)? {
        tracing::info!(user = %id, "user removed");
        writeln!(writer, "Removed user {id} and their shifts.")?;
    } else {
        writeln!(writer, "No such user: {id}.")?;
    }
    Ok(())
}
