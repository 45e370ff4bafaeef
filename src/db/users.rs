//! User accounts and their goal/note context.

use super::{Database, from_ms, now_ms, read_timestamp};
use crate::types::{ContextUpdate, User, UserContext};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, warn};

pub fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        hashed_password: row.get("hashed_password")?,
        goals: row.get("goals")?,
        notes: row.get("notes")?,
        created_at: read_timestamp(row, "created_at")?,
    })
}

/// Internal helper to get a user using an existing connection.
fn get_user_internal(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT * FROM users WHERE id = ?1",
            params![user_id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl Database {
    /// Insert a new user. Returns `None` when the email is already taken.
    pub fn create_user(&self, email: &str, hashed_password: &str) -> Result<Option<User>> {
        let now = now_ms();

        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (email, hashed_password, created_at) VALUES (?1, ?2, ?3)",
                params![email, hashed_password, now],
            );

            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    debug!(email, "Email already registered");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }

            Ok(Some(User {
                id: conn.last_insert_rowid(),
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
                goals: None,
                notes: None,
                created_at: from_ms(now),
            }))
        })
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| get_user_internal(conn, user_id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT * FROM users WHERE email = ?1",
                    params![email],
                    parse_user_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// All users, oldest first.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY id ASC")?;
            let users = stmt
                .query_map([], parse_user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    /// Goals and notes for prompt building, NULLs read as empty strings.
    pub fn get_user_context(&self, user_id: i64) -> Result<Option<UserContext>> {
        Ok(self.get_user(user_id)?.map(|user| UserContext {
            goals: user.goals.unwrap_or_default(),
            notes: user.notes.unwrap_or_default(),
        }))
    }

    /// Write the provided context fields, leaving absent ones untouched.
    pub fn update_user_context(&self, user_id: i64, update: &ContextUpdate) -> Result<Option<User>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if get_user_internal(&tx, user_id)?.is_none() {
                warn!(user_id, "User not found for context update");
                return Ok(None);
            }

            if let Some(goals) = &update.goals {
                tx.execute(
                    "UPDATE users SET goals = ?1 WHERE id = ?2",
                    params![goals, user_id],
                )?;
            }
            if let Some(notes) = &update.notes {
                tx.execute(
                    "UPDATE users SET notes = ?1 WHERE id = ?2",
                    params![notes, user_id],
                )?;
            }

            let user = get_user_internal(&tx, user_id)?;
            tx.commit()?;
            Ok(user)
        })
    }

    /// Reset goals and notes to empty strings.
    pub fn clear_user_context(&self, user_id: i64) -> Result<Option<User>> {
        self.update_user_context(user_id, &ContextUpdate::cleared())
    }

    /// Remove a user. Their tasks go with them.
    pub fn delete_user(&self, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
            Ok(deleted > 0)
        })
    }
}
