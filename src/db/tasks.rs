//! Task CRUD operations.

use super::{Database, from_ms, now_ms, read_timestamp};
use crate::types::{Task, TaskFilter, TaskUpdate};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        is_completed: row.get("is_completed")?,
        created_at: read_timestamp(row, "created_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT * FROM tasks WHERE id = ?1",
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

fn insert_task(conn: &Connection, user_id: i64, title: &str, now: i64) -> Result<Task> {
    conn.execute(
        "INSERT INTO tasks (user_id, title, is_completed, created_at) VALUES (?1, ?2, 0, ?3)",
        params![user_id, title, now],
    )?;

    Ok(Task {
        id: conn.last_insert_rowid(),
        user_id,
        title: title.to_string(),
        is_completed: false,
        created_at: from_ms(now),
    })
}

impl Database {
    /// Create a pending task for a user.
    pub fn create_task(&self, user_id: i64, title: &str) -> Result<Task> {
        let now = now_ms();
        self.with_conn(|conn| insert_task(conn, user_id, title, now))
    }

    /// Create several tasks atomically. Nothing is written if any insert fails.
    pub fn bulk_create_tasks(&self, user_id: i64, titles: &[String]) -> Result<Vec<Task>> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut created = Vec::with_capacity(titles.len());
            for title in titles {
                created.push(insert_task(&tx, user_id, title, now)?);
            }
            tx.commit()?;
            Ok(created)
        })
    }

    /// Get a task by ID regardless of owner.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// A user's tasks, newest first.
    pub fn list_tasks(&self, user_id: i64, filter: TaskFilter) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks WHERE user_id = ?1");
            match filter {
                TaskFilter::All => {}
                TaskFilter::Pending => sql.push_str(" AND is_completed = 0"),
                TaskFilter::Completed => sql.push_str(" AND is_completed = 1"),
            }
            // Same-millisecond inserts keep insertion order reversed via id.
            sql.push_str(" ORDER BY created_at DESC, id DESC");

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params![user_id], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Apply the provided fields. Returns `None` if the task does not exist.
    pub fn update_task(&self, task_id: i64, update: &TaskUpdate) -> Result<Option<Task>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if get_task_internal(&tx, task_id)?.is_none() {
                return Ok(None);
            }

            if let Some(title) = &update.title {
                tx.execute(
                    "UPDATE tasks SET title = ?1 WHERE id = ?2",
                    params![title, task_id],
                )?;
            }
            if let Some(done) = update.is_completed {
                tx.execute(
                    "UPDATE tasks SET is_completed = ?1 WHERE id = ?2",
                    params![done, task_id],
                )?;
            }

            let task = get_task_internal(&tx, task_id)?;
            tx.commit()?;
            Ok(task)
        })
    }

    /// Delete a task. Returns whether a row was removed.
    pub fn delete_task(&self, task_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(deleted > 0)
        })
    }
}
