//! Aggregation queries for statistics.

use super::Database;
use crate::types::TaskStats;
use anyhow::Result;
use rusqlite::params;

impl Database {
    /// Completion counts for one user's tasks.
    pub fn task_stats(&self, user_id: i64) -> Result<TaskStats> {
        self.with_conn(|conn| {
            let (total, completed): (i64, i64) = conn.query_row(
                "SELECT
                    COUNT(*) as total,
                    COALESCE(SUM(is_completed), 0) as completed
                FROM tasks WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(TaskStats::from_counts(total, completed))
        })
    }
}
