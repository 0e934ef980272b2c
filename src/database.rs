use std::path::{Path, PathBuf};
use std::time::Duration;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::models::{Goal, Task};

/// Minimum skim score before a near-miss title is offered as a suggestion.
pub const FUZZY_SUGGEST_THRESHOLD: i64 = 40;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Goal '{0}' not found")]
    GoalNotFound(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of resolving a user-supplied goal name.
#[derive(Debug)]
pub enum GoalMatch {
    /// Title matched exactly.
    Found(Goal),
    /// No exact match, but a title scored above the suggestion threshold.
    Close(Goal),
    Missing,
}

pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens the store at `$ATTAIN_DB`, falling back to `~/.attain.db`.
    pub fn open_default() -> StoreResult<Self> {
        if let Ok(path) = std::env::var("ATTAIN_DB") {
            return Self::open(path);
        }
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self::open(PathBuf::from(home_dir).join(".attain.db"))
    }

    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        Self::init(&conn)?;
        log::debug!("opened store at {}", path.display());
        Ok(Database {
            conn,
            path: Some(path),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Database { conn, path: None })
    }

    fn init(conn: &Connection) -> StoreResult<()> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Create tables if they don't exist
        conn.execute(
            "CREATE TABLE IF NOT EXISTS goals (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                progress INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                goal_id TEXT NOT NULL REFERENCES goals (id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                due_date TEXT NOT NULL,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                position INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// File path backing this store. `None` for in-memory stores, which
    /// cannot be reopened from a worker thread.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn create_goal(&self, title: &str, description: &str) -> StoreResult<Goal> {
        let goal = Goal::new(title, description);
        self.conn.execute(
            "INSERT INTO goals (id, title, description, progress, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                goal.id,
                goal.title,
                goal.description,
                goal.progress,
                goal.created_at
            ],
        )?;
        Ok(goal)
    }

    pub fn goal(&self, goal_id: &str) -> StoreResult<Option<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, progress, created_at
             FROM goals WHERE id = ?1",
        )?;

        let goal = stmt
            .query_row(params![goal_id], |row| {
                Ok(Goal {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    progress: row.get(3)?,
                    created_at: row.get(4)?,
                    tasks: Vec::new(),
                })
            })
            .optional()?;

        match goal {
            Some(mut goal) => {
                goal.tasks = self.tasks_for(&goal.id)?;
                Ok(Some(goal))
            }
            None => Ok(None),
        }
    }

    pub fn list_goals(&self) -> StoreResult<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, progress, created_at
             FROM goals ORDER BY created_at",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Goal {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                progress: row.get(3)?,
                created_at: row.get(4)?,
                tasks: Vec::new(),
            })
        })?;

        let mut goals = Vec::new();
        for row in rows {
            goals.push(row?);
        }

        for goal in &mut goals {
            goal.tasks = self.tasks_for(&goal.id)?;
        }

        Ok(goals)
    }

    fn tasks_for(&self, goal_id: &str) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, due_date, priority, status
             FROM tasks WHERE goal_id = ?1 ORDER BY position",
        )?;

        let rows = stmt.query_map(params![goal_id], |row| {
            Ok(Task {
                id: row.get(0)?,
                title: row.get(1)?,
                due_date: row.get(2)?,
                priority: row.get(3)?,
                status: row.get(4)?,
            })
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }

        Ok(tasks)
    }

    /// Replaces a goal's task list and stored progress in one transaction.
    /// The whole write is rolled back if the goal row no longer exists.
    pub fn update_goal_tasks(
        &mut self,
        goal_id: &str,
        tasks: &[Task],
        progress: u8,
    ) -> StoreResult<()> {
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE goals SET progress = ?1 WHERE id = ?2",
            params![progress, goal_id],
        )?;
        if updated == 0 {
            return Err(StoreError::GoalNotFound(goal_id.to_string()));
        }

        tx.execute("DELETE FROM tasks WHERE goal_id = ?1", params![goal_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tasks (id, goal_id, title, due_date, priority, status, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (position, task) in tasks.iter().enumerate() {
                stmt.execute(params![
                    task.id,
                    goal_id,
                    task.title,
                    task.due_date,
                    task.priority,
                    task.status,
                    position as i64
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    pub fn delete_goal(&self, goal_id: &str) -> StoreResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM goals WHERE id = ?1", params![goal_id])?;
        if deleted == 0 {
            return Err(StoreError::GoalNotFound(goal_id.to_string()));
        }
        Ok(())
    }

    /// Resolves a goal by title, first exactly, then by best fuzzy score.
    pub fn find_goal(&self, name: &str) -> StoreResult<GoalMatch> {
        let goals = self.list_goals()?;

        for goal in &goals {
            if goal.title == name {
                return Ok(GoalMatch::Found(goal.clone()));
            }
        }

        let matcher = SkimMatcherV2::default();
        let mut best: Option<(i64, &Goal)> = None;
        for goal in &goals {
            if let Some(score) = matcher.fuzzy_match(&goal.title, name) {
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, goal));
                }
            }
        }

        match best {
            Some((score, goal)) if score >= FUZZY_SUGGEST_THRESHOLD => {
                Ok(GoalMatch::Close(goal.clone()))
            }
            _ => Ok(GoalMatch::Missing),
        }
    }

    pub fn clear_all(&self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM tasks", [])?;
        self.conn.execute("DELETE FROM goals", [])?;
        Ok(())
    }
}
