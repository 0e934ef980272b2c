use clap::{Parser, Subcommand};

use crate::models::Priority;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database path (defaults to $ATTAIN_DB, then ~/.attain.db)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new goal
    New {
        #[arg(value_name = "TITLE")]
        title: String,
        /// Longer free-form description
        #[arg(short = 'd', long = "description", default_value = "")]
        description: String,
    },
    /// List all goals with their progress
    List {
        /// Print machine-readable JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one goal and its tasks
    Show {
        #[arg(value_name = "GOAL")]
        goal: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a goal and all of its tasks
    Delete {
        #[arg(value_name = "GOAL")]
        goal: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Add a task to a goal
    TaskAdd {
        #[arg(value_name = "GOAL")]
        goal: String,
        #[arg(value_name = "TITLE")]
        title: String,
        /// Due date as YYYY-MM-DD (defaults to one week out)
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },
    /// Flip a task between pending and completed
    TaskToggle {
        #[arg(value_name = "GOAL")]
        goal: String,
        #[arg(value_name = "TASK")]
        task: String,
    },
    /// Delete a task from a goal
    TaskDelete {
        #[arg(value_name = "GOAL")]
        goal: String,
        #[arg(value_name = "TASK")]
        task: String,
    },
    /// Change a task's priority
    TaskPriority {
        #[arg(value_name = "GOAL")]
        goal: String,
        #[arg(value_name = "TASK")]
        task: String,
        #[arg(value_enum, value_name = "PRIORITY")]
        priority: Priority,
    },
    /// List a goal's tasks
    Tasks {
        #[arg(value_name = "GOAL")]
        goal: String,
        #[arg(long)]
        json: bool,
    },
    /// Clear all data (WARNING: deletes every goal and task)
    Clear {
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Launch TUI interface
    Tui,
    /// Generate shell completion scripts
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
