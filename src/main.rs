mod cli;
mod models;
mod database;
mod actions;
mod commands;
mod toast;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use database::Database;
use ui::run_tui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut db = match cli.db.as_deref() {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };

    match cli.command {
        Some(Commands::New { title, description }) => {
            commands::goal_new(&db, &title, &description)?;
        }
        Some(Commands::List { json }) => {
            commands::goal_list(&db, json)?;
        }
        Some(Commands::Show { goal, json }) => {
            commands::goal_show(&db, &goal, json)?;
        }
        Some(Commands::Delete { goal, yes }) => {
            commands::goal_delete(&db, &goal, yes)?;
        }
        Some(Commands::TaskAdd {
            goal,
            title,
            due,
            priority,
        }) => {
            commands::task_add(&mut db, &goal, &title, due.as_deref(), priority)?;
        }
        Some(Commands::TaskToggle { goal, task }) => {
            commands::task_toggle(&mut db, &goal, &task)?;
        }
        Some(Commands::TaskDelete { goal, task }) => {
            commands::task_delete(&mut db, &goal, &task)?;
        }
        Some(Commands::TaskPriority {
            goal,
            task,
            priority,
        }) => {
            commands::task_priority(&mut db, &goal, &task, priority)?;
        }
        Some(Commands::Tasks { goal, json }) => {
            commands::task_list(&db, &goal, json)?;
        }
        Some(Commands::Clear { yes }) => {
            commands::clear(&db, yes)?;
        }
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "attain", &mut std::io::stdout());
        }
        Some(Commands::Tui) => {
            run_tui(db)?;
        }
        None => {
            // Default behavior: launch TUI
            run_tui(db)?;
        }
    }

    Ok(())
}
