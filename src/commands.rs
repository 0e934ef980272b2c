use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::actions;
use crate::database::{Database, GoalMatch, FUZZY_SUGGEST_THRESHOLD};
use crate::models::{Goal, Priority, Task};

// Helper function to ask user for confirmation
fn confirm(prompt: &str) -> bool {
    print!("{} (y/n): ", prompt);
    io::stdout().flush().unwrap();

    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}

/// Resolves a goal name to a stored goal, falling back to a "Did you mean"
/// prompt for near misses. `None` means the command already told the user
/// why nothing will happen.
fn resolve_goal(db: &Database, name: &str) -> Result<Option<Goal>> {
    match db.find_goal(name)? {
        GoalMatch::Found(goal) => Ok(Some(goal)),
        GoalMatch::Close(goal) => {
            if confirm(&format!("'{}' not found. Did you mean '{}'?", name, goal.title)) {
                Ok(Some(goal))
            } else {
                println!("Operation cancelled.");
                Ok(None)
            }
        }
        GoalMatch::Missing => {
            println!("Goal '{}' not found.", name);
            Ok(None)
        }
    }
}

fn resolve_task(goal: &Goal, name: &str) -> Option<Task> {
    if let Some(task) = goal.tasks.iter().find(|t| t.title == name) {
        return Some(task.clone());
    }

    let matcher = SkimMatcherV2::default();
    let mut best: Option<(i64, &Task)> = None;
    for task in &goal.tasks {
        if let Some(score) = matcher.fuzzy_match(&task.title, name) {
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, task));
            }
        }
    }

    match best {
        Some((score, task)) if score >= FUZZY_SUGGEST_THRESHOLD => {
            if confirm(&format!("'{}' not found. Did you mean '{}'?", name, task.title)) {
                Some(task.clone())
            } else {
                println!("Operation cancelled.");
                None
            }
        }
        _ => {
            println!("Task '{}' not found.", name);
            None
        }
    }
}

fn parse_due(raw: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid due date '{}', expected YYYY-MM-DD", raw))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

pub fn goal_new(db: &Database, title: &str, description: &str) -> Result<()> {
    let goal = db.create_goal(title, description)?;
    println!("Goal '{}' created.", goal.title);
    Ok(())
}

pub fn goal_list(db: &Database, json: bool) -> Result<()> {
    let goals = db.list_goals()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
        return Ok(());
    }

    if goals.is_empty() {
        println!("No goals yet. Create one with: attain new <TITLE>");
        return Ok(());
    }

    println!("Goals:");
    println!("------");
    for goal in &goals {
        println!(
            "{} | {}% | {}/{} tasks done",
            goal.title,
            goal.progress,
            goal.completed_count(),
            goal.tasks.len()
        );
    }
    Ok(())
}

pub fn goal_show(db: &Database, name: &str, json: bool) -> Result<()> {
    let Some(goal) = resolve_goal(db, name)? else {
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&goal)?);
        return Ok(());
    }

    println!("Goal: {}", goal.title);
    if !goal.description.is_empty() {
        println!("{}", goal.description);
    }
    println!("Progress: {}%", goal.progress);
    println!();
    print_tasks(&goal.tasks);
    Ok(())
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    for task in tasks {
        let mark = if task.status.is_completed() { "x" } else { " " };
        println!(
            "[{}] {} | due {} | {}",
            mark,
            task.title,
            task.due_date.format("%Y-%m-%d"),
            task.priority
        );
    }
}

pub fn goal_delete(db: &Database, name: &str, yes: bool) -> Result<()> {
    let Some(goal) = resolve_goal(db, name)? else {
        return Ok(());
    };

    let prompt = format!(
        "Delete goal '{}' and its {} tasks?",
        goal.title,
        goal.tasks.len()
    );
    if !yes && !confirm(&prompt) {
        println!("Operation cancelled.");
        return Ok(());
    }

    db.delete_goal(&goal.id)?;
    println!("Goal '{}' deleted.", goal.title);
    Ok(())
}

pub fn task_add(
    db: &mut Database,
    goal_name: &str,
    title: &str,
    due: Option<&str>,
    priority: Priority,
) -> Result<()> {
    let Some(goal) = resolve_goal(db, goal_name)? else {
        return Ok(());
    };

    let due_date = match due {
        Some(raw) => parse_due(raw)?,
        None => Utc::now() + Duration::days(7),
    };

    let updated = actions::add_task(db, &goal.id, title, due_date, priority)?;
    println!(
        "Task '{}' added to '{}' ({}% complete).",
        title, updated.title, updated.progress
    );
    Ok(())
}

pub fn task_toggle(db: &mut Database, goal_name: &str, task_name: &str) -> Result<()> {
    let Some(goal) = resolve_goal(db, goal_name)? else {
        return Ok(());
    };
    let Some(task) = resolve_task(&goal, task_name) else {
        return Ok(());
    };

    match actions::toggle_task(db, &goal.id, &task.id) {
        Ok(updated) => {
            println!(
                "Task '{}' is now {} ({}% complete).",
                task.title,
                task.status.toggled(),
                updated.progress
            );
        }
        Err(err) => {
            log::error!("failed to update task status: {}", err);
            println!("Failed to update task status. Please try again.");
        }
    }
    Ok(())
}

pub fn task_delete(db: &mut Database, goal_name: &str, task_name: &str) -> Result<()> {
    let Some(goal) = resolve_goal(db, goal_name)? else {
        return Ok(());
    };
    let Some(task) = resolve_task(&goal, task_name) else {
        return Ok(());
    };

    let updated = actions::remove_task(db, &goal.id, &task.id)?;
    println!(
        "Task '{}' deleted from '{}' ({}% complete).",
        task.title, updated.title, updated.progress
    );
    Ok(())
}

pub fn task_priority(
    db: &mut Database,
    goal_name: &str,
    task_name: &str,
    priority: Priority,
) -> Result<()> {
    let Some(goal) = resolve_goal(db, goal_name)? else {
        return Ok(());
    };
    let Some(task) = resolve_task(&goal, task_name) else {
        return Ok(());
    };

    actions::set_task_priority(db, &goal.id, &task.id, priority)?;
    println!("Task '{}' priority set to {}.", task.title, priority);
    Ok(())
}

pub fn task_list(db: &Database, goal_name: &str, json: bool) -> Result<()> {
    let Some(goal) = resolve_goal(db, goal_name)? else {
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&goal.tasks)?);
        return Ok(());
    }

    println!("Tasks of '{}':", goal.title);
    println!("------");
    print_tasks(&goal.tasks);
    Ok(())
}

pub fn clear(db: &Database, yes: bool) -> Result<()> {
    if !yes && !confirm("Delete ALL goals and tasks?") {
        println!("Operation cancelled.");
        return Ok(());
    }
    db.clear_all()?;
    println!("All data cleared successfully!");
    Ok(())
}
