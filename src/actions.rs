//! Read-modify-write flows over a goal's task list.
//!
//! Every mutation follows the same discipline: load the goal, rework the
//! task sequence in memory, recompute progress from scratch, then persist
//! list and progress together through one transactional store write.

use chrono::{DateTime, Utc};

use crate::database::{Database, StoreError, StoreResult};
use crate::models::{percent_complete, Goal, Priority, Task};

fn fetch(db: &Database, goal_id: &str) -> StoreResult<Goal> {
    db.goal(goal_id)?
        .ok_or_else(|| StoreError::GoalNotFound(goal_id.to_string()))
}

fn write_back(db: &mut Database, mut goal: Goal) -> StoreResult<Goal> {
    goal.progress = percent_complete(&goal.tasks);
    db.update_goal_tasks(&goal.id, &goal.tasks, goal.progress)?;
    Ok(goal)
}

/// Flips the matching task between pending and completed and persists the
/// recomputed goal. Tasks that don't match keep their status and order; an
/// unknown `task_id` still writes the goal back unchanged.
pub fn toggle_task(db: &mut Database, goal_id: &str, task_id: &str) -> StoreResult<Goal> {
    let mut goal = fetch(db, goal_id)?;
    for task in &mut goal.tasks {
        if task.id == task_id {
            task.status = task.status.toggled();
        }
    }
    write_back(db, goal)
}

/// Appends a new pending task to the end of the goal's list.
pub fn add_task(
    db: &mut Database,
    goal_id: &str,
    title: &str,
    due_date: DateTime<Utc>,
    priority: Priority,
) -> StoreResult<Goal> {
    let mut goal = fetch(db, goal_id)?;
    goal.tasks.push(Task::new(title, due_date, priority));
    write_back(db, goal)
}

pub fn remove_task(db: &mut Database, goal_id: &str, task_id: &str) -> StoreResult<Goal> {
    let mut goal = fetch(db, goal_id)?;
    goal.tasks.retain(|task| task.id != task_id);
    write_back(db, goal)
}

pub fn set_task_priority(
    db: &mut Database,
    goal_id: &str,
    task_id: &str,
    priority: Priority,
) -> StoreResult<Goal> {
    let mut goal = fetch(db, goal_id)?;
    for task in &mut goal.tasks {
        if task.id == task_id {
            task.priority = priority;
        }
    }
    write_back(db, goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn seeded(statuses: &[TaskStatus]) -> (Database, Goal) {
        let mut db = Database::open_in_memory().unwrap();
        let goal = db.create_goal("ship the release", "").unwrap();

        let tasks: Vec<Task> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut task = Task::new(&format!("task {i}"), Utc::now(), Priority::Medium);
                task.status = *status;
                task
            })
            .collect();
        db.update_goal_tasks(&goal.id, &tasks, percent_complete(&tasks))
            .unwrap();

        let goal = db.goal(&goal.id).unwrap().unwrap();
        (db, goal)
    }

    #[test]
    fn toggling_second_of_two_reaches_full_progress() {
        let (mut db, goal) = seeded(&[TaskStatus::Completed, TaskStatus::Pending]);
        assert_eq!(goal.progress, 50);

        let updated = toggle_task(&mut db, &goal.id, &goal.tasks[1].id).unwrap();
        assert_eq!(updated.progress, 100);
        assert!(updated.tasks.iter().all(|t| t.status.is_completed()));

        // The store saw the same single write.
        let stored = db.goal(&goal.id).unwrap().unwrap();
        assert_eq!(stored.progress, 100);
        assert_eq!(stored.tasks, updated.tasks);
    }

    #[test]
    fn toggling_twice_restores_the_original_state() {
        let (mut db, goal) = seeded(&[TaskStatus::Pending, TaskStatus::Completed]);

        toggle_task(&mut db, &goal.id, &goal.tasks[0].id).unwrap();
        let restored = toggle_task(&mut db, &goal.id, &goal.tasks[0].id).unwrap();

        assert_eq!(restored.progress, goal.progress);
        assert_eq!(restored.tasks, goal.tasks);
    }

    #[test]
    fn toggle_keeps_task_order() {
        let (mut db, goal) = seeded(&[
            TaskStatus::Pending,
            TaskStatus::Pending,
            TaskStatus::Pending,
        ]);

        let updated = toggle_task(&mut db, &goal.id, &goal.tasks[1].id).unwrap();
        let titles: Vec<&str> = updated.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["task 0", "task 1", "task 2"]);
        assert_eq!(updated.progress, 33);
    }

    #[test]
    fn toggle_on_missing_goal_errors_and_writes_nothing() {
        let (mut db, goal) = seeded(&[TaskStatus::Pending]);

        let err = toggle_task(&mut db, "ghost", "whatever").unwrap_err();
        assert!(matches!(err, StoreError::GoalNotFound(_)));

        let untouched = db.goal(&goal.id).unwrap().unwrap();
        assert_eq!(untouched, goal);
    }

    #[test]
    fn toggle_with_unknown_task_id_is_a_persisted_noop() {
        let (mut db, goal) = seeded(&[TaskStatus::Pending]);

        let updated = toggle_task(&mut db, &goal.id, "no-such-task").unwrap();
        assert_eq!(updated.progress, 0);
        assert_eq!(updated.tasks[0].status, TaskStatus::Pending);
    }

    #[test]
    fn toggle_on_empty_goal_keeps_progress_at_zero() {
        let (mut db, goal) = seeded(&[]);

        let updated = toggle_task(&mut db, &goal.id, "anything").unwrap();
        assert_eq!(updated.progress, 0);
        assert!(updated.tasks.is_empty());
    }

    #[test]
    fn adding_a_task_dilutes_progress() {
        let (mut db, goal) = seeded(&[TaskStatus::Completed]);
        assert_eq!(goal.progress, 100);

        let updated = add_task(&mut db, &goal.id, "new work", Utc::now(), Priority::High).unwrap();
        assert_eq!(updated.progress, 50);
        assert_eq!(updated.tasks.len(), 2);
        assert_eq!(updated.tasks[1].title, "new work");
        assert_eq!(updated.tasks[1].status, TaskStatus::Pending);
    }

    #[test]
    fn removing_the_last_pending_task_completes_the_goal() {
        let (mut db, goal) = seeded(&[TaskStatus::Pending, TaskStatus::Completed]);

        let updated = remove_task(&mut db, &goal.id, &goal.tasks[0].id).unwrap();
        assert_eq!(updated.progress, 100);
        assert_eq!(updated.tasks.len(), 1);
    }

    #[test]
    fn removing_every_task_resets_progress() {
        let (mut db, goal) = seeded(&[TaskStatus::Completed]);

        let updated = remove_task(&mut db, &goal.id, &goal.tasks[0].id).unwrap();
        assert_eq!(updated.progress, 0);
        assert!(updated.tasks.is_empty());
    }

    #[test]
    fn priority_change_leaves_status_and_progress_alone() {
        let (mut db, goal) = seeded(&[TaskStatus::Completed, TaskStatus::Pending]);

        let updated =
            set_task_priority(&mut db, &goal.id, &goal.tasks[0].id, Priority::High).unwrap();
        assert_eq!(updated.tasks[0].priority, Priority::High);
        assert_eq!(updated.tasks[0].status, TaskStatus::Completed);
        assert_eq!(updated.progress, 50);
    }
}
