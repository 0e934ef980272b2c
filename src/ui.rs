use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::collections::HashSet;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::actions;
use crate::database::{Database, StoreResult};
use crate::models::{Goal, PopupMode, Priority, Task};
use crate::toast::{ToastVariant, Toasts};

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Goals,
    Tasks,
}

/// Results delivered back to the draw loop from background store writes.
pub enum AppEvent {
    TaskToggled {
        task_id: String,
        result: StoreResult<Goal>,
    },
}

pub struct App {
    db: Database,
    pub goals: Vec<Goal>,
    pub goal_list_state: ListState,
    pub task_list_state: ListState,
    pub focus: Pane,
    pub should_quit: bool,
    // UI state
    pub popup_mode: PopupMode,
    pub input_buffer: String,
    pub status: String,
    pub toasts: Toasts,
    // Task ids with a store write still running on a worker thread
    pub in_flight: HashSet<String>,
    spinner_tick: usize,
    event_tx: mpsc::Sender<AppEvent>,
    event_rx: mpsc::Receiver<AppEvent>,
}

impl App {
    pub fn new(db: Database) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel(100);
        let mut app = App {
            db,
            goals: Vec::new(),
            goal_list_state: ListState::default(),
            task_list_state: ListState::default(),
            focus: Pane::Goals,
            should_quit: false,
            popup_mode: PopupMode::None,
            input_buffer: String::new(),
            status: "Ready".to_string(),
            toasts: Toasts::new(),
            in_flight: HashSet::new(),
            spinner_tick: 0,
            event_tx,
            event_rx,
        };
        app.refresh_data()?;
        Ok(app)
    }

    pub fn refresh_data(&mut self) -> StoreResult<()> {
        self.goals = self.db.list_goals()?;
        self.clamp_selection();
        Ok(())
    }

    fn clamp_selection(&mut self) {
        if self.goals.is_empty() {
            self.goal_list_state.select(None);
            self.task_list_state.select(None);
            return;
        }

        let goal_idx = self
            .goal_list_state
            .selected()
            .unwrap_or(0)
            .min(self.goals.len() - 1);
        self.goal_list_state.select(Some(goal_idx));

        let task_count = self.goals[goal_idx].tasks.len();
        if task_count == 0 {
            self.task_list_state.select(None);
        } else {
            let task_idx = self
                .task_list_state
                .selected()
                .unwrap_or(0)
                .min(task_count - 1);
            self.task_list_state.select(Some(task_idx));
        }
    }

    pub fn selected_goal(&self) -> Option<&Goal> {
        self.goal_list_state
            .selected()
            .and_then(|i| self.goals.get(i))
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let goal = self.selected_goal()?;
        self.task_list_state
            .selected()
            .and_then(|i| goal.tasks.get(i))
    }

    pub fn switch_pane(&mut self) {
        self.focus = match self.focus {
            Pane::Goals => Pane::Tasks,
            Pane::Tasks => Pane::Goals,
        };
    }

    fn select_goal(&mut self, index: usize) {
        self.goal_list_state.select(Some(index));
        let has_tasks = self.goals.get(index).map_or(false, |g| !g.tasks.is_empty());
        self.task_list_state
            .select(if has_tasks { Some(0) } else { None });
    }

    pub fn next_item(&mut self) {
        match self.focus {
            Pane::Goals => {
                if self.goals.is_empty() {
                    return;
                }
                let i = match self.goal_list_state.selected() {
                    Some(i) => {
                        if i >= self.goals.len() - 1 {
                            0
                        } else {
                            i + 1
                        }
                    }
                    None => 0,
                };
                self.select_goal(i);
            }
            Pane::Tasks => {
                let len = self.selected_goal().map(|g| g.tasks.len()).unwrap_or(0);
                if len == 0 {
                    return;
                }
                let i = match self.task_list_state.selected() {
                    Some(i) => {
                        if i >= len - 1 {
                            0
                        } else {
                            i + 1
                        }
                    }
                    None => 0,
                };
                self.task_list_state.select(Some(i));
            }
        }
    }

    pub fn previous_item(&mut self) {
        match self.focus {
            Pane::Goals => {
                if self.goals.is_empty() {
                    return;
                }
                let i = match self.goal_list_state.selected() {
                    Some(i) => {
                        if i == 0 {
                            self.goals.len() - 1
                        } else {
                            i - 1
                        }
                    }
                    None => 0,
                };
                self.select_goal(i);
            }
            Pane::Tasks => {
                let len = self.selected_goal().map(|g| g.tasks.len()).unwrap_or(0);
                if len == 0 {
                    return;
                }
                let i = match self.task_list_state.selected() {
                    Some(i) => {
                        if i == 0 {
                            len - 1
                        } else {
                            i - 1
                        }
                    }
                    None => 0,
                };
                self.task_list_state.select(Some(i));
            }
        }
    }

    pub fn open_popup(&mut self, mode: PopupMode) {
        self.popup_mode = mode;
        self.input_buffer.clear();
    }

    pub fn close_popup(&mut self) {
        self.popup_mode = PopupMode::None;
        self.input_buffer.clear();
    }

    pub fn handle_popup_input(&mut self, c: char) {
        match self.popup_mode {
            PopupMode::ConfirmDeleteGoal => match c {
                'y' => self.delete_selected_goal(),
                'n' => self.close_popup(),
                _ => {}
            },
            PopupMode::NewGoal | PopupMode::NewTask => {
                if !c.is_control() {
                    self.input_buffer.push(c);
                }
            }
            PopupMode::None => {}
        }
    }

    pub fn submit_popup(&mut self) {
        match self.popup_mode {
            PopupMode::NewGoal => self.create_goal_from_input(),
            PopupMode::NewTask => self.add_task_from_input(),
            _ => {}
        }
    }

    fn create_goal_from_input(&mut self) {
        let title = self.input_buffer.trim().to_string();
        self.close_popup();
        if title.is_empty() {
            return;
        }

        match self.db.create_goal(&title, "") {
            Ok(goal) => {
                self.status = format!("Created goal '{}'", goal.title);
                self.toasts.success("Goal created", &goal.title);
                if let Err(err) = self.refresh_data() {
                    log::error!("failed to reload goals: {}", err);
                }
                if !self.goals.is_empty() {
                    self.select_goal(self.goals.len() - 1);
                }
            }
            Err(err) => {
                log::error!("failed to create goal: {}", err);
                self.toasts
                    .error("Error", "Failed to create goal. Please try again.");
            }
        }
    }

    fn add_task_from_input(&mut self) {
        let title = self.input_buffer.trim().to_string();
        let goal_id = self.selected_goal().map(|g| g.id.clone());
        self.close_popup();
        if title.is_empty() {
            return;
        }
        let Some(goal_id) = goal_id else {
            return;
        };

        let due_date = chrono::Utc::now() + chrono::Duration::days(7);
        match actions::add_task(&mut self.db, &goal_id, &title, due_date, Priority::Medium) {
            Ok(goal) => {
                self.status = format!("Added task '{}' ({}% complete)", title, goal.progress);
                self.replace_goal(goal);
                let task_count = self.selected_goal().map(|g| g.tasks.len()).unwrap_or(0);
                if task_count > 0 {
                    self.task_list_state.select(Some(task_count - 1));
                }
            }
            Err(err) => {
                log::error!("failed to add task: {}", err);
                self.toasts
                    .error("Error", "Failed to add task. Please try again.");
            }
        }
    }

    fn delete_selected_goal(&mut self) {
        let Some((goal_id, title)) = self
            .selected_goal()
            .map(|goal| (goal.id.clone(), goal.title.clone()))
        else {
            self.close_popup();
            return;
        };

        match self.db.delete_goal(&goal_id) {
            Ok(()) => {
                self.status = format!("Deleted goal '{}'", title);
                self.toasts.success("Goal deleted", &title);
                if let Err(err) = self.refresh_data() {
                    log::error!("failed to reload goals: {}", err);
                }
            }
            Err(err) => {
                log::error!("failed to delete goal: {}", err);
                self.toasts
                    .error("Error", "Failed to delete goal. Please try again.");
            }
        }
        self.close_popup();
    }

    pub fn delete_selected_task(&mut self) {
        let Some((goal_id, task_id, title)) = self
            .selected_goal()
            .zip(self.selected_task())
            .map(|(goal, task)| (goal.id.clone(), task.id.clone(), task.title.clone()))
        else {
            return;
        };

        if self.in_flight.contains(&task_id) {
            self.toasts.push(
                "Task busy",
                "Wait for the running update to finish.",
                ToastVariant::Info,
            );
            return;
        }

        match actions::remove_task(&mut self.db, &goal_id, &task_id) {
            Ok(goal) => {
                self.status = format!("Deleted task '{}' ({}% complete)", title, goal.progress);
                self.replace_goal(goal);
                self.clamp_selection();
            }
            Err(err) => {
                log::error!("failed to delete task: {}", err);
                self.toasts
                    .error("Error", "Failed to delete task. Please try again.");
            }
        }
    }

    /// Marks the selected task busy and hands back the ids for the write.
    /// Returns `None` when nothing is selected or the row is already busy,
    /// so a second press while a write runs cannot start another one.
    fn queue_toggle(&mut self) -> Option<(String, String)> {
        let (goal_id, task_id) = self
            .selected_goal()
            .zip(self.selected_task())
            .map(|(goal, task)| (goal.id.clone(), task.id.clone()))?;

        if self.in_flight.contains(&task_id) {
            return None;
        }
        self.in_flight.insert(task_id.clone());
        Some((goal_id, task_id))
    }

    pub fn toggle_selected_task(&mut self) {
        let Some((goal_id, task_id)) = self.queue_toggle() else {
            return;
        };

        match self.db.path().map(|p| p.to_path_buf()) {
            Some(path) => {
                let tx = self.event_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = Database::open(&path)
                        .and_then(|mut db| actions::toggle_task(&mut db, &goal_id, &task_id));
                    let _ = tx.blocking_send(AppEvent::TaskToggled { task_id, result });
                });
            }
            None => {
                // In-memory stores cannot be reopened on a worker thread.
                let result = actions::toggle_task(&mut self.db, &goal_id, &task_id);
                self.handle_app_event(AppEvent::TaskToggled { task_id, result });
            }
        }
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::TaskToggled { task_id, result } => {
                self.in_flight.remove(&task_id);
                match result {
                    Ok(goal) => {
                        self.status =
                            format!("Updated '{}' ({}% complete)", goal.title, goal.progress);
                        self.replace_goal(goal);
                    }
                    Err(err) => {
                        log::error!("failed to update task status: {}", err);
                        self.toasts
                            .error("Error", "Failed to update task status. Please try again.");
                    }
                }
            }
        }
    }

    fn replace_goal(&mut self, goal: Goal) {
        if let Some(slot) = self.goals.iter_mut().find(|g| g.id == goal.id) {
            *slot = goal;
        }
    }
}

pub fn run_tui(db: Database) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(db)?;
    let res = runtime.block_on(run_app(&mut terminal, &mut app));

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.toasts.tick();
        app.spinner_tick = app.spinner_tick.wrapping_add(1);
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code);
                }
            }
        }

        // Drain results of finished background writes
        while let Ok(event) = app.event_rx.try_recv() {
            app.handle_app_event(event);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode) {
    if app.popup_mode != PopupMode::None {
        match code {
            KeyCode::Esc => app.close_popup(),
            KeyCode::Enter => app.submit_popup(),
            KeyCode::Backspace => {
                app.input_buffer.pop();
            }
            KeyCode::Char(c) => app.handle_popup_input(c),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.switch_pane();
        }
        KeyCode::Left => {
            app.focus = Pane::Goals;
        }
        KeyCode::Right => {
            app.focus = Pane::Tasks;
        }
        KeyCode::Down => {
            app.next_item();
        }
        KeyCode::Up => {
            app.previous_item();
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if app.focus == Pane::Tasks {
                app.toggle_selected_task();
            } else {
                app.focus = Pane::Tasks;
            }
        }
        KeyCode::Char('n') => {
            app.open_popup(PopupMode::NewGoal);
        }
        KeyCode::Char('a') => {
            if app.selected_goal().is_some() {
                app.open_popup(PopupMode::NewTask);
            } else {
                app.toasts.push(
                    "No goal selected",
                    "Create one with 'n' first.",
                    ToastVariant::Warning,
                );
            }
        }
        KeyCode::Char('d') => {
            if app.focus == Pane::Tasks {
                app.delete_selected_task();
            }
        }
        KeyCode::Char('D') => {
            if app.selected_goal().is_some() {
                app.open_popup(PopupMode::ConfirmDeleteGoal);
            }
        }
        KeyCode::Char('r') => match app.refresh_data() {
            Ok(()) => app.status = "Reloaded".to_string(),
            Err(err) => {
                log::error!("failed to reload goals: {}", err);
                app.toasts.error("Error", "Failed to reload goals.");
            }
        },
        _ => {}
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    render_header(f, app, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(chunks[1]);

    render_goals(f, app, panes[0]);
    render_tasks(f, app, panes[1]);
    render_status(f, app, chunks[2]);
    render_popup(f, app);

    let area = f.area();
    app.toasts.render(f, area);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let done = app.goals.iter().filter(|g| g.progress == 100).count();
    let header = Paragraph::new(format!("{} goals, {} complete", app.goals.len(), done))
        .block(Block::default().borders(Borders::ALL).title("Attain"))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_goals(f: &mut Frame, app: &mut App, area: Rect) {
    let rows: Vec<ListItem> = app
        .goals
        .iter()
        .map(|goal| {
            let progress_color = if goal.progress == 100 {
                Color::Green
            } else {
                Color::Cyan
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", goal.title),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("[{}%]", goal.progress),
                    Style::default().fg(progress_color),
                ),
            ]))
        })
        .collect();

    let border_style = if app.focus == Pane::Goals {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(rows)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Goals")
                .border_style(border_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, area, &mut app.goal_list_state);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let selected = app.selected_goal().map(|goal| {
        let rows: Vec<ListItem> = goal
            .tasks
            .iter()
            .map(|task| task_row(task, &app.in_flight, app.spinner_tick))
            .collect();
        (goal.title.clone(), goal.progress, rows)
    });

    let Some((title, progress, rows)) = selected else {
        let info_text = "No goal selected\n\nControls:\n• ↑/↓: Navigate\n• Tab: Switch pane\n• n: New goal\n• a: Add task\n• Space: Toggle task\n• d: Delete task\n• D: Delete goal\n• r: Refresh\n• q: Quit";
        let info = Paragraph::new(info_text)
            .block(Block::default().borders(Borders::ALL).title("Tasks"))
            .style(Style::default().fg(Color::White));
        f.render_widget(info, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .percent(progress as u16);
    f.render_widget(gauge, chunks[0]);

    let border_style = if app.focus == Pane::Tasks {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(rows)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Tasks")
                .border_style(border_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, chunks[1], &mut app.task_list_state);
}

fn task_row(task: &Task, in_flight: &HashSet<String>, spinner_tick: usize) -> ListItem<'static> {
    let (icon, icon_color) = if in_flight.contains(&task.id) {
        (SPINNER_FRAMES[spinner_tick % SPINNER_FRAMES.len()], Color::Cyan)
    } else if task.status.is_completed() {
        ("✓", Color::Green)
    } else {
        ("○", Color::White)
    };

    let title_style = if task.status.is_completed() {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };

    ListItem::new(Line::from(vec![
        Span::styled(format!("{} ", icon), Style::default().fg(icon_color)),
        Span::styled(task.title.clone(), title_style),
        Span::styled(
            format!("  due {}", task.due_date.format("%Y-%m-%d")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("  [{}]", task.priority),
            Style::default().fg(priority_color(task.priority)),
        ),
    ]))
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(app.status.clone(), Style::default().fg(Color::White)),
        Span::styled(
            "  Tab: Panes | Space: Toggle | n: Goal | a: Task | d/D: Delete | r: Refresh | q: Quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_popup(f: &mut Frame, app: &App) {
    if app.popup_mode == PopupMode::None {
        return;
    }

    let (title, content) = match &app.popup_mode {
        PopupMode::NewGoal => (
            "New Goal",
            format!(
                "Enter goal title:\n\n{}\n\nPress ENTER to save\nPress ESC to cancel",
                app.input_buffer
            ),
        ),
        PopupMode::NewTask => (
            "New Task",
            format!(
                "Enter task title:\n\n{}\n\nPress ENTER to save\nPress ESC to cancel",
                app.input_buffer
            ),
        ),
        PopupMode::ConfirmDeleteGoal => {
            let goal_title = app
                .selected_goal()
                .map(|g| g.title.clone())
                .unwrap_or_default();
            (
                "Delete Goal",
                format!(
                    "Delete goal '{}' and all of its tasks?\n\nPress y to confirm\nPress n or ESC to cancel",
                    goal_title
                ),
            )
        }
        PopupMode::None => return,
    };

    let popup_area = centered_rect(50, 20, f.area());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray));
    let content = Paragraph::new(content)
        .block(block)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White));

    f.render_widget(Clear, popup_area);
    f.render_widget(content, popup_area);
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::StoreError;
    use crate::models::{percent_complete, TaskStatus};
    use chrono::Utc;

    fn app_with_tasks(statuses: &[TaskStatus]) -> App {
        let mut db = Database::open_in_memory().unwrap();
        let goal = db.create_goal("ship it", "").unwrap();
        let tasks: Vec<Task> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut task = Task::new(&format!("step {}", i), Utc::now(), Priority::Medium);
                task.status = *status;
                task
            })
            .collect();
        db.update_goal_tasks(&goal.id, &tasks, percent_complete(&tasks))
            .unwrap();

        let mut app = App::new(db).unwrap();
        app.focus = Pane::Tasks;
        app
    }

    #[test]
    fn selection_starts_on_first_goal_and_task() {
        let app = app_with_tasks(&[TaskStatus::Pending]);
        assert_eq!(app.goal_list_state.selected(), Some(0));
        assert_eq!(app.task_list_state.selected(), Some(0));
    }

    #[test]
    fn busy_task_cannot_queue_twice() {
        let mut app = app_with_tasks(&[TaskStatus::Pending]);
        assert!(app.queue_toggle().is_some());
        assert!(app.queue_toggle().is_none());
    }

    #[test]
    fn inline_toggle_updates_memory_and_store() {
        let mut app = app_with_tasks(&[TaskStatus::Pending, TaskStatus::Completed]);
        app.toggle_selected_task();

        assert!(app.in_flight.is_empty());
        assert!(app.toasts.is_empty());
        assert_eq!(app.goals[0].progress, 100);

        let stored = app.db.goal(&app.goals[0].id).unwrap().unwrap();
        assert_eq!(stored.progress, 100);
        assert!(stored.tasks[0].status.is_completed());
    }

    #[test]
    fn inline_toggle_twice_round_trips() {
        let mut app = app_with_tasks(&[TaskStatus::Pending, TaskStatus::Completed]);
        app.toggle_selected_task();
        app.toggle_selected_task();

        assert_eq!(app.goals[0].progress, 50);
        assert_eq!(app.goals[0].tasks[0].status, TaskStatus::Pending);
    }

    #[test]
    fn toggle_without_selection_is_a_noop() {
        let db = Database::open_in_memory().unwrap();
        let mut app = App::new(db).unwrap();
        app.focus = Pane::Tasks;

        app.toggle_selected_task();
        assert!(app.in_flight.is_empty());
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn failed_toggle_raises_an_error_toast() {
        let mut app = app_with_tasks(&[TaskStatus::Pending]);
        app.in_flight.insert("t1".to_string());

        app.handle_app_event(AppEvent::TaskToggled {
            task_id: "t1".to_string(),
            result: Err(StoreError::GoalNotFound("g1".to_string())),
        });

        assert!(app.in_flight.is_empty());
        assert_eq!(app.toasts.len(), 1);
        let toast = app.toasts.latest().unwrap();
        assert_eq!(toast.title, "Error");
        assert_eq!(toast.variant, ToastVariant::Error);

        // The goal list keeps its last committed state.
        assert_eq!(app.goals[0].progress, 0);
    }

    #[test]
    fn successful_toggle_event_swaps_in_the_updated_goal() {
        let mut app = app_with_tasks(&[TaskStatus::Pending]);
        let mut updated = app.goals[0].clone();
        updated.tasks[0].status = TaskStatus::Completed;
        updated.progress = 100;
        let task_id = updated.tasks[0].id.clone();
        app.in_flight.insert(task_id.clone());

        app.handle_app_event(AppEvent::TaskToggled {
            task_id,
            result: Ok(updated),
        });

        assert!(app.in_flight.is_empty());
        assert!(app.toasts.is_empty());
        assert_eq!(app.goals[0].progress, 100);
    }

    #[test]
    fn deleting_busy_task_is_blocked() {
        let mut app = app_with_tasks(&[TaskStatus::Pending]);
        let task_id = app.goals[0].tasks[0].id.clone();
        app.in_flight.insert(task_id);

        app.delete_selected_task();

        assert_eq!(app.goals[0].tasks.len(), 1);
        assert_eq!(app.toasts.latest().unwrap().variant, ToastVariant::Info);
    }

    #[test]
    fn deleting_last_task_clears_task_selection() {
        let mut app = app_with_tasks(&[TaskStatus::Completed]);
        app.delete_selected_task();

        assert!(app.goals[0].tasks.is_empty());
        assert_eq!(app.goals[0].progress, 0);
        assert_eq!(app.task_list_state.selected(), None);
    }

    #[test]
    fn popup_submit_creates_goal() {
        let db = Database::open_in_memory().unwrap();
        let mut app = App::new(db).unwrap();
        app.open_popup(PopupMode::NewGoal);
        for c in "write a novel".chars() {
            app.handle_popup_input(c);
        }
        app.submit_popup();

        assert_eq!(app.popup_mode, PopupMode::None);
        assert_eq!(app.goals.len(), 1);
        assert_eq!(app.goals[0].title, "write a novel");
        assert_eq!(app.goal_list_state.selected(), Some(0));
    }

    #[test]
    fn quick_added_task_defaults_to_medium_and_a_week_out() {
        let mut app = app_with_tasks(&[]);
        app.open_popup(PopupMode::NewTask);
        for c in "first step".chars() {
            app.handle_popup_input(c);
        }
        app.submit_popup();

        let task = &app.goals[0].tasks[0];
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Pending);
        let days_out = (task.due_date - Utc::now()).num_days();
        assert!((6..=7).contains(&days_out));
        assert_eq!(app.goals[0].progress, 0);
        assert_eq!(app.task_list_state.selected(), Some(0));
    }

    #[test]
    fn confirm_popup_y_deletes_the_goal() {
        let mut app = app_with_tasks(&[TaskStatus::Pending]);
        app.open_popup(PopupMode::ConfirmDeleteGoal);
        app.handle_popup_input('y');

        assert!(app.goals.is_empty());
        assert_eq!(app.popup_mode, PopupMode::None);
        assert_eq!(app.goal_list_state.selected(), None);
    }

    #[test]
    fn confirm_popup_n_keeps_the_goal() {
        let mut app = app_with_tasks(&[TaskStatus::Pending]);
        app.open_popup(PopupMode::ConfirmDeleteGoal);
        app.handle_popup_input('n');

        assert_eq!(app.goals.len(), 1);
        assert_eq!(app.popup_mode, PopupMode::None);
    }

    #[test]
    fn navigation_wraps_in_both_directions() {
        let mut app = app_with_tasks(&[
            TaskStatus::Pending,
            TaskStatus::Pending,
            TaskStatus::Pending,
        ]);

        app.next_item();
        app.next_item();
        assert_eq!(app.task_list_state.selected(), Some(2));
        app.next_item();
        assert_eq!(app.task_list_state.selected(), Some(0));
        app.previous_item();
        assert_eq!(app.task_list_state.selected(), Some(2));
    }
}
