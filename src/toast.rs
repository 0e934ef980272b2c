//! Transient corner notifications for the TUI.
//!
//! Toasts are append-only while alive: the UI never mutates one in place,
//! it only pushes new entries and lets `tick` expire old ones. Rendering
//! walks the queue in insertion order, so the newest toast sits closest to
//! the bottom-right corner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

const DEFAULT_DURATION_MS: u64 = 4000;
const MAX_VISIBLE: usize = 3;
const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastVariant {
    fn color(self) -> Color {
        match self {
            ToastVariant::Success => Color::Green,
            ToastVariant::Error => Color::Red,
            ToastVariant::Warning => Color::Yellow,
            ToastVariant::Info => Color::Cyan,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
    created_at: Instant,
    duration: Duration,
}

impl Toast {
    fn new(title: &str, description: &str, variant: ToastVariant) -> Self {
        Toast {
            title: title.to_string(),
            description: description.to_string(),
            variant,
            created_at: Instant::now(),
            duration: Duration::from_millis(DEFAULT_DURATION_MS),
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

#[derive(Debug, Default)]
pub struct Toasts {
    toasts: VecDeque<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Toasts {
            toasts: VecDeque::new(),
        }
    }

    pub fn push(&mut self, title: &str, description: &str, variant: ToastVariant) {
        self.toasts.push_back(Toast::new(title, description, variant));
        while self.toasts.len() > MAX_VISIBLE {
            self.toasts.pop_front();
        }
    }

    pub fn success(&mut self, title: &str, description: &str) {
        self.push(title, description, ToastVariant::Success);
    }

    pub fn error(&mut self, title: &str, description: &str) {
        self.push(title, description, ToastVariant::Error);
    }

    /// Drops expired toasts. Called once per draw loop iteration.
    pub fn tick(&mut self) {
        self.toasts.retain(|toast| !toast.is_expired());
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        if self.toasts.is_empty() {
            return;
        }

        let width = TOAST_WIDTH.min(area.width.saturating_sub(2));
        for (idx, toast) in self.toasts.iter().rev().enumerate() {
            let offset = (idx as u16 + 1) * TOAST_HEIGHT + idx as u16;
            if offset + 1 > area.height {
                break;
            }

            let rect = Rect {
                x: area.right().saturating_sub(width + 1),
                y: area.bottom().saturating_sub(offset + 1),
                width,
                height: TOAST_HEIGHT,
            };

            let color = toast.variant.color();
            let body = Paragraph::new(vec![
                Line::from(Span::styled(
                    toast.title.clone(),
                    Style::default().fg(color),
                )),
                Line::from(Span::raw(toast.description.clone())),
            ])
            .alignment(Alignment::Left)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );

            f.render_widget(Clear, rect);
            f.render_widget(body, rect);
        }
    }
}
