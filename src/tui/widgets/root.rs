//! Root layout widget - orchestrates main layout structure

use crate::app::state::{AppState, Screen};
use crate::tui::theme::get_theme;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use super::{help, status_bar, subscriptions, video_list};

/// Main layout structure:
/// ┌─────────────────────────────────────────┐
/// │           Main Content                  │
/// │      (Videos/Subscriptions/Help)        │
/// │                                         │
/// ├─────────────────────────────────────────┤
/// │      Status bar + toasts + hints        │
/// └─────────────────────────────────────────┘
pub fn render(frame: &mut Frame, state: &mut AppState) {
    let root = frame.area();

    // Main vertical layout: content | status bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // Main content area
            Constraint::Length(3), // Status bar
        ])
        .split(root);

    render_main_content(frame, state, rows[0]);
    status_bar::render(frame, state, rows[1]);
}

/// Render the main content area based on current screen
fn render_main_content(frame: &mut Frame, state: &mut AppState, area: ratatui::layout::Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    // Get title with icon for current screen
    let title = match state.screen {
        Screen::Videos => format!(" {} Latest Videos ", icons.videos),
        Screen::Subscriptions => format!(" {} Subscriptions ", icons.channels),
        Screen::Help => format!(" {} Keybinds ", icons.help),
    };

    let main = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(title)
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = main.inner(area);
    frame.render_widget(main, area);

    match state.screen {
        Screen::Videos => {
            video_list::render(frame, state, inner);
        }
        Screen::Subscriptions => {
            subscriptions::render(frame, state, inner);
        }
        Screen::Help => {
            help::render(frame, state, inner);
        }
    }
}
