//! Help screen showing keybindings

use crate::app::state::AppState;
use crate::tui::theme::get_theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

/// Render the help screen
pub fn render(frame: &mut Frame, _state: &AppState, area: Rect) {
    let theme = get_theme();

    // Split into columns
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // Left column - Navigation & Videos
    let left_content = vec![
        section_header("Navigation", &theme),
        keybind("j / Down", "Move down", &theme),
        keybind("k / Up", "Move up", &theme),
        keybind("g", "Go to top", &theme),
        keybind("G", "Go to bottom", &theme),
        keybind("Ctrl+d", "Page down", &theme),
        keybind("Ctrl+u", "Page up", &theme),
        keybind("Tab", "Next screen", &theme),
        keybind("Shift+Tab", "Previous screen", &theme),
        Line::default(),
        section_header("Videos", &theme),
        keybind("Enter", "Play selected video in mpv", &theme),
        keybind("r / F5", "Refresh (cache-aware)", &theme),
        keybind("f", "Force refresh (drop cache)", &theme),
        keybind("s", "Open subscriptions", &theme),
    ];

    let left_para = Paragraph::new(left_content).wrap(Wrap { trim: false });
    frame.render_widget(left_para, cols[0]);

    // Right column - Subscriptions & General
    let right_content = vec![
        section_header("Subscriptions", &theme),
        keybind("a", "Add channel by ID", &theme),
        keybind("d / Del", "Remove selected channel", &theme),
        keybind("Enter", "Confirm add", &theme),
        keybind("Esc", "Cancel add / back to videos", &theme),
        keybind("b", "Back to videos", &theme),
        keybind("r / F5", "Reload channel details", &theme),
        Line::default(),
        section_header("General", &theme),
        keybind("? / F1", "This screen", &theme),
        keybind("q", "Quit", &theme),
    ];

    let right_para = Paragraph::new(right_content).wrap(Wrap { trim: false });
    frame.render_widget(right_para, cols[1]);
}

fn section_header(title: &str, theme: &crate::tui::theme::Theme) -> Line<'static> {
    Line::from(vec![Span::styled(
        format!("━━ {} ━━", title),
        Style::default()
            .fg(theme.palette.accent)
            .add_modifier(Modifier::BOLD),
    )])
}

fn keybind(key: &str, desc: &str, theme: &crate::tui::theme::Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled("  ", Style::default()),
        Span::styled(
            format!("{:12}", key),
            Style::default()
                .fg(theme.palette.accent_alt)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc.to_string(), Style::default().fg(theme.palette.fg_primary)),
    ])
}
