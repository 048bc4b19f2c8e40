//! Bottom status bar - toasts, status text and key hints

use crate::app::state::{AppState, Screen, ToastKind};
use crate::tui::theme::get_theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // A live toast takes the whole row; otherwise status text left,
    // key hints right.
    if let Some(toast) = &state.toast {
        let (icon, color) = match toast.kind {
            ToastKind::Success => (theme.icons.success, theme.palette.success),
            ToastKind::Error => (theme.icons.error, theme.palette.error),
        };
        let line = Line::from(vec![
            Span::styled(
                format!("{icon} "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(toast.message.clone(), Style::default().fg(color)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
        return;
    }

    let status = Paragraph::new(Line::from(Span::styled(
        state.status.clone(),
        Style::default().fg(theme.palette.fg_secondary),
    )));
    frame.render_widget(status, inner);

    let hints = key_hints(state.screen);
    let hints_len = hints.len() as u16;
    if inner.width > hints_len {
        let hint_area = Rect::new(
            inner.x + inner.width - hints_len,
            inner.y,
            hints_len,
            1,
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                hints,
                Style::default().fg(theme.palette.fg_secondary),
            ))),
            hint_area,
        );
    }
}

fn key_hints(screen: Screen) -> &'static str {
    match screen {
        Screen::Videos => "enter play  r refresh  f refetch  s subs  ? help  q quit",
        Screen::Subscriptions => "a add  d remove  b back  r reload  q quit",
        Screen::Help => "esc back  q quit",
    }
}
