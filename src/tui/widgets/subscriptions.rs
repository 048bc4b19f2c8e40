//! Subscription manager widget - channel list plus the inline add prompt

use crate::app::state::AppState;
use crate::tui::theme::get_theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    if state.subscription_list.adding {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);
        render_add_prompt(frame, state, rows[0]);
        render_list(frame, state, rows[1]);
    } else {
        render_list(frame, state, area);
    }
}

/// Render the channel-ID input box shown while adding
fn render_add_prompt(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.accent))
        .title(format!(" {} Channel ID ", theme.icons.edit))
        .title_style(Style::default().fg(theme.palette.accent));

    let prompt = if state.subscription_list.saving {
        state.subscription_list.input.clone()
    } else {
        format!("{}▏", state.subscription_list.input)
    };

    let p = Paragraph::new(Line::from(prompt))
        .style(Style::default().fg(theme.palette.fg_primary))
        .block(block);
    frame.render_widget(p, area);
}

fn render_list(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let list_state = &state.subscription_list;

    if list_state.loading {
        let loading = Paragraph::new(Line::from("Loading subscriptions..."))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(loading, area);
        return;
    }

    if list_state.subscriptions.is_empty() {
        let empty = Paragraph::new(Line::from("No subscriptions. Press a to add a channel by ID."))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(empty, area);
        return;
    }

    let visible_height = area.height as usize;
    let scroll_offset = list_state.scroll_offset;
    let items: Vec<ListItem> = list_state
        .subscriptions
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, sub)| {
            let is_selected = i == list_state.selected;
            let title_style = if is_selected {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_primary)
            };
            let meta = format!(
                "  {} subscribers {} {} videos",
                format_count(sub.subscriber_count),
                theme.icons.bullet,
                format_count(sub.video_count)
            );

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", theme.icons.channel),
                    Style::default().fg(theme.palette.fg_secondary),
                ),
                Span::styled(sub.title.clone(), title_style),
                Span::styled(meta, Style::default().fg(theme.palette.fg_secondary)),
            ]))
        })
        .collect();

    let adjusted_selected = list_state.selected.saturating_sub(scroll_offset);
    let mut ratatui_list_state = ListState::default();
    ratatui_list_state.select(Some(adjusted_selected));

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(theme.palette.bg_primary)
                .bg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("\u{f054} "); // nf-fa-chevron_right

    frame.render_stateful_widget(list, area, &mut ratatui_list_state);
}

/// Compact count for list rows: 950, 12.3K, 4.5M.
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
