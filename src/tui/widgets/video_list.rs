//! Aggregated feed widget - renders the video list with virtual scrolling

use crate::app::state::AppState;
use crate::tui::theme::get_theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use time::OffsetDateTime;

/// Render the video list (called within an existing block area)
pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let list_state = &state.video_list;

    if list_state.loading {
        let loading = Paragraph::new(Line::from("Loading videos..."))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(loading, area);
        return;
    }

    if list_state.videos.is_empty() {
        let empty = Paragraph::new(Line::from("No videos. Press a on the Subscriptions screen (s) to add a channel."))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(empty, area);
        return;
    }

    let visible_height = area.height as usize;
    let now = OffsetDateTime::now_utc();

    // Virtual scroll: only render visible items
    let scroll_offset = list_state.scroll_offset;
    let items: Vec<ListItem> = list_state
        .videos
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, video)| {
            let is_selected = i == list_state.selected;
            let title_style = if is_selected {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_primary)
            };

            let watched = if list_state.is_watched(video) {
                format!("{} ", theme.icons.watched)
            } else {
                "  ".to_string()
            };
            let meta = format!(
                "  {} {} {}",
                video.channel_name,
                theme.icons.bullet,
                time_ago(now, video.published_at)
            );

            ListItem::new(Line::from(vec![
                Span::styled(watched, Style::default().fg(theme.palette.fg_secondary)),
                Span::styled(video.title.clone(), title_style),
                Span::styled(meta, Style::default().fg(theme.palette.fg_secondary)),
            ]))
        })
        .collect();

    // Adjust selection index for virtual scroll offset
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

    // Show scroll position indicator in top-right corner
    if list_state.videos.len() > visible_height {
        let total = list_state.videos.len();
        let pos_text = format!("{}/{}", list_state.selected + 1, total);
        let pos_len = pos_text.len() as u16;
        let pos_x = area.x + area.width.saturating_sub(pos_len);
        if pos_x > area.x {
            frame.render_widget(
                Paragraph::new(pos_text).style(Style::default().fg(theme.palette.fg_secondary)),
                Rect::new(pos_x, area.y, pos_len, 1),
            );
        }
    }
}

/// Coarse "2h ago" style age for list rows.
fn time_ago(now: OffsetDateTime, then: OffsetDateTime) -> String {
    let elapsed = now - then;
    let minutes = elapsed.whole_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = elapsed.whole_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = elapsed.whole_days();
    if days < 7 {
        return format!("{days}d ago");
    }
    if days < 365 {
        return format!("{}w ago", days / 7);
    }
    format!("{}y ago", days / 365)
}
