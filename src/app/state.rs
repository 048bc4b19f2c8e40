use crate::youtube::models::{Subscription, Video};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Videos,
    Subscriptions,
    Help,
}

impl Screen {
    pub fn next(self) -> Self {
        match self {
            Screen::Videos => Screen::Subscriptions,
            Screen::Subscriptions => Screen::Help,
            Screen::Help => Screen::Videos,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Screen::Videos => Screen::Help,
            Screen::Subscriptions => Screen::Videos,
            Screen::Help => Screen::Subscriptions,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Videos => "Videos",
            Screen::Subscriptions => "Subscriptions",
            Screen::Help => "Help",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > std::time::Duration::from_secs(3)
    }
}

/// Video feed list with its own selection and scroll position.
#[derive(Debug, Clone, Default)]
pub struct VideoListState {
    pub videos: Vec<Video>,
    pub watched: HashSet<String>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub loading: bool,
}

impl VideoListState {
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if !self.videos.is_empty() {
            self.selected = (self.selected + 1).min(self.videos.len().saturating_sub(1));
        }
    }

    pub fn selected_video(&self) -> Option<&Video> {
        self.videos.get(self.selected)
    }

    pub fn set_videos(&mut self, videos: Vec<Video>, watched: HashSet<String>) {
        self.videos = videos;
        self.watched = watched;
        self.selected = self.selected.min(self.videos.len().saturating_sub(1));
        self.loading = false;
    }

    pub fn is_watched(&self, video: &Video) -> bool {
        self.watched.contains(&video.id)
    }

    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }
}

/// Subscription list plus the inline add prompt.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionListState {
    pub subscriptions: Vec<Subscription>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub loading: bool,
    pub loaded: bool,
    /// Add prompt open, keystrokes go to `input`.
    pub adding: bool,
    pub input: String,
    /// An add or remove is in flight.
    pub saving: bool,
}

impl SubscriptionListState {
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if !self.subscriptions.is_empty() {
            self.selected = (self.selected + 1).min(self.subscriptions.len().saturating_sub(1));
        }
    }

    pub fn selected_subscription(&self) -> Option<&Subscription> {
        self.subscriptions.get(self.selected)
    }

    pub fn set_subscriptions(&mut self, subscriptions: Vec<Subscription>) {
        self.subscriptions = subscriptions;
        self.selected = self
            .selected
            .min(self.subscriptions.len().saturating_sub(1));
        self.loaded = true;
        self.loading = false;
    }

    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }
}

pub struct AppState {
    pub should_quit: bool,

    pub screen: Screen,
    pub video_list: VideoListState,
    pub subscription_list: SubscriptionListState,

    // Toast notification
    pub toast: Option<Toast>,

    // Status message (for debugging/info)
    pub status: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            screen: Screen::Videos,
            video_list: VideoListState::default(),
            subscription_list: SubscriptionListState::default(),
            toast: None,
            status: String::new(),
        }
    }
}
