use crate::youtube::models::{Subscription, Video};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Network(NetworkEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Resize,
}

/// Work order for the feed task. Commands run one at a time, in the
/// order they were sent.
#[derive(Debug, Clone)]
pub enum FeedCommand {
    LoadVideos { force: bool },
    LoadSubscriptions,
    AddSubscription { channel_id: String },
    RemoveSubscription { channel_id: String },
    Play { video_id: String, mark_watched: bool },
}

#[derive(Debug, Clone)]
pub enum NetworkEvent {
    Error(String),
    Videos {
        videos: Vec<Video>,
        watched: HashSet<String>,
    },
    Subscriptions {
        subscriptions: Vec<Subscription>,
    },
    SubscriptionAdded {
        channel_id: String,
    },
    SubscriptionRemoved {
        channel_id: String,
    },
    PlaybackStarted {
        video_id: String,
    },
}
