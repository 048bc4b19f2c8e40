pub mod actions;
pub mod events;
pub mod state;

use crate::config::{Config, ConfigStore};
use crate::feed::Aggregator;
use crate::input;
use crate::storage::StorageHandle;
use crate::tui::{self, TuiTerminal};
use crate::youtube::api::{Client, YouTubeApi};
use actions::Action;
use events::{Event, FeedCommand, NetworkEvent};
use state::{AppState, Screen, Toast};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::mpsc;

pub struct App {
    cfg: Config,
    config_path: Option<PathBuf>,
    state: AppState,
}

impl App {
    pub fn new(cfg: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            cfg,
            config_path,
            state: AppState::new(),
        }
    }

    pub async fn run(&mut self, terminal: &mut TuiTerminal) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);
        let (commands, command_rx) = mpsc::channel::<FeedCommand>(32);

        let api = Client::new(&self.cfg.api.key);
        let store = ConfigStore::new(self.config_path.as_deref());
        let watched = StorageHandle::new(self.cfg.database_path());
        let feed = Aggregator::new(&self.cfg, api, Box::new(store), watched);
        spawn_feed_task(feed, command_rx, tx.clone());

        input::spawn_input_task(tx.clone());
        // No ticker; we re-render on input and network events.

        // First draw
        tui::draw(terminal, &mut self.state)?;

        // Load the feed right away.
        self.handle_action(Action::Refresh, &commands).await;

        while let Some(ev) = rx.recv().await {
            match ev {
                Event::Input(input_ev) => {
                    if let Some(action) = input::map_input_to_action(&self.state, input_ev) {
                        self.handle_action(action, &commands).await;
                    }
                }
                Event::Network(ne) => {
                    self.handle_network(ne, &commands).await;
                }
            }

            if self.state.should_quit {
                break;
            }

            tui::draw(terminal, &mut self.state)?;
        }

        Ok(())
    }

    async fn on_screen_enter(&mut self, commands: &mpsc::Sender<FeedCommand>) {
        if self.state.screen == Screen::Subscriptions && !self.state.subscription_list.loaded {
            self.request_subscriptions(commands).await;
        }
    }

    async fn handle_action(&mut self, action: Action, commands: &mpsc::Sender<FeedCommand>) {
        match action {
            Action::SetScreen(screen) => {
                self.reduce(Action::SetScreen(screen));
                self.on_screen_enter(commands).await;
            }
            Action::NextScreen => {
                self.reduce(Action::NextScreen);
                self.on_screen_enter(commands).await;
            }
            Action::PrevScreen => {
                self.reduce(Action::PrevScreen);
                self.on_screen_enter(commands).await;
            }
            Action::Refresh => match self.state.screen {
                Screen::Videos => self.request_videos(false, commands).await,
                Screen::Subscriptions => self.request_subscriptions(commands).await,
                Screen::Help => {}
            },
            Action::ForceRefresh => {
                if self.state.screen == Screen::Videos {
                    self.request_videos(true, commands).await;
                }
            }
            Action::Activate => {
                if self.state.screen == Screen::Videos {
                    let video = self.state.video_list.selected_video().cloned();
                    if let Some(video) = video {
                        self.state.status = format!("Playing: {}", video.title);
                        let _ = commands
                            .send(FeedCommand::Play {
                                video_id: video.id,
                                mark_watched: self.cfg.player.mark_as_watched,
                            })
                            .await;
                    }
                }
            }
            Action::SubmitAdd => {
                let input = self.state.subscription_list.input.trim().to_string();
                if input.is_empty() {
                    self.state.toast = Some(Toast::error("Enter a channel ID"));
                    return;
                }
                if self.state.subscription_list.saving {
                    return;
                }
                self.state.subscription_list.saving = true;
                self.state.status = format!("Adding {input}...");
                let _ = commands
                    .send(FeedCommand::AddSubscription { channel_id: input })
                    .await;
            }
            Action::RemoveSelected => {
                if self.state.subscription_list.saving {
                    return;
                }
                let selected = self.state.subscription_list.selected_subscription().cloned();
                if let Some(sub) = selected {
                    self.state.status = format!("Removing {}...", sub.title);
                    self.state.subscription_list.saving = true;
                    let _ = commands
                        .send(FeedCommand::RemoveSubscription { channel_id: sub.id })
                        .await;
                }
            }
            _ => self.reduce(action),
        }
    }

    fn reduce(&mut self, action: Action) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::NextScreen => self.state.screen = self.state.screen.next(),
            Action::PrevScreen => self.state.screen = self.state.screen.prev(),
            Action::SetScreen(screen) => self.state.screen = screen,
            Action::ListUp => match self.state.screen {
                Screen::Videos => {
                    self.state.video_list.select_prev();
                    self.state.video_list.update_scroll(20);
                }
                Screen::Subscriptions => {
                    self.state.subscription_list.select_prev();
                    self.state.subscription_list.update_scroll(20);
                }
                Screen::Help => {}
            },
            Action::ListDown => match self.state.screen {
                Screen::Videos => {
                    self.state.video_list.select_next();
                    self.state.video_list.update_scroll(20);
                }
                Screen::Subscriptions => {
                    self.state.subscription_list.select_next();
                    self.state.subscription_list.update_scroll(20);
                }
                Screen::Help => {}
            },
            Action::GoTop => match self.state.screen {
                Screen::Videos => {
                    self.state.video_list.selected = 0;
                    self.state.video_list.scroll_offset = 0;
                }
                Screen::Subscriptions => {
                    self.state.subscription_list.selected = 0;
                    self.state.subscription_list.scroll_offset = 0;
                }
                Screen::Help => {}
            },
            Action::GoBottom => match self.state.screen {
                Screen::Videos => {
                    let list = &mut self.state.video_list;
                    list.selected = list.videos.len().saturating_sub(1);
                    list.update_scroll(20);
                }
                Screen::Subscriptions => {
                    let list = &mut self.state.subscription_list;
                    list.selected = list.subscriptions.len().saturating_sub(1);
                    list.update_scroll(20);
                }
                Screen::Help => {}
            },
            Action::PageUp => match self.state.screen {
                Screen::Videos => {
                    let list = &mut self.state.video_list;
                    list.selected = list.selected.saturating_sub(10);
                    list.update_scroll(20);
                }
                Screen::Subscriptions => {
                    let list = &mut self.state.subscription_list;
                    list.selected = list.selected.saturating_sub(10);
                    list.update_scroll(20);
                }
                Screen::Help => {}
            },
            Action::PageDown => match self.state.screen {
                Screen::Videos => {
                    let list = &mut self.state.video_list;
                    list.selected = (list.selected + 10).min(list.videos.len().saturating_sub(1));
                    list.update_scroll(20);
                }
                Screen::Subscriptions => {
                    let list = &mut self.state.subscription_list;
                    list.selected =
                        (list.selected + 10).min(list.subscriptions.len().saturating_sub(1));
                    list.update_scroll(20);
                }
                Screen::Help => {}
            },
            Action::StartAdd => {
                self.state.subscription_list.adding = true;
                self.state.subscription_list.input.clear();
            }
            Action::CancelAdd => {
                self.state.subscription_list.adding = false;
                self.state.subscription_list.input.clear();
            }
            Action::InputChar(c) => self.state.subscription_list.input.push(c),
            Action::Backspace => {
                self.state.subscription_list.input.pop();
            }
            Action::Resize => {
                // Resize is handled by terminal
            }
            // Handled in handle_action.
            Action::Activate
            | Action::Refresh
            | Action::ForceRefresh
            | Action::SubmitAdd
            | Action::RemoveSelected => {}
        }
    }

    async fn handle_network(&mut self, ne: NetworkEvent, commands: &mpsc::Sender<FeedCommand>) {
        match ne {
            NetworkEvent::Error(e) => {
                // Reset loading state everywhere
                self.state.video_list.loading = false;
                self.state.subscription_list.loading = false;
                self.state.subscription_list.saving = false;
                self.state.toast = Some(Toast::error(e.clone()));
                self.state.status = format!("Error: {e} (press r to retry)");
            }
            NetworkEvent::Videos { videos, watched } => {
                self.state.video_list.set_videos(videos, watched);
                if self.state.video_list.videos.is_empty() {
                    self.state.status = "No videos. Press s to manage subscriptions.".into();
                } else {
                    self.state.status = format!("{} videos", self.state.video_list.videos.len());
                }
            }
            NetworkEvent::Subscriptions { subscriptions } => {
                self.state.subscription_list.set_subscriptions(subscriptions);
                self.state.status = format!(
                    "{} subscriptions",
                    self.state.subscription_list.subscriptions.len()
                );
            }
            NetworkEvent::SubscriptionAdded { channel_id } => {
                self.state.subscription_list.saving = false;
                self.state.subscription_list.adding = false;
                self.state.subscription_list.input.clear();
                self.state.subscription_list.loaded = false;
                self.state.toast = Some(Toast::success(format!("Subscribed to {channel_id}")));
                self.request_subscriptions(commands).await;
            }
            NetworkEvent::SubscriptionRemoved { channel_id } => {
                self.state.subscription_list.saving = false;
                self.state.subscription_list.loaded = false;
                self.state.toast = Some(Toast::success(format!("Unsubscribed from {channel_id}")));
                if self.state.subscription_list.subscriptions.len() <= 1 {
                    // Nothing left to look up.
                    self.state.subscription_list.set_subscriptions(Vec::new());
                } else {
                    self.request_subscriptions(commands).await;
                }
            }
            NetworkEvent::PlaybackStarted { video_id } => {
                self.state.video_list.watched.insert(video_id);
                self.state.status = "Playback started".into();
            }
        }
    }

    async fn request_videos(&mut self, force: bool, commands: &mpsc::Sender<FeedCommand>) {
        if self.state.video_list.loading {
            return;
        }
        self.state.video_list.loading = true;
        self.state.status = if force {
            "Refreshing feed...".into()
        } else {
            "Loading videos...".into()
        };
        let _ = commands.send(FeedCommand::LoadVideos { force }).await;
    }

    async fn request_subscriptions(&mut self, commands: &mpsc::Sender<FeedCommand>) {
        if self.state.subscription_list.loading {
            return;
        }
        self.state.subscription_list.loading = true;
        self.state.status = "Loading subscriptions...".into();
        let _ = commands.send(FeedCommand::LoadSubscriptions).await;
    }
}

/// Run the aggregator on its own task. With a single consumer draining
/// the command channel, cache reads and writes never interleave.
fn spawn_feed_task<A: YouTubeApi + 'static>(
    mut feed: Aggregator<A>,
    mut commands: mpsc::Receiver<FeedCommand>,
    tx: mpsc::Sender<Event>,
) {
    tokio::spawn(async move {
        while let Some(cmd) = commands.recv().await {
            let event = run_command(&mut feed, cmd).await;
            if tx.send(Event::Network(event)).await.is_err() {
                break;
            }
        }
    });
}

async fn run_command<A: YouTubeApi>(feed: &mut Aggregator<A>, cmd: FeedCommand) -> NetworkEvent {
    match cmd {
        FeedCommand::LoadVideos { force } => {
            if force {
                feed.clear_video_cache();
            }
            let videos = match feed.latest_videos().await {
                Ok(videos) => videos,
                Err(err) => return NetworkEvent::Error(err.to_string()),
            };
            // The feed is still useful when watched history is unreadable.
            let watched = match feed.watched_ids().await {
                Ok(watched) => watched,
                Err(err) => {
                    tracing::warn!("loading watched history failed: {err}");
                    HashSet::new()
                }
            };
            NetworkEvent::Videos { videos, watched }
        }
        FeedCommand::LoadSubscriptions => match feed.subscription_info().await {
            Ok(subscriptions) => NetworkEvent::Subscriptions { subscriptions },
            Err(err) => NetworkEvent::Error(err.to_string()),
        },
        FeedCommand::AddSubscription { channel_id } => {
            match feed.add_subscription(&channel_id).await {
                Ok(()) => NetworkEvent::SubscriptionAdded { channel_id },
                Err(err) => NetworkEvent::Error(err.to_string()),
            }
        }
        FeedCommand::RemoveSubscription { channel_id } => {
            match feed.remove_subscription(&channel_id) {
                Ok(()) => NetworkEvent::SubscriptionRemoved { channel_id },
                Err(err) => NetworkEvent::Error(err.to_string()),
            }
        }
        FeedCommand::Play {
            video_id,
            mark_watched,
        } => {
            // A video only counts as watched if the mark lands; a failed
            // mark cancels playback.
            if mark_watched
                && let Err(err) = feed.mark_watched(&video_id).await
            {
                return NetworkEvent::Error(format!("mark watched failed: {err}"));
            }
            match feed.play(&video_id) {
                Ok(()) => NetworkEvent::PlaybackStarted { video_id },
                Err(err) => NetworkEvent::Error(format!("{err:#}")),
            }
        }
    }
}
