//! Subscription feed aggregation.
//!
//! [`Aggregator`] owns the video cache, the channel-name cache, the
//! channel-details cache and the subscription list, and talks to the
//! YouTube Data API through the [`YouTubeApi`] trait.

pub mod error;

pub use error::FeedError;

use crate::config::{Config, PlayerConfig};
use crate::player;
use crate::storage::StorageHandle;
use crate::youtube::api::{ChannelParts, MAX_IDS_PER_CALL, YouTubeApi};
use crate::youtube::models::{Subscription, Video};
use anyhow::anyhow;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Durable home for the subscription list. `Send + Sync` is required:
/// the aggregator lives on a spawned task and holds `&self` across
/// await points.
pub trait SubscriptionStore: Send + Sync {
    fn persist(&mut self, ids: &[String]) -> anyhow::Result<()>;
}

/// Feed state for one user. All caches live on the value itself, so
/// dropping the aggregator drops them.
pub struct Aggregator<A> {
    api: A,
    store: Box<dyn SubscriptionStore>,
    watched: StorageHandle,
    subscriptions: Vec<String>,
    max_per_channel: u32,
    ttl: Duration,
    player: PlayerConfig,
    channel_names: HashMap<String, String>,
    videos_by_channel: HashMap<String, Vec<Video>>,
    last_fetch: Option<Instant>,
    subscription_info: Option<Vec<Subscription>>,
}

impl<A: YouTubeApi> Aggregator<A> {
    pub fn new(
        cfg: &Config,
        api: A,
        store: Box<dyn SubscriptionStore>,
        watched: StorageHandle,
    ) -> Self {
        Self {
            api,
            store,
            watched,
            subscriptions: cfg.subscriptions.clone(),
            max_per_channel: cfg.feed.max_videos_per_channel,
            ttl: cfg.cache_ttl(),
            player: cfg.player.clone(),
            channel_names: HashMap::new(),
            videos_by_channel: HashMap::new(),
            last_fetch: None,
            subscription_info: None,
        }
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    /// Display names for the given channel IDs.
    ///
    /// Cached names are served as-is; the rest are fetched in batches of
    /// up to 50 and cached batch by batch, so names from batches that
    /// completed before a failure survive it. IDs the API does not know
    /// are left out of the result.
    pub async fn resolve_names(
        &mut self,
        ids: &[String],
    ) -> Result<HashMap<String, String>, FeedError> {
        let mut names = HashMap::new();
        let mut misses = Vec::new();
        for id in ids {
            match self.channel_names.get(id) {
                Some(name) => {
                    names.insert(id.clone(), name.clone());
                }
                None => misses.push(id.clone()),
            }
        }

        for batch in misses.chunks(MAX_IDS_PER_CALL) {
            let channels = self
                .api
                .list_channels(batch, ChannelParts::Names)
                .await
                .map_err(FeedError::Transient)?;
            for channel in channels {
                self.channel_names
                    .insert(channel.id.clone(), channel.title.clone());
                names.insert(channel.id, channel.title);
            }
        }

        Ok(names)
    }

    /// All cached uploads across the subscription list, newest first.
    ///
    /// While the cache is fresh this is a pure merge with no network
    /// traffic. A stale cache is refetched in batches of up to 50
    /// channels; the freshness timestamp only advances once every batch
    /// has succeeded, so a failed refresh is retried in full on the next
    /// call.
    pub async fn latest_videos(&mut self) -> Result<Vec<Video>, FeedError> {
        if let Some(last_fetch) = self.last_fetch {
            if last_fetch.elapsed() < self.ttl {
                return Ok(self.merged_videos());
            }
        }

        // Entries for channels no longer subscribed drop out here.
        let subscriptions = self.subscriptions.clone();
        self.videos_by_channel
            .retain(|id, _| subscriptions.contains(id));
        for batch in subscriptions.chunks(MAX_IDS_PER_CALL) {
            self.fetch_batch(batch).await?;
        }
        self.last_fetch = Some(Instant::now());

        Ok(self.merged_videos())
    }

    /// Drop all cached videos and force the next lookup to refetch.
    pub fn clear_video_cache(&mut self) {
        self.videos_by_channel.clear();
        self.last_fetch = None;
    }

    /// Refresh one batch of at most 50 channels and return its uploads.
    ///
    /// A failed metadata call abandons the batch. Channels the API does
    /// not know are skipped, as are channels whose uploads fetch fails;
    /// their previous cache entries stay in place.
    async fn fetch_batch(&mut self, ids: &[String]) -> Result<Vec<Video>, FeedError> {
        let channels = self
            .api
            .list_channels(ids, ChannelParts::Feeds)
            .await
            .map_err(FeedError::Transient)?;
        let feeds: HashMap<String, String> = channels
            .into_iter()
            .filter(|c| !c.uploads_feed_id.is_empty())
            .map(|c| (c.id, c.uploads_feed_id))
            .collect();

        let mut batch_videos = Vec::new();
        for channel_id in ids {
            let Some(feed_id) = feeds.get(channel_id) else {
                continue;
            };
            let items = match self.api.list_feed_items(feed_id, self.max_per_channel).await {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!("fetching uploads for channel {channel_id} failed, skipping: {err}");
                    continue;
                }
            };

            // Until the name resolves, the raw channel ID stands in for it.
            let (channel_name, name_resolved) = match self.channel_names.get(channel_id) {
                Some(name) => (name.clone(), true),
                None => (channel_id.clone(), false),
            };
            let channel_videos: Vec<Video> = items
                .into_iter()
                .map(|item| Video {
                    id: item.video_id,
                    title: item.title,
                    channel_name: channel_name.clone(),
                    name_resolved,
                    published_at: item.published_at,
                    thumbnail_url: item.thumbnail_url,
                })
                .collect();
            self.videos_by_channel
                .insert(channel_id.clone(), channel_videos.clone());
            batch_videos.extend(channel_videos);
        }

        self.backfill_names(&mut batch_videos).await;
        Ok(batch_videos)
    }

    /// Swap raw channel IDs for display names, in the given videos and in
    /// the cache behind them. A failed lookup leaves the IDs in place.
    async fn backfill_names(&mut self, videos: &mut [Video]) {
        let mut pending: Vec<String> = Vec::new();
        for video in videos.iter() {
            if !video.name_resolved && !pending.contains(&video.channel_name) {
                pending.push(video.channel_name.clone());
            }
        }
        if pending.is_empty() {
            return;
        }

        let names = match self.resolve_names(&pending).await {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!("channel name lookup failed, keeping IDs: {err}");
                return;
            }
        };

        for video in videos.iter_mut() {
            if video.name_resolved {
                continue;
            }
            if let Some(name) = names.get(&video.channel_name) {
                video.channel_name = name.clone();
                video.name_resolved = true;
            }
        }
        for (channel_id, channel_videos) in &mut self.videos_by_channel {
            let Some(name) = names.get(channel_id) else {
                continue;
            };
            for video in channel_videos {
                if !video.name_resolved {
                    video.channel_name = name.clone();
                    video.name_resolved = true;
                }
            }
        }
    }

    fn merged_videos(&self) -> Vec<Video> {
        let mut merged: Vec<Video> = Vec::new();
        for channel_id in &self.subscriptions {
            if let Some(videos) = self.videos_by_channel.get(channel_id) {
                merged.extend(videos.iter().cloned());
            }
        }
        // Leftover entries for unsubscribed channels tail on in a fixed
        // order so the merge stays deterministic.
        let mut orphans: Vec<&String> = self
            .videos_by_channel
            .keys()
            .filter(|id| !self.subscriptions.contains(*id))
            .collect();
        orphans.sort();
        for channel_id in orphans {
            if let Some(videos) = self.videos_by_channel.get(channel_id) {
                merged.extend(videos.iter().cloned());
            }
        }

        // Stable sort: uploads sharing an instant keep the merge order.
        merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        merged
    }

    /// Subscribe to a channel. The channel must exist upstream and must
    /// not already be subscribed. The new list is persisted before
    /// returning; a persistence failure is reported but the in-memory
    /// list keeps the addition.
    pub async fn add_subscription(&mut self, channel_id: &str) -> Result<(), FeedError> {
        let channel_id = channel_id.trim();
        if channel_id.is_empty() {
            return Err(FeedError::validation("channel ID must not be empty"));
        }

        let id = channel_id.to_string();
        let channels = self
            .api
            .list_channels(std::slice::from_ref(&id), ChannelParts::Names)
            .await
            .map_err(FeedError::Transient)?;
        if channels.is_empty() {
            return Err(FeedError::validation(format!(
                "channel {channel_id} not found"
            )));
        }
        if self.subscriptions.iter().any(|s| s == channel_id) {
            return Err(FeedError::validation(format!(
                "already subscribed to {channel_id}"
            )));
        }

        self.subscriptions.push(id);
        self.subscription_info = None;
        self.store
            .persist(&self.subscriptions)
            .map_err(FeedError::Persistence)?;
        Ok(())
    }

    /// Unsubscribe from a channel.
    pub fn remove_subscription(&mut self, channel_id: &str) -> Result<(), FeedError> {
        let Some(index) = self.subscriptions.iter().position(|s| s == channel_id) else {
            return Err(FeedError::not_found(format!(
                "channel {channel_id} is not in the subscription list"
            )));
        };
        self.subscriptions.remove(index);
        self.subscription_info = None;
        self.store
            .persist(&self.subscriptions)
            .map_err(FeedError::Persistence)?;
        Ok(())
    }

    /// Channel details for every subscription, sorted by title.
    ///
    /// Cached until a subscription change invalidates it; age alone never
    /// does. The rebuild walks the list one channel at a time and any
    /// failed lookup abandons it, though channels the API does not know
    /// are merely skipped.
    pub async fn subscription_info(&mut self) -> Result<Vec<Subscription>, FeedError> {
        if let Some(info) = &self.subscription_info {
            return Ok(info.clone());
        }
        if self.subscriptions.is_empty() {
            return Err(FeedError::validation("no subscriptions configured"));
        }

        let ids = self.subscriptions.clone();
        let mut info = Vec::with_capacity(ids.len());
        for channel_id in &ids {
            let channels = self
                .api
                .list_channels(std::slice::from_ref(channel_id), ChannelParts::Details)
                .await
                .map_err(FeedError::Transient)?;
            let Some(channel) = channels.into_iter().next() else {
                continue;
            };
            self.channel_names
                .insert(channel_id.clone(), channel.title.clone());
            info.push(Subscription {
                id: channel_id.clone(),
                title: channel.title,
                description: channel.description,
                subscriber_count: channel.subscriber_count,
                video_count: channel.video_count,
                thumbnail_url: channel.thumbnail_url,
            });
        }

        info.sort_by_key(|s| s.title.to_lowercase());
        self.subscription_info = Some(info.clone());
        Ok(info)
    }

    pub async fn watched_ids(&self) -> Result<HashSet<String>, FeedError> {
        let storage = self.watched.clone();
        run_blocking(move || storage.watched_ids()).await
    }

    pub async fn is_watched(&self, video_id: &str) -> Result<bool, FeedError> {
        let storage = self.watched.clone();
        let video_id = video_id.to_string();
        run_blocking(move || storage.is_watched(&video_id)).await
    }

    /// Record a video as watched. There is no way back to unwatched.
    pub async fn mark_watched(&self, video_id: &str) -> Result<(), FeedError> {
        let storage = self.watched.clone();
        let video_id = video_id.to_string();
        run_blocking(move || storage.mark_watched(&video_id)).await
    }

    /// Hand a video to mpv and return without waiting on it.
    pub fn play(&self, video_id: &str) -> anyhow::Result<()> {
        player::play(video_id, &self.player)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, FeedError>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(FeedError::Persistence),
        Err(err) => Err(FeedError::persistence(anyhow!("storage task failed: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::api::{ApiChannel, ApiFeedItem};
    use anyhow::bail;
    use std::sync::{Arc, Mutex};
    use time::OffsetDateTime;
    use time::macros::datetime;

    #[derive(Clone)]
    struct FakeChannel {
        title: String,
        uploads_feed_id: String,
        subscriber_count: u64,
        video_count: u64,
    }

    #[derive(Default)]
    struct FakeApiState {
        channels: HashMap<String, FakeChannel>,
        feeds: HashMap<String, Vec<ApiFeedItem>>,
        feed_failures: HashSet<String>,
        fail_channel_calls_from: Option<usize>,
        channel_calls: Vec<(Vec<String>, ChannelParts)>,
        feed_calls: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct FakeApi {
        state: Arc<Mutex<FakeApiState>>,
    }

    impl FakeApi {
        fn add_channel(&self, id: &str, title: &str, uploads: &str) {
            self.state.lock().unwrap().channels.insert(
                id.to_string(),
                FakeChannel {
                    title: title.to_string(),
                    uploads_feed_id: uploads.to_string(),
                    subscriber_count: 1234,
                    video_count: 56,
                },
            );
        }

        fn add_feed_item(&self, feed_id: &str, video_id: &str, published_at: OffsetDateTime) {
            self.state
                .lock()
                .unwrap()
                .feeds
                .entry(feed_id.to_string())
                .or_default()
                .push(ApiFeedItem {
                    video_id: video_id.to_string(),
                    title: format!("title of {video_id}"),
                    published_at,
                    thumbnail_url: String::new(),
                });
        }

        fn fail_feed(&self, feed_id: &str) {
            self.state
                .lock()
                .unwrap()
                .feed_failures
                .insert(feed_id.to_string());
        }

        /// Fail every `list_channels` call whose index is >= `call`.
        fn fail_channel_calls_from(&self, call: usize) {
            self.state.lock().unwrap().fail_channel_calls_from = Some(call);
        }

        fn channel_calls(&self) -> Vec<(Vec<String>, ChannelParts)> {
            self.state.lock().unwrap().channel_calls.clone()
        }

        fn feed_calls(&self) -> Vec<String> {
            self.state.lock().unwrap().feed_calls.clone()
        }
    }

    #[async_trait::async_trait]
    impl YouTubeApi for FakeApi {
        async fn list_channels(
            &self,
            ids: &[String],
            parts: ChannelParts,
        ) -> anyhow::Result<Vec<ApiChannel>> {
            let mut state = self.state.lock().unwrap();
            let call_index = state.channel_calls.len();
            state.channel_calls.push((ids.to_vec(), parts));
            if state
                .fail_channel_calls_from
                .is_some_and(|from| call_index >= from)
            {
                bail!("channels.list error: 503 Service Unavailable");
            }
            Ok(ids
                .iter()
                .filter_map(|id| {
                    state.channels.get(id).map(|c| ApiChannel {
                        id: id.clone(),
                        title: c.title.clone(),
                        uploads_feed_id: c.uploads_feed_id.clone(),
                        subscriber_count: c.subscriber_count,
                        video_count: c.video_count,
                        description: format!("about {id}"),
                        thumbnail_url: String::new(),
                    })
                })
                .collect())
        }

        async fn list_feed_items(
            &self,
            feed_id: &str,
            max_results: u32,
        ) -> anyhow::Result<Vec<ApiFeedItem>> {
            let mut state = self.state.lock().unwrap();
            state.feed_calls.push(feed_id.to_string());
            if state.feed_failures.contains(feed_id) {
                bail!("playlistItems.list error for {feed_id}: 500 Internal Server Error");
            }
            let items = state.feeds.get(feed_id).cloned().unwrap_or_default();
            Ok(items.into_iter().take(max_results as usize).collect())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        saved: Arc<Mutex<Vec<Vec<String>>>>,
        fail: bool,
    }

    impl SubscriptionStore for RecordingStore {
        fn persist(&mut self, ids: &[String]) -> anyhow::Result<()> {
            if self.fail {
                bail!("disk full");
            }
            self.saved.lock().unwrap().push(ids.to_vec());
            Ok(())
        }
    }

    type Saved = Arc<Mutex<Vec<Vec<String>>>>;

    fn make_aggregator(api: FakeApi, subscriptions: &[&str]) -> (Aggregator<FakeApi>, Saved) {
        make_aggregator_inner(api, subscriptions, false)
    }

    fn make_failing_store_aggregator(
        api: FakeApi,
        subscriptions: &[&str],
    ) -> (Aggregator<FakeApi>, Saved) {
        make_aggregator_inner(api, subscriptions, true)
    }

    fn make_aggregator_inner(
        api: FakeApi,
        subscriptions: &[&str],
        fail_store: bool,
    ) -> (Aggregator<FakeApi>, Saved) {
        let store = RecordingStore {
            fail: fail_store,
            ..RecordingStore::default()
        };
        let saved = store.saved.clone();
        let mut cfg = Config::default();
        cfg.subscriptions = subscriptions.iter().map(|s| s.to_string()).collect();
        let watched = StorageHandle::new(std::env::temp_dir().join("subfeed-feed-tests-unused.db"));
        (Aggregator::new(&cfg, api, Box::new(store), watched), saved)
    }

    fn feeds_calls(api: &FakeApi) -> Vec<Vec<String>> {
        api.channel_calls()
            .into_iter()
            .filter(|(_, parts)| *parts == ChannelParts::Feeds)
            .map(|(ids, _)| ids)
            .collect()
    }

    fn names_calls(api: &FakeApi) -> Vec<Vec<String>> {
        api.channel_calls()
            .into_iter()
            .filter(|(_, parts)| *parts == ChannelParts::Names)
            .map(|(ids, _)| ids)
            .collect()
    }

    fn two_channel_fixture() -> FakeApi {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        api.add_channel("UCbbb", "Beta Channel", "UUbbb");
        api.add_feed_item("UUaaa", "v1", datetime!(2024-05-04 12:00 UTC));
        api.add_feed_item("UUaaa", "v3", datetime!(2024-05-02 12:00 UTC));
        api.add_feed_item("UUbbb", "v2", datetime!(2024-05-03 12:00 UTC));
        api.add_feed_item("UUbbb", "v4", datetime!(2024-05-01 12:00 UTC));
        api
    }

    fn video_ids(videos: &[Video]) -> Vec<&str> {
        videos.iter().map(|v| v.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_videos_sorted_newest_first() {
        let api = two_channel_fixture();
        let (mut feed, _) = make_aggregator(api, &["UCaaa", "UCbbb"]);

        let videos = feed.latest_videos().await.unwrap();
        assert_eq!(video_ids(&videos), vec!["v1", "v2", "v3", "v4"]);
    }

    #[tokio::test]
    async fn test_sort_ties_keep_merge_order() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        api.add_channel("UCbbb", "Beta Channel", "UUbbb");
        let t = datetime!(2024-05-04 12:00 UTC);
        api.add_feed_item("UUaaa", "a1", t);
        api.add_feed_item("UUbbb", "b1", t);
        let (mut feed, _) = make_aggregator(api, &["UCaaa", "UCbbb"]);

        let videos = feed.latest_videos().await.unwrap();
        assert_eq!(video_ids(&videos), vec!["a1", "b1"]);
    }

    #[tokio::test]
    async fn test_fresh_cache_serves_without_network() {
        let api = two_channel_fixture();
        let (mut feed, _) = make_aggregator(api.clone(), &["UCaaa", "UCbbb"]);

        let first = feed.latest_videos().await.unwrap();
        let channel_calls = api.channel_calls().len();
        let feed_calls = api.feed_calls().len();

        let second = feed.latest_videos().await.unwrap();
        assert_eq!(second, first);
        assert_eq!(api.channel_calls().len(), channel_calls);
        assert_eq!(api.feed_calls().len(), feed_calls);
    }

    #[tokio::test]
    async fn test_stale_cache_refetches() {
        let api = two_channel_fixture();
        let (mut feed, _) = make_aggregator(api.clone(), &["UCaaa", "UCbbb"]);
        feed.ttl = Duration::ZERO;

        feed.latest_videos().await.unwrap();
        let feed_calls = api.feed_calls().len();
        feed.latest_videos().await.unwrap();
        assert_eq!(api.feed_calls().len(), feed_calls * 2);
    }

    #[tokio::test]
    async fn test_clear_video_cache_forces_refetch() {
        let api = two_channel_fixture();
        let (mut feed, _) = make_aggregator(api.clone(), &["UCaaa", "UCbbb"]);

        feed.latest_videos().await.unwrap();
        assert!(feed.last_fetch.is_some());

        feed.clear_video_cache();
        assert!(feed.last_fetch.is_none());

        let feed_calls = api.feed_calls().len();
        let videos = feed.latest_videos().await.unwrap();
        assert_eq!(video_ids(&videos), vec!["v1", "v2", "v3", "v4"]);
        assert_eq!(api.feed_calls().len(), feed_calls * 2);
    }

    #[tokio::test]
    async fn test_refresh_batches_by_fifty() {
        let api = FakeApi::default();
        let ids: Vec<String> = (0..120).map(|i| format!("UC{i:03}")).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let (mut feed, _) = make_aggregator(api.clone(), &refs);

        let videos = feed.latest_videos().await.unwrap();
        assert!(videos.is_empty());
        assert!(feed.last_fetch.is_some());

        let batches = feeds_calls(&api);
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(batches[0][0], "UC000");
        assert_eq!(batches[2][19], "UC119");
    }

    #[tokio::test]
    async fn test_failed_batch_aborts_refresh() {
        let api = FakeApi::default();
        let ids: Vec<String> = (0..60).map(|i| format!("UC{i:03}")).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        let (mut feed, _) = make_aggregator(api.clone(), &refs);
        api.fail_channel_calls_from(1);

        let err = feed.latest_videos().await.unwrap_err();
        assert!(matches!(err, FeedError::Transient(_)));
        assert!(feed.last_fetch.is_none());
        assert_eq!(api.channel_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_entries_survive_later_batch_failure() {
        let api = FakeApi::default();
        let ids: Vec<String> = (0..60).map(|i| format!("UC{i:03}")).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        api.add_channel("UC000", "Channel Zero", "UU000");
        api.add_feed_item("UU000", "v1", datetime!(2024-05-04 12:00 UTC));
        let (mut feed, _) = make_aggregator(api.clone(), &refs);
        // Call 0 is batch 1's metadata, call 1 its name backfill, call 2
        // batch 2's metadata.
        api.fail_channel_calls_from(2);

        let err = feed.latest_videos().await.unwrap_err();
        assert!(matches!(err, FeedError::Transient(_)));
        assert!(feed.last_fetch.is_none());

        // Batch 1's cache entry stays in place even though the rebuild
        // as a whole failed.
        let kept = &feed.videos_by_channel["UC000"];
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "v1");
    }

    #[tokio::test]
    async fn test_empty_subscription_list_yields_empty_feed() {
        let api = FakeApi::default();
        let (mut feed, _) = make_aggregator(api.clone(), &[]);

        let videos = feed.latest_videos().await.unwrap();
        assert!(videos.is_empty());
        assert!(feed.last_fetch.is_some());
        assert!(api.channel_calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_channel_skipped_during_refresh() {
        let api = two_channel_fixture();
        let (mut feed, _) = make_aggregator(api, &["UCaaa", "UCnope", "UCbbb"]);

        let videos = feed.latest_videos().await.unwrap();
        assert_eq!(video_ids(&videos), vec!["v1", "v2", "v3", "v4"]);
    }

    #[tokio::test]
    async fn test_failed_uploads_fetch_skips_channel() {
        let api = two_channel_fixture();
        api.fail_feed("UUbbb");
        let (mut feed, _) = make_aggregator(api, &["UCaaa", "UCbbb"]);

        let videos = feed.latest_videos().await.unwrap();
        assert_eq!(video_ids(&videos), vec!["v1", "v3"]);
    }

    #[tokio::test]
    async fn test_names_backfilled_after_fetch() {
        let api = two_channel_fixture();
        let (mut feed, _) = make_aggregator(api.clone(), &["UCaaa", "UCbbb"]);

        let videos = feed.latest_videos().await.unwrap();
        assert!(videos.iter().all(|v| v.name_resolved));
        assert_eq!(videos[0].channel_name, "Alpha Channel");
        assert_eq!(videos[1].channel_name, "Beta Channel");

        // One deduplicated lookup covers every unresolved channel.
        assert_eq!(
            names_calls(&api),
            vec![vec!["UCaaa".to_string(), "UCbbb".to_string()]]
        );

        // The cached entries were patched too.
        let cached = feed.latest_videos().await.unwrap();
        assert!(cached.iter().all(|v| v.name_resolved));
    }

    #[tokio::test]
    async fn test_failed_backfill_keeps_id_placeholders() {
        let api = two_channel_fixture();
        let (mut feed, _) = make_aggregator(api.clone(), &["UCaaa", "UCbbb"]);
        // Call 0 is the batch metadata lookup; call 1 the name lookup.
        api.fail_channel_calls_from(1);

        let videos = feed.latest_videos().await.unwrap();
        assert_eq!(videos.len(), 4);
        assert!(videos.iter().all(|v| !v.name_resolved));
        assert_eq!(videos[0].channel_name, "UCaaa");
    }

    #[tokio::test]
    async fn test_resolve_names_serves_cache_and_fetches_misses() {
        let api = FakeApi::default();
        api.add_channel("UCbbb", "Beta Channel", "UUbbb");
        let (mut feed, _) = make_aggregator(api.clone(), &[]);
        feed.channel_names
            .insert("UCaaa".to_string(), "Alpha Channel".to_string());

        let names = feed
            .resolve_names(&["UCaaa".to_string(), "UCbbb".to_string()])
            .await
            .unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names["UCaaa"], "Alpha Channel");
        assert_eq!(names["UCbbb"], "Beta Channel");
        assert_eq!(names_calls(&api), vec![vec!["UCbbb".to_string()]]);
    }

    #[tokio::test]
    async fn test_resolve_names_drops_unknown_ids() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        let (mut feed, _) = make_aggregator(api, &[]);

        let names = feed
            .resolve_names(&["UCaaa".to_string(), "UCnope".to_string()])
            .await
            .unwrap();
        assert_eq!(names.len(), 1);
        assert!(!names.contains_key("UCnope"));
    }

    #[tokio::test]
    async fn test_resolve_names_keeps_completed_batches_on_failure() {
        let api = FakeApi::default();
        let ids: Vec<String> = (0..60).map(|i| format!("UC{i:03}")).collect();
        for id in &ids[..50] {
            api.add_channel(id, &format!("Channel {id}"), "");
        }
        let (mut feed, _) = make_aggregator(api.clone(), &[]);
        api.fail_channel_calls_from(1);

        let err = feed.resolve_names(&ids).await.unwrap_err();
        assert!(matches!(err, FeedError::Transient(_)));
        assert_eq!(feed.channel_names.len(), 50);
        assert_eq!(feed.channel_names["UC000"], "Channel UC000");
    }

    #[tokio::test]
    async fn test_add_subscription_rejects_unknown_channel() {
        let api = FakeApi::default();
        let (mut feed, saved) = make_aggregator(api, &["UCaaa"]);

        let err = feed.add_subscription("UCnope").await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert!(err.to_string().contains("not found"));
        assert_eq!(feed.subscriptions(), ["UCaaa"]);
        assert!(saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_subscription_rejects_duplicate() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        let (mut feed, saved) = make_aggregator(api, &["UCaaa"]);

        let err = feed.add_subscription("UCaaa").await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert!(err.to_string().contains("already subscribed"));
        assert!(saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_subscription_rejects_blank_input() {
        let api = FakeApi::default();
        let (mut feed, _) = make_aggregator(api.clone(), &[]);

        let err = feed.add_subscription("   ").await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert!(api.channel_calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_subscription_appends_and_persists() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        api.add_channel("UCbbb", "Beta Channel", "UUbbb");
        let (mut feed, saved) = make_aggregator(api, &["UCaaa"]);

        feed.subscription_info().await.unwrap();
        assert!(feed.subscription_info.is_some());

        feed.add_subscription("UCbbb").await.unwrap();
        assert_eq!(feed.subscriptions(), ["UCaaa", "UCbbb"]);
        assert!(feed.subscription_info.is_none());
        assert_eq!(
            saved.lock().unwrap().as_slice(),
            [vec!["UCaaa".to_string(), "UCbbb".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_add_subscription_keeps_addition_when_persist_fails() {
        let api = FakeApi::default();
        api.add_channel("UCbbb", "Beta Channel", "UUbbb");
        let (mut feed, _) = make_failing_store_aggregator(api, &["UCaaa"]);

        let err = feed.add_subscription("UCbbb").await.unwrap_err();
        assert!(matches!(err, FeedError::Persistence(_)));
        assert_eq!(feed.subscriptions(), ["UCaaa", "UCbbb"]);
    }

    #[test]
    fn test_remove_subscription_unknown_channel() {
        let api = FakeApi::default();
        let (mut feed, saved) = make_aggregator(api, &["UCaaa"]);

        let err = feed.remove_subscription("UCnope").unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));
        assert_eq!(feed.subscriptions(), ["UCaaa"]);
        assert!(saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_subscription_persists() {
        let api = FakeApi::default();
        let (mut feed, saved) = make_aggregator(api, &["UCaaa", "UCbbb"]);

        feed.remove_subscription("UCaaa").unwrap();
        assert_eq!(feed.subscriptions(), ["UCbbb"]);
        assert_eq!(
            saved.lock().unwrap().as_slice(),
            [vec!["UCbbb".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_subscription_info_sorted_case_insensitively() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "beta videos", "UUaaa");
        api.add_channel("UCbbb", "Alpha Videos", "UUbbb");
        let (mut feed, _) = make_aggregator(api, &["UCaaa", "UCbbb"]);

        let info = feed.subscription_info().await.unwrap();
        let titles: Vec<&str> = info.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha Videos", "beta videos"]);
    }

    #[tokio::test]
    async fn test_subscription_info_served_from_cache_until_invalidated() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        api.add_channel("UCbbb", "Beta Channel", "UUbbb");
        let (mut feed, _) = make_aggregator(api.clone(), &["UCaaa", "UCbbb"]);

        let first = feed.subscription_info().await.unwrap();
        assert_eq!(api.channel_calls().len(), 2);
        let second = feed.subscription_info().await.unwrap();
        assert_eq!(second, first);
        assert_eq!(api.channel_calls().len(), 2);

        feed.remove_subscription("UCaaa").unwrap();
        let third = feed.subscription_info().await.unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(api.channel_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_subscription_info_requires_subscriptions() {
        let api = FakeApi::default();
        let (mut feed, _) = make_aggregator(api.clone(), &[]);

        let err = feed.subscription_info().await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert!(api.channel_calls().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_info_aborts_on_lookup_failure() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        api.add_channel("UCbbb", "Beta Channel", "UUbbb");
        let (mut feed, _) = make_aggregator(api.clone(), &["UCaaa", "UCbbb"]);
        api.fail_channel_calls_from(1);

        let err = feed.subscription_info().await.unwrap_err();
        assert!(matches!(err, FeedError::Transient(_)));
        assert!(feed.subscription_info.is_none());
    }

    #[tokio::test]
    async fn test_subscription_info_skips_unknown_channels() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        let (mut feed, _) = make_aggregator(api, &["UCaaa", "UCnope"]);

        let info = feed.subscription_info().await.unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].id, "UCaaa");
        assert_eq!(info[0].subscriber_count, 1234);
    }

    #[tokio::test]
    async fn test_subscription_info_feeds_name_cache() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        let (mut feed, _) = make_aggregator(api.clone(), &["UCaaa"]);

        feed.subscription_info().await.unwrap();
        assert_eq!(feed.channel_names["UCaaa"], "Alpha Channel");

        // A later name lookup is now a cache hit.
        let names = feed.resolve_names(&["UCaaa".to_string()]).await.unwrap();
        assert_eq!(names["UCaaa"], "Alpha Channel");
        assert!(names_calls(&api).is_empty());
    }

    #[tokio::test]
    async fn test_removed_channel_videos_drop_on_next_refresh() {
        let api = two_channel_fixture();
        let (mut feed, _) = make_aggregator(api, &["UCaaa", "UCbbb"]);
        feed.ttl = Duration::ZERO;

        feed.latest_videos().await.unwrap();
        feed.remove_subscription("UCbbb").unwrap();

        let videos = feed.latest_videos().await.unwrap();
        assert_eq!(video_ids(&videos), vec!["v1", "v3"]);
    }

    #[tokio::test]
    async fn test_watched_round_trip() {
        let api = FakeApi::default();
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::default();
        let mut cfg = Config::default();
        cfg.subscriptions = vec!["UCaaa".to_string()];
        let watched = StorageHandle::new(dir.path().join("watched.db"));
        let feed = Aggregator::new(&cfg, api, Box::new(store), watched);

        assert!(!feed.is_watched("v1").await.unwrap());
        feed.mark_watched("v1").await.unwrap();
        assert!(feed.is_watched("v1").await.unwrap());
        assert!(!feed.is_watched("v2").await.unwrap());
        assert_eq!(feed.watched_ids().await.unwrap(), HashSet::from(["v1".to_string()]));
    }

    #[test]
    fn test_aggregator_usable_from_spawned_tasks() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Aggregator<FakeApi>>();
    }

    #[tokio::test]
    async fn test_max_videos_per_channel_limit() {
        let api = FakeApi::default();
        api.add_channel("UCaaa", "Alpha Channel", "UUaaa");
        for i in 0..8 {
            api.add_feed_item("UUaaa", &format!("v{i}"), datetime!(2024-05-01 12:00 UTC));
        }
        let mut cfg = Config::default();
        cfg.subscriptions = vec!["UCaaa".to_string()];
        cfg.feed.max_videos_per_channel = 3;
        let store = RecordingStore::default();
        let watched = StorageHandle::new(std::env::temp_dir().join("subfeed-feed-tests-unused.db"));
        let mut feed = Aggregator::new(&cfg, api, Box::new(store), watched);

        let videos = feed.latest_videos().await.unwrap();
        assert_eq!(videos.len(), 3);
    }
}
