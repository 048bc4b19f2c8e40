//! YouTube Data API v3 client
//!
//! Only the key-authenticated surface the feed needs: `channels.list` for
//! channel metadata and uploads playlists, `playlistItems.list` for the
//! uploads feed itself.
//! API Documentation: https://developers.google.com/youtube/v3/docs

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Maximum number of IDs the API accepts in a single `channels.list` call.
pub const MAX_IDS_PER_CALL: usize = 50;

/// Field groups a `list_channels` call can ask for. Maps onto the API's
/// `part=` parameter; unrequested fields come back empty or zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelParts {
    /// Uploads-feed IDs only (`contentDetails`).
    Feeds,
    /// Display names only (`snippet`).
    Names,
    /// Names, description, thumbnail, and counts (`snippet,statistics`).
    Details,
}

impl ChannelParts {
    fn as_query(self) -> &'static str {
        match self {
            ChannelParts::Feeds => "contentDetails",
            ChannelParts::Names => "snippet",
            ChannelParts::Details => "snippet,statistics",
        }
    }
}

/// One channel as returned by [`YouTubeApi::list_channels`].
#[derive(Debug, Clone)]
pub struct ApiChannel {
    pub id: String,
    pub title: String,
    /// Playlist ID of the channel's uploads feed.
    pub uploads_feed_id: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub description: String,
    pub thumbnail_url: String,
}

/// One uploads-feed entry as returned by [`YouTubeApi::list_feed_items`].
#[derive(Debug, Clone)]
pub struct ApiFeedItem {
    pub video_id: String,
    pub title: String,
    pub published_at: OffsetDateTime,
    pub thumbnail_url: String,
}

/// Remote content API surface the aggregator is written against.
#[async_trait]
pub trait YouTubeApi: Send + Sync {
    /// Fetch metadata for up to [`MAX_IDS_PER_CALL`] channels in one call.
    /// Channels the API does not know are simply absent from the result.
    async fn list_channels(
        &self,
        ids: &[String],
        parts: ChannelParts,
    ) -> anyhow::Result<Vec<ApiChannel>>;

    /// Fetch the `max_results` most recent entries of an uploads feed.
    async fn list_feed_items(
        &self,
        feed_id: &str,
        max_results: u32,
    ) -> anyhow::Result<Vec<ApiFeedItem>>;
}

/// YouTube Data API client
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Client {
    const DEFAULT_BASE_URL: &'static str = "https://www.googleapis.com/youtube/v3";
    const USER_AGENT: &'static str = "subfeed/0.1.0";

    /// Create a client against the public API endpoint.
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, Self::DEFAULT_BASE_URL)
    }

    /// Create a client against a different API root.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent(Self::USER_AGENT)
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to create reqwest client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl YouTubeApi for Client {
    async fn list_channels(
        &self,
        ids: &[String],
        parts: ChannelParts,
    ) -> anyhow::Result<Vec<ApiChannel>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/channels?part={}&id={}&key={}",
            self.base_url,
            parts.as_query(),
            urlencoding::encode(&ids.join(",")),
            urlencoding::encode(&self.api_key)
        );

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("channels.list error: {}", response.status());
        }

        let parsed: ChannelListResponse = response.json().await?;
        Ok(parsed
            .items
            .into_iter()
            .map(|item| ApiChannel {
                id: item.id,
                title: item.snippet.title,
                uploads_feed_id: item.content_details.related_playlists.uploads,
                subscriber_count: parse_count(item.statistics.subscriber_count.as_deref()),
                video_count: parse_count(item.statistics.video_count.as_deref()),
                description: item.snippet.description,
                thumbnail_url: item.snippet.thumbnails.best_url(),
            })
            .collect())
    }

    async fn list_feed_items(
        &self,
        feed_id: &str,
        max_results: u32,
    ) -> anyhow::Result<Vec<ApiFeedItem>> {
        let url = format!(
            "{}/playlistItems?part=snippet&playlistId={}&maxResults={}&key={}",
            self.base_url,
            urlencoding::encode(feed_id),
            max_results,
            urlencoding::encode(&self.api_key)
        );

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("playlistItems.list error for {}: {}", feed_id, response.status());
        }

        let parsed: PlaylistItemListResponse = response.json().await?;
        Ok(parsed
            .items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet;
                let published_at = match OffsetDateTime::parse(&snippet.published_at, &Rfc3339) {
                    Ok(ts) => ts,
                    Err(_) => {
                        tracing::debug!(
                            "unparsable publishedAt {:?} for video {}, falling back to now",
                            snippet.published_at,
                            snippet.resource_id.video_id
                        );
                        OffsetDateTime::now_utc()
                    }
                };
                ApiFeedItem {
                    video_id: snippet.resource_id.video_id,
                    title: snippet.title,
                    published_at,
                    thumbnail_url: snippet.thumbnails.best_url(),
                }
            })
            .collect())
    }
}

/// Statistics counts come over the wire as decimal strings and may be
/// withheld entirely (hidden subscriber counts).
fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|s| s.parse().ok()).unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelResource>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelResource {
    #[serde(default)]
    id: String,
    #[serde(default)]
    snippet: ChannelSnippet,
    #[serde(rename = "contentDetails", default)]
    content_details: ContentDetails,
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(rename = "relatedPlaylists", default)]
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Default, Deserialize)]
struct RelatedPlaylists {
    #[serde(default)]
    uploads: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    subscriber_count: Option<String>,
    #[serde(rename = "videoCount")]
    video_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best_url(&self) -> String {
        self.medium
            .as_ref()
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItemResource>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemResource {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemSnippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    #[serde(rename = "resourceId", default)]
    resource_id: ResourceId,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId", default)]
    video_id: String,
}
