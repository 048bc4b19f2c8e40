use time::OffsetDateTime;

/// A single upload as shown in the aggregated feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: String,
    pub title: String,
    /// Display name of the uploading channel. While `name_resolved` is
    /// false this holds the raw channel ID as a placeholder.
    pub channel_name: String,
    pub name_resolved: bool,
    pub published_at: OffsetDateTime,
    pub thumbnail_url: String,
}

/// Enriched metadata for a subscribed channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub thumbnail_url: String,
}
