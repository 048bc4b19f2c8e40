use anyhow::Context;
use rusqlite::{Connection, params};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS watched_videos (
  video_id TEXT PRIMARY KEY,
  watched_at INTEGER NOT NULL
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Record a video as watched. Re-marking is a no-op.
    pub fn mark_watched(&self, video_id: &str, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO watched_videos(video_id, watched_at) VALUES(?1, ?2)",
                params![video_id, now_unix],
            )
            .context("mark watched")?;
        Ok(())
    }

    pub fn is_watched(&self, video_id: &str) -> anyhow::Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM watched_videos WHERE video_id=?1")
            .context("prepare watched lookup")?;
        let mut rows = stmt
            .query(params![video_id])
            .context("query watched lookup")?;
        Ok(rows.next().context("read watched row")?.is_some())
    }

    pub fn watched_ids(&self) -> anyhow::Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT video_id FROM watched_videos")
            .context("prepare watched set")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }
}

// Simple way to use rusqlite from async tasks: open per-operation.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> anyhow::Result<Storage> {
        Storage::open(&self.path)
    }

    pub fn mark_watched(&self, video_id: &str) -> anyhow::Result<()> {
        let now_unix = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        self.open()?.mark_watched(video_id, now_unix)
    }

    pub fn is_watched(&self, video_id: &str) -> anyhow::Result<bool> {
        self.open()?.is_watched(video_id)
    }

    pub fn watched_ids(&self) -> anyhow::Result<HashSet<String>> {
        self.open()?.watched_ids()
    }
}
