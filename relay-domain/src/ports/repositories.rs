use async_trait::async_trait;

use crate::entities::{FeedRecord, ServerSnapshot};
use crate::services::WriteBatch;
use crate::value_objects::Category;

/// Persistent store shared by the gateway (writes) and the relay (reads).
#[async_trait]
pub trait RelayStore: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;

    /// Applies the record append, every player upsert and the snapshot
    /// replace of one event as a single unit, stamped with `now_ms`. The
    /// record's `created_at` is assigned under the store's write lock and is
    /// strictly greater than that of every earlier record in its category.
    async fn commit(&self, batch: WriteBatch, now_ms: i64) -> anyhow::Result<()>;

    async fn latest_record(&self, category: Category) -> anyhow::Result<Option<FeedRecord>>;

    /// Records strictly after `(created_at, id)`, oldest first.
    async fn records_after(
        &self,
        category: Category,
        created_at: i64,
        id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<FeedRecord>>;

    async fn server_snapshot(&self) -> anyhow::Result<Option<ServerSnapshot>>;

    /// Deletes records created before `cutoff_ms`, returning how many went.
    async fn purge_before(&self, category: Category, cutoff_ms: i64) -> anyhow::Result<u64>;

    async fn ping(&self) -> anyhow::Result<()>;
}
