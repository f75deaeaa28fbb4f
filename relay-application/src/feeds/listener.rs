// Polling change listener for one category

use std::sync::Arc;

use tracing::{debug, error, info};

use relay_domain::ports::RelayStore;
use relay_domain::Category;

use crate::feeds::{FeedCursor, FeedPublisher};

const POLL_BATCH: usize = 50;

/// Watches one category and hands each new record to the publisher once,
/// oldest first.
pub struct FeedListener {
    category: Category,
    store: Arc<dyn RelayStore>,
    publisher: Arc<FeedPublisher>,
    cursor: FeedCursor,
}

impl FeedListener {
    pub fn new(category: Category, store: Arc<dyn RelayStore>, publisher: Arc<FeedPublisher>) -> Self {
        Self {
            category,
            store,
            publisher,
            cursor: FeedCursor::default(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn cursor(&self) -> &FeedCursor {
        &self.cursor
    }

    /// One poll. The first poll only primes the cursor. Returns how many
    /// records were handed to the publisher.
    ///
    /// A record whose publish fails is logged and skipped, not retried.
    pub async fn poll_once(&mut self) -> anyhow::Result<usize> {
        if !self.cursor.is_primed() {
            let latest = self.store.latest_record(self.category).await?;
            self.cursor.prime(latest.as_ref());
            info!(category = %self.category, "feed listener attached");
            return Ok(0);
        }

        let records = match self.cursor.position() {
            Some((created_at, id)) => {
                self.store
                    .records_after(self.category, created_at, id, POLL_BATCH)
                    .await?
            }
            None => {
                self.store
                    .records_after(self.category, i64::MIN, "", POLL_BATCH)
                    .await?
            }
        };

        let mut dispatched = 0;
        for record in records {
            if !self.cursor.observe(&record) {
                continue;
            }
            dispatched += 1;
            match self.publisher.publish(&record).await {
                Ok(_) => debug!(category = %self.category, id = %record.id, "feed record posted"),
                Err(err) => error!(
                    category = %self.category,
                    id = %record.id,
                    "failed to post feed record: {:#}",
                    err
                ),
            }
        }
        Ok(dispatched)
    }
}
