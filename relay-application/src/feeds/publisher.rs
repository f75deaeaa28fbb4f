use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use relay_domain::ports::{MessagingPlatform, ProfileLookup};
use relay_domain::{Category, FeedChannel, FeedRecord, MessageRef, PlayerProfile};

use crate::feeds::render::{profile_subject, render_record};

/// Posts rendered feed records to each category's channel.
pub struct FeedPublisher {
    platform: Arc<dyn MessagingPlatform>,
    profiles: Arc<dyn ProfileLookup>,
    channels: HashMap<Category, String>,
    call_timeout: Duration,
}

impl FeedPublisher {
    pub fn new(
        platform: Arc<dyn MessagingPlatform>,
        profiles: Arc<dyn ProfileLookup>,
        feeds: &[FeedChannel],
        call_timeout: Duration,
    ) -> Self {
        let channels = feeds
            .iter()
            .map(|feed| (feed.category, feed.channel_id.clone()))
            .collect();
        Self {
            platform,
            profiles,
            channels,
            call_timeout,
        }
    }

    pub fn channel_for(&self, category: Category) -> Option<&str> {
        self.channels.get(&category).map(String::as_str)
    }

    /// Renders and sends one record. `Ok(None)` when the category has no
    /// channel configured.
    pub async fn publish(&self, record: &FeedRecord) -> anyhow::Result<Option<MessageRef>> {
        let category = record.category();
        let Some(channel_id) = self.channel_for(category) else {
            debug!(category = %category, "no channel configured, dropping record");
            return Ok(None);
        };

        let profile = match profile_subject(record) {
            Some(steam_id) => self.lookup_profile(steam_id).await,
            None => None,
        };
        let message = render_record(record, profile.as_ref());

        let sent = match timeout(self.call_timeout, self.platform.send_message(channel_id, &message)).await {
            Ok(result) => result.with_context(|| format!("sending {category} record {}", record.id))?,
            Err(_) => return Err(anyhow!("sending {category} record {} timed out", record.id)),
        };
        Ok(Some(sent))
    }

    /// Profile decoration is optional; a slow or failing lookup yields none.
    async fn lookup_profile(&self, steam_id: &str) -> Option<PlayerProfile> {
        match timeout(self.call_timeout, self.profiles.player_profile(steam_id)).await {
            Ok(profile) => profile,
            Err(_) => {
                warn!(steam_id, "profile lookup timed out");
                None
            }
        }
    }
}
