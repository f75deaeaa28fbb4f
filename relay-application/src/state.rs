use std::sync::Arc;

use relay_domain::ports::{MessagingPlatform, ProfileLookup, RelayStore};
use relay_domain::{RelayConfig, RuntimeConfig};

use crate::ops::CommandQueue;
use crate::Metrics;

/// Gateway process state. The command queue lives and dies with it.
#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub store: Arc<dyn RelayStore>,
    pub command_queue: Arc<CommandQueue>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: RuntimeConfig, store: Arc<dyn RelayStore>) -> Self {
        Self {
            config,
            store,
            command_queue: Arc::new(CommandQueue::default()),
            metrics: Arc::new(Metrics::default()),
        }
    }
}

/// Bot-side relay process state.
#[derive(Clone)]
pub struct RelayState {
    pub config: RelayConfig,
    pub store: Arc<dyn RelayStore>,
    pub platform: Arc<dyn MessagingPlatform>,
    pub profiles: Arc<dyn ProfileLookup>,
}
