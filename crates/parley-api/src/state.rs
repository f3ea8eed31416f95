//! Application state wiring the relay together.
//!
//! `RelayService` is generic over its store and completion client; AppState
//! pins it to the in-memory expiring store and the reqwest client.

use std::path::Path;
use std::sync::Arc;

use parley_core::completion::RequestBuilder;
use parley_core::relay::{RelayPolicy, RelayService};
use parley_core::store::{ExpiringConversationStore, StoreLimits};
use parley_infra::completion::HttpCompletionClient;
use parley_infra::config::load_config;
use parley_types::config::RelayConfig;
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub type ConcreteStore = Arc<ExpiringConversationStore>;

pub type ConcreteRelayService = RelayService<ConcreteStore, HttpCompletionClient>;

/// Shared state for the `serve` and `chat` commands.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub store: ConcreteStore,
    pub relay: Arc<ConcreteRelayService>,
}

impl AppState {
    /// Build the relay from `config` and the upstream API key.
    pub fn build(config: RelayConfig, api_key: SecretString) -> anyhow::Result<Self> {
        let store = Arc::new(ExpiringConversationStore::new(StoreLimits::from_config(
            &config.conversation,
        )));
        let client = HttpCompletionClient::new(&config.upstream, api_key)?;
        let builder = RequestBuilder::from_config(&config.upstream);
        let policy = RelayPolicy::from_config(&config.conversation);

        info!(
            endpoint = client.endpoint(),
            model = builder.model(),
            mode = ?builder.mode(),
            window = policy.window,
            "relay configured"
        );

        let relay = RelayService::new(Arc::clone(&store), client, builder, policy);

        Ok(Self {
            config: Arc::new(config),
            store,
            relay: Arc::new(relay),
        })
    }

    /// Load the configuration at `path`, then [`AppState::build`].
    pub async fn init(path: &Path, api_key: SecretString) -> anyhow::Result<Self> {
        let config = load_config(path).await?;
        Self::build(config, api_key)
    }

    /// Start the background expiry sweep; it stops when `shutdown` fires.
    pub fn start_sweeper(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        self.store
            .spawn_sweeper(self.config.conversation.sweep_interval(), shutdown)
    }
}
