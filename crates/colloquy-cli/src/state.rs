//! Application state wiring the conversation service together.
//!
//! The service in colloquy-core is generic over store/vault/client traits;
//! `AppState` pins those generics to the concrete infra implementations.

use std::sync::Arc;

use colloquy_core::store::service::ConversationService;
use colloquy_infra::completion::HttpCompletionClient;
use colloquy_infra::config::{load_global_config, resolve_data_dir};
use colloquy_infra::sqlite::{DatabasePool, SqliteConversationStore};
use colloquy_infra::vault::FsAttachmentVault;
use colloquy_types::config::GlobalConfig;

/// Concrete type alias for the service generics pinned to infra
/// implementations.
pub type ConcreteConversationService =
    ConversationService<SqliteConversationStore, FsAttachmentVault, HttpCompletionClient>;

/// Shared application state used by every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub convo: Arc<ConcreteConversationService>,
    pub config: GlobalConfig,
}

impl AppState {
    /// Initialize the application state: load config, connect the
    /// database, wire the service.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;
        tracing::debug!(data_dir = %data_dir.display(), "using data directory");

        let config = load_global_config(&data_dir).await;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("colloquy.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let store = SqliteConversationStore::new(db_pool.clone());
        let vault = FsAttachmentVault::new(data_dir.clone());
        let client = HttpCompletionClient::new(config.endpoint.clone())?;
        let convo = ConversationService::new(store, vault, client);

        Ok(Self {
            convo: Arc::new(convo),
            config,
        })
    }

    /// Owner identity for session scoping: `--owner` flag, then
    /// config.toml, then a local placeholder.
    pub fn owner_key(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.config.owner_key.clone())
            .unwrap_or_else(|| "local".to_string())
    }
}
