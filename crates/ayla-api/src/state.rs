//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the REST API. The session manager and conversation service are generic
//! over repository/gateway traits, but AppState pins them to the concrete
//! infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::warn;

use ayla_core::conversation::service::ConversationService;
use ayla_core::session::SessionManager;
use ayla_infra::llm::gemini::GeminiGateway;
use ayla_infra::paths::resolve_data_dir;
use ayla_infra::sqlite::analytics::SqliteAnalyticsRepository;
use ayla_infra::sqlite::conversation::{SqliteConversationRepository, TitleBounds};
use ayla_infra::sqlite::pool::DatabasePool;
use ayla_types::config::AssistantConfig;

/// Concrete type aliases for the service generics pinned to infra
/// implementations.
pub type ConcreteSessionManager =
    SessionManager<SqliteConversationRepository, SqliteAnalyticsRepository, GeminiGateway>;

pub type ConcreteConversationService =
    ConversationService<SqliteConversationRepository, SqliteAnalyticsRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub session_manager: Arc<ConcreteSessionManager>,
    pub conversation_service: Arc<ConcreteConversationService>,
    pub config: Arc<AssistantConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to the DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        // Initialize database
        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("ayla.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let config = AssistantConfig::default();

        // Model gateway credentials come from the environment; a missing
        // key is not fatal here, but every model call will fail 4xx.
        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
            warn!("GEMINI_API_KEY is not set; model calls will be rejected");
            String::new()
        });
        let gateway = GeminiGateway::new(SecretString::from(api_key), &config);

        let title_bounds = TitleBounds {
            max_words: config.title_max_words,
            max_chars: config.title_max_chars,
        };

        // Wire the session manager with its own repository instances
        let session_manager = SessionManager::new(
            SqliteConversationRepository::new(db_pool.clone()).with_title_bounds(title_bounds),
            SqliteAnalyticsRepository::new(db_pool.clone()),
            gateway,
            config.clone(),
        );

        // Separate repository instances for the read/delete service
        let conversation_service = ConversationService::new(
            SqliteConversationRepository::new(db_pool.clone()).with_title_bounds(title_bounds),
            SqliteAnalyticsRepository::new(db_pool.clone()),
        );

        Ok(Self {
            session_manager: Arc::new(session_manager),
            conversation_service: Arc::new(conversation_service),
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}
