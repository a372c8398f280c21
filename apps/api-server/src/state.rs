//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::ports::{Clock, PasswordService, Repositories, TokenService};
use blogicum_core::services::{AccountService, CommentService, FeedService, PostService};
use blogicum_infra::{
    Argon2PasswordService, DatabaseConfig, InMemoryStore, JwtTokenService, SystemClock,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub feeds: FeedService,
    pub posts: PostService,
    pub comments: CommentService,
    pub accounts: AccountService,
    pub tokens: Arc<dyn TokenService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire the services over an already chosen store.
    pub fn new(
        repos: Repositories,
        clock: Arc<dyn Clock>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            feeds: FeedService::new(repos.clone(), clock.clone()),
            posts: PostService::new(repos.clone(), clock.clone()),
            comments: CommentService::new(repos.clone(), clock.clone()),
            accounts: AccountService::new(repos.users.clone(), passwords, tokens.clone()),
            tokens,
            clock,
        }
    }

    /// Build the application state with appropriate implementations.
    pub async fn from_config(config: &AppConfig) -> Self {
        let repos = repositories(config.database.as_ref()).await;
        let state = Self::new(
            repos,
            Arc::new(SystemClock),
            Arc::new(Argon2PasswordService::new()),
            Arc::new(JwtTokenService::new(config.jwt.clone())),
        );

        tracing::info!("Application state initialized");
        state
    }
}

#[cfg(feature = "postgres")]
async fn repositories(db_config: Option<&DatabaseConfig>) -> Repositories {
    let Some(config) = db_config else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return in_memory();
    };

    match blogicum_infra::database::connect(config).await {
        Ok(db) => blogicum_infra::postgres_repositories(db),
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            in_memory()
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn repositories(_db_config: Option<&DatabaseConfig>) -> Repositories {
    tracing::info!("Running without postgres feature - using in-memory store");
    in_memory()
}

fn in_memory() -> Repositories {
    Repositories::from_store(Arc::new(InMemoryStore::new()))
}
