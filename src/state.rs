use crate::config::AppConfig;
use crate::llm::{CompletionClient, OpenAiClient};
use crate::nutrition::NutritionEstimator;
use crate::store::{FoodLogStore, MemoryStore, PgStore, UserStore};
use crate::users::services::ensure_demo_user;
use std::sync::Arc;

/// Built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub foods: Arc<dyn FoodLogStore>,
    pub users: Arc<dyn UserStore>,
    pub estimator: NutritionEstimator,
    /// Owner of every entry; the service has a single hard-coded user.
    pub user_id: String,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let client = Arc::new(OpenAiClient::new(&config.llm)?) as Arc<dyn CompletionClient>;

        if config.llm.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; food analysis requests will fail");
        }

        match config.database_url.clone() {
            Some(url) => {
                let pg = PgStore::connect(&url, config.utc_offset).await?;
                pg.migrate().await?;
                let pg = Arc::new(pg);
                tracing::info!("using postgres food log");
                Self::from_parts(config, pg.clone(), pg, client).await
            }
            None => {
                tracing::info!("DATABASE_URL not set; using in-memory food log");
                Self::in_memory(config, client).await
            }
        }
    }

    pub async fn in_memory(
        config: AppConfig,
        client: Arc<dyn CompletionClient>,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new(config.utc_offset));
        Self::from_parts(config, store.clone(), store, client).await
    }

    pub async fn from_parts(
        config: AppConfig,
        foods: Arc<dyn FoodLogStore>,
        users: Arc<dyn UserStore>,
        client: Arc<dyn CompletionClient>,
    ) -> anyhow::Result<Self> {
        let demo = ensure_demo_user(users.as_ref(), &config.demo_user)
            .await
            .map_err(|e| anyhow::anyhow!("prepare demo user: {e}"))?;

        Ok(Self {
            config: Arc::new(config),
            foods,
            users,
            estimator: NutritionEstimator::new(client),
            user_id: demo.id,
        })
    }
}
