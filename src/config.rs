use anyhow::Context;
use time::{macros::format_description, UtcOffset};

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DemoUserConfig {
    pub username: String,
    pub password: String,
    pub daily_calorie_goal: i32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub llm: LlmConfig,
    /// Offset used to turn calendar days into instants.
    pub utc_offset: UtcOffset,
    pub demo_user: DemoUserConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let llm = LlmConfig {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            timeout_secs: match std::env::var("LLM_TIMEOUT_SECS") {
                Ok(v) => v
                    .parse::<u64>()
                    .with_context(|| format!("LLM_TIMEOUT_SECS is not a number: {v}"))?,
                Err(_) => 30,
            },
        };

        let utc_offset = match std::env::var("APP_UTC_OFFSET") {
            Ok(v) => parse_utc_offset(&v)?,
            Err(_) => UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        };

        let demo_user = DemoUserConfig {
            username: std::env::var("DEMO_USERNAME").unwrap_or_else(|_| "demo".into()),
            password: std::env::var("DEMO_PASSWORD").unwrap_or_else(|_| "demo".into()),
            daily_calorie_goal: match std::env::var("DAILY_CALORIE_GOAL") {
                Ok(v) => v
                    .parse::<i32>()
                    .with_context(|| format!("DAILY_CALORIE_GOAL is not a number: {v}"))?,
                Err(_) => 2000,
            },
        };

        Ok(Self {
            database_url,
            llm,
            utc_offset,
            demo_user,
        })
    }

    /// Configuration for tests: in-memory store, no credential, UTC days.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            llm: LlmConfig {
                api_key: None,
                base_url: "http://127.0.0.1:9/v1".into(),
                model: "test-model".into(),
                timeout_secs: 1,
            },
            utc_offset: UtcOffset::UTC,
            demo_user: DemoUserConfig {
                username: "demo".into(),
                password: "demo".into(),
                daily_calorie_goal: 2000,
            },
        }
    }
}

/// Parses `+HH:MM` / `-HH:MM`.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    UtcOffset::parse(
        raw.trim(),
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .with_context(|| format!("APP_UTC_OFFSET must look like +02:00, got {raw}"))
}
