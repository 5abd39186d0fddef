// config.rs
use std::{fmt, time::Duration};

use crate::models::questmodel::QuestAction;

/// Point amounts paid by the referral flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardsConfig {
    pub referral_bonus: i64,
    pub whitelist_bonus: i64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        RewardsConfig {
            referral_bonus: 100,
            whitelist_bonus: 300,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub query_timeout: Duration,
    pub telegram_bot_token: String,
    pub telegram_api_base: String,
    pub telegram_group_chat_id: String,
    // (platform, action) pairs completed on the user's word alone
    pub self_attested_quests: Vec<(String, QuestAction)>,
    pub rewards: RewardsConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("query_timeout", &self.query_timeout)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("telegram_group_chat_id", &self.telegram_group_chat_id)
            .field("self_attested_quests", &self.self_attested_quests)
            .field("rewards", &self.rewards)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let port = env_or("PORT", 8000);
        let query_timeout = Duration::from_secs(env_or("QUERY_TIMEOUT_SECS", 5));

        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, group quests will fail as unavailable");
            "".to_string()
        });
        let telegram_api_base = std::env::var("TELEGRAM_API_BASE")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());
        let telegram_group_chat_id = std::env::var("TELEGRAM_GROUP_CHAT_ID")
            .unwrap_or_else(|_| "-1002301616820".to_string());

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:8000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let self_attested_quests =
            parse_self_attested(&std::env::var("SELF_ATTESTED_QUESTS").unwrap_or_default());

        let defaults = RewardsConfig::default();
        let rewards = RewardsConfig {
            referral_bonus: env_or("REFERRAL_BONUS_POINTS", defaults.referral_bonus),
            whitelist_bonus: env_or("WHITELIST_BONUS_POINTS", defaults.whitelist_bonus),
        };

        Config {
            database_url,
            port,
            allowed_origins,
            query_timeout,
            telegram_bot_token,
            telegram_api_base,
            telegram_group_chat_id,
            self_attested_quests,
            rewards,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Parses `platform:ACTION` pairs separated by commas. Entries without a colon are skipped.
pub fn parse_self_attested(raw: &str) -> Vec<(String, QuestAction)> {
    raw.split(',')
        .filter_map(|entry| {
            let (platform, action) = entry.trim().split_once(':')?;
            let platform = platform.trim();
            let action = action.trim();
            if platform.is_empty() || action.is_empty() {
                tracing::warn!("Ignoring self-attested quest entry {:?}", entry);
                return None;
            }
            Some((platform.to_string(), QuestAction::from(action)))
        })
        .collect()
}
