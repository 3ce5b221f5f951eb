// src/config.rs
//! Environment-driven configuration, snapshotted from the process
//! environment at the start of every cycle.

use std::env;

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(key: &str) -> bool {
    env_opt(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_opt(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Evolution API credentials shared by the WhatsApp channel and the error
/// notifier (which targets a separate chat).
#[derive(Debug, Clone)]
pub struct EvolutionApi {
    pub api_url: String,
    pub api_key: String,
    pub instance_name: String,
}

impl EvolutionApi {
    fn from_env() -> Option<Self> {
        Some(Self {
            api_url: env_opt("EVOLUTION_API_URL")?,
            api_key: env_opt("EVOLUTION_API_KEY")?,
            instance_name: env_opt("EVOLUTION_INSTANCE_NAME")?,
        })
    }
}

/// One cycle's worth of configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Raw window hours; parsed (and validated) per cycle by the scheduler
    /// so malformed values disable the window without killing the loop.
    pub execution_start_hour: Option<String>,
    pub execution_end_hour: Option<String>,

    pub default_products_limit: usize,
    pub min_price_to_post: f64,

    pub mercado_livre_url: Option<String>,
    pub mercado_livre_limit: Option<usize>,
    pub magazine_luiza_url: Option<String>,
    pub magazine_luiza_limit: Option<usize>,
    pub shopee_app_id: Option<String>,
    pub shopee_app_secret: Option<String>,
    pub shopee_limit: Option<usize>,
    pub shopee_min_sales: u64,
    pub shopee_min_rating: f64,

    pub post_to_whatsapp: bool,
    pub post_to_instagram: bool,
    pub post_to_facebook: bool,

    pub evolution: Option<EvolutionApi>,
    pub whatsapp_chat_id: Option<String>,
    pub whatsapp_chat_id_test: Option<String>,
    pub whatsapp_error_group_id: Option<String>,
    /// "production" unless overridden; "test" redirects WhatsApp posts.
    /// Always lowercased, so comparisons against it can be exact.
    pub app_env: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            execution_start_hour: env_opt("EXECUTION_START_HOUR"),
            execution_end_hour: env_opt("EXECUTION_END_HOUR"),
            default_products_limit: env_parse("DEFAULT_PRODUCTS_LIMIT", 2),
            min_price_to_post: env_parse("MIN_PRICE_TO_POST", 0.0),
            mercado_livre_url: env_opt("MERCADO_LIVRE_URL"),
            mercado_livre_limit: env_opt("MERCADO_LIVRE_LIMIT").and_then(|v| v.parse().ok()),
            magazine_luiza_url: env_opt("MAGAZINE_LUIZA_URL"),
            magazine_luiza_limit: env_opt("MAGAZINE_LUIZA_LIMIT").and_then(|v| v.parse().ok()),
            shopee_app_id: env_opt("SHOPEE_APP_ID"),
            shopee_app_secret: env_opt("SHOPEE_APP_SECRET"),
            shopee_limit: env_opt("SHOPEE_LIMIT").and_then(|v| v.parse().ok()),
            shopee_min_sales: env_parse("SHOPEE_MIN_SALES", 10),
            shopee_min_rating: env_parse("SHOPEE_MIN_RATING", 4.0),
            post_to_whatsapp: env_bool("POST_TO_WHATSAPP"),
            post_to_instagram: env_bool("POST_TO_INSTAGRAM"),
            post_to_facebook: env_bool("POST_TO_FACEBOOK"),
            evolution: EvolutionApi::from_env(),
            whatsapp_chat_id: env_opt("WHATSAPP_CHAT_ID"),
            whatsapp_chat_id_test: env_opt("WHATSAPP_CHAT_ID_TEST"),
            whatsapp_error_group_id: env_opt("WHATSAPP_ERROR_GROUP_ID"),
            app_env: env_opt("APP_ENV")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| "production".to_string()),
        }
    }

    /// Per-source item cap, falling back to `DEFAULT_PRODUCTS_LIMIT`.
    pub fn source_limit(&self, specific: Option<usize>) -> usize {
        specific.unwrap_or(self.default_products_limit)
    }

    /// Ledger database path (`DEALS_DB_PATH`, default `deals.db`).
    pub fn db_path() -> String {
        env_opt("DEALS_DB_PATH").unwrap_or_else(|| "deals.db".to_string())
    }

    /// Activity log path (`APP_LOG_PATH`, default `app.log`).
    pub fn log_path() -> String {
        env_opt("APP_LOG_PATH").unwrap_or_else(|| "app.log".to_string())
    }
}
