use crate::services::session::MAX_ANALYTICS_DAYS;
use service_core::config::{self as core_config, get_env, get_optional_env, is_production};
use service_core::error::AppError;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ANALYTICS_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct SessionServiceConfig {
    pub common: core_config::Config,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub analysis: AnalysisConfig,
    pub analytics_default_days: i64,
    /// Any origin when unset.
    pub cors_allowed_origin: Option<String>,
    /// Attach internal error text to 5xx bodies. Never on in production.
    pub diagnostics: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Mock,
}

#[derive(Debug, Clone, Default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub provider: ProviderKind,
    pub gemini_api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<i32>,
}

impl Default for SessionServiceConfig {
    /// In-memory store and mock provider; suitable for local runs and tests.
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            store: StoreBackend::Memory,
            mongodb: MongoConfig {
                uri: String::new(),
                database: "wellness_db".to_string(),
            },
            analysis: AnalysisConfig {
                provider: ProviderKind::Mock,
                gemini_api_key: String::new(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
                timeout_secs: DEFAULT_GEMINI_TIMEOUT_SECS,
                temperature: None,
                max_output_tokens: None,
            },
            analytics_default_days: DEFAULT_ANALYTICS_DAYS,
            cors_allowed_origin: None,
            diagnostics: false,
        }
    }
}

impl SessionServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = is_production();

        let store = match get_optional_env("SESSION_STORE").as_deref() {
            None | Some("mongo") => StoreBackend::Mongo,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "SESSION_STORE must be 'mongo' or 'memory', got '{}'",
                    other
                )));
            }
        };

        let mongodb = match store {
            StoreBackend::Mongo => MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("wellness_db"), is_prod)?,
            },
            StoreBackend::Memory => MongoConfig::default(),
        };

        let provider = match get_optional_env("ANALYSIS_PROVIDER").as_deref() {
            None | Some("gemini") => ProviderKind::Gemini,
            Some("mock") => ProviderKind::Mock,
            Some(other) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "ANALYSIS_PROVIDER must be 'gemini' or 'mock', got '{}'",
                    other
                )));
            }
        };

        let gemini_api_key = match provider {
            ProviderKind::Gemini => get_env("GEMINI_API_KEY", None, is_prod)?,
            ProviderKind::Mock => String::new(),
        };

        let analysis = AnalysisConfig {
            provider,
            gemini_api_key,
            model: get_optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            timeout_secs: parse_optional("GEMINI_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS),
            temperature: parse_optional("GEMINI_TEMPERATURE")?,
            max_output_tokens: parse_optional("GEMINI_MAX_OUTPUT_TOKENS")?,
        };

        let diagnostics = !is_prod
            && get_optional_env("APP_DIAGNOSTICS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false);

        let analytics_default_days =
            parse_optional("ANALYTICS_DEFAULT_DAYS")?.unwrap_or(DEFAULT_ANALYTICS_DAYS);
        if !(1..=MAX_ANALYTICS_DAYS).contains(&analytics_default_days) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ANALYTICS_DEFAULT_DAYS must be between 1 and {}",
                MAX_ANALYTICS_DAYS
            )));
        }

        Ok(SessionServiceConfig {
            common,
            store,
            mongodb,
            analysis,
            analytics_default_days,
            cors_allowed_origin: get_optional_env("CORS_ALLOWED_ORIGIN"),
            diagnostics,
        })
    }
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, AppError> {
    match get_optional_env(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value '{}'", key, raw))
        }),
    }
}
