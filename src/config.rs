//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` (every field has a default, so the file is
//! optional) and then applies overrides from the operator environment.
//! Secrets (site credentials, Telegram token) are referenced by env-var
//! name in the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub risk: RiskConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub site: SiteConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Minutes between scan cycles. Floored to 1 at use sites.
    pub scan_interval_min: u64,
    /// Ask the executor to simulate without real submission.
    pub dry_run: bool,
    /// Verbose logging (raises the default EnvFilter to debug).
    pub debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            scan_interval_min: 10,
            dry_run: false,
            debug: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RiskConfig {
    pub max_daily_loss: Decimal,
    pub max_stake: Decimal,
    pub min_balance: Decimal,
    pub max_bets_per_day: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss: Decimal::from(50),
            max_stake: Decimal::from(5),
            min_balance: Decimal::from(2),
            max_bets_per_day: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub state_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: crate::storage::DEFAULT_STATE_FILE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub phone_env: String,
    pub password_env: String,
    /// Seed for the paper site's fixture generator.
    pub paper_seed: u64,
    /// Balance credited to a fresh paper-site account.
    pub opening_balance: Decimal,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            phone_env: "SITE_PHONE".to_string(),
            password_env: "SITE_PASSWORD".to_string(),
            paper_seed: 42,
            opening_balance: Decimal::from(100),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertsConfig {
    pub telegram_bot_token_env: String,
    pub telegram_chat_id_env: String,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            telegram_chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
        }
    }
}

/// Site login credentials resolved from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub phone: SecretString,
    pub password: SecretString,
}

/// Telegram notifier settings resolved from the environment.
pub struct TelegramSettings {
    pub bot_token: SecretString,
    pub chat_id: String,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to built-in
    /// defaults when the file is absent, then apply env overrides.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {path}"))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {path}"))?
        } else {
            AppConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Operator env overrides for the enumerated tunables. Unparsable
    /// values are ignored with a warning rather than failing startup.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<u64>("SCAN_INTERVAL_MIN") {
            self.agent.scan_interval_min = v;
        }
        if let Some(v) = env_parse::<Decimal>("MAX_DAILY_LOSS") {
            self.risk.max_daily_loss = v;
        }
        if let Some(v) = env_parse::<Decimal>("MAX_STAKE") {
            self.risk.max_stake = v;
        }
        if let Some(v) = env_parse::<Decimal>("MIN_BALANCE") {
            self.risk.min_balance = v;
        }
        if let Some(v) = env_parse::<u32>("MAX_BETS_PER_DAY") {
            self.risk.max_bets_per_day = v;
        }
        if let Ok(v) = std::env::var("DRY_RUN") {
            self.agent.dry_run = v == "true";
        }
        if let Ok(v) = std::env::var("DEBUG") {
            self.agent.debug = v == "true";
        }
        if let Some(v) = env_parse::<u16>("PORT") {
            self.server.port = v;
        }
        if let Ok(v) = std::env::var("STATE_PATH") {
            self.storage.state_path = v;
        }
    }

    /// Interval between cycles, floored to one minute.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.agent.scan_interval_min.max(1) * 60)
    }

    /// Site credentials, if both env vars are set. Missing credentials
    /// are a per-cycle login failure, not a startup error.
    pub fn site_credentials(&self) -> Option<Credentials> {
        let phone = std::env::var(&self.site.phone_env).ok()?;
        let password = std::env::var(&self.site.password_env).ok()?;
        Some(Credentials {
            phone: SecretString::new(phone),
            password: SecretString::new(password),
        })
    }

    /// Telegram settings, if configured. `None` disables notifications.
    pub fn telegram(&self) -> Option<TelegramSettings> {
        let token = std::env::var(&self.alerts.telegram_bot_token_env).ok()?;
        let chat_id = std::env::var(&self.alerts.telegram_chat_id_env).ok()?;
        Some(TelegramSettings {
            bot_token: SecretString::new(token),
            chat_id,
        })
    }
}

/// Parse an env var, warning (and skipping) on malformed values.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable env override");
            None
        }
    }
}
