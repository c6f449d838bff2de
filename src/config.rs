use crate::adapters::outbound::{
    ProviderChainSettings, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, NOMINATIM_DEFAULT_URL,
    OPENCAGE_DEFAULT_URL, POSITIONSTACK_DEFAULT_URL,
};
use crate::domain::value_objects::GeocodeMode;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Core settings
    pub listen_addr: String,
    pub db_path: String,
    pub debug: bool,

    // Geocoding providers
    pub opencage_api_key: Option<String>,
    pub positionstack_api_key: Option<String>,
    pub opencage_url: String,
    pub positionstack_url: String,
    pub nominatim_url: String,
    pub geocode_timeout_secs: u64,
    pub nominatim_delay_ms: u64,
    pub user_agent: String,
    pub geocode_mode: GeocodeMode,

    // Storefront settings
    pub cart_ttl_secs: u64,
    pub cart_gc_interval_secs: u64,
    pub default_country: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            db_path: "moviestore.db".to_string(),
            debug: false,
            opencage_api_key: None,
            positionstack_api_key: None,
            opencage_url: OPENCAGE_DEFAULT_URL.to_string(),
            positionstack_url: POSITIONSTACK_DEFAULT_URL.to_string(),
            nominatim_url: NOMINATIM_DEFAULT_URL.to_string(),
            geocode_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            nominatim_delay_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            geocode_mode: GeocodeMode::Inline,
            cart_ttl_secs: 86_400,
            cart_gc_interval_secs: 300,
            default_country: "USA".to_string(),
        }
    }
}

impl Config {
    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn nominatim_delay(&self) -> Duration {
        Duration::from_millis(self.nominatim_delay_ms)
    }

    pub fn provider_chain(&self) -> ProviderChainSettings {
        ProviderChainSettings {
            opencage_key: self.opencage_api_key.clone(),
            positionstack_key: self.positionstack_api_key.clone(),
            opencage_url: self.opencage_url.clone(),
            positionstack_url: self.positionstack_url.clone(),
            nominatim_url: self.nominatim_url.clone(),
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the configuration from a variable lookup.
///
/// Unparseable numbers fall back to their defaults; blank keys count as unset.
pub fn load_config_from<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let string = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
    let number = |key: &str, default: u64| {
        var(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    };
    let secret = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    let listen_addr = string("MOVIESTORE_LISTEN_ADDR", &defaults.listen_addr);
    let db_path = string("MOVIESTORE_DB_PATH", &defaults.db_path);
    let debug = var("DEBUG").is_some();

    // Geocoding providers
    let opencage_api_key = secret("OPENCAGE_API_KEY");
    let positionstack_api_key = secret("POSITIONSTACK_API_KEY");
    let opencage_url = string("MOVIESTORE_OPENCAGE_URL", &defaults.opencage_url);
    let positionstack_url = string("MOVIESTORE_POSITIONSTACK_URL", &defaults.positionstack_url);
    let nominatim_url = string("MOVIESTORE_NOMINATIM_URL", &defaults.nominatim_url);
    let geocode_timeout_secs = number("MOVIESTORE_GEOCODE_TIMEOUT_SECS", defaults.geocode_timeout_secs);
    let nominatim_delay_ms = number("MOVIESTORE_NOMINATIM_DELAY_MS", defaults.nominatim_delay_ms);
    let user_agent = string("MOVIESTORE_USER_AGENT", &defaults.user_agent);
    let geocode_mode: GeocodeMode = var("MOVIESTORE_GEOCODE_MODE")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();

    // Storefront settings
    let cart_ttl_secs = number("MOVIESTORE_CART_TTL_SECS", defaults.cart_ttl_secs);
    let cart_gc_interval_secs = number("MOVIESTORE_CART_GC_INTERVAL_SECS", defaults.cart_gc_interval_secs);
    let default_country = var("MOVIESTORE_DEFAULT_COUNTRY")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(defaults.default_country);

    Ok(Config {
        listen_addr,
        db_path,
        debug,
        opencage_api_key,
        positionstack_api_key,
        opencage_url,
        positionstack_url,
        nominatim_url,
        geocode_timeout_secs,
        nominatim_delay_ms,
        user_agent,
        geocode_mode,
        cart_ttl_secs,
        cart_gc_interval_secs,
        default_country,
    })
}
