//! Application configuration management.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de::Error as _};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Ledger behaviour (custody names, VAT).
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Employees allowed to hold cash custody for a payment.
    ///
    /// Accepts a list or a comma separated string so it can be set from a single
    /// environment variable.
    #[serde(default, deserialize_with = "names_list")]
    pub custodians: Vec<String>,
    /// VAT rate applied when splitting TVA invoices into subtotal and tax.
    /// Must not be negative.
    #[serde(default = "default_vat_rate", deserialize_with = "non_negative_rate")]
    pub vat_rate: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            custodians: Vec::new(),
            vat_rate: default_vat_rate(),
        }
    }
}

fn default_vat_rate() -> Decimal {
    Decimal::new(19, 2)
}

fn non_negative_rate<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let rate = <Decimal as Deserialize>::deserialize(deserializer)?;
    if rate < Decimal::ZERO {
        return Err(D::Error::custom(format!(
            "vat_rate must not be negative, got {rate}"
        )));
    }
    Ok(rate)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NamesInput {
    List(Vec<String>),
    Csv(String),
}

fn names_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match NamesInput::deserialize(deserializer)? {
        NamesInput::List(names) => names,
        NamesInput::Csv(csv) => csv.split(',').map(str::to_string).collect(),
    };

    Ok(raw
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("QUARRY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
