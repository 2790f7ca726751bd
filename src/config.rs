//! Application configuration
//!
//! Loaded from a TOML file (`~/.config/takecharge/config.toml` by default).
//! Every section falls back to defaults, so an empty file is a valid config.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::booking::{PricingPolicy, TaxPolicy};
use crate::domain::geo::Coordinate;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "TAKECHARGE_CONFIG";

/// Default config path: `<config dir>/takecharge/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("takecharge")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub catalog: CatalogConfig,
    pub pricing: PricingConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        toml::from_str(&raw).map_err(|e| format!("invalid config {}: {}", path.display(), e))
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, raw).map_err(|e| format!("cannot write {}: {}", path.display(), e))
    }
}

// ── Server ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

// ── Database ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    Sqlite,
    Postgres,
    /// Process-local DashMap storage, nothing is persisted
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub driver: DatabaseDriver,
    pub sqlite_path: String,
    /// Full connection URL; wins over `sqlite_path` when set
    pub url: Option<String>,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::Sqlite,
            sqlite_path: "./takecharge.db".to_string(),
            url: None,
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        match self.driver {
            DatabaseDriver::Memory => "memory".to_string(),
            DatabaseDriver::Postgres => "postgres://localhost/takecharge".to_string(),
            DatabaseDriver::Sqlite => format!("sqlite://{}?mode=rwc", self.sqlite_path),
        }
    }
}

// ── Logging ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ── Security ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HS256 secret shared with the auth provider
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "super-secret-key-change-in-production".to_string(),
            jwt_issuer: None,
        }
    }
}

// ── Station catalog ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Open Charge Map key. Without it every lookup returns an empty list.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub default_radius_km: f64,
    pub default_max_results: u32,
    pub fallback_center: Coordinate,
    /// Serve the bundled sample stations when the directory returns nothing
    pub use_sample_fallback: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openchargemap.io/v3".to_string(),
            timeout_secs: 10,
            default_radius_km: 10.0,
            default_max_results: 50,
            fallback_center: Coordinate::new(13.0827, 80.2707),
            use_sample_fallback: true,
        }
    }
}

// ── Pricing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub platform_fee: Decimal,
    pub tax: TaxPolicy,
    pub modification_surcharge: Decimal,
    pub charging_efficiency: Decimal,
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let policy = PricingPolicy::default();
        Self {
            platform_fee: policy.platform_fee,
            tax: policy.tax,
            modification_surcharge: policy.modification_surcharge,
            charging_efficiency: policy.charging_efficiency,
            currency: "USD".to_string(),
        }
    }
}

impl PricingConfig {
    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            platform_fee: self.platform_fee,
            tax: self.tax,
            modification_surcharge: self.modification_surcharge,
            charging_efficiency: self.charging_efficiency,
        }
    }
}

// ── Email ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Resend API key. Without it emails are logged instead of sent.
    pub api_key: Option<String>,
    pub base_url: String,
    pub from: String,
    /// Public URL of the web client, used for "View Booking" links
    pub app_base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.resend.com".to_string(),
            from: "TakeCharge <noreply@takecharge.com>".to_string(),
            app_base_url: "http://localhost:4028".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.server.api_port, 8080);
        assert_eq!(cfg.database.driver, DatabaseDriver::Sqlite);
        assert_eq!(cfg.pricing.platform_fee, dec!(2.50));
        assert!(cfg.catalog.api_key.is_none());
        assert!(cfg.email.api_key.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let raw = r#"
            [server]
            api_port = 9090

            [pricing]
            platform_fee = "3.00"
            tax = { kind = "fixed", value = "1.68" }
        "#;
        let cfg: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.server.api_port, 9090);
        assert_eq!(cfg.server.api_host, "0.0.0.0");
        assert_eq!(cfg.pricing.platform_fee, dec!(3.00));
        assert_eq!(cfg.pricing.tax, TaxPolicy::Fixed(dec!(1.68)));
        assert_eq!(cfg.pricing.modification_surcharge, dec!(2.50));
    }

    #[test]
    fn connection_url_per_driver() {
        let mut db = DatabaseSection::default();
        assert_eq!(db.connection_url(), "sqlite://./takecharge.db?mode=rwc");
        db.driver = DatabaseDriver::Memory;
        assert_eq!(db.connection_url(), "memory");
        db.url = Some("postgres://db/prod".into());
        assert_eq!(db.connection_url(), "postgres://db/prod");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.catalog.api_key = Some("ocm-key".into());
        cfg.logging.format = "json".into();
        cfg.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.catalog.api_key.as_deref(), Some("ocm-key"));
        assert_eq!(loaded.logging.format, "json");
        assert_eq!(loaded.pricing.tax, cfg.pricing.tax);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load(Path::new("/nonexistent/takecharge.toml")).unwrap_err();
        assert!(err.contains("cannot read"));
    }
}
