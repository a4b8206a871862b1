//! Widget configuration.
//!
//! `WidgetConfig` is supplied once at embed time and never mutated afterwards.
//! It is passed explicitly (usually as `Arc<WidgetConfig>`) into every component
//! that needs it.
//!
//! # Examples
//!
//! ## Customize with the builder
//! ```rust
//! use consenthub::config::{BannerPosition, WidgetConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = WidgetConfig::builder()
//!     .client_id("acme-shop")
//!     .api_endpoint("https://consent.example.com/api")
//!     .position(BannerPosition::Bottom)
//!     .analytics(true)
//!     .marketing(false)
//!     .language("de")
//!     .company_name("ACME")
//!     .primary_color("#0055ff")
//!     .build()?;
//! assert!(!cfg.categories.marketing);
//! # Ok(()) }
//! ```
//!
//! ## From the embed JSON
//! ```rust
//! use consenthub::config::WidgetConfig;
//! let cfg = WidgetConfig::from_json(r#"{
//!     "clientId": "acme-shop",
//!     "apiEndpoint": "https://consent.example.com/api",
//!     "position": "modal",
//!     "categories": { "analytics": true, "marketing": false, "preferences": true }
//! }"#).unwrap();
//! assert_eq!(cfg.client_id, "acme-shop");
//! ```
//!
//! # Errors
//!
//! Validation returns [`ConfigError`] for an empty client id, a non-HTTP(S)
//! endpoint, or a malformed brand color.

use crate::consent::Category;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const DEFAULT_API_ENDPOINT: &str = "https://api.consenthub.io";
const DEFAULT_USER_AGENT: &str = concat!("consenthub/", env!("CARGO_PKG_VERSION"));

/// Where the banner is placed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum BannerPosition {
    Top,
    Bottom,
    Modal,
    /// Floating box in a page corner. Any unrecognized value lands here.
    #[default]
    Corner,
}

impl From<String> for BannerPosition {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "top" => BannerPosition::Top,
            "bottom" => BannerPosition::Bottom,
            "modal" => BannerPosition::Modal,
            _ => BannerPosition::Corner,
        }
    }
}

/// Which optional categories are offered. `necessary` is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryToggles {
    pub analytics: bool,
    pub marketing: bool,
    pub preferences: bool,
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self {
            analytics: true,
            marketing: true,
            preferences: true,
        }
    }
}

impl CategoryToggles {
    /// Returns `true` if `category` is offered to the user.
    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Necessary => true,
            Category::Analytics => self.analytics,
            Category::Marketing => self.marketing,
            Category::Preferences => self.preferences,
        }
    }

    /// Offered categories in display order, `necessary` first.
    pub fn enabled(&self) -> Vec<Category> {
        Category::ALL.into_iter().filter(|c| self.is_enabled(*c)).collect()
    }
}

/// Presentation-only settings, passed through to the presenter untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Branding {
    pub company_name: Option<String>,
    /// `#rgb` or `#rrggbb`.
    pub primary_color: Option<String>,
    pub privacy_policy_url: Option<Url>,
    pub logo_url: Option<Url>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Opaque tenant identifier.
    pub client_id: String,
    /// Base URL of the consent log. Checked by validation.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default)]
    pub position: BannerPosition,
    #[serde(default)]
    pub categories: CategoryToggles,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub branding: Branding,
    /// Timeout of the consent log request.
    #[serde(skip, default = "default_report_timeout")]
    pub report_timeout: Duration,
    /// User agent sent with the consent log request.
    #[serde(skip, default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_report_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            api_endpoint: default_api_endpoint(),
            position: BannerPosition::default(),
            categories: CategoryToggles::default(),
            language: default_language(),
            branding: Branding::default(),
            report_timeout: default_report_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl WidgetConfig {
    pub fn builder() -> WidgetConfigBuilder {
        WidgetConfigBuilder::default()
    }

    /// Parses and validates the embed-time JSON configuration.
    pub fn from_json(json: &str) -> Result<WidgetConfig, ConfigError> {
        let cfg: WidgetConfig = serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        validate(&cfg)?;
        Ok(cfg)
    }

    /// Checks the invariants the builder enforces, for configs assembled by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(self)
    }

    /// URL of the consent log resource (`{api_endpoint}/consent`).
    pub fn consent_url(&self) -> Result<Url, ConfigError> {
        let mut url = endpoint_url(&self.api_endpoint)?;
        let path = format!("{}/consent", url.path().trim_end_matches('/'));
        url.set_path(&path);
        Ok(url)
    }
}

/// Builder for [`WidgetConfig`].
#[derive(Debug, Clone, Default)]
pub struct WidgetConfigBuilder {
    inner: WidgetConfig,
}

impl WidgetConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut WidgetConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn client_id<S: Into<String>>(self, id: S) -> Self { self.map(|c| c.client_id = id.into()) }
    pub fn position(self, p: BannerPosition) -> Self { self.map(|c| c.position = p) }
    pub fn analytics(self, on: bool) -> Self { self.map(|c| c.categories.analytics = on) }
    pub fn marketing(self, on: bool) -> Self { self.map(|c| c.categories.marketing = on) }
    pub fn preferences(self, on: bool) -> Self { self.map(|c| c.categories.preferences = on) }
    pub fn categories(self, t: CategoryToggles) -> Self { self.map(|c| c.categories = t) }
    pub fn language<S: Into<String>>(self, lang: S) -> Self { self.map(|c| c.language = lang.into()) }
    pub fn company_name<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.branding.company_name = Some(name.into())) }
    pub fn primary_color<S: Into<String>>(self, color: S) -> Self { self.map(|c| c.branding.primary_color = Some(color.into())) }
    pub fn branding(self, b: Branding) -> Self { self.map(|c| c.branding = b) }
    pub fn report_timeout(self, t: Duration) -> Self { self.map(|c| c.report_timeout = t) }
    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }

    pub fn api_endpoint<S: Into<String>>(self, endpoint: S) -> Self { self.map(|c| c.api_endpoint = endpoint.into()) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut WidgetConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<WidgetConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Client id must not be empty")]
    EmptyClientId,

    #[error("API endpoint {0:?} is not an http(s) URL")]
    InvalidEndpoint(String),

    #[error("Primary color {0:?} is not #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

fn endpoint_url(endpoint: &str) -> Result<Url, ConfigError> {
    match Url::parse(endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => Ok(url),
        _ => Err(ConfigError::InvalidEndpoint(endpoint.to_string())),
    }
}

fn validate(c: &WidgetConfig) -> Result<(), ConfigError> {
    if c.client_id.trim().is_empty() {
        return Err(ConfigError::EmptyClientId);
    }
    endpoint_url(&c.api_endpoint)?;
    if let Some(color) = &c.branding.primary_color {
        let hex = color.strip_prefix('#').unwrap_or("");
        if !matches!(hex.len(), 3 | 6) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor(color.clone()));
        }
    }
    Ok(())
}
