use crate::scopes::ScopeSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

const REDACTED: &str = "<redacted>";

/// Top-level configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub modules: ModulesConfig,
    pub logging: LoggingConfig,
}

/// Arc-wrapped config, cheap to clone into slices and handlers.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub identity: IdentityConfig,
}

/// Token signing and the registered API clients.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub jwt: JwtConfig,
    pub clients: Vec<ClientConfig>,
}

/// HS256 signing parameters.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: Option<String>,
    pub ttl_seconds: u64,
    pub clock_skew_seconds: u64,
}

/// A client allowed to request tokens with the client-credentials grant.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: ScopeSet,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    pub catalog: Vec<CatalogEntry>,
}

/// A module known to the platform, as provisioned at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub technical_name: String,
    pub version: String,
    #[serde(default = "enabled_by_default")]
    pub installed: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Default module-owned settings, restored by a reset without `keepData`.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

const fn enabled_by_default() -> bool {
    true
}

/// Log output of the server binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub env_filter: Option<String>,
    pub path: Option<PathBuf>,
    pub json: bool,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 8080, ssl: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "modhub".to_owned(),
            audience: None,
            ttl_seconds: 3600,
            clock_skew_seconds: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), env_filter: None, path: None, json: false }
    }
}

// --- Debug without secrets ---

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &REDACTED)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("scopes", &self.scopes)
            .finish()
    }
}
