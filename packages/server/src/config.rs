use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use common::gateway::GatewayConfig;
use common::pipeline::LoadPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StagingConfig {
    /// Directory holding the current upload batch.
    pub dir: String,
    /// Maximum multipart body size for one upload batch, in bytes.
    pub max_body_bytes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Strict (default) aborts the batch on one unreadable file; lenient
    /// skips it and reports the skipped filenames.
    pub load_policy: LoadPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub staging: StagingConfig,
    pub analysis: AnalysisConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", vec!["*".to_string()])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("staging.dir", "./staging")?
            .set_default("staging.max_body_bytes", 64 * 1024 * 1024)?
            .set_default("analysis.load_policy", "strict")?
            .set_default("gateway.base_url", "https://api.openai.com")?
            .set_default("gateway.model", "gpt-4o-mini")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment. The API credential is expected to
            // arrive this way (PLATELENS__GATEWAY__API_KEY) and is never
            // written to config files or logs.
            .add_source(Environment::with_prefix("PLATELENS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
