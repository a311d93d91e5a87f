use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::auth::{ActorRef, AuthContext, Role};

/// Main configuration structure for deskflow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeskflowConfig {
    /// Dashboard backend connection
    pub backend: BackendConfig,
    /// Who is using this session
    pub session: SessionConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Notification polling
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the REST API, e.g. https://office.example.org/api/
    pub base_url: String,
    /// Bearer token (can be set via DESKFLOW_TOKEN)
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
    /// GET response cache lifetime; 0 disables caching
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Backend id of the signed-in actor
    pub actor_id: String,
    /// Name shown in review history
    pub display_name: Option<String>,
    /// Role used to decide which review controls are offered
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (overridden by RUST_LOG)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    pub poll_interval_seconds: u64,
}

impl Default for DeskflowConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:8000/api/".to_string(),
                token: None, // Will be read from env var or .deskflow-rc
                timeout_seconds: 30,
                rate_limit: RateLimitConfig {
                    requests_per_second: 5,
                    burst_capacity: 10,
                },
                cache_ttl_seconds: 15,
            },
            session: SessionConfig {
                actor_id: "anonymous".to_string(),
                display_name: None,
                role: Role::Staff,
            },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                json_logs: false,
            },
            notifications: NotificationConfig {
                poll_interval_seconds: 60,
            },
        }
    }
}

impl DeskflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (deskflow.toml, .deskflow-rc)
    /// 3. Environment variables (prefixed with DESKFLOW_, nested with __)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&DeskflowConfig::default())?);

        let toml_file = dir.join("deskflow.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file));
        }

        let rc_file = dir.join(".deskflow-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("DESKFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut deskflow_config: DeskflowConfig = builder.build()?.try_deserialize()?;

        // Special handling for the token - the short variable wins
        if let Ok(token) = std::env::var("DESKFLOW_TOKEN") {
            if !token.trim().is_empty() {
                deskflow_config.backend.token = Some(token);
            }
        }

        Ok(deskflow_config)
    }

    /// Authorization context for this session, resolved once at startup.
    pub fn auth_context(&self) -> AuthContext {
        let mut actor = ActorRef::new(self.session.actor_id.clone());
        if let Some(name) = &self.session.display_name {
            actor = actor.with_display_name(name.clone());
        }
        AuthContext::new(actor, self.session.role)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<DeskflowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = DeskflowConfig::load_env_file();
        DeskflowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static DeskflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
