use anyhow::Result;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::config::DeskflowConfig;
use crate::http::BackendClient;
use crate::services::{RestBackend, RestResource, WorkflowBackend};

pub mod config;
pub mod dashboard;
pub mod memos;
pub mod notifications;
pub mod suggestions;
pub mod workflow;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Everything a command needs to talk to the backend as the configured actor.
pub struct Session {
    pub config: DeskflowConfig,
    pub client: Arc<BackendClient>,
    pub auth: AuthContext,
}

impl Session {
    pub fn connect() -> Result<Self> {
        let config = crate::config::config()?.clone();
        Self::from_config(config)
    }

    pub fn from_config(config: DeskflowConfig) -> Result<Self> {
        let client = Arc::new(BackendClient::new(&config.backend)?);
        let auth = config.auth_context();
        tracing::debug!(
            actor = %auth.actor(),
            role = %auth.role(),
            base_url = %client.base_url(),
            "Session ready"
        );
        Ok(Self {
            config,
            client,
            auth,
        })
    }

    pub fn backend<W: RestResource>(&self) -> Arc<dyn WorkflowBackend<W>> {
        Arc::new(RestBackend::<W>::new(self.client.clone()))
    }
}
