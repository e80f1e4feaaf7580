//! Usage-analytics aggregation for the LLM gateway console dashboard.
//!
//! The pure pipeline lives in [`dashboard`]; [`client`], [`api`] and the
//! `dashboard` binary wrap it for the backend and for HTTP callers.

pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod models;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub config: config::Config,
    pub backend: client::BackendClient,
}

impl AppState {
    pub fn new(config: config::Config) -> anyhow::Result<Self> {
        let backend = client::BackendClient::new(
            &config.backend_url,
            config.access_token.clone(),
            config.backend_max_retries,
        )?;
        Ok(Self { config, backend })
    }
}
