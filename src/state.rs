//! Application state: prompts, fallback catalog, optional model client.
//!
//! Everything here is built once at startup and read-only afterwards; handlers
//! share it through `Arc<AppState>`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::catalog::FallbackCatalog;
use crate::config::{load_quiz_config_from_env, model_timeout_from_env, Prompts};
use crate::model::{client_from_env, ModelClient};

#[derive(Clone)]
pub struct AppState {
    pub model: Option<Arc<dyn ModelClient>>,
    pub catalog: FallbackCatalog,
    pub prompts: Prompts,
    pub model_timeout: Duration,
}

impl AppState {
    /// Build state from env: load config, build the catalog, init the model backend.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        // Load TOML config if provided (prompt overrides + extra fallback questions).
        let cfg = load_quiz_config_from_env().unwrap_or_default();

        let catalog = FallbackCatalog::embedded().with_extra(&cfg.fallback);
        let model = client_from_env();
        let model_timeout = model_timeout_from_env();

        info!(
            target: "quizforge",
            fallback_questions = catalog.len(),
            model = model.as_ref().map(|m| m.name()).unwrap_or("none"),
            timeout_secs = model_timeout.as_secs(),
            "Application state ready"
        );

        if catalog.is_empty() {
            warn!(target: "quizforge", "Fallback catalog is empty; only the built-in last-resort questions remain");
        }

        Self::with_parts(model, catalog, cfg.prompts, model_timeout)
    }

    /// Explicit construction, used by tests and embedders.
    pub fn with_parts(
        model: Option<Arc<dyn ModelClient>>,
        catalog: FallbackCatalog,
        prompts: Prompts,
        model_timeout: Duration,
    ) -> Self {
        Self { model, catalog, prompts, model_timeout }
    }
}
