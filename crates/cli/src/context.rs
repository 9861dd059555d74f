//! Resolves the application config and builds the services command
//! handlers call into. Lives separately from `main.rs` so the wiring is
//! unit-testable without going through clap.

use std::sync::Arc;
use std::time::Duration;

use webhook_capture::{CaptureStore, DetectorRegistry};
use webhook_config::{AppConfig, ConfigFlags};
use webhook_core::{Clock, EnvLookup, IdGenerator, PlaceholderResolver, SystemClock, SystemEnv, UuidGenerator};
use webhook_replay::{Dispatcher, ReplayService};
use webhook_templates::{IndexCache, LocalTemplateStore, RemoteTemplateClient, TemplateService};

use crate::errors::CliError;

/// Shared, process-wide injected sources, and the resolved config they
/// were built from.
pub struct AppContext {
    pub config: AppConfig,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub env: Arc<dyn EnvLookup>,
}

impl AppContext {
    pub fn load(config_flag: Option<String>) -> Result<Self, CliError> {
        let flags = ConfigFlags {
            config_path: config_flag,
            ..Default::default()
        };
        let env = SystemEnv;
        let config = webhook_config::load(&flags, &env, webhook_config::real_home_dir().as_deref())?;
        Ok(Self {
            config,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            env: Arc::new(SystemEnv),
        })
    }

    pub fn capture_store(&self) -> Arc<CaptureStore> {
        Arc::new(CaptureStore::new(
            self.config.captures_dir.clone(),
            self.clock.clone(),
            self.ids.clone(),
            webhook_core::CAPTURE_TOOL_VERSION,
        ))
    }

    pub fn detector_registry(&self) -> Arc<DetectorRegistry> {
        Arc::new(DetectorRegistry::with_defaults())
    }

    pub fn replay_service(&self, timeout: Duration) -> Result<ReplayService, CliError> {
        let dispatcher = Dispatcher::new(timeout, MAX_REPLAY_RESPONSE_BYTES)
            .map_err(|err| CliError::Other(anyhow::anyhow!(err)))?;
        Ok(ReplayService::new(self.capture_store(), dispatcher))
    }

    pub fn template_service(&self) -> TemplateService {
        let remote = RemoteTemplateClient::new(
            reqwest::Client::new(),
            webhook_templates::DEFAULT_REMOTE_BASE_URL,
        );
        let local = LocalTemplateStore::new(self.config.templates_dir.clone());
        let cache = IndexCache::new(&self.config.templates_dir);
        let placeholders =
            PlaceholderResolver::new(self.clock.clone(), self.ids.clone(), self.env.clone());
        TemplateService::new(remote, local, cache, self.clock.clone(), self.env.clone(), placeholders)
    }
}

const MAX_REPLAY_RESPONSE_BYTES: usize = 5 * 1024 * 1024;
