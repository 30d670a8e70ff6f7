use std::sync::Arc;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    repositories::InMemoryQuizCache,
    services::{CompletionBackend, CompletionClient, OpenAiCompatibleBackend, QuizOrchestrator},
};

#[derive(Clone)]
pub struct AppState {
    orchestrator: Option<Arc<QuizOrchestrator>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the orchestrator to the configured completion endpoint. Without a credential
    /// the state is still built and every quiz request answers 503.
    pub fn new(config: Config) -> Self {
        let backend = match &config.completion_api_key {
            Some(key) => Some(Arc::new(OpenAiCompatibleBackend::new(
                key,
                &config.completion_api_base,
            )) as Arc<dyn CompletionBackend>),
            None => {
                log::error!("GOOGLE_API_KEY is not set; quiz generation is disabled");
                None
            }
        };

        Self::build(config, backend)
    }

    /// Same wiring as [`AppState::new`] but against a caller-supplied backend.
    pub fn with_backend(config: Config, backend: Arc<dyn CompletionBackend>) -> Self {
        Self::build(config, Some(backend))
    }

    fn build(config: Config, backend: Option<Arc<dyn CompletionBackend>>) -> Self {
        let orchestrator = backend.map(|backend| {
            let completion = Arc::new(CompletionClient::new(
                backend,
                config.model_candidates(),
                config.completion_passes,
                config.pass_pause(),
            ));
            let cache = Arc::new(InMemoryQuizCache::new(config.cache_ttl()));

            Arc::new(QuizOrchestrator::new(
                completion,
                cache,
                config.completion_workers,
                config.branch_timeout(),
                config.sampling.clone(),
            ))
        });

        Self {
            orchestrator,
            config: Arc::new(config),
        }
    }

    pub fn orchestrator(&self) -> AppResult<&QuizOrchestrator> {
        self.orchestrator.as_deref().ok_or_else(|| {
            AppError::UpstreamConfigError("completion credential is missing".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        fixtures::{mcq_payload, tf_payload},
        stubs::ScriptedBackend,
    };

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_missing_credential_disables_generation() {
        let mut config = Config::test_config();
        config.completion_api_key = None;

        let state = AppState::new(config);

        assert!(matches!(
            state.orchestrator(),
            Err(AppError::UpstreamConfigError(_))
        ));
    }

    #[test]
    fn test_injected_backend_enables_generation() {
        let backend = Arc::new(ScriptedBackend::new(mcq_payload(1), tf_payload(1)));
        let state = AppState::with_backend(Config::test_config(), backend);

        assert!(state.orchestrator().is_ok());
    }
}
