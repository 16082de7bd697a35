//! Shared application state.

use std::sync::Arc;

use crate::config::Config;
use crate::delegate::DelegationRouter;
use crate::pipeline::PipelineComposer;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub config: Config,
    pub router: Arc<DelegationRouter>,
    pub composer: PipelineComposer,
}

impl AppState {
    pub fn new(config: Config, router: Arc<DelegationRouter>) -> Self {
        Self {
            config,
            composer: PipelineComposer::new(router.clone()),
            router,
        }
    }
}
