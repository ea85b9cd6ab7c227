use std::sync::Arc;
use std::time::Instant;

use cnp_inference::models::LanguageModel;
use cnp_pipeline::Scheduler;
use cnp_storage::DedupStore;

pub struct AppState {
    pub started_at: Instant,
    pub store: Arc<DedupStore>,
    /// Downstream model whose reachability decides readiness. `None` means
    /// there is nothing to wait for.
    pub model: Option<Arc<dyn LanguageModel>>,
    pub scheduler: Option<Arc<Scheduler>>,
}

impl AppState {
    pub fn new(store: Arc<DedupStore>) -> Self {
        Self {
            started_at: Instant::now(),
            store,
            model: None,
            scheduler: None,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }
}
