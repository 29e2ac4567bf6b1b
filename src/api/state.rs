use std::sync::Arc;

use crate::sample::PopulationSampler;
use crate::store::ResultStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResultStore>,
    pub sampler: Arc<PopulationSampler>,
}

impl AppState {
    pub fn new(store: Arc<dyn ResultStore>, sampler: PopulationSampler) -> Self {
        Self {
            store,
            sampler: Arc::new(sampler),
        }
    }
}
