//! Jobs provider registration

use crate::api::JobsApi;
use crate::job_definition::JobDefinitionController;
use scwflow_cloud::{ProviderConfig, ProviderRegistry};
use std::sync::Arc;

/// Serverless Jobs provider
pub struct JobsProvider {
    api: Arc<dyn JobsApi>,
    meta: ProviderConfig,
}

impl JobsProvider {
    pub fn new(api: Arc<dyn JobsApi>, meta: ProviderConfig) -> Self {
        Self { api, meta }
    }

    pub fn name(&self) -> &str {
        "jobs"
    }

    pub fn display_name(&self) -> &str {
        "Serverless Jobs"
    }

    pub fn registry(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(JobDefinitionController::new(
            self.api.clone(),
            self.meta.clone(),
        )));
        tracing::debug!("Registered jobs controllers for region {}", self.meta.region);
        registry
    }
}
