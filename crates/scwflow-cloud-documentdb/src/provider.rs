//! DocumentDB provider registration

use crate::api::DocumentDbApi;
use crate::data_sources::{DatabaseDataSource, InstanceDataSource};
use crate::database::DatabaseController;
use crate::helpers::DocumentDb;
use crate::instance::InstanceController;
use crate::private_network_endpoint::PrivateNetworkEndpointController;
use crate::privilege::PrivilegeController;
use crate::read_replica::ReadReplicaController;
use crate::user::UserController;
use scwflow_cloud::{ProviderConfig, ProviderRegistry};
use std::sync::Arc;

/// DocumentDB provider
#[derive(Debug, Clone)]
pub struct DocumentDbProvider {
    db: DocumentDb,
}

impl DocumentDbProvider {
    pub fn new(api: Arc<dyn DocumentDbApi>, meta: ProviderConfig) -> Self {
        Self {
            db: DocumentDb::new(api, meta),
        }
    }

    pub fn name(&self) -> &str {
        "documentdb"
    }

    pub fn display_name(&self) -> &str {
        "Managed DocumentDB"
    }

    /// Every DocumentDB resource kind and data source
    pub fn registry(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(InstanceController::new(self.db.clone())));
        registry.register(Arc::new(DatabaseController::new(self.db.clone())));
        registry.register(Arc::new(UserController::new(self.db.clone())));
        registry.register(Arc::new(PrivilegeController::new(self.db.clone())));
        registry.register(Arc::new(PrivateNetworkEndpointController::new(
            self.db.clone(),
        )));
        registry.register(Arc::new(ReadReplicaController::new(self.db.clone())));

        registry.register_data_source(Arc::new(InstanceDataSource::new(self.db.clone())));
        registry.register_data_source(Arc::new(DatabaseDataSource::new(self.db.clone())));

        tracing::debug!(
            "Registered documentdb provider for region {}",
            self.db.meta().region
        );
        registry
    }
}
