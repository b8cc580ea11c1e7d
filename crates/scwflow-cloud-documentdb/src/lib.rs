//! DocumentDB controllers for scwflow
//!
//! Implements the resource controllers of the managed DocumentDB service
//! (FerretDB-compatible MongoDB) on top of the `scwflow-cloud` core.
//!
//! # Resources
//!
//! - `documentdb_instance`: the cluster itself, with in-place upgrades
//! - `documentdb_database`, `documentdb_user`, `documentdb_privilege`:
//!   children serialized on their instance
//! - `documentdb_private_network_endpoint`: private network attachment
//! - `documentdb_read_replica`: replica with direct and private endpoints
//!
//! # Example
//!
//! ```ignore
//! use scwflow_cloud::{Context, Operation, ProviderConfig, ResourceData};
//! use scwflow_cloud_documentdb::DocumentDbProvider;
//!
//! let provider = DocumentDbProvider::new(api, ProviderConfig::default());
//! let registry = provider.registry();
//!
//! let mut data = ResourceData::new(serde_json::json!({
//!     "engine": "FerretDB-1",
//!     "node_type": "docdb-play2-pico",
//!     "volume_size_in_gb": 20,
//! }));
//! registry
//!     .dispatch("documentdb_instance", Operation::Create, &Context::background(), &mut data)
//!     .await?;
//! ```

pub mod api;
pub mod data_sources;
pub mod database;
pub mod helpers;
pub mod instance;
pub mod private_network_endpoint;
pub mod privilege;
pub mod provider;
pub mod read_replica;
pub mod user;
pub mod waiters;

pub use api::DocumentDbApi;
pub use helpers::{
    DocumentDb, PrivilegeId, parse_database_id, parse_privilege_id, parse_user_id,
};
pub use provider::DocumentDbProvider;
pub use waiters::{InstanceWaiter, wait_for_instance, wait_for_read_replica};
