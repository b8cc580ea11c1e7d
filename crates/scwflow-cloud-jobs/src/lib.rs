//! Serverless Jobs controllers for scwflow
//!
//! A single resource kind, `job_definition`: a container image, a command and
//! resource limits, optionally triggered by a cron schedule.
//!
//! # Example
//!
//! ```ignore
//! use scwflow_cloud::{Context, Operation, ProviderConfig, ResourceData};
//! use scwflow_cloud_jobs::JobsProvider;
//!
//! let registry = JobsProvider::new(api, ProviderConfig::default()).registry();
//! let mut data = ResourceData::new(serde_json::json!({
//!     "cpu_limit": 140,
//!     "memory_limit": 256,
//!     "image_uri": "docker.io/alpine:latest",
//!     "command": "ls",
//!     "timeout": "10m",
//!     "cron": [{ "schedule": "5 4 1 * *", "timezone": "Europe/Paris" }],
//! }));
//! registry
//!     .dispatch("job_definition", Operation::Create, &Context::background(), &mut data)
//!     .await?;
//! ```

pub mod api;
pub mod job_definition;
pub mod provider;

pub use api::JobsApi;
pub use provider::JobsProvider;
