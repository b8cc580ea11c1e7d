//! scwflow cloud core
//!
//! Provider-agnostic pieces of the reconciliation core: the host asks a
//! [`ResourceController`] to create, read, update or delete one resource and
//! the controller converges the vendor API towards the desired attributes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │            host reconciliation engine            │
//! │       (plan / apply / state persistence)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │  ProviderRegistry::dispatch / plan
//! ┌─────────────────▼───────────────────────────────┐
//! │                 scwflow-cloud                    │
//! │  locality codec · diff suppressors · customizer  │
//! │  waiter · retry envelope · schema · diagnostics  │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  documentdb   │ │     jobs      │
//! │  controllers  │ │  controller   │
//! └───────────────┘ └───────────────┘
//! ```

pub mod config;
pub mod context;
pub mod customize;
pub mod diagnostic;
pub mod diff;
pub mod duration;
pub mod error;
pub mod locality;
pub mod logging;
pub mod naming;
pub mod provider;
pub mod resource_data;
pub mod retry;
pub mod schema;
pub mod waiter;

// Re-exports
pub use config::{ProviderConfig, WaitConfig};
pub use context::{Canceller, Context};
pub use customize::LocalityCheck;
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use duration::{format_duration, parse_duration};
pub use error::{ApiError, CloudError, ErrorKind, Result, ResultExt, is_404, is_409};
pub use naming::random_name;
pub use locality::{
    RegionalId, compare_localities, expand_id, get_locality, new_regional, new_regional_string,
    parse_localized, parse_regional,
};
pub use provider::{DataSourceController, ProviderRegistry, ResourceController};
pub use resource_data::{Operation, ResourceData, ResourceDiff, Timeouts};
pub use retry::retry_on_conflict;
pub use schema::{Attribute, AttributeType, Presence, Schema};
pub use waiter::{Lifecycle, ParentWait, WaitOptions, wait_for, with_parent_ready};
