//! Controller traits and the registry the host dispatches through

use crate::config::ProviderConfig;
use crate::context::Context;
use crate::error::{CloudError, Result};
use crate::resource_data::{Operation, ResourceData, ResourceDiff};
use crate::schema::Schema;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lifecycle handlers for one resource kind
///
/// Every vendor resource (instance, database, job definition, ...) implements
/// this trait; the host never talks to the vendor API directly.
#[async_trait]
pub trait ResourceController: Send + Sync {
    /// Kind name as used in configuration (e.g. `documentdb_instance`)
    fn kind(&self) -> &str;

    fn schema(&self) -> Schema;

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;

    /// Refreshes `data` from the backend. A resource deleted out of band
    /// clears the id and succeeds.
    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;

    /// Plan-time checks that need no network access
    fn customize_diff(&self, _diff: &ResourceDiff, _meta: &ProviderConfig) -> Result<()> {
        Ok(())
    }
}

/// Read-only lookup of an existing object
#[async_trait]
pub trait DataSourceController: Send + Sync {
    fn kind(&self) -> &str;

    fn schema(&self) -> Schema;

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()>;
}

/// Controllers indexed by kind
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    resources: BTreeMap<String, Arc<dyn ResourceController>>,
    data_sources: BTreeMap<String, Arc<dyn DataSourceController>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, controller: Arc<dyn ResourceController>) {
        let kind = controller.kind().to_string();
        tracing::debug!("Registered resource kind {}", kind);
        self.resources.insert(kind, controller);
    }

    pub fn register_data_source(&mut self, controller: Arc<dyn DataSourceController>) {
        let kind = controller.kind().to_string();
        tracing::debug!("Registered data source {}", kind);
        self.data_sources.insert(kind, controller);
    }

    /// Merges another registry into this one
    pub fn extend(&mut self, other: ProviderRegistry) {
        self.resources.extend(other.resources);
        self.data_sources.extend(other.data_sources);
    }

    pub fn resource(&self, kind: &str) -> Option<Arc<dyn ResourceController>> {
        self.resources.get(kind).cloned()
    }

    pub fn data_source(&self, kind: &str) -> Option<Arc<dyn DataSourceController>> {
        self.data_sources.get(kind).cloned()
    }

    pub fn resource_kinds(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn data_source_kinds(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }

    /// Runs one lifecycle operation of `kind`
    pub async fn dispatch(
        &self,
        kind: &str,
        op: Operation,
        ctx: &Context,
        data: &mut ResourceData,
    ) -> Result<()> {
        let controller = self
            .resource(kind)
            .ok_or_else(|| CloudError::validation(format!("unknown resource kind {:?}", kind)))?;

        let ctx = ctx.with_timeout(data.timeout(op));
        tracing::info!("{} {} {}", op, kind, data.id().unwrap_or("<new>"));

        let result = match op {
            Operation::Create => controller.create(&ctx, data).await,
            Operation::Read => controller.read(&ctx, data).await,
            Operation::Update => controller.update(&ctx, data).await,
            Operation::Delete => controller.delete(&ctx, data).await,
        };

        // A resource gone during update or delete is dropped from state.
        match result {
            Err(e) if e.is_not_found() && matches!(op, Operation::Update | Operation::Delete) => {
                tracing::warn!("{} {} found nothing, removing from state: {}", op, kind, e);
                data.clear_id();
                Ok(())
            }
            other => other,
        }
    }

    /// Plan-time validation: schema validators, then the kind's customizer
    pub fn plan(
        &self,
        kind: &str,
        diff: &ResourceDiff,
        config: &serde_json::Value,
        meta: &ProviderConfig,
    ) -> Result<()> {
        let controller = self
            .resource(kind)
            .ok_or_else(|| CloudError::validation(format!("unknown resource kind {:?}", kind)))?;
        controller.schema().validate(config)?;
        controller.customize_diff(diff, meta)
    }
}
