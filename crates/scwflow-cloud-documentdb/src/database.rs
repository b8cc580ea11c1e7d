//! `documentdb_database` controller

use crate::api::{CreateDatabaseRequest, Database, DeleteDatabaseRequest, ListDatabasesRequest};
use crate::helpers::{DocumentDb, new_instance_child_id, parse_database_id};
use async_trait::async_trait;
use scwflow_cloud::{
    Attribute, CloudError, Context, LocalityCheck, Operation, Presence, ProviderConfig,
    ResourceController, ResourceData, ResourceDiff, Result, ResultExt, Schema, diff, expand_id,
    parse_regional, random_name, with_parent_ready,
};
use serde::Deserialize;

pub const KIND: &str = "documentdb_database";

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSpec {
    #[serde(default)]
    instance_id: String,
    #[serde(default)]
    name: Option<String>,
}

pub struct DatabaseController {
    db: DocumentDb,
}

impl DatabaseController {
    pub fn new(db: DocumentDb) -> Self {
        Self { db }
    }

    /// Looks the database up by name; `None` when the instance has no such
    /// database
    async fn find(
        &self,
        ctx: &Context,
        region: &str,
        instance_id: &str,
        name: &str,
    ) -> Result<Option<Database>> {
        let req = ListDatabasesRequest {
            region: region.to_string(),
            instance_id: instance_id.to_string(),
            name: Some(name.to_string()),
        };
        let databases = ctx
            .run(self.db.api().list_databases(req))
            .await
            .context("listing documentdb databases")?;
        Ok(databases.into_iter().find(|d| d.name == name))
    }
}

#[async_trait]
impl ResourceController for DatabaseController {
    fn kind(&self) -> &str {
        KIND
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute(
                "instance_id",
                Attribute::required_string()
                    .force_new()
                    .suppress_diff(diff::locality)
                    .describe("Instance on which the database is created"),
            )
            .with_attribute(
                "name",
                Attribute::optional_string()
                    .computed()
                    .force_new()
                    .describe("Database name, generated when left blank"),
            )
            .with_attribute("owner", Attribute::computed_string())
            .with_attribute(
                "managed",
                Attribute::optional_bool().with_presence(Presence::Computed),
            )
            .with_attribute(
                "size",
                Attribute::optional_int().with_presence(Presence::Computed),
            )
            .with_attribute("region", Attribute::region())
    }

    fn customize_diff(&self, diff: &ResourceDiff, meta: &ProviderConfig) -> Result<()> {
        LocalityCheck::new(["instance_id"]).check(diff, meta)
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let spec: DatabaseSpec = data.decode()?;
        let region = self.db.region(data, Some(spec.instance_id.as_str()));
        let instance_id = expand_id(&spec.instance_id);
        let name = spec
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| random_name("database"));

        let api = self.db.api();
        let waiter =
            self.db
                .instance_waiter(ctx, &region, &instance_id, data.timeout(Operation::Create));
        let req = CreateDatabaseRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name,
        };
        let database = with_parent_ready(&waiter, || async move {
            ctx.run(api.create_database(req))
                .await
                .context("creating documentdb database")
        })
        .await?;

        data.set_id(new_instance_child_id(&region, &instance_id, &database.name));
        tracing::info!("Created documentdb database {} on instance {}", database.name, instance_id);
        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let (instance, name) = parse_database_id(data.require_id()?)?;
        let instance = parse_regional(&instance)?;

        let waiter = self.db.instance_waiter(
            ctx,
            &instance.region,
            &instance.id,
            data.timeout(Operation::Read),
        );
        match waiter.wait().await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!("instance {} is gone, removing database {} from state", instance, name);
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("waiting for documentdb instance")),
        }

        let database = self
            .find(ctx, &instance.region, &instance.id, &name)
            .await?
            .ok_or_else(|| {
                CloudError::NotFound(format!("database {:?} on instance {}", name, instance))
            })?;

        data.set("instance_id", instance.to_string())?;
        data.set("name", &database.name)?;
        data.set("owner", &database.owner)?;
        data.set("managed", database.managed)?;
        data.set("size", database.size)?;
        data.set("region", &instance.region)?;
        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        // Every user-set attribute forces replacement.
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let (instance, name) = parse_database_id(data.require_id()?)?;
        let instance = parse_regional(&instance)?;

        let api = self.db.api();
        let waiter = self.db.instance_waiter(
            ctx,
            &instance.region,
            &instance.id,
            data.timeout(Operation::Delete),
        );
        let req = DeleteDatabaseRequest {
            region: instance.region.clone(),
            instance_id: instance.id.clone(),
            name,
        };
        let result = with_parent_ready(&waiter, || async move {
            match ctx.run(api.delete_database(req)).await {
                Err(e) if e.is_not_found() => Ok(()),
                other => other,
            }
        })
        .await;

        match result {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("deleting documentdb database")),
        }
        data.clear_id();
        Ok(())
    }
}
