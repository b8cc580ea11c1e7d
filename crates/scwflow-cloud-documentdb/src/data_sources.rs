//! Read-only lookups of existing instances and databases

use crate::api::ListInstancesRequest;
use crate::database::DatabaseController;
use crate::helpers::{DocumentDb, new_instance_child_id};
use crate::instance::{InstanceController, endpoints_attribute};
use async_trait::async_trait;
use scwflow_cloud::{
    Attribute, AttributeType, CloudError, Context, DataSourceController, Presence,
    ResourceController, ResourceData, Result, ResultExt, Schema, diff, expand_id,
    new_regional_string,
};

pub struct InstanceDataSource {
    db: DocumentDb,
}

impl InstanceDataSource {
    pub fn new(db: DocumentDb) -> Self {
        Self { db }
    }

    async fn find_by_name(
        &self,
        ctx: &Context,
        region: &str,
        data: &ResourceData,
        name: &str,
    ) -> Result<String> {
        let req = ListInstancesRequest {
            region: region.to_string(),
            project_id: self.db.project_id(data),
            name: Some(name.to_string()),
        };
        let instances = ctx
            .run(self.db.api().list_instances(req))
            .await
            .context("listing documentdb instances")?;

        let mut matching = instances.into_iter().filter(|i| i.name == name);
        match (matching.next(), matching.next()) {
            (Some(instance), None) => Ok(instance.id),
            (None, _) => Err(CloudError::NotFound(format!(
                "no documentdb instance named {:?} in {}",
                name, region
            ))),
            (Some(_), Some(_)) => Err(CloudError::invalid_attribute(
                "name",
                format!("more than one documentdb instance is named {:?}", name),
            )),
        }
    }
}

#[async_trait]
impl DataSourceController for InstanceDataSource {
    fn kind(&self) -> &str {
        crate::instance::KIND
    }

    fn schema(&self) -> Schema {
        let computed = |kind| Attribute::new(kind, Presence::Computed);
        Schema::new()
            .with_attribute(
                "instance_id",
                Attribute::optional_string().suppress_diff(diff::locality),
            )
            .with_attribute("name", Attribute::optional_string().computed())
            .with_attribute("engine", Attribute::computed_string())
            .with_attribute("node_type", Attribute::computed_string())
            .with_attribute("is_ha_cluster", computed(AttributeType::Bool))
            .with_attribute(
                "tags",
                computed(AttributeType::List(Box::new(AttributeType::String))),
            )
            .with_attribute("volume_type", Attribute::computed_string())
            .with_attribute("volume_size_in_gb", computed(AttributeType::Int))
            .with_attribute("telemetry_enabled", computed(AttributeType::Bool))
            .with_attribute("endpoints", endpoints_attribute())
            .with_attribute("region", Attribute::region())
            .with_attribute("project_id", Attribute::project_id())
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let by_id = data.get_str("instance_id").filter(|s| !s.is_empty());
        let region = self.db.region(data, by_id.as_deref());

        let instance_id = match (by_id, data.get_str("name")) {
            (Some(id), _) => expand_id(&id),
            (None, Some(name)) => self.find_by_name(ctx, &region, data, &name).await?,
            (None, None) => {
                return Err(CloudError::validation(
                    "one of instance_id or name must be set",
                ));
            }
        };

        let id = new_regional_string(&region, &instance_id);
        data.set_id(id.clone());
        data.set("instance_id", &id)?;

        InstanceController::new(self.db.clone()).read(ctx, data).await?;
        if data.id().is_none() {
            return Err(CloudError::NotFound(format!("documentdb instance {}", id)));
        }
        Ok(())
    }
}

pub struct DatabaseDataSource {
    db: DocumentDb,
}

impl DatabaseDataSource {
    pub fn new(db: DocumentDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DataSourceController for DatabaseDataSource {
    fn kind(&self) -> &str {
        crate::database::KIND
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute(
                "instance_id",
                Attribute::required_string().suppress_diff(diff::locality),
            )
            .with_attribute("name", Attribute::required_string())
            .with_attribute("owner", Attribute::computed_string())
            .with_attribute(
                "managed",
                Attribute::new(AttributeType::Bool, Presence::Computed),
            )
            .with_attribute("size", Attribute::new(AttributeType::Int, Presence::Computed))
            .with_attribute("region", Attribute::region())
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let instance_id = data
            .get_str("instance_id")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CloudError::invalid_attribute("instance_id", "instance_id is required"))?;
        let name = data
            .get_str("name")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CloudError::invalid_attribute("name", "name is required"))?;
        let region = self.db.region(data, Some(instance_id.as_str()));
        let id = new_instance_child_id(&region, &expand_id(&instance_id), &name);

        // Only a successful read marks the database as found.
        let mut found = data.clone();
        found.set_id(id.clone());
        if let Err(e) = DatabaseController::new(self.db.clone())
            .read(ctx, &mut found)
            .await
        {
            data.clear_id();
            return Err(e);
        }
        if found.id().is_none() {
            data.clear_id();
            return Err(CloudError::NotFound(format!("documentdb database {}", id)));
        }

        *data = found;
        Ok(())
    }
}
