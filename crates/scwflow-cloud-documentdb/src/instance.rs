//! `documentdb_instance` controller
//!
//! Updates are split in two streams: one metadata request (name, tags) and a
//! sequence of upgrade requests, one dimension at a time, waiting for the
//! instance to be ready before each of them.

use crate::api::{
    CreateInstanceRequest, DeleteInstanceRequest, Instance, InstanceSetting, TELEMETRY_SETTING,
    UpdateInstanceRequest, UpgradeInstanceRequest, UpgradeTarget, VolumeType,
};
use crate::helpers::{DocumentDb, flatten_endpoint};
use crate::waiters::wait_for_instance;
use async_trait::async_trait;
use scwflow_cloud::schema::validators;
use scwflow_cloud::{
    Attribute, AttributeType, CloudError, Context, Operation, ParentWait, Presence,
    ProviderConfig, ResourceController, ResourceData, ResourceDiff, Result, ResultExt, Schema,
    diff, new_regional_string, parse_regional, random_name,
};
use serde::Deserialize;
use serde_json::{Value, json};

pub const KIND: &str = "documentdb_instance";

/// Desired attributes of an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct InstanceSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub is_ha_cluster: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub volume_type: Option<VolumeType>,
    #[serde(default)]
    pub volume_size_in_gb: Option<u64>,
    #[serde(default)]
    pub telemetry_enabled: bool,
}

impl InstanceSpec {
    fn volume_type(&self) -> VolumeType {
        self.volume_type.unwrap_or_default()
    }
}

fn validate_volume_type(value: &Value) -> std::result::Result<(), String> {
    serde_json::from_value::<VolumeType>(value.clone())
        .map(|_| ())
        .map_err(|_| format!("{} is not a volume type (local, block)", value))
}

/// A size is only accepted on block volumes, in steps of 5 GB
pub(crate) fn validate_volume(volume_type: VolumeType, size_gb: Option<u64>) -> Result<()> {
    let Some(size) = size_gb else {
        return Ok(());
    };
    if volume_type != VolumeType::Block {
        return Err(CloudError::invalid_attribute(
            "volume_size_in_gb",
            format!(
                "volume_size_in_gb can only be set with volume_type block, got {}",
                volume_type.as_str()
            ),
        ));
    }
    if size == 0 || size % 5 != 0 {
        return Err(CloudError::invalid_attribute(
            "volume_size_in_gb",
            format!("volume_size_in_gb must be a positive multiple of 5, got {}", size),
        ));
    }
    Ok(())
}

/// Upgrade requests needed to go from `old` to `new`, in the order the
/// backend accepts them
pub(crate) fn plan_upgrades(old: &InstanceSpec, new: &InstanceSpec) -> Result<Vec<UpgradeTarget>> {
    let mut upgrades = Vec::new();

    if old.volume_type() != new.volume_type() {
        if new.volume_type() != VolumeType::Block {
            return Err(CloudError::invalid_attribute(
                "volume_type",
                format!(
                    "volume_type can only be upgraded to block, not {}",
                    new.volume_type().as_str()
                ),
            ));
        }
        upgrades.push(UpgradeTarget::VolumeType(VolumeType::Block));
    }

    if let Some(size) = new.volume_size_in_gb {
        if old.volume_size_in_gb != Some(size) {
            validate_volume(new.volume_type(), Some(size))?;
            if let Some(previous) = old.volume_size_in_gb {
                if size < previous {
                    return Err(CloudError::invalid_attribute(
                        "volume_size_in_gb",
                        format!(
                            "volume_size_in_gb cannot be decreased (from {} to {})",
                            previous, size
                        ),
                    ));
                }
            }
            upgrades.push(UpgradeTarget::VolumeSizeGb(size));
        }
    }

    if !old.node_type.eq_ignore_ascii_case(&new.node_type) {
        upgrades.push(UpgradeTarget::NodeType(new.node_type.clone()));
    }

    if old.is_ha_cluster != new.is_ha_cluster {
        upgrades.push(UpgradeTarget::EnableHa(new.is_ha_cluster));
    }

    Ok(upgrades)
}

/// Writes observed instance state into `data`
pub(crate) fn hydrate(data: &mut ResourceData, region: &str, instance: &Instance) -> Result<()> {
    data.set("name", &instance.name)?;
    data.set("engine", &instance.engine)?;
    data.set("node_type", &instance.node_type)?;
    data.set("is_ha_cluster", instance.is_ha_cluster)?;
    data.set("tags", &instance.tags)?;
    data.set("volume_type", instance.volume.kind.as_str())?;
    data.set(
        "volume_size_in_gb",
        (instance.volume.kind == VolumeType::Block).then_some(instance.volume.size_gb),
    )?;
    data.set(
        "telemetry_enabled",
        instance.init_setting(TELEMETRY_SETTING) == Some("true"),
    )?;
    data.set("project_id", &instance.project_id)?;
    data.set("region", region)?;
    data.set(
        "endpoints",
        instance
            .endpoints
            .iter()
            .map(|e| flatten_endpoint(region, e))
            .collect::<Vec<_>>(),
    )?;
    Ok(())
}

pub(crate) fn endpoints_attribute() -> Attribute {
    Attribute::new(
        AttributeType::List(Box::new(AttributeType::Map(Box::new(AttributeType::String)))),
        Presence::Computed,
    )
    .describe("Endpoints of the instance: load balancer and private networks")
}

pub struct InstanceController {
    db: DocumentDb,
}

impl InstanceController {
    pub fn new(db: DocumentDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResourceController for InstanceController {
    fn kind(&self) -> &str {
        KIND
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute(
                "name",
                Attribute::optional_string()
                    .computed()
                    .describe("Name of the instance"),
            )
            .with_attribute(
                "engine",
                Attribute::required_string()
                    .force_new()
                    .suppress_diff(diff::ignore_case)
                    .describe("Database engine, e.g. FerretDB-1"),
            )
            .with_attribute(
                "user_name",
                Attribute::optional_string()
                    .force_new()
                    .describe("Name of the first user"),
            )
            .with_attribute(
                "password",
                Attribute::optional_string()
                    .force_new()
                    .sensitive()
                    .describe("Password of the first user"),
            )
            .with_attribute(
                "node_type",
                Attribute::required_string()
                    .validate_with(validators::non_empty_string)
                    .suppress_diff(diff::ignore_case),
            )
            .with_attribute(
                "is_ha_cluster",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute(
                "tags",
                Attribute::new(
                    AttributeType::List(Box::new(AttributeType::String)),
                    Presence::Optional,
                ),
            )
            .with_attribute(
                "volume_type",
                Attribute::optional_string()
                    .with_default(json!("block"))
                    .validate_with(validate_volume_type)
                    .describe("local or block"),
            )
            .with_attribute(
                "volume_size_in_gb",
                Attribute::optional_int()
                    .computed()
                    .validate_with(validators::positive_int)
                    .describe("Volume size in GB, block volumes only"),
            )
            .with_attribute(
                "telemetry_enabled",
                Attribute::optional_bool()
                    .force_new()
                    .with_default(json!(false)),
            )
            .with_attribute("endpoints", endpoints_attribute())
            .with_attribute("region", Attribute::region())
            .with_attribute("project_id", Attribute::project_id())
    }

    fn customize_diff(&self, diff: &ResourceDiff, _meta: &ProviderConfig) -> Result<()> {
        let volume_type = match diff.get("volume_type") {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| CloudError::invalid_attribute("volume_type", e.to_string()))?,
            None => VolumeType::default(),
        };
        let size = diff.get("volume_size_in_gb").and_then(Value::as_u64);
        validate_volume(volume_type, size)
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let spec: InstanceSpec = data.decode()?;
        validate_volume(spec.volume_type(), spec.volume_size_in_gb)?;

        let region = self.db.region(data, None);
        let mut init_settings = Vec::new();
        if spec.telemetry_enabled {
            init_settings.push(InstanceSetting::new(TELEMETRY_SETTING, "true"));
        }

        let req = CreateInstanceRequest {
            region: region.clone(),
            project_id: self.db.project_id(data),
            name: spec
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| random_name("docdb")),
            engine: spec.engine.clone(),
            user_name: spec.user_name.clone(),
            password: spec.password.clone(),
            node_type: spec.node_type.clone(),
            is_ha_cluster: spec.is_ha_cluster,
            tags: spec.tags.clone(),
            init_settings,
            volume_type: spec.volume_type(),
            volume_size_gb: spec.volume_size_in_gb,
        };

        let instance = ctx
            .run(self.db.api().create_instance(req))
            .await
            .context("creating documentdb instance")?;
        data.set_id(new_regional_string(&region, &instance.id));
        tracing::info!("Created documentdb instance {} ({})", instance.name, instance.id);

        let options = self.db.wait_options(data.timeout(Operation::Create));
        wait_for_instance(ctx, self.db.api(), &region, &instance.id, &options)
            .await
            .context("waiting for documentdb instance")?;

        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let options = self.db.wait_options(data.timeout(Operation::Read));

        let instance =
            match wait_for_instance(ctx, self.db.api(), &id.region, &id.id, &options).await {
                Ok(instance) => instance,
                Err(e) if e.is_not_found() => {
                    tracing::warn!("documentdb instance {} is gone, removing it from state", id);
                    data.clear_id();
                    return Ok(());
                }
                Err(e) => return Err(e.with_context("reading documentdb instance")),
            };

        hydrate(data, &id.region, &instance)
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let old: InstanceSpec = data.decode_prior()?;
        let new: InstanceSpec = data.decode()?;
        let upgrades = plan_upgrades(&old, &new)?;

        let waiter = self
            .db
            .instance_waiter(ctx, &id.region, &id.id, data.timeout(Operation::Update));
        match waiter.wait().await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!("documentdb instance {} is gone, removing it from state", id);
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("waiting for documentdb instance")),
        }

        let name = new.name.clone().filter(|n| Some(n) != old.name.as_ref());
        let tags = (old.tags != new.tags).then(|| new.tags.clone());
        if name.is_some() || tags.is_some() {
            let req = UpdateInstanceRequest {
                region: id.region.clone(),
                instance_id: id.id.clone(),
                name,
                tags,
            };
            ctx.run(self.db.api().update_instance(req))
                .await
                .context("updating documentdb instance")?;
        }

        for target in upgrades {
            waiter.wait_ready().await?;
            tracing::info!("Upgrading documentdb instance {}: {:?}", id, target);
            let req = UpgradeInstanceRequest {
                region: id.region.clone(),
                instance_id: id.id.clone(),
                target,
            };
            ctx.run(self.db.api().upgrade_instance(req))
                .await
                .context("upgrading documentdb instance")?;
        }

        waiter
            .wait()
            .await
            .context("waiting for documentdb instance")?;
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let waiter = self
            .db
            .instance_waiter(ctx, &id.region, &id.id, data.timeout(Operation::Delete));

        match waiter.wait().await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("waiting for documentdb instance")),
        }

        let req = DeleteInstanceRequest {
            region: id.region.clone(),
            instance_id: id.id.clone(),
        };
        match ctx.run(self.db.api().delete_instance(req)).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("deleting documentdb instance")),
        }

        match waiter.wait().await {
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("waiting for documentdb instance deletion")),
            Ok(instance) => {
                return Err(CloudError::Transport(format!(
                    "instance {} settled in status {} instead of being deleted",
                    id,
                    instance.status.as_str()
                )));
            }
        }

        tracing::info!("Deleted documentdb instance {}", id);
        data.clear_id();
        Ok(())
    }
}
