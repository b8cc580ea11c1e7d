//! `documentdb_read_replica` controller
//!
//! A replica carries at most one `direct_access` and one `private_network`
//! endpoint. Updates diff both blocks: removed endpoints are deleted one by
//! one, added ones are created in a single request.

use crate::api::{
    CreateReadReplicaEndpointRequest, CreateReadReplicaRequest, DeleteEndpointRequest,
    DeleteReadReplicaRequest, PrivateNetworkEndpointSpec, ReadReplica, ReadReplicaEndpointSpec,
};
use crate::helpers::DocumentDb;
use crate::waiters::wait_for_read_replica;
use async_trait::async_trait;
use ipnet::IpNet;
use scwflow_cloud::{
    Attribute, AttributeType, CloudError, Context, LocalityCheck, Operation, Presence,
    ProviderConfig, ResourceController, ResourceData, ResourceDiff, Result, ResultExt, Schema,
    diff, expand_id, new_regional_string, parse_regional,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

pub const KIND: &str = "documentdb_read_replica";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct DirectAccessBlock {
    #[serde(default)]
    endpoint_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct PrivateNetworkBlock {
    #[serde(default)]
    endpoint_id: Option<String>,
    #[serde(default)]
    private_network_id: String,
    #[serde(default)]
    service_ip: Option<String>,
}

impl PrivateNetworkBlock {
    fn to_spec(&self) -> Result<ReadReplicaEndpointSpec> {
        let service_ip = match self.service_ip.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(s) => Some(s.parse::<IpNet>().map_err(|e| {
                CloudError::invalid_attribute(
                    "private_network.0.service_ip",
                    format!("{:?}: {}", s, e),
                )
            })?),
        };
        Ok(ReadReplicaEndpointSpec::PrivateNetwork(
            PrivateNetworkEndpointSpec {
                private_network_id: expand_id(&self.private_network_id),
                service_ip,
            },
        ))
    }

    /// Same attachment, ignoring computed fields and id prefixes
    fn same_target(&self, other: &PrivateNetworkBlock) -> bool {
        expand_id(&self.private_network_id) == expand_id(&other.private_network_id)
            && (other.service_ip.is_none() || self.service_ip == other.service_ip)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ReadReplicaSpec {
    #[serde(default)]
    instance_id: String,
    #[serde(default)]
    direct_access: Vec<DirectAccessBlock>,
    #[serde(default)]
    private_network: Vec<PrivateNetworkBlock>,
    #[serde(default = "default_same_zone")]
    same_zone: bool,
}

fn default_same_zone() -> bool {
    true
}

/// Endpoint dropped from the configuration; the id is missing when state
/// never recorded it
#[derive(Debug, PartialEq, Eq)]
struct RemovedEndpoint {
    endpoint_id: Option<String>,
    direct_access: bool,
}

/// Changes needed to go from `old` to `new` endpoint blocks
#[derive(Debug, Default, PartialEq, Eq)]
struct EndpointChanges {
    delete: Vec<RemovedEndpoint>,
    create: Vec<ReadReplicaEndpointSpec>,
}

fn diff_endpoints(old: &ReadReplicaSpec, new: &ReadReplicaSpec) -> Result<EndpointChanges> {
    let mut changes = EndpointChanges::default();

    match (old.direct_access.first(), new.direct_access.first()) {
        (Some(removed), None) => changes.delete.push(RemovedEndpoint {
            endpoint_id: removed.endpoint_id.clone(),
            direct_access: true,
        }),
        (None, Some(_)) => changes.create.push(ReadReplicaEndpointSpec::DirectAccess),
        _ => {}
    }

    match (old.private_network.first(), new.private_network.first()) {
        (Some(removed), None) => changes.delete.push(RemovedEndpoint {
            endpoint_id: removed.endpoint_id.clone(),
            direct_access: false,
        }),
        (None, Some(added)) => changes.create.push(added.to_spec()?),
        (Some(previous), Some(wanted)) if !previous.same_target(wanted) => {
            changes.delete.push(RemovedEndpoint {
                endpoint_id: previous.endpoint_id.clone(),
                direct_access: false,
            });
            changes.create.push(wanted.to_spec()?);
        }
        _ => {}
    }

    Ok(changes)
}

fn build_endpoint_specs(spec: &ReadReplicaSpec) -> Result<Vec<ReadReplicaEndpointSpec>> {
    let mut specs = Vec::new();
    if !spec.direct_access.is_empty() {
        specs.push(ReadReplicaEndpointSpec::DirectAccess);
    }
    if let Some(pn) = spec.private_network.first() {
        specs.push(pn.to_spec()?);
    }
    Ok(specs)
}

fn hydrate(data: &mut ResourceData, region: &str, replica: &ReadReplica) -> Result<()> {
    let mut direct_access = Vec::new();
    let mut private_network = Vec::new();

    for endpoint in &replica.endpoints {
        let common = json!({
            "endpoint_id": new_regional_string(region, &endpoint.id),
            "ip": endpoint.ip,
            "port": endpoint.port,
            "name": endpoint.name,
            "hostname": endpoint.hostname,
        });
        if endpoint.is_direct_access() {
            direct_access.push(common);
        } else if let Some(pn) = endpoint.private_network() {
            let mut block = common;
            block["private_network_id"] =
                json!(new_regional_string(region, &expand_id(&pn.private_network_id)));
            block["service_ip"] = json!(pn.service_ip.to_string());
            block["zone"] = json!(pn.zone);
            private_network.push(block);
        }
    }

    data.set("instance_id", new_regional_string(region, &replica.instance_id))?;
    data.set("same_zone", replica.same_zone)?;
    data.set("direct_access", direct_access)?;
    data.set("private_network", private_network)?;
    data.set("region", region)?;
    Ok(())
}

fn endpoint_block(extra: &[(&str, Attribute)]) -> Attribute {
    let mut attributes = BTreeMap::new();
    attributes.insert("endpoint_id".to_string(), Attribute::computed_string());
    attributes.insert("ip".to_string(), Attribute::computed_string());
    attributes.insert(
        "port".to_string(),
        Attribute::new(AttributeType::Int, Presence::Computed),
    );
    attributes.insert("name".to_string(), Attribute::computed_string());
    attributes.insert("hostname".to_string(), Attribute::computed_string());
    for (name, attribute) in extra {
        attributes.insert(name.to_string(), attribute.clone());
    }
    Attribute::block(attributes, Some(1))
}

pub struct ReadReplicaController {
    db: DocumentDb,
}

impl ReadReplicaController {
    pub fn new(db: DocumentDb) -> Self {
        Self { db }
    }

    async fn delete_endpoint(
        &self,
        ctx: &Context,
        region: &str,
        replica: &ReadReplica,
        removed: RemovedEndpoint,
    ) -> Result<()> {
        let direct_access = removed.direct_access;
        // Fall back on the live endpoint when state has no id for it.
        let endpoint_id = match removed.endpoint_id {
            Some(id) => expand_id(&id),
            None => {
                let live = replica.endpoints.iter().find(|e| {
                    if direct_access {
                        e.is_direct_access()
                    } else {
                        e.private_network().is_some()
                    }
                });
                match live {
                    Some(e) => e.id.clone(),
                    None => return Ok(()),
                }
            }
        };

        tracing::info!("Deleting endpoint {} of read replica {}", endpoint_id, replica.id);
        let req = DeleteEndpointRequest {
            region: region.to_string(),
            endpoint_id,
        };
        match ctx.run(self.db.api().delete_endpoint(req)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.with_context("deleting read replica endpoint")),
        }
    }
}

#[async_trait]
impl ResourceController for ReadReplicaController {
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
                    .describe("Instance the replica follows"),
            )
            .with_attribute("direct_access", endpoint_block(&[]))
            .with_attribute(
                "private_network",
                endpoint_block(&[
                    (
                        "private_network_id",
                        Attribute::required_string().suppress_diff(diff::locality),
                    ),
                    ("service_ip", Attribute::optional_string().computed()),
                    ("zone", Attribute::computed_string()),
                ]),
            )
            .with_attribute(
                "same_zone",
                Attribute::optional_bool()
                    .force_new()
                    .with_default(json!(true))
                    .describe("Place the replica in the zone of its instance"),
            )
            .with_attribute("region", Attribute::region())
    }

    fn customize_diff(&self, diff: &ResourceDiff, meta: &ProviderConfig) -> Result<()> {
        LocalityCheck::new(["instance_id", "private_network.#.private_network_id"])
            .check(diff, meta)
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let spec: ReadReplicaSpec = data.decode()?;
        let region = self.db.region(data, Some(spec.instance_id.as_str()));
        let instance_id = expand_id(&spec.instance_id);
        let timeout = data.timeout(Operation::Create);

        self.db
            .instance_waiter(ctx, &region, &instance_id, timeout)
            .wait()
            .await
            .context("waiting for documentdb instance")?;

        let req = CreateReadReplicaRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            endpoint_specs: build_endpoint_specs(&spec)?,
            same_zone: spec.same_zone,
        };
        let replica = ctx
            .run(self.db.api().create_read_replica(req))
            .await
            .context("creating documentdb read replica")?;
        data.set_id(new_regional_string(&region, &replica.id));
        tracing::info!("Created read replica {} of instance {}", replica.id, instance_id);

        wait_for_read_replica(
            ctx,
            self.db.api(),
            &region,
            &replica.id,
            &self.db.wait_options(timeout),
        )
        .await
        .context("waiting for documentdb read replica")?;

        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let options = self.db.wait_options(data.timeout(Operation::Read));

        let replica = match wait_for_read_replica(ctx, self.db.api(), &id.region, &id.id, &options)
            .await
        {
            Ok(replica) => replica,
            Err(e) if e.is_not_found() => {
                tracing::warn!("read replica {} is gone, removing it from state", id);
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("reading documentdb read replica")),
        };

        hydrate(data, &id.region, &replica)
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let old: ReadReplicaSpec = data.decode_prior()?;
        let new: ReadReplicaSpec = data.decode()?;
        let changes = diff_endpoints(&old, &new)?;
        let options = self.db.wait_options(data.timeout(Operation::Update));

        let replica = match wait_for_read_replica(ctx, self.db.api(), &id.region, &id.id, &options)
            .await
        {
            Ok(replica) => replica,
            Err(e) if e.is_not_found() => {
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("waiting for documentdb read replica")),
        };

        for removed in changes.delete {
            self.delete_endpoint(ctx, &id.region, &replica, removed).await?;
        }

        if !changes.create.is_empty() {
            wait_for_read_replica(ctx, self.db.api(), &id.region, &id.id, &options)
                .await
                .context("waiting for documentdb read replica")?;
            let req = CreateReadReplicaEndpointRequest {
                region: id.region.clone(),
                read_replica_id: id.id.clone(),
                endpoint_specs: changes.create,
            };
            ctx.run(self.db.api().create_read_replica_endpoint(req))
                .await
                .context("creating read replica endpoints")?;
        }

        wait_for_read_replica(ctx, self.db.api(), &id.region, &id.id, &options)
            .await
            .context("waiting for documentdb read replica")?;
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let options = self.db.wait_options(data.timeout(Operation::Delete));

        match wait_for_read_replica(ctx, self.db.api(), &id.region, &id.id, &options).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("waiting for documentdb read replica")),
        }

        let req = DeleteReadReplicaRequest {
            region: id.region.clone(),
            read_replica_id: id.id.clone(),
        };
        match ctx.run(self.db.api().delete_read_replica(req)).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("deleting documentdb read replica")),
        }

        match wait_for_read_replica(ctx, self.db.api(), &id.region, &id.id, &options).await {
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("waiting for read replica deletion")),
            Ok(replica) => {
                return Err(CloudError::Transport(format!(
                    "read replica {} settled in status {} instead of being deleted",
                    id,
                    replica.status.as_str()
                )));
            }
        }

        tracing::info!("Deleted read replica {}", id);
        data.clear_id();
        Ok(())
    }
}
