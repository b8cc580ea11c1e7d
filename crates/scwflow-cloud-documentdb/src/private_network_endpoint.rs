//! `documentdb_private_network_endpoint` controller
//!
//! The only in-place change is moving the endpoint to another instance;
//! the private network and the service IP force a replacement.

use crate::api::{
    CreateEndpointRequest, DeleteEndpointRequest, EndpointSpec, GetEndpointRequest,
    MigrateEndpointRequest, PrivateNetworkEndpointSpec,
};
use crate::helpers::DocumentDb;
use crate::waiters::InstanceWaiter;
use async_trait::async_trait;
use ipnet::IpNet;
use scwflow_cloud::{
    Attribute, AttributeType, CloudError, Context, LocalityCheck, Operation, ParentWait,
    Presence, ProviderConfig, ResourceController, ResourceData, ResourceDiff, Result, ResultExt, Schema,
    diff, expand_id, new_regional_string, parse_regional, with_parent_ready,
};
use serde::Deserialize;
use serde_json::Value;

pub const KIND: &str = "documentdb_private_network_endpoint";

#[derive(Debug, Clone, Default, Deserialize)]
struct EndpointSpecAttributes {
    #[serde(default)]
    instance_id: String,
    #[serde(default)]
    private_network_id: String,
    #[serde(default)]
    ip_net: Option<String>,
}

fn validate_cidr(value: &Value) -> std::result::Result<(), String> {
    match value.as_str().map(str::parse::<IpNet>) {
        Some(Ok(_)) => Ok(()),
        _ => Err(format!("{} is not a CIDR (e.g. 192.168.1.10/24)", value)),
    }
}

/// Explicit service IP, or `None` to let IPAM allocate one
fn parse_service_ip(ip_net: Option<&str>) -> Result<Option<IpNet>> {
    match ip_net.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<IpNet>()
            .map(Some)
            .map_err(|e| CloudError::invalid_attribute("ip_net", format!("{:?}: {}", s, e))),
    }
}

pub struct PrivateNetworkEndpointController {
    db: DocumentDb,
}

impl PrivateNetworkEndpointController {
    pub fn new(db: DocumentDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResourceController for PrivateNetworkEndpointController {
    fn kind(&self) -> &str {
        KIND
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute(
                "instance_id",
                Attribute::required_string()
                    .suppress_diff(diff::locality)
                    .describe("Instance the endpoint is attached to"),
            )
            .with_attribute(
                "private_network_id",
                Attribute::required_string()
                    .force_new()
                    .suppress_diff(diff::locality),
            )
            .with_attribute(
                "ip_net",
                Attribute::optional_string()
                    .computed()
                    .force_new()
                    .validate_with(validate_cidr)
                    .describe("Service IP in CIDR notation, allocated by IPAM when unset"),
            )
            .with_attribute("ip", Attribute::computed_string())
            .with_attribute(
                "port",
                Attribute::new(AttributeType::Int, Presence::Computed),
            )
            .with_attribute("name", Attribute::computed_string())
            .with_attribute("hostname", Attribute::computed_string())
            .with_attribute("zone", Attribute::computed_string())
            .with_attribute("region", Attribute::region())
    }

    fn customize_diff(&self, diff: &ResourceDiff, meta: &ProviderConfig) -> Result<()> {
        LocalityCheck::new(["instance_id", "private_network_id"]).check(diff, meta)
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let spec: EndpointSpecAttributes = data.decode()?;
        let service_ip = parse_service_ip(spec.ip_net.as_deref())?;
        let region = self.db.region(data, Some(spec.instance_id.as_str()));
        let instance_id = expand_id(&spec.instance_id);

        let api = self.db.api();
        let waiter =
            self.db
                .instance_waiter(ctx, &region, &instance_id, data.timeout(Operation::Create));
        let req = CreateEndpointRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            spec: EndpointSpec::PrivateNetwork(PrivateNetworkEndpointSpec {
                private_network_id: expand_id(&spec.private_network_id),
                service_ip,
            }),
        };
        let endpoint = with_parent_ready(&waiter, || async move {
            ctx.run(api.create_endpoint(req))
                .await
                .context("creating documentdb private network endpoint")
        })
        .await?;

        data.set_id(new_regional_string(&region, &endpoint.id));
        tracing::info!("Created private network endpoint {} on instance {}", endpoint.id, instance_id);
        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let req = GetEndpointRequest {
            region: id.region.clone(),
            endpoint_id: id.id.clone(),
        };
        let endpoint = match ctx.run(self.db.api().get_endpoint(req)).await {
            Ok(endpoint) => endpoint,
            Err(e) if e.is_not_found() => {
                tracing::warn!("private network endpoint {} is gone, removing it from state", id);
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("reading documentdb private network endpoint")),
        };

        let Some(pn) = endpoint.private_network() else {
            return Err(CloudError::validation(format!(
                "endpoint {} is not a private network endpoint",
                id
            )));
        };

        if let Some(instance_id) = &endpoint.instance_id {
            data.set("instance_id", new_regional_string(&id.region, instance_id))?;
        }
        data.set(
            "private_network_id",
            new_regional_string(&id.region, &expand_id(&pn.private_network_id)),
        )?;
        data.set("ip_net", pn.service_ip.to_string())?;
        data.set("zone", &pn.zone)?;
        data.set("ip", &endpoint.ip)?;
        data.set("port", endpoint.port)?;
        data.set("name", &endpoint.name)?;
        data.set("hostname", &endpoint.hostname)?;
        data.set("region", &id.region)?;
        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;

        let spec: EndpointSpecAttributes = data.decode()?;
        let previous: EndpointSpecAttributes = data.decode_prior()?;
        let instance_id = expand_id(&spec.instance_id);

        let source_id = expand_id(&previous.instance_id);
        if instance_id != source_id {
            let api = self.db.api();
            let timeout = data.timeout(Operation::Update);
            let source = self
                .db
                .instance_waiter(ctx, &id.region, &source_id, timeout);
            let waiter = self
                .db
                .instance_waiter(ctx, &id.region, &instance_id, timeout);
            let req = MigrateEndpointRequest {
                region: id.region.clone(),
                endpoint_id: id.id.clone(),
                instance_id: instance_id.clone(),
            };

            // Both instances are reconfigured by the move.
            wait_source_ready(&source).await?;
            with_parent_ready(&waiter, || async move {
                ctx.run(api.migrate_endpoint(req))
                    .await
                    .context("migrating documentdb private network endpoint")
            })
            .await?;
            wait_source_ready(&source).await?;
            tracing::info!("Migrated private network endpoint {} to instance {}", id, instance_id);
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let req = DeleteEndpointRequest {
            region: id.region.clone(),
            endpoint_id: id.id.clone(),
        };
        match ctx.run(self.db.api().delete_endpoint(req)).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("deleting documentdb private network endpoint")),
        }
        data.clear_id();
        Ok(())
    }
}

/// Waits for the instance an endpoint moves away from; a deleted one is fine
async fn wait_source_ready(source: &InstanceWaiter<'_>) -> Result<()> {
    match source.wait_ready().await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e.with_context("waiting for previous documentdb instance")),
    }
}
