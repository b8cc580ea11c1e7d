//! Identifiers and shared plumbing for the DocumentDB controllers

use crate::api::{DocumentDbApi, Endpoint};
use crate::waiters::InstanceWaiter;
use scwflow_cloud::locality::{is_locality, region_of};
use scwflow_cloud::{
    CloudError, Context, ProviderConfig, ResourceData, Result, WaitOptions, expand_id,
    new_regional_string, parse_localized,
};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// `region/instance-uuid/name` (databases, users)
pub fn new_instance_child_id(region: &str, instance_id: &str, name: &str) -> String {
    format!("{}/{}/{}", region, instance_id, name)
}

/// Splits `region/instance-uuid/name` into the regional instance id and the
/// child name
pub fn parse_instance_child_id(s: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 3 {
        return Err(CloudError::malformed_id(
            s,
            format!(
                "expected 3 segments (region/instance/name), got {}",
                parts.len()
            ),
        ));
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(CloudError::malformed_id(s, "empty segment"));
    }
    Ok((format!("{}/{}", parts[0], parts[1]), parts[2].to_string()))
}

pub fn parse_database_id(s: &str) -> Result<(String, String)> {
    parse_instance_child_id(s)
}

pub fn parse_user_id(s: &str) -> Result<(String, String)> {
    parse_instance_child_id(s)
}

/// `region/instance-uuid/database-name/user-name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrivilegeId {
    pub region: String,
    pub instance_id: String,
    pub database_name: String,
    pub user_name: String,
}

impl fmt::Display for PrivilegeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.region, self.instance_id, self.database_name, self.user_name
        )
    }
}

pub fn parse_privilege_id(s: &str) -> Result<PrivilegeId> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 4 {
        return Err(CloudError::malformed_id(
            s,
            format!(
                "expected 4 segments (region/instance/database/user), got {}",
                parts.len()
            ),
        ));
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(CloudError::malformed_id(s, "empty segment"));
    }
    Ok(PrivilegeId {
        region: parts[0].to_string(),
        instance_id: parts[1].to_string(),
        database_name: parts[2].to_string(),
        user_name: parts[3].to_string(),
    })
}

/// Region embedded in a localized id, if it has one
pub fn locality_region(id: &str) -> Option<String> {
    match parse_localized(id) {
        Ok((locality, _)) if is_locality(&locality) => Some(region_of(&locality).to_string()),
        _ => None,
    }
}

/// Host-facing form of an endpoint; ids are written back region-prefixed
pub fn flatten_endpoint(region: &str, endpoint: &Endpoint) -> Value {
    let pn = endpoint.private_network();
    json!({
        "id": new_regional_string(region, &endpoint.id),
        "ip": endpoint.ip,
        "port": endpoint.port,
        "name": endpoint.name,
        "hostname": endpoint.hostname,
        "load_balancer": endpoint.is_load_balancer(),
        "private_network_id": pn.map(|pn| new_regional_string(region, &expand_id(&pn.private_network_id))),
        "service_ip": pn.map(|pn| pn.service_ip.to_string()),
        "zone": pn.map(|pn| pn.zone.clone()),
    })
}

/// API client plus provider defaults, shared by every DocumentDB controller
#[derive(Clone)]
pub struct DocumentDb {
    api: Arc<dyn DocumentDbApi>,
    meta: ProviderConfig,
}

impl fmt::Debug for DocumentDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentDb")
            .field("region", &self.meta.region)
            .finish_non_exhaustive()
    }
}

impl DocumentDb {
    pub fn new(api: Arc<dyn DocumentDbApi>, meta: ProviderConfig) -> Self {
        Self { api, meta }
    }

    pub fn api(&self) -> &dyn DocumentDbApi {
        self.api.as_ref()
    }

    pub fn meta(&self) -> &ProviderConfig {
        &self.meta
    }

    /// The `region` attribute, else the region of `parent_id`, else the
    /// provider default
    pub fn region(&self, data: &ResourceData, parent_id: Option<&str>) -> String {
        data.get_str("region")
            .filter(|r| !r.is_empty())
            .or_else(|| parent_id.and_then(locality_region))
            .unwrap_or_else(|| self.meta.region.clone())
    }

    pub fn project_id(&self, data: &ResourceData) -> Option<String> {
        data.get_str("project_id")
            .filter(|p| !p.is_empty())
            .or_else(|| self.meta.project_id.clone())
    }

    pub fn wait_options(&self, timeout: Duration) -> WaitOptions {
        WaitOptions::for_operation(&self.meta.wait, timeout)
    }

    pub fn instance_waiter<'a>(
        &'a self,
        ctx: &'a Context,
        region: &str,
        instance_id: &str,
        timeout: Duration,
    ) -> InstanceWaiter<'a> {
        InstanceWaiter::new(
            ctx,
            self.api(),
            region,
            instance_id,
            self.wait_options(timeout),
        )
    }
}
