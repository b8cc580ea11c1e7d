//! In-memory DocumentDB backend for the controller tests
//!
//! Mutations put the instance (or replica) into a transitional state for a
//! couple of polls, and child mutations against a busy instance are rejected
//! with 409 the way the real backend serializes them.

#![allow(dead_code)]

use async_trait::async_trait;
use scwflow_cloud::waiter::set_default_retry_interval;
use scwflow_cloud::{
    ApiError, Context, Operation, ProviderConfig, ProviderRegistry, ResourceData, Result,
    WaitConfig,
};
use scwflow_cloud_documentdb::DocumentDbProvider;
use scwflow_cloud_documentdb::api::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const REGION: &str = "fr-par";
pub const PROJECT: &str = "11111111-2222-3333-4444-555555555555";

/// Polls a mutated resource spends in a transitional status
const SETTLE_POLLS: u32 = 2;

#[derive(Default)]
struct State {
    instances: HashMap<String, Instance>,
    replicas: HashMap<String, ReadReplica>,
    busy: HashMap<String, u32>,
    databases: HashMap<String, Vec<Database>>,
    users: HashMap<String, Vec<User>>,
    privileges: HashMap<(String, String, String), Permission>,
    endpoints: HashMap<String, Endpoint>,
    calls: Vec<(String, String)>,
    injected_conflicts: HashMap<String, u32>,
    conflicts_raised: usize,
    /// (method, instance, user): drop the user when `method` next conflicts
    drop_user_on_conflict: Option<(String, String, String)>,
    next_host: u8,
}

impl State {
    fn record(&mut self, method: &str, detail: impl Into<String>) {
        self.calls.push((method.to_string(), detail.into()));
    }

    fn is_busy(&self, id: &str) -> bool {
        self.busy.get(id).copied().unwrap_or(0) > 0
    }

    fn touch(&mut self, id: &str) {
        self.busy.insert(id.to_string(), SETTLE_POLLS);
    }

    /// Consumes one poll of the transitional window, true while it lasts
    fn settle(&mut self, id: &str) -> bool {
        match self.busy.get_mut(id) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    fn drop_user(&mut self, instance_id: &str, name: &str) {
        if let Some(users) = self.users.get_mut(instance_id) {
            users.retain(|u| u.name != name);
        }
        self.privileges
            .retain(|(i, _, u), _| !(i == instance_id && u == name));
    }

    fn take_conflict(&mut self, method: &str) -> bool {
        match self.injected_conflicts.get_mut(method) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    /// Rejects a mutation on an instance that is missing or not ready
    fn check_ready(&mut self, method: &str, instance_id: &str) -> ApiResult<()> {
        if !self.instances.contains_key(instance_id) {
            return Err(ApiError::NotFound(format!("instance {}", instance_id)));
        }
        if self.take_conflict(method) || self.is_busy(instance_id) {
            self.conflicts_raised += 1;
            let hooked = self
                .drop_user_on_conflict
                .as_ref()
                .is_some_and(|(m, _, _)| m == method);
            if hooked {
                if let Some((_, instance, user)) = self.drop_user_on_conflict.take() {
                    self.drop_user(&instance, &user);
                }
            }
            return Err(ApiError::Conflict(format!("instance {} is busy", instance_id)));
        }
        Ok(())
    }

    fn new_endpoint(&mut self, owner: &str, details: EndpointDetails) -> Endpoint {
        self.next_host += 1;
        let ip = match &details {
            EndpointDetails::PrivateNetwork(pn) => pn.service_ip.addr().to_string(),
            _ => format!("51.159.0.{}", self.next_host),
        };
        let endpoint = Endpoint {
            id: uuid::Uuid::new_v4().to_string(),
            instance_id: Some(owner.to_string()),
            ip: Some(ip),
            port: 5432,
            name: None,
            hostname: None,
            details,
        };
        self.endpoints.insert(endpoint.id.clone(), endpoint.clone());
        endpoint
    }

    fn private_network_details(&mut self, spec: PrivateNetworkEndpointSpec) -> EndpointDetails {
        self.next_host += 1;
        let service_ip = match spec.service_ip {
            Some(ip) => ip,
            None => format!("172.16.4.{}/22", self.next_host)
                .parse()
                .unwrap(),
        };
        EndpointDetails::PrivateNetwork(PrivateNetworkDetails {
            private_network_id: spec.private_network_id,
            service_ip,
            zone: format!("{}-1", REGION),
        })
    }

    fn detach_endpoint(&mut self, endpoint_id: &str) {
        for instance in self.instances.values_mut() {
            instance.endpoints.retain(|e| e.id != endpoint_id);
        }
        for replica in self.replicas.values_mut() {
            replica.endpoints.retain(|e| e.id != endpoint_id);
        }
    }
}

fn not_found(what: &str, id: &str) -> ApiError {
    ApiError::NotFound(format!("{} {}", what, id))
}

pub struct FakeDocumentDb {
    state: Mutex<State>,
}

impl FakeDocumentDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Number of calls made to `method`
    pub fn count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|(m, _)| m == method).count()
    }

    /// Details recorded for each call to `method`, in order
    pub fn details(&self, method: &str) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, d)| d.clone())
            .collect()
    }

    pub fn conflicts_raised(&self) -> usize {
        self.lock().conflicts_raised
    }

    /// Makes the next `n` calls to `method` fail with 409
    pub fn inject_conflicts(&self, method: &str, n: u32) {
        self.lock().injected_conflicts.insert(method.to_string(), n);
    }

    /// Adds a ready instance and returns its bare id
    pub fn seed_instance(&self, name: &str) -> String {
        let mut state = self.lock();
        let id = uuid::Uuid::new_v4().to_string();
        let lb = state.new_endpoint(&id, EndpointDetails::LoadBalancer);
        state.instances.insert(
            id.clone(),
            Instance {
                id: id.clone(),
                name: name.to_string(),
                region: REGION.to_string(),
                project_id: PROJECT.to_string(),
                status: InstanceStatus::Ready,
                engine: "FerretDB-1".to_string(),
                node_type: "docdb-play2-pico".to_string(),
                is_ha_cluster: false,
                tags: Vec::new(),
                volume: Volume {
                    kind: VolumeType::Block,
                    size_gb: 20,
                },
                endpoints: vec![lb],
                init_settings: Vec::new(),
            },
        );
        id
    }

    pub fn seed_database(&self, instance_id: &str, name: &str) {
        self.lock()
            .databases
            .entry(instance_id.to_string())
            .or_default()
            .push(Database {
                name: name.to_string(),
                owner: "admin".to_string(),
                managed: true,
                size: 0,
            });
    }

    pub fn seed_user(&self, instance_id: &str, name: &str) {
        self.lock()
            .users
            .entry(instance_id.to_string())
            .or_default()
            .push(User {
                name: name.to_string(),
                is_admin: false,
            });
    }

    /// Deletes a user behind the controllers' back
    pub fn remove_user(&self, instance_id: &str, name: &str) {
        self.lock().drop_user(instance_id, name);
    }

    /// Deletes a user right after the next conflict raised on `method`
    pub fn remove_user_on_conflict(&self, method: &str, instance_id: &str, name: &str) {
        self.lock().drop_user_on_conflict = Some((
            method.to_string(),
            instance_id.to_string(),
            name.to_string(),
        ));
    }

    /// Puts an instance into its transitional window, as after a mutation
    pub fn mark_busy(&self, instance_id: &str) {
        self.lock().touch(instance_id);
    }

    /// Deletes an instance behind the controllers' back
    pub fn remove_instance(&self, instance_id: &str) {
        self.lock().instances.remove(instance_id);
    }

    pub fn instance(&self, instance_id: &str) -> Option<Instance> {
        self.lock().instances.get(instance_id).cloned()
    }

    pub fn replica(&self, replica_id: &str) -> Option<ReadReplica> {
        self.lock().replicas.get(replica_id).cloned()
    }

    pub fn endpoint(&self, endpoint_id: &str) -> Option<Endpoint> {
        self.lock().endpoints.get(endpoint_id).cloned()
    }

    pub fn databases(&self, instance_id: &str) -> Vec<Database> {
        self.lock()
            .databases
            .get(instance_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn users(&self, instance_id: &str) -> Vec<User> {
        self.lock().users.get(instance_id).cloned().unwrap_or_default()
    }

    pub fn permission(&self, instance_id: &str, database: &str, user: &str) -> Option<Permission> {
        self.lock()
            .privileges
            .get(&(instance_id.to_string(), database.to_string(), user.to_string()))
            .copied()
    }
}

#[async_trait]
impl DocumentDbApi for FakeDocumentDb {
    async fn create_instance(&self, req: CreateInstanceRequest) -> ApiResult<Instance> {
        let mut state = self.lock();
        state.record("create_instance", &req.name);
        let id = uuid::Uuid::new_v4().to_string();
        let lb = state.new_endpoint(&id, EndpointDetails::LoadBalancer);
        let instance = Instance {
            id: id.clone(),
            name: req.name,
            region: req.region,
            project_id: req.project_id.unwrap_or_else(|| PROJECT.to_string()),
            status: InstanceStatus::Ready,
            engine: req.engine,
            node_type: req.node_type,
            is_ha_cluster: req.is_ha_cluster,
            tags: req.tags,
            volume: Volume {
                kind: req.volume_type,
                size_gb: req.volume_size_gb.unwrap_or(5),
            },
            endpoints: vec![lb],
            init_settings: req.init_settings,
        };
        state.instances.insert(id.clone(), instance.clone());
        state.touch(&id);
        Ok(Instance {
            status: InstanceStatus::Provisioning,
            ..instance
        })
    }

    async fn get_instance(&self, req: GetInstanceRequest) -> ApiResult<Instance> {
        let mut state = self.lock();
        state.record("get_instance", &req.instance_id);
        let Some(mut instance) = state.instances.get(&req.instance_id).cloned() else {
            return Err(not_found("instance", &req.instance_id));
        };
        if state.settle(&req.instance_id) {
            if instance.status != InstanceStatus::Deleting {
                instance.status = InstanceStatus::Configuring;
            }
            return Ok(instance);
        }
        if instance.status == InstanceStatus::Deleting {
            state.instances.remove(&req.instance_id);
            return Err(not_found("instance", &req.instance_id));
        }
        Ok(instance)
    }

    async fn list_instances(&self, req: ListInstancesRequest) -> ApiResult<Vec<Instance>> {
        let mut state = self.lock();
        state.record("list_instances", req.name.clone().unwrap_or_default());
        Ok(state
            .instances
            .values()
            .filter(|i| i.region == req.region)
            .filter(|i| req.name.as_ref().is_none_or(|n| &i.name == n))
            .cloned()
            .collect())
    }

    async fn update_instance(&self, req: UpdateInstanceRequest) -> ApiResult<Instance> {
        let mut state = self.lock();
        state.record("update_instance", &req.instance_id);
        state.check_ready("update_instance", &req.instance_id)?;
        state.touch(&req.instance_id);
        let instance = state
            .instances
            .get_mut(&req.instance_id)
            .ok_or_else(|| not_found("instance", &req.instance_id))?;
        if let Some(name) = req.name {
            instance.name = name;
        }
        if let Some(tags) = req.tags {
            instance.tags = tags;
        }
        Ok(instance.clone())
    }

    async fn upgrade_instance(&self, req: UpgradeInstanceRequest) -> ApiResult<Instance> {
        let mut state = self.lock();
        state.record("upgrade_instance", format!("{:?}", req.target));
        state.check_ready("upgrade_instance", &req.instance_id)?;
        state.touch(&req.instance_id);
        let instance = state
            .instances
            .get_mut(&req.instance_id)
            .ok_or_else(|| not_found("instance", &req.instance_id))?;
        match req.target {
            UpgradeTarget::VolumeType(kind) => instance.volume.kind = kind,
            UpgradeTarget::VolumeSizeGb(size) => instance.volume.size_gb = size,
            UpgradeTarget::NodeType(node_type) => instance.node_type = node_type,
            UpgradeTarget::EnableHa(ha) => instance.is_ha_cluster = ha,
        }
        Ok(instance.clone())
    }

    async fn delete_instance(&self, req: DeleteInstanceRequest) -> ApiResult<Instance> {
        let mut state = self.lock();
        state.record("delete_instance", &req.instance_id);
        state.touch(&req.instance_id);
        let instance = state
            .instances
            .get_mut(&req.instance_id)
            .ok_or_else(|| not_found("instance", &req.instance_id))?;
        instance.status = InstanceStatus::Deleting;
        Ok(instance.clone())
    }

    async fn create_database(&self, req: CreateDatabaseRequest) -> ApiResult<Database> {
        let mut state = self.lock();
        state.record("create_database", &req.name);
        state.check_ready("create_database", &req.instance_id)?;
        state.touch(&req.instance_id);
        let database = Database {
            name: req.name,
            owner: "admin".to_string(),
            managed: true,
            size: 0,
        };
        state
            .databases
            .entry(req.instance_id)
            .or_default()
            .push(database.clone());
        Ok(database)
    }

    async fn list_databases(&self, req: ListDatabasesRequest) -> ApiResult<Vec<Database>> {
        let mut state = self.lock();
        state.record("list_databases", req.name.clone().unwrap_or_default());
        if !state.instances.contains_key(&req.instance_id) {
            return Err(not_found("instance", &req.instance_id));
        }
        Ok(state
            .databases
            .get(&req.instance_id)
            .into_iter()
            .flatten()
            .filter(|d| req.name.as_ref().is_none_or(|n| &d.name == n))
            .cloned()
            .collect())
    }

    async fn delete_database(&self, req: DeleteDatabaseRequest) -> ApiResult<()> {
        let mut state = self.lock();
        state.record("delete_database", &req.name);
        state.check_ready("delete_database", &req.instance_id)?;
        let databases = state.databases.entry(req.instance_id.clone()).or_default();
        let before = databases.len();
        databases.retain(|d| d.name != req.name);
        if databases.len() == before {
            return Err(not_found("database", &req.name));
        }
        state.touch(&req.instance_id);
        Ok(())
    }

    async fn create_user(&self, req: CreateUserRequest) -> ApiResult<User> {
        let mut state = self.lock();
        state.record("create_user", &req.name);
        state.check_ready("create_user", &req.instance_id)?;
        state.touch(&req.instance_id);
        let user = User {
            name: req.name,
            is_admin: req.is_admin,
        };
        state
            .users
            .entry(req.instance_id)
            .or_default()
            .push(user.clone());
        Ok(user)
    }

    async fn list_users(&self, req: ListUsersRequest) -> ApiResult<Vec<User>> {
        let mut state = self.lock();
        state.record("list_users", req.name.clone().unwrap_or_default());
        if !state.instances.contains_key(&req.instance_id) {
            return Err(not_found("instance", &req.instance_id));
        }
        Ok(state
            .users
            .get(&req.instance_id)
            .into_iter()
            .flatten()
            .filter(|u| req.name.as_ref().is_none_or(|n| &u.name == n))
            .cloned()
            .collect())
    }

    async fn update_user(&self, req: UpdateUserRequest) -> ApiResult<User> {
        let mut state = self.lock();
        let detail = format!(
            "{} password={} is_admin={:?}",
            req.name,
            req.password.is_some(),
            req.is_admin
        );
        state.record("update_user", detail);
        state.check_ready("update_user", &req.instance_id)?;
        state.touch(&req.instance_id);
        let user = state
            .users
            .entry(req.instance_id)
            .or_default()
            .iter_mut()
            .find(|u| u.name == req.name)
            .ok_or_else(|| not_found("user", &req.name))?;
        if let Some(is_admin) = req.is_admin {
            user.is_admin = is_admin;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, req: DeleteUserRequest) -> ApiResult<()> {
        let mut state = self.lock();
        state.record("delete_user", &req.name);
        state.check_ready("delete_user", &req.instance_id)?;
        let users = state.users.entry(req.instance_id.clone()).or_default();
        let before = users.len();
        users.retain(|u| u.name != req.name);
        if users.len() == before {
            return Err(not_found("user", &req.name));
        }
        state
            .privileges
            .retain(|(i, _, u), _| !(i == &req.instance_id && u == &req.name));
        state.touch(&req.instance_id);
        Ok(())
    }

    async fn set_privilege(&self, req: SetPrivilegeRequest) -> ApiResult<Privilege> {
        // Lets concurrent callers interleave before the instance is checked.
        tokio::task::yield_now().await;

        let mut state = self.lock();
        state.record(
            "set_privilege",
            format!("{}:{}:{}", req.database_name, req.user_name, req.permission.as_str()),
        );
        state.check_ready("set_privilege", &req.instance_id)?;
        let user_exists = state
            .users
            .get(&req.instance_id)
            .is_some_and(|users| users.iter().any(|u| u.name == req.user_name));
        if !user_exists {
            return Err(not_found("user", &req.user_name));
        }
        state.touch(&req.instance_id);
        state.privileges.insert(
            (
                req.instance_id.clone(),
                req.database_name.clone(),
                req.user_name.clone(),
            ),
            req.permission,
        );
        Ok(Privilege {
            database_name: req.database_name,
            user_name: req.user_name,
            permission: req.permission,
        })
    }

    async fn list_privileges(&self, req: ListPrivilegesRequest) -> ApiResult<Vec<Privilege>> {
        let mut state = self.lock();
        state.record("list_privileges", &req.instance_id);
        if !state.instances.contains_key(&req.instance_id) {
            return Err(not_found("instance", &req.instance_id));
        }
        Ok(state
            .privileges
            .iter()
            .filter(|((i, d, u), _)| {
                i == &req.instance_id
                    && req.database_name.as_ref().is_none_or(|n| n == d)
                    && req.user_name.as_ref().is_none_or(|n| n == u)
            })
            .map(|((_, d, u), p)| Privilege {
                database_name: d.clone(),
                user_name: u.clone(),
                permission: *p,
            })
            .collect())
    }

    async fn create_endpoint(&self, req: CreateEndpointRequest) -> ApiResult<Endpoint> {
        let mut state = self.lock();
        state.record("create_endpoint", &req.instance_id);
        state.check_ready("create_endpoint", &req.instance_id)?;
        let details = match req.spec {
            EndpointSpec::LoadBalancer => EndpointDetails::LoadBalancer,
            EndpointSpec::PrivateNetwork(spec) => state.private_network_details(spec),
        };
        let endpoint = state.new_endpoint(&req.instance_id, details);
        if let Some(instance) = state.instances.get_mut(&req.instance_id) {
            instance.endpoints.push(endpoint.clone());
        }
        state.touch(&req.instance_id);
        Ok(endpoint)
    }

    async fn get_endpoint(&self, req: GetEndpointRequest) -> ApiResult<Endpoint> {
        let mut state = self.lock();
        state.record("get_endpoint", &req.endpoint_id);
        state
            .endpoints
            .get(&req.endpoint_id)
            .cloned()
            .ok_or_else(|| not_found("endpoint", &req.endpoint_id))
    }

    async fn migrate_endpoint(&self, req: MigrateEndpointRequest) -> ApiResult<Endpoint> {
        let mut state = self.lock();
        state.record("migrate_endpoint", format!("{}->{}", req.endpoint_id, req.instance_id));
        state.check_ready("migrate_endpoint", &req.instance_id)?;
        let mut endpoint = state
            .endpoints
            .get(&req.endpoint_id)
            .cloned()
            .ok_or_else(|| not_found("endpoint", &req.endpoint_id))?;
        // The instance giving up the endpoint is reconfigured as well.
        let source = endpoint.instance_id.clone();
        if let Some(source) = source.as_deref().filter(|s| state.instances.contains_key(*s)) {
            state.check_ready("migrate_endpoint", source)?;
            state.touch(source);
        }
        state.detach_endpoint(&req.endpoint_id);
        endpoint.instance_id = Some(req.instance_id.clone());
        state.endpoints.insert(endpoint.id.clone(), endpoint.clone());
        if let Some(instance) = state.instances.get_mut(&req.instance_id) {
            instance.endpoints.push(endpoint.clone());
        }
        state.touch(&req.instance_id);
        Ok(endpoint)
    }

    async fn delete_endpoint(&self, req: DeleteEndpointRequest) -> ApiResult<()> {
        let mut state = self.lock();
        state.record("delete_endpoint", &req.endpoint_id);
        if state.endpoints.remove(&req.endpoint_id).is_none() {
            return Err(not_found("endpoint", &req.endpoint_id));
        }
        state.detach_endpoint(&req.endpoint_id);
        Ok(())
    }

    async fn create_read_replica(&self, req: CreateReadReplicaRequest) -> ApiResult<ReadReplica> {
        let mut state = self.lock();
        state.record("create_read_replica", &req.instance_id);
        state.check_ready("create_read_replica", &req.instance_id)?;
        let id = uuid::Uuid::new_v4().to_string();
        let mut endpoints = Vec::new();
        for spec in req.endpoint_specs {
            let details = match spec {
                ReadReplicaEndpointSpec::DirectAccess => EndpointDetails::DirectAccess,
                ReadReplicaEndpointSpec::PrivateNetwork(pn) => state.private_network_details(pn),
            };
            endpoints.push(state.new_endpoint(&id, details));
        }
        let replica = ReadReplica {
            id: id.clone(),
            region: req.region,
            instance_id: req.instance_id,
            status: ReadReplicaStatus::Ready,
            endpoints,
            same_zone: req.same_zone,
        };
        state.replicas.insert(id.clone(), replica.clone());
        state.touch(&id);
        Ok(ReadReplica {
            status: ReadReplicaStatus::Provisioning,
            ..replica
        })
    }

    async fn get_read_replica(&self, req: GetReadReplicaRequest) -> ApiResult<ReadReplica> {
        let mut state = self.lock();
        state.record("get_read_replica", &req.read_replica_id);
        let Some(mut replica) = state.replicas.get(&req.read_replica_id).cloned() else {
            return Err(not_found("read replica", &req.read_replica_id));
        };
        if state.settle(&req.read_replica_id) {
            if replica.status != ReadReplicaStatus::Deleting {
                replica.status = ReadReplicaStatus::Configuring;
            }
            return Ok(replica);
        }
        if replica.status == ReadReplicaStatus::Deleting {
            state.replicas.remove(&req.read_replica_id);
            return Err(not_found("read replica", &req.read_replica_id));
        }
        Ok(replica)
    }

    async fn create_read_replica_endpoint(
        &self,
        req: CreateReadReplicaEndpointRequest,
    ) -> ApiResult<ReadReplica> {
        let mut state = self.lock();
        state.record(
            "create_read_replica_endpoint",
            format!("{}:{}", req.read_replica_id, req.endpoint_specs.len()),
        );
        if !state.replicas.contains_key(&req.read_replica_id) {
            return Err(not_found("read replica", &req.read_replica_id));
        }
        if state.is_busy(&req.read_replica_id) {
            state.conflicts_raised += 1;
            return Err(ApiError::Conflict(format!(
                "read replica {} is busy",
                req.read_replica_id
            )));
        }
        let mut created = Vec::new();
        for spec in req.endpoint_specs {
            let details = match spec {
                ReadReplicaEndpointSpec::DirectAccess => EndpointDetails::DirectAccess,
                ReadReplicaEndpointSpec::PrivateNetwork(pn) => state.private_network_details(pn),
            };
            created.push(state.new_endpoint(&req.read_replica_id, details));
        }
        state.touch(&req.read_replica_id);
        let replica = state
            .replicas
            .get_mut(&req.read_replica_id)
            .ok_or_else(|| not_found("read replica", &req.read_replica_id))?;
        replica.endpoints.extend(created);
        Ok(replica.clone())
    }

    async fn delete_read_replica(&self, req: DeleteReadReplicaRequest) -> ApiResult<ReadReplica> {
        let mut state = self.lock();
        state.record("delete_read_replica", &req.read_replica_id);
        state.touch(&req.read_replica_id);
        let replica = state
            .replicas
            .get_mut(&req.read_replica_id)
            .ok_or_else(|| not_found("read replica", &req.read_replica_id))?;
        replica.status = ReadReplicaStatus::Deleting;
        Ok(replica.clone())
    }
}

/// Provider settings with a fast poll interval
pub fn test_config() -> ProviderConfig {
    ProviderConfig {
        wait: WaitConfig {
            retry_interval_ms: Some(1),
            timeout_secs: 30,
        },
        ..ProviderConfig::new(REGION)
    }
    .with_project(PROJECT)
}

/// Registry backed by `fake`, with every wait shortened to 1ms
pub fn registry(fake: &Arc<FakeDocumentDb>) -> ProviderRegistry {
    scwflow_cloud::logging::try_init();
    set_default_retry_interval(Duration::from_millis(1));
    let api: Arc<dyn DocumentDbApi> = fake.clone();
    DocumentDbProvider::new(api, test_config()).registry()
}

pub async fn apply(
    registry: &ProviderRegistry,
    kind: &str,
    op: Operation,
    data: &mut ResourceData,
) -> Result<()> {
    registry
        .dispatch(kind, op, &Context::background(), data)
        .await
}

/// Regional id of a bare uuid in the test region
pub fn regional(id: &str) -> String {
    format!("{}/{}", REGION, id)
}

/// Current attributes of `data` as a JSON object
pub fn state_of(data: &ResourceData) -> serde_json::Value {
    serde_json::Value::Object(data.attributes().clone())
}
