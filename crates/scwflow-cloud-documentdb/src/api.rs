//! DocumentDB API surface
//!
//! Typed requests and responses of the managed DocumentDB service. The HTTP
//! transport lives outside this crate; controllers only see
//! [`DocumentDbApi`].

use async_trait::async_trait;
use ipnet::IpNet;
use scwflow_cloud::{ApiError, Lifecycle};
use serde::{Deserialize, Serialize};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Init setting that turns on engine telemetry
pub const TELEMETRY_SETTING: &str = "telemetry_reporting";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    #[default]
    Unknown,
    Provisioning,
    Initializing,
    Configuring,
    Ready,
    Backuping,
    Snapshotting,
    Restarting,
    Autohealing,
    Deleting,
    DiskFull,
    Locked,
    Error,
}

impl InstanceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InstanceStatus::Ready
                | InstanceStatus::DiskFull
                | InstanceStatus::Locked
                | InstanceStatus::Error
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InstanceStatus::Unknown => "unknown",
            InstanceStatus::Provisioning => "provisioning",
            InstanceStatus::Initializing => "initializing",
            InstanceStatus::Configuring => "configuring",
            InstanceStatus::Ready => "ready",
            InstanceStatus::Backuping => "backuping",
            InstanceStatus::Snapshotting => "snapshotting",
            InstanceStatus::Restarting => "restarting",
            InstanceStatus::Autohealing => "autohealing",
            InstanceStatus::Deleting => "deleting",
            InstanceStatus::DiskFull => "disk_full",
            InstanceStatus::Locked => "locked",
            InstanceStatus::Error => "error",
        }
    }
}

/// Storage class of an instance volume
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeType {
    /// Local SSD, sized by the node type
    #[serde(rename = "local", alias = "lssd")]
    Local,
    /// Network block storage, sized explicitly
    #[default]
    #[serde(rename = "block", alias = "bssd")]
    Block,
}

impl VolumeType {
    pub fn as_str(self) -> &'static str {
        match self {
            VolumeType::Local => "local",
            VolumeType::Block => "block",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(rename = "type")]
    pub kind: VolumeType,
    pub size_gb: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSetting {
    pub name: String,
    pub value: String,
}

impl InstanceSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub region: String,
    pub project_id: String,
    pub status: InstanceStatus,
    pub engine: String,
    pub node_type: String,
    pub is_ha_cluster: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub volume: Volume,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub init_settings: Vec<InstanceSetting>,
}

impl Instance {
    pub fn init_setting(&self, name: &str) -> Option<&str> {
        self.init_settings
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value.as_str())
    }
}

impl Lifecycle for Instance {
    fn status_label(&self) -> String {
        self.status.as_str().to_string()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateNetworkDetails {
    pub private_network_id: String,
    pub service_ip: IpNet,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointDetails {
    LoadBalancer,
    DirectAccess,
    PrivateNetwork(PrivateNetworkDetails),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    /// Owning instance (or read replica), bare id
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    pub port: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    pub details: EndpointDetails,
}

impl Endpoint {
    pub fn private_network(&self) -> Option<&PrivateNetworkDetails> {
        match &self.details {
            EndpointDetails::PrivateNetwork(pn) => Some(pn),
            _ => None,
        }
    }

    pub fn is_load_balancer(&self) -> bool {
        matches!(self.details, EndpointDetails::LoadBalancer)
    }

    pub fn is_direct_access(&self) -> bool {
        matches!(self.details, EndpointDetails::DirectAccess)
    }
}

/// Private network attachment request. Without a `service_ip` the address
/// is allocated by IPAM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateNetworkEndpointSpec {
    pub private_network_id: String,
    #[serde(default)]
    pub service_ip: Option<IpNet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointSpec {
    LoadBalancer,
    PrivateNetwork(PrivateNetworkEndpointSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadReplicaEndpointSpec {
    DirectAccess,
    PrivateNetwork(PrivateNetworkEndpointSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub owner: String,
    pub managed: bool,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Readonly,
    Readwrite,
    All,
    Custom,
    #[default]
    None,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Readonly => "readonly",
            Permission::Readwrite => "readwrite",
            Permission::All => "all",
            Permission::Custom => "custom",
            Permission::None => "none",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    pub database_name: String,
    pub user_name: String,
    pub permission: Permission,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadReplicaStatus {
    #[default]
    Unknown,
    Provisioning,
    Initializing,
    Configuring,
    Ready,
    Deleting,
    Promoting,
    Locked,
    Error,
}

impl ReadReplicaStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReadReplicaStatus::Ready | ReadReplicaStatus::Error | ReadReplicaStatus::Locked
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReadReplicaStatus::Unknown => "unknown",
            ReadReplicaStatus::Provisioning => "provisioning",
            ReadReplicaStatus::Initializing => "initializing",
            ReadReplicaStatus::Configuring => "configuring",
            ReadReplicaStatus::Ready => "ready",
            ReadReplicaStatus::Deleting => "deleting",
            ReadReplicaStatus::Promoting => "promoting",
            ReadReplicaStatus::Locked => "locked",
            ReadReplicaStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReplica {
    pub id: String,
    pub region: String,
    pub instance_id: String,
    pub status: ReadReplicaStatus,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    pub same_zone: bool,
}

impl Lifecycle for ReadReplica {
    fn status_label(&self) -> String {
        self.status.as_str().to_string()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One in-place change applied by `upgrade_instance`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTarget {
    VolumeType(VolumeType),
    VolumeSizeGb(u64),
    NodeType(String),
    EnableHa(bool),
}

// Requests

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateInstanceRequest {
    pub region: String,
    pub project_id: Option<String>,
    pub name: String,
    pub engine: String,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub node_type: String,
    pub is_ha_cluster: bool,
    pub tags: Vec<String>,
    pub init_settings: Vec<InstanceSetting>,
    pub volume_type: VolumeType,
    pub volume_size_gb: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetInstanceRequest {
    pub region: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListInstancesRequest {
    pub region: String,
    pub project_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateInstanceRequest {
    pub region: String,
    pub instance_id: String,
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeInstanceRequest {
    pub region: String,
    pub instance_id: String,
    pub target: UpgradeTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteInstanceRequest {
    pub region: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDatabaseRequest {
    pub region: String,
    pub instance_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDatabasesRequest {
    pub region: String,
    pub instance_id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteDatabaseRequest {
    pub region: String,
    pub instance_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub region: String,
    pub instance_id: String,
    pub name: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUsersRequest {
    pub region: String,
    pub instance_id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUserRequest {
    pub region: String,
    pub instance_id: String,
    pub name: String,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteUserRequest {
    pub region: String,
    pub instance_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetPrivilegeRequest {
    pub region: String,
    pub instance_id: String,
    pub database_name: String,
    pub user_name: String,
    pub permission: Permission,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPrivilegesRequest {
    pub region: String,
    pub instance_id: String,
    pub database_name: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEndpointRequest {
    pub region: String,
    pub instance_id: String,
    pub spec: EndpointSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetEndpointRequest {
    pub region: String,
    pub endpoint_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateEndpointRequest {
    pub region: String,
    pub endpoint_id: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteEndpointRequest {
    pub region: String,
    pub endpoint_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReadReplicaRequest {
    pub region: String,
    pub instance_id: String,
    pub endpoint_specs: Vec<ReadReplicaEndpointSpec>,
    pub same_zone: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetReadReplicaRequest {
    pub region: String,
    pub read_replica_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReadReplicaEndpointRequest {
    pub region: String,
    pub read_replica_id: String,
    pub endpoint_specs: Vec<ReadReplicaEndpointSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReadReplicaRequest {
    pub region: String,
    pub read_replica_id: String,
}

/// DocumentDB API client
#[async_trait]
pub trait DocumentDbApi: Send + Sync {
    async fn create_instance(&self, req: CreateInstanceRequest) -> ApiResult<Instance>;
    async fn get_instance(&self, req: GetInstanceRequest) -> ApiResult<Instance>;
    async fn list_instances(&self, req: ListInstancesRequest) -> ApiResult<Vec<Instance>>;
    async fn update_instance(&self, req: UpdateInstanceRequest) -> ApiResult<Instance>;
    async fn upgrade_instance(&self, req: UpgradeInstanceRequest) -> ApiResult<Instance>;
    async fn delete_instance(&self, req: DeleteInstanceRequest) -> ApiResult<Instance>;

    async fn create_database(&self, req: CreateDatabaseRequest) -> ApiResult<Database>;
    async fn list_databases(&self, req: ListDatabasesRequest) -> ApiResult<Vec<Database>>;
    async fn delete_database(&self, req: DeleteDatabaseRequest) -> ApiResult<()>;

    async fn create_user(&self, req: CreateUserRequest) -> ApiResult<User>;
    async fn list_users(&self, req: ListUsersRequest) -> ApiResult<Vec<User>>;
    async fn update_user(&self, req: UpdateUserRequest) -> ApiResult<User>;
    async fn delete_user(&self, req: DeleteUserRequest) -> ApiResult<()>;

    async fn set_privilege(&self, req: SetPrivilegeRequest) -> ApiResult<Privilege>;
    async fn list_privileges(&self, req: ListPrivilegesRequest) -> ApiResult<Vec<Privilege>>;

    async fn create_endpoint(&self, req: CreateEndpointRequest) -> ApiResult<Endpoint>;
    async fn get_endpoint(&self, req: GetEndpointRequest) -> ApiResult<Endpoint>;
    async fn migrate_endpoint(&self, req: MigrateEndpointRequest) -> ApiResult<Endpoint>;
    async fn delete_endpoint(&self, req: DeleteEndpointRequest) -> ApiResult<()>;

    async fn create_read_replica(&self, req: CreateReadReplicaRequest) -> ApiResult<ReadReplica>;
    async fn get_read_replica(&self, req: GetReadReplicaRequest) -> ApiResult<ReadReplica>;
    async fn create_read_replica_endpoint(
        &self,
        req: CreateReadReplicaEndpointRequest,
    ) -> ApiResult<ReadReplica>;
    async fn delete_read_replica(&self, req: DeleteReadReplicaRequest) -> ApiResult<ReadReplica>;
}
