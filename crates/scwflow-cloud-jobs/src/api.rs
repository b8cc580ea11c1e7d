//! Serverless Jobs API surface

use async_trait::async_trait;
use scwflow_cloud::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Cron trigger of a job definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSchedule {
    /// Five-field cron expression, e.g. `5 4 1 * *`
    pub schedule: String,
    /// IANA time zone, e.g. `Europe/Paris`
    pub timezone: String,
}

/// Change of the cron trigger in an update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronScheduleUpdate {
    Set(CronSchedule),
    Remove,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: String,
    pub name: String,
    pub region: String,
    pub project_id: String,
    /// Millicores
    pub cpu_limit: u32,
    /// MiB
    pub memory_limit: u32,
    /// MiB
    pub local_storage_capacity: u32,
    pub image_uri: String,
    pub command: String,
    pub description: String,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub job_timeout: Option<Duration>,
    #[serde(default)]
    pub cron_schedule: Option<CronSchedule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateJobDefinitionRequest {
    pub region: String,
    pub project_id: Option<String>,
    pub name: String,
    pub cpu_limit: u32,
    pub memory_limit: u32,
    pub local_storage_capacity: Option<u32>,
    pub image_uri: String,
    pub command: String,
    pub description: String,
    pub environment_variables: BTreeMap<String, String>,
    pub job_timeout: Option<Duration>,
    pub cron_schedule: Option<CronSchedule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetJobDefinitionRequest {
    pub region: String,
    pub job_definition_id: String,
}

/// Partial update: `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateJobDefinitionRequest {
    pub region: String,
    pub job_definition_id: String,
    pub name: Option<String>,
    pub cpu_limit: Option<u32>,
    pub memory_limit: Option<u32>,
    pub local_storage_capacity: Option<u32>,
    pub image_uri: Option<String>,
    pub command: Option<String>,
    pub description: Option<String>,
    /// Replaces the whole map, so keys left out are deleted
    pub environment_variables: Option<BTreeMap<String, String>>,
    pub job_timeout: Option<Duration>,
    pub cron_schedule: Option<CronScheduleUpdate>,
}

impl UpdateJobDefinitionRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cpu_limit.is_none()
            && self.memory_limit.is_none()
            && self.local_storage_capacity.is_none()
            && self.image_uri.is_none()
            && self.command.is_none()
            && self.description.is_none()
            && self.environment_variables.is_none()
            && self.job_timeout.is_none()
            && self.cron_schedule.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteJobDefinitionRequest {
    pub region: String,
    pub job_definition_id: String,
}

/// Jobs API client
#[async_trait]
pub trait JobsApi: Send + Sync {
    async fn create_job_definition(
        &self,
        req: CreateJobDefinitionRequest,
    ) -> ApiResult<JobDefinition>;
    async fn get_job_definition(&self, req: GetJobDefinitionRequest) -> ApiResult<JobDefinition>;
    async fn update_job_definition(
        &self,
        req: UpdateJobDefinitionRequest,
    ) -> ApiResult<JobDefinition>;
    async fn delete_job_definition(&self, req: DeleteJobDefinitionRequest) -> ApiResult<()>;
}
