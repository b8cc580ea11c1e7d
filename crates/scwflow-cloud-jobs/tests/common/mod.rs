//! In-memory Jobs backend

#![allow(dead_code)]

use async_trait::async_trait;
use scwflow_cloud::{ApiError, Context, Operation, ProviderConfig, ProviderRegistry, ResourceData, Result};
use scwflow_cloud_jobs::JobsProvider;
use scwflow_cloud_jobs::api::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const REGION: &str = "fr-par";
pub const PROJECT: &str = "11111111-2222-3333-4444-555555555555";

#[derive(Default)]
pub struct FakeJobs {
    definitions: Mutex<HashMap<String, JobDefinition>>,
    updates: Mutex<Vec<UpdateJobDefinitionRequest>>,
}

impl FakeJobs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn definition(&self, id: &str) -> Option<JobDefinition> {
        self.definitions.lock().unwrap().get(id).cloned()
    }

    /// Every update request received, in order
    pub fn updates(&self) -> Vec<UpdateJobDefinitionRequest> {
        self.updates.lock().unwrap().clone()
    }

    pub fn remove(&self, id: &str) {
        self.definitions.lock().unwrap().remove(id);
    }
}

#[async_trait]
impl JobsApi for FakeJobs {
    async fn create_job_definition(
        &self,
        req: CreateJobDefinitionRequest,
    ) -> ApiResult<JobDefinition> {
        let job = JobDefinition {
            id: uuid::Uuid::new_v4().to_string(),
            name: req.name,
            region: req.region,
            project_id: req.project_id.unwrap_or_else(|| PROJECT.to_string()),
            cpu_limit: req.cpu_limit,
            memory_limit: req.memory_limit,
            local_storage_capacity: req.local_storage_capacity.unwrap_or(1000),
            image_uri: req.image_uri,
            command: req.command,
            description: req.description,
            environment_variables: req.environment_variables,
            job_timeout: req.job_timeout,
            cron_schedule: req.cron_schedule,
        };
        self.definitions
            .lock()
            .unwrap()
            .insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get_job_definition(&self, req: GetJobDefinitionRequest) -> ApiResult<JobDefinition> {
        self.definition(&req.job_definition_id)
            .ok_or_else(|| ApiError::NotFound(format!("job definition {}", req.job_definition_id)))
    }

    async fn update_job_definition(
        &self,
        req: UpdateJobDefinitionRequest,
    ) -> ApiResult<JobDefinition> {
        self.updates.lock().unwrap().push(req.clone());
        let mut definitions = self.definitions.lock().unwrap();
        let job = definitions
            .get_mut(&req.job_definition_id)
            .ok_or_else(|| ApiError::NotFound(format!("job definition {}", req.job_definition_id)))?;

        if let Some(name) = req.name {
            job.name = name;
        }
        if let Some(cpu) = req.cpu_limit {
            job.cpu_limit = cpu;
        }
        if let Some(memory) = req.memory_limit {
            job.memory_limit = memory;
        }
        if let Some(storage) = req.local_storage_capacity {
            job.local_storage_capacity = storage;
        }
        if let Some(image) = req.image_uri {
            job.image_uri = image;
        }
        if let Some(command) = req.command {
            job.command = command;
        }
        if let Some(description) = req.description {
            job.description = description;
        }
        if let Some(env) = req.environment_variables {
            job.environment_variables = env;
        }
        if let Some(timeout) = req.job_timeout {
            job.job_timeout = Some(timeout);
        }
        match req.cron_schedule {
            Some(CronScheduleUpdate::Set(cron)) => job.cron_schedule = Some(cron),
            Some(CronScheduleUpdate::Remove) => job.cron_schedule = None,
            None => {}
        }
        Ok(job.clone())
    }

    async fn delete_job_definition(&self, req: DeleteJobDefinitionRequest) -> ApiResult<()> {
        self.definitions
            .lock()
            .unwrap()
            .remove(&req.job_definition_id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("job definition {}", req.job_definition_id)))
    }
}

pub fn registry(fake: &Arc<FakeJobs>) -> ProviderRegistry {
    scwflow_cloud::logging::try_init();
    let api: Arc<dyn JobsApi> = fake.clone();
    JobsProvider::new(api, ProviderConfig::new(REGION)).registry()
}

pub async fn apply(
    registry: &ProviderRegistry,
    op: Operation,
    data: &mut ResourceData,
) -> Result<()> {
    registry
        .dispatch(
            scwflow_cloud_jobs::job_definition::KIND,
            op,
            &Context::background(),
            data,
        )
        .await
}

pub fn state_of(data: &ResourceData) -> serde_json::Value {
    serde_json::Value::Object(data.attributes().clone())
}
