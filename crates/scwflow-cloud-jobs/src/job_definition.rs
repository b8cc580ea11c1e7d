//! `job_definition` controller
//!
//! Job definitions have no lifecycle status, so every operation is a single
//! call. `timeout` is a duration string and `env` is replaced as a whole on
//! update.

use crate::api::{
    CreateJobDefinitionRequest, CronSchedule, CronScheduleUpdate, DeleteJobDefinitionRequest,
    GetJobDefinitionRequest, JobDefinition, JobsApi, UpdateJobDefinitionRequest,
};
use async_trait::async_trait;
use scwflow_cloud::schema::validators;
use scwflow_cloud::{
    Attribute, AttributeType, CloudError, Context, Presence, ProviderConfig, ResourceController,
    ResourceData, Result, ResultExt, Schema, diff, format_duration, new_regional_string,
    parse_duration, parse_regional, random_name,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const KIND: &str = "job_definition";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct CronBlock {
    #[serde(default)]
    schedule: String,
    #[serde(default)]
    timezone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct JobDefinitionSpec {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cpu_limit: u32,
    #[serde(default)]
    memory_limit: u32,
    #[serde(default)]
    local_storage_capacity: Option<u32>,
    #[serde(default)]
    image_uri: String,
    #[serde(default)]
    command: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    timeout: Option<String>,
    #[serde(default)]
    cron: Vec<CronBlock>,
}

/// Parses `timeout`, pinning failures to the attribute
fn expand_timeout(timeout: Option<&str>) -> Result<Option<Duration>> {
    match timeout.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_duration(s)
            .map(Some)
            .map_err(|e| CloudError::invalid_attribute("timeout", e.to_string())),
    }
}

fn check_cron(block: &CronBlock) -> Result<()> {
    if block.schedule.trim().is_empty() {
        return Err(CloudError::invalid_attribute(
            "cron.0.schedule",
            "schedule is required in a cron block",
        ));
    }
    if block.timezone.trim().is_empty() {
        return Err(CloudError::invalid_attribute(
            "cron.0.timezone",
            "timezone is required in a cron block",
        ));
    }
    Ok(())
}

fn expand_create_cron(blocks: &[CronBlock]) -> Result<Option<CronSchedule>> {
    let Some(block) = blocks.first() else {
        return Ok(None);
    };
    check_cron(block)?;
    Ok(Some(CronSchedule {
        schedule: block.schedule.clone(),
        timezone: block.timezone.clone(),
    }))
}

/// An emptied block list removes the schedule
fn expand_update_cron(blocks: &[CronBlock]) -> Result<CronScheduleUpdate> {
    Ok(match expand_create_cron(blocks)? {
        Some(schedule) => CronScheduleUpdate::Set(schedule),
        None => CronScheduleUpdate::Remove,
    })
}

fn validate_cron(value: &Value) -> std::result::Result<(), String> {
    let blocks: Vec<CronBlock> =
        serde_json::from_value(value.clone()).map_err(|e| format!("invalid cron block: {}", e))?;
    if blocks.len() > 1 {
        return Err(format!("at most one cron block is allowed, got {}", blocks.len()));
    }
    blocks
        .first()
        .map(check_cron)
        .transpose()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn hydrate(data: &mut ResourceData, region: &str, job: &JobDefinition) -> Result<()> {
    data.set("name", &job.name)?;
    data.set("cpu_limit", job.cpu_limit)?;
    data.set("memory_limit", job.memory_limit)?;
    data.set("local_storage_capacity", job.local_storage_capacity)?;
    data.set("image_uri", &job.image_uri)?;
    data.set("command", &job.command)?;
    data.set("description", &job.description)?;
    data.set("env", &job.environment_variables)?;
    data.set("timeout", job.job_timeout.map(format_duration))?;
    data.set(
        "cron",
        job.cron_schedule
            .iter()
            .map(|c| serde_json::json!({ "schedule": c.schedule, "timezone": c.timezone }))
            .collect::<Vec<_>>(),
    )?;
    data.set("project_id", &job.project_id)?;
    data.set("region", region)?;
    Ok(())
}

pub struct JobDefinitionController {
    api: Arc<dyn JobsApi>,
    meta: ProviderConfig,
}

impl JobDefinitionController {
    pub fn new(api: Arc<dyn JobsApi>, meta: ProviderConfig) -> Self {
        Self { api, meta }
    }

    fn region(&self, data: &ResourceData) -> String {
        data.get_str("region")
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| self.meta.region.clone())
    }
}

#[async_trait]
impl ResourceController for JobDefinitionController {
    fn kind(&self) -> &str {
        KIND
    }

    fn schema(&self) -> Schema {
        let mut cron = BTreeMap::new();
        cron.insert(
            "schedule".to_string(),
            Attribute::required_string().describe("Cron expression"),
        );
        cron.insert(
            "timezone".to_string(),
            Attribute::required_string().describe("IANA time zone"),
        );

        Schema::new()
            .with_attribute(
                "name",
                Attribute::optional_string()
                    .computed()
                    .describe("Generated as job-<suffix> when left blank"),
            )
            .with_attribute(
                "cpu_limit",
                Attribute::required_int()
                    .validate_with(validators::positive_int)
                    .describe("CPU limit in millicores"),
            )
            .with_attribute(
                "memory_limit",
                Attribute::required_int()
                    .validate_with(validators::positive_int)
                    .describe("Memory limit in MiB"),
            )
            .with_attribute(
                "local_storage_capacity",
                Attribute::optional_int().computed(),
            )
            .with_attribute("image_uri", Attribute::optional_string())
            .with_attribute("command", Attribute::optional_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "env",
                Attribute::new(
                    AttributeType::Map(Box::new(AttributeType::String)),
                    Presence::Optional,
                ),
            )
            .with_attribute(
                "timeout",
                Attribute::optional_string()
                    .computed()
                    .validate_with(validators::duration)
                    .suppress_diff(diff::duration),
            )
            .with_attribute(
                "cron",
                Attribute::block(cron, Some(1)).validate_with(validate_cron),
            )
            .with_attribute("region", Attribute::region())
            .with_attribute("project_id", Attribute::project_id())
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let spec: JobDefinitionSpec = data.decode()?;
        let region = self.region(data);

        let req = CreateJobDefinitionRequest {
            region: region.clone(),
            project_id: data
                .get_str("project_id")
                .filter(|p| !p.is_empty())
                .or_else(|| self.meta.project_id.clone()),
            name: spec
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| random_name("job")),
            cpu_limit: spec.cpu_limit,
            memory_limit: spec.memory_limit,
            local_storage_capacity: spec.local_storage_capacity,
            image_uri: spec.image_uri.clone(),
            command: spec.command.clone(),
            description: spec.description.clone(),
            environment_variables: spec.env.clone(),
            job_timeout: expand_timeout(spec.timeout.as_deref())?,
            cron_schedule: expand_create_cron(&spec.cron)?,
        };

        let job = ctx
            .run(self.api.create_job_definition(req))
            .await
            .context("creating job definition")?;
        data.set_id(new_regional_string(&region, &job.id));
        tracing::info!("Created job definition {} ({})", job.name, job.id);

        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let req = GetJobDefinitionRequest {
            region: id.region.clone(),
            job_definition_id: id.id.clone(),
        };
        let job = match ctx.run(self.api.get_job_definition(req)).await {
            Ok(job) => job,
            Err(e) if e.is_not_found() => {
                tracing::warn!("job definition {} is gone, removing it from state", id);
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("reading job definition")),
        };

        hydrate(data, &id.region, &job)
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let spec: JobDefinitionSpec = data.decode()?;

        let mut req = UpdateJobDefinitionRequest {
            region: id.region.clone(),
            job_definition_id: id.id.clone(),
            ..Default::default()
        };
        if data.has_change("name") {
            req.name = spec.name.clone().filter(|n| !n.is_empty());
        }
        if data.has_change("cpu_limit") {
            req.cpu_limit = Some(spec.cpu_limit);
        }
        if data.has_change("memory_limit") {
            req.memory_limit = Some(spec.memory_limit);
        }
        if data.has_change("local_storage_capacity") {
            req.local_storage_capacity = spec.local_storage_capacity;
        }
        if data.has_change("image_uri") {
            req.image_uri = Some(spec.image_uri.clone());
        }
        if data.has_change("command") {
            req.command = Some(spec.command.clone());
        }
        if data.has_change("description") {
            req.description = Some(spec.description.clone());
        }
        if data.has_change("env") {
            req.environment_variables = Some(spec.env.clone());
        }
        let timeout = expand_timeout(spec.timeout.as_deref())?;
        let previous: JobDefinitionSpec = data.decode_prior()?;
        // `60s` and `1m0s` are the same timeout.
        let prior = match expand_timeout(previous.timeout.as_deref()) {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!("Unreadable timeout in prior state of {}, resending: {}", id, e);
                None
            }
        };
        if timeout != prior {
            req.job_timeout = timeout;
        }
        if data.has_change("cron") {
            req.cron_schedule = Some(expand_update_cron(&spec.cron)?);
        }

        if !req.is_empty() {
            ctx.run(self.api.update_job_definition(req))
                .await
                .context("updating job definition")?;
            tracing::info!("Updated job definition {}", id);
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_regional(data.require_id()?)?;
        let req = DeleteJobDefinitionRequest {
            region: id.region.clone(),
            job_definition_id: id.id.clone(),
        };
        match ctx.run(self.api.delete_job_definition(req)).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("deleting job definition")),
        }
        data.clear_id();
        Ok(())
    }
}
