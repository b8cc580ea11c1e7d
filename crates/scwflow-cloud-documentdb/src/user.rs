//! `documentdb_user` controller
//!
//! The backend serializes user mutations per instance, so create and delete
//! go through [`retry_on_conflict`]. The password is write-only.

use crate::api::{CreateUserRequest, DeleteUserRequest, ListUsersRequest, UpdateUserRequest, User};
use crate::helpers::{DocumentDb, new_instance_child_id, parse_user_id};
use async_trait::async_trait;
use scwflow_cloud::schema::validators;
use scwflow_cloud::{
    Attribute, CloudError, Context, LocalityCheck, Operation, ParentWait, ProviderConfig,
    ResourceController, ResourceData, ResourceDiff, Result, ResultExt, Schema, diff, expand_id,
    parse_regional, retry_on_conflict, with_parent_ready,
};
use serde::Deserialize;
use serde_json::json;

pub const KIND: &str = "documentdb_user";

#[derive(Debug, Clone, Default, Deserialize)]
struct UserSpec {
    #[serde(default)]
    instance_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    is_admin: bool,
}

/// Finds `name` among the users of an instance
pub(crate) async fn find_user(
    ctx: &Context,
    db: &DocumentDb,
    region: &str,
    instance_id: &str,
    name: &str,
) -> Result<Option<User>> {
    let req = ListUsersRequest {
        region: region.to_string(),
        instance_id: instance_id.to_string(),
        name: Some(name.to_string()),
    };
    let users = ctx
        .run(db.api().list_users(req))
        .await
        .context("listing documentdb users")?;
    Ok(users.into_iter().find(|u| u.name == name))
}

pub struct UserController {
    db: DocumentDb,
}

impl UserController {
    pub fn new(db: DocumentDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResourceController for UserController {
    fn kind(&self) -> &str {
        KIND
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute(
                "instance_id",
                Attribute::required_string()
                    .force_new()
                    .suppress_diff(diff::locality),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .force_new()
                    .validate_with(validators::non_empty_string),
            )
            .with_attribute(
                "password",
                Attribute::required_string()
                    .sensitive()
                    .validate_with(validators::non_empty_string),
            )
            .with_attribute(
                "is_admin",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute("region", Attribute::region())
    }

    fn customize_diff(&self, diff: &ResourceDiff, meta: &ProviderConfig) -> Result<()> {
        LocalityCheck::new(["instance_id"]).check(diff, meta)
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let spec: UserSpec = data.decode()?;
        let region = self.db.region(data, Some(spec.instance_id.as_str()));
        let instance_id = expand_id(&spec.instance_id);
        let timeout = data.timeout(Operation::Create);

        let api = self.db.api();
        let waiter = self.db.instance_waiter(ctx, &region, &instance_id, timeout);
        waiter
            .wait_ready()
            .await
            .context("waiting for documentdb instance")?;

        let req = CreateUserRequest {
            region: region.clone(),
            instance_id: instance_id.clone(),
            name: spec.name.clone(),
            password: spec.password.clone().unwrap_or_default(),
            is_admin: spec.is_admin,
        };
        let user = retry_on_conflict(ctx, timeout, &waiter, || {
            let req = req.clone();
            async move { api.create_user(req).await.map_err(CloudError::from) }
        })
        .await
        .context("creating documentdb user")?;

        waiter
            .wait_ready()
            .await
            .context("waiting for documentdb instance")?;
        data.set_id(new_instance_child_id(&region, &instance_id, &user.name));
        tracing::info!("Created documentdb user {} on instance {}", user.name, instance_id);
        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let (instance, name) = parse_user_id(data.require_id()?)?;
        let instance = parse_regional(&instance)?;

        let waiter = self.db.instance_waiter(
            ctx,
            &instance.region,
            &instance.id,
            data.timeout(Operation::Read),
        );
        match waiter.wait().await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("waiting for documentdb instance")),
        }

        let Some(user) = find_user(ctx, &self.db, &instance.region, &instance.id, &name).await?
        else {
            tracing::warn!("documentdb user {} is gone, removing it from state", name);
            data.clear_id();
            return Ok(());
        };

        data.set("instance_id", instance.to_string())?;
        data.set("name", &user.name)?;
        data.set("is_admin", user.is_admin)?;
        data.set("region", &instance.region)?;
        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let (instance, name) = parse_user_id(data.require_id()?)?;
        let instance = parse_regional(&instance)?;
        let spec: UserSpec = data.decode()?;

        let password = spec.password.clone().filter(|_| data.has_change("password"));
        let is_admin = data.has_change("is_admin").then_some(spec.is_admin);
        if password.is_some() || is_admin.is_some() {
            let api = self.db.api();
            let waiter = self.db.instance_waiter(
                ctx,
                &instance.region,
                &instance.id,
                data.timeout(Operation::Update),
            );
            let req = UpdateUserRequest {
                region: instance.region.clone(),
                instance_id: instance.id.clone(),
                name,
                password,
                is_admin,
            };
            with_parent_ready(&waiter, || async move {
                ctx.run(api.update_user(req))
                    .await
                    .context("updating documentdb user")
            })
            .await?;
        }

        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let (instance, name) = parse_user_id(data.require_id()?)?;
        let instance = parse_regional(&instance)?;
        let timeout = data.timeout(Operation::Delete);

        let api = self.db.api();
        let waiter = self
            .db
            .instance_waiter(ctx, &instance.region, &instance.id, timeout);
        match waiter.wait_ready().await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("waiting for documentdb instance")),
        }

        let req = DeleteUserRequest {
            region: instance.region.clone(),
            instance_id: instance.id.clone(),
            name,
        };
        let result = retry_on_conflict(ctx, timeout, &waiter, || {
            let req = req.clone();
            async move { api.delete_user(req).await.map_err(CloudError::from) }
        })
        .await;
        match result {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("deleting documentdb user")),
        }

        match waiter.wait_ready().await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("waiting for documentdb instance")),
        }
        data.clear_id();
        Ok(())
    }
}
