//! `documentdb_privilege` controller
//!
//! The backend has no delete verb for privileges: deleting one sets its
//! permission to `none`. A privilege whose user no longer exists is gone.

use crate::api::{ListPrivilegesRequest, Permission, Privilege, SetPrivilegeRequest};
use crate::helpers::{DocumentDb, PrivilegeId, parse_privilege_id};
use crate::user::find_user;
use async_trait::async_trait;
use scwflow_cloud::{
    Attribute, CloudError, Context, LocalityCheck, Operation, ParentWait, ProviderConfig,
    ResourceController, ResourceData, ResourceDiff, Result, ResultExt, Schema, diff, expand_id,
    retry_on_conflict,
};
use serde::Deserialize;
use serde_json::Value;

pub const KIND: &str = "documentdb_privilege";

#[derive(Debug, Clone, Default, Deserialize)]
struct PrivilegeSpec {
    #[serde(default)]
    instance_id: String,
    #[serde(default)]
    database_name: String,
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    permission: Permission,
}

fn validate_permission(value: &Value) -> std::result::Result<(), String> {
    serde_json::from_value::<Permission>(value.clone())
        .map(|_| ())
        .map_err(|_| {
            format!(
                "{} is not a permission (readonly, readwrite, all, custom, none)",
                value
            )
        })
}

pub struct PrivilegeController {
    db: DocumentDb,
}

impl PrivilegeController {
    pub fn new(db: DocumentDb) -> Self {
        Self { db }
    }

    /// Sets the permission between waits on the instance, retrying on 409
    async fn set_permission(
        &self,
        ctx: &Context,
        id: &PrivilegeId,
        permission: Permission,
        op: Operation,
        data: &ResourceData,
    ) -> Result<Privilege> {
        let api = self.db.api();
        let timeout = data.timeout(op);
        let waiter = self
            .db
            .instance_waiter(ctx, &id.region, &id.instance_id, timeout);
        waiter
            .wait_ready()
            .await
            .context("waiting for documentdb instance")?;

        let req = SetPrivilegeRequest {
            region: id.region.clone(),
            instance_id: id.instance_id.clone(),
            database_name: id.database_name.clone(),
            user_name: id.user_name.clone(),
            permission,
        };
        let privilege = retry_on_conflict(ctx, timeout, &waiter, || {
            let req = req.clone();
            async move { api.set_privilege(req).await.map_err(CloudError::from) }
        })
        .await
        .context("setting documentdb privilege")?;

        waiter
            .wait_ready()
            .await
            .context("waiting for documentdb instance")?;
        Ok(privilege)
    }
}

#[async_trait]
impl ResourceController for PrivilegeController {
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
            .with_attribute("database_name", Attribute::required_string().force_new())
            .with_attribute("user_name", Attribute::required_string().force_new())
            .with_attribute(
                "permission",
                Attribute::required_string().validate_with(validate_permission),
            )
            .with_attribute("region", Attribute::region())
    }

    fn customize_diff(&self, diff: &ResourceDiff, meta: &ProviderConfig) -> Result<()> {
        LocalityCheck::new(["instance_id"]).check(diff, meta)
    }

    async fn create(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let spec: PrivilegeSpec = data.decode()?;
        let id = PrivilegeId {
            region: self.db.region(data, Some(spec.instance_id.as_str())),
            instance_id: expand_id(&spec.instance_id),
            database_name: spec.database_name.clone(),
            user_name: spec.user_name.clone(),
        };

        self.set_permission(ctx, &id, spec.permission, Operation::Create, data)
            .await?;
        tracing::info!("Granted {} on {}", spec.permission.as_str(), id);
        data.set_id(id.to_string());
        self.read(ctx, data).await
    }

    async fn read(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_privilege_id(data.require_id()?)?;

        let waiter = self.db.instance_waiter(
            ctx,
            &id.region,
            &id.instance_id,
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

        if find_user(ctx, &self.db, &id.region, &id.instance_id, &id.user_name)
            .await?
            .is_none()
        {
            tracing::warn!("user {} is gone, removing privilege {} from state", id.user_name, id);
            data.clear_id();
            return Ok(());
        }

        let req = ListPrivilegesRequest {
            region: id.region.clone(),
            instance_id: id.instance_id.clone(),
            database_name: Some(id.database_name.clone()),
            user_name: Some(id.user_name.clone()),
        };
        let privileges = ctx
            .run(self.db.api().list_privileges(req))
            .await
            .context("listing documentdb privileges")?;
        let Some(privilege) = privileges.into_iter().next() else {
            return Err(CloudError::Transport(format!(
                "no privilege returned for user {} on database {} although the user exists",
                id.user_name, id.database_name
            )));
        };

        data.set("instance_id", format!("{}/{}", id.region, id.instance_id))?;
        data.set("database_name", &privilege.database_name)?;
        data.set("user_name", &privilege.user_name)?;
        data.set("permission", privilege.permission.as_str())?;
        data.set("region", &id.region)?;
        Ok(())
    }

    async fn update(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_privilege_id(data.require_id()?)?;
        if data.has_change("permission") {
            let spec: PrivilegeSpec = data.decode()?;
            self.set_permission(ctx, &id, spec.permission, Operation::Update, data)
                .await?;
        }
        self.read(ctx, data).await
    }

    async fn delete(&self, ctx: &Context, data: &mut ResourceData) -> Result<()> {
        let id = parse_privilege_id(data.require_id()?)?;
        let timeout = data.timeout(Operation::Delete);

        let api = self.db.api();
        let db = &self.db;
        let waiter = db.instance_waiter(ctx, &id.region, &id.instance_id, timeout);
        match waiter.wait_ready().await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.with_context("waiting for documentdb instance")),
        }

        if find_user(ctx, db, &id.region, &id.instance_id, &id.user_name)
            .await?
            .is_none()
        {
            tracing::info!("user {} is already gone, nothing to revoke", id.user_name);
            data.clear_id();
            return Ok(());
        }

        let req = SetPrivilegeRequest {
            region: id.region.clone(),
            instance_id: id.instance_id.clone(),
            database_name: id.database_name.clone(),
            user_name: id.user_name.clone(),
            permission: Permission::None,
        };
        let id_ref = &id;
        retry_on_conflict(ctx, timeout, &waiter, || {
            let req = req.clone();
            async move {
                // The user may disappear between two attempts.
                match find_user(ctx, db, &id_ref.region, &id_ref.instance_id, &id_ref.user_name)
                    .await
                {
                    Ok(Some(_)) => {}
                    Ok(None) => return Ok(()),
                    Err(e) if e.is_not_found() => return Ok(()),
                    Err(e) => return Err(e),
                }
                api.set_privilege(req)
                    .await
                    .map(|_| ())
                    .map_err(CloudError::from)
            }
        })
        .await
        .context("revoking documentdb privilege")?;

        match waiter.wait_ready().await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.with_context("waiting for documentdb instance")),
        }
        tracing::info!("Revoked privilege {}", id);
        data.clear_id();
        Ok(())
    }
}
