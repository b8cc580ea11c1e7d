//! Instance and read replica waiters

use crate::api::{DocumentDbApi, GetInstanceRequest, GetReadReplicaRequest, Instance, ReadReplica};
use async_trait::async_trait;
use scwflow_cloud::{
    CloudError, Context, ParentWait, Result, WaitOptions, expand_id, wait_for,
};

/// Polls an instance until it is ready or failed
pub async fn wait_for_instance(
    ctx: &Context,
    api: &dyn DocumentDbApi,
    region: &str,
    instance_id: &str,
    options: &WaitOptions,
) -> Result<Instance> {
    let req = GetInstanceRequest {
        region: region.to_string(),
        instance_id: expand_id(instance_id),
    };
    let label = format!("instance {}/{}", req.region, req.instance_id);
    wait_for(ctx, options, &label, || {
        let req = req.clone();
        async move { api.get_instance(req).await.map_err(CloudError::from) }
    })
    .await
}

/// Polls a read replica until it is ready or failed
pub async fn wait_for_read_replica(
    ctx: &Context,
    api: &dyn DocumentDbApi,
    region: &str,
    read_replica_id: &str,
    options: &WaitOptions,
) -> Result<ReadReplica> {
    let req = GetReadReplicaRequest {
        region: region.to_string(),
        read_replica_id: expand_id(read_replica_id),
    };
    let label = format!("read replica {}/{}", req.region, req.read_replica_id);
    wait_for(ctx, options, &label, || {
        let req = req.clone();
        async move { api.get_read_replica(req).await.map_err(CloudError::from) }
    })
    .await
}

/// Parent instance that child mutations serialize on
pub struct InstanceWaiter<'a> {
    ctx: &'a Context,
    api: &'a dyn DocumentDbApi,
    region: String,
    instance_id: String,
    options: WaitOptions,
}

impl<'a> InstanceWaiter<'a> {
    pub fn new(
        ctx: &'a Context,
        api: &'a dyn DocumentDbApi,
        region: &str,
        instance_id: &str,
        options: WaitOptions,
    ) -> Self {
        Self {
            ctx,
            api,
            region: region.to_string(),
            instance_id: expand_id(instance_id),
            options,
        }
    }

    pub async fn wait(&self) -> Result<Instance> {
        wait_for_instance(
            self.ctx,
            self.api,
            &self.region,
            &self.instance_id,
            &self.options,
        )
        .await
    }
}

#[async_trait]
impl ParentWait for InstanceWaiter<'_> {
    async fn wait_ready(&self) -> Result<()> {
        self.wait().await.map(|_| ())
    }

    fn describe(&self) -> String {
        format!("instance {}/{}", self.region, self.instance_id)
    }
}
