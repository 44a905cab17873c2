//! HTTPS client for the vSphere management endpoint

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use url::Url;

use vappdeploy_api::{
    CloneRequest, DatastoreSummary, EntityKind, EntitySummary, InventoryRef, PowerOnMultiRequest,
    TaskHandle, TaskInfo, VmRuntime,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::traits::{ManagementApi, TaskMonitor};

/// Header carrying the session token
const SESSION_HEADER: &str = "vmware-api-session-id";

/// Session-based client for the management endpoint
///
/// Cheap to share behind an `Arc`; all workers of a run issue requests
/// through the same session.
#[derive(Clone)]
pub struct VsphereClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
    session: Arc<RwLock<Option<String>>>,
}

impl VsphereClient {
    /// Create a new client
    ///
    /// No request is made until [`ManagementApi::login`].
    ///
    /// # Errors
    /// Returns an error if the endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.endpoint)?;
        let client = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            username: config.username,
            password: config.password,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Build a full URL from a path
    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(ClientError::Url)
    }

    fn entity_path(entity: &InventoryRef) -> String {
        format!("/api/inventory/{}/{}", entity.kind.type_name(), entity.id)
    }

    /// URL of an entity action, e.g. `...?action=clone`
    fn action_url(&self, entity: &InventoryRef, action: &str) -> Result<Url> {
        let mut url = self.url(&Self::entity_path(entity))?;
        url.query_pairs_mut().append_pair("action", action);
        Ok(url)
    }

    async fn token(&self) -> Result<String> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(ClientError::NotAuthenticated)
    }

    /// Map non-2xx responses to errors
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
            StatusCode::UNAUTHORIZED => Err(ClientError::Authentication(message)),
            _ => Err(ClientError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }

    /// Perform an authenticated GET request and deserialize the response
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let token = self.token().await?;
        let response = self
            .client
            .get(url)
            .header(SESSION_HEADER, token)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    /// Perform an authenticated POST returning a task handle
    async fn post_task(&self, url: Url, body: Option<impl Serialize>) -> Result<TaskHandle> {
        let token = self.token().await?;
        let mut request = self.client.post(url).header(SESSION_HEADER, token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        let task: TaskHandle = Self::check(response).await?.json().await?;
        debug!(task = %task.id, "task submitted");
        Ok(task)
    }
}

#[async_trait]
impl TaskMonitor for VsphereClient {
    #[instrument(skip(self), level = "debug")]
    async fn task_info(&self, task: &TaskHandle) -> Result<TaskInfo> {
        self.get(&format!("/api/cis/tasks/{}", task.id)).await
    }
}

#[async_trait]
impl ManagementApi for VsphereClient {
    async fn login(&self) -> Result<()> {
        let url = self.url("/api/session")?;
        info!(endpoint = %self.base_url, user = %self.username, "opening session");

        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let token: String = Self::check(response).await?.json().await?;
        if token.is_empty() {
            return Err(ClientError::InvalidResponse(
                "empty session token".to_string(),
            ));
        }

        *self.session.write().await = Some(token);
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        let Some(token) = self.session.write().await.take() else {
            return Ok(());
        };

        let url = self.url("/api/session")?;
        let response = self
            .client
            .delete(url)
            .header(SESSION_HEADER, token)
            .send()
            .await?;

        if let Err(e) = Self::check(response).await {
            warn!(error = %e, "failed to close session");
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn search(&self, kind: EntityKind) -> Result<Vec<EntitySummary>> {
        self.get(&format!("/api/inventory/{}", kind.type_name()))
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn entity(&self, entity: &InventoryRef) -> Result<EntitySummary> {
        self.get(&Self::entity_path(entity)).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn host_datastores(&self, host: &InventoryRef) -> Result<Vec<InventoryRef>> {
        self.get(&format!("{}/datastores", Self::entity_path(host)))
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn datastore_summary(&self, datastore: &InventoryRef) -> Result<DatastoreSummary> {
        self.get(&format!("{}/summary", Self::entity_path(datastore)))
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn resource_pool_owner(&self, pool: &InventoryRef) -> Result<InventoryRef> {
        self.get(&format!("{}/owner", Self::entity_path(pool)))
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn datacenter_vm_folder(&self, datacenter: &InventoryRef) -> Result<InventoryRef> {
        self.get(&format!("{}/vm-folder", Self::entity_path(datacenter)))
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn vapp_vms(&self, vapp: &InventoryRef) -> Result<Vec<InventoryRef>> {
        self.get(&format!("{}/vms", Self::entity_path(vapp))).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn vm_runtime(&self, vm: &InventoryRef) -> Result<VmRuntime> {
        self.get(&format!("{}/runtime", Self::entity_path(vm))).await
    }

    #[instrument(skip(self, request), fields(name = %request.name), level = "debug")]
    async fn clone_vapp(
        &self,
        source: &InventoryRef,
        request: &CloneRequest,
    ) -> Result<TaskHandle> {
        let url = self.action_url(source, "clone")?;
        self.post_task(url, Some(request)).await
    }

    #[instrument(skip(self, vms), fields(vms = vms.len()), level = "debug")]
    async fn power_on_multi(
        &self,
        datacenter: &InventoryRef,
        vms: &[InventoryRef],
    ) -> Result<TaskHandle> {
        let url = self.action_url(datacenter, "power-on-multi")?;
        let body = PowerOnMultiRequest { vms: vms.to_vec() };
        self.post_task(url, Some(body)).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn power_off_vm(&self, vm: &InventoryRef) -> Result<TaskHandle> {
        let url = self.action_url(vm, "power-off")?;
        self.post_task(url, None::<()>).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn destroy(&self, entity: &InventoryRef) -> Result<TaskHandle> {
        let url = self.action_url(entity, "destroy")?;
        self.post_task(url, None::<()>).await
    }
}
