//! Flux task management on Kapacitor
//!
//! Kapacitor 1.6+ exposes Flux tasks under `/kapacitor/v1/api/v2/tasks`.
//! Older releases, or releases with Flux tasks disabled, answer the listing
//! with a 404; that is reported as [`TaskListing::Unavailable`] rather than as
//! an error.

use crate::config::KapacitorSettings;
use crate::error::{error_for_status, ApiError};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

const TASKS_PATH: &str = "/kapacitor/v1/api/v2/tasks";

/// Shown instead of a task list when the server has no Flux task support
pub const FLUX_TASKS_UNAVAILABLE: &str =
    "No flux tasks are available. Kapacitor 1.6+ is required with Flux tasks enabled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Inactive,
}

impl TaskStatus {
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Active => TaskStatus::Inactive,
            TaskStatus::Inactive => TaskStatus::Active,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Active => write!(f, "active"),
            TaskStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Last run outcome reported by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Failed,
    Success,
    Canceled,
}

/// A Flux task as returned by the task API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluxTask {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub flux: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(rename = "orgID", default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_status: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FluxTask {
    pub fn is_active(&self) -> bool {
        self.status == Some(TaskStatus::Active)
    }

    /// Status after a toggle; a task without status counts as inactive
    pub fn next_status(&self) -> TaskStatus {
        if self.is_active() {
            TaskStatus::Inactive
        } else {
            TaskStatus::Active
        }
    }
}

/// Outcome of loading the task list
#[derive(Debug, Clone, PartialEq)]
pub enum TaskListing {
    Available(Vec<FluxTask>),
    /// The server does not support Flux tasks
    Unavailable,
}

/// Remote task operations
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<FluxTask>, ApiError>;

    async fn delete_task(&self, id: &str) -> Result<(), ApiError>;

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<(), ApiError>;
}

/// Load the task list, keeping tasks whose name contains `name_filter`
pub async fn load_tasks(api: &dyn TaskApi, name_filter: &str) -> Result<TaskListing, ApiError> {
    let tasks = match api.list_tasks().await {
        Ok(tasks) => tasks,
        Err(e) if e.is_not_found() => {
            warn!("flux task API not available");
            return Ok(TaskListing::Unavailable);
        }
        Err(e) => return Err(e),
    };

    if name_filter.is_empty() {
        return Ok(TaskListing::Available(tasks));
    }

    Ok(TaskListing::Available(
        tasks
            .into_iter()
            .filter(|t| t.name.contains(name_filter))
            .collect(),
    ))
}

/// User-facing text for a failed task list load
pub fn describe_load_error(err: &ApiError) -> String {
    match err.server_message() {
        Some(message) => message.to_string(),
        None => format!("Cannot load flux task: {}", err),
    }
}

/// Flip a task between active and inactive, returning the updated task
pub async fn toggle_task_status(api: &dyn TaskApi, task: &FluxTask) -> Result<FluxTask, ApiError> {
    let status = task.next_status();
    api.update_task_status(&task.id, status).await?;

    info!(task = %task.name, %status, "flux task status updated");
    Ok(FluxTask {
        status: Some(status),
        ..task.clone()
    })
}

/// Delete a task
pub async fn remove_task(api: &dyn TaskApi, task: &FluxTask) -> Result<(), ApiError> {
    api.delete_task(&task.id).await?;
    info!(task = %task.name, "flux task deleted");
    Ok(())
}

/// Swap `updated` into `tasks` by id
pub fn replace_task(tasks: &mut [FluxTask], updated: &FluxTask) {
    for task in tasks.iter_mut().filter(|t| t.id == updated.id) {
        *task = updated.clone();
    }
}

#[derive(Debug, Deserialize)]
struct TaskList {
    #[serde(default)]
    tasks: Vec<FluxTask>,
}

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: TaskStatus,
}

/// [`TaskApi`] over Kapacitor's HTTP API
#[derive(Debug, Clone)]
pub struct KapacitorTaskClient {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    limit: usize,
}

impl KapacitorTaskClient {
    pub fn new(settings: &KapacitorSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.url.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            limit: settings.task_limit,
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}{}", self.base_url, TASKS_PATH)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/{}", self.tasks_url(), id)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        }
    }
}

#[async_trait]
impl TaskApi for KapacitorTaskClient {
    async fn list_tasks(&self) -> Result<Vec<FluxTask>, ApiError> {
        let response = self
            .request(Method::GET, self.tasks_url())
            .query(&[("limit", self.limit)])
            .send()
            .await?;
        let body: TaskList = error_for_status(response).await?.json().await?;
        Ok(body.tasks)
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let response = self.request(Method::DELETE, self.task_url(id)).send().await?;
        error_for_status(response).await?;
        Ok(())
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<(), ApiError> {
        let response = self
            .request(Method::PATCH, self.task_url(id))
            .json(&StatusUpdate { status })
            .send()
            .await?;
        error_for_status(response).await?;
        Ok(())
    }
}
