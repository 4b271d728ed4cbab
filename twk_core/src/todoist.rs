//! Todoist REST client and the task creation loop.

use log::{error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::GroupedTasks;

static API_URL: &str = "https://api.todoist.com/rest/v2";

/// Task attributes shared by every created reminder.
pub static PRIORITY: u8 = 3;
pub static DURATION_MINUTES: u32 = 5;
pub static DURATION_UNIT: &str = "minute";
pub static TASK_LABEL: &str = "api";
pub static DUE_TIME: &str = "9pm";
static TASK_SUFFIX: &str = "wegbringen";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("todoist request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("todoist rejected the request with status {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct NewTask<'a> {
    pub content: String,
    pub due_string: String,
    pub project_id: &'a str,
    pub priority: u8,
    pub duration: u32,
    pub duration_unit: &'a str,
    pub labels: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
pub struct CreatedTask {
    pub content: String,
    pub due: Option<TaskDue>,
}

#[derive(Debug, Deserialize)]
pub struct TaskDue {
    pub date: String,
}

pub struct TodoistClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl TodoistClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, API_URL)
    }

    /// Client against a non-default endpoint, used by the tests.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    /// Fetch all projects of the account.
    pub async fn projects(&self) -> Result<Vec<Project>, RemoteError> {
        let response = self
            .http
            .get(format!("{}/projects", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Create a single task.
    pub async fn add_task(&self, task: &NewTask<'_>) -> Result<CreatedTask, RemoteError> {
        let response = self
            .http
            .post(format!("{}/tasks", self.base_url))
            .bearer_auth(&self.token)
            .json(task)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Create one task per grouped reminder date, in date order.
///
/// A failed call is logged with its date and does not abort the remaining
/// dates. Returns the number of tasks created without error.
pub async fn create_all(client: &TodoistClient, grouped: &GroupedTasks, project_id: &str) -> usize {
    let mut created = 0;
    for (remind_date, bins) in grouped {
        let task = NewTask {
            content: format!("{} {TASK_SUFFIX}", bins.join(" && ")),
            due_string: format!("{remind_date} {DUE_TIME}"),
            project_id,
            priority: PRIORITY,
            duration: DURATION_MINUTES,
            duration_unit: DURATION_UNIT,
            labels: [TASK_LABEL],
        };
        match client.add_task(&task).await {
            Ok(task) => {
                let due = task.due.map(|due| due.date).unwrap_or_default();
                info!("task \"{}\" due {due} created", task.content);
                created += 1;
            }
            Err(err) => error!("failed creating task for '{remind_date}': {err}"),
        }
    }
    created
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::{create_all, RemoteError, TodoistClient};
    use crate::schedule::GroupedTasks;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::from_str(value).unwrap()
    }

    #[tokio::test]
    async fn test_projects() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/projects")
            .match_header("authorization", "Bearer token-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"1","name":"Inbox","color":"grey"},{"id":"2","name":"Haushalt"}]"#)
            .create_async()
            .await;
        let client = TodoistClient::with_base_url("token-123", server.url());
        let projects = client.projects().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].id, "2");
        assert_eq!(projects[1].name, "Haushalt");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_projects_propagates_api_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/projects")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;
        let client = TodoistClient::with_base_url("bad-token", server.url());
        let result = client.projects().await;
        assert!(matches!(result, Err(RemoteError::Api { status: 401, .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_all_joins_bins_into_one_task() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks")
            .match_body(Matcher::PartialJson(json!({
                "content": "Bio && Papier wegbringen",
                "due_string": "2025-03-01 9pm",
                "project_id": "42",
                "priority": 3,
                "duration": 5,
                "duration_unit": "minute",
                "labels": ["api"],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content":"Bio && Papier wegbringen","due":{"date":"2025-03-01"}}"#)
            .create_async()
            .await;
        let client = TodoistClient::with_base_url("token", server.url());
        let mut grouped = GroupedTasks::new();
        grouped.insert(date("2025-03-01"), vec!["Bio", "Papier"]);
        let created = create_all(&client, &grouped, "42").await;
        assert_eq!(created, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_all_continues_after_failure() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("POST", "/tasks")
            .match_body(Matcher::PartialJson(json!({"due_string": "2025-03-01 9pm"})))
            .with_status(500)
            .with_body("server error")
            .create_async()
            .await;
        let succeeding = server
            .mock("POST", "/tasks")
            .match_body(Matcher::PartialJson(json!({"due_string": "2025-03-05 9pm"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content":"Papier wegbringen","due":{"date":"2025-03-05"}}"#)
            .create_async()
            .await;
        let client = TodoistClient::with_base_url("token", server.url());
        let mut grouped = GroupedTasks::new();
        grouped.insert(date("2025-03-01"), vec!["Bio"]);
        grouped.insert(date("2025-03-05"), vec!["Papier"]);
        let created = create_all(&client, &grouped, "42").await;
        assert_eq!(created, 1);
        failing.assert_async().await;
        succeeding.assert_async().await;
    }
}
