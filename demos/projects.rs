//! Project CRUD built on top of the envelope client.
//!
//! This example shows how a resource collaborator uses the core:
//! - Compose resource paths and query options
//! - Create, fetch, update, list and delete documents
//! - Branch on API errors through the status code capability
//!
//! Run with:
//! `API_URL=https://dev.example.com/api API_USER=admin API_TOKEN=... cargo run --example projects`

use envelope_client::{CancellationToken, Client, Error};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(dead_code)]
struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(rename = "forkedFromId", skip_serializing_if = "Option::is_none")]
    forked_from_id: Option<u64>,
    name: String,
    description: String,
    #[serde(rename = "issueManagementEnabled")]
    issue_management_enabled: bool,
}

struct Projects<'a> {
    client: &'a Client,
}

impl Projects<'_> {
    async fn list(
        &self,
        offset: u32,
        count: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Project>, Error> {
        let options = [format!("offset={}", offset), format!("count={}", count)];
        self.client.list("projects", &options, cancel).await?.data_as()
    }

    async fn get(&self, id: u64, cancel: &CancellationToken) -> Result<Project, Error> {
        self.client
            .find_by_id(&format!("projects/{}", id), &[] as &[&str], cancel)
            .await?
            .data_as()
    }

    async fn create(&self, project: &Project, cancel: &CancellationToken) -> Result<u64, Error> {
        self.client.create("projects", project, cancel).await?.data_as()
    }

    async fn update(&self, project: &Project, cancel: &CancellationToken) -> Result<(), Error> {
        let id = project
            .id
            .ok_or_else(|| Error::ConfigurationError("project has no id set".to_string()))?;
        self.client
            .update(&format!("projects/{}", id), project, cancel)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: u64, cancel: &CancellationToken) -> Result<(), Error> {
        self.client
            .delete(&format!("projects/{}", id), &[] as &[&str], cancel)
            .await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("envelope_client=debug,projects=info")
        .init();

    let base_url =
        std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:6610/api".to_string());
    let user = std::env::var("API_USER").unwrap_or_else(|_| "admin".to_string());
    let token = std::env::var("API_TOKEN").unwrap_or_default();

    let client = Client::new(base_url, user, token, Duration::from_secs(30))?;
    let projects = Projects { client: &client };

    // Cancel everything on Ctrl-C.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    println!("=== Create ===");
    let mut project = Project {
        id: None,
        forked_from_id: None,
        name: "envelope-demo".to_string(),
        description: "Created by the envelope-client demo".to_string(),
        issue_management_enabled: true,
    };
    let id = projects.create(&project, &cancel).await?;
    project.id = Some(id);
    println!("Created project {}", id);

    println!("=== Update ===");
    project.description = "Updated by the envelope-client demo".to_string();
    projects.update(&project, &cancel).await?;
    println!("Fetched back: {:?}", projects.get(id, &cancel).await?);

    println!("=== List ===");
    for project in projects.list(0, 100, &cancel).await? {
        println!("{:?} {}", project.id, project.name);
    }

    println!("=== Delete ===");
    projects.delete(id, &cancel).await?;
    match projects.get(id, &cancel).await {
        Err(e) if e.http_code() == Some(404) => println!("Project {} is gone", id),
        Err(e) => return Err(e),
        Ok(project) => println!("Project still present: {:?}", project),
    }

    Ok(())
}
