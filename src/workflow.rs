use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;

use crate::config::RepoId;
use crate::github::GithubClient;

const WORKFLOW_PATH: &str = ".github/workflows/deploy.yaml";

/// Image identifiers pinned by the deploy workflow's env block. Absent
/// entries come back as empty strings.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeployConfig {
    #[serde(rename = "OPENHANDS_SHA", default)]
    pub openhands_sha: String,
    #[serde(rename = "OPENHANDS_RUNTIME_IMAGE_TAG", default)]
    pub openhands_runtime_image_tag: String,
    #[serde(rename = "RUNTIME_API_SHA", default)]
    pub runtime_api_sha: String,
}

#[derive(Debug, Deserialize)]
struct DeployWorkflow {
    #[serde(default)]
    env: DeployConfig,
}

/// Fetch and decode the deploy workflow at `reference`, pulling out the
/// env values the chart cares about.
pub(crate) async fn fetch_deploy_config(
    client: &GithubClient,
    repo: &RepoId,
    reference: Option<&str>,
) -> Option<DeployConfig> {
    if !client.is_authenticated() {
        warn!("GITHUB_TOKEN required to access deploy workflow");
        return None;
    }

    match fetch(client, repo, reference).await {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Error fetching deploy config: {e:#}");
            None
        }
    }
}

async fn fetch(
    client: &GithubClient,
    repo: &RepoId,
    reference: Option<&str>,
) -> Result<DeployConfig> {
    let file = client.get_file_content(repo, WORKFLOW_PATH, reference).await?;
    let content = file
        .decoded_content()
        .context(format!("Getting content for {repo}/{WORKFLOW_PATH}"))?;

    let workflow: DeployWorkflow =
        serde_yaml::from_str(&content).context(format!("parsing {WORKFLOW_PATH}"))?;
    Ok(workflow.env)
}
