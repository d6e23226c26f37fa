use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;

use crate::version::latest_semver;

const REGISTRY_HOST: &str = "ghcr.io";

#[derive(Debug, Deserialize)]
struct RegistryToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct TagList {
    tags: Option<Vec<String>>,
}

/// Latest semver version of a chart package on ghcr.io, resolved through
/// the anonymous pull-token flow. None when the package has no semver tag
/// or the lookup fails.
pub(crate) async fn latest_chart_version(package: &str) -> Option<String> {
    match list_tags(package).await {
        Ok(tags) => latest_semver(&tags),
        Err(e) => {
            warn!("Error fetching {package} tags from {REGISTRY_HOST}: {e:#}");
            None
        }
    }
}

async fn list_tags(package: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::new();

    let token_url = format!("https://{REGISTRY_HOST}/token?scope=repository:{package}:pull");
    let token: RegistryToken = client
        .get(token_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("decoding registry token")?;

    let tags_url = format!("https://{REGISTRY_HOST}/v2/{package}/tags/list");
    let listing: TagList = client
        .get(tags_url)
        .bearer_auth(&token.token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("decoding tag list")?;

    Ok(listing.tags.unwrap_or_default())
}
