extern crate log;

use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};
use std::env;

mod chart;
mod cli;
mod config;
mod github;
mod publish;
mod registry;
mod values;
mod version;
mod workflow;

use crate::config::Config;
use crate::github::GithubClient;

pub(crate) struct Context {
    client: GithubClient,
    config: Config,
}

impl Context {
    fn new(client: GithubClient, config: Config) -> Self {
        Self { client, config }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::App::parse();
    let ctx = Context::new(
        GithubClient::new(env::var("GITHUB_TOKEN").ok())?,
        Config::new(args.repo_root.clone()),
    );

    run(&ctx, &args).await
}

async fn run(ctx: &Context, args: &cli::App) -> Result<()> {
    if args.dry_run {
        info!("Dry run mode - no changes will be made");
    }

    info!("Fetching latest versions...");

    let latest_tag = match ctx.client.latest_semver_tag(&ctx.config.upstream_repo).await {
        Some(tag) => tag,
        None => bail!(
            "no semantic version tag found for {}",
            ctx.config.upstream_repo
        ),
    };
    println!("Latest OpenHands tag: {latest_tag}");

    let deploy_tag = match &args.deploy_tag {
        Some(tag) => {
            info!("Using deploy tag override: {tag}");
            Some(tag.clone())
        }
        None => ctx.client.latest_semver_tag(&ctx.config.deploy_repo).await,
    };
    match &deploy_tag {
        Some(tag) => println!("Latest deploy tag: {tag}"),
        None => warn!("No deploy semantic version tag found"),
    }

    let deploy_config =
        workflow::fetch_deploy_config(&ctx.client, &ctx.config.deploy_repo, deploy_tag.as_deref())
            .await;
    match &deploy_config {
        Some(config) => {
            println!(
                "Deploy config (from {}):",
                deploy_tag.as_deref().unwrap_or("default branch")
            );
            println!("  OPENHANDS_SHA: {}", config.openhands_sha);
            println!(
                "  OPENHANDS_RUNTIME_IMAGE_TAG: {}",
                config.openhands_runtime_image_tag
            );
            println!("  RUNTIME_API_SHA: {}", config.runtime_api_sha);
        }
        None => warn!("Could not fetch deploy config"),
    }

    let runtime_api_version = registry::latest_chart_version(&ctx.config.registry_package).await;
    match &runtime_api_version {
        Some(version) => println!("Latest runtime-api chart version: {version}"),
        None => warn!("Could not fetch runtime-api version"),
    }

    info!("Updating Chart.yaml...");
    chart::update_chart(
        &ctx.config.chart_path(),
        &latest_tag,
        runtime_api_version.as_deref(),
        args.dry_run,
    )?;

    if let Some(config) = &deploy_config {
        info!("Updating values.yaml...");
        values::update_values(
            &ctx.config.values_path(),
            &config.openhands_sha,
            &config.runtime_api_sha,
            &config.openhands_runtime_image_tag,
            args.dry_run,
        )?;
    }

    let branch = publish::branch_name(&latest_tag);
    if args.dry_run {
        println!("Would create draft PR with branch: {branch}");
    } else {
        println!("Creating draft PR with branch: {branch}");
        match publish::create_branch_and_pr(ctx, &latest_tag).await {
            Some(url) => println!("Draft PR created: {url}"),
            None => println!("Failed to create PR"),
        }
    }

    Ok(())
}
