use std::path::PathBuf;

use clap::Parser;

/// Keep the OpenHands helm chart in step with upstream releases
#[derive(Debug, Parser)]
#[clap(name = "groundskeeper", version)]
pub(crate) struct App {
    /// Show what would be updated without making changes
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Deploy repo tag to read the workflow from, skipping tag resolution
    #[arg(long)]
    pub deploy_tag: Option<String>,

    /// Path to the chart repository checkout
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,
}
