use std::fmt;
use std::path::PathBuf;

/// Chart files relative to the repo root, as staged in the update commit.
pub(crate) const CHART_FILE: &str = "charts/openhands/Chart.yaml";
pub(crate) const VALUES_FILE: &str = "charts/openhands/values.yaml";

#[derive(Debug, Clone)]
pub(crate) struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything the pipeline needs to know about where things live.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub repo_root: PathBuf,
    /// Tags here drive appVersion.
    pub upstream_repo: RepoId,
    /// Holds the deploy workflow with the pinned image identifiers.
    pub deploy_repo: RepoId,
    /// Where the update PR is opened.
    pub chart_repo: RepoId,
    /// ghcr.io path of the runtime-api dependency chart.
    pub registry_package: String,
}

impl Config {
    pub fn new(repo_root: PathBuf) -> Self {
        Self {
            repo_root,
            upstream_repo: RepoId::new("OpenHands", "OpenHands"),
            deploy_repo: RepoId::new("OpenHands", "deploy"),
            chart_repo: RepoId::new("All-Hands-AI", "OpenHands-Cloud"),
            registry_package: "all-hands-ai/helm-charts/runtime-api".to_owned(),
        }
    }

    pub fn chart_path(&self) -> PathBuf {
        self.repo_root.join(CHART_FILE)
    }

    pub fn values_path(&self) -> PathBuf {
        self.repo_root.join(VALUES_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_at_the_checkout() {
        let config = Config::new(PathBuf::from("/repo"));
        assert_eq!(
            config.chart_path(),
            PathBuf::from("/repo/charts/openhands/Chart.yaml")
        );
        assert_eq!(
            config.values_path(),
            PathBuf::from("/repo/charts/openhands/values.yaml")
        );
    }
}
