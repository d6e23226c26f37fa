use std::path::Path;

use anyhow::{bail, Context as anyhowContext, Result};
use log::warn;
use tokio::process::Command;

use crate::config::{CHART_FILE, VALUES_FILE};
use crate::Context;

pub(crate) fn branch_name(app_version: &str) -> String {
    format!("update-openhands-chart-{app_version}")
}

/// Branch from origin/main, commit just the two chart files, push, and open
/// a draft PR. Returns the PR url; any failure is logged and answered with
/// None after a best-effort restore of the original branch.
pub(crate) async fn create_branch_and_pr(ctx: &Context, app_version: &str) -> Option<String> {
    if !ctx.client.is_authenticated() {
        warn!("GITHUB_TOKEN required to create PR");
        return None;
    }

    let repo_root = &ctx.config.repo_root;
    let original_branch = match git(repo_root, &["rev-parse", "--abbrev-ref", "HEAD"]).await {
        Ok(branch) => branch,
        Err(e) => {
            warn!("Could not determine current branch: {e:#}");
            return None;
        }
    };

    match publish(ctx, app_version, &original_branch).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Error creating PR: {e:#}");
            if let Err(e) = git(repo_root, &["checkout", &original_branch]).await {
                warn!("Could not restore branch {original_branch}: {e:#}");
            }
            None
        }
    }
}

async fn publish(ctx: &Context, app_version: &str, original_branch: &str) -> Result<String> {
    let root = &ctx.config.repo_root;
    let branch = branch_name(app_version);

    // Carry the freshly patched chart files across the branch switch.
    git(root, &["stash", "push", "-m", "temp-chart-updates"]).await?;
    git(root, &["fetch", "origin", "main"]).await?;
    git(root, &["checkout", "-b", &branch, "origin/main"]).await?;
    git(root, &["stash", "pop"]).await?;
    git(root, &["add", CHART_FILE, VALUES_FILE]).await?;

    let title = format!("Update OpenHands chart to {app_version}");
    git(root, &["commit", "-m", &title]).await?;
    git(root, &["push", "-u", "origin", &branch]).await?;

    let repo = &ctx.config.chart_repo;
    let pr = ctx
        .client
        .pulls(&repo.owner, &repo.name)
        .create(&title, &branch, "main")
        .body(format!(
            "Automated update of OpenHands Helm chart to version {app_version}."
        ))
        .draft(true)
        .send()
        .await
        .context(format!("Creating draft PR for {repo}"))?;

    git(root, &["checkout", original_branch]).await?;

    pr.html_url
        .context("PR should have a html url")
        .map(|url| url.to_string())
}

/// Run git in `root`, returning trimmed stdout. A non-zero exit becomes an
/// error carrying stderr.
async fn git(root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .await
        .with_context(|| format!("running git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_name_embeds_the_version() {
        assert_eq!(branch_name("1.2.3"), "update-openhands-chart-1.2.3");
    }

    #[tokio::test]
    async fn git_captures_stdout() {
        let out = git(Path::new("."), &["--version"]).await.unwrap();
        assert!(out.starts_with("git version"));
    }

    #[tokio::test]
    async fn git_surfaces_failures_with_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        git(dir.path(), &["init"]).await.unwrap();

        // no commits yet, so HEAD cannot resolve
        let err = git(dir.path(), &["rev-parse", "HEAD"]).await.unwrap_err();
        assert!(err.to_string().contains("git rev-parse HEAD failed"));
    }
}
