use anyhow::{Context, Result};
use log::warn;
use octocrab::{models::repos::Content, Octocrab};

use crate::config::RepoId;
use crate::version::semver_pattern;

pub(crate) struct GithubClient {
    client: Octocrab,
    authenticated: bool,
}

impl std::ops::Deref for GithubClient {
    type Target = Octocrab;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        let authenticated = token.is_some();
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }
        let client = builder.build().context("building github client")?;
        Ok(Self {
            client,
            authenticated,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// First tag that is exactly MAJOR.MINOR.PATCH, in the order github
    /// returns them (newest first). None covers both "no such tag" and any
    /// API error, which is logged here rather than propagated.
    pub async fn latest_semver_tag(&self, repo: &RepoId) -> Option<String> {
        match self.find_semver_tag(repo).await {
            Ok(tag) => tag,
            Err(e) => {
                warn!("Error fetching tags from {repo}: {e:#}");
                None
            }
        }
    }

    async fn find_semver_tag(&self, repo: &RepoId) -> Result<Option<String>> {
        let re = semver_pattern();
        let mut page = self
            .repos(&repo.owner, &repo.name)
            .list_tags()
            .per_page(100)
            .send()
            .await?;

        loop {
            if let Some(tag) = page.items.iter().find(|tag| re.is_match(&tag.name)) {
                return Ok(Some(tag.name.clone()));
            }
            match self.get_page(&page.next).await? {
                Some(next) => page = next,
                None => return Ok(None),
            }
        }
    }

    pub async fn get_file_content(
        &self,
        repo: &RepoId,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Content> {
        let repos = self.repos(&repo.owner, &repo.name);
        let mut request = repos.get_content().path(path);
        if let Some(reference) = reference {
            request = request.r#ref(reference);
        }
        request
            .send()
            .await?
            .items
            .pop()
            .context(format!("Getting file content for {repo}/{path}"))
    }
}
