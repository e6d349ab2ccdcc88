//! Release hosting operations, backed by the `gh` CLI.
//!
//! [`ReleaseHost`] is the narrow interface the pipeline needs from the
//! hosting service. [`GhCli`] implements it by shelling out to `gh`; tests
//! substitute an in-memory host.

use std::path::Path;
use std::process::{Output, Stdio};

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::Error;

/// A release as reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub prerelease: bool,

    /// ISO-8601 UTC publication time; absent for drafts
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Everything needed to create a release.
#[derive(Debug, Clone)]
pub struct NewRelease<'a> {
    /// `owner/name` of the repository receiving the release
    pub repository: &'a str,
    pub tag: &'a str,
    pub title: &'a str,
    pub notes_file: &'a Path,
    pub mark_as_latest: bool,
}

/// A created release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHandle {
    pub repository: String,
    pub tag: String,
    /// Web location printed by the host, if any
    pub url: Option<String>,
}

/// Operations the pipeline needs from the release host.
#[allow(async_fn_in_trait)]
pub trait ReleaseHost {
    /// Names of at most `limit` repositories in the organization.
    async fn list_repositories(&self, organization: &str, limit: usize)
    -> Result<Vec<String>, Error>;

    /// All releases of a repository, newest first.
    async fn list_releases(&self, repository: &str) -> Result<Vec<Release>, Error>;

    /// The release registered under `tag`, if there is one.
    async fn release_by_tag(&self, repository: &str, tag: &str)
    -> Result<Option<Release>, Error>;

    async fn create_release(&self, release: NewRelease<'_>) -> Result<ReleaseHandle, Error>;

    async fn upload_asset(&self, handle: &ReleaseHandle, path: &Path) -> Result<(), Error>;
}

/// [`ReleaseHost`] implemented with the GitHub CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl Default for GhCli {
    fn default() -> Self {
        Self {
            program: "gh".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RepositoryEntry {
    name: String,
}

impl GhCli {
    /// Use a specific `gh` executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn output(&self, args: &[&str]) -> Result<Output, Error> {
        debug!(program = %self.program, ?args, "running");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::io(format!("failed to run {} {}", self.program, args.join(" ")), e))
    }

    /// Run a read-only query and capture stdout.
    async fn query(&self, args: &[&str]) -> Result<String, Error> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(Error::Query {
                message: format!(
                    "{} {}: {}",
                    self.program,
                    args.join(" "),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                code: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a mutating command; failures are publish failures.
    async fn publish(&self, tag: &str, args: &[&str]) -> Result<String, Error> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(Error::Publish {
                tag: tag.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                code: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(what: &str, text: &str) -> Result<T, Error> {
    serde_json::from_str(text).map_err(|e| Error::Query {
        message: format!("unexpected {what} response: {e}"),
        code: None,
    })
}

/// `gh api --paginate` prints one JSON array per page, back to back.
fn parse_pages<T: serde::de::DeserializeOwned>(what: &str, text: &str) -> Result<Vec<T>, Error> {
    let mut items = Vec::new();
    for page in serde_json::Deserializer::from_str(text).into_iter::<Vec<T>>() {
        let page = page.map_err(|e| Error::Query {
            message: format!("unexpected {what} response: {e}"),
            code: None,
        })?;
        items.extend(page);
    }
    Ok(items)
}

impl ReleaseHost for GhCli {
    async fn list_repositories(
        &self,
        organization: &str,
        limit: usize,
    ) -> Result<Vec<String>, Error> {
        let limit = limit.to_string();
        let text = self
            .query(&["repo", "list", organization, "--limit", &limit, "--json", "name"])
            .await?;
        let entries: Vec<RepositoryEntry> = parse_json("repository listing", &text)?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    async fn list_releases(&self, repository: &str) -> Result<Vec<Release>, Error> {
        let endpoint = format!("repos/{repository}/releases?per_page=100");
        let text = self.query(&["api", "--paginate", &endpoint]).await?;
        parse_pages("release listing", &text)
    }

    async fn release_by_tag(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<Option<Release>, Error> {
        let endpoint = format!("repos/{repository}/releases/tags/{tag}");
        // Any failed lookup, 404 included, means there is no release to collide with.
        match self.query(&["api", &endpoint]).await {
            Ok(text) => parse_json("release", &text).map(Some),
            Err(Error::Query { message, .. }) => {
                debug!(%message, "no release found for tag");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_release(&self, release: NewRelease<'_>) -> Result<ReleaseHandle, Error> {
        let notes = release.notes_file.to_string_lossy();
        let latest = format!("--latest={}", release.mark_as_latest);
        let url = self
            .publish(
                release.tag,
                &[
                    "release",
                    "create",
                    release.tag,
                    "--repo",
                    release.repository,
                    "--title",
                    release.title,
                    "--notes-file",
                    &notes,
                    &latest,
                ],
            )
            .await?;
        Ok(ReleaseHandle {
            repository: release.repository.to_string(),
            tag: release.tag.to_string(),
            url: Some(url).filter(|u| !u.is_empty()),
        })
    }

    async fn upload_asset(&self, handle: &ReleaseHandle, path: &Path) -> Result<(), Error> {
        let asset = path.to_string_lossy();
        self.publish(
            &handle.tag,
            &["release", "upload", &handle.tag, &asset, "--repo", &handle.repository],
        )
        .await?;
        Ok(())
    }
}
