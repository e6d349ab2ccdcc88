//! One release run, from tag validation to publication.

use std::path::Path;
use std::process::Stdio;

use chrono::Utc;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::git::GitCollector;
use crate::github::{NewRelease, ReleaseHandle, ReleaseHost};
use crate::{notes, repos, tag, window};

/// External programs a run shells out to.
pub const REQUIRED_TOOLS: &[&str] = &["git", "gh"];

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Build the notes but do not create or upload the release
    pub dry_run: bool,
}

/// What a completed run produced.
#[derive(Debug)]
pub enum Outcome {
    Published {
        handle: ReleaseHandle,
        document: String,
    },
    DryRun {
        document: String,
    },
}

/// Fail with [`Error::ToolMissing`] unless every tool can be started.
pub async fn check_tools(tools: &[&'static str]) -> Result<(), Error> {
    for &tool in tools {
        Command::new(tool)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| Error::ToolMissing { tool, source })?;
    }
    Ok(())
}

/// Validate `raw_tag`, build the notes for every selected repository and
/// publish them as a release of the manifest repository.
///
/// Repository history is cloned into a temporary workspace that is removed
/// when this future completes or is dropped. Nothing is published unless
/// the whole document was assembled.
pub async fn run<H: ReleaseHost>(
    host: &H,
    config: &Config,
    raw_tag: &str,
    options: &RunOptions,
) -> Result<Outcome, Error> {
    let manifest = config.manifest_slug();

    tag::ReleaseTag::parse(raw_tag)?;
    let existing = host.release_by_tag(&manifest, raw_tag).await?;
    let release_tag = tag::validate(raw_tag, existing.as_ref())?;

    let listed = host
        .list_repositories(&config.organization, config.repository_limit)
        .await?;
    if listed.len() >= config.repository_limit {
        warn!(
            limit = config.repository_limit,
            "repository listing hit the limit; later repositories are not considered"
        );
    }
    let repositories = repos::select(&listed, &config.repositories, &config.manifest_repository);
    info!(repositories = ?repositories.names(), "selected repositories");

    let releases = host.list_releases(&manifest).await?;
    let since = window::resolve(&releases);
    match since {
        Some(since) => info!(%since, "collecting commits since last release"),
        None => info!("no previous release, collecting all history"),
    }

    let workspace = tempfile::Builder::new()
        .prefix("manifest-notes-")
        .tempdir()
        .map_err(|e| Error::io("failed to create workspace", e))?;

    let collector = GitCollector::new(config, workspace.path());
    let document = notes::assemble(
        &collector,
        config,
        &repositories,
        since,
        &release_tag,
        Utc::now(),
    )
    .await?;

    let notes_path = workspace.path().join(&config.notes_file);
    write_notes(&notes_path, &document)?;

    if options.dry_run {
        return Ok(Outcome::DryRun { document });
    }

    let title = config
        .release_title
        .as_deref()
        .unwrap_or(release_tag.as_str());
    let handle = host
        .create_release(NewRelease {
            repository: &manifest,
            tag: release_tag.as_str(),
            title,
            notes_file: &notes_path,
            mark_as_latest: config.mark_as_latest,
        })
        .await?;
    host.upload_asset(&handle, &notes_path).await?;
    info!(tag = %release_tag, repository = %manifest, "release published");

    Ok(Outcome::Published { handle, document })
}

fn write_notes(path: &Path, document: &str) -> Result<(), Error> {
    std::fs::write(path, document)
        .map_err(|e| Error::io(format!("failed to write '{}'", path.display()), e))
}
