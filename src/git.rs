//! Git history retrieval.
//!
//! Each repository is cloned bare into the run workspace and its history
//! is read along the first-parent line only, so merged side branches show
//! up as their merge commit.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Field separator in `git log` output; cannot appear in a subject.
const FIELD_SEP: char = '\x1f';

/// A git repository handle.
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Open an existing repository (bare or not) at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Clone `url` into `dest` as a bare repository.
    pub async fn clone_bare(url: &str, dest: &Path) -> Result<Self, Error> {
        let dest_arg = dest.to_string_lossy();
        run_git(None, &["clone", "--bare", "--quiet", url, &dest_arg]).await?;
        Ok(Self::open(dest))
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether any branch exists. False only for a freshly created,
    /// empty repository.
    pub async fn has_branches(&self) -> Result<bool, Error> {
        let output = self
            .run_output(&["for-each-ref", "--count=1", "--format=%(refname)", "refs/heads"])
            .await?;
        Ok(!output.trim().is_empty())
    }

    /// First-parent history of HEAD, newest first.
    ///
    /// With `since`, commits whose committer date is earlier than it are
    /// left out; a commit dated exactly at the boundary is kept.
    pub async fn first_parent_log(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LogEntry>, Error> {
        let format = format!("--format=%h{FIELD_SEP}%H{FIELD_SEP}%s");
        let mut args = vec!["log".to_string(), "--first-parent".to_string(), format];
        if let Some(since) = since {
            args.push(format!("--since={}", since.format("%Y-%m-%d %H:%M:%S +0000")));
        }
        args.push("HEAD".to_string());

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run_output(&args).await?;
        output.lines().map(LogEntry::parse).collect()
    }

    /// Run a git command in this repository and capture its stdout.
    async fn run_output(&self, args: &[&str]) -> Result<String, Error> {
        run_git(Some(&self.root), args).await
    }
}

async fn run_git(dir: Option<&Path>, args: &[&str]) -> Result<String, Error> {
    debug!(?dir, ?args, "running git");
    let mut command = Command::new("git");
    command
        .args(args)
        .stdin(Stdio::null())
        .env("GIT_TERMINAL_PROMPT", "0")
        .kill_on_drop(true);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }

    let output = command
        .output()
        .await
        .map_err(|e| Error::Exec(format!("git {}: {e}", args.first().unwrap_or(&""))))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(Error::Failed {
            command: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            code: output.status.code(),
        })
    }
}

/// One line of first-parent history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub short_id: String,
    pub full_id: String,
    pub summary: String,
}

impl LogEntry {
    fn parse(line: &str) -> Result<Self, Error> {
        let mut fields = line.splitn(3, FIELD_SEP);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(short_id), Some(full_id), Some(summary)) if !full_id.is_empty() => Ok(Self {
                short_id: short_id.to_string(),
                full_id: full_id.to_string(),
                summary: summary.to_string(),
            }),
            _ => Err(Error::Parse(line.to_string())),
        }
    }
}

/// A commit ready to be listed in the notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub short_id: String,
    pub full_id: String,
    pub summary: String,
    /// Web location of the commit
    pub url: String,
}

impl CommitEntry {
    pub fn from_log(entry: LogEntry, config: &Config, repository: &str) -> Self {
        let url = config.commit_url(repository, &entry.full_id);
        Self {
            short_id: entry.short_id,
            full_id: entry.full_id,
            summary: entry.summary,
            url,
        }
    }

    /// The entry as a markdown list item.
    pub fn to_markdown(&self) -> String {
        format!("- {} [{}]({})", self.summary, self.short_id, self.url)
    }
}

/// Source of the commits that go into one repository's section.
#[allow(async_fn_in_trait)]
pub trait CommitSource {
    /// Commits of `repository` inside the window, newest first.
    ///
    /// An empty result means the repository gets no section. Failing to
    /// read history is an error, never an empty result.
    async fn collect(
        &self,
        repository: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitEntry>, crate::Error>;
}

/// Clones each repository into a workspace directory and reads its
/// first-parent history.
pub struct GitCollector<'a> {
    config: &'a Config,
    workspace: &'a Path,
}

impl<'a> GitCollector<'a> {
    pub fn new(config: &'a Config, workspace: &'a Path) -> Self {
        Self { config, workspace }
    }
}

impl CommitSource for GitCollector<'_> {
    async fn collect(
        &self,
        repository: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitEntry>, crate::Error> {
        let url = self.config.clone_url(repository);
        let dest = self.workspace.join(format!("{repository}.git"));
        info!(%repository, %url, "fetching history");

        let fetch_failed = |e: Error| e.into_fetch_failure(repository);
        let git = Git::clone_bare(&url, &dest).await.map_err(fetch_failed)?;

        if !git.has_branches().await.map_err(fetch_failed)? {
            warn!(%repository, "repository has no branches");
            return Ok(Vec::new());
        }

        let log = git.first_parent_log(since).await.map_err(fetch_failed)?;
        Ok(log
            .into_iter()
            .map(|entry| CommitEntry::from_log(entry, self.config, repository))
            .collect())
    }
}

/// Errors from git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to execute: {0}")]
    Exec(String),

    #[error("{command} failed: {stderr}")]
    Failed {
        command: String,
        stderr: String,
        code: Option<i32>,
    },

    #[error("unexpected git log line: {0:?}")]
    Parse(String),
}

impl Error {
    fn into_fetch_failure(self, repository: &str) -> crate::Error {
        let code = match &self {
            Error::Failed { code, .. } => *code,
            _ => None,
        };
        crate::Error::HistoryFetch {
            repository: repository.to_string(),
            message: self.to_string(),
            code,
        }
    }
}
