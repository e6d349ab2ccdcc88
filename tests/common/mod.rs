//! Shared fixtures: throwaway git repositories and an in-memory release host.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use anyhow::{Context, bail};
use manifest_notes::github::{NewRelease, Release, ReleaseHandle, ReleaseHost};
use manifest_notes::{Config, Error};
use tempfile::TempDir;

pub const ORG: &str = "acme";

/// A directory standing in for the organization on the git host.
///
/// Repositories live at `<root>/acme/<name>.git`, so a config whose
/// `clone_base` is `<root>/` clones them like remote ones.
pub struct Org {
    dir: TempDir,
}

impl Org {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join(ORG))?;
        Ok(Self { dir })
    }

    pub fn clone_base(&self) -> String {
        format!("{}/", self.dir.path().display())
    }

    pub fn config(&self, manifest: &str, repositories: &[&str]) -> Config {
        let mut config = Config::from_toml(&format!(
            "organization = \"{ORG}\"\nmanifest_repository = \"{manifest}\"\n"
        ))
        .expect("valid config");
        config.repositories = repositories.iter().map(|s| s.to_string()).collect();
        config.clone_base = self.clone_base();
        config
    }

    /// Create an empty repository on branch `main`.
    pub fn repo(&self, name: &str) -> anyhow::Result<Repo> {
        let path = self.dir.path().join(ORG).join(format!("{name}.git"));
        std::fs::create_dir(&path)?;
        let repo = Repo { path };
        repo.git(&["init", "-q", "-b", "main"], None)?;
        Ok(repo)
    }
}

/// A working repository with helpers for commits at fixed times.
pub struct Repo {
    path: PathBuf,
}

impl Repo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Commit with author and committer date `epoch` (seconds, UTC).
    pub fn commit(&self, message: &str, epoch: i64) -> anyhow::Result<String> {
        self.git(&["commit", "-q", "--allow-empty", "-m", message], Some(epoch))?;
        self.head()
    }

    pub fn checkout_new(&self, branch: &str) -> anyhow::Result<()> {
        self.git(&["checkout", "-q", "-b", branch], None).map(drop)
    }

    pub fn checkout(&self, branch: &str) -> anyhow::Result<()> {
        self.git(&["checkout", "-q", branch], None).map(drop)
    }

    /// Merge `branch` into the current branch with a merge commit.
    pub fn merge(&self, branch: &str, message: &str, epoch: i64) -> anyhow::Result<String> {
        self.git(&["merge", "-q", "--no-ff", "-m", message, branch], Some(epoch))?;
        self.head()
    }

    /// Point HEAD at `reference` whether or not it exists.
    pub fn point_head_at(&self, reference: &str) -> anyhow::Result<()> {
        self.git(&["symbolic-ref", "HEAD", reference], None).map(drop)
    }

    pub fn head(&self) -> anyhow::Result<String> {
        Ok(self.git(&["rev-parse", "HEAD"], None)?.trim().to_string())
    }

    fn git(&self, args: &[&str], epoch: Option<i64>) -> anyhow::Result<String> {
        let mut command = Command::new("git");
        command
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(&self.path);
        if let Some(epoch) = epoch {
            let date = format!("{epoch} +0000");
            command
                .env("GIT_AUTHOR_DATE", &date)
                .env("GIT_COMMITTER_DATE", &date);
        }
        let output = command
            .output()
            .with_context(|| format!("running git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// A release as created through [`FakeHost`].
#[derive(Debug, Clone)]
pub struct Created {
    pub repository: String,
    pub tag: String,
    pub title: String,
    pub notes: String,
    pub mark_as_latest: bool,
}

/// An uploaded asset: where it was read from and what it contained.
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub tag: String,
    pub path: PathBuf,
    pub contents: String,
}

/// In-memory release host recording every call.
#[derive(Default)]
pub struct FakeHost {
    pub repositories: Vec<String>,
    pub releases: Vec<Release>,
    pub calls: Mutex<Vec<String>>,
    pub created: Mutex<Vec<Created>>,
    pub uploaded: Mutex<Vec<Uploaded>>,
    pub fail_create: bool,
}

impl FakeHost {
    pub fn with_repositories(names: &[&str]) -> Self {
        Self {
            repositories: names.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn release(tag: &str, published_at: &str) -> Release {
        Release {
            tag_name: tag.to_string(),
            draft: false,
            prerelease: false,
            published_at: Some(published_at.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ReleaseHost for FakeHost {
    async fn list_repositories(
        &self,
        organization: &str,
        limit: usize,
    ) -> Result<Vec<String>, Error> {
        self.record(format!("list_repositories {organization} {limit}"));
        Ok(self.repositories.iter().take(limit).cloned().collect())
    }

    async fn list_releases(&self, repository: &str) -> Result<Vec<Release>, Error> {
        self.record(format!("list_releases {repository}"));
        Ok(self.releases.clone())
    }

    async fn release_by_tag(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<Option<Release>, Error> {
        self.record(format!("release_by_tag {repository} {tag}"));
        Ok(self.releases.iter().find(|r| r.tag_name == tag).cloned())
    }

    async fn create_release(&self, release: NewRelease<'_>) -> Result<ReleaseHandle, Error> {
        self.record(format!("create_release {} {}", release.repository, release.tag));
        if self.fail_create {
            return Err(Error::Publish {
                tag: release.tag.to_string(),
                message: "HTTP 422".into(),
                code: Some(1),
            });
        }
        let notes = std::fs::read_to_string(release.notes_file).expect("notes file exists");
        self.created.lock().unwrap().push(Created {
            repository: release.repository.to_string(),
            tag: release.tag.to_string(),
            title: release.title.to_string(),
            notes,
            mark_as_latest: release.mark_as_latest,
        });
        Ok(ReleaseHandle {
            repository: release.repository.to_string(),
            tag: release.tag.to_string(),
            url: Some(format!(
                "https://github.com/{}/releases/tag/{}",
                release.repository, release.tag
            )),
        })
    }

    async fn upload_asset(&self, handle: &ReleaseHandle, path: &Path) -> Result<(), Error> {
        self.record(format!("upload_asset {}", handle.tag));
        let contents = std::fs::read_to_string(path).expect("asset exists");
        self.uploaded.lock().unwrap().push(Uploaded {
            tag: handle.tag.clone(),
            path: path.to_path_buf(),
            contents,
        });
        Ok(())
    }
}
