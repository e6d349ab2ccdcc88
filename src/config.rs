//! Run configuration.
//!
//! The config is a TOML file naming the organization, the manifest
//! repository and the repositories whose history goes into the notes.
//! Host roots have GitHub defaults and can be pointed elsewhere.

use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "manifest-notes.toml";

/// Settings shared read-only by every stage of a run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Organization owning all repositories
    pub organization: String,

    /// Repository that receives the release; always processed first
    pub manifest_repository: String,

    /// Exact names of the repositories to include
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Prefix of clone URLs, e.g. `git@github.com:` or `https://github.com/`
    #[serde(default = "default_clone_base")]
    pub clone_base: String,

    /// Root of web links in the notes
    #[serde(default = "default_web_base")]
    pub web_base: String,

    /// Maximum number of repositories fetched by the organization listing.
    ///
    /// The listing is a single page; organizations with more repositories
    /// than this are silently truncated.
    #[serde(default = "default_repository_limit")]
    pub repository_limit: usize,

    /// File name of the notes document, also used as the asset name
    #[serde(default = "default_notes_file")]
    pub notes_file: String,

    /// Mark the new release as the latest one
    #[serde(default = "default_true")]
    pub mark_as_latest: bool,

    /// Release title; the tag is used when absent
    #[serde(default)]
    pub release_title: Option<String>,
}

fn default_clone_base() -> String {
    "git@github.com:".to_string()
}

fn default_web_base() -> String {
    "https://github.com".to_string()
}

fn default_repository_limit() -> usize {
    500
}

fn default_notes_file() -> String {
    "release_notes.md".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Parse a config from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read, parse and check a config file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ReadConfig {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_toml(&content).map_err(|e| Error::ParseConfig {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.check()?;
        Ok(config)
    }

    /// Reject values that would produce broken URLs or file names.
    pub fn check(&self) -> Result<(), Error> {
        if self.organization.trim().is_empty() {
            return Err(Error::Config("`organization` must not be empty".into()));
        }
        if self.manifest_repository.trim().is_empty() {
            return Err(Error::Config(
                "`manifest_repository` must not be empty".into(),
            ));
        }
        if self.repository_limit == 0 {
            return Err(Error::Config("`repository_limit` must be positive".into()));
        }
        if self.notes_file.is_empty() || self.notes_file.contains(['/', '\\']) {
            return Err(Error::Config(
                "`notes_file` must be a plain file name".into(),
            ));
        }
        Ok(())
    }

    /// Clone URL of a repository in the organization.
    pub fn clone_url(&self, repository: &str) -> String {
        format!("{}{}/{}.git", self.clone_base, self.organization, repository)
    }

    /// Web location of a repository in the organization.
    pub fn repository_url(&self, repository: &str) -> String {
        format!(
            "{}/{}/{}",
            self.web_base.trim_end_matches('/'),
            self.organization,
            repository
        )
    }

    /// Web location of a single commit.
    pub fn commit_url(&self, repository: &str, full_id: &str) -> String {
        format!("{}/commit/{}", self.repository_url(repository), full_id)
    }

    /// `owner/name` slug of the manifest repository.
    pub fn manifest_slug(&self) -> String {
        format!("{}/{}", self.organization, self.manifest_repository)
    }
}
