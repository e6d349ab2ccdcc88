//! Rendering the release notes document.
//!
//! The document is a header section followed by one collapsible section
//! per repository that has commits in the window:
//!
//! ```text
//! ### [repo](https://github.com/org/repo)
//! <details>
//! <summary>commits (2)</summary>
//!
//! - Second change [abc1234](https://github.com/org/repo/commit/abc1234...)
//! - First change [def5678](https://github.com/org/repo/commit/def5678...)
//!
//! </details>
//!
//! ```

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Config;
use crate::error::Error;
use crate::git::{CommitEntry, CommitSource};
use crate::repos::RepositoryList;
use crate::tag::ReleaseTag;

/// Summary label of the header section.
pub const HEADER_LABEL: &str = "release";

/// Render one collapsible section. An empty `title` produces no title line.
pub fn format_section(title: &str, summary_label: &str, body: &str) -> String {
    let mut out = String::new();
    if !title.is_empty() {
        out.push_str("### ");
        out.push_str(title);
        out.push('\n');
    }
    out.push_str("<details>\n");
    out.push_str(&format!("<summary>{summary_label}</summary>\n"));
    out.push('\n');
    out.push_str(body);
    out.push('\n');
    out.push('\n');
    out.push_str("</details>\n");
    out.push('\n');
    out
}

/// Summary label of a repository section.
pub fn commits_label(count: usize) -> String {
    format!("commits ({count})")
}

/// The section opening every document.
pub fn format_header(tag: &ReleaseTag, generated_at: DateTime<Utc>) -> String {
    let body = format!(
        "- tag: `{tag}`\n- generated: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    format_section("", HEADER_LABEL, &body)
}

/// The section for one repository, or `None` when it has no commits.
pub fn format_repository(
    config: &Config,
    repository: &str,
    commits: &[CommitEntry],
) -> Option<String> {
    if commits.is_empty() {
        return None;
    }
    let title = format!("[{repository}]({})", config.repository_url(repository));
    let body = commits
        .iter()
        .map(CommitEntry::to_markdown)
        .collect::<Vec<_>>()
        .join("\n");
    Some(format_section(&title, &commits_label(commits.len()), &body))
}

/// Build the whole document, visiting repositories strictly in list order.
///
/// The first collection failure aborts assembly; no partial document is
/// returned.
pub async fn assemble<S: CommitSource>(
    source: &S,
    config: &Config,
    repositories: &RepositoryList,
    since: Option<DateTime<Utc>>,
    tag: &ReleaseTag,
    generated_at: DateTime<Utc>,
) -> Result<String, Error> {
    let mut document = format_header(tag, generated_at);

    for repository in repositories {
        let commits = source.collect(repository, since).await?;
        info!(%repository, commits = commits.len(), "collected");
        if let Some(section) = format_repository(config, repository, &commits) {
            document.push_str(&section);
        }
    }

    Ok(document)
}
