//! Release tag validation.
//!
//! The tag ends up inside `gh` arguments and URLs, so anything that could
//! escape a path or a shell word, or be read as a flag, is rejected up front.

use std::fmt;

use chrono::NaiveDateTime;

use crate::error::Error;
use crate::github::Release;

/// Characters never allowed in a tag.
const FORBIDDEN: &[char] = &[
    '*', ';', '$', '`', '|', '&', '<', '>', '(', ')', '{', '}',
];

/// Format of `published_at` on a release that has actually been published.
const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A release tag that passed format validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    /// Check the tag's format without consulting the release host.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidTag {
            tag: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(invalid("tag is empty"));
        }
        if raw.contains("..") {
            return Err(invalid("tag contains '..'"));
        }
        if raw.starts_with('.') {
            return Err(invalid("tag starts with '.'"));
        }
        if raw.starts_with('-') {
            return Err(invalid("tag starts with '-'"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(invalid("tag contains whitespace"));
        }
        if raw.contains(FORBIDDEN) {
            return Err(invalid("tag contains a shell metacharacter"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a tag against its format rules and the release already
/// registered under it, if any.
///
/// A draft carries no publication timestamp and does not block the tag.
pub fn validate(raw: &str, existing: Option<&Release>) -> Result<ReleaseTag, Error> {
    let tag = ReleaseTag::parse(raw)?;

    let published_at = existing
        .and_then(|r| r.published_at.as_deref())
        .filter(|at| is_published_timestamp(at));
    if let Some(published_at) = published_at {
        return Err(Error::DuplicateRelease {
            tag: tag.0,
            published_at: published_at.to_string(),
        });
    }

    Ok(tag)
}

fn is_published_timestamp(value: &str) -> bool {
    NaiveDateTime::parse_from_str(value, PUBLISHED_AT_FORMAT).is_ok()
}
