//! Start of the commit window: the last full release of the manifest
//! repository.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::github::Release;

/// Publication time of the newest release that is neither a draft nor a
/// prerelease, or `None` when there is none and all history qualifies.
///
/// `releases` must be ordered newest first, as the host returns them.
pub fn resolve(releases: &[Release]) -> Option<DateTime<Utc>> {
    releases
        .iter()
        .filter(|r| !r.draft && !r.prerelease)
        .find_map(|r| {
            let published_at = r.published_at.as_deref()?;
            match DateTime::parse_from_rfc3339(published_at) {
                Ok(at) => Some(at.with_timezone(&Utc)),
                Err(e) => {
                    warn!(tag = %r.tag_name, %published_at, error = %e, "skipping release with unreadable timestamp");
                    None
                }
            }
        })
}
