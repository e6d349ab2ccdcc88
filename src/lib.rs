//! manifest-notes: publish one release for a family of repositories.
//!
//! Commits made since the last full release of the manifest repository are
//! collected from every selected repository and rendered into a single
//! markdown document, which becomes the body (and an asset) of a new
//! release of the manifest repository.
//!
//! # Architecture
//!
//! - **Tag**: reject malformed or already published release tags
//! - **Repos**: pick and order the repositories to include
//! - **Window**: find the last release the notes start from
//! - **Git**: clone history and walk the first-parent line
//! - **Notes**: render sections and assemble the document
//! - **GitHub**: talk to the release host through `gh`
//! - **Pipeline**: run the whole thing inside a temporary workspace

pub mod config;
mod error;
pub mod git;
pub mod github;
pub mod notes;
pub mod pipeline;
pub mod repos;
pub mod tag;
pub mod window;

pub use config::Config;
pub use error::Error;
pub use pipeline::{Outcome, RunOptions, check_tools, run};
