//! Choosing which repositories go into the notes, and in what order.

use std::collections::BTreeSet;

/// Ordered, duplicate-free repository names with the manifest repository
/// first and the rest in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryList(Vec<String>);

impl RepositoryList {
    /// The manifest repository.
    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: the manifest repository is always present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a RepositoryList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Filter the organization listing down to the included repositories.
///
/// `included` is matched by exact name. The primary repository is placed
/// first whether or not the listing contained it.
pub fn select(all: &[String], included: &[String], primary: &str) -> RepositoryList {
    let rest: BTreeSet<&str> = all
        .iter()
        .map(String::as_str)
        .filter(|name| *name != primary)
        .filter(|name| included.iter().any(|inc| inc == name))
        .collect();

    let mut names = Vec::with_capacity(rest.len() + 1);
    names.push(primary.to_string());
    names.extend(rest.into_iter().map(str::to_string));
    RepositoryList(names)
}
