//! Tag registry: free-text keywords to unique tag rows.

use crate::models::Tag;
use crate::repo::{Repo, RepoResult, TagRepo};

/// Splits on commas and whitespace, dropping empties and repeats.
pub fn normalize(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let name = part.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Each new tag is persisted on its own; a later failure does not undo it.
pub async fn get_or_create(repo: &dyn Repo, name: &str) -> RepoResult<Tag> {
    repo.get_or_create_tag(name).await
}

pub async fn get_or_create_all(repo: &dyn Repo, names: &[String]) -> RepoResult<Vec<Tag>> {
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        tags.push(get_or_create(repo, name).await?);
    }
    Ok(tags)
}

pub async fn find_by_names(repo: &dyn Repo, names: &[String]) -> RepoResult<Vec<Tag>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    repo.find_tags_by_names(names).await
}

pub async fn list_all(repo: &dyn Repo) -> RepoResult<Vec<Tag>> {
    repo.list_tags().await
}
