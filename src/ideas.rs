//! Idea submission and removal on top of the store.

use tracing::info;

use crate::models::{Id, Idea, NewIdea};
use crate::repo::{IdeaRepo, Repo, RepoResult};
use crate::tags;

/// Stores `title` and `twitter_link` verbatim; escaping is left to rendering.
pub async fn create(repo: &dyn Repo, title: String, raw_tags: &str, twitter_link: Option<String>) -> RepoResult<Idea> {
    let names = tags::normalize(raw_tags);
    let tag_ids = tags::get_or_create_all(repo, &names)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let idea = repo.create_idea(NewIdea { title, twitter_link, tag_ids }).await?;
    info!(idea_id = idea.id, tags = idea.tags.len(), "idea created");
    Ok(idea)
}

pub async fn get(repo: &dyn Repo, id: Id) -> RepoResult<Idea> {
    repo.get_idea(id).await
}

/// Removes the idea and its tag links; tags themselves stay.
pub async fn delete(repo: &dyn Repo, id: Id) -> RepoResult<()> {
    repo.delete_idea(id).await?;
    info!(idea_id = id, "idea deleted");
    Ok(())
}
