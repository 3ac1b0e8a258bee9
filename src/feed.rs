//! Sorted, paginated views over the idea store.

use serde::Serialize;

use crate::models::{Idea, Tag};
use crate::repo::{IdeaRepo, Repo, RepoResult};
use crate::tags;

/// Fixed number of ideas per feed page.
pub const PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FeedSort {
    #[default]
    UpvotesDesc,
    DownvotesDesc,
    Latest,
    Oldest,
}

impl FeedSort {
    /// Unrecognized keys fall back to most-upvoted first.
    pub fn parse(key: &str) -> Self {
        match key {
            "upvotes" | "upvotes_desc" => FeedSort::UpvotesDesc,
            "downvotes" | "downvotes_desc" => FeedSort::DownvotesDesc,
            "latest" => FeedSort::Latest,
            "past" | "oldest" => FeedSort::Oldest,
            _ => FeedSort::UpvotesDesc,
        }
    }

    /// Query-string key understood by `parse`.
    pub fn key(self) -> &'static str {
        match self {
            FeedSort::UpvotesDesc => "upvotes",
            FeedSort::DownvotesDesc => "downvotes",
            FeedSort::Latest => "latest",
            FeedSort::Oldest => "past",
        }
    }
}

/// One 1-indexed page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn empty(page: i64, per_page: i64, total: i64) -> Self {
        Self { items: Vec::new(), page, per_page, total }
    }

    pub fn pages(&self) -> i64 {
        if self.per_page <= 0 { return 0; }
        (self.total + self.per_page - 1) / self.per_page
    }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn has_prev(&self) -> bool { self.page > 1 && self.page - 1 <= self.pages() }

    pub fn has_next(&self) -> bool { self.page >= 1 && self.page < self.pages() }

    pub fn prev_num(&self) -> i64 { self.page - 1 }

    pub fn next_num(&self) -> i64 { self.page + 1 }
}

/// Offset for a 1-indexed page, or `None` when the page can never hold rows.
fn offset_for(page: i64, per_page: i64) -> Option<i64> {
    if page < 1 { return None; }
    (page - 1).checked_mul(per_page)
}

pub async fn query(repo: &dyn Repo, sort: FeedSort, page: i64, per_page: i64) -> RepoResult<Page<Idea>> {
    let Some(offset) = offset_for(page, per_page) else {
        return Ok(Page::empty(page, per_page, 0));
    };
    let (items, total) = repo.list_ideas(sort, per_page, offset).await?;
    Ok(Page { items, page, per_page, total })
}

/// Ideas holding at least one of the named tags. Unknown names match nothing.
pub async fn filter_by_tags(repo: &dyn Repo, names: &[String], page: i64, per_page: i64) -> RepoResult<(Page<Idea>, Vec<Tag>)> {
    let found = tags::find_by_names(repo, names).await?;
    let ids: Vec<_> = found.iter().map(|t| t.id).collect();
    let page = match offset_for(page, per_page) {
        Some(offset) if !ids.is_empty() => {
            let (items, total) = repo.list_ideas_by_tags(&ids, per_page, offset).await?;
            Page { items, page, per_page, total }
        }
        _ => Page::empty(page, per_page, 0),
    };
    Ok((page, found))
}

/// Everything a feed view renders.
#[derive(Debug, Clone, Serialize)]
pub struct FeedView {
    pub ideas: Page<Idea>,
    pub tags: Vec<Tag>,
    pub sort: FeedSort,
}

/// Front page: sorted feed plus every known tag.
pub async fn compose(repo: &dyn Repo, sort: FeedSort, page: i64) -> RepoResult<FeedView> {
    let ideas = query(repo, sort, page, PAGE_SIZE).await?;
    let tags = tags::list_all(repo).await?;
    Ok(FeedView { ideas, tags, sort })
}

/// Category page: `raw_tags` is normalized the same way submissions are.
pub async fn compose_by_tags(repo: &dyn Repo, raw_tags: &str, page: i64) -> RepoResult<FeedView> {
    let names = tags::normalize(raw_tags);
    let (ideas, tags) = filter_by_tags(repo, &names, page, PAGE_SIZE).await?;
    Ok(FeedView { ideas, tags, sort: FeedSort::default() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_fall_back_to_upvotes() {
        assert_eq!(FeedSort::parse("latest"), FeedSort::Latest);
        assert_eq!(FeedSort::parse("past"), FeedSort::Oldest);
        assert_eq!(FeedSort::parse("downvotes"), FeedSort::DownvotesDesc);
        assert_eq!(FeedSort::parse("bogus"), FeedSort::UpvotesDesc);
        assert_eq!(FeedSort::parse(""), FeedSort::UpvotesDesc);
        assert_eq!(FeedSort::parse(FeedSort::Oldest.key()), FeedSort::Oldest);
    }

    #[test]
    fn page_navigation() {
        let p: Page<()> = Page::empty(2, 20, 25);
        assert_eq!(p.pages(), 2);
        assert!(p.has_prev());
        assert!(!p.has_next());

        let first: Page<()> = Page::empty(1, 20, 25);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let beyond: Page<()> = Page::empty(7, 20, 25);
        assert!(!beyond.has_next());
        assert!(!beyond.has_prev());
    }

    #[test]
    fn offsets_reject_non_positive_pages() {
        assert_eq!(offset_for(0, 20), None);
        assert_eq!(offset_for(-3, 20), None);
        assert_eq!(offset_for(1, 20), Some(0));
        assert_eq!(offset_for(3, 20), Some(40));
        assert_eq!(offset_for(i64::MAX, 20), None);
    }
}
