#![cfg(feature = "inmem-store")]

use ideaboard::feed::FeedSort;
use ideaboard::models::{NewIdea, VoteDelta};
use ideaboard::repo::{inmem::InMemRepo, RepoError};
// Bring trait method namespaces into scope so calls on InMemRepo resolve.
use ideaboard::repo::{IdeaRepo, TagRepo};

fn idea(title: &str, tag_ids: Vec<i64>) -> NewIdea {
    NewIdea { title: title.into(), twitter_link: None, tag_ids }
}

#[tokio::test]
async fn tags_are_unique_by_exact_name() {
    let r = InMemRepo::ephemeral();
    let a = r.get_or_create_tag("ai").await.unwrap();
    let again = r.get_or_create_tag("ai").await.unwrap();
    let upper = r.get_or_create_tag("AI").await.unwrap();
    assert_eq!(a, again);
    assert_ne!(a.id, upper.id);
    assert_eq!(r.list_tags().await.unwrap().len(), 2);
}

#[tokio::test]
async fn find_by_names_ignores_unknown_names() {
    let r = InMemRepo::ephemeral();
    r.get_or_create_tag("rust").await.unwrap();
    let found = r.find_tags_by_names(&["rust".into(), "nope".into()]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "rust");
    // lookups never create
    assert_eq!(r.list_tags().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_hydrates_tags_and_defaults_counters() {
    let r = InMemRepo::ephemeral();
    let t1 = r.get_or_create_tag("web").await.unwrap();
    let t2 = r.get_or_create_tag("ai").await.unwrap();
    let created = r
        .create_idea(NewIdea { title: "<b>bold</b>".into(), twitter_link: Some("https://x.com/a".into()), tag_ids: vec![t1.id, t2.id] })
        .await
        .unwrap();
    assert_eq!(created.title, "<b>bold</b>");
    assert_eq!((created.upvotes, created.downvotes, created.reports), (0, 0, 0));
    let names: Vec<_> = created.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["ai", "web"]);

    let fetched = r.get_idea(created.id).await.unwrap();
    assert_eq!(fetched.tags.len(), 2);
    assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn create_with_unknown_tag_fails_but_tags_remain() {
    let r = InMemRepo::ephemeral();
    let t = r.get_or_create_tag("orphan").await.unwrap();
    let err = r.create_idea(idea("x", vec![t.id, 9_999])).await.unwrap_err();
    assert!(matches!(err, RepoError::Internal(_)));
    assert_eq!(r.list_tags().await.unwrap().len(), 1);
    assert_eq!(r.list_ideas(FeedSort::Latest, 20, 0).await.unwrap().1, 0);
}

#[tokio::test]
async fn delete_removes_links_but_not_tags() {
    let r = InMemRepo::ephemeral();
    let t = r.get_or_create_tag("solo").await.unwrap();
    let i = r.create_idea(idea("gone soon", vec![t.id])).await.unwrap();
    r.delete_idea(i.id).await.unwrap();

    assert!(matches!(r.get_idea(i.id).await, Err(RepoError::NotFound)));
    assert!(matches!(r.delete_idea(i.id).await, Err(RepoError::NotFound)));
    assert_eq!(r.list_tags().await.unwrap(), vec![t.clone()]);
    let (by_tag, total) = r.list_ideas_by_tags(&[t.id], 20, 0).await.unwrap();
    assert!(by_tag.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn counters_are_clamped_at_zero() {
    let r = InMemRepo::ephemeral();
    let i = r.create_idea(idea("clamp", vec![])).await.unwrap();
    let after = r.adjust_votes(i.id, VoteDelta { upvotes: -1, downvotes: -3 }).await.unwrap();
    assert_eq!((after.upvotes, after.downvotes), (0, 0));
    let after = r.adjust_votes(i.id, VoteDelta { upvotes: 2, downvotes: 1 }).await.unwrap();
    assert_eq!((after.upvotes, after.downvotes), (2, 1));
    assert!(matches!(r.adjust_votes(404, VoteDelta::default()).await, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn report_counter_increments_atomically() {
    let r = InMemRepo::ephemeral();
    let i = r.create_idea(idea("flagged", vec![])).await.unwrap();
    assert_eq!(r.increment_reports(i.id).await.unwrap(), 1);
    assert_eq!(r.increment_reports(i.id).await.unwrap(), 2);
    assert!(matches!(r.increment_reports(404).await, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn sort_orders_and_windows() {
    let r = InMemRepo::ephemeral();
    let a = r.create_idea(idea("A", vec![])).await.unwrap();
    let b = r.create_idea(idea("B", vec![])).await.unwrap();
    let c = r.create_idea(idea("C", vec![])).await.unwrap();
    r.adjust_votes(a.id, VoteDelta { upvotes: 1, downvotes: 3 }).await.unwrap();
    r.adjust_votes(c.id, VoteDelta { upvotes: 4, downvotes: 0 }).await.unwrap();

    let ids = |v: Vec<ideaboard::models::Idea>| v.into_iter().map(|i| i.id).collect::<Vec<_>>();
    let (v, total) = r.list_ideas(FeedSort::UpvotesDesc, 20, 0).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(ids(v), vec![c.id, a.id, b.id]);
    let (v, _) = r.list_ideas(FeedSort::DownvotesDesc, 20, 0).await.unwrap();
    assert_eq!(ids(v), vec![a.id, b.id, c.id]);
    let (v, _) = r.list_ideas(FeedSort::Latest, 20, 0).await.unwrap();
    assert_eq!(ids(v), vec![c.id, b.id, a.id]);
    let (v, _) = r.list_ideas(FeedSort::Oldest, 2, 1).await.unwrap();
    assert_eq!(ids(v), vec![b.id, c.id]);
}

#[tokio::test]
async fn snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let r = InMemRepo::new(dir.path());
        let t = r.get_or_create_tag("persist").await.unwrap();
        let i = r.create_idea(idea("kept", vec![t.id])).await.unwrap();
        r.adjust_votes(i.id, VoteDelta { upvotes: 2, downvotes: 0 }).await.unwrap();
        i.id
    };
    let reopened = InMemRepo::new(dir.path());
    let i = reopened.get_idea(id).await.unwrap();
    assert_eq!(i.title, "kept");
    assert_eq!(i.upvotes, 2);
    assert_eq!(i.tags[0].name, "persist");
    // ids keep counting from where the snapshot left off
    let t = reopened.get_or_create_tag("fresh").await.unwrap();
    assert!(t.id > id);
}
