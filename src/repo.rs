use crate::feed::FeedSort;
use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("internal: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            other => RepoError::Internal(other.to_string()),
        }
    }
}

use async_trait::async_trait;

#[async_trait]
pub trait TagRepo: Send + Sync {
    async fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    async fn get_or_create_tag(&self, name: &str) -> RepoResult<Tag>;
    /// Unknown names are dropped, never created.
    async fn find_tags_by_names(&self, names: &[String]) -> RepoResult<Vec<Tag>>;
}

#[async_trait]
pub trait IdeaRepo: Send + Sync {
    async fn create_idea(&self, new: NewIdea) -> RepoResult<Idea>;
    async fn get_idea(&self, id: Id) -> RepoResult<Idea>;
    /// Returns one window of the sorted feed plus the total number of ideas.
    async fn list_ideas(&self, sort: FeedSort, limit: i64, offset: i64) -> RepoResult<(Vec<Idea>, i64)>;
    /// Ideas holding at least one of `tag_ids`, in insertion order.
    async fn list_ideas_by_tags(&self, tag_ids: &[Id], limit: i64, offset: i64) -> RepoResult<(Vec<Idea>, i64)>;
    /// Atomic counter update; counters never drop below zero.
    async fn adjust_votes(&self, id: Id, delta: VoteDelta) -> RepoResult<Idea>;
    /// Atomic increment, returns the new report count.
    async fn increment_reports(&self, id: Id) -> RepoResult<i64>;
    async fn delete_idea(&self, id: Id) -> RepoResult<()>;
}

pub trait Repo: TagRepo + IdeaRepo {}

impl<T> Repo for T where T: TagRepo + IdeaRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use std::sync::{Arc, RwLock};
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::{Path, PathBuf};
    use tracing::{error, info, warn};

    const SNAPSHOT_FILE: &str = "state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        ideas: BTreeMap<Id, Idea>,
        tags: BTreeMap<Id, Tag>,
        idea_tags: BTreeSet<(Id, Id)>, // (idea_id, tag_id)
        next_id: Id,
    }

    impl State {
        fn next_id(&mut self) -> Id {
            self.next_id += 1;
            self.next_id
        }

        fn hydrate(&self, idea: &Idea) -> Idea {
            let mut out = idea.clone();
            out.tags = self
                .idea_tags
                .range((idea.id, Id::MIN)..=(idea.id, Id::MAX))
                .filter_map(|(_, tag_id)| self.tags.get(tag_id).cloned())
                .collect();
            out.tags.sort_by(|a, b| a.name.cmp(&b.name));
            out
        }

        fn window<'a>(&self, ideas: impl Iterator<Item = &'a Idea>, limit: i64, offset: i64) -> Vec<Idea> {
            ideas
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .map(|i| self.hydrate(i))
                .collect()
        }
    }

    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Option<Arc<PathBuf>>,
    }

    impl InMemRepo {
        /// Repo persisted as a JSON snapshot under `data_dir`.
        pub fn new(data_dir: impl AsRef<Path>) -> Self {
            let path = data_dir.as_ref().join(SNAPSHOT_FILE);
            let state = Self::load_state_from(&path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Some(Arc::new(path)),
            }
        }

        /// Repo that never touches the filesystem.
        pub fn ephemeral() -> Self {
            Self { state: Arc::new(RwLock::new(State::default())), snapshot_path: None }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        info!(path = %path.display(), ideas = s.ideas.len(), "loaded snapshot");
                        s
                    }
                    Err(e) => {
                        warn!(path = %path.display(), "failed to parse snapshot: {e}; starting empty");
                        State::default()
                    }
                },
                Err(e) => {
                    info!(path = %path.display(), "no snapshot ({e}); starting empty");
                    State::default()
                }
            }
        }

        fn read(&self) -> RepoResult<std::sync::RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<std::sync::RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        // Called with the write lock released.
        fn persist(&self) {
            let Some(path) = self.snapshot_path.as_deref() else { return };
            let bytes = match self.state.read() {
                Ok(s) => serde_json::to_vec_pretty(&*s),
                Err(_) => return,
            };
            match bytes {
                Ok(bytes) => {
                    if let Some(dir) = path.parent() {
                        let _ = std::fs::create_dir_all(dir);
                    }
                    if let Err(e) = std::fs::write(path, bytes) {
                        error!(path = %path.display(), "failed to write snapshot: {e}");
                    }
                }
                Err(e) => error!("failed to serialize snapshot: {e}"),
            }
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self { Self::ephemeral() }
    }

    #[async_trait]
    impl TagRepo for InMemRepo {
        async fn list_tags(&self) -> RepoResult<Vec<Tag>> {
            let s = self.read()?;
            let mut v: Vec<_> = s.tags.values().cloned().collect();
            v.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(v)
        }

        async fn get_or_create_tag(&self, name: &str) -> RepoResult<Tag> {
            let mut s = self.write()?;
            if let Some(tag) = s.tags.values().find(|t| t.name == name) {
                return Ok(tag.clone());
            }
            let id = s.next_id();
            let tag = Tag { id, name: name.to_string() };
            s.tags.insert(id, tag.clone());
            drop(s);
            self.persist();
            Ok(tag)
        }

        async fn find_tags_by_names(&self, names: &[String]) -> RepoResult<Vec<Tag>> {
            let s = self.read()?;
            Ok(s.tags.values().filter(|t| names.contains(&t.name)).cloned().collect())
        }
    }

    #[async_trait]
    impl IdeaRepo for InMemRepo {
        async fn create_idea(&self, new: NewIdea) -> RepoResult<Idea> {
            let mut s = self.write()?;
            if let Some(missing) = new.tag_ids.iter().find(|id| !s.tags.contains_key(*id)) {
                return Err(RepoError::Internal(format!("unknown tag id {missing}")));
            }
            let id = s.next_id();
            let idea = Idea {
                id,
                title: new.title,
                upvotes: 0,
                downvotes: 0,
                twitter_link: new.twitter_link,
                reports: 0,
                created_at: Utc::now(),
                tags: Vec::new(),
            };
            s.ideas.insert(id, idea.clone());
            for tag_id in new.tag_ids {
                s.idea_tags.insert((id, tag_id));
            }
            let created = s.hydrate(&idea);
            drop(s);
            self.persist();
            Ok(created)
        }

        async fn get_idea(&self, id: Id) -> RepoResult<Idea> {
            let s = self.read()?;
            s.ideas.get(&id).map(|i| s.hydrate(i)).ok_or(RepoError::NotFound)
        }

        async fn list_ideas(&self, sort: FeedSort, limit: i64, offset: i64) -> RepoResult<(Vec<Idea>, i64)> {
            let s = self.read()?;
            let mut v: Vec<&Idea> = s.ideas.values().collect();
            match sort {
                FeedSort::UpvotesDesc => v.sort_by(|a, b| b.upvotes.cmp(&a.upvotes).then(a.id.cmp(&b.id))),
                FeedSort::DownvotesDesc => v.sort_by(|a, b| b.downvotes.cmp(&a.downvotes).then(a.id.cmp(&b.id))),
                FeedSort::Latest => v.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
                FeedSort::Oldest => v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))),
            }
            let total = v.len() as i64;
            Ok((s.window(v.into_iter(), limit, offset), total))
        }

        async fn list_ideas_by_tags(&self, tag_ids: &[Id], limit: i64, offset: i64) -> RepoResult<(Vec<Idea>, i64)> {
            let s = self.read()?;
            let matching: Vec<&Idea> = s
                .ideas
                .values()
                .filter(|i| tag_ids.iter().any(|t| s.idea_tags.contains(&(i.id, *t))))
                .collect();
            let total = matching.len() as i64;
            Ok((s.window(matching.into_iter(), limit, offset), total))
        }

        async fn adjust_votes(&self, id: Id, delta: VoteDelta) -> RepoResult<Idea> {
            let mut s = self.write()?;
            let idea = s.ideas.get_mut(&id).ok_or(RepoError::NotFound)?;
            idea.upvotes = (idea.upvotes + delta.upvotes).max(0);
            idea.downvotes = (idea.downvotes + delta.downvotes).max(0);
            let updated = idea.clone();
            let updated = s.hydrate(&updated);
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn increment_reports(&self, id: Id) -> RepoResult<i64> {
            let mut s = self.write()?;
            let idea = s.ideas.get_mut(&id).ok_or(RepoError::NotFound)?;
            idea.reports += 1;
            let reports = idea.reports;
            drop(s);
            self.persist();
            Ok(reports)
        }

        async fn delete_idea(&self, id: Id) -> RepoResult<()> {
            let mut s = self.write()?;
            if s.ideas.remove(&id).is_none() {
                return Err(RepoError::NotFound);
            }
            s.idea_tags.retain(|(idea_id, _)| *idea_id != id);
            drop(s);
            self.persist();
            Ok(())
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};
    use std::collections::HashMap;

    const IDEA_COLUMNS: &str = "id, title, upvotes, downvotes, twitter_link, reports, created_at";

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }

        pub fn pool(&self) -> &Pool<Postgres> { &self.pool }

        async fn attach_tags(&self, mut ideas: Vec<Idea>) -> RepoResult<Vec<Idea>> {
            if ideas.is_empty() { return Ok(ideas); }
            let ids: Vec<Id> = ideas.iter().map(|i| i.id).collect();
            let rows: Vec<(Id, Id, String)> = sqlx::query_as(
                "SELECT it.idea_id, t.id, t.name FROM idea_tags it JOIN tags t ON t.id = it.tag_id \
                 WHERE it.idea_id = ANY($1) ORDER BY t.name"
            )
            .bind(&ids)
            .fetch_all(&self.pool).await?;
            let mut by_idea: HashMap<Id, Vec<Tag>> = HashMap::new();
            for (idea_id, id, name) in rows {
                by_idea.entry(idea_id).or_default().push(Tag { id, name });
            }
            for idea in ideas.iter_mut() {
                idea.tags = by_idea.remove(&idea.id).unwrap_or_default();
            }
            Ok(ideas)
        }

        async fn attach_one(&self, idea: Idea) -> RepoResult<Idea> {
            self.attach_tags(vec![idea]).await?.pop().ok_or(RepoError::NotFound)
        }
    }

    fn order_clause(sort: FeedSort) -> &'static str {
        match sort {
            FeedSort::UpvotesDesc => "upvotes DESC, id ASC",
            FeedSort::DownvotesDesc => "downvotes DESC, id ASC",
            FeedSort::Latest => "created_at DESC, id DESC",
            FeedSort::Oldest => "created_at ASC, id ASC",
        }
    }

    #[async_trait]
    impl TagRepo for PgRepo {
        async fn list_tags(&self) -> RepoResult<Vec<Tag>> {
            let recs = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
                .fetch_all(&self.pool).await?;
            Ok(recs)
        }

        async fn get_or_create_tag(&self, name: &str) -> RepoResult<Tag> {
            // DO UPDATE (not DO NOTHING) so RETURNING yields the existing row too
            let rec = sqlx::query_as::<_, Tag>(
                "INSERT INTO tags (name) VALUES ($1) \
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id, name"
            )
            .bind(name)
            .fetch_one(&self.pool).await?;
            Ok(rec)
        }

        async fn find_tags_by_names(&self, names: &[String]) -> RepoResult<Vec<Tag>> {
            let recs = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ANY($1) ORDER BY name")
                .bind(names)
                .fetch_all(&self.pool).await?;
            Ok(recs)
        }
    }

    #[async_trait]
    impl IdeaRepo for PgRepo {
        async fn create_idea(&self, new: NewIdea) -> RepoResult<Idea> {
            let mut tx = self.pool.begin().await?;
            let idea = sqlx::query_as::<_, Idea>(&format!(
                "INSERT INTO ideas (title, twitter_link) VALUES ($1, $2) RETURNING {IDEA_COLUMNS}"
            ))
            .bind(&new.title)
            .bind(new.twitter_link.as_ref())
            .fetch_one(&mut *tx).await?;
            for tag_id in &new.tag_ids {
                sqlx::query("INSERT INTO idea_tags (idea_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                    .bind(idea.id)
                    .bind(tag_id)
                    .execute(&mut *tx).await?;
            }
            tx.commit().await?;
            self.attach_one(idea).await
        }

        async fn get_idea(&self, id: Id) -> RepoResult<Idea> {
            let idea = sqlx::query_as::<_, Idea>(&format!("SELECT {IDEA_COLUMNS} FROM ideas WHERE id = $1"))
                .bind(id)
                .fetch_one(&self.pool).await?;
            self.attach_one(idea).await
        }

        async fn list_ideas(&self, sort: FeedSort, limit: i64, offset: i64) -> RepoResult<(Vec<Idea>, i64)> {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ideas")
                .fetch_one(&self.pool).await?;
            let recs = sqlx::query_as::<_, Idea>(&format!(
                "SELECT {IDEA_COLUMNS} FROM ideas ORDER BY {} LIMIT $1 OFFSET $2",
                order_clause(sort)
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool).await?;
            Ok((self.attach_tags(recs).await?, total))
        }

        async fn list_ideas_by_tags(&self, tag_ids: &[Id], limit: i64, offset: i64) -> RepoResult<(Vec<Idea>, i64)> {
            const MATCH: &str =
                "EXISTS (SELECT 1 FROM idea_tags it WHERE it.idea_id = ideas.id AND it.tag_id = ANY($1))";
            let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM ideas WHERE {MATCH}"))
                .bind(tag_ids)
                .fetch_one(&self.pool).await?;
            let recs = sqlx::query_as::<_, Idea>(&format!(
                "SELECT {IDEA_COLUMNS} FROM ideas WHERE {MATCH} ORDER BY id LIMIT $2 OFFSET $3"
            ))
            .bind(tag_ids)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool).await?;
            Ok((self.attach_tags(recs).await?, total))
        }

        async fn adjust_votes(&self, id: Id, delta: VoteDelta) -> RepoResult<Idea> {
            let idea = sqlx::query_as::<_, Idea>(&format!(
                "UPDATE ideas SET upvotes = GREATEST(upvotes + $2, 0), downvotes = GREATEST(downvotes + $3, 0) \
                 WHERE id = $1 RETURNING {IDEA_COLUMNS}"
            ))
            .bind(id)
            .bind(delta.upvotes)
            .bind(delta.downvotes)
            .fetch_one(&self.pool).await?;
            self.attach_one(idea).await
        }

        async fn increment_reports(&self, id: Id) -> RepoResult<i64> {
            let reports: i64 = sqlx::query_scalar("UPDATE ideas SET reports = reports + 1 WHERE id = $1 RETURNING reports")
                .bind(id)
                .fetch_one(&self.pool).await?;
            Ok(reports)
        }

        async fn delete_idea(&self, id: Id) -> RepoResult<()> {
            // idea_tags rows go with it (ON DELETE CASCADE); tags stay
            let res = sqlx::query("DELETE FROM ideas WHERE id = $1")
                .bind(id)
                .execute(&self.pool).await?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }
    }
}
