//! Report gate: one report per session per idea, deletion at the threshold.

use tracing::{info, warn};

use crate::ideas;
use crate::models::Id;
use crate::repo::{IdeaRepo, Repo, RepoError, RepoResult};
use crate::session::MarkerStore;

/// Reports at which an idea is removed.
pub const REPORT_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// This session had already reported the idea; nothing changed.
    AlreadyReported,
    Counted { reports: i64 },
    Removed,
}

pub async fn report<M: MarkerStore>(repo: &dyn Repo, markers: &mut M, id: Id) -> RepoResult<ReportOutcome> {
    if markers.is_reported(id) {
        return Ok(ReportOutcome::AlreadyReported);
    }
    let reports = repo.increment_reports(id).await?;
    markers.mark_reported(id);
    if reports < REPORT_THRESHOLD {
        return Ok(ReportOutcome::Counted { reports });
    }
    match ideas::delete(repo, id).await {
        // a concurrent report may have crossed the threshold first
        Ok(()) | Err(RepoError::NotFound) => {}
        Err(e) => {
            warn!(idea_id = id, "failed to remove reported idea: {e}");
            return Err(e);
        }
    }
    info!(idea_id = id, reports, "idea removed after reports");
    Ok(ReportOutcome::Removed)
}
