//! Upvote/downvote toggles per (session, idea).
//!
//! Transitions, as `(counter change, new marker)`:
//!
//! | marker | upvote                     | downvote                   |
//! |--------|----------------------------|----------------------------|
//! | none   | up +1, `Up`                | down +1, `Down`            |
//! | up     | up -1, `None`              | up -1, down +1, `Down`     |
//! | down   | up +1, down -1, `Up`       | down -1, `None`            |

use tracing::debug;

use crate::models::{Id, Idea, VoteDelta};
use crate::repo::{IdeaRepo, Repo, RepoResult};
use crate::session::{MarkerStore, VoteMarker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Up,
    Down,
}

pub fn transition(current: VoteMarker, kind: VoteKind) -> (VoteDelta, VoteMarker) {
    let delta = |upvotes, downvotes| VoteDelta { upvotes, downvotes };
    match (kind, current) {
        (VoteKind::Up, VoteMarker::None) => (delta(1, 0), VoteMarker::Up),
        (VoteKind::Up, VoteMarker::Up) => (delta(-1, 0), VoteMarker::None),
        (VoteKind::Up, VoteMarker::Down) => (delta(1, -1), VoteMarker::Up),
        (VoteKind::Down, VoteMarker::None) => (delta(0, 1), VoteMarker::Down),
        (VoteKind::Down, VoteMarker::Down) => (delta(0, -1), VoteMarker::None),
        (VoteKind::Down, VoteMarker::Up) => (delta(-1, 1), VoteMarker::Down),
    }
}

/// Applies one toggle. The marker only changes after the store accepted the
/// counter update, so a missing idea leaves the session untouched.
pub async fn apply<M: MarkerStore>(repo: &dyn Repo, markers: &mut M, id: Id, kind: VoteKind) -> RepoResult<Idea> {
    let current = markers.vote_marker(id);
    let (delta, next) = transition(current, kind);
    let idea = repo.adjust_votes(id, delta).await?;
    markers.set_vote_marker(id, next);
    debug!(idea_id = id, ?kind, from = ?current, to = ?next, "vote applied");
    Ok(idea)
}

pub async fn upvote<M: MarkerStore>(repo: &dyn Repo, markers: &mut M, id: Id) -> RepoResult<Idea> {
    apply(repo, markers, id, VoteKind::Up).await
}

pub async fn downvote<M: MarkerStore>(repo: &dyn Repo, markers: &mut M, id: Id) -> RepoResult<Idea> {
    apply(repo, markers, id, VoteKind::Down).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(start: VoteMarker, steps: &[VoteKind]) -> (i64, i64, VoteMarker) {
        let (mut up, mut down, mut marker) = (0, 0, start);
        for kind in steps {
            let (d, next) = transition(marker, *kind);
            up += d.upvotes;
            down += d.downvotes;
            marker = next;
        }
        (up, down, marker)
    }

    #[test]
    fn double_upvote_is_a_round_trip() {
        assert_eq!(run(VoteMarker::None, &[VoteKind::Up, VoteKind::Up]), (0, 0, VoteMarker::None));
        assert_eq!(run(VoteMarker::None, &[VoteKind::Down, VoteKind::Down]), (0, 0, VoteMarker::None));
    }

    #[test]
    fn upvote_while_down_switches() {
        assert_eq!(transition(VoteMarker::Down, VoteKind::Up), (VoteDelta { upvotes: 1, downvotes: -1 }, VoteMarker::Up));
        assert_eq!(transition(VoteMarker::Up, VoteKind::Down), (VoteDelta { upvotes: -1, downvotes: 1 }, VoteMarker::Down));
    }

    #[test]
    fn legal_sequences_never_go_negative() {
        use VoteKind::*;
        let seqs: &[&[VoteKind]] = &[
            &[Up, Down, Up, Up, Down, Down],
            &[Down, Up, Down, Up],
            &[Up, Up, Up, Down, Down, Up],
        ];
        for seq in seqs {
            let (mut up, mut down, mut marker) = (0i64, 0i64, VoteMarker::None);
            for kind in seq.iter() {
                let (d, next) = transition(marker, *kind);
                up += d.upvotes;
                down += d.downvotes;
                marker = next;
                assert!(up >= 0 && down >= 0, "{seq:?}");
            }
        }
    }
}
