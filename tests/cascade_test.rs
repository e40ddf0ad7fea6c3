//! Retracting a confirmed match replays every later confirmed match of the same ladder.
//!
//! The reference for each check is a second database where the retracted match was never
//! confirmed: after the delete both databases must agree on every aggregate and ledger value.

use elo_ladder::clock::ManualClock;
use elo_ladder::db::init_db;
use elo_ladder::domain::{
    MatchKind, NewMatch, PartyId, PlayerAggregate, RatingHistoryEntry, TeamAggregate,
};
use elo_ladder::lifecycle::Contestant;
use elo_ladder::{
    Ladder, MatchEngine, MatchId, PlayerId, RatingPolicy, Repository, TeamId, TimeMs,
};
use std::sync::Arc;
use tempfile::TempDir;

const T0: i64 = 1_700_000_000_000;
const MINUTE: i64 = 60_000;

struct Harness {
    engine: MatchEngine,
    repo: Arc<Repository>,
    clock: ManualClock,
    _temp: TempDir,
}

async fn setup() -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let clock = ManualClock::new(TimeMs::new(T0));
    let engine = MatchEngine::new(repo.clone(), RatingPolicy::unbounded(), Arc::new(clock.clone()));
    Harness {
        engine,
        repo,
        clock,
        _temp: temp_dir,
    }
}

impl Harness {
    async fn players(&self, n: usize) -> Vec<PlayerId> {
        let mut ids = Vec::new();
        for i in 0..n {
            let name = format!("player{}", i);
            ids.push(self.repo.create_player(&name, TimeMs::new(T0)).await.unwrap().id);
        }
        ids
    }

    /// Report and confirm `(side1, side2, winner)` at `T0 + offset` minutes.
    async fn play<P: Contestant>(&self, games: &[(P, P, P, i64)]) -> Vec<MatchId> {
        let mut ids = Vec::new();
        for &(side1, side2, winner, offset) in games {
            let m = self
                .engine
                .create_match(NewMatch {
                    side1,
                    side2,
                    winner,
                })
                .await
                .unwrap();
            self.clock.set(TimeMs::new(T0 + offset * MINUTE));
            self.engine.confirm::<P>(m.id).await.unwrap();
            ids.push(m.id);
        }
        ids
    }

    async fn rating(&self, id: PlayerId) -> f64 {
        self.repo.get_player(id).await.unwrap().unwrap().solo.rating
    }

    async fn snapshot(&self, players: &[PlayerId]) -> Vec<PlayerAggregate> {
        let mut out = Vec::new();
        for &p in players {
            out.push(self.repo.get_player(p).await.unwrap().unwrap());
        }
        out
    }

    async fn teams(&self, teams: &[TeamId]) -> Vec<TeamAggregate> {
        let mut out = Vec::new();
        for &t in teams {
            out.push(self.repo.get_team(t).await.unwrap().unwrap());
        }
        out
    }

    /// Ledger values per player with match ids stripped, since ids differ between databases.
    async fn trajectories(&self, players: &[PlayerId], kind: MatchKind) -> Vec<Vec<(f64, f64, f64, TimeMs)>> {
        let mut out = Vec::new();
        for &p in players {
            let rows: Vec<RatingHistoryEntry> =
                self.repo.player_history(p, Some(kind)).await.unwrap();
            out.push(
                rows.iter()
                    .map(|e| (e.rating_before, e.rating_after, e.rating_delta, e.created_at))
                    .collect(),
            );
        }
        out
    }
}

fn drop_game<P: PartyId>(games: &[(P, P, P, i64)], index: usize) -> Vec<(P, P, P, i64)> {
    games
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, g)| *g)
        .collect()
}

async fn assert_solo_delete_matches_reference(index: usize) {
    let h = setup().await;
    let reference = setup().await;
    let p = h.players(4).await;
    let q = reference.players(4).await;
    assert_eq!(p, q);

    let games = vec![
        (p[0], p[1], p[0], 1),
        (p[1], p[2], p[2], 2),
        (p[0], p[2], p[0], 3),
        (p[3], p[0], p[3], 4),
        (p[1], p[3], p[1], 5),
        (p[2], p[0], p[0], 6),
    ];
    let ids = h.play(&games).await;
    reference.play(&drop_game(&games, index)).await;

    h.engine.delete::<PlayerId>(ids[index]).await.unwrap();

    assert_eq!(h.snapshot(&p).await, reference.snapshot(&q).await);
    assert_eq!(
        h.trajectories(&p, MatchKind::Solo).await,
        reference.trajectories(&q, MatchKind::Solo).await
    );
    assert!(h
        .repo
        .match_history(MatchKind::Solo, ids[index])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_oldest_equals_never_confirmed() {
    assert_solo_delete_matches_reference(0).await;
}

#[tokio::test]
async fn test_delete_middle_equals_never_confirmed() {
    assert_solo_delete_matches_reference(2).await;
}

#[tokio::test]
async fn test_delete_latest_replays_nothing() {
    assert_solo_delete_matches_reference(5).await;
}

#[tokio::test]
async fn test_replayed_rows_keep_original_confirmation_time() {
    let h = setup().await;
    let p = h.players(3).await;
    let ids = h
        .play(&[
            (p[0], p[1], p[0], 1),
            (p[1], p[2], p[1], 2),
            (p[0], p[2], p[2], 3),
        ])
        .await;

    h.clock.set(TimeMs::new(T0 + 100 * MINUTE));
    h.engine.delete::<PlayerId>(ids[0]).await.unwrap();

    for (id, offset) in [(ids[1], 2), (ids[2], 3)] {
        let rows = h.repo.match_history(MatchKind::Solo, id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .all(|e| e.created_at == TimeMs::new(T0 + offset * MINUTE)));
    }

    // Replayed from defaults: p1 now meets p2 at 1200 each.
    let second = h.repo.match_history(MatchKind::Solo, ids[1]).await.unwrap();
    let p1_row = second.iter().find(|e| e.player == p[1]).unwrap();
    assert_eq!((p1_row.rating_before, p1_row.rating_after), (1200.0, 1216.0));
}

#[tokio::test]
async fn test_same_instant_confirmations_replay_in_confirmation_order() {
    let h = setup().await;
    let p = h.players(2).await;
    let new = NewMatch {
        side1: p[0],
        side2: p[1],
        winner: p[0],
    };
    let first_reported = h.engine.create_match(new).await.unwrap();
    let second_reported = h.engine.create_match(new).await.unwrap();

    // The later report is confirmed first; both confirmations share one clock instant.
    h.clock.set(TimeMs::new(T0 + MINUTE));
    h.engine.confirm::<PlayerId>(second_reported.id).await.unwrap();
    h.engine.confirm::<PlayerId>(first_reported.id).await.unwrap();
    assert_eq!(h.rating(p[0]).await, 1231.0);

    h.engine.delete::<PlayerId>(second_reported.id).await.unwrap();

    // Only the remaining match counts, re-scored from defaults.
    assert_eq!((h.rating(p[0]).await, h.rating(p[1]).await), (1216.0, 1184.0));
    let rows = h
        .repo
        .match_history(MatchKind::Solo, first_reported.id)
        .await
        .unwrap();
    let winner_row = rows.iter().find(|e| e.player == p[0]).unwrap();
    assert_eq!((winner_row.rating_before, winner_row.rating_after), (1200.0, 1216.0));
    assert_eq!(winner_row.created_at, TimeMs::new(T0 + MINUTE));
}

#[tokio::test]
async fn test_interleaved_confirmations_equal_reference_order() {
    let h = setup().await;
    let reference = setup().await;
    let p = h.players(3).await;
    let q = reference.players(3).await;

    let reports = [(p[0], p[1], p[0]), (p[1], p[2], p[2]), (p[0], p[2], p[0]), (p[2], p[1], p[1])];
    let mut ids = Vec::new();
    for &(side1, side2, winner) in &reports {
        let m = h
            .engine
            .create_match(NewMatch {
                side1,
                side2,
                winner,
            })
            .await
            .unwrap();
        ids.push(m.id);
    }

    // Confirm in reverse report order at a single instant, then drop what was applied second.
    h.clock.set(TimeMs::new(T0 + MINUTE));
    for &id in ids.iter().rev() {
        h.engine.confirm::<PlayerId>(id).await.unwrap();
    }
    h.engine.delete::<PlayerId>(ids[2]).await.unwrap();

    // The reference confirms the survivors in the order they were applied.
    let applied: Vec<_> = [3, 1, 0]
        .iter()
        .map(|&i| {
            let (a, b, w) = reports[i];
            (a, b, w, 1)
        })
        .collect();
    reference.play(&applied).await;

    assert_eq!(h.snapshot(&p).await, reference.snapshot(&q).await);
    assert_eq!(
        h.trajectories(&p, MatchKind::Solo).await,
        reference.trajectories(&q, MatchKind::Solo).await
    );
}

#[tokio::test]
async fn test_team_cascade_equals_never_confirmed() {
    let h = setup().await;
    let reference = setup().await;
    let p = h.players(6).await;
    reference.players(6).await;

    let mut team_ids = Vec::new();
    for (a, b) in [(0, 1), (2, 3), (4, 5), (0, 2)] {
        let t = h.repo.create_team(p[a], p[b], None, TimeMs::new(T0)).await.unwrap().id;
        let r = reference
            .repo
            .create_team(p[a], p[b], None, TimeMs::new(T0))
            .await
            .unwrap()
            .id;
        assert_eq!(t, r);
        team_ids.push(t);
    }
    let t = &team_ids;

    let games = vec![
        (t[0], t[1], t[0], 1),
        (t[1], t[2], t[2], 2),
        (t[3], t[2], t[3], 3),
        (t[0], t[2], t[2], 4),
        (t[1], t[0], t[1], 5),
    ];
    let ids = h.play(&games).await;
    reference.play(&drop_game(&games, 0)).await;

    h.engine.delete::<TeamId>(ids[0]).await.unwrap();

    assert_eq!(h.snapshot(&p).await, reference.snapshot(&p).await);
    assert_eq!(h.teams(t).await, reference.teams(t).await);
    assert_eq!(
        h.trajectories(&p, MatchKind::Team).await,
        reference.trajectories(&p, MatchKind::Team).await
    );
}

#[tokio::test]
async fn test_ladders_cascade_independently() {
    let h = setup().await;
    let p = h.players(4).await;
    let t1 = h.repo.create_team(p[0], p[1], None, TimeMs::new(T0)).await.unwrap().id;
    let t2 = h.repo.create_team(p[2], p[3], None, TimeMs::new(T0)).await.unwrap().id;

    let solo = h.play(&[(p[0], p[2], p[0], 1)]).await;
    let team = h.play(&[(t1, t2, t2, 2)]).await;
    h.play(&[(p[0], p[2], p[2], 3)]).await;

    let team_rows_before = h.repo.match_history(MatchKind::Team, team[0]).await.unwrap();
    let team_track_before: Vec<_> = h
        .snapshot(&p)
        .await
        .into_iter()
        .map(|a| *a.track(Ladder::Team))
        .collect();

    h.engine.delete::<PlayerId>(solo[0]).await.unwrap();

    assert_eq!(
        h.repo.match_history(MatchKind::Team, team[0]).await.unwrap(),
        team_rows_before
    );
    let team_track_after: Vec<_> = h
        .snapshot(&p)
        .await
        .into_iter()
        .map(|a| *a.track(Ladder::Team))
        .collect();
    assert_eq!(team_track_after, team_track_before);

    // Only the later solo match remains, replayed from defaults.
    let a = h.repo.get_player(p[0]).await.unwrap().unwrap();
    let c = h.repo.get_player(p[2]).await.unwrap().unwrap();
    assert_eq!((a.solo.rating, c.solo.rating), (1184.0, 1216.0));
    assert_eq!((a.solo.total_matches, c.solo.wins), (1, 1));
}
