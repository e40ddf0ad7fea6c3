//! Auto-validation sweep wired to the real engine.

use elo_ladder::clock::ManualClock;
use elo_ladder::db::init_db;
use elo_ladder::domain::{MatchKind, NewMatch};
use elo_ladder::orchestration::{AutoValidationSweeper, SweepReport, DEFAULT_PENDING_EXPIRY};
use elo_ladder::{MatchEngine, MatchStatus, PlayerId, RatingPolicy, Repository, TeamId, TimeMs};
use std::sync::Arc;
use tempfile::TempDir;

const HOUR: i64 = 60 * 60 * 1000;
const T0: i64 = 1_700_000_000_000;

struct Harness {
    engine: Arc<MatchEngine>,
    sweeper: AutoValidationSweeper,
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
    let engine = Arc::new(MatchEngine::new(
        repo.clone(),
        RatingPolicy::unbounded(),
        Arc::new(clock.clone()),
    ));
    let sweeper = AutoValidationSweeper::new(
        repo.clone(),
        engine.clone(),
        Arc::new(clock.clone()),
        DEFAULT_PENDING_EXPIRY,
    );
    Harness {
        engine,
        sweeper,
        repo,
        clock,
        _temp: temp_dir,
    }
}

impl Harness {
    async fn players(&self, n: usize) -> Vec<PlayerId> {
        let mut ids = Vec::new();
        for i in 0..n {
            let name = format!("p{}", i);
            ids.push(self.repo.create_player(&name, TimeMs::new(T0)).await.unwrap().id);
        }
        ids
    }
}

#[tokio::test]
async fn test_stale_match_is_confirmed_at_sweep_time() {
    let h = setup().await;
    let p = h.players(2).await;
    let stale = h
        .engine
        .create_match(NewMatch {
            side1: p[0],
            side2: p[1],
            winner: p[0],
        })
        .await
        .unwrap();

    h.clock.advance_ms(25 * HOUR);
    let fresh = h
        .engine
        .create_match(NewMatch {
            side1: p[1],
            side2: p[0],
            winner: p[1],
        })
        .await
        .unwrap();
    assert_eq!(h.sweeper.expired_count().await.unwrap(), 1);
    assert_eq!(h.sweeper.pending_count().await.unwrap(), 2);

    let report = h.sweeper.run_now().await.unwrap();
    assert_eq!(
        report,
        SweepReport {
            solo_confirmed: 1,
            team_confirmed: 0,
            failed: 0,
        }
    );

    let stale = h.repo.get_match::<PlayerId>(stale.id).await.unwrap().unwrap();
    assert_eq!(stale.status, MatchStatus::Confirmed);
    assert_eq!(stale.confirmed_at, Some(TimeMs::new(T0 + 25 * HOUR)));
    let fresh = h.repo.get_match::<PlayerId>(fresh.id).await.unwrap().unwrap();
    assert_eq!(fresh.status, MatchStatus::Pending);

    // Same side effects as a manual confirmation.
    let winner = h.repo.get_player(p[0]).await.unwrap().unwrap();
    assert_eq!(winner.solo.rating, 1216.0);
    assert_eq!(winner.solo.rank, 1);
    assert_eq!(winner.current_win_streak, 1);
    let ledger = h.repo.match_history(MatchKind::Solo, stale.id).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger
        .iter()
        .all(|e| e.created_at == TimeMs::new(T0 + 25 * HOUR)));

    assert_eq!(h.sweeper.run_now().await.unwrap(), SweepReport::default());
}

#[tokio::test]
async fn test_sweep_covers_team_ladder() {
    let h = setup().await;
    let p = h.players(4).await;
    let t1 = h.repo.create_team(p[0], p[1], None, TimeMs::new(T0)).await.unwrap().id;
    let t2 = h.repo.create_team(p[2], p[3], None, TimeMs::new(T0)).await.unwrap().id;
    let m = h
        .engine
        .create_match(NewMatch {
            side1: t1,
            side2: t2,
            winner: t2,
        })
        .await
        .unwrap();

    h.clock.advance_ms(24 * HOUR + 1);
    let report = h.sweeper.run_now().await.unwrap();
    assert_eq!(report.team_confirmed, 1);

    let m = h.repo.get_match::<TeamId>(m.id).await.unwrap().unwrap();
    assert_eq!(m.status, MatchStatus::Confirmed);
    assert_eq!(h.repo.get_team(t2).await.unwrap().unwrap().rating, 1216.0);
}

#[tokio::test]
async fn test_failing_match_does_not_block_batch() {
    let h = setup().await;
    let p = h.players(4).await;
    let mut ids = Vec::new();
    for (a, b) in [(0, 1), (2, 3), (0, 3)] {
        let m = h
            .engine
            .create_match(NewMatch {
                side1: p[a],
                side2: p[b],
                winner: p[a],
            })
            .await
            .unwrap();
        ids.push(m.id);
        h.clock.advance_ms(1_000);
    }

    sqlx::query(&format!(
        "CREATE TRIGGER fail_one BEFORE INSERT ON rating_history \
         WHEN NEW.match_kind = 'solo' AND NEW.match_id = {} \
         BEGIN SELECT RAISE(ABORT, 'boom'); END",
        ids[1].as_i64()
    ))
    .execute(h.repo.pool())
    .await
    .unwrap();

    h.clock.advance_ms(30 * HOUR);
    let report = h.sweeper.run_now().await.unwrap();
    assert_eq!(report.solo_confirmed, 2);
    assert_eq!(report.failed, 1);

    let statuses: Vec<MatchStatus> = {
        let mut out = Vec::new();
        for &id in &ids {
            out.push(h.repo.get_match::<PlayerId>(id).await.unwrap().unwrap().status);
        }
        out
    };
    assert_eq!(
        statuses,
        vec![
            MatchStatus::Confirmed,
            MatchStatus::Pending,
            MatchStatus::Confirmed
        ]
    );
    assert!(h
        .repo
        .match_history(MatchKind::Solo, ids[1])
        .await
        .unwrap()
        .is_empty());
    assert_eq!(h.sweeper.expired_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_resolved_and_deleted_matches_are_not_swept() {
    let h = setup().await;
    let p = h.players(2).await;
    let new = NewMatch {
        side1: p[0],
        side2: p[1],
        winner: p[1],
    };
    let rejected = h.engine.create_match(new).await.unwrap();
    let deleted = h.engine.create_match(new).await.unwrap();
    h.engine.reject::<PlayerId>(rejected.id).await.unwrap();
    h.engine.delete::<PlayerId>(deleted.id).await.unwrap();

    h.clock.advance_ms(48 * HOUR);
    assert_eq!(h.sweeper.pending_count().await.unwrap(), 0);
    assert_eq!(h.sweeper.run_now().await.unwrap().confirmed(), 0);
    assert_eq!(h.repo.get_player(p[1]).await.unwrap().unwrap().solo.rating, 1200.0);
}
