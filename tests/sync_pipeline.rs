use anyhow::anyhow;
use ipl_stats::error::ProfileError;
use ipl_stats::fake_source::FakeLeague;
use ipl_stats::model::{
    Gameweek, MatchResult, PlayerId, PlayerInfo, Season, StatKind, StatTable,
};
use ipl_stats::query::{distinct_teams, load_player_info};
use ipl_stats::source::{ProfileSource, StatsSource};
use ipl_stats::store::{Store, Table};
use ipl_stats::sync::{SyncPlan, last_run, run_sync};

fn plan(gameweeks: std::ops::RangeInclusive<i64>) -> SyncPlan {
    SyncPlan {
        seasons: vec![Season::new("19/20").unwrap()],
        gameweeks: gameweeks.map(|n| Gameweek::new(n).unwrap()).collect(),
    }
}

fn league(plan: &SyncPlan) -> FakeLeague {
    FakeLeague::new(11, plan.seasons[0].clone(), plan.gameweeks.clone()).unwrap()
}

/// Wraps the fake league but fails the results page and one gameweek.
struct FlakySite {
    inner: FakeLeague,
    broken_gameweek: Gameweek,
}

impl StatsSource for FlakySite {
    fn match_results(&mut self) -> anyhow::Result<Vec<MatchResult>> {
        Err(anyhow!("scores page timed out"))
    }

    fn stat_tables(
        &mut self,
        kind: StatKind,
        season: &Season,
        gameweek: Gameweek,
    ) -> anyhow::Result<Vec<StatTable>> {
        if gameweek == self.broken_gameweek {
            return Err(anyhow!("snapshot missing"));
        }
        self.inner.stat_tables(kind, season, gameweek)
    }
}

impl ProfileSource for FlakySite {
    fn get_profile(&mut self, pid: PlayerId) -> Result<PlayerInfo, ProfileError> {
        self.inner.get_profile(pid)
    }
}

#[test]
fn full_run_populates_every_table() {
    let plan = plan(1..=4);
    let mut store = Store::in_memory().unwrap();
    let mut source = league(&plan);
    let summary = run_sync(&mut store, &mut source, &plan).unwrap();

    // 21 players (one outside the league) and 4 teams over 4 gameweeks.
    assert_eq!(summary.player_stats.rows_inserted, 21 * 4);
    assert_eq!(summary.team_stats.rows_inserted, 4 * 4);
    assert_eq!(summary.results_rows, Some(8));
    assert_eq!(summary.profiles_skipped, 1);
    assert_eq!(summary.players_removed, 1);

    let stat_columns = store.stat_columns(StatKind::Player).unwrap();
    assert!(stat_columns.contains(&"key_passes".to_string()));
    assert!(!stat_columns.contains(&"subin".to_string()));

    let teams = distinct_teams(&store).unwrap();
    let profiles = load_player_info(&store).unwrap();
    assert_eq!(profiles.len(), 19);
    assert!(profiles.iter().all(|p| teams.contains(&p.team)));
}

#[test]
fn rerun_is_idempotent_and_retries_missing_profiles() {
    let plan = plan(1..=3);
    let mut store = Store::in_memory().unwrap();
    let mut source = league(&plan);
    run_sync(&mut store, &mut source, &plan).unwrap();
    let rows_before = store.row_count(Table::PlayerStats).unwrap();

    source.broken_profiles.clear();
    let second = run_sync(&mut store, &mut source, &plan).unwrap();
    assert_eq!(second.player_stats.rows_inserted, 0);
    assert_eq!(second.team_stats.rows_inserted, 0);
    assert_eq!(second.columns_added(), 0);
    assert_eq!(store.row_count(Table::PlayerStats).unwrap(), rows_before);
    // The previously broken profile is fetched now; the out-of-league player
    // was removed by cleanup and comes back only to be removed again.
    assert_eq!(second.profiles_inserted, 2);
    assert_eq!(second.players_removed, 1);
}

#[test]
fn failed_results_scrape_keeps_stored_results() {
    let plan = plan(1..=2);
    let mut store = Store::in_memory().unwrap();
    let mut good = league(&plan);
    run_sync(&mut store, &mut good, &plan).unwrap();
    assert_eq!(store.row_count(Table::MatchResults).unwrap(), 4);

    let mut flaky = FlakySite {
        inner: league(&plan),
        broken_gameweek: Gameweek::new(2).unwrap(),
    };
    let summary = run_sync(&mut store, &mut flaky, &plan).unwrap();
    assert_eq!(summary.results_rows, None);
    assert_eq!(store.row_count(Table::MatchResults).unwrap(), 4);
    // Results plus one failed gameweek per stats kind.
    assert_eq!(
        summary.errors.iter().filter(|e| !e.starts_with("profile")).count(),
        3
    );

    let (run_id, _, errors) = last_run(&store).unwrap().unwrap();
    assert_eq!(run_id, summary.run_id);
    assert_eq!(errors.len(), summary.errors.len());
}
