use chrono::Utc;
use rusqlite::params;

use crate::cleanup::remove_stale_players;
use crate::columns::ColumnRegistry;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::match_results::replace_match_results;
use crate::model::{Gameweek, Season, StatKind};
use crate::player_info::populate_player_info;
use crate::sheet::StatSheet;
use crate::source::{ProfileSource, StatsSource};
use crate::store::Store;
use crate::upsert::{UpsertSummary, upsert_sheet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub seasons: Vec<Season>,
    pub gameweeks: Vec<Gameweek>,
}

impl From<&SyncConfig> for SyncPlan {
    fn from(config: &SyncConfig) -> Self {
        Self {
            seasons: config.seasons.clone(),
            gameweeks: config.gameweeks.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub run_id: i64,
    pub player_stats: UpsertSummary,
    pub team_stats: UpsertSummary,
    pub profiles_inserted: usize,
    pub profiles_skipped: usize,
    /// `None` when the results scrape failed and the table was left alone.
    pub results_rows: Option<usize>,
    pub players_removed: usize,
    pub errors: Vec<String>,
}

impl SyncSummary {
    pub fn columns_added(&self) -> usize {
        self.player_stats.columns_added + self.team_stats.columns_added
    }
}

/// Runs player stats, team stats, profiles, results and cleanup in that order.
///
/// A scrape failure for one unit is recorded and the run moves on; storage
/// failures abort.
pub fn run_sync<S>(store: &mut Store, source: &mut S, plan: &SyncPlan) -> Result<SyncSummary>
where
    S: StatsSource + ProfileSource,
{
    let started_at = Utc::now().to_rfc3339();
    store.conn().execute(
        "INSERT INTO sync_runs(started_at) VALUES (?1)",
        params![started_at],
    )?;
    let mut summary = SyncSummary {
        run_id: store.conn().last_insert_rowid(),
        ..SyncSummary::default()
    };

    for kind in StatKind::ALL {
        let totals = sync_stats(store, &mut *source, plan, kind, &mut summary.errors)?;
        match kind {
            StatKind::Player => summary.player_stats = totals,
            StatKind::Team => summary.team_stats = totals,
        }
    }

    let profiles = populate_player_info(store, &mut *source)?;
    summary.profiles_inserted = profiles.inserted;
    summary.profiles_skipped = profiles.skipped.len();
    summary.errors.extend(
        profiles
            .skipped
            .iter()
            .map(|(_, reason)| format!("profile: {reason}")),
    );

    match source.match_results() {
        Ok(results) => summary.results_rows = Some(replace_match_results(store, &results)?),
        Err(err) => {
            log::warn!("results scrape failed, keeping stored results: {err:#}");
            summary.errors.push(format!("results: {err:#}"));
        }
    }

    summary.players_removed = remove_stale_players(store)?;

    let finished_at = Utc::now().to_rfc3339();
    let errors_json = serde_json::to_string(&summary.errors).unwrap_or_else(|_| "[]".to_string());
    store.conn().execute(
        "UPDATE sync_runs
         SET finished_at = ?1, player_rows_inserted = ?2, team_rows_inserted = ?3,
             columns_added = ?4, profiles_inserted = ?5, profiles_skipped = ?6,
             results_rows = ?7, players_removed = ?8, errors_json = ?9
         WHERE run_id = ?10",
        params![
            finished_at,
            summary.player_stats.rows_inserted as i64,
            summary.team_stats.rows_inserted as i64,
            summary.columns_added() as i64,
            summary.profiles_inserted as i64,
            summary.profiles_skipped as i64,
            summary.results_rows.map(|n| n as i64),
            summary.players_removed as i64,
            errors_json,
            summary.run_id
        ],
    )?;

    log::info!(
        "sync run {} finished: {} player rows, {} team rows, {} new columns, {} errors",
        summary.run_id,
        summary.player_stats.rows_inserted,
        summary.team_stats.rows_inserted,
        summary.columns_added(),
        summary.errors.len()
    );
    Ok(summary)
}

fn sync_stats<S: StatsSource>(
    store: &mut Store,
    source: &mut S,
    plan: &SyncPlan,
    kind: StatKind,
    errors: &mut Vec<String>,
) -> Result<UpsertSummary> {
    let mut registry = ColumnRegistry::load(store, kind.table())?;
    let mut totals = UpsertSummary::default();
    for season in &plan.seasons {
        for &gameweek in &plan.gameweeks {
            let tables = match source.stat_tables(kind, season, gameweek) {
                Ok(tables) => tables,
                Err(err) => {
                    log::warn!("{} {season} gw{gameweek}: {err:#}", kind.label());
                    errors.push(format!("{} {season} gw{gameweek}: {err:#}", kind.label()));
                    continue;
                }
            };
            if tables.is_empty() {
                log::debug!("{} {season} gw{gameweek}: no stat tables", kind.label());
                continue;
            }
            let sheet = StatSheet::assemble(kind, season.clone(), gameweek, tables, &mut registry)?;
            totals.absorb(upsert_sheet(store, &sheet)?);
        }
    }
    Ok(totals)
}

/// Latest run as `(run_id, finished_at, errors)`.
pub fn last_run(store: &Store) -> Result<Option<(i64, Option<String>, Vec<String>)>> {
    let row = store.conn().query_row(
        "SELECT run_id, finished_at, errors_json FROM sync_runs ORDER BY run_id DESC LIMIT 1",
        [],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        },
    );
    match row {
        Ok((run_id, finished_at, errors_json)) => {
            let errors = serde_json::from_str(&errors_json).unwrap_or_default();
            Ok(Some((run_id, finished_at, errors)))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
