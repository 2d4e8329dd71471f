use rusqlite::params;

use crate::columns::{ColumnRegistry, same_statistic};
use crate::error::{Result, SyncError};
use crate::model::{EntityKey, Gameweek, Season, StatKind, StatObservation};
use crate::sheet::StatSheet;
use crate::store::{ColumnDecl, Store, record_stat_label};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub rows_inserted: usize,
    pub cells_updated: usize,
    pub columns_added: usize,
}

impl UpsertSummary {
    pub fn absorb(&mut self, other: UpsertSummary) {
        self.rows_inserted += other.rows_inserted;
        self.cells_updated += other.cells_updated;
        self.columns_added += other.columns_added;
    }
}

/// Writes every statistic of a sheet, one transaction per statistic.
pub fn upsert_sheet(store: &mut Store, sheet: &StatSheet) -> Result<UpsertSummary> {
    let mut summary = UpsertSummary::default();
    for stat in &sheet.stats {
        let rows = stat
            .values
            .iter()
            .map(|(entity, value)| (entity, &sheet.season, sheet.gameweek, *value));
        summary.absorb(write_column(store, sheet.kind, &stat.column, &stat.label, rows)?);
    }
    log::debug!(
        "{} {} gw{}: {} rows inserted, {} cells updated",
        sheet.kind.label(),
        sheet.season,
        sheet.gameweek,
        summary.rows_inserted,
        summary.cells_updated
    );
    Ok(summary)
}

pub fn upsert_statistic(
    store: &mut Store,
    registry: &mut ColumnRegistry,
    kind: StatKind,
    stat: &str,
    season: &Season,
    gameweek: Gameweek,
    values: &[(EntityKey, f64)],
) -> Result<UpsertSummary> {
    let column = registry.register(stat)?;
    let rows = values
        .iter()
        .map(|(entity, value)| (entity, season, gameweek, *value));
    write_column(store, kind, &column, stat, rows)
}

/// Upserts a flat stream of observations, grouped by statistic in the order
/// each statistic first appears.
pub fn upsert_observations(
    store: &mut Store,
    registry: &mut ColumnRegistry,
    kind: StatKind,
    observations: &[StatObservation],
) -> Result<UpsertSummary> {
    let mut groups: Vec<(String, &str, Vec<&StatObservation>)> = Vec::new();
    for obs in observations {
        let column = registry.register(&obs.stat)?;
        match groups.iter_mut().find(|(c, _, _)| *c == column) {
            Some((_, _, members)) => members.push(obs),
            None => groups.push((column, obs.stat.as_str(), vec![obs])),
        }
    }

    let mut summary = UpsertSummary::default();
    for (column, label, members) in &groups {
        let rows = members
            .iter()
            .map(|obs| (&obs.entity, &obs.season, obs.gameweek, obs.value));
        summary.absorb(write_column(store, kind, column, label, rows)?);
    }
    Ok(summary)
}

fn write_column<'a>(
    store: &mut Store,
    kind: StatKind,
    column: &str,
    label: &str,
    rows: impl IntoIterator<Item = (&'a EntityKey, &'a Season, Gameweek, f64)>,
) -> Result<UpsertSummary> {
    let table = kind.table();
    if let Some(owner) = store.stat_label(table, column)?
        && !same_statistic(&owner, label)
    {
        return Err(SyncError::ColumnCollision {
            first: owner,
            second: label.to_string(),
            column: column.to_string(),
        });
    }

    let mut summary = UpsertSummary::default();
    if store.ensure_column(table, column, &ColumnDecl::stat())? {
        summary.columns_added += 1;
    }

    let name = table.name();
    let id_col = kind.id_column();
    let key_filter = format!("{id_col} = ?1 AND season = ?2 AND gameweek = ?3");

    let tx = store.transaction()?;
    record_stat_label(&tx, table, column, label)?;
    {
        let mut lookup = tx.prepare(&format!("SELECT 1 FROM {name} WHERE {key_filter}"))?;
        let mut update = tx.prepare(&format!(
            "UPDATE {name} SET \"{column}\" = ?4 WHERE {key_filter}"
        ))?;
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {name} ({id_col}, season, gameweek, \"{column}\") VALUES (?1, ?2, ?3, ?4)"
        ))?;

        for (entity, season, gameweek, value) in rows {
            if entity.kind() != kind {
                log::warn!("skipping {entity}: not a {} entity", kind.label());
                continue;
            }
            if lookup.exists(params![entity, season.as_str(), gameweek.get()])? {
                update.execute(params![entity, season.as_str(), gameweek.get(), value])?;
                summary.cells_updated += 1;
            } else {
                insert.execute(params![entity, season.as_str(), gameweek.get(), value])?;
                summary.rows_inserted += 1;
            }
        }
    }
    tx.commit()?;
    Ok(summary)
}
