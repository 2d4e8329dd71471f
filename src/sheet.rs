use std::collections::{BTreeMap, BTreeSet};

use crate::columns::ColumnRegistry;
use crate::error::Result;
use crate::model::{EntityKey, Gameweek, Season, StatKind, StatRecord, StatTable};

/// Labels the stats page lists but that carry no per-gameweek value.
const IGNORED_LABELS: &[&str] = &["SubIn", "SubOut"];

#[derive(Debug, Clone, PartialEq)]
pub struct SheetStat {
    pub label: String,
    pub column: String,
    pub values: BTreeMap<EntityKey, f64>,
}

/// Every statistic scraped for one kind of entity in one gameweek.
#[derive(Debug, Clone, PartialEq)]
pub struct StatSheet {
    pub kind: StatKind,
    pub season: Season,
    pub gameweek: Gameweek,
    pub stats: Vec<SheetStat>,
}

impl StatSheet {
    /// Builds a sheet from raw leaderboards.
    ///
    /// Ignored labels are dropped, a repeated statistic (same column, whatever
    /// the spelling) keeps its first table, and every statistic is zero-filled
    /// over the roster: the anchor statistic's entities, or every entity seen
    /// when the anchor is missing.
    pub fn assemble(
        kind: StatKind,
        season: Season,
        gameweek: Gameweek,
        tables: Vec<StatTable>,
        registry: &mut ColumnRegistry,
    ) -> Result<Self> {
        let mut seen_columns = BTreeSet::new();
        let mut kept = Vec::new();
        for table in tables {
            let label = table.label.trim().to_string();
            if IGNORED_LABELS.contains(&label.as_str()) {
                continue;
            }
                let column = registry.register(&label)?;
            if !seen_columns.insert(column.clone()) {
                log::debug!("{} gw{gameweek}: duplicate stat table {label:?} ignored", kind.label());
                continue;
            }
            let entries = table
                .entries
                .into_iter()
                .filter(|(entity, _)| entity.kind() == kind)
                .collect::<Vec<_>>();
            kept.push((label, column, entries));
        }

        let anchor = kept
            .iter()
            .find(|(label, _, _)| label.eq_ignore_ascii_case(kind.anchor_stat()));
        let roster: BTreeSet<EntityKey> = match anchor {
            Some((_, _, entries)) => entries.iter().map(|(e, _)| e.clone()).collect(),
            None => {
                log::warn!(
                    "{} {season} gw{gameweek}: anchor stat {:?} missing, using every listed entity",
                    kind.label(),
                    kind.anchor_stat()
                );
                kept.iter()
                    .flat_map(|(_, _, entries)| entries.iter().map(|(e, _)| e.clone()))
                    .collect()
            }
        };

        let mut stats = Vec::with_capacity(kept.len());
        for (label, column, entries) in kept {
            let mut values = roster
                .iter()
                .map(|entity| (entity.clone(), 0.0))
                .collect::<BTreeMap<_, _>>();
            for (entity, value) in entries {
                if let Some(slot) = values.get_mut(&entity) {
                    *slot = value;
                }
            }
            stats.push(SheetStat {
                label,
                column,
                values,
            });
        }

        Ok(Self {
            kind,
            season,
            gameweek,
            stats,
        })
    }

    pub fn roster(&self) -> BTreeSet<&EntityKey> {
        self.stats
            .iter()
            .flat_map(|stat| stat.values.keys())
            .collect()
    }

    /// One record per roster entity, keyed by column identifier.
    pub fn records(&self) -> Vec<StatRecord> {
        let mut rows: BTreeMap<&EntityKey, BTreeMap<String, f64>> = BTreeMap::new();
        for stat in &self.stats {
            for (entity, value) in &stat.values {
                rows.entry(entity)
                    .or_default()
                    .insert(stat.column.clone(), *value);
            }
        }
        rows.into_iter()
            .map(|(entity, values)| StatRecord {
                entity: entity.clone(),
                season: self.season.clone(),
                gameweek: self.gameweek,
                values,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerId;

    fn player(id: i64) -> EntityKey {
        EntityKey::Player(PlayerId(id))
    }

    fn table(label: &str, entries: &[(i64, f64)]) -> StatTable {
        StatTable {
            label: label.to_string(),
            entries: entries.iter().map(|(id, v)| (player(*id), *v)).collect(),
        }
    }

    fn assemble(tables: Vec<StatTable>) -> StatSheet {
        StatSheet::assemble(
            StatKind::Player,
            Season::new("19/20").unwrap(),
            Gameweek::new(2).unwrap(),
            tables,
            &mut ColumnRegistry::new(),
        )
        .unwrap()
    }

    #[test]
    fn zero_fills_over_anchor_roster() {
        let sheet = assemble(vec![
            table("Minutes", &[(1, 90.0), (2, 30.0)]),
            table("Goals", &[(2, 1.0), (7, 1.0)]),
        ]);
        let records = sheet.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("goals"), Some(0.0));
        assert_eq!(records[1].value("goals"), Some(1.0));
        assert_eq!(records[1].value("minutes"), Some(30.0));
    }

    #[test]
    fn skips_substitution_tables_and_repeats() {
        let sheet = assemble(vec![
            table("Minutes", &[(1, 90.0)]),
            table("SubIn", &[(1, 1.0)]),
            table("SubOut", &[(1, 1.0)]),
            table("Minutes", &[(1, 45.0)]),
        ]);
        assert_eq!(sheet.stats.len(), 1);
        assert_eq!(sheet.records()[0].value("minutes"), Some(90.0));
    }

    #[test]
    fn respelled_repeat_keeps_first_table() {
        let mut store = crate::store::Store::in_memory().unwrap();
        let sheet = assemble(vec![
            table("Minutes", &[(1, 90.0)]),
            table("Goals", &[(1, 1.0)]),
            table("goals", &[(1, 0.0)]),
        ]);
        assert_eq!(sheet.stats.len(), 2);

        crate::upsert::upsert_sheet(&mut store, &sheet).unwrap();
        let goals: f64 = store
            .conn()
            .query_row("SELECT goals FROM players_stats_by_gw WHERE pid = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(goals, 1.0);
    }

    #[test]
    fn missing_anchor_uses_union() {
        let sheet = assemble(vec![table("Goals", &[(3, 1.0)]), table("Assists", &[(4, 2.0)])]);
        assert_eq!(sheet.roster().len(), 2);
    }
}
