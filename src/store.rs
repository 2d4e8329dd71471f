use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::columns::is_canonical;
use crate::error::{Result, SyncError};
use crate::model::StatKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    MatchResults,
    PlayerStats,
    TeamStats,
    PlayerInfo,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::MatchResults,
        Table::PlayerStats,
        Table::TeamStats,
        Table::PlayerInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::MatchResults => "matches_results",
            Table::PlayerStats => "players_stats_by_gw",
            Table::TeamStats => "teams_stats_by_gw",
            Table::PlayerInfo => "players_info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    fn keyword(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlDefault {
    Integer(i64),
    Real(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDecl {
    pub sql_type: SqlType,
    pub default: Option<SqlDefault>,
}

impl ColumnDecl {
    /// Statistic columns: `REAL DEFAULT 0`, so rows inserted for one
    /// statistic read zero for every other.
    pub fn stat() -> Self {
        Self {
            sql_type: SqlType::Real,
            default: Some(SqlDefault::Real(0.0)),
        }
    }

    fn to_sql(&self) -> String {
        let mut out = self.sql_type.keyword().to_string();
        match &self.default {
            Some(SqlDefault::Integer(v)) => out.push_str(&format!(" DEFAULT {v}")),
            Some(SqlDefault::Real(v)) => out.push_str(&format!(" DEFAULT {v:?}")),
            Some(SqlDefault::Text(v)) => {
                out.push_str(&format!(" DEFAULT '{}'", v.replace('\'', "''")))
            }
            None => {}
        }
        out
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Store { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS matches_results (
                season TEXT NOT NULL,
                gameweek INTEGER NOT NULL,
                date TEXT NOT NULL,
                day TEXT NOT NULL,
                game_time TEXT NOT NULL,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                home_score INTEGER NOT NULL,
                away_score INTEGER NOT NULL,
                winner TEXT NOT NULL,
                stadium TEXT NOT NULL,
                UNIQUE(season, gameweek, home_team, away_team)
            );
            CREATE INDEX IF NOT EXISTS idx_results_season_gw
                ON matches_results(season, gameweek);

            CREATE TABLE IF NOT EXISTS players_stats_by_gw (
                pid INTEGER NOT NULL,
                season TEXT NOT NULL,
                gameweek INTEGER NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_players_stats_key
                ON players_stats_by_gw(pid, season, gameweek);

            CREATE TABLE IF NOT EXISTS teams_stats_by_gw (
                team TEXT NOT NULL,
                season TEXT NOT NULL,
                gameweek INTEGER NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_teams_stats_key
                ON teams_stats_by_gw(team, season, gameweek);

            CREATE TABLE IF NOT EXISTS players_info (
                pid INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                shirt_number INTEGER NULL,
                team TEXT NOT NULL,
                position TEXT NOT NULL,
                date_of_birth TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_players_info_team ON players_info(team);

            CREATE TABLE IF NOT EXISTS stat_labels (
                table_name TEXT NOT NULL,
                column_name TEXT NOT NULL,
                label TEXT NOT NULL,
                PRIMARY KEY (table_name, column_name)
            );

            CREATE TABLE IF NOT EXISTS sync_runs (
                run_id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at TEXT NOT NULL,
                finished_at TEXT NULL,
                player_rows_inserted INTEGER NOT NULL DEFAULT 0,
                team_rows_inserted INTEGER NOT NULL DEFAULT 0,
                columns_added INTEGER NOT NULL DEFAULT 0,
                profiles_inserted INTEGER NOT NULL DEFAULT 0,
                profiles_skipped INTEGER NOT NULL DEFAULT 0,
                results_rows INTEGER NULL,
                players_removed INTEGER NOT NULL DEFAULT 0,
                errors_json TEXT NOT NULL DEFAULT '[]'
            );
            "#,
        )?;
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn columns(&self, table: Table) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", table.name()))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    pub fn has_column(&self, table: Table, column: &str) -> Result<bool> {
        Ok(self.columns(table)?.iter().any(|c| c == column))
    }

    /// Statistic columns of a stats table, in creation order.
    pub fn stat_columns(&self, kind: StatKind) -> Result<Vec<String>> {
        let key = [kind.id_column(), "season", "gameweek"];
        Ok(self
            .columns(kind.table())?
            .into_iter()
            .filter(|c| !key.contains(&c.as_str()))
            .collect())
    }

    /// Adds `column` unless it already exists. Returns whether it was added.
    pub fn ensure_column(&self, table: Table, column: &str, decl: &ColumnDecl) -> Result<bool> {
        if !is_canonical(column) {
            return Err(SyncError::InvalidStatName(column.to_string()));
        }
        if self.has_column(table, column)? {
            return Ok(false);
        }
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN \"{}\" {}",
            table.name(),
            column,
            decl.to_sql()
        );
        match self.conn.execute(&sql, []) {
            Ok(_) => {
                log::info!("added column {column} to {}", table.name());
                Ok(true)
            }
            Err(err) if is_duplicate_column(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn clear(&self, table: Table) -> Result<usize> {
        clear_table(&self.conn, table)
    }

    /// Label that first created `column`, if it was recorded.
    pub fn stat_label(&self, table: Table, column: &str) -> Result<Option<String>> {
        let label = self
            .conn
            .query_row(
                "SELECT label FROM stat_labels WHERE table_name = ?1 AND column_name = ?2",
                params![table.name(), column],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(label)
    }

    /// `(column, label)` pairs recorded for a table.
    pub fn stat_labels(&self, table: Table) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name, label FROM stat_labels WHERE table_name = ?1 ORDER BY rowid",
        )?;
        let labels = stmt
            .query_map(params![table.name()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(labels)
    }

    pub fn row_count(&self, table: Table) -> Result<usize> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// Deletes every row of `table` through `conn`, which may be a transaction.
pub fn clear_table(conn: &Connection, table: Table) -> Result<usize> {
    Ok(conn.execute(&format!("DELETE FROM {}", table.name()), [])?)
}

pub fn record_stat_label(conn: &Connection, table: Table, column: &str, label: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO stat_labels (table_name, column_name, label) VALUES (?1, ?2, ?3)",
        params![table.name(), column, label],
    )?;
    Ok(())
}

fn is_duplicate_column(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("duplicate column name")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_column_is_idempotent() {
        let store = Store::in_memory().unwrap();
        let decl = ColumnDecl::stat();
        assert!(store.ensure_column(Table::PlayerStats, "minutes", &decl).unwrap());
        assert!(!store.ensure_column(Table::PlayerStats, "minutes", &decl).unwrap());
        assert_eq!(
            store.stat_columns(StatKind::Player).unwrap(),
            vec!["minutes".to_string()]
        );
    }

    #[test]
    fn ensure_column_rejects_raw_identifiers() {
        let store = Store::in_memory().unwrap();
        let err = store
            .ensure_column(Table::TeamStats, "x\"; DROP TABLE players_info; --", &ColumnDecl::stat())
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidStatName(_)));
    }

    #[test]
    fn new_column_defaults_apply_to_existing_rows() {
        let store = Store::in_memory().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO teams_stats_by_gw (team, season, gameweek) VALUES ('A', '19/20', 1)",
                [],
            )
            .unwrap();
        store
            .ensure_column(Table::TeamStats, "corners", &ColumnDecl::stat())
            .unwrap();
        let corners: f64 = store
            .conn()
            .query_row("SELECT corners FROM teams_stats_by_gw", [], |r| r.get(0))
            .unwrap();
        assert_eq!(corners, 0.0);
    }

    #[test]
    fn clear_empties_table() {
        let store = Store::in_memory().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO players_stats_by_gw (pid, season, gameweek) VALUES (1, '19/20', 1)",
                [],
            )
            .unwrap();
        assert_eq!(store.clear(Table::PlayerStats).unwrap(), 1);
        assert_eq!(store.row_count(Table::PlayerStats).unwrap(), 0);
    }
}
