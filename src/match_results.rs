use rusqlite::params;

use crate::error::Result;
use crate::model::MatchResult;
use crate::store::{Store, Table, clear_table};

/// Replaces the whole results table with `results` in one transaction.
///
/// Results have no incremental path: the table is cleared and reloaded.
/// A (season, gameweek, home, away) key listed twice keeps the later row.
/// Returns the number of rows in the table afterwards.
pub fn replace_match_results(store: &mut Store, results: &[MatchResult]) -> Result<usize> {
    let tx = store.transaction()?;
    let cleared = clear_table(&tx, Table::MatchResults)?;
    {
        let mut insert = tx.prepare(
            r#"
            INSERT INTO matches_results (
                season, gameweek, date, day, game_time,
                home_team, away_team, home_score, away_score,
                winner, stadium
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(season, gameweek, home_team, away_team) DO UPDATE SET
                date = excluded.date,
                day = excluded.day,
                game_time = excluded.game_time,
                home_score = excluded.home_score,
                away_score = excluded.away_score,
                winner = excluded.winner,
                stadium = excluded.stadium
            "#,
        )?;
        for m in results {
            insert.execute(params![
                m.season.as_str(),
                m.gameweek.get(),
                m.date.format("%Y-%m-%d").to_string(),
                m.day,
                m.kickoff,
                m.home_team.as_str(),
                m.away_team.as_str(),
                m.home_score,
                m.away_score,
                m.winner_label(),
                m.stadium,
            ])?;
        }
    }
    tx.commit()?;

    let rows = store.row_count(Table::MatchResults)?;
    log::info!("match results replaced: {cleared} old rows, {rows} new rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Gameweek, Season, TeamName};

    fn result(gw: i64, home: &str, away: &str, hs: u32, aws: u32) -> MatchResult {
        MatchResult {
            season: Season::new("19/20").unwrap(),
            gameweek: Gameweek::new(gw).unwrap(),
            date: NaiveDate::from_ymd_opt(2019, 8, 24).unwrap(),
            day: "Saturday".to_string(),
            kickoff: "19:00".to_string(),
            home_team: TeamName::new(home).unwrap(),
            away_team: TeamName::new(away).unwrap(),
            home_score: hs,
            away_score: aws,
            stadium: "Bloomfield".to_string(),
        }
    }

    #[test]
    fn repeated_key_keeps_later_row() {
        let mut store = Store::in_memory().unwrap();
        let rows = replace_match_results(
            &mut store,
            &[result(1, "A", "B", 0, 0), result(1, "A", "B", 2, 1)],
        )
        .unwrap();
        assert_eq!(rows, 1);
        let winner: String = store
            .conn()
            .query_row("SELECT winner FROM matches_results", [], |r| r.get(0))
            .unwrap();
        assert_eq!(winner, "A");
    }

    #[test]
    fn draw_is_stored_as_draw() {
        let mut store = Store::in_memory().unwrap();
        replace_match_results(&mut store, &[result(2, "A", "B", 1, 1)]).unwrap();
        let winner: String = store
            .conn()
            .query_row("SELECT winner FROM matches_results", [], |r| r.get(0))
            .unwrap();
        assert_eq!(winner, "Draw");
    }
}
