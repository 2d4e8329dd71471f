use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::params;
use rusqlite::types::Type;

use crate::error::{Result, SyncError};
use crate::model::{
    EntityKey, Gameweek, MatchResult, Outcome, PlayerId, PlayerInfo, Position, Season, StatKind,
    StatRecord, TeamName,
};
use crate::store::Store;

struct RawResult {
    season: String,
    gameweek: i64,
    date: NaiveDate,
    day: String,
    kickoff: String,
    home_team: String,
    away_team: String,
    home_score: u32,
    away_score: u32,
    stadium: String,
}

pub fn load_match_results(
    store: &Store,
    season: &Season,
    gameweek: Option<Gameweek>,
) -> Result<Vec<MatchResult>> {
    let mut stmt = store.conn().prepare(
        r#"
        SELECT season, gameweek, date, day, game_time,
               home_team, away_team, home_score, away_score, stadium
        FROM matches_results
        WHERE season = ?1 AND (?2 IS NULL OR gameweek = ?2)
        ORDER BY gameweek ASC, date ASC, home_team ASC
        "#,
    )?;
    let rows = stmt.query_map(params![season.as_str(), gameweek.map(Gameweek::get)], |row| {
        Ok(RawResult {
            season: row.get(0)?,
            gameweek: row.get(1)?,
            date: parse_date(row, 2)?,
            day: row.get(3)?,
            kickoff: row.get(4)?,
            home_team: row.get(5)?,
            away_team: row.get(6)?,
            home_score: row.get(7)?,
            away_score: row.get(8)?,
            stadium: row.get(9)?,
        })
    })?;

    let mut out = Vec::new();
    for raw in rows {
        let raw = raw?;
        out.push(MatchResult {
            season: Season::new(&raw.season)?,
            gameweek: Gameweek::new(raw.gameweek)?,
            date: raw.date,
            day: raw.day,
            kickoff: raw.kickoff,
            home_team: TeamName::new(&raw.home_team)?,
            away_team: TeamName::new(&raw.away_team)?,
            home_score: raw.home_score,
            away_score: raw.away_score,
            stadium: raw.stadium,
        });
    }
    Ok(out)
}

pub fn load_stat_records(
    store: &Store,
    kind: StatKind,
    season: &Season,
    gameweek: Option<Gameweek>,
) -> Result<Vec<StatRecord>> {
    let columns = store.stat_columns(kind)?;
    let mut select = format!("SELECT {}, gameweek", kind.id_column());
    for column in &columns {
        select.push_str(&format!(", \"{}\"", column.replace('"', "\"\"")));
    }
    select.push_str(&format!(
        " FROM {} WHERE season = ?1 AND (?2 IS NULL OR gameweek = ?2) ORDER BY gameweek ASC, {} ASC",
        kind.table().name(),
        kind.id_column()
    ));

    let mut stmt = store.conn().prepare(&select)?;
    let rows = stmt.query_map(params![season.as_str(), gameweek.map(Gameweek::get)], |row| {
        let id = match kind {
            StatKind::Player => RawId::Player(row.get(0)?),
            StatKind::Team => RawId::Team(row.get(0)?),
        };
        let gw: i64 = row.get(1)?;
        let mut values = BTreeMap::new();
        for (idx, column) in columns.iter().enumerate() {
            let value: Option<f64> = row.get(idx + 2)?;
            values.insert(column.clone(), value.unwrap_or(0.0));
        }
        Ok((id, gw, values))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, gw, values) = row?;
        let entity = match id {
            RawId::Player(pid) => EntityKey::Player(PlayerId(pid)),
            RawId::Team(name) => EntityKey::Team(TeamName::new(&name)?),
        };
        out.push(StatRecord {
            entity,
            season: season.clone(),
            gameweek: Gameweek::new(gw)?,
            values,
        });
    }
    Ok(out)
}

enum RawId {
    Player(i64),
    Team(String),
}

pub fn load_player_info(store: &Store) -> Result<Vec<PlayerInfo>> {
    let mut stmt = store.conn().prepare(
        r#"
        SELECT pid, name, shirt_number, team, position, date_of_birth
        FROM players_info
        ORDER BY pid ASC
        "#,
    )?;
    let rows = stmt.query_map([], |row| {
        let position: String = row.get(4)?;
        let position = Position::from_label(&position).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("unknown position {position:?}").into(),
            )
        })?;
        Ok((
            PlayerId(row.get(0)?),
            row.get::<_, String>(1)?,
            row.get::<_, Option<u32>>(2)?,
            row.get::<_, String>(3)?,
            position,
            parse_date(row, 5)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (pid, name, shirt_number, team, position, date_of_birth) = row?;
        out.push(PlayerInfo {
            pid,
            name,
            shirt_number,
            team: TeamName::new(&team)?,
            position,
            date_of_birth,
        });
    }
    Ok(out)
}

/// Distinct team names in the team-stats table: the current league.
pub fn distinct_teams(store: &Store) -> Result<Vec<TeamName>> {
    let mut stmt = store
        .conn()
        .prepare("SELECT DISTINCT team FROM teams_stats_by_gw ORDER BY team ASC")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    names.iter().map(|n| TeamName::new(n)).collect()
}

fn parse_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// The match `team` played in that gameweek.
pub fn find_match<'a>(
    results: &'a [MatchResult],
    team: &TeamName,
    season: &Season,
    gameweek: Gameweek,
) -> Result<&'a MatchResult> {
    results
        .iter()
        .find(|m| &m.season == season && m.gameweek == gameweek && m.involves(team))
        .ok_or_else(|| SyncError::MissingMatch {
            team: team.clone(),
            season: season.clone(),
            gameweek,
        })
}

pub fn match_outcome(
    results: &[MatchResult],
    team: &TeamName,
    season: &Season,
    gameweek: Gameweek,
) -> Result<Outcome> {
    let m = find_match(results, team, season, gameweek)?;
    m.outcome_for(team).ok_or_else(|| SyncError::MissingMatch {
        team: team.clone(),
        season: season.clone(),
        gameweek,
    })
}

pub fn opponent<'a>(
    results: &'a [MatchResult],
    team: &TeamName,
    season: &Season,
    gameweek: Gameweek,
) -> Result<&'a TeamName> {
    let m = find_match(results, team, season, gameweek)?;
    m.opponent_of(team).ok_or_else(|| SyncError::MissingMatch {
        team: team.clone(),
        season: season.clone(),
        gameweek,
    })
}

/// A team-stats row with the match it came from resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGameweekView {
    pub record: StatRecord,
    pub outcome: Option<Outcome>,
    pub opponent: Option<TeamName>,
}

/// Team rows for a season annotated with outcome and opponent. A row whose
/// match is missing keeps `None` in both fields.
pub fn team_gameweek_views(store: &Store, season: &Season) -> Result<Vec<TeamGameweekView>> {
    let results = load_match_results(store, season, None)?;
    let records = load_stat_records(store, StatKind::Team, season, None)?;

    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let EntityKey::Team(team) = &record.entity else {
            continue;
        };
        let (outcome, opponent_name) = match find_match(&results, team, season, record.gameweek) {
            Ok(m) => (m.outcome_for(team), m.opponent_of(team).cloned()),
            Err(err) => {
                log::warn!("{err}");
                (None, None)
            }
        };
        out.push(TeamGameweekView {
            record,
            outcome,
            opponent: opponent_name,
        });
    }
    Ok(out)
}
