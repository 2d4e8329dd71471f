use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::store::Table;

/// League season label as the site prints it, e.g. `19/20`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Season(String);

impl Season {
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(SyncError::InvalidSeason(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form: `19/20` becomes `19-20`.
    pub fn slug(&self) -> String {
        self.0.replace('/', "-")
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gameweek(u32);

impl Gameweek {
    pub fn new(raw: i64) -> Result<Self> {
        if raw < 1 {
            return Err(SyncError::InvalidGameweek(raw));
        }
        u32::try_from(raw)
            .map(Self)
            .map_err(|_| SyncError::InvalidGameweek(raw))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Gameweek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team identifier shared by the results, team-stats and player-info tables.
///
/// Names are validated once at ingestion: surrounding whitespace is trimmed
/// and inner runs of whitespace collapse to one space, so every table joins
/// on the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamName(String);

impl TeamName {
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() || normalized.eq_ignore_ascii_case("draw") {
            return Err(SyncError::InvalidTeamName(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// Accepts the site's profile labels as well as the canonical names.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "goalie" | "goalkeeper" | "gk" => Some(Position::Goalkeeper),
            "defenseman" | "defender" => Some(Position::Defender),
            "mid-fielder" | "midfielder" => Some(Position::Midfielder),
            "forward" => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub pid: PlayerId,
    pub name: String,
    pub shirt_number: Option<u32>,
    pub team: TeamName,
    pub position: Position,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Home,
    Away,
    Draw,
}

impl Winner {
    pub fn from_scores(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Winner::Home,
            std::cmp::Ordering::Less => Winner::Away,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn as_char(self) -> char {
        match self {
            Outcome::Win => 'w',
            Outcome::Draw => 'd',
            Outcome::Loss => 'l',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub season: Season,
    pub gameweek: Gameweek,
    pub date: NaiveDate,
    pub day: String,
    pub kickoff: String,
    pub home_team: TeamName,
    pub away_team: TeamName,
    pub home_score: u32,
    pub away_score: u32,
    pub stadium: String,
}

impl MatchResult {
    pub fn winner(&self) -> Winner {
        Winner::from_scores(self.home_score, self.away_score)
    }

    /// Value stored in the `winner` column: a team name or `Draw`.
    pub fn winner_label(&self) -> &str {
        match self.winner() {
            Winner::Home => self.home_team.as_str(),
            Winner::Away => self.away_team.as_str(),
            Winner::Draw => "Draw",
        }
    }

    pub fn involves(&self, team: &TeamName) -> bool {
        &self.home_team == team || &self.away_team == team
    }

    pub fn opponent_of(&self, team: &TeamName) -> Option<&TeamName> {
        if &self.home_team == team {
            Some(&self.away_team)
        } else if &self.away_team == team {
            Some(&self.home_team)
        } else {
            None
        }
    }

    pub fn outcome_for(&self, team: &TeamName) -> Option<Outcome> {
        if !self.involves(team) {
            return None;
        }
        let home_side = &self.home_team == team;
        Some(match (self.winner(), home_side) {
            (Winner::Draw, _) => Outcome::Draw,
            (Winner::Home, true) | (Winner::Away, false) => Outcome::Win,
            _ => Outcome::Loss,
        })
    }

    pub fn key(&self) -> (&Season, Gameweek, &TeamName, &TeamName) {
        (&self.season, self.gameweek, &self.home_team, &self.away_team)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Player,
    Team,
}

impl StatKind {
    pub const ALL: [StatKind; 2] = [StatKind::Player, StatKind::Team];

    pub fn table(self) -> Table {
        match self {
            StatKind::Player => Table::PlayerStats,
            StatKind::Team => Table::TeamStats,
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            StatKind::Player => "pid",
            StatKind::Team => "team",
        }
    }

    /// Statistic whose entity set defines the gameweek roster.
    pub fn anchor_stat(self) -> &'static str {
        match self {
            StatKind::Player => "Minutes",
            StatKind::Team => "Ball Possession",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatKind::Player => "player",
            StatKind::Team => "team",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Player(PlayerId),
    Team(TeamName),
}

impl EntityKey {
    pub fn kind(&self) -> StatKind {
        match self {
            EntityKey::Player(_) => StatKind::Player,
            EntityKey::Team(_) => StatKind::Team,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Player(pid) => write!(f, "player {pid}"),
            EntityKey::Team(team) => write!(f, "team {team}"),
        }
    }
}

impl ToSql for EntityKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            EntityKey::Player(pid) => ToSqlOutput::from(pid.0),
            EntityKey::Team(team) => ToSqlOutput::from(team.as_str()),
        })
    }
}

/// One scraped leaderboard: a statistic label and the value per entity.
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    pub label: String,
    pub entries: Vec<(EntityKey, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub entity: EntityKey,
    pub season: Season,
    pub gameweek: Gameweek,
    pub values: BTreeMap<String, f64>,
}

impl StatRecord {
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatObservation {
    pub entity: EntityKey,
    pub season: Season,
    pub gameweek: Gameweek,
    pub stat: String,
    pub value: f64,
}
