use thiserror::Error;

use crate::model::{Gameweek, PlayerId, Season, TeamName};

/// Errors raised by the synchronization core.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("statistic name {0:?} has no usable column identifier")]
    InvalidStatName(String),

    #[error("statistics {first:?} and {second:?} both map to column `{column}`")]
    ColumnCollision {
        first: String,
        second: String,
        column: String,
    },

    #[error("invalid team name {0:?}")]
    InvalidTeamName(String),

    #[error("invalid gameweek {0} (gameweeks start at 1)")]
    InvalidGameweek(i64),

    #[error("invalid season {0:?}")]
    InvalidSeason(String),

    #[error("no {season} gameweek {gameweek} match found for {team}")]
    MissingMatch {
        team: TeamName,
        season: Season,
        gameweek: Gameweek,
    },

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Why a player profile could not be obtained. Recovered per player.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no profile page for player {0}")]
    NotFound(PlayerId),

    #[error("malformed profile page for player {pid}: {reason}")]
    Malformed { pid: PlayerId, reason: String },

    #[error("fetching profile for player {pid} failed: {reason}")]
    Fetch { pid: PlayerId, reason: String },
}
