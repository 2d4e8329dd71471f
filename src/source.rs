use anyhow::Result;

use crate::error::ProfileError;
use crate::model::{Gameweek, MatchResult, PlayerId, PlayerInfo, Season, StatKind, StatTable};

pub trait StatsSource {
    /// Every played match the results page lists, in page order.
    fn match_results(&mut self) -> Result<Vec<MatchResult>>;

    /// Leaderboards shown for one kind of entity in one gameweek.
    fn stat_tables(
        &mut self,
        kind: StatKind,
        season: &Season,
        gameweek: Gameweek,
    ) -> Result<Vec<StatTable>>;
}

pub trait ProfileSource {
    fn get_profile(&mut self, pid: PlayerId) -> std::result::Result<PlayerInfo, ProfileError>;
}
