use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ProfileError;
use crate::model::{
    EntityKey, Gameweek, MatchResult, PlayerId, PlayerInfo, Position, Season, StatKind, StatTable,
    TeamName,
};
use crate::source::{ProfileSource, StatsSource};

const TEAM_NAMES: &[&str] = &[
    "Maccabi Tel Aviv",
    "Maccabi Haifa",
    "Hapoel Beer Sheva",
    "Beitar Jerusalem",
];
const OUTSIDE_TEAM: &str = "Hapoel Ramat Gan";
const PLAYERS_PER_TEAM: i64 = 5;
/// Stat introduced mid-season so later gameweeks add a column.
const LATE_STAT: &str = "Key Passes";
const LATE_STAT_FROM_GW: u32 = 3;

#[derive(Debug, Clone)]
struct FakePlayer {
    pid: PlayerId,
    team: TeamName,
    position: Position,
    shirt: u32,
}

pub struct FakeLeague {
    seed: u64,
    teams: Vec<TeamName>,
    players: Vec<FakePlayer>,
    season: Season,
    gameweeks: Vec<Gameweek>,
    /// Player ids whose profile page is unreadable.
    pub broken_profiles: Vec<PlayerId>,
}

impl FakeLeague {
    pub fn new(seed: u64, season: Season, gameweeks: Vec<Gameweek>) -> Result<Self> {
        let teams = TEAM_NAMES
            .iter()
            .map(|n| TeamName::new(n))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let outsider = TeamName::new(OUTSIDE_TEAM)?;

        let positions = [
            Position::Goalkeeper,
            Position::Defender,
            Position::Midfielder,
            Position::Midfielder,
            Position::Forward,
        ];
        let mut players = Vec::new();
        for (team_idx, team) in teams.iter().enumerate() {
            for n in 0..PLAYERS_PER_TEAM {
                players.push(FakePlayer {
                    pid: PlayerId(1000 + team_idx as i64 * 100 + n),
                    team: team.clone(),
                    position: positions[n as usize % positions.len()],
                    shirt: n as u32 + 1,
                });
            }
        }
        // Transferred out of the league mid-season: still has stat rows.
        players.push(FakePlayer {
            pid: PlayerId(9001),
            team: outsider,
            position: Position::Forward,
            shirt: 99,
        });

        Ok(Self {
            seed,
            teams,
            players,
            season,
            gameweeks,
            broken_profiles: vec![PlayerId(1102)],
        })
    }

    pub fn teams(&self) -> &[TeamName] {
        &self.teams
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.pid).collect()
    }

    fn rng_for(&self, salt: &str, gameweek: Gameweek) -> StdRng {
        let mixed = salt
            .bytes()
            .fold(self.seed ^ u64::from(gameweek.get()) << 32, |acc, b| {
                acc.rotate_left(5) ^ u64::from(b)
            });
        StdRng::seed_from_u64(mixed)
    }

    /// Round-robin pairing: rotates every team but the first each gameweek.
    fn pairings(&self, gameweek: Gameweek) -> Vec<(TeamName, TeamName)> {
        let n = self.teams.len();
        let mut order = self.teams.clone();
        if n > 2 {
            let shift = (gameweek.get() as usize - 1) % (n - 1);
            order[1..].rotate_left(shift);
        }
        (0..n / 2)
            .map(|i| (order[i].clone(), order[n - 1 - i].clone()))
            .collect()
    }

    fn player_tables(&self, season: &Season, gameweek: Gameweek) -> Vec<StatTable> {
        let mut rng = self.rng_for(&format!("player-{}", season.slug()), gameweek);
        let mut labels = vec![
            "Minutes",
            "Goals",
            "Assists",
            "Passes",
            "Shots On Target",
            "Yellow Cards",
            "SubIn",
        ];
        if gameweek.get() >= LATE_STAT_FROM_GW {
            labels.push(LATE_STAT);
        }

        labels
            .into_iter()
            .map(|label| {
                let entries = self
                    .players
                    .iter()
                    .filter_map(|p| {
                        let value: u32 = match label {
                            "Minutes" => rng.gen_range(0..=90),
                            "Passes" => rng.gen_range(5..=70),
                            "Goals" | "Assists" | "Yellow Cards" | "SubIn" => rng.gen_range(0..=1),
                            _ => rng.gen_range(0..=4),
                        };
                        // Leaderboards omit zero rows except for minutes.
                        (label == "Minutes" || value > 0)
                            .then(|| (EntityKey::Player(p.pid), f64::from(value)))
                    })
                    .collect();
                StatTable {
                    label: label.to_string(),
                    entries,
                }
            })
            .collect()
    }

    fn team_tables(&self, season: &Season, gameweek: Gameweek) -> Vec<StatTable> {
        let mut rng = self.rng_for(&format!("team-{}", season.slug()), gameweek);
        let mut possession = Vec::new();
        for (home, away) in self.pairings(gameweek) {
            let home_share = f64::from(rng.gen_range(350..=650_u32)) / 10.0;
            possession.push((EntityKey::Team(home), home_share));
            possession.push((EntityKey::Team(away), 100.0 - home_share));
        }

        let mut tables = vec![StatTable {
            label: "Ball Possession".to_string(),
            entries: possession,
        }];
        for label in ["Corners", "Attacks From Left", "Attacks From Center", "Attacks From Right"] {
            let entries = self
                .teams
                .iter()
                .map(|t| (EntityKey::Team(t.clone()), f64::from(rng.gen_range(0..=12_u32))))
                .collect();
            tables.push(StatTable {
                label: label.to_string(),
                entries,
            });
        }
        tables
    }
}

impl StatsSource for FakeLeague {
    fn match_results(&mut self) -> Result<Vec<MatchResult>> {
        let opening = NaiveDate::from_ymd_opt(2019, 8, 24)
            .ok_or_else(|| anyhow::anyhow!("invalid opening date"))?;
        let mut out = Vec::new();
        for gameweek in self.gameweeks.clone() {
            let mut rng = self.rng_for("results", gameweek);
            let date = opening + ChronoDuration::weeks(i64::from(gameweek.get()) - 1);
            for (home, away) in self.pairings(gameweek) {
                out.push(MatchResult {
                    season: self.season.clone(),
                    gameweek,
                    date,
                    day: "Saturday".to_string(),
                    kickoff: "20:30".to_string(),
                    stadium: format!("{home} Stadium"),
                    home_team: home,
                    away_team: away,
                    home_score: rng.gen_range(0..=4),
                    away_score: rng.gen_range(0..=3),
                });
            }
        }
        Ok(out)
    }

    fn stat_tables(
        &mut self,
        kind: StatKind,
        season: &Season,
        gameweek: Gameweek,
    ) -> Result<Vec<StatTable>> {
        Ok(match kind {
            StatKind::Player => self.player_tables(season, gameweek),
            StatKind::Team => self.team_tables(season, gameweek),
        })
    }
}

impl ProfileSource for FakeLeague {
    fn get_profile(&mut self, pid: PlayerId) -> std::result::Result<PlayerInfo, ProfileError> {
        if self.broken_profiles.contains(&pid) {
            return Err(ProfileError::Malformed {
                pid,
                reason: "details block missing".to_string(),
            });
        }
        let player = self
            .players
            .iter()
            .find(|p| p.pid == pid)
            .ok_or(ProfileError::NotFound(pid))?;
        let date_of_birth = NaiveDate::from_ymd_opt(1990 + (pid.0 % 10) as i32, 1, 15)
            .ok_or_else(|| ProfileError::Malformed {
                pid,
                reason: "bad date of birth".to_string(),
            })?;
        Ok(PlayerInfo {
            pid,
            name: format!("Player {pid}"),
            shirt_number: Some(player.shirt),
            team: player.team.clone(),
            position: player.position,
            date_of_birth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn league() -> FakeLeague {
        FakeLeague::new(
            7,
            Season::new("19/20").unwrap(),
            (1..=4).map(|n| Gameweek::new(n).unwrap()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn every_team_plays_once_per_gameweek() {
        let league = league();
        for n in 1..=4 {
            let pairs = league.pairings(Gameweek::new(n).unwrap());
            let mut seen = pairs
                .iter()
                .flat_map(|(h, a)| [h.clone(), a.clone()])
                .collect::<Vec<_>>();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), TEAM_NAMES.len());
        }
    }

    #[test]
    fn tables_are_deterministic() {
        let mut a = league();
        let mut b = league();
        let season = Season::new("19/20").unwrap();
        let gw = Gameweek::new(2).unwrap();
        assert_eq!(
            a.stat_tables(StatKind::Player, &season, gw).unwrap(),
            b.stat_tables(StatKind::Player, &season, gw).unwrap()
        );
    }
}
