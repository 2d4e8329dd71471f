use rusqlite::params;

use crate::error::{ProfileError, Result};
use crate::model::{PlayerId, PlayerInfo};
use crate::source::ProfileSource;
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct ProfileSummary {
    pub requested: usize,
    pub inserted: usize,
    pub skipped: Vec<(PlayerId, String)>,
}

/// Player ids with stat rows but no profile row, ascending.
pub fn missing_player_ids(store: &Store) -> Result<Vec<PlayerId>> {
    let mut stmt = store.conn().prepare(
        r#"
        SELECT DISTINCT pid FROM players_stats_by_gw
        WHERE pid NOT IN (SELECT pid FROM players_info)
        ORDER BY pid
        "#,
    )?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0).map(PlayerId))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Fetches and stores a profile for every player that lacks one.
///
/// A failed fetch only skips that player; the next run asks again because the
/// row is still missing. Storage errors abort.
pub fn populate_player_info(
    store: &mut Store,
    profiles: &mut dyn ProfileSource,
) -> Result<ProfileSummary> {
    let missing = missing_player_ids(store)?;
    let mut summary = ProfileSummary {
        requested: missing.len(),
        ..ProfileSummary::default()
    };

    for pid in missing {
        let info = match profiles.get_profile(pid) {
            Ok(info) if info.pid == pid => info,
            Ok(info) => {
                let err = ProfileError::Malformed {
                    pid,
                    reason: format!("page describes player {}", info.pid),
                };
                log::warn!("{err}");
                summary.skipped.push((pid, err.to_string()));
                continue;
            }
            Err(err) => {
                log::warn!("{err}");
                summary.skipped.push((pid, err.to_string()));
                continue;
            }
        };
        let tx = store.transaction()?;
        insert_player_info(&tx, &info)?;
        tx.commit()?;
        summary.inserted += 1;
    }

    log::info!(
        "player profiles: {} missing, {} inserted, {} skipped",
        summary.requested,
        summary.inserted,
        summary.skipped.len()
    );
    Ok(summary)
}

pub fn insert_player_info(conn: &rusqlite::Connection, info: &PlayerInfo) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR IGNORE INTO players_info (pid, name, shirt_number, team, position, date_of_birth)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            info.pid.0,
            info.name,
            info.shirt_number,
            info.team.as_str(),
            info.position.as_str(),
            info.date_of_birth.format("%Y-%m-%d").to_string(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Position, TeamName};

    struct Profiles(HashMap<i64, PlayerInfo>);

    impl ProfileSource for Profiles {
        fn get_profile(&mut self, pid: PlayerId) -> std::result::Result<PlayerInfo, ProfileError> {
            self.0.get(&pid.0).cloned().ok_or(ProfileError::NotFound(pid))
        }
    }

    fn info(pid: i64) -> PlayerInfo {
        PlayerInfo {
            pid: PlayerId(pid),
            name: format!("Player {pid}"),
            shirt_number: Some(7),
            team: TeamName::new("Hapoel Haifa").unwrap(),
            position: Position::Forward,
            date_of_birth: NaiveDate::from_ymd_opt(1995, 3, 1).unwrap(),
        }
    }

    fn seed_stats(store: &Store, pids: &[i64]) {
        for pid in pids {
            store
                .conn()
                .execute(
                    "INSERT INTO players_stats_by_gw (pid, season, gameweek) VALUES (?1, '19/20', 1)",
                    params![pid],
                )
                .unwrap();
        }
    }

    #[test]
    fn failed_profiles_are_retried_next_run() {
        let mut store = Store::in_memory().unwrap();
        seed_stats(&store, &[1, 2]);
        let mut profiles = Profiles(HashMap::from([(1, info(1))]));

        let first = populate_player_info(&mut store, &mut profiles).unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(first.skipped.len(), 1);
        assert_eq!(missing_player_ids(&store).unwrap(), vec![PlayerId(2)]);

        profiles.0.insert(2, info(2));
        let second = populate_player_info(&mut store, &mut profiles).unwrap();
        assert_eq!(second.requested, 1);
        assert_eq!(second.inserted, 1);
        assert!(missing_player_ids(&store).unwrap().is_empty());
    }

    #[test]
    fn profile_for_wrong_player_is_skipped() {
        let mut store = Store::in_memory().unwrap();
        seed_stats(&store, &[5]);
        let mut profiles = Profiles(HashMap::from([(5, info(6))]));
        let summary = populate_player_info(&mut store, &mut profiles).unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.skipped[0].0, PlayerId(5));
    }
}
