use crate::error::Result;
use crate::store::Store;

/// Deletes profiles whose team is not among the teams in the team-stats table.
///
/// Only `players_info` rows go; their stat rows stay behind.
pub fn remove_stale_players(store: &mut Store) -> Result<usize> {
    let tx = store.transaction()?;
    let teams: i64 = tx.query_row(
        "SELECT COUNT(DISTINCT team) FROM teams_stats_by_gw",
        [],
        |row| row.get(0),
    )?;
    if teams == 0 {
        log::warn!("team stats table is empty; every player profile counts as stale");
    }
    let removed = tx.execute(
        r#"
        DELETE FROM players_info
        WHERE team IS NULL
           OR team NOT IN (SELECT DISTINCT team FROM teams_stats_by_gw)
        "#,
        [],
    )?;
    tx.commit()?;
    log::info!("cleanup removed {removed} player profiles");
    Ok(removed)
}
