use std::path::PathBuf;

use anyhow::{Context, Result};

use ipl_stats::config::{SyncConfig, arg_value};
use ipl_stats::export::export_tables;
use ipl_stats::store::Store;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = SyncConfig::resolve(&args)?;
    let out = arg_value(&args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ipl_tables.xlsx"));

    let store = Store::open(&config.db_path)
        .with_context(|| format!("open {}", config.db_path.display()))?;
    let report = export_tables(&store, &out)?;

    println!("Export complete: {}", out.display());
    println!("Match results: {}", report.match_results);
    println!("Player stats rows: {}", report.player_stats);
    println!("Team stats rows: {}", report.team_stats);
    println!("Player profiles: {}", report.player_info);
    Ok(())
}
