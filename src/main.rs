use anyhow::{Context, Result};

use ipl_stats::config::SyncConfig;
use ipl_stats::fake_source::FakeLeague;
use ipl_stats::site_source::SiteSource;
use ipl_stats::store::Store;
use ipl_stats::sync::{SyncPlan, SyncSummary, run_sync};

const FAKE_SEED: u64 = 20;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = SyncConfig::resolve(&args)?;
    let plan = SyncPlan::from(&config);

    let mut store = Store::open(&config.db_path)
        .with_context(|| format!("open {}", config.db_path.display()))?;
    let summary = if config.fake_source {
        let season = plan
            .seasons
            .last()
            .cloned()
            .context("no season configured")?;
        let mut league = FakeLeague::new(FAKE_SEED, season, plan.gameweeks.clone())?;
        run_sync(&mut store, &mut league, &plan)?
    } else {
        let mut site = SiteSource::new(&config)?;
        run_sync(&mut store, &mut site, &plan)?
    };

    print_summary(&config, &summary);
    Ok(())
}

fn print_summary(config: &SyncConfig, summary: &SyncSummary) {
    println!("Sync run {} complete", summary.run_id);
    println!("DB: {}", config.db_path.display());
    println!(
        "Player stats: {} rows inserted, {} cells updated",
        summary.player_stats.rows_inserted, summary.player_stats.cells_updated
    );
    println!(
        "Team stats: {} rows inserted, {} cells updated",
        summary.team_stats.rows_inserted, summary.team_stats.cells_updated
    );
    println!("New columns: {}", summary.columns_added());
    println!(
        "Profiles: {} inserted, {} skipped",
        summary.profiles_inserted, summary.profiles_skipped
    );
    match summary.results_rows {
        Some(rows) => println!("Match results: {rows}"),
        None => println!("Match results: unchanged (scrape failed)"),
    }
    println!("Players removed: {}", summary.players_removed);
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(8) {
            println!(" - {err}");
        }
    }
}
