use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::config::SyncConfig;
use crate::error::ProfileError;
use crate::model::{Gameweek, MatchResult, PlayerId, PlayerInfo, Season, StatKind, StatTable};
use crate::page_client::PageClient;
use crate::profile_fetch::parse_profile_page;
use crate::results_fetch::parse_results_page;
use crate::source::{ProfileSource, StatsSource};
use crate::stats_fetch::parse_stats_page;

/// Scraper adapter for the league site.
///
/// Results and player pages are plain GETs. Stats pages only render their
/// per-gameweek filters in a browser, so they are read from the snapshot
/// directory the browser step writes to.
pub struct SiteSource {
    pages: PageClient,
    base_url: String,
    snapshot_dir: PathBuf,
    current_season: Season,
}

impl SiteSource {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let current_season = config
            .seasons
            .last()
            .cloned()
            .ok_or_else(|| anyhow!("no season configured"))?;
        Ok(Self {
            pages: PageClient::new(config.request_timeout, config.page_cache_path())?,
            base_url: config.base_url.clone(),
            snapshot_dir: config.snapshot_dir.clone(),
            current_season,
        })
    }

    fn results_url(&self) -> String {
        format!("{}/scores", self.base_url)
    }

    fn profile_url(&self, pid: PlayerId) -> String {
        format!("{}/player/{pid}", self.base_url)
    }
}

/// `player_19-20_gw3.html` and friends.
pub fn snapshot_path(dir: &Path, kind: StatKind, season: &Season, gameweek: Gameweek) -> PathBuf {
    dir.join(format!("{}_{}_gw{}.html", kind.label(), season.slug(), gameweek))
}

impl StatsSource for SiteSource {
    fn match_results(&mut self) -> Result<Vec<MatchResult>> {
        let url = self.results_url();
        let html = self
            .pages
            .fetch(&url)?
            .ok_or_else(|| anyhow!("results page {url} not found"))?;
        // The scores page only lists the running season.
        parse_results_page(&html, &self.current_season)
    }

    fn stat_tables(
        &mut self,
        kind: StatKind,
        season: &Season,
        gameweek: Gameweek,
    ) -> Result<Vec<StatTable>> {
        let path = snapshot_path(&self.snapshot_dir, kind, season, gameweek);
        let html = fs::read_to_string(&path)
            .with_context(|| format!("read stats snapshot {}", path.display()))?;
        parse_stats_page(&html, kind)
    }
}

impl ProfileSource for SiteSource {
    fn get_profile(&mut self, pid: PlayerId) -> std::result::Result<PlayerInfo, ProfileError> {
        let url = self.profile_url(pid);
        match self.pages.fetch(&url) {
            Ok(Some(html)) => parse_profile_page(&html, pid),
            Ok(None) => Err(ProfileError::NotFound(pid)),
            Err(err) => Err(ProfileError::Fetch {
                pid,
                reason: format!("{err:#}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_names_are_filesystem_safe() {
        let path = snapshot_path(
            Path::new("/data"),
            StatKind::Team,
            &Season::new("19/20").unwrap(),
            Gameweek::new(4).unwrap(),
        );
        assert_eq!(path, PathBuf::from("/data/team_19-20_gw4.html"));
    }
}
