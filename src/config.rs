use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::model::{Gameweek, Season};

const APP_DIR: &str = "ipl_stats";
const DB_FILE: &str = "ipl_data.db";
const DEFAULT_BASE_URL: &str = "https://www.football.co.il/en";
const DEFAULT_SEASONS: &str = "19/20";
const DEFAULT_GAMEWEEKS: &str = "1-8";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub db_path: PathBuf,
    pub snapshot_dir: PathBuf,
    pub base_url: String,
    pub seasons: Vec<Season>,
    pub gameweeks: Vec<Gameweek>,
    pub request_timeout: Duration,
    pub fake_source: bool,
}

impl SyncConfig {
    /// Flags win over environment variables, which win over defaults.
    pub fn resolve(args: &[String]) -> Result<Self> {
        let db_path = arg_value(args, "--db")
            .or_else(|| env_value("IPL_DB_PATH"))
            .map(PathBuf::from)
            .or_else(default_db_path)
            .context("unable to resolve sqlite path")?;
        let snapshot_dir = arg_value(args, "--snapshots")
            .or_else(|| env_value("IPL_SNAPSHOT_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                db_path
                    .parent()
                    .map(|dir| dir.join("snapshots"))
                    .unwrap_or_else(|| PathBuf::from("snapshots"))
            });
        let base_url = env_value("IPL_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let seasons = parse_seasons(
            &arg_value(args, "--seasons")
                .or_else(|| env_value("IPL_SEASONS"))
                .unwrap_or_else(|| DEFAULT_SEASONS.to_string()),
        )?;
        let gameweeks = parse_gameweeks(
            &arg_value(args, "--gameweeks")
                .or_else(|| env_value("IPL_GAMEWEEKS"))
                .unwrap_or_else(|| DEFAULT_GAMEWEEKS.to_string()),
        )?;
        let request_timeout = Duration::from_secs(
            env_value("IPL_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(1),
        );
        let fake_source = args.iter().any(|a| a == "--fake")
            || env_value("IPL_FAKE_SOURCE").is_some_and(|v| matches!(v.as_str(), "1" | "true"));

        Ok(Self {
            db_path,
            snapshot_dir,
            base_url,
            seasons,
            gameweeks,
            request_timeout,
            fake_source,
        })
    }

    pub fn page_cache_path(&self) -> Option<PathBuf> {
        self.db_path.parent().map(|dir| dir.join("page_cache.json"))
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Some(base) = env_value("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env_value("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

/// Reads `--name value` or `--name=value`.
pub fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_seasons(raw: &str) -> Result<Vec<Season>> {
    let mut out: Vec<Season> = Vec::new();
    for part in raw.split([',', ';', ' ']).filter(|p| !p.trim().is_empty()) {
        let season = Season::new(part)?;
        if !out.contains(&season) {
            out.push(season);
        }
    }
    if out.is_empty() {
        return Err(anyhow!("no seasons in {raw:?}"));
    }
    Ok(out)
}

/// Accepts `1-8`, `1,2,5` or a mix such as `1-3,7`.
pub fn parse_gameweeks(raw: &str) -> Result<Vec<Gameweek>> {
    let mut out = Vec::new();
    for part in raw.split([',', ';', ' ']).map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (part, part),
        };
        let start = start
            .parse::<i64>()
            .with_context(|| format!("bad gameweek {part:?}"))?;
        let end = end
            .parse::<i64>()
            .with_context(|| format!("bad gameweek {part:?}"))?;
        if end < start {
            return Err(anyhow!("empty gameweek range {part:?}"));
        }
        for n in start..=end {
            let gw = Gameweek::new(n)?;
            if !out.contains(&gw) {
                out.push(gw);
            }
        }
    }
    if out.is_empty() {
        return Err(anyhow!("no gameweeks in {raw:?}"));
    }
    Ok(out)
}
