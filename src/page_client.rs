use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PageCacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

pub struct PageClient {
    client: Client,
    cache: PageCacheFile,
    cache_path: Option<PathBuf>,
    dirty: bool,
}

impl PageClient {
    pub fn new(timeout: Duration, cache_path: Option<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        let cache = cache_path
            .as_deref()
            .map(load_cache_file)
            .unwrap_or_default();
        Ok(Self {
            client,
            cache,
            cache_path,
            dirty: false,
        })
    }

    /// Fetches `url`; `Ok(None)` means the server answered 404.
    pub fn fetch(&mut self, url: &str) -> Result<Option<String>> {
        let cached = self.cache.entries.get(url).cloned();

        let mut req = self.client.get(url).header(USER_AGENT, "Mozilla/5.0");
        if let Some(entry) = cached.as_ref() {
            if let Some(etag) = entry.etag.as_ref() {
                req = req.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = entry.last_modified.as_ref() {
                req = req.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let resp = req.send().with_context(|| format!("request {url} failed"))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        if status == StatusCode::NOT_MODIFIED {
            return match cached {
                Some(entry) => Ok(Some(entry.body)),
                None => Err(anyhow!("received 304 without cache body for {url}")),
            };
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status} for {url}"));
        }

        let header_str = |name: reqwest::header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        self.cache.entries.insert(
            url.to_string(),
            CacheEntry {
                body: body.clone(),
                etag: header_str(ETAG),
                last_modified: header_str(LAST_MODIFIED),
                fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
            },
        );
        self.dirty = true;
        Ok(Some(body))
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = self.cache_path.as_ref() else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).ok();
        }
        self.cache.version = CACHE_VERSION;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(&self.cache).context("serialize page cache")?;
        fs::write(&tmp, json).context("write page cache")?;
        fs::rename(&tmp, path).context("swap page cache")?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for PageClient {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            log::warn!("page cache not saved: {err:#}");
        }
    }
}

fn load_cache_file(path: &std::path::Path) -> PageCacheFile {
    let Ok(raw) = fs::read_to_string(path) else {
        return PageCacheFile::default();
    };
    let cache = serde_json::from_str::<PageCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return PageCacheFile::default();
    }
    cache
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
