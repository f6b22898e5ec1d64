use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{
    ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT,
};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const APP_DIR: &str = "odds_terminal";
const INDEX_FILE: &str = "http_index.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheIndex {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body_file: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

// Validators live in the index; each body gets its own file.
#[derive(Debug, Clone)]
pub struct HttpCache {
    dir: PathBuf,
}

impl HttpCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn in_app_dir() -> Option<Self> {
        app_cache_dir().map(|dir| Self::new(dir.join("http")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fetch_text(&self, client: &Client, url: &str) -> Result<String> {
        let mut index = self.load_index();
        if let Some(body) = self.fetch(client, url, &mut index, true)? {
            return Ok(body);
        }
        tracing::warn!(url, "cached body missing after 304, refetching");
        index.entries.remove(url);
        self.fetch(client, url, &mut index, false)?
            .ok_or_else(|| anyhow!("received 304 without validators for {url}"))
    }

    // None when the server answered 304 but the cached body is gone.
    fn fetch(
        &self,
        client: &Client,
        url: &str,
        index: &mut CacheIndex,
        conditional: bool,
    ) -> Result<Option<String>> {
        let cached = index.entries.get(url).cloned().filter(|_| conditional);

        let mut req = client.get(url).header(USER_AGENT, "odds_terminal/0.1");
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
            let Some(entry) = cached else {
                return Ok(None);
            };
            return match fs::read_to_string(self.dir.join(&entry.body_file)) {
                Ok(body) => {
                    tracing::debug!(url, "artifact not modified, serving cached body");
                    Ok(Some(body))
                }
                Err(_) => Ok(None),
            };
        }

        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status} for {url}"));
        }

        let header_value = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        let entry = CacheEntry {
            body_file: body_file_name(url),
            etag: header_value(ETAG),
            last_modified: header_value(LAST_MODIFIED),
            fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
        };
        if let Err(err) = self.store(index, url, entry, &body) {
            tracing::warn!(url, error = %err, "http cache write failed");
        }
        Ok(Some(body))
    }

    fn store(&self, index: &mut CacheIndex, url: &str, entry: CacheEntry, body: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).context("create http cache dir")?;
        write_atomic(&self.dir.join(&entry.body_file), body)?;
        index.version = CACHE_VERSION;
        index.entries.insert(url.to_string(), entry);
        let json = serde_json::to_string(index).context("serialize http cache index")?;
        write_atomic(&self.dir.join(INDEX_FILE), &json)
    }

    fn load_index(&self) -> CacheIndex {
        let Ok(raw) = fs::read_to_string(self.dir.join(INDEX_FILE)) else {
            return CacheIndex::default();
        };
        let index = serde_json::from_str::<CacheIndex>(&raw).unwrap_or_default();
        if index.version != CACHE_VERSION {
            return CacheIndex::default();
        }
        index
    }
}

pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

fn body_file_name(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:016x}.body", hasher.finish())
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use std::thread;

    // Answers 304 when the request carries a validator, else 200 with an ETag.
    fn serve(requests: usize) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/odds.json", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        thread::spawn(move || {
            for stream in listener.incoming().take(requests) {
                let mut stream = stream.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut chunk).unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                let request = String::from_utf8_lossy(&buf).to_lowercase();
                let response = if request.contains("if-none-match: \"v1\"") {
                    "HTTP/1.1 304 Not Modified\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                } else {
                    "HTTP/1.1 200 OK\r\nETag: \"v1\"\r\nLast-Modified: Mon, 01 Jan 2024 00:00:00 GMT\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello"
                        .to_string()
                };
                log.lock().unwrap().push(request);
                stream.write_all(response.as_bytes()).unwrap();
            }
        });
        (url, seen)
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "odds_terminal_http_{}_{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn not_modified_serves_cached_body() {
        let (url, seen) = serve(2);
        let cache = HttpCache::new(scratch("304"));
        let client = Client::builder().no_proxy().build().unwrap();

        assert_eq!(cache.fetch_text(&client, &url).unwrap(), "hello");
        assert_eq!(cache.fetch_text(&client, &url).unwrap(), "hello");

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].contains("if-none-match"));
        assert!(requests[1].contains("if-none-match: \"v1\""));
        assert!(requests[1].contains("if-modified-since: mon, 01 jan 2024 00:00:00 gmt"));
        let _ = fs::remove_dir_all(cache.dir());
    }

    #[test]
    fn missing_body_after_not_modified_refetches() {
        let (url, seen) = serve(3);
        let cache = HttpCache::new(scratch("gone"));
        let client = Client::builder().no_proxy().build().unwrap();

        assert_eq!(cache.fetch_text(&client, &url).unwrap(), "hello");
        fs::remove_file(cache.dir().join(body_file_name(&url))).unwrap();
        assert_eq!(cache.fetch_text(&client, &url).unwrap(), "hello");

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].contains("if-none-match"));
        assert!(!requests[2].contains("if-none-match"));
        assert!(cache.dir().join(body_file_name(&url)).exists());
        let _ = fs::remove_dir_all(cache.dir());
    }
}
