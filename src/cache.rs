use crate::error::FetchError;
use crate::feed::FeedResponse;
use crate::http::Transport;
use crate::range::DateRange;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Where a feed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrigin {
    Cache,
    Network,
}

/// File cache of raw feed bodies, keyed by date range.
///
/// Entries are written once and never expire, are never invalidated and never
/// deleted: a range that has been fetched is served from disk from then on.
pub struct FeedCache {
    dir: PathBuf,
}

impl FeedCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn key(range: &DateRange) -> String {
        format!("neows_feed_{}_{}.json", range.start_iso(), range.end_iso())
    }

    pub fn entry_path(&self, range: &DateRange) -> PathBuf {
        self.dir.join(Self::key(range))
    }

    /// Raw cached body, `None` on a miss.
    pub fn load(&self, range: &DateRange) -> Result<Option<Vec<u8>>, FetchError> {
        let path = self.entry_path(range);
        match fs::read(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetchError::Unexpected(format!(
                "cannot read cache entry {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Persist `body` verbatim. Written to a temp file first so a partial
    /// write never looks like a cache hit.
    pub fn store(&self, range: &DateRange, body: &[u8]) -> Result<PathBuf, FetchError> {
        let path = self.entry_path(range);
        let write = |tmp: &Path| -> std::io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            fs::write(tmp, body)?;
            fs::rename(tmp, &path)
        };
        write(&path.with_extension("json.part")).map_err(|e| {
            FetchError::Unexpected(format!("cannot write cache entry {}: {}", path.display(), e))
        })?;
        Ok(path)
    }
}

/// A decoded feed plus where it was served from.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub response: FeedResponse,
    pub origin: FeedOrigin,
    pub path: PathBuf,
}

/// Cache-or-fetch access to the NeoWs feed endpoint.
pub struct FeedClient<'a> {
    transport: &'a dyn Transport,
    cache: FeedCache,
    endpoint: String,
    api_key: String,
}

impl<'a> FeedClient<'a> {
    pub fn new(transport: &'a dyn Transport, cache: FeedCache, endpoint: &str, api_key: &str) -> Self {
        Self {
            transport,
            cache,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Serve `range` from the cache, or make exactly one GET and cache the
    /// body before decoding it. A hit performs no network call and no write.
    pub fn get(&self, range: &DateRange) -> Result<Fetched, FetchError> {
        let path = self.cache.entry_path(range);

        if let Some(body) = self.cache.load(range)? {
            log::debug!("cache hit: {}", path.display());
            return Ok(Fetched {
                response: FeedResponse::from_slice(&body)?,
                origin: FeedOrigin::Cache,
                path,
            });
        }

        log::debug!("cache miss: {}", path.display());
        let start = range.start_iso();
        let end = range.end_iso();
        let query = [
            ("start_date", start.as_str()),
            ("end_date", end.as_str()),
            ("api_key", self.api_key.as_str()),
        ];
        let body = self.transport.get(&self.endpoint, &query)?.into_success()?;
        let response = FeedResponse::from_slice(&body)?;
        let path = self.cache.store(range, &body)?;

        Ok(Fetched { response, origin: FeedOrigin::Network, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeTransport;
    use chrono::NaiveDate;

    const FEED: &str = "https://feed.test/neo/rest/v1/feed";
    const BODY: &str = r#"{"element_count":1,"near_earth_objects":{"2025-01-01":[{"neo_reference_id":"2000433","name":"433 Eros (A898 PA)"}]}}"#;

    fn week() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_key_is_derived_from_iso_dates() {
        assert_eq!(FeedCache::key(&week()), "neows_feed_2025-01-01_2025-01-07.json");
    }

    #[test]
    fn test_second_call_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new().respond(FEED, 200, BODY);
        let client = FeedClient::new(&transport, FeedCache::new(dir.path()), FEED, "KEY");

        let first = client.get(&week()).unwrap();
        let second = client.get(&week()).unwrap();

        assert_eq!(transport.call_count(FEED), 1);
        assert_eq!(first.origin, FeedOrigin::Network);
        assert_eq!(second.origin, FeedOrigin::Cache);
        assert_eq!(first.response, second.response);
        assert_eq!(fs::read_to_string(&first.path).unwrap(), BODY);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_query_carries_exact_iso_dates_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new().respond(FEED, 200, BODY);
        let client = FeedClient::new(&transport, FeedCache::new(dir.path()), FEED, "KEY");
        client.get(&week()).unwrap();

        let calls = transport.calls.borrow();
        let query: Vec<(&str, &str)> = calls[0].1.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            query,
            vec![("start_date", "2025-01-01"), ("end_date", "2025-01-07"), ("api_key", "KEY")]
        );
    }

    #[test]
    fn test_failures_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        let forbidden = FakeTransport::new().respond(FEED, 403, "");
        let client = FeedClient::new(&forbidden, FeedCache::new(&cache_dir), FEED, "BAD");
        assert!(matches!(client.get(&week()), Err(FetchError::Forbidden)));

        let garbled = FakeTransport::new().respond(FEED, 200, "not json");
        let client = FeedClient::new(&garbled, FeedCache::new(&cache_dir), FEED, "KEY");
        assert!(matches!(client.get(&week()), Err(FetchError::Decode(_))));

        let offline = FakeTransport::new().refuse(FEED, "connection refused");
        let client = FeedClient::new(&offline, FeedCache::new(&cache_dir), FEED, "KEY");
        assert!(matches!(client.get(&week()), Err(FetchError::Transport { .. })));

        assert!(!cache_dir.join(FeedCache::key(&week())).exists());
    }

    #[test]
    fn test_unreadable_cache_dir_is_unexpected() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("cache");
        fs::write(&not_a_dir, b"plain file").unwrap();

        let transport = FakeTransport::new().respond(FEED, 200, BODY);
        let client = FeedClient::new(&transport, FeedCache::new(&not_a_dir), FEED, "KEY");

        match client.get(&week()) {
            Err(FetchError::Unexpected(msg)) => assert!(msg.contains("cannot read cache entry")),
            other => panic!("expected Unexpected, got {:?}", other.map(|f| f.origin)),
        }
        assert_eq!(transport.call_count(FEED), 0);
        assert_eq!(fs::read(&not_a_dir).unwrap(), b"plain file");
    }

    #[test]
    fn test_failed_cache_write_is_unexpected_and_leaves_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path());
        // A directory squatting on the temp file path makes the write fail.
        fs::create_dir(cache.entry_path(&week()).with_extension("json.part")).unwrap();

        let transport = FakeTransport::new().respond(FEED, 200, BODY);
        let client = FeedClient::new(&transport, cache, FEED, "KEY");

        match client.get(&week()) {
            Err(FetchError::Unexpected(msg)) => assert!(msg.contains("cannot write cache entry")),
            other => panic!("expected Unexpected, got {:?}", other.map(|f| f.origin)),
        }
        assert_eq!(transport.call_count(FEED), 1);
        assert!(!dir.path().join(FeedCache::key(&week())).exists());
    }

    #[test]
    fn test_existing_entry_never_touches_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path());
        cache.store(&week(), BODY.as_bytes()).unwrap();

        let transport = FakeTransport::new();
        let client = FeedClient::new(&transport, cache, FEED, "KEY");
        let fetched = client.get(&week()).unwrap();

        assert_eq!(fetched.origin, FeedOrigin::Cache);
        assert_eq!(transport.call_count(FEED), 0);
    }
}
