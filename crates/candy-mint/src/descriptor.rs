//! Off-chain descriptor records (the JSON an item's URI points at).

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use ureq::Agent;

use crate::errors::{MintError, Result};

/// The descriptor fields the mint flow displays. Anything else in the
/// payload is ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub image: String,
}

#[derive(Deserialize)]
struct RawDescriptor {
    name: Option<String>,
    image: Option<String>,
}

/// Parse a descriptor payload, rejecting any without a non-empty `name` and `image`.
pub fn parse_descriptor(uri: &str, body: &str) -> Result<Descriptor> {
    let raw: RawDescriptor =
        serde_json::from_str(body).map_err(|e| MintError::descriptor(uri, format!("invalid JSON: {}", e)))?;
    let name = raw
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| MintError::descriptor(uri, "missing name"))?;
    let image = raw
        .image
        .filter(|i| !i.is_empty())
        .ok_or_else(|| MintError::descriptor(uri, "missing image"))?;
    Ok(Descriptor { name, image })
}

/// Fetches descriptor payloads by URI.
pub trait DescriptorFetcher: Send + Sync {
    fn fetch(&self, uri: &str) -> Result<Descriptor>;
}

/// HTTP GET via a shared `ureq` agent.
pub struct HttpDescriptorFetcher {
    agent: Agent,
}

impl HttpDescriptorFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl DescriptorFetcher for HttpDescriptorFetcher {
    fn fetch(&self, uri: &str) -> Result<Descriptor> {
        let body: String = self
            .agent
            .get(uri)
            .call()
            .map_err(|e| MintError::descriptor(uri, format!("request failed: {}", e)))?
            .into_body()
            .read_to_string()
            .map_err(|e| MintError::descriptor(uri, format!("failed to read response: {}", e)))?;
        parse_descriptor(uri, &body)
    }
}

/// Upper bound on descriptor requests in flight at once.
pub const MAX_CONCURRENT_FETCHES: usize = 32;

/// Fetch every distinct URI once, concurrently, and wait for all of them.
///
/// The result maps each URI to its outcome; callers decide what to drop.
pub fn fetch_all<'a, I>(fetcher: &dyn DescriptorFetcher, uris: I) -> HashMap<String, Result<Descriptor>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let unique: Vec<&str> = uris.into_iter().filter(|u| seen.insert(*u)).collect();

    let mut results = HashMap::with_capacity(unique.len());
    for batch in unique.chunks(MAX_CONCURRENT_FETCHES) {
        thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|&uri| {
                    debug!(uri, "fetching descriptor");
                    (uri, scope.spawn(move || fetcher.fetch(uri)))
                })
                .collect();

            for (uri, handle) in handles {
                let outcome = handle
                    .join()
                    .unwrap_or_else(|_| Err(MintError::descriptor(uri, "fetch thread panicked")));
                results.insert(uri.to_string(), outcome);
            }
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CountingFetcher {
        calls: Mutex<Vec<String>>,
    }

    impl DescriptorFetcher for CountingFetcher {
        fn fetch(&self, uri: &str) -> Result<Descriptor> {
            self.calls.lock().unwrap().push(uri.to_string());
            Ok(Descriptor {
                name: format!("name of {}", uri),
                image: "https://img".into(),
            })
        }
    }

    #[test]
    fn test_parse_descriptor() {
        let d = parse_descriptor("u", r#"{"name":"Bubu #1","image":"https://img/1.png","attributes":[]}"#).unwrap();
        assert_eq!(d.name, "Bubu #1");
        assert_eq!(d.image, "https://img/1.png");
    }

    #[test]
    fn test_parse_descriptor_missing_fields() {
        let err = parse_descriptor("u", r#"{"name":"Bubu #1"}"#).unwrap_err();
        assert_eq!(err, MintError::descriptor("u", "missing image"));
        let err = parse_descriptor("u", r#"{"image":"x"}"#).unwrap_err();
        assert_eq!(err, MintError::descriptor("u", "missing name"));
        assert!(parse_descriptor("u", "[1,2]").is_err());
        assert!(parse_descriptor("u", "not json").is_err());
    }

    #[test]
    fn test_fetch_all_dedupes() {
        let fetcher = CountingFetcher { calls: Mutex::new(Vec::new()) };
        let results = fetch_all(&fetcher, ["a", "b", "a", "a"]);
        assert_eq!(results.len(), 2);
        let mut calls = fetcher.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["a".to_string(), "b".to_string()]);
    }
}
