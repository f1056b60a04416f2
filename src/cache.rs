use crate::{client::Client, error::Result};
use serde_json::Value;
use std::collections::HashMap;

/// Caller-owned memoization of the cheap read-only probes.
///
/// Account info, the API version, and key statuses are stable within one
/// process run, so hosts that poll them can hold a cache instead of paying a
/// round trip each time. Only successful responses are stored; errors pass
/// through without being remembered. The cache never affects correctness,
/// only traffic.
///
/// ```no_run
/// use imagify_api::{Client, ProbeCache};
///
/// # fn main() -> imagify_api::Result<()> {
/// let client = Client::new("api-key")?;
/// let mut cache = ProbeCache::new();
///
/// let version = cache.api_version(&client)?; // one request
/// let again = cache.api_version(&client)?;   // served from memory
/// assert_eq!(version, again);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ProbeCache {
    user: Option<Value>,
    api_version: Option<Value>,
    key_status: HashMap<String, Value>,
}

impl ProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached [`Client::user`].
    pub fn user(&mut self, client: &Client) -> Result<Value> {
        if let Some(user) = &self.user {
            return Ok(user.clone());
        }
        let user = client.user()?;
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Cached [`Client::api_version`].
    pub fn api_version(&mut self, client: &Client) -> Result<Value> {
        if let Some(version) = &self.api_version {
            return Ok(version.clone());
        }
        let version = client.api_version()?;
        self.api_version = Some(version.clone());
        Ok(version)
    }

    /// Cached [`Client::key_status`], memoized per candidate key.
    pub fn key_status(&mut self, client: &Client, candidate_key: &str) -> Result<Value> {
        if let Some(status) = self.key_status.get(candidate_key) {
            return Ok(status.clone());
        }
        let status = client.key_status(candidate_key)?;
        self.key_status.insert(candidate_key.to_owned(), status.clone());
        Ok(status)
    }

    /// Forget everything, forcing fresh lookups.
    pub fn clear(&mut self) {
        self.user = None;
        self.api_version = None;
        self.key_status.clear();
    }
}
