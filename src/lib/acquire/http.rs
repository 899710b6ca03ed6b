//! HTTP transport used to fetch remote images & pages.

use std::fmt;
use std::time::Duration;

use ureq::{self, Agent};
use url::Url;

use super::AcquireError;


/// User-Agent sent with all requests.
///
/// Some image hosts (notably GIF landing pages) refuse to serve
/// anything that doesn't look like a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; memecap/0.1)";

/// Default timeout of a single HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);


/// Client that performs HTTP GET requests.
pub trait HttpClient: Send + Sync {
    /// Fetch the body of a resource at given URL.
    ///
    /// Bodies larger than `limit` bytes are rejected.
    fn get(&self, url: &Url, limit: u64) -> Result<Vec<u8>, AcquireError>;
}


/// Blocking `HttpClient` implemented on top of `ureq`.
#[derive(Clone)]
pub struct UreqClient {
    agent: Agent,
    timeout: Duration,
}

impl UreqClient {
    #[inline]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        UreqClient{agent: Agent::new_with_config(config), timeout}
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &Url, limit: u64) -> Result<Vec<u8>, AcquireError> {
        debug!("GET {}", url);
        let mut response = self.agent.get(url.as_str())
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => AcquireError::Status(status, url.to_string()),
                e => AcquireError::Http(url.to_string(), e.to_string()),
            })?;

        let bytes = response.body_mut()
            .with_config().limit(limit)
            .read_to_vec()
            .map_err(|e| AcquireError::Http(url.to_string(), e.to_string()))?;
        trace!("Fetched {} byte(s) from {}", bytes.len(), url);
        Ok(bytes)
    }
}

impl fmt::Debug for UreqClient {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("UreqClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}
