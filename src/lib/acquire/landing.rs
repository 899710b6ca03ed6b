//! Unwrapping of GIF landing pages into direct media URLs.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use html_escape::decode_html_entities;
use regex::Regex;
use url::Url;

use super::http::HttpClient;


/// Hosts whose URLs point to HTML pages with the actual media linked inside.
pub const LANDING_PAGE_HOSTS: &[&str] = &["tenor.com", "www.tenor.com"];

/// Maximum size of a landing page that's going to be searched for media.
const MAX_PAGE_SIZE: u64 = 4 * 1024 * 1024;


/// Resolves URLs of landing pages into URLs of the media they show.
pub trait LandingPageResolver: Send + Sync {
    /// Return the URL of the media shown on a landing page,
    /// or the original URL if it's not a (recognized) landing page.
    fn unwrap_landing_page(&self, url: &Url) -> Url;
}


/// Landing page resolver which looks for the `og:image` Open Graph tag.
pub struct OpenGraphResolver {
    client: Arc<dyn HttpClient>,
    hosts: HashSet<String>,
}

impl OpenGraphResolver {
    /// Create a resolver for the default set of landing page hosts.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self::for_hosts(client, LANDING_PAGE_HOSTS.iter().cloned())
    }

    pub fn for_hosts<I, S>(client: Arc<dyn HttpClient>, hosts: I) -> Self
        where I: IntoIterator<Item=S>, S: Into<String>
    {
        let hosts = hosts.into_iter().map(|h| h.into().to_lowercase()).collect();
        OpenGraphResolver{client, hosts}
    }

    /// Whether given URL points to a known landing page host.
    pub fn is_landing_page(&self, url: &Url) -> bool {
        url.host_str().map(|h| self.hosts.contains(&h.to_lowercase())).unwrap_or(false)
    }
}

impl LandingPageResolver for OpenGraphResolver {
    fn unwrap_landing_page(&self, url: &Url) -> Url {
        if !self.is_landing_page(url) {
            return url.clone();
        }
        debug!("Looking for media on landing page {}", url);

        let page = match self.client.get(url, MAX_PAGE_SIZE) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to fetch landing page {}: {}", url, e);
                return url.clone();
            }
        };
        let html = String::from_utf8_lossy(&page);
        match find_og_image(&html, url) {
            Some(media_url) => {
                debug!("Landing page {} shows media at {}", url, media_url);
                media_url
            }
            None => {
                warn!("No og:image found on landing page {}", url);
                url.clone()
            }
        }
    }
}

impl fmt::Debug for OpenGraphResolver {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("OpenGraphResolver")
            .field("hosts", &self.hosts)
            .finish()
    }
}


/// Find the URL in the first `<meta property="og:image" content="...">` tag.
///
/// Relative URLs are resolved against the page URL.
pub fn find_og_image(html: &str, page_url: &Url) -> Option<Url> {
    lazy_static! {
        static ref META_TAG_RE: Regex = Regex::new(r"(?is)<meta\b[^>]*>").unwrap();
        static ref ATTR_RE: Regex = Regex::new(
            r#"(?is)([a-z][a-z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap();
    }

    for tag in META_TAG_RE.find_iter(html) {
        let mut property = None;
        let mut content = None;
        for attr in ATTR_RE.captures_iter(tag.as_str()) {
            let value = attr.get(2).or_else(|| attr.get(3)).or_else(|| attr.get(4))
                .map(|m| m.as_str()).unwrap_or("");
            match attr[1].to_lowercase().as_str() {
                "property" => property = Some(value),
                "content" => content = Some(value),
                _ => {}
            }
        }
        if property.map(|p| p.eq_ignore_ascii_case("og:image")).unwrap_or(false) {
            let content = decode_html_entities(content?.trim()).into_owned();
            return page_url.join(&content).ok();
        }
    }
    None
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use spectral::prelude::*;
    use url::Url;

    use crate::acquire::{AcquireError, HttpClient};
    use super::{find_og_image, LandingPageResolver, OpenGraphResolver};

    /// HTTP client serving canned responses & recording requests.
    #[derive(Default)]
    struct MockClient {
        pages: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<String>>,
    }

    impl MockClient {
        fn with_page(url: &str, body: &str) -> Self {
            let mut client = MockClient::default();
            client.pages.insert(url.to_owned(), body.as_bytes().to_vec());
            client
        }
    }

    impl HttpClient for MockClient {
        fn get(&self, url: &Url, _: u64) -> Result<Vec<u8>, AcquireError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages.get(url.as_str()).cloned()
                .ok_or_else(|| AcquireError::Status(404, url.to_string()))
        }
    }

    const PAGE_URL: &str = "https://tenor.com/view/funny-cat-12345";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn og_image_found() {
        let html = r#"<html><head>
            <meta property="og:title" content="Funny cat">
            <meta property="og:image" content="https://media.tenor.com/abc/cat.gif?a=1&amp;b=2">
            <meta property="og:image" content="https://media.tenor.com/second.gif">
            </head></html>"#;
        assert_that!(find_og_image(html, &url(PAGE_URL)))
            .is_equal_to(Some(url("https://media.tenor.com/abc/cat.gif?a=1&b=2")));
    }

    #[test]
    fn og_image_attribute_order() {
        let html = r#"<META content='/media/x.gif' PROPERTY='og:image' />"#;
        assert_that!(find_og_image(html, &url(PAGE_URL)))
            .is_equal_to(Some(url("https://tenor.com/media/x.gif")));
    }

    #[test]
    fn og_image_missing() {
        let html = r#"<html><head><meta name="description" content="nope"></head></html>"#;
        assert_that!(find_og_image(html, &url(PAGE_URL))).is_none();
        assert_that!(find_og_image("", &url(PAGE_URL))).is_none();
    }

    #[test]
    fn unwraps_landing_page() {
        let client = Arc::new(MockClient::with_page(PAGE_URL,
            r#"<meta property="og:image" content="https://media.tenor.com/cat.gif">"#));
        let resolver = OpenGraphResolver::new(client.clone());
        assert_eq!(url("https://media.tenor.com/cat.gif"),
            resolver.unwrap_landing_page(&url(PAGE_URL)));
        assert_eq!(vec![PAGE_URL.to_owned()], *client.requests.lock().unwrap());
    }

    #[test]
    fn keeps_url_without_og_image() {
        let client = Arc::new(MockClient::with_page(PAGE_URL, "<html></html>"));
        let resolver = OpenGraphResolver::new(client);
        assert_eq!(url(PAGE_URL), resolver.unwrap_landing_page(&url(PAGE_URL)));
    }

    #[test]
    fn keeps_url_when_page_fails() {
        let client = Arc::new(MockClient::default());
        let resolver = OpenGraphResolver::new(client);
        assert_eq!(url(PAGE_URL), resolver.unwrap_landing_page(&url(PAGE_URL)));
    }

    #[test]
    fn ignores_other_hosts() {
        let client = Arc::new(MockClient::default());
        let resolver = OpenGraphResolver::new(client.clone());
        let image_url = url("https://example.com/view/cat.gif");
        assert_eq!(image_url, resolver.unwrap_landing_page(&image_url));
        assert_that!(*client.requests.lock().unwrap()).is_empty();
    }
}
