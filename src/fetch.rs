use std::time::Duration;

use rand::{Rng, rng};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, PRAGMA, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use robotstxt::DefaultMatcher;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::TtlCache;
use crate::error::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_ID: &str = "id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7";
const ROBOTS_AGENT: &str = "Mozilla";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub respect_robots: bool,
    /// How long a fetched robots.txt body is trusted.
    pub robots_ttl_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            respect_robots: true,
            robots_ttl_secs: 3600,
        }
    }
}

/// Single-shot HTML fetcher. No retries: a failed fetch is the caller's call.
pub struct FetchClient {
    client: reqwest::Client,
    config: FetchConfig,
    robots: TtlCache<String>,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(8))
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(Error::ClientBuild)?;
        Ok(Self {
            client,
            config,
            robots: TtlCache::new(),
        })
    }

    /// GET `url` and return the body. Fails on timeout, non-2xx status,
    /// transport errors, and (when enabled) robots.txt disallow.
    pub async fn fetch_html(&self, url: &Url, timeout: Duration) -> Result<String> {
        if self.config.respect_robots && !self.robots_allow(url, timeout).await {
            warn!(%url, "robots.txt disallows url");
            return Err(Error::RobotsDisallowed {
                url: url.to_string(),
            });
        }

        let referer = url.origin().ascii_serialization();
        debug!(%url, ?timeout, "fetching");
        let rsp = self
            .client
            .get(url.as_str())
            .headers(base_headers(&referer))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(url, timeout, e))?;

        let status = rsp.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "non-success status");
            return Err(Error::FetchHttp {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = rsp
            .text()
            .await
            .map_err(|e| transport_error(url, timeout, e))?;
        info!(%url, status = status.as_u16(), len = text.len(), "fetched");
        Ok(text)
    }

    /// Robots bodies are fetched once per origin and cached. A missing or
    /// unreadable robots.txt allows everything.
    async fn robots_allow(&self, url: &Url, timeout: Duration) -> bool {
        let origin = url.origin().ascii_serialization();
        let body = match self.robots.get(&origin) {
            Some(body) => body,
            None => {
                let body = self.fetch_robots(&origin, timeout).await;
                self.robots
                    .set(origin.clone(), body.clone(), self.config.robots_ttl_secs);
                body
            }
        };
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&body, ROBOTS_AGENT, url.as_str())
    }

    async fn fetch_robots(&self, origin: &str, timeout: Duration) -> String {
        let robots_url = format!("{origin}/robots.txt");
        match self
            .client
            .get(&robots_url)
            .header(USER_AGENT, random_desktop_ua())
            .timeout(timeout)
            .send()
            .await
        {
            Ok(rsp) if rsp.status().is_success() => rsp.text().await.unwrap_or_default(),
            Ok(rsp) => {
                debug!(%robots_url, status = rsp.status().as_u16(), "no robots.txt");
                String::new()
            }
            Err(e) => {
                debug!(%robots_url, error = %e, "robots.txt unreachable");
                String::new()
            }
        }
    }
}

fn transport_error(url: &Url, timeout: Duration, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::FetchTimeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        Error::FetchNetwork {
            url: url.to_string(),
            source: e,
        }
    }
}

fn base_headers(referer: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(USER_AGENT, HeaderValue::from_static(random_desktop_ua()));
    h.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_ID));
    if let Ok(v) = HeaderValue::from_str(referer) {
        h.insert(REFERER, v);
    }
    h.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    h.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    h.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    h.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    h.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    h
}

fn random_desktop_ua() -> &'static str {
    const UAS: &[&str] = &[
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    ];
    UAS[rng().random_range(0..UAS.len())]
}

/// Randomized pause between consecutive page fetches.
pub async fn polite_pause() {
    let ms = rng().random_range(900..2200);
    sleep(Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use httpmock::prelude::*;

    fn client(respect_robots: bool) -> FetchClient {
        FetchClient::new(FetchConfig {
            respect_robots,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    fn url(server: &MockServer, path: &str) -> Url {
        Url::parse(&server.url(path)).unwrap()
    }

    #[tokio::test]
    async fn returns_body_with_browser_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/id/jobs/in-Indonesia")
                    .header("accept-language", ACCEPT_LANGUAGE_ID)
                    .header_exists("user-agent")
                    .header_exists("referer");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<html><body>ok</body></html>");
            })
            .await;

        let body = client(false)
            .fetch_html(&url(&server, "/id/jobs/in-Indonesia"), DEFAULT_TIMEOUT)
            .await
            .unwrap();
        mock.assert_async().await;
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(503);
            })
            .await;

        let err = client(false)
            .fetch_html(&url(&server, "/gone"), DEFAULT_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FetchHttp { status: 503, .. }));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200).delay(Duration::from_millis(800)).body("late");
            })
            .await;

        let err = client(false)
            .fetch_html(&url(&server, "/slow"), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FetchTimeout);
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let err = client(false)
            .fetch_html(&Url::parse("http://127.0.0.1:1/").unwrap(), DEFAULT_TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FetchNetwork);
    }

    #[tokio::test]
    async fn robots_disallow_blocks_before_get() {
        let server = MockServer::start_async().await;
        let robots = server
            .mock_async(|when, then| {
                when.method(GET).path("/robots.txt");
                then.status(200).body("User-agent: *\nDisallow: /private\n");
            })
            .await;
        let private = server
            .mock_async(|when, then| {
                when.method(GET).path("/private/page");
                then.status(200).body("secret");
            })
            .await;
        let public = server
            .mock_async(|when, then| {
                when.method(GET).path("/public");
                then.status(200).body("hello");
            })
            .await;

        let client = client(true);
        let err = client
            .fetch_html(&url(&server, "/private/page"), DEFAULT_TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RobotsDisallowed);
        assert_eq!(
            client
                .fetch_html(&url(&server, "/public"), DEFAULT_TIMEOUT)
                .await
                .unwrap(),
            "hello"
        );

        robots.assert_hits_async(1).await;
        private.assert_hits_async(0).await;
        public.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn missing_robots_allows_everything() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200).body("listing");
            })
            .await;

        let body = client(true)
            .fetch_html(&url(&server, "/jobs"), DEFAULT_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(body, "listing");
    }
}
