//! Source reading for sitemap documents
//!
//! A source is either an `http`/`https` URL, fetched with bounded retries and
//! linear backoff, or a local file path.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Reads raw sitemap bytes from local files or remote URLs
#[derive(Debug, Clone)]
pub struct SourceReader {
    client: Client,
    max_attempts: u32,
    backoff_unit: Duration,
}

/// Delay before retrying after failed attempt `attempt` (1-based)
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    unit.saturating_mul(attempt)
}

/// Whether a source should be fetched over HTTP
pub fn is_remote(source: &str) -> bool {
    Url::parse(source)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

impl SourceReader {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts.max(1),
            backoff_unit: config.backoff_unit(),
        })
    }

    /// Read a source into memory
    pub async fn read(&self, source: &str) -> Result<Vec<u8>> {
        if is_remote(source) {
            self.fetch(source).await
        } else {
            self.read_file(Path::new(source)).await
        }
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        debug!("Reading file: {}", path.display());
        let data = tokio::fs::read(path).await?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(data)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut last_err: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            debug!("Fetching {} (attempt {}/{})", url, attempt, self.max_attempts);

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.bytes().await?;
                        debug!("Fetched {} bytes from {}", body.len(), url);
                        return Ok(body.to_vec());
                    }
                    if !status.is_server_error() {
                        return Err(Error::Fetch(format!("unexpected status code: {}", status)));
                    }
                    last_err = Some(format!("server error: {}", status));
                }
                Err(e) => last_err = Some(e.to_string()),
            }

            if attempt < self.max_attempts {
                let delay = backoff_delay(attempt, self.backoff_unit);
                warn!(
                    "Fetch of {} failed ({}), retrying in {:?}",
                    url,
                    last_err.as_deref().unwrap_or("unknown error"),
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(Error::Fetch(format!(
            "max retries exceeded: {}",
            last_err.unwrap_or_else(|| "no attempts made".to_string())
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_reader() -> SourceReader {
        let config = FetchConfig {
            max_attempts: 3,
            timeout_secs: 5,
            backoff_unit_ms: 10,
            ..Default::default()
        };
        SourceReader::new(&config).expect("reader should build")
    }

    #[test]
    fn test_backoff_is_linear() {
        let unit = Duration::from_secs(1);
        assert_eq!(backoff_delay(1, unit), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, unit), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, unit), Duration::from_secs(3));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/sitemap.xml"));
        assert!(is_remote("http://localhost:8080/sitemap.xml"));
        assert!(!is_remote("ftp://example.com/sitemap.xml"));
        assert!(!is_remote("/tmp/sitemap.xml"));
        assert!(!is_remote("sitemap.xml"));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<urlset/>"))
            .mount(&server)
            .await;

        let data = test_reader()
            .read(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap();
        assert_eq!(data, b"<urlset/>");
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = test_reader()
            .read(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("max retries exceeded"));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_retries_wait_linear_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let unit = Duration::from_millis(200);
        let reader = SourceReader::new(&FetchConfig {
            max_attempts: 3,
            timeout_secs: 5,
            backoff_unit_ms: unit.as_millis() as u64,
            ..Default::default()
        })
        .unwrap();

        let started = std::time::Instant::now();
        let err = reader
            .read(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        // One unit after the first attempt, two after the second, none after the last
        assert!(err.to_string().contains("max retries exceeded"));
        assert!(elapsed >= unit * 3, "waited only {:?}", elapsed);
        assert!(elapsed < unit * 4, "waited {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = test_reader()
            .read(&format!("{}/missing.xml", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Fetch(_)));
        assert!(err.to_string().contains("unexpected status code: 404"));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let data = test_reader()
            .read(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap();
        assert_eq!(data, b"ok");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_read_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<urlset></urlset>").unwrap();

        let data = test_reader()
            .read(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(data, b"<urlset></urlset>");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("nope.xml");

        let err = test_reader()
            .read(missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
