//! Dataset retrieval over HTTP or from local JSON files

use crate::{AtlasError, LaureateDocument, PrizeDocument, Result, LAUREATE_URL, PRIZE_URL};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// The two documents the atlas is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Laureates,
    Prizes,
}

impl Dataset {
    /// Fixed API endpoint
    pub fn url(&self) -> &'static str {
        match self {
            Self::Laureates => LAUREATE_URL,
            Self::Prizes => PRIZE_URL,
        }
    }

    /// File name used for on-disk copies of the endpoint body
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Laureates => "laureate.json",
            Self::Prizes => "prize.json",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Laureates => write!(f, "laureate"),
            Self::Prizes => write!(f, "prize"),
        }
    }
}

/// Something that can hand back the raw body of a dataset
pub trait DatasetSource {
    fn fetch_body(&self, dataset: Dataset) -> Result<String>;
}

impl<T: DatasetSource + ?Sized> DatasetSource for Box<T> {
    fn fetch_body(&self, dataset: Dataset) -> Result<String> {
        (**self).fetch_body(dataset)
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub laureate_url: String,
    pub prize_url: String,
    /// Whole-request timeout; `None` waits for as long as the transport does
    pub timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            laureate_url: Dataset::Laureates.url().to_string(),
            prize_url: Dataset::Prizes.url().to_string(),
            timeout: None,
        }
    }
}

impl FetchConfig {
    pub fn url(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::Laureates => &self.laureate_url,
            Dataset::Prizes => &self.prize_url,
        }
    }
}

/// Blocking HTTP source, one GET per dataset and no retry
pub struct HttpSource {
    config: FetchConfig,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: FetchConfig, client: reqwest::blocking::Client) -> Self {
        Self { config, client }
    }
}

impl DatasetSource for HttpSource {
    fn fetch_body(&self, dataset: Dataset) -> Result<String> {
        let url = self.config.url(dataset);
        info!("Downloading {} data from {}", dataset, url);

        let fetch_error = |reason: String| AtlasError::Fetch { dataset, reason };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_error(format!(
                "{} returned status: {}",
                url,
                response.status()
            )));
        }

        let body = response.text().map_err(|e| fetch_error(e.to_string()))?;
        debug!("Received {} bytes of {} data", body.len(), dataset);

        Ok(body)
    }
}

/// Reads `laureate.json` and `prize.json` from a directory
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DatasetSource for FileSource {
    fn fetch_body(&self, dataset: Dataset) -> Result<String> {
        let path = self.dir.join(dataset.file_name());
        info!("Loading {} data from {:?}", dataset, path);

        std::fs::read_to_string(&path).map_err(|e| AtlasError::Fetch {
            dataset,
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

fn fetch_document<T: DeserializeOwned>(source: &dyn DatasetSource, dataset: Dataset) -> Result<T> {
    let body = source.fetch_body(dataset)?;
    serde_json::from_str(&body).map_err(|source| AtlasError::Malformed { dataset, source })
}

/// Retrieve and parse the laureate document
pub fn fetch_laureates(source: &dyn DatasetSource) -> Result<LaureateDocument> {
    let doc: LaureateDocument = fetch_document(source, Dataset::Laureates)?;
    info!("Fetched {} laureates", doc.laureates.len());
    Ok(doc)
}

/// Retrieve and parse the prize document
pub fn fetch_prizes(source: &dyn DatasetSource) -> Result<PrizeDocument> {
    let doc: PrizeDocument = fetch_document(source, Dataset::Prizes)?;
    info!("Fetched {} prizes", doc.prizes.len());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answer a single HTTP request with the given status line and body
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
        });

        format!("http://{}/", addr)
    }

    fn local_source(laureate_url: String, prize_url: String) -> HttpSource {
        let config = FetchConfig {
            laureate_url,
            prize_url,
            timeout: Some(Duration::from_secs(10)),
        };
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(config.timeout)
            .build()
            .unwrap();
        HttpSource::with_client(config, client)
    }

    #[test]
    fn test_dataset_endpoints() {
        assert_eq!(Dataset::Laureates.url(), "https://api.nobelprize.org/v1/laureate.json");
        assert_eq!(Dataset::Prizes.url(), "https://api.nobelprize.org/v1/prize.json");
        assert_eq!(Dataset::Prizes.file_name(), "prize.json");
        assert_eq!(Dataset::Laureates.to_string(), "laureate");
    }

    #[test]
    fn test_http_success() {
        let url = serve_once("200 OK", r#"{"laureates": [{"id": "1", "bornCountry": "France"}]}"#);
        let source = local_source(url, String::new());

        let doc = fetch_laureates(&source).unwrap();
        assert_eq!(doc.laureates.len(), 1);
        assert_eq!(doc.laureates[0].born_country.as_deref(), Some("France"));
    }

    #[test]
    fn test_http_error_status_is_fetch_failure() {
        let url = serve_once("503 Service Unavailable", "");
        let source = local_source(String::new(), url);

        let err = fetch_prizes(&source).unwrap_err();
        assert!(err.is_fetch_failure());
        match err {
            AtlasError::Fetch { dataset, reason } => {
                assert_eq!(dataset, Dataset::Prizes);
                assert!(reason.contains("503"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_connection_refused_is_fetch_failure() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let source = local_source(format!("http://{}/", addr), String::new());

        let err = fetch_laureates(&source).unwrap_err();
        assert!(matches!(err, AtlasError::Fetch { dataset: Dataset::Laureates, .. }));
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("prize.json"),
            r#"{"prizes": [{"year": "1901", "laureates": [{"id": "1"}]}]}"#,
        )
        .unwrap();

        let source = FileSource::new(dir.path());
        let prizes = fetch_prizes(&source).unwrap();
        assert_eq!(prizes.prizes.len(), 1);

        // laureate.json was never written
        let err = fetch_laureates(&source).unwrap_err();
        assert!(matches!(err, AtlasError::Fetch { dataset: Dataset::Laureates, .. }));
    }

    #[test]
    fn test_malformed_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("laureate.json"), "<html>rate limited</html>").unwrap();

        let err = fetch_laureates(&FileSource::new(dir.path())).unwrap_err();
        assert!(err.is_fetch_failure());
        assert!(matches!(err, AtlasError::Malformed { dataset: Dataset::Laureates, .. }));
    }
}
