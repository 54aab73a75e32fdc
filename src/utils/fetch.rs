//! Script retrieval.
//!
//! The extraction pipeline only ever sees script text. Where that text comes
//! from is behind [`ScriptSource`].

use crate::errors::FetchError;
use std::path::PathBuf;
use std::time::Duration;

/// Anything that can produce the target script's text.
pub trait ScriptSource {
    fn fetch(&self) -> Result<String, FetchError>;

    /// Short human-readable origin for log lines.
    fn describe(&self) -> String;
}

/// Fetch the script over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub url: String,
    pub timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ScriptSource for HttpSource {
    fn fetch(&self) -> Result<String, FetchError> {
        let http_err = |source: reqwest::Error| FetchError::Http {
            url: self.url.clone(),
            source,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(http_err)?;

        log::info!("fetching script from {}", self.url);
        let response = client.get(&self.url).send().map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(http_err)?;
        log::debug!("fetched {} bytes", body.len());
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Read the script from a local file.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScriptSource for FileSource {
    fn fetch(&self) -> Result<String, FetchError> {
        std::fs::read_to_string(&self.path).map_err(|source| FetchError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
