//! Blocking HTTP transport behind a small trait.
//!
//! Adapters only ever need "GET this URL as text within this timeout", so that
//! is the whole seam. [`BlockingHttp`] is the network implementation;
//! [`CannedHttp`] serves fixed bodies for tests and offline replays.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::SourceError;

/// Fetch a URL body as text.
pub trait HttpFetch: Send + Sync {
    fn get_text(&self, url: &str, timeout: Duration) -> Result<String, SourceError>;
}

/// `reqwest` blocking client. One call at a time, no retries: a failed call is
/// retried only implicitly, by the date fallback moving to the previous day.
pub struct BlockingHttp {
    client: reqwest::blocking::Client,
}

impl BlockingHttp {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }
}

impl Default for BlockingHttp {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetch for BlockingHttp {
    fn get_text(&self, url: &str, timeout: Duration) -> Result<String, SourceError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| classify(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().map_err(|e| classify(url, e))
    }
}

fn classify(url: &str, e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout {
            url: url.to_string(),
        }
    } else {
        SourceError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Canned response for one URL.
#[derive(Debug, Clone)]
pub enum CannedResponse {
    Body(String),
    Status(u16),
    Timeout,
}

/// Serves fixed responses keyed by exact URL and records every request.
///
/// Unknown URLs answer 404, which is what most municipal endpoints do for a
/// date that hasn't been published yet.
#[derive(Debug, Default)]
pub struct CannedHttp {
    responses: HashMap<String, CannedResponse>,
    requests: Mutex<Vec<String>>,
}

impl CannedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .insert(url.into(), CannedResponse::Body(body.into()));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.responses
            .insert(url.into(), CannedResponse::Status(status));
        self
    }

    pub fn with_timeout(mut self, url: impl Into<String>) -> Self {
        self.responses.insert(url.into(), CannedResponse::Timeout);
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl HttpFetch for CannedHttp {
    fn get_text(&self, url: &str, _timeout: Duration) -> Result<String, SourceError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(url.to_string());
        }

        match self.responses.get(url) {
            Some(CannedResponse::Body(body)) => Ok(body.clone()),
            Some(CannedResponse::Status(status)) => Err(SourceError::HttpStatus {
                url: url.to_string(),
                status: *status,
            }),
            Some(CannedResponse::Timeout) => Err(SourceError::Timeout {
                url: url.to_string(),
            }),
            None => Err(SourceError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_serves_bodies_and_logs_requests() {
        let http = CannedHttp::new()
            .with_body("https://a.test/1", "hello")
            .with_status("https://a.test/2", 503)
            .with_timeout("https://a.test/3");
        let t = Duration::from_secs(1);

        assert_eq!(http.get_text("https://a.test/1", t).unwrap(), "hello");
        assert!(matches!(
            http.get_text("https://a.test/2", t),
            Err(SourceError::HttpStatus { status: 503, .. })
        ));
        assert!(matches!(
            http.get_text("https://a.test/3", t),
            Err(SourceError::Timeout { .. })
        ));
        assert!(matches!(
            http.get_text("https://a.test/missing", t),
            Err(SourceError::HttpStatus { status: 404, .. })
        ));
        assert_eq!(http.requests().len(), 4);
    }
}
