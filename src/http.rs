use crate::download;
use crate::error::FetchError;
use crate::events::EventSink;
use std::path::Path;

/// Largest response body read into memory (a week of feed data is ~1 MB).
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Classify the status: 2xx yields the body, 403 and other codes become errors.
    pub fn into_success(self) -> Result<Vec<u8>, FetchError> {
        match self.status {
            200..=299 => Ok(self.body),
            403 => Err(FetchError::Forbidden),
            status => Err(FetchError::Status {
                status,
                body: String::from_utf8_lossy(&self.body).into_owned(),
            }),
        }
    }
}

/// Blocking HTTP access used by both flows.
pub trait Transport {
    /// One GET with query parameters. Non-2xx statuses are returned, not raised.
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, FetchError>;

    /// Stream `url` into `dest`, reporting progress. Returns the bytes on disk.
    fn download(&self, url: &str, dest: &Path, sink: &dyn EventSink) -> Result<u64, FetchError>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// No timeout is configured; the client's defaults apply.
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        let transport_err = |e: ureq::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        log::debug!("GET {} ({} query parameters)", url, query.len());

        let mut resp = request.call().map_err(transport_err)?;
        let status = resp.status().as_u16();
        let body = resp
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(transport_err)?;
        log::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(HttpResponse { status, body })
    }

    fn download(&self, url: &str, dest: &Path, sink: &dyn EventSink) -> Result<u64, FetchError> {
        download::download(&self.agent, url, dest, sink)
    }
}

// ── Scripted transport (tests) ──────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse { status, body: body.as_bytes().to_vec() }
    }

    #[test]
    fn test_success_statuses_yield_body() {
        assert_eq!(response(200, "{}").into_success().unwrap(), b"{}");
        assert_eq!(response(204, "").into_success().unwrap(), b"");
    }

    #[test]
    fn test_forbidden_is_called_out() {
        let err = response(403, "OVER_RATE_LIMIT").into_success().unwrap_err();
        assert!(matches!(err, FetchError::Forbidden));
        assert!(err.to_string().contains("invalid API key or rate limit"));
    }

    #[test]
    fn test_other_statuses_keep_body_text() {
        match response(500, "upstream down").into_success() {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
