use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::errors::{CliError, redact_secret, with_debug_hint};

/// Upper bound for a downloaded image body.
pub const MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    debug: bool,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub request_id: Option<String>,
    pub elapsed_ms: u128,
    pub json: Value,
}

impl ApiClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout_ms: u64,
        debug: bool,
    ) -> Result<Self, CliError> {
        let timeout = Duration::from_millis(timeout_ms.max(1));
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            debug,
        })
    }

    /// POST a JSON body to an API path. One attempt only: generation
    /// requests are never replayed.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, CliError> {
        let key = self.api_key.clone().ok_or_else(|| {
            CliError::Auth(
                "Missing API key. Set OPENAI_API_KEY or run `scriptreview config set apiKey <key>`."
                    .to_string(),
            )
        })?;

        let url = join_url(&self.base_url, path);
        let started = Instant::now();
        debug!(%url, "sending request");

        let response = self
            .client
            .post(url)
            .bearer_auth(&key)
            .json(body)
            .send()
            .await
            .map_err(|err| self.network_error(err))?;

        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let text = response.text().await.unwrap_or_default();
        let parsed = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "raw": text }))
        };

        if status.is_success() {
            return Ok(ApiResponse {
                request_id,
                elapsed_ms: started.elapsed().as_millis(),
                json: parsed,
            });
        }

        warn!(status = status.as_u16(), ?request_id, "request failed");
        Err(self.http_error(status, request_id, parsed))
    }

    /// Download raw bytes from an absolute URL. The API key is not sent:
    /// generated images live on a separate storage host.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CliError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| CliError::Fetch(format!("Failed downloading image: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CliError::Fetch(format!(
                "Image download failed with status {}",
                status.as_u16()
            )));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|err| CliError::Fetch(format!("Image download interrupted: {err}")))?;
            append_capped(&mut body, &chunk, MAX_IMAGE_BYTES)?;
        }

        if body.is_empty() {
            return Err(CliError::Fetch("Image download returned no bytes.".to_string()));
        }
        Ok(body)
    }

    fn network_error(&self, err: reqwest::Error) -> CliError {
        let message = if err.is_timeout() {
            "Request timed out.".to_string()
        } else {
            format!("Network request failed: {err}")
        };
        warn!(%message, "network failure");
        CliError::Network(with_debug_hint(&message, self.debug))
    }

    fn http_error(
        &self,
        status: StatusCode,
        request_id: Option<String>,
        payload: Value,
    ) -> CliError {
        let message = error_message(&payload)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

        let mut details = message;
        if let Some(id) = request_id {
            details.push_str(&format!(" (request_id: {id})"));
        }
        if self.debug {
            details.push_str(&format!(" payload={payload}"));
        } else {
            details = with_debug_hint(&details, false);
        }
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            details = details.replace(key, &redact_secret(key));
        }

        match status.as_u16() {
            400 => CliError::Usage(details),
            401 | 403 => CliError::Auth(details),
            429 => CliError::RateLimited(details),
            500..=599 => CliError::Server(details),
            _ => CliError::Generic(details),
        }
    }
}

/// Append one downloaded chunk, refusing any that would take the body past
/// `limit` bytes.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), CliError> {
    if body.len() + chunk.len() > limit {
        return Err(CliError::Fetch(format!(
            "Image exceeds the {limit}-byte download limit."
        )));
    }
    body.extend_from_slice(chunk);
    Ok(())
}

/// OpenAI-style errors nest the text under `error.message`; other gateways
/// return a bare `error` or `message` string.
fn error_message(payload: &Value) -> Option<String> {
    payload
        .get("error")
        .and_then(|v| v.get("message"))
        .and_then(|v| v.as_str())
        .or_else(|| payload.get("error").and_then(|v| v.as_str()))
        .or_else(|| payload.get("message").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// One-shot HTTP/1.1 server on 127.0.0.1 that answers the first request with
/// `status` and `body`, then closes. Returns its base URL.
#[cfg(test)]
pub(crate) fn serve_once(status: u16, body: &'static str) -> String {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    std::thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            request.extend_from_slice(&buf[..n]);
            let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + 4 + length {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes());
    });
    format!("http://{addr}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(
            join_url("https://api.openai.com/v1/", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            join_url("https://api.openai.com/v1", "images/generations"),
            "https://api.openai.com/v1/images/generations"
        );
    }

    #[test]
    fn join_url_keeps_absolute_paths() {
        assert_eq!(
            join_url("https://api.openai.com/v1", "https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn error_message_reads_nested_openai_shape() {
        let payload = json!({ "error": { "message": "Invalid API key", "type": "auth" } });
        assert_eq!(error_message(&payload).as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn error_message_reads_flat_shapes() {
        assert_eq!(
            error_message(&json!({ "error": "nope" })).as_deref(),
            Some("nope")
        );
        assert_eq!(
            error_message(&json!({ "message": "busy" })).as_deref(),
            Some("busy")
        );
        assert_eq!(error_message(&json!({})), None);
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        let api = ApiClient::new(
            "https://api.openai.com/v1".to_string(),
            Some("sk-secret-key".to_string()),
            1_000,
            false,
        )
        .unwrap();
        assert!(matches!(
            api.http_error(StatusCode::UNAUTHORIZED, None, json!({})),
            CliError::Auth(_)
        ));
        assert!(matches!(
            api.http_error(StatusCode::TOO_MANY_REQUESTS, None, json!({})),
            CliError::RateLimited(_)
        ));
        assert!(matches!(
            api.http_error(StatusCode::BAD_GATEWAY, None, json!({})),
            CliError::Server(_)
        ));
        assert!(matches!(
            api.http_error(StatusCode::BAD_REQUEST, None, json!({})),
            CliError::Usage(_)
        ));
    }

    #[test]
    fn debug_payload_redacts_key() {
        let api = ApiClient::new(
            "https://api.openai.com/v1".to_string(),
            Some("sk-secret-key".to_string()),
            1_000,
            true,
        )
        .unwrap();
        let err = api.http_error(
            StatusCode::UNAUTHORIZED,
            Some("req_1".to_string()),
            json!({ "error": { "message": "bad key sk-secret-key" } }),
        );
        let text = err.to_string();
        assert!(text.contains("request_id: req_1"));
        assert!(!text.contains("sk-secret-key"));
        assert!(text.contains("sk-*******key"));
    }

    fn local_client(base_url: String) -> ApiClient {
        ApiClient::new(base_url, Some("sk-test".to_string()), 5_000, false).unwrap()
    }

    #[test]
    fn download_cap_allows_exact_limit() {
        let mut body = vec![0u8; 6];
        append_capped(&mut body, &[1, 2, 3, 4], 10).unwrap();
        assert_eq!(body.len(), 10);
    }

    #[test]
    fn download_cap_rejects_one_byte_over() {
        let mut body = vec![0u8; 6];
        let err = append_capped(&mut body, &[1, 2, 3, 4, 5], 10).unwrap_err();
        assert!(matches!(err, CliError::Fetch(_)));
        assert_eq!(body.len(), 6);
    }

    #[tokio::test]
    async fn image_download_returns_body() {
        let base = serve_once(200, "PNGDATA");
        let bytes = local_client(base.clone())
            .get_bytes(&format!("{base}/img.png"))
            .await
            .unwrap();
        assert_eq!(bytes, b"PNGDATA");
    }

    #[tokio::test]
    async fn image_download_error_status_is_fetch_failure() {
        let base = serve_once(404, "gone");
        let err = local_client(base.clone())
            .get_bytes(&format!("{base}/img.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Fetch(ref msg) if msg.contains("404")), "{err:?}");
    }

    #[tokio::test]
    async fn empty_image_download_is_fetch_failure() {
        let base = serve_once(200, "");
        let err = local_client(base.clone())
            .get_bytes(&format!("{base}/img.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Fetch(_)), "{err:?}");
    }

    #[tokio::test]
    async fn bad_request_maps_to_usage_with_service_message() {
        let base = serve_once(400, r#"{"error":{"message":"bad prompt"}}"#);
        let err = local_client(base)
            .post_json("/images/generations", &json!({ "prompt": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Usage(ref msg) if msg.starts_with("bad prompt")), "{err:?}");
    }
}
