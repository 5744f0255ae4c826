//! Shared HTTP plumbing for service adapters.
//!
//! All adapters speak JSON-over-POST to their backend. This module owns the
//! client construction and the mapping from HTTP outcomes onto the engine's
//! error taxonomy, so every adapter classifies failures the same way.

use std::time::Duration;

use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::Deserialize;

use deckflow_core::{DeckflowError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body shape shared by the content services.
#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<String>,
    message: String,
}

/// Builds the shared reqwest client.
///
/// Only the connect timeout lives here; the per-call deadline is enforced
/// by the router so it can differ per service.
pub(crate) fn build_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|err| DeckflowError::internal(format!("failed to build HTTP client: {err}")))
}

/// POSTs `body` as JSON and returns the parsed JSON response.
///
/// Non-success statuses and transport failures come back already mapped
/// onto [`DeckflowError`], with the service name attached.
pub(crate) async fn post_json(
    client: &Client,
    service: &str,
    url: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let response = client
        .post(url)
        .header("content-type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|err| {
            DeckflowError::transient_network(service, format!("request failed: {err}"))
        })?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = parse_retry_after(response.headers().get("retry-after"));
        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error body".to_string());
        return Err(map_http_error(service, status, body_text, retry_after));
    }

    response.json().await.map_err(|err| {
        DeckflowError::permanent_service(
            service,
            Some(status.as_u16()),
            format!("unparseable response body: {err}"),
        )
    })
}

/// Maps a non-success HTTP status onto the error taxonomy.
///
/// 429 is a rate-limit signal; the 5xx gateway family is transient; every
/// other status is a permanent rejection of this request.
pub(crate) fn map_http_error(
    service: &str,
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> DeckflowError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    match status {
        StatusCode::TOO_MANY_REQUESTS => DeckflowError::rate_limited(
            service,
            message,
            retry_after.map(|d| d.as_millis() as u64),
        ),
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            DeckflowError::transient_network(service, format!("{status}: {message}"))
        }
        _ => DeckflowError::permanent_service(service, Some(status.as_u16()), message),
    }
}

pub(crate) fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // The HTTP-date form of Retry-After is not handled
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_status_maps_to_rate_limited_with_hint() {
        let err = map_http_error(
            "chart",
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":"rate_limit","message":"slow down"}}"#.to_string(),
            Some(Duration::from_secs(3)),
        );
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_millis(3_000)));
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn gateway_family_maps_to_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::GATEWAY_TIMEOUT,
        ] {
            let err = map_http_error("layout", status, "boom".to_string(), None);
            assert!(err.is_retryable(), "{status} should be retryable");
            assert!(!err.is_rate_limited());
        }
    }

    #[test]
    fn client_errors_map_to_permanent() {
        let err = map_http_error(
            "diagram",
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error":{"code":null,"message":"unknown figure kind"}}"#.to_string(),
            None,
        );
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("unknown figure kind"));
    }

    #[test]
    fn unparseable_error_body_is_used_verbatim() {
        let err = map_http_error(
            "layout",
            StatusCode::BAD_REQUEST,
            "<html>denied</html>".to_string(),
            None,
        );
        assert!(err.to_string().contains("<html>denied</html>"));
    }

    #[test]
    fn retry_after_parses_whole_seconds_only() {
        let value = HeaderValue::from_static("7");
        assert_eq!(
            parse_retry_after(Some(&value)),
            Some(Duration::from_secs(7))
        );

        let value = HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&value)), None);

        assert_eq!(parse_retry_after(None), None);
    }
}
