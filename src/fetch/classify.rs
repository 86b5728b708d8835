// src/fetch/classify.rs
//
// The portal answers 200 with its login page once a session has expired,
// so the status code alone never decides success.

use reqwest::header::{HeaderMap, LOCATION};
use thiserror::Error;
use tracing::debug;

use super::transport::RawResponse;

/// Container the portal renders around its login form.
const LOGIN_CONTAINER_MARKER: &str = r#"<div class="login-main" ng-app="loginApp" ng-cloak>"#;
/// Name of the login page's client-side application.
const LOGIN_APP_MARKER: &str = "loginApp";

/// Why a report fetch did not produce a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Session missing or expired: a login page served as 200, or any 4xx.
    #[error("authentication failed for {url}: {status} {reason}")]
    Auth {
        status: u16,
        reason: String,
        url: String,
        body: String,
    },

    /// A 302 reached us even though the transport follows redirects.
    #[error("unexpected redirect to {location}")]
    UnexpectedRedirect { location: String, body: String },

    /// Any other non-success status.
    #[error("portal API error: {status} - {headers:?}")]
    Api { status: u16, headers: HeaderMap },

    /// The transport itself failed (connection, TLS, body read).
    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}

impl FetchError {
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Auth { status, .. } | FetchError::Api { status, .. } => Some(*status),
            FetchError::UnexpectedRedirect { .. } => Some(302),
            FetchError::Transport(_) => None,
        }
    }
}

/// True when `body` is the portal's login page rather than a report.
pub fn looks_like_login_page(body: &str) -> bool {
    body.contains(LOGIN_CONTAINER_MARKER) || body.contains(LOGIN_APP_MARKER)
}

/// Turn a raw response into its body text or a categorised failure.
///
/// The body is read at most once; every diagnostic reuses that text.
pub async fn classify(mut response: RawResponse) -> Result<String, FetchError> {
    let status = response.status;
    let reason = std::mem::take(&mut response.reason);
    let headers = std::mem::take(&mut response.headers);
    let url = response.url.clone();

    match status {
        200 => {
            let text = response.text().await.map_err(FetchError::Transport)?;
            if looks_like_login_page(&text) {
                return Err(FetchError::Auth {
                    status,
                    reason,
                    url: url.to_string(),
                    body: text,
                });
            }
            Ok(text)
        }
        400..=499 => Err(FetchError::Auth {
            status,
            reason,
            url: url.to_string(),
            body: diagnostic_body(response).await,
        }),
        302 => {
            let location = headers
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| url.to_string());
            Err(FetchError::UnexpectedRedirect {
                location,
                body: diagnostic_body(response).await,
            })
        }
        _ => Err(FetchError::Api { status, headers }),
    }
}

// A body that fails to read must not mask the status-based classification.
async fn diagnostic_body(response: RawResponse) -> String {
    match response.text().await {
        Ok(text) => text,
        Err(e) => {
            debug!(error = %e, "could not read error response body");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use reqwest::header::HeaderValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use url::Url;

    fn url() -> Url {
        Url::parse("https://portal.example/index.cfm").unwrap()
    }

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse::from_text(status, "", HeaderMap::new(), url(), body)
    }

    #[test]
    fn test_login_markers() {
        assert!(looks_like_login_page(
            r#"<html><div class="login-main" ng-app="loginApp" ng-cloak></div></html>"#
        ));
        assert!(looks_like_login_page("<script>angular.module('loginApp')</script>"));
        assert!(!looks_like_login_page("<table class=\"functionLayout\"></table>"));
    }

    #[tokio::test]
    async fn test_ok_body_returned_unmodified() {
        let body = "  <table><tr><td>x</td></tr></table>\n";
        let text = classify(response(200, body)).await.unwrap();
        assert_eq!(text, body);
    }

    #[tokio::test]
    async fn test_login_page_on_200_is_auth_failure() {
        let err = classify(response(200, "<body ng-app=\"loginApp\"></body>"))
            .await
            .unwrap_err();
        match err {
            FetchError::Auth { status, body, .. } => {
                assert_eq!(status, 200);
                assert!(body.contains("loginApp"));
            }
            other => panic!("expected auth failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_4xx_is_auth_failure_with_diagnostics() {
        let resp = RawResponse::from_text(403, "Forbidden", HeaderMap::new(), url(), "no session");
        match classify(resp).await.unwrap_err() {
            FetchError::Auth {
                status,
                reason,
                body,
                url,
            } => {
                assert_eq!(status, 403);
                assert_eq!(reason, "Forbidden");
                assert_eq!(body, "no session");
                assert_eq!(url, "https://portal.example/index.cfm");
            }
            other => panic!("expected auth failure, got {:?}", other),
        }
        assert!(classify(response(499, "")).await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_302_is_unexpected_redirect() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/index.cfm?event=login"));
        let resp = RawResponse::from_text(302, "Found", headers, url(), "moved");
        match classify(resp).await.unwrap_err() {
            FetchError::UnexpectedRedirect { location, body } => {
                assert_eq!(location, "/index.cfm?event=login");
                assert_eq!(body, "moved");
            }
            other => panic!("expected redirect failure, got {:?}", other),
        }

        // without a Location header the response URL is reported
        let err = classify(response(302, "")).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::UnexpectedRedirect { ref location, .. } if location == "https://portal.example/index.cfm"
        ));
        assert!(!err.is_auth());
    }

    #[tokio::test]
    async fn test_other_statuses_are_api_failures() {
        for status in [201, 301, 500, 503] {
            let err = classify(response(status, "")).await.unwrap_err();
            assert!(matches!(err, FetchError::Api { .. }), "status {}", status);
            assert_eq!(err.status(), Some(status));
        }
    }

    #[tokio::test]
    async fn test_body_read_once_on_login_page() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let body = async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("loginApp".to_string())
        }
        .boxed();
        let resp = RawResponse::new(200, "OK", HeaderMap::new(), url(), body);

        assert!(classify(resp).await.unwrap_err().is_auth());
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_body_read_failure() {
        let failing = || async { Err::<String, _>(anyhow::anyhow!("connection reset")) }.boxed();

        let resp = RawResponse::new(200, "OK", HeaderMap::new(), url(), failing());
        assert!(matches!(
            classify(resp).await.unwrap_err(),
            FetchError::Transport(_)
        ));

        let resp = RawResponse::new(401, "Unauthorized", HeaderMap::new(), url(), failing());
        match classify(resp).await.unwrap_err() {
            FetchError::Auth { body, .. } => assert!(body.is_empty()),
            other => panic!("expected auth failure, got {:?}", other),
        }
    }
}
