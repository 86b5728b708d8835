// src/fetch/transport.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::Client;
use std::fmt;
use tracing::debug;
use url::Url;

use super::request::ReportRequest;
use crate::config::PortalConfig;

/// A response as handed back by a transport, before classification.
///
/// The body is not read until [`RawResponse::text`] is called, and that
/// consumes the response, so it can only ever be read once.
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HeaderMap,
    pub url: Url,
    body: BoxFuture<'static, Result<String>>,
}

impl RawResponse {
    pub fn new(
        status: u16,
        reason: impl Into<String>,
        headers: HeaderMap,
        url: Url,
        body: BoxFuture<'static, Result<String>>,
    ) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers,
            url,
            body,
        }
    }

    /// Response whose body is already in memory.
    pub fn from_text(
        status: u16,
        reason: impl Into<String>,
        headers: HeaderMap,
        url: Url,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        Self::new(status, reason, headers, url, async move { Ok(body) }.boxed())
    }

    pub fn from_reqwest(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let body = async move { resp.text().await.context("reading response body") }.boxed();
        Self::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            url,
            body,
        )
    }

    /// Read the body. Consumes the response.
    pub async fn text(self) -> Result<String> {
        self.body.await
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

/// Anything that can execute a [`ReportRequest`]: the default reqwest client,
/// or an injected proxy. Must follow redirects on its own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: ReportRequest) -> Result<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn request(&self, request: ReportRequest) -> Result<RawResponse> {
        (**self).request(request).await
    }
}

/// Direct transport over a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, request: ReportRequest) -> Result<RawResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name {:?}", name))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for header {}", name))?;
            headers.insert(name, value);
        }
        if let Some(cookie) = request.cookie_header() {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&cookie).context("invalid cookie value")?,
            );
        }

        debug!(method = %request.method, url = %request.url, "sending request");
        let resp = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .query(&request.params)
            .send()
            .await
            .with_context(|| format!("{} {}", request.method, request.url))?;

        Ok(RawResponse::from_reqwest(resp))
    }
}
