// src/fetch/request.rs

use reqwest::Method;
use std::collections::BTreeMap;
use url::Url;

/// Session cookies, name → value.
pub type Cookies = BTreeMap<String, String>;

/// Ordered query parameters. Names may repeat; that is how the portal
/// receives list-valued fields.
pub type QueryParams = Vec<(String, String)>;

/// Everything a transport needs to issue one report request.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub params: QueryParams,
    pub cookies: Cookies,
}

impl ReportRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: Vec::new(),
            params: Vec::new(),
            cookies: Cookies::new(),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_cookies(mut self, cookies: Cookies) -> Self {
        self.cookies = cookies;
        self
    }

    /// Render the cookie jar as a single `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Parse a `name=value; name2=value2` string, as copied out of a browser.
/// Segments without `=` are skipped.
pub fn parse_cookie_header(raw: &str) -> Cookies {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
