// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://ck964.ersp.biz/index.cfm";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Where the portal lives and how to present ourselves to it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PortalConfig {
    pub base_url: Url,
    pub user_agent: String,
    /// The portal's certificate chain does not verify.
    pub accept_invalid_certs: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL should parse"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: true,
        }
    }
}

impl PortalConfig {
    /// Read a YAML config file. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))
    }

    /// Defaults, then the file named by `ERSP_CONFIG`, then
    /// `ERSP_BASE_URL` / `ERSP_USER_AGENT` overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("ERSP_CONFIG") {
            Ok(path) => {
                debug!(path = %path, "loading portal config");
                Self::load(path)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(base) = env::var("ERSP_BASE_URL") {
            config.base_url =
                Url::parse(&base).with_context(|| format!("parsing ERSP_BASE_URL {:?}", base))?;
        }
        if let Ok(agent) = env::var("ERSP_USER_AGENT") {
            config.user_agent = agent;
        }
        Ok(config)
    }

    pub fn host(&self) -> Option<&str> {
        self.base_url.host_str()
    }

    /// `Host` header value: the host, plus the port when it is not the scheme default.
    pub fn host_header(&self) -> Option<String> {
        let host = self.host()?;
        Some(match self.base_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    /// Headers sent with every report request.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(3);
        if let Some(host) = self.host_header() {
            headers.push(("Host".to_string(), host));
        }
        headers.push(("User-Agent".to_string(), self.user_agent.clone()));
        headers.push(("Accept".to_string(), "text/html".to_string()));
        headers
    }
}
