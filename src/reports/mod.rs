// src/reports/mod.rs

pub mod dates;
pub mod params;

use chrono::NaiveDate;
use futures::future::join_all;
use once_cell::sync::Lazy;
use scraper::Selector;
use serde::Serialize;
use std::{fmt, str::FromStr};
use tracing::{info, instrument, warn};

use crate::config::PortalConfig;
use crate::extract::{extract_records, extract_sections, ExtractOptions, Record, TitledSection};
use crate::fetch::{fetch_document, Cookies, FetchError, ReportRequest, ReqwestTransport, Transport};

static FUNCTION_LAYOUT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.functionLayout").expect("report table selector should parse")
});
static CALL_LOG_LISTING: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table#callLogListing").expect("call log selector should parse")
});

/// The reports this crate knows how to request and read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    ComfortKeepers,
    Activity,
    CallsClocksLog,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::ComfortKeepers,
        ReportKind::Activity,
        ReportKind::CallsClocksLog,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::ComfortKeepers => "comfort-keepers",
            ReportKind::Activity => "activity",
            ReportKind::CallsClocksLog => "calls-clocks-log",
        }
    }

    /// Marker shared by the tables holding this report's data.
    pub fn table_marker(&self) -> &'static Selector {
        match self {
            ReportKind::ComfortKeepers | ReportKind::Activity => &*FUNCTION_LAYOUT,
            ReportKind::CallsClocksLog => &*CALL_LOG_LISTING,
        }
    }

    pub fn params(&self, today: NaiveDate) -> crate::fetch::QueryParams {
        match self {
            ReportKind::ComfortKeepers => params::comfort_keepers(today),
            ReportKind::Activity => params::activity(today),
            ReportKind::CallsClocksLog => params::calls_clocks_log(today),
        }
    }

    /// Pull this report's records out of a rendered page.
    pub fn extract(&self, html: &str, options: ExtractOptions) -> ReportOutput {
        match self {
            ReportKind::Activity => {
                ReportOutput::Sections(extract_sections(html, self.table_marker(), options))
            }
            ReportKind::ComfortKeepers | ReportKind::CallsClocksLog => {
                ReportOutput::Records(self.extract_single(html, options))
            }
        }
    }

    // A page without the report table means no rows, not a failure.
    fn extract_single(&self, html: &str, options: ExtractOptions) -> Vec<Record> {
        extract_records(html, self.table_marker(), options).unwrap_or_else(|| {
            warn!(report = %self, "report table not found in page");
            Vec::new()
        })
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown report {:?}", s))
    }
}

/// What a report fetch produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportOutput {
    Records(Vec<Record>),
    Sections(Vec<TitledSection>),
}

impl ReportOutput {
    /// Number of records across all sections.
    pub fn record_count(&self) -> usize {
        match self {
            ReportOutput::Records(records) => records.len(),
            ReportOutput::Sections(sections) => sections.iter().map(|s| s.records.len()).sum(),
        }
    }
}

/// Requests reports from the portal and turns the pages into records.
/// Holds no per-fetch state; concurrent fetches share only the transport.
pub struct ReportClient<T> {
    config: PortalConfig,
    transport: T,
    options: ExtractOptions,
}

impl ReportClient<ReqwestTransport> {
    pub fn from_config(config: PortalConfig) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> ReportClient<T> {
    pub fn new(config: PortalConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn request_for(&self, kind: ReportKind, today: NaiveDate, cookies: &Cookies) -> ReportRequest {
        ReportRequest::get(self.config.base_url.clone())
            .with_headers(self.config.request_headers())
            .with_params(kind.params(today))
            .with_cookies(cookies.clone())
    }

    /// Fetch one report for today.
    pub async fn fetch(&self, kind: ReportKind, cookies: &Cookies) -> Result<ReportOutput, FetchError> {
        self.fetch_on(kind, dates::today(), cookies).await
    }

    /// Fetch one report for the given day.
    #[instrument(level = "info", skip(self, cookies), fields(report = %kind))]
    pub async fn fetch_on(
        &self,
        kind: ReportKind,
        today: NaiveDate,
        cookies: &Cookies,
    ) -> Result<ReportOutput, FetchError> {
        let body = self.fetch_body(kind, today, cookies).await?;
        let output = kind.extract(&body, self.options);
        info!(records = output.record_count(), "report extracted");
        Ok(output)
    }

    async fn fetch_body(
        &self,
        kind: ReportKind,
        today: NaiveDate,
        cookies: &Cookies,
    ) -> Result<String, FetchError> {
        let request = self.request_for(kind, today, cookies);
        fetch_document(&self.transport, request).await
    }

    async fn fetch_single(&self, kind: ReportKind, cookies: &Cookies) -> Result<Vec<Record>, FetchError> {
        let body = self.fetch_body(kind, dates::today(), cookies).await?;
        let records = kind.extract_single(&body, self.options);
        info!(report = %kind, records = records.len(), "report extracted");
        Ok(records)
    }

    pub async fn fetch_comfort_keepers(&self, cookies: &Cookies) -> Result<Vec<Record>, FetchError> {
        self.fetch_single(ReportKind::ComfortKeepers, cookies).await
    }

    pub async fn fetch_activity(&self, cookies: &Cookies) -> Result<Vec<TitledSection>, FetchError> {
        let kind = ReportKind::Activity;
        let body = self.fetch_body(kind, dates::today(), cookies).await?;
        let sections = extract_sections(&body, kind.table_marker(), self.options);
        info!(report = %kind, sections = sections.len(), "report extracted");
        Ok(sections)
    }

    pub async fn fetch_calls_clocks_log(&self, cookies: &Cookies) -> Result<Vec<Record>, FetchError> {
        self.fetch_single(ReportKind::CallsClocksLog, cookies).await
    }

    /// Fetch several reports concurrently. Results keep the order of `kinds`.
    pub async fn fetch_many(
        &self,
        kinds: &[ReportKind],
        cookies: &Cookies,
    ) -> Vec<(ReportKind, Result<ReportOutput, FetchError>)> {
        join_all(
            kinds
                .iter()
                .map(|&kind| async move { (kind, self.fetch(kind, cookies).await) }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::parse_cookie_header;
    use crate::test_support::{init_test_logging, FakeTransport};

    const ACTIVITY_PAGE: &str = r#"
        <html><body>
        <table class="functionLayout">
          <tr><td colspan="3">Doe, Jane</td></tr>
          <tr><th>Customer</th><th>Date</th><th>Hours</th></tr>
          <tr><td>Smith, Al</td><td>08/15/2024</td><td>4.00</td></tr>
          <tr><td></td><td></td><td></td></tr>
          <tr><td>Jones, Bo</td><td>08/15/2024</td></tr>
        </table>
        <table class="functionLayout">
          <tr><td colspan="3">Roe, Rick</td></tr>
          <tr><th>Customer</th><th>Date</th><th>Hours</th></tr>
        </table>
        </body></html>
    "#;

    fn client(status: u16, body: &str) -> ReportClient<FakeTransport> {
        let config = PortalConfig {
            base_url: url::Url::parse("https://portal.example/index.cfm").unwrap(),
            ..PortalConfig::default()
        };
        ReportClient::new(config, FakeTransport::new(status, body))
    }

    #[test]
    fn test_report_kind_names_round_trip() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.name().parse::<ReportKind>().unwrap(), kind);
        }
        assert!("payroll".parse::<ReportKind>().is_err());
    }

    #[test]
    fn test_request_for() {
        let client = client(200, "");
        let cookies = parse_cookie_header("CFID=9");
        let day = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        let req = client.request_for(ReportKind::CallsClocksLog, day, &cookies);

        assert_eq!(req.url.as_str(), "https://portal.example/index.cfm");
        assert_eq!(req.method, reqwest::Method::GET);
        assert!(req
            .headers
            .contains(&("Host".to_string(), "portal.example".to_string())));
        assert!(req
            .params
            .contains(&("event".to_string(), "admin.reports.telephony.callLog.runCallLog".to_string())));
        assert_eq!(req.cookie_header().as_deref(), Some("CFID=9"));
    }

    #[tokio::test]
    async fn test_fetch_activity_sections() {
        init_test_logging();
        let client = client(200, ACTIVITY_PAGE);
        let sections = client.fetch_activity(&Cookies::new()).await.unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Doe, Jane");
        assert_eq!(sections[0].records.len(), 2);
        assert_eq!(sections[0].records[1].get("Hours"), Some(""));
        assert_eq!(sections[1].title, "Roe, Rick");
        assert!(sections[1].records.is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_is_empty_not_error() {
        init_test_logging();
        let client = client(200, "<html><body><p>No results</p></body></html>");
        let records = client.fetch_calls_clocks_log(&Cookies::new()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_surfaces_auth_error() {
        init_test_logging();
        let client = client(200, r#"<div class="login-main" ng-app="loginApp" ng-cloak>"#);
        let err = client.fetch_comfort_keepers(&Cookies::new()).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_fetch_many_keeps_order() {
        init_test_logging();
        let client = client(200, ACTIVITY_PAGE);
        let kinds = [ReportKind::Activity, ReportKind::ComfortKeepers];
        let results = client.fetch_many(&kinds, &Cookies::new()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, ReportKind::Activity);
        assert!(matches!(results[0].1, Ok(ReportOutput::Sections(_))));
        // the same page read as a single table: first functionLayout table,
        // its title row acting as the header row
        match &results[1].1 {
            Ok(ReportOutput::Records(records)) => {
                assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["Doe, Jane"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(client.transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_typed_fetchers_on_unexpected_layouts() {
        init_test_logging();
        // a multi-table page read by a single-table report: first table only
        let records = client(200, ACTIVITY_PAGE)
            .fetch_comfort_keepers(&Cookies::new())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Doe, Jane"), Some("Smith, Al"));

        // no report tables at all
        let sections = client(200, "<p>No activity</p>")
            .fetch_activity(&Cookies::new())
            .await
            .unwrap();
        assert!(sections.is_empty());
    }

    #[tokio::test]
    async fn test_blank_rows_option() {
        let client = client(200, ACTIVITY_PAGE).with_options(ExtractOptions {
            include_blank_rows: true,
        });
        let sections = client.fetch_activity(&Cookies::new()).await.unwrap();
        assert_eq!(sections[0].records.len(), 3);
    }
}
