// src/lib.rs

pub mod config;
pub mod extract;
pub mod fetch;
pub mod reports;

pub use config::PortalConfig;
pub use extract::{ExtractOptions, Record, TitledSection};
pub use fetch::{FetchError, RawResponse, ReportRequest, ReqwestTransport, Transport};
pub use reports::{ReportClient, ReportKind, ReportOutput};
