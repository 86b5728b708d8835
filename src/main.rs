use anyhow::{bail, Context, Result};
use ersp_reports::{
    fetch::parse_cookie_header, FetchError, PortalConfig, ReportClient, ReportKind,
};
use std::env;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn usage() -> String {
    let names: Vec<&str> = ReportKind::ALL.iter().map(|k| k.name()).collect();
    format!("usage: ersp-report <{}|all>...", names.join("|"))
}

fn parse_kinds(args: &[String]) -> Result<Vec<ReportKind>> {
    if args.is_empty() {
        bail!(usage());
    }
    let mut kinds: Vec<ReportKind> = Vec::new();
    for arg in args {
        let named = if arg == "all" {
            ReportKind::ALL.to_vec()
        } else {
            vec![arg.parse::<ReportKind>().with_context(usage)?]
        };
        for kind in named {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    Ok(kinds)
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging (stderr; stdout is the JSON) ────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) arguments, config, session ───────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();
    let kinds = parse_kinds(&args)?;

    let config = PortalConfig::from_env()?;
    let cookies = parse_cookie_header(&env::var("ERSP_COOKIES").unwrap_or_default());
    if cookies.is_empty() {
        info!("ERSP_COOKIES is empty; the portal will most likely serve its login page");
    }
    info!(base_url = %config.base_url, reports = kinds.len(), "startup");

    let client = ReportClient::from_config(config)?;

    // ─── 3) fetch concurrently ───────────────────────────────────────
    let start = Instant::now();
    let results = client.fetch_many(&kinds, &cookies).await;
    info!(elapsed = ?start.elapsed(), "fetch complete");

    // ─── 4) emit JSON, fail on the first error ───────────────────────
    let mut out = serde_json::Map::new();
    let mut failed = None;
    for (kind, result) in results {
        match result {
            Ok(output) => {
                out.insert(kind.name().to_string(), serde_json::to_value(&output)?);
            }
            Err(e) => {
                match &e {
                    FetchError::Auth { .. } => {
                        error!(report = %kind, error = %e, "session rejected; refresh ERSP_COOKIES")
                    }
                    _ => error!(report = %kind, error = %e, "report failed"),
                }
                failed.get_or_insert((kind, e));
            }
        }
    }

    if let Some((kind, e)) = failed {
        return Err(e).with_context(|| format!("fetching {} report", kind));
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
