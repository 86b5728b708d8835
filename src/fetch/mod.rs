// src/fetch/mod.rs

pub mod classify;
pub mod request;
pub mod transport;

pub use classify::{classify, looks_like_login_page, FetchError};
pub use request::{parse_cookie_header, Cookies, QueryParams, ReportRequest};
pub use transport::{RawResponse, ReqwestTransport, Transport};

use tracing::{debug, instrument, warn};

/// Issue `request` through `transport` and classify what comes back.
#[instrument(level = "debug", skip(transport, request), fields(url = %request.url))]
pub async fn fetch_document<T: Transport + ?Sized>(
    transport: &T,
    request: ReportRequest,
) -> Result<String, FetchError> {
    debug!(
        method = %request.method,
        params = request.params.len(),
        "dispatching report request"
    );
    let response = transport
        .request(request)
        .await
        .map_err(FetchError::Transport)?;

    let status = response.status;
    match classify(response).await {
        Ok(body) => {
            debug!(status, bytes = body.len(), "report body received");
            Ok(body)
        }
        Err(e) => {
            warn!(status, error = %e, "report response rejected");
            Err(e)
        }
    }
}
