//! Resource probing: cheap metadata-only checks for length and mtime.

use crate::error::{Error, Result};
use crate::resource::Resource;
use chrono::DateTime;
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use std::io::ErrorKind;
use std::time::UNIX_EPOCH;

/// Metadata snapshot of a resource: current length and modification time,
/// either of which a resource kind may be unable to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct ResourceMeta {
    pub length: Option<u64>,
    pub modified_ms: Option<i64>,
}

/// Outcome of a probe. Absence is a first-class outcome, not an error:
/// "the log file does not exist yet" is a normal starting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProbeResult {
    Present(ResourceMeta),
    Absent,
}

/// Fetch the resource's current metadata without transferring its body.
///
/// Never consumes or mutates any state; exists purely to decide cheaply
/// whether a delta fetch is warranted.
pub(crate) async fn probe(resource: &Resource, client: &reqwest::Client) -> Result<ProbeResult> {
    match resource {
        Resource::LocalFile(path) => probe_file(path).await,
        Resource::Http(url) => probe_http(url, client).await,
    }
}

async fn probe_file(path: &std::path::Path) -> Result<ProbeResult> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ProbeResult::Absent),
        Err(err) => return Err(err.into()),
    };

    let modified_ms = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_millis() as i64);

    Ok(ProbeResult::Present(ResourceMeta {
        length: Some(metadata.len()),
        modified_ms,
    }))
}

async fn probe_http(url: &reqwest::Url, client: &reqwest::Client) -> Result<ProbeResult> {
    let response = match client.head(url.clone()).send().await {
        Ok(response) => response,
        // Connection refused maps to "resource not yet existing", same as
        // a missing local file.
        Err(err) if err.is_connect() => return Ok(ProbeResult::Absent),
        Err(err) => return Err(err.into()),
    };

    let status = response.status();
    if status.as_u16() == 404 {
        return Ok(ProbeResult::Absent);
    }
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
        });
    }

    let length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let modified_ms = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_http_date_ms);

    Ok(ProbeResult::Present(ResourceMeta {
        length,
        modified_ms,
    }))
}

/// Parse an HTTP date header (RFC 2822 shape) into epoch millis.
pub(crate) fn parse_http_date_ms(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.timestamp_millis())
}
