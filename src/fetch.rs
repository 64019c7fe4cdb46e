//! Delta fetching: retrieve exactly the bytes appended since the cursor.

use crate::config::HttpSettings;
use crate::error::{Error, Result};
use crate::follower::Cursor;
use crate::probe::{ProbeResult, ResourceMeta, probe};
use crate::resource::Resource;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RANGE};
use std::io::{ErrorKind, SeekFrom};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Newly appended bytes plus the metadata the cursor advances to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Delta {
    pub bytes: Vec<u8>,
    /// Resolved new metadata. When the resource cannot report a length,
    /// this carries a running total so the next cycle has an offset.
    pub meta: ResourceMeta,
    /// The resource shrank since the last observation and was re-read
    /// from the start.
    pub rotated: bool,
}

/// Outcome of one delta fetch. `NoChange` and `Absent` are first-class
/// outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FetchOutcome {
    NoChange,
    Absent,
    Data(Delta),
}

/// Build the HTTP client shared by probe and fetch requests.
///
/// Invalid caller-supplied headers are a configuration error and fail
/// before polling starts.
pub(crate) fn build_client(settings: &HttpSettings) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &settings.headers {
        let name = HeaderName::try_from(name.as_str()).map_err(|_| Error::Config {
            message: format!("invalid request header name: {name}"),
        })?;
        let value = HeaderValue::try_from(value.as_str()).map_err(|_| Error::Config {
            message: format!("invalid request header value for {name}"),
        })?;
        headers.insert(name, value);
    }

    let redirect = if settings.redirect_limit == 0 {
        reqwest::redirect::Policy::none()
    } else {
        reqwest::redirect::Policy::limited(settings.redirect_limit)
    };

    let client = reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(redirect)
        .default_headers(headers)
        .build()?;

    Ok(client)
}

/// Retrieve the bytes appended since `cursor`, re-probing first so stale
/// metadata from the previous cycle is never acted on.
pub(crate) async fn fetch_delta(
    resource: &Resource,
    client: &reqwest::Client,
    cursor: &Cursor,
) -> Result<FetchOutcome> {
    let meta = match probe(resource, client).await? {
        ProbeResult::Absent => return Ok(FetchOutcome::Absent),
        ProbeResult::Present(meta) => meta,
    };

    // Identical length and identical mtime, both known, is definitely
    // unchanged. Either one alone is not trusted: timestamp granularity
    // and in-place rewrites both produce false positives.
    if meta.length.is_some()
        && meta.modified_ms.is_some()
        && meta.length == cursor.length
        && meta.modified_ms == cursor.modified_ms
    {
        return Ok(FetchOutcome::NoChange);
    }

    // A shrinking resource was truncated or replaced. Content preceding
    // the rotation is unrecoverable; start fresh from offset 0.
    let rotated =
        matches!((meta.length, cursor.length), (Some(new), Some(prev)) if new < prev);
    let previous = if rotated { 0 } else { cursor.length.unwrap_or(0) };

    match resource {
        Resource::LocalFile(path) => fetch_file_delta(path, previous, meta, rotated).await,
        Resource::Http(url) => fetch_http_delta(url, client, previous, meta, rotated).await,
    }
}

async fn fetch_file_delta(
    path: &std::path::Path,
    previous: u64,
    meta: ResourceMeta,
    rotated: bool,
) -> Result<FetchOutcome> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        // Deleted between probe and read: no data this cycle.
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(FetchOutcome::Absent),
        Err(err) => return Err(err.into()),
    };

    if previous > 0 {
        file.seek(SeekFrom::Start(previous)).await?;
    }

    let mut bytes = Vec::new();
    match meta.length {
        // Bound the read to the probed length so a file growing while we
        // read yields a stable snapshot.
        Some(length) if length > previous => {
            file.take(length - previous).read_to_end(&mut bytes).await?;
        }
        Some(_) => {}
        None => {
            file.read_to_end(&mut bytes).await?;
        }
    }

    let resolved = ResourceMeta {
        length: meta.length.or(Some(previous + bytes.len() as u64)),
        modified_ms: meta.modified_ms,
    };

    Ok(FetchOutcome::Data(Delta {
        bytes,
        meta: resolved,
        rotated,
    }))
}

async fn fetch_http_delta(
    url: &reqwest::Url,
    client: &reqwest::Client,
    previous: u64,
    meta: ResourceMeta,
    rotated: bool,
) -> Result<FetchOutcome> {
    let mut request = client.get(url.clone());
    if previous > 0 {
        request = request.header(RANGE, format!("bytes={previous}-"));
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) if err.is_connect() => return Ok(FetchOutcome::Absent),
        Err(err) => return Err(err.into()),
    };

    let status = response.status().as_u16();
    match status {
        404 => return Ok(FetchOutcome::Absent),
        // Range not satisfiable: the resource has not grown past the cursor.
        416 => return Ok(FetchOutcome::NoChange),
        _ if !response.status().is_success() => {
            return Err(Error::HttpStatus { status });
        }
        _ => {}
    }

    // A partial-content reply is already the delta. Anything else is a
    // full body; discard the first `previous` bytes so no byte is ever
    // emitted twice, even against servers without range support.
    let mut skip = if status == 206 { 0 } else { previous };
    let mut bytes = Vec::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        let chunk_len = chunk.len() as u64;
        if skip >= chunk_len {
            skip -= chunk_len;
            continue;
        }
        bytes.extend_from_slice(&chunk[skip as usize..]);
        skip = 0;
    }

    // The body can outrun the probed length when the resource grows
    // between probe and fetch. Bound the delta to the probed snapshot,
    // like the seek-based path does, so the cursor and the emitted bytes
    // stay in lockstep and the overflow is re-fetched next cycle.
    if let Some(length) = meta.length {
        bytes.truncate(length.saturating_sub(previous) as usize);
    }

    let resolved = ResourceMeta {
        length: Some(previous + bytes.len() as u64),
        modified_ms: meta.modified_ms,
    };

    Ok(FetchOutcome::Data(Delta {
        bytes,
        meta: resolved,
        rotated,
    }))
}
