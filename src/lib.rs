//! A follower for growable resources.
//!
//! This library watches a single resource, a local file or an HTTP(S)
//! endpoint, and repeatedly emits only the bytes appended since the last
//! observation. Polling is metadata-first: each cycle probes length and
//! modification time and transfers body bytes only when the resource has
//! actually grown. Rotation (the resource shrinking or being replaced),
//! transient absence, and network failure are all absorbed as idle
//! cycles; only the configurable timeout terminates the follow.
//!
//! # Example
//!
//! ```rust,no_run
//! use resource_tail::{follow, FollowConfig};
//! use tokio_stream::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut deltas = follow("build/output.log", FollowConfig::default())?;
//!
//!     while let Some(delta) = deltas.next().await {
//!         let bytes = delta?;
//!         print!("{}", String::from_utf8_lossy(&bytes));
//!     }
//!
//!     Ok(())
//! }
//! ```

// Internal modules - not part of the public API
mod config;
mod error;
mod fetch;
mod follower;
mod pipeline;
mod probe;
mod resource;
mod sink;
mod stream;

// Public API exports
pub use config::{FollowConfig, HttpSettings};
pub use error::{Error, Result};
pub use pipeline::TextFilter;
pub use resource::Resource;
pub use sink::{Sink, SinkOptions};
pub use stream::{DeltaStream, StopHandle};

use tokio_stream::StreamExt;

/// Counters for one completed follow run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowStats {
    /// Number of non-empty deltas emitted.
    pub deltas: u64,
    /// Total bytes emitted across all deltas.
    pub bytes: u64,
}

/// Start following `target` (a path or URL), returning a stream of raw
/// deltas.
///
/// Bytes already present when the follower starts are not emitted; the
/// stream carries only what is appended afterwards. The stream ends when
/// the timeout is reached (yielding [`Error::TimedOut`] first when
/// `fail_on_timeout` is set) or when it is stopped via its
/// [`StopHandle`] or dropped.
pub fn follow(target: &str, config: FollowConfig) -> Result<DeltaStream> {
    DeltaStream::new(target, config)
}

/// Follow `target` to completion, threading every delta through the given
/// filter chain into `sink`.
///
/// With an empty chain, deltas are copied to the sink byte for byte.
/// Otherwise each delta is decoded with the configured charset, passed
/// through the filters in order, re-encoded, and written. All
/// configuration problems (unknown charset, bad headers, unopenable file
/// sink) surface here, before the first poll.
pub async fn follow_to_sink(
    target: &str,
    config: FollowConfig,
    filters: Vec<TextFilter>,
    sink: &Sink,
) -> Result<FollowStats> {
    let encoding = config.encoding()?;
    let mut writer = sink.open().await?;
    let pipeline = pipeline::Pipeline::new(encoding, filters);

    let mut deltas = DeltaStream::new(target, config)?;
    let mut stats = FollowStats::default();

    while let Some(item) = deltas.next().await {
        let delta = item?;
        stats.deltas += 1;
        stats.bytes += delta.len() as u64;
        pipeline.process(&delta, &mut writer).await?;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_rejects_malformed_target() {
        assert!(follow("gopher://example.com/x", FollowConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_follow_to_sink_surfaces_config_errors_first() {
        let config = FollowConfig {
            charset: Some("bogus-charset".to_string()),
            ..FollowConfig::default()
        };

        let result = follow_to_sink("/tmp/never-read.log", config, Vec::new(), &Sink::Discard).await;
        assert!(matches!(result, Err(Error::UnknownCharset { .. })));
    }
}
