//! Pipeline adapter: decode each delta, run the filter chain, re-encode,
//! and forward the result to the sink.

use crate::error::Result;
use crate::sink::SinkWriter;
use encoding_rs::Encoding;
use tracing::warn;

/// An opaque text transform supplied by the caller.
pub type TextFilter = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Threads fetched bytes through the caller's filter chain on the way to
/// the sink.
///
/// Each cycle's delta is an independent pass through the chain; no filter
/// state is carried between cycles. With no filters configured the adapter
/// copies bytes verbatim, so binary resources are never corrupted by an
/// assumed text encoding.
pub(crate) struct Pipeline {
    encoding: &'static Encoding,
    filters: Vec<TextFilter>,
}

impl Pipeline {
    pub(crate) fn new(encoding: &'static Encoding, filters: Vec<TextFilter>) -> Self {
        Self { encoding, filters }
    }

    /// Process one delta and write the result to `sink`.
    pub(crate) async fn process(&self, bytes: &[u8], sink: &mut SinkWriter) -> Result<()> {
        if self.filters.is_empty() {
            return sink.write(bytes).await;
        }

        let (decoded, _, had_errors) = self.encoding.decode(bytes);
        if had_errors {
            warn!(
                encoding = self.encoding.name(),
                "delta contained bytes invalid for the configured charset"
            );
        }

        let mut text = decoded.into_owned();
        for filter in &self.filters {
            text = filter(&text);
        }

        let (encoded, _, _) = self.encoding.encode(&text);
        sink.write(&encoded).await
    }
}
