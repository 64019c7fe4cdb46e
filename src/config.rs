//! Follow configuration, immutable for the lifetime of one follower.

use crate::error::{Error, Result};
use encoding_rs::Encoding;
use std::time::Duration;

/// Connection-level settings forwarded opaquely to the HTTP probe/fetcher.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Per-request timeout covering the whole response, nested inside the
    /// overall follow timeout.
    pub request_timeout: Duration,
    /// Maximum number of redirects to follow; 0 disables redirects.
    pub redirect_limit: usize,
    /// Extra request headers applied to every probe and fetch request.
    pub headers: Vec<(String, String)>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            headers: Vec::new(),
        }
    }
}

/// Configuration for a single follow run.
#[derive(Debug, Clone)]
pub struct FollowConfig {
    /// Time to sleep between poll cycles.
    pub poll_period: Duration,
    /// Overall follow timeout in seconds; 0 means follow forever.
    pub timeout_secs: u64,
    /// Whether reaching the timeout is an error or a silent completion.
    pub fail_on_timeout: bool,
    /// Charset label used by the pipeline adapter when a filter chain is
    /// configured; `None` means UTF-8.
    pub charset: Option<String>,
    /// HTTP connection settings.
    pub http: HttpSettings,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_millis(3000),
            timeout_secs: 300,
            fail_on_timeout: true,
            charset: None,
            http: HttpSettings::default(),
        }
    }
}

impl FollowConfig {
    /// Resolve the configured charset label to an encoding.
    ///
    /// Fails fast with [`Error::UnknownCharset`] so a bad label is caught
    /// before the poll loop starts, never mid-run.
    pub fn encoding(&self) -> Result<&'static Encoding> {
        match self.charset.as_deref() {
            None => Ok(encoding_rs::UTF_8),
            Some(label) => {
                Encoding::for_label(label.as_bytes()).ok_or_else(|| Error::UnknownCharset {
                    label: label.to_string(),
                })
            }
        }
    }

    /// The overall deadline duration, or `None` when following forever.
    pub(crate) fn deadline(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = FollowConfig::default();

        assert_eq!(config.poll_period, Duration::from_millis(3000));
        assert_eq!(config.timeout_secs, 300);
        assert!(config.fail_on_timeout);
        assert!(config.charset.is_none());
    }

    #[test]
    fn test_default_encoding_is_utf8() {
        let config = FollowConfig::default();
        assert_eq!(config.encoding().unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn test_known_charset_labels_resolve() {
        let mut config = FollowConfig::default();

        config.charset = Some("iso-8859-1".to_string());
        assert_eq!(config.encoding().unwrap(), encoding_rs::WINDOWS_1252);

        config.charset = Some("UTF-8".to_string());
        assert_eq!(config.encoding().unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn test_unknown_charset_label_fails_fast() {
        let config = FollowConfig {
            charset: Some("utf-99".to_string()),
            ..FollowConfig::default()
        };

        match config.encoding() {
            Err(Error::UnknownCharset { label }) => assert_eq!(label, "utf-99"),
            other => panic!("Expected UnknownCharset, got {:?}", other.map(|e| e.name())),
        }
    }

    #[test]
    fn test_zero_timeout_means_infinite() {
        let config = FollowConfig {
            timeout_secs: 0,
            ..FollowConfig::default()
        };
        assert!(config.deadline().is_none());

        let config = FollowConfig {
            timeout_secs: 2,
            ..FollowConfig::default()
        };
        assert_eq!(config.deadline(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_http_settings_defaults() {
        let http = HttpSettings::default();

        assert_eq!(http.connect_timeout, Duration::from_secs(10));
        assert_eq!(http.request_timeout, Duration::from_secs(30));
        assert_eq!(http.redirect_limit, 5);
        assert!(http.headers.is_empty());
    }
}
