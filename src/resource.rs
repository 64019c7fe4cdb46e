//! Resource handles: the tagged local-file / HTTP variant a follower tracks.

use crate::error::{Error, Result};
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;

/// The resource a follower observes, resolved once and immutable afterwards.
///
/// Local paths and `file://` URLs collapse into the same variant so the
/// probe and fetcher can treat both resource kinds uniformly except where
/// seek-based and range-based retrieval genuinely diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A local file, followed via metadata polls and seek-based reads.
    LocalFile(PathBuf),
    /// An HTTP(S) endpoint, followed via HEAD probes and range requests.
    Http(Url),
}

impl Resource {
    /// Parse a resource identifier: a plain path, a `file://` URL, or an
    /// `http(s)://` URL. Any other scheme is rejected up front.
    pub fn parse(target: &str) -> Result<Self> {
        if target.is_empty() {
            return Err(Error::InvalidResource {
                message: "empty resource identifier".to_string(),
            });
        }

        // Plain paths have no scheme separator.
        let Some((scheme, _)) = target.split_once("://") else {
            return Ok(Resource::LocalFile(PathBuf::from(target)));
        };

        match scheme {
            "http" | "https" => {
                let url = Url::parse(target).map_err(|err| Error::InvalidResource {
                    message: format!("{target}: {err}"),
                })?;
                Ok(Resource::Http(url))
            }
            "file" => {
                let url = Url::parse(target).map_err(|err| Error::InvalidResource {
                    message: format!("{target}: {err}"),
                })?;
                let path = url.to_file_path().map_err(|_| Error::InvalidResource {
                    message: format!("{target}: not a valid file URL"),
                })?;
                Ok(Resource::LocalFile(path))
            }
            other => Err(Error::InvalidResource {
                message: format!("unsupported scheme: {other}"),
            }),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::LocalFile(path) => write!(f, "{}", path.display()),
            Resource::Http(url) => write!(f, "{url}"),
        }
    }
}
