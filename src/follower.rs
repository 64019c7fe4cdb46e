//! The follow state machine: owns the per-resource cursor and drives one
//! probe/fetch pair per poll cycle. It never sleeps and never decides to
//! stop; terminal transitions belong to the poll loop.

use crate::error::Result;
use crate::fetch::{FetchOutcome, fetch_delta};
use crate::probe::{ProbeResult, probe};
use crate::resource::Resource;
use tracing::{debug, info, warn};

/// In-memory record of the last-known length and modification time of the
/// followed resource. Owned exclusively by one [`FollowState`]; the length
/// only ever grows across successful cycles unless a rotation resets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Cursor {
    /// Last known resource length; `None` until it can be determined.
    pub length: Option<u64>,
    /// Last known modification time in epoch millis, when available.
    pub modified_ms: Option<i64>,
}

/// What one poll cycle produced. Consumed immediately by the poll loop;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    NoChange,
    Absent,
    NewData(Vec<u8>),
    RotatedAndNewData(Vec<u8>),
}

pub(crate) struct FollowState {
    resource: Resource,
    client: reqwest::Client,
    cursor: Cursor,
}

impl FollowState {
    pub(crate) fn new(resource: Resource, client: reqwest::Client) -> Self {
        Self {
            resource,
            client,
            cursor: Cursor::default(),
        }
    }

    /// One-time cursor construction.
    ///
    /// An absent resource starts the cursor at length 0 so that a resource
    /// appearing later is emitted from its first byte. A failed initial
    /// probe is absorbed the same way: the follower is only starting up,
    /// and sustained failure is the poll loop's timeout to enforce.
    pub(crate) async fn initialize(&mut self) {
        match probe(&self.resource, &self.client).await {
            Ok(ProbeResult::Present(meta)) => {
                self.cursor = Cursor {
                    length: meta.length,
                    modified_ms: meta.modified_ms,
                };
                debug!(resource = %self.resource, length = ?meta.length, "initial probe");
            }
            Ok(ProbeResult::Absent) => {
                self.cursor = Cursor {
                    length: Some(0),
                    modified_ms: None,
                };
                debug!(resource = %self.resource, "resource absent at start, cursor at 0");
            }
            Err(err) => {
                self.cursor = Cursor {
                    length: Some(0),
                    modified_ms: None,
                };
                warn!(resource = %self.resource, error = %err, "initial probe failed");
            }
        }
    }

    /// Run one poll cycle: fetch the delta, advance the cursor, report.
    pub(crate) async fn poll_once(&mut self) -> Result<PollOutcome> {
        match fetch_delta(&self.resource, &self.client, &self.cursor).await? {
            FetchOutcome::NoChange => Ok(PollOutcome::NoChange),
            FetchOutcome::Absent => Ok(PollOutcome::Absent),
            FetchOutcome::Data(delta) => {
                self.cursor = Cursor {
                    length: delta.meta.length,
                    modified_ms: delta.meta.modified_ms,
                };

                if delta.rotated {
                    info!(
                        resource = %self.resource,
                        bytes = delta.bytes.len(),
                        "rotation detected, resumed from start"
                    );
                    Ok(PollOutcome::RotatedAndNewData(delta.bytes))
                } else if delta.bytes.is_empty() {
                    // Metadata moved but no new bytes: an idle cycle, with
                    // the cursor refreshed so the next dedup check can hit.
                    Ok(PollOutcome::NoChange)
                } else {
                    Ok(PollOutcome::NewData(delta.bytes))
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> Cursor {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio_test::assert_ok;

    fn state_for(file: &NamedTempFile) -> FollowState {
        FollowState::new(
            Resource::LocalFile(file.path().to_path_buf()),
            reqwest::Client::new(),
        )
    }

    fn append(file: &mut NamedTempFile, bytes: &[u8]) {
        file.as_file_mut().write_all(bytes).unwrap();
        file.as_file_mut().flush().unwrap();
    }

    #[tokio::test]
    async fn test_initialize_skips_existing_content() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, b"already here\n");

        let mut state = state_for(&file);
        state.initialize().await;

        assert_eq!(state.cursor().length, Some(13));

        // Nothing was appended, so the first cycle is idle.
        let outcome = assert_ok!(state.poll_once().await);
        assert_eq!(outcome, PollOutcome::NoChange);
    }

    #[tokio::test]
    async fn test_initialize_absent_resource_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.log");
        let mut state = FollowState::new(
            Resource::LocalFile(path.clone()),
            reqwest::Client::new(),
        );

        state.initialize().await;
        assert_eq!(state.cursor().length, Some(0));
        assert_eq!(state.poll_once().await.unwrap(), PollOutcome::Absent);

        // The resource appears: everything written is new data.
        std::fs::write(&path, b"first bytes").unwrap();
        assert_eq!(
            state.poll_once().await.unwrap(),
            PollOutcome::NewData(b"first bytes".to_vec())
        );
    }

    #[tokio::test]
    async fn test_growth_advances_cursor_monotonically() {
        let mut file = NamedTempFile::new().unwrap();
        let mut state = state_for(&file);
        state.initialize().await;

        append(&mut file, b"aaa");
        assert_eq!(
            state.poll_once().await.unwrap(),
            PollOutcome::NewData(b"aaa".to_vec())
        );
        assert_eq!(state.cursor().length, Some(3));

        append(&mut file, b"bbbb");
        assert_eq!(
            state.poll_once().await.unwrap(),
            PollOutcome::NewData(b"bbbb".to_vec())
        );
        assert_eq!(state.cursor().length, Some(7));
    }

    #[tokio::test]
    async fn test_rotation_resets_cursor() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, b"old old old old");

        let mut state = state_for(&file);
        state.initialize().await;
        assert_eq!(state.cursor().length, Some(15));

        // Truncate and rewrite something shorter.
        file.as_file_mut().set_len(0).unwrap();
        std::fs::write(file.path(), b"new").unwrap();

        match state.poll_once().await.unwrap() {
            PollOutcome::RotatedAndNewData(bytes) => assert_eq!(bytes, b"new"),
            other => panic!("Expected RotatedAndNewData, got {other:?}"),
        }
        assert_eq!(state.cursor().length, Some(3));
    }

    #[tokio::test]
    async fn test_deleted_resource_mid_follow_is_absent_not_error() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, b"short lived");

        let mut state = state_for(&file);
        state.initialize().await;

        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());

        let mut fresh = FollowState::new(Resource::LocalFile(path), reqwest::Client::new());
        fresh.initialize().await;
        assert_eq!(fresh.poll_once().await.unwrap(), PollOutcome::Absent);
    }

    #[tokio::test]
    async fn test_static_resource_never_moves_cursor() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, b"frozen");

        let mut state = state_for(&file);
        state.initialize().await;
        let initial = state.cursor();

        for _ in 0..5 {
            assert_eq!(state.poll_once().await.unwrap(), PollOutcome::NoChange);
            assert_eq!(state.cursor(), initial);
        }
    }
}
