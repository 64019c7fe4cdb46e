//! Output sinks: where processed deltas end up.
//!
//! The follower core never touches process-wide streams on its own; the
//! caller picks exactly one destination at the boundary and passes it in.

use crate::error::{Error, Result};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// The single destination for a follow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// Swallow all output.
    Discard,
    /// Write to the process's standard output.
    Stdout,
    /// Write to the process's standard error.
    Stderr,
    /// Write to a named file, truncating or appending.
    File { path: PathBuf, append: bool },
}

/// Caller-facing sink selection, typically filled from flags. Exactly one
/// destination must be chosen; anything else is a configuration error
/// surfaced before polling begins.
#[derive(Debug, Clone, Default)]
pub struct SinkOptions {
    pub discard: bool,
    pub to_stdout: bool,
    pub to_stderr: bool,
    pub file: Option<PathBuf>,
    pub append: bool,
}

impl Sink {
    /// Validate a set of sink options into a single sink.
    pub fn from_options(options: &SinkOptions) -> Result<Sink> {
        let mut selected = Vec::new();
        if options.discard {
            selected.push(Sink::Discard);
        }
        if options.to_stdout {
            selected.push(Sink::Stdout);
        }
        if options.to_stderr {
            selected.push(Sink::Stderr);
        }
        if let Some(path) = &options.file {
            selected.push(Sink::File {
                path: path.clone(),
                append: options.append,
            });
        }

        match selected.len() {
            0 => Err(Error::Config {
                message: "no sink selected".to_string(),
            }),
            1 => Ok(selected.remove(0)),
            _ => Err(Error::Config {
                message: "more than one sink selected".to_string(),
            }),
        }
    }

    /// Open the sink for writing. File sinks are opened once, up front, so
    /// permission problems surface before polling begins.
    pub(crate) async fn open(&self) -> Result<SinkWriter> {
        match self {
            Sink::Discard => Ok(SinkWriter::Discard),
            Sink::Stdout => Ok(SinkWriter::Stdout(tokio::io::stdout())),
            Sink::Stderr => Ok(SinkWriter::Stderr(tokio::io::stderr())),
            Sink::File { path, append } => {
                let file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(*append)
                    .truncate(!*append)
                    .open(path)
                    .await?;
                Ok(SinkWriter::File(file))
            }
        }
    }
}

/// An opened sink, held for the lifetime of the follow run.
pub(crate) enum SinkWriter {
    Discard,
    Stdout(tokio::io::Stdout),
    Stderr(tokio::io::Stderr),
    File(tokio::fs::File),
}

impl SinkWriter {
    /// Write one processed delta, flushing so output is observable between
    /// poll cycles.
    pub(crate) async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            SinkWriter::Discard => Ok(()),
            SinkWriter::Stdout(out) => {
                out.write_all(bytes).await?;
                out.flush().await?;
                Ok(())
            }
            SinkWriter::Stderr(err) => {
                err.write_all(bytes).await?;
                err.flush().await?;
                Ok(())
            }
            SinkWriter::File(file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                Ok(())
            }
        }
    }
}
