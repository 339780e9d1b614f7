/*!
Error type shared by every crate in the pipeline.

All errors are fatal: the stage that hits one propagates it up and the
pipeline tears down. Variants mirror the stage boundaries, so the
application can report where a run failed without string matching.
*/

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::StreamKind;

/** Result alias used throughout the media crates. */
pub type Result<T> = std::result::Result<T, Error>;

/** Errors produced by the media pipeline crates. */
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The input container could not be opened or probed.
    SourceOpen { path: PathBuf, reason: String },
    /// The input has no stream of the requested kind.
    StreamNotFound { kind: StreamKind },
    /// No decoder is registered for the stream's codec.
    DecoderUnavailable { codec: String },
    /// A decoder exists but could not be opened.
    DecoderOpen { reason: String },
    /// The decoder rejected a packet or failed while draining.
    Decode { reason: String },
    /// The encoder rejected a frame or failed while flushing.
    Encode { reason: String },
    /// The output container or file could not be created.
    OutputOpen { path: PathBuf, reason: String },
    /// Writing the container header, a packet, or the trailer failed.
    ContainerWrite { reason: String },
    /// A format (pixel, sample, codec) outside the supported set.
    UnsupportedFormat(String),
    /// Malformed or inconsistent data reached a stage boundary.
    InvalidData(String),
    /// An underlying I/O failure outside the container layer.
    Io(io::Error),
}

impl Error {
    pub fn source_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::SourceOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn stream_not_found(kind: StreamKind) -> Self {
        Error::StreamNotFound { kind }
    }

    pub fn decoder_unavailable(codec: impl Into<String>) -> Self {
        Error::DecoderUnavailable {
            codec: codec.into(),
        }
    }

    pub fn decoder_open(reason: impl Into<String>) -> Self {
        Error::DecoderOpen {
            reason: reason.into(),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Error::Decode {
            reason: reason.into(),
        }
    }

    pub fn encode(reason: impl Into<String>) -> Self {
        Error::Encode {
            reason: reason.into(),
        }
    }

    pub fn output_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::OutputOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn container_write(reason: impl Into<String>) -> Self {
        Error::ContainerWrite {
            reason: reason.into(),
        }
    }

    pub fn unsupported_format(reason: impl Into<String>) -> Self {
        Error::UnsupportedFormat(reason.into())
    }

    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Error::InvalidData(reason.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SourceOpen { path, reason } => {
                write!(f, "cannot open source '{}': {}", path.display(), reason)
            }
            Error::StreamNotFound { kind } => {
                write!(f, "input contains no {kind} stream")
            }
            Error::DecoderUnavailable { codec } => {
                write!(f, "no decoder available for codec {codec}")
            }
            Error::DecoderOpen { reason } => {
                write!(f, "cannot open decoder: {reason}")
            }
            Error::Decode { reason } => write!(f, "decode failed: {reason}"),
            Error::Encode { reason } => write!(f, "encode failed: {reason}"),
            Error::OutputOpen { path, reason } => {
                write!(f, "cannot open output '{}': {}", path.display(), reason)
            }
            Error::ContainerWrite { reason } => {
                write!(f, "container write failed: {reason}")
            }
            Error::UnsupportedFormat(reason) => {
                write!(f, "unsupported format: {reason}")
            }
            Error::InvalidData(reason) => write!(f, "invalid data: {reason}"),
            Error::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_source_path() {
        let err = Error::source_open("/tmp/missing.mp4", "no such file");
        let text = err.to_string();
        assert!(text.contains("/tmp/missing.mp4"));
        assert!(text.contains("no such file"));
    }

    #[test]
    fn display_names_the_missing_stream_kind() {
        let err = Error::stream_not_found(StreamKind::Audio);
        assert_eq!(err.to_string(), "input contains no audio stream");
    }

    #[test]
    fn io_errors_convert_and_chain() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
