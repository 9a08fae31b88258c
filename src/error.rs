use std::{fmt, io, path::PathBuf};

/// Error parsing an invalid string representation of UUID.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid string representation")
    }
}

impl std::error::Error for ParseError {}

/// Error raised by a variant marker that names none of the four variant kinds.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, thiserror::Error)]
#[error("invalid variant marker {0:#04x}")]
pub struct InvalidVariant(pub u8);

/// Errors returned by marshaling, scanning, and generator state persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID length: expected 16 bytes, got {0}")]
    Length(usize),

    #[error("unsupported source type for UUID: {0}")]
    Type(&'static str),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("generator state {operation} failed for {path:?}: {source}")]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("malformed generator state in {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("save interval must be greater than zero")]
    InvalidInterval,

    #[error("could not start the state saver thread: {0}")]
    Spawn(#[source] io::Error),
}

impl Error {
    pub(crate) fn filesystem(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Filesystem {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
