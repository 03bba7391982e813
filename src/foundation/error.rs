use crate::arena::pool::PoolKind;

/// Convenience result type used across the crate.
pub type SpriteResult<T> = Result<T, SpriteError>;

/// Error taxonomy for arena, decoder, and runtime operations.
#[derive(thiserror::Error, Debug)]
pub enum SpriteError {
    /// No free slot is left in one of the fixed-capacity pools.
    #[error("pool exhausted: no free {pool} slot")]
    PoolExhausted {
        /// Pool that ran out of capacity.
        pool: PoolKind,
    },

    /// Container structure violates the format (magic, chunk sizes, literal fields, truncation).
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// Bitmap encoding the decoders do not understand.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Compressed bitmap data failed to inflate to the expected size.
    #[error("inflate error: {0}")]
    Inflate(String),

    /// Extension or magic bytes do not select any known decoder.
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// Handle refers to an animation that was freed or never loaded.
    #[error("stale handle: {0}")]
    StaleHandle(String),

    /// Frame or layer index beyond the counts reported by the runtime.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Destination pixel buffer does not match its declared size.
    #[error("invalid surface: {0}")]
    InvalidSurface(String),

    /// Invalid runtime configuration.
    #[error("config error: {0}")]
    Config(String),

    /// IO failure while reading a byte source.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpriteError {
    /// Build a [`SpriteError::MalformedContainer`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedContainer(msg.into())
    }

    /// Build a [`SpriteError::UnsupportedEncoding`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedEncoding(msg.into())
    }

    /// Build a [`SpriteError::Inflate`] value.
    pub fn inflate(msg: impl Into<String>) -> Self {
        Self::Inflate(msg.into())
    }

    /// Build a [`SpriteError::UnknownFormat`] value.
    pub fn unknown_format(msg: impl Into<String>) -> Self {
        Self::UnknownFormat(msg.into())
    }

    /// Build a [`SpriteError::StaleHandle`] value.
    pub fn stale(msg: impl Into<String>) -> Self {
        Self::StaleHandle(msg.into())
    }

    /// Build a [`SpriteError::OutOfRange`] value.
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    /// Build a [`SpriteError::InvalidSurface`] value.
    pub fn invalid_surface(msg: impl Into<String>) -> Self {
        Self::InvalidSurface(msg.into())
    }

    /// Build a [`SpriteError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map a read failure inside a container to [`SpriteError::MalformedContainer`].
    ///
    /// Running out of bytes mid-record means the container is truncated; every other IO error is
    /// kept as-is.
    pub(crate) fn from_read(err: std::io::Error, what: &str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::malformed(format!("truncated stream while reading {what}"))
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
