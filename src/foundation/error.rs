/// Convenience result type used across scrollpath.
pub type ScrollPathResult<T> = Result<T, ScrollPathError>;

/// Top-level error taxonomy used by configuration-time APIs.
///
/// Per-tick operations never fail: degenerate inputs (empty scroll ranges, zero-length segments,
/// missing transforms) resolve to well-defined fallback values instead.
#[derive(thiserror::Error, Debug)]
pub enum ScrollPathError {
    /// Named easing not found in the built-in table.
    #[error("invalid easing name: \"{0}\"")]
    InvalidEasingName(String),

    /// Invalid user-provided configuration or segment data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Path data could not be compiled into a sampler.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrollPathError {
    /// Build a [`ScrollPathError::InvalidEasingName`] value.
    pub fn invalid_easing(name: impl Into<String>) -> Self {
        Self::InvalidEasingName(name.into())
    }

    /// Build a [`ScrollPathError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScrollPathError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`ScrollPathError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ScrollPathError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
