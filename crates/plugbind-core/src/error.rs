//! Error types for descriptor binding.
//!
//! Shape and marker errors are raised before the loader is touched, so they
//! never leave a library open behind them.

/// Errors returned by the binder and the handle lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// The descriptor's declared fields do not form a valid record.
    #[error("Invalid descriptor shape: {0}")]
    InvalidDescriptorShape(String),

    /// Strict binding requires a marker field to own the library handle.
    #[error("Descriptor has no marker field to hold the library handle")]
    MissingMarkerField,

    /// The declared marker does not expose a `PluginHandle`.
    #[error("Invalid marker field type: {0}")]
    InvalidMarkerFieldType(String),

    /// The descriptor is still bound to an open library.
    #[error("Descriptor is already bound to an open library")]
    AlreadyOpen,

    /// The loader could not open the library.
    #[error("Failed to open library '{path}': {reason}")]
    LibraryOpenFailure { path: String, reason: String },

    /// A mandatory symbol could not be resolved.
    #[error("Symbol not found: {name} ({reason})")]
    SymbolResolutionFailed { name: String, reason: String },

    /// Releasing the library failed.
    #[error("Failed to close library: {0}")]
    LibraryCloseFailure(String),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, BindError>;

impl BindError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptorShape(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Name of the unresolved symbol, if this is a resolution failure.
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Self::SymbolResolutionFailed { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Error raised by a [`LoaderHandle`](crate::loader::LoaderHandle) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct LoaderError(pub String);

impl LoaderError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<libloading::Error> for LoaderError {
    fn from(e: libloading::Error) -> Self {
        Self(e.to_string())
    }
}
