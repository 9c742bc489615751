//! Library handle carried by a descriptor's marker field.

use std::fmt;

use crate::error::{BindError, Result};
use crate::loader::NativeLibrary;

/// Lifecycle state of a [`PluginHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Never bound to a library.
    Detached,
    /// Owns an open library.
    Open,
    /// The library has been released.
    Closed,
}

/// Marker field type owning the library a descriptor was bound against.
///
/// Starts `Detached`, becomes `Open` when binding succeeds and `Closed` after
/// the first [`close`](Self::close). Closing again is a no-op, and dropping an
/// open handle releases the library.
#[derive(Default)]
pub struct PluginHandle {
    library: Option<Box<dyn NativeLibrary>>,
    closed: bool,
}

impl PluginHandle {
    /// Create a detached handle.
    pub const fn new() -> Self {
        Self {
            library: None,
            closed: false,
        }
    }

    pub fn state(&self) -> HandleState {
        match (&self.library, self.closed) {
            (Some(_), _) => HandleState::Open,
            (None, true) => HandleState::Closed,
            (None, false) => HandleState::Detached,
        }
    }

    pub fn is_open(&self) -> bool {
        self.library.is_some()
    }

    /// Take ownership of a freshly opened library.
    ///
    /// Binders refuse descriptors that are still open before loading anything,
    /// so there is never a previous library to replace here.
    pub(crate) fn attach(&mut self, library: Box<dyn NativeLibrary>) {
        debug_assert!(self.library.is_none(), "attaching over an open library");
        self.library = Some(library);
        self.closed = false;
    }

    /// Release the library if one is open.
    ///
    /// The handle is marked closed before the loader is asked to release, so
    /// a failed close is never retried against the same resource.
    pub fn close(&mut self) -> Result<()> {
        let Some(library) = self.library.take() else {
            return Ok(());
        };
        self.closed = true;

        library
            .close()
            .map_err(|e| BindError::LibraryCloseFailure(e.to_string()))?;
        tracing::info!("Plugin library closed");
        Ok(())
    }
}

impl Drop for PluginHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close plugin library on drop: {}", e);
        }
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("state", &self.state())
            .finish()
    }
}
