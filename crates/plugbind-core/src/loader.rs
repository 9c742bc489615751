//! Native loader capability.
//!
//! The binder never calls the platform loader directly. It goes through
//! [`LoaderHandle`], which opens a library and hands back a [`NativeLibrary`]
//! able to resolve symbols and to release itself. [`DlLoader`] is the default
//! implementation over `libloading`.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

use libloading::Library;

use crate::error::LoaderError;

/// A resolved, type-erased symbol address.
///
/// Only valid while the library it was resolved from remains open.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSymbol(NonNull<c_void>);

impl RawSymbol {
    /// Wrap a raw address, rejecting null.
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Wrap the address of a function or static owned by this process.
    pub fn from_ref<T>(value: &'static T) -> Self {
        Self(NonNull::from(value).cast())
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// Reinterpret the address as a pointer-sized value of type `F`.
    ///
    /// # Safety
    /// `F` must be a function pointer or raw pointer type matching what the
    /// library actually exports under this symbol.
    pub unsafe fn cast<F: Copy>(self) -> F {
        assert_eq!(
            std::mem::size_of::<F>(),
            std::mem::size_of::<*mut c_void>(),
            "symbols can only be reinterpreted as pointer-sized types"
        );
        std::mem::transmute_copy::<*mut c_void, F>(&self.0.as_ptr())
    }
}

impl fmt::Debug for RawSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSymbol({:p})", self.0.as_ptr())
    }
}

/// An opened native library.
pub trait NativeLibrary: Send {
    /// Resolve the exported symbol `name`, used verbatim.
    fn resolve(&self, name: &str) -> Result<RawSymbol, LoaderError>;

    /// Release the library. Consumes the handle so it cannot be closed twice.
    fn close(self: Box<Self>) -> Result<(), LoaderError>;
}

/// Capability for opening native libraries.
pub trait LoaderHandle {
    /// Open the library named by `path`.
    fn open(&self, path: &str) -> Result<Box<dyn NativeLibrary>, LoaderError>;
}

impl<L: LoaderHandle + ?Sized> LoaderHandle for &L {
    fn open(&self, path: &str) -> Result<Box<dyn NativeLibrary>, LoaderError> {
        (**self).open(path)
    }
}

/// Loader backed by the platform dynamic linker through `libloading`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DlLoader;

impl DlLoader {
    pub fn new() -> Self {
        Self
    }

    /// Paths tried for `path`, in order.
    ///
    /// Callers pass library paths without the platform suffix; a path that
    /// already carries it (or some other versioned name like `libc.so.6`) is
    /// still tried as given.
    pub fn candidates(path: &str) -> Vec<String> {
        let suffix = std::env::consts::DLL_SUFFIX;
        if suffix.is_empty() || path.ends_with(suffix) {
            vec![path.to_string()]
        } else {
            vec![format!("{}{}", path, suffix), path.to_string()]
        }
    }
}

impl LoaderHandle for DlLoader {
    fn open(&self, path: &str) -> Result<Box<dyn NativeLibrary>, LoaderError> {
        let mut first_error = None;

        for candidate in Self::candidates(path) {
            // SAFETY: running library initialisers is inherent to loading a plugin.
            match unsafe { Library::new(&candidate) } {
                Ok(library) => {
                    tracing::debug!(path = %candidate, "Opened native library");
                    return Ok(Box::new(DlLibrary { library }));
                }
                Err(e) => {
                    tracing::trace!(path = %candidate, error = %e, "Library candidate rejected");
                    if first_error.is_none() {
                        first_error = Some(LoaderError::from(e));
                    }
                }
            }
        }

        Err(first_error.unwrap_or_else(|| LoaderError::new(format!("no candidates for {}", path))))
    }
}

/// A library opened by [`DlLoader`].
#[derive(Debug)]
pub struct DlLibrary {
    library: Library,
}

impl NativeLibrary for DlLibrary {
    fn resolve(&self, name: &str) -> Result<RawSymbol, LoaderError> {
        if name.as_bytes().contains(&0) {
            return Err(LoaderError::new(format!(
                "symbol name contains a NUL byte: {:?}",
                name
            )));
        }

        // SAFETY: the address is only read here; interpreting it is up to the
        // descriptor that declared the slot.
        let addr = unsafe {
            let symbol = self
                .library
                .get::<*mut c_void>(name.as_bytes())
                .map_err(LoaderError::from)?;
            *symbol
        };

        RawSymbol::new(addr)
            .ok_or_else(|| LoaderError::new(format!("symbol {} resolved to null", name)))
    }

    fn close(self: Box<Self>) -> Result<(), LoaderError> {
        self.library.close().map_err(LoaderError::from)
    }
}
