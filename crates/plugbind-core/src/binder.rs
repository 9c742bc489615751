//! Symbol binder.
//!
//! Fills a descriptor's symbol slots from an opened library under one of two
//! policies:
//!
//! - lenient ([`Binder::open`]): a missing callable becomes a no-op stub and a
//!   missing data symbol stays unbound. Only shape errors and a library that
//!   cannot be opened fail the call.
//! - strict ([`Binder::open_with_check`]): every symbol is mandatory. The first
//!   missing one resets the slots, closes the library and fails the call.
//!
//! On success the library is handed to the descriptor's marker field, which
//! owns it until [`close`] (or drop).

use scopeguard::ScopeGuard;

use crate::config::{BindConfig, BindPolicy};
use crate::descriptor::{introspect, Descriptor, FieldKind, Layout};
use crate::error::{BindError, Result};
use crate::loader::{DlLoader, LoaderHandle, NativeLibrary};

/// What a binding pass did with each symbol slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    /// Slots bound to a resolved symbol.
    pub bound: Vec<&'static str>,
    /// Callables routed to their no-op stub.
    pub stubbed: Vec<&'static str>,
    /// Data slots left unbound.
    pub unbound: Vec<&'static str>,
}

impl BindReport {
    /// Whether every declared symbol was found.
    pub fn is_complete(&self) -> bool {
        self.stubbed.is_empty() && self.unbound.is_empty()
    }
}

/// Binds descriptors against libraries opened through a [`LoaderHandle`].
#[derive(Debug, Clone, Default)]
pub struct Binder<L = DlLoader> {
    loader: L,
}

impl Binder<DlLoader> {
    /// Binder over the platform dynamic linker.
    pub fn new() -> Self {
        Self { loader: DlLoader }
    }
}

impl<L: LoaderHandle> Binder<L> {
    /// Binder over a custom loader.
    pub fn with_loader(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Bind leniently. Missing symbols never fail the call.
    pub fn open<D: Descriptor + ?Sized>(&self, descriptor: &mut D, path: &str) -> Result<()> {
        self.open_lenient(descriptor, path).map(|_| ())
    }

    /// Bind leniently and report which symbols fell back.
    pub fn open_with_report<D: Descriptor + ?Sized>(
        &self,
        descriptor: &mut D,
        path: &str,
    ) -> Result<BindReport> {
        self.open_lenient(descriptor, path)
    }

    /// Bind strictly. Any missing symbol fails the call and releases the library.
    pub fn open_with_check<D: Descriptor + ?Sized>(
        &self,
        descriptor: &mut D,
        path: &str,
    ) -> Result<()> {
        self.open_strict(descriptor, path).map(|_| ())
    }

    /// Bind under `policy`.
    pub fn open_with_policy<D: Descriptor + ?Sized>(
        &self,
        descriptor: &mut D,
        path: &str,
        policy: BindPolicy,
    ) -> Result<BindReport> {
        match policy {
            BindPolicy::Lenient => self.open_lenient(descriptor, path),
            BindPolicy::Strict => self.open_strict(descriptor, path),
        }
    }

    /// Bind under the policy carried by `config`.
    pub fn open_with_config<D: Descriptor + ?Sized>(
        &self,
        descriptor: &mut D,
        path: &str,
        config: &BindConfig,
    ) -> Result<BindReport> {
        self.open_with_policy(descriptor, path, config.policy)
    }

    /// Release the descriptor's library. See [`close`].
    pub fn close<D: Descriptor + ?Sized>(&self, descriptor: &mut D) -> Result<()> {
        close(descriptor)
    }

    fn open_lenient<D: Descriptor + ?Sized>(
        &self,
        descriptor: &mut D,
        path: &str,
    ) -> Result<BindReport> {
        let layout = introspect(descriptor)?;
        ensure_not_open(descriptor)?;

        let library = self.open_library(path)?;
        let mut report = BindReport::default();

        for entry in layout.symbol_slots() {
            match library.resolve(entry.name) {
                Ok(symbol) => {
                    // SAFETY: the slot's declared type is the caller's contract
                    // with the plugin; the library stays open in the marker.
                    unsafe { descriptor.bind_slot(entry.index, Some(symbol)) };
                    report.bound.push(entry.name);
                }
                Err(e) => {
                    tracing::debug!("Symbol {} not found in {}, using fallback: {}", entry.name, path, e);
                    // SAFETY: fallbacks are generated for the slot's own type.
                    unsafe { descriptor.bind_slot(entry.index, None) };
                    if entry.kind == FieldKind::Callable {
                        report.stubbed.push(entry.name);
                    } else {
                        report.unbound.push(entry.name);
                    }
                }
            }
        }

        match descriptor.marker_mut() {
            Some(handle) => handle.attach(library),
            None => {
                tracing::warn!(
                    "Descriptor has no marker field; {} stays loaded for the life of the process",
                    path
                );
                std::mem::forget(library);
            }
        }

        tracing::info!(
            "Bound {} ({} bound, {} stubbed, {} unbound)",
            path,
            report.bound.len(),
            report.stubbed.len(),
            report.unbound.len()
        );
        Ok(report)
    }

    fn open_strict<D: Descriptor + ?Sized>(
        &self,
        descriptor: &mut D,
        path: &str,
    ) -> Result<BindReport> {
        let layout = introspect(descriptor)?;
        layout.require_marker(descriptor)?;
        ensure_not_open(descriptor)?;

        let library = scopeguard::guard(self.open_library(path)?, |library| {
            if let Err(e) = library.close() {
                tracing::warn!("Failed to close {} during rollback: {}", path, e);
            }
        });
        let mut report = BindReport::default();

        for entry in layout.symbol_slots() {
            match library.resolve(entry.name) {
                Ok(symbol) => {
                    // SAFETY: see `open_lenient`.
                    unsafe { descriptor.bind_slot(entry.index, Some(symbol)) };
                    report.bound.push(entry.name);
                }
                Err(e) => {
                    tracing::warn!("Required symbol {} missing from {}: {}", entry.name, path, e);
                    reset_slots(descriptor, &layout);
                    // Dropping the guard closes the library.
                    return Err(BindError::SymbolResolutionFailed {
                        name: entry.name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let Some(handle) = descriptor.marker_mut() else {
            reset_slots(descriptor, &layout);
            return Err(BindError::MissingMarkerField);
        };
        handle.attach(ScopeGuard::into_inner(library));

        tracing::info!("Bound {} ({} symbols)", path, report.bound.len());
        Ok(report)
    }

    fn open_library(&self, path: &str) -> Result<Box<dyn NativeLibrary>> {
        self.loader
            .open(path)
            .map_err(|e| BindError::LibraryOpenFailure {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }
}

fn ensure_not_open<D: Descriptor + ?Sized>(descriptor: &mut D) -> Result<()> {
    match descriptor.marker_mut() {
        Some(handle) if handle.is_open() => Err(BindError::AlreadyOpen),
        _ => Ok(()),
    }
}

fn reset_slots<D: Descriptor + ?Sized>(descriptor: &mut D, layout: &Layout) {
    for entry in layout.symbol_slots() {
        // SAFETY: fallbacks are generated for the slot's own type.
        unsafe { descriptor.bind_slot(entry.index, None) };
    }
}

/// Bind `descriptor` leniently against the library at `path`.
pub fn open<D: Descriptor + ?Sized>(descriptor: &mut D, path: &str) -> Result<()> {
    Binder::new().open(descriptor, path)
}

/// Bind `descriptor` strictly against the library at `path`.
pub fn open_with_check<D: Descriptor + ?Sized>(descriptor: &mut D, path: &str) -> Result<()> {
    Binder::new().open_with_check(descriptor, path)
}

/// Release the library held by `descriptor`'s marker.
///
/// A no-op when nothing is open, so calling it twice is safe. After release
/// every symbol slot is reset to its fallback, leaving no callable that points
/// into the unloaded library.
pub fn close<D: Descriptor + ?Sized>(descriptor: &mut D) -> Result<()> {
    let Some(handle) = descriptor.marker_mut() else {
        return Ok(());
    };
    if !handle.is_open() {
        return Ok(());
    }

    let result = handle.close();

    let slots: Vec<usize> = descriptor
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.is_marker())
        .map(|(index, _)| index)
        .collect();
    for index in slots {
        // SAFETY: fallbacks are generated for the slot's own type.
        unsafe { descriptor.bind_slot(index, None) };
    }

    result
}
