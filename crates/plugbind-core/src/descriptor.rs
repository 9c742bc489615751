//! Descriptor introspection.
//!
//! A descriptor is a record whose fields name the symbols a plugin is expected
//! to export. Exactly one field plays the marker role and receives the opened
//! library; every other field is a symbol slot. The marker is found by its
//! declared role, not by the name of its type.

use std::collections::HashSet;

use crate::error::{BindError, Result};
use crate::handle::PluginHandle;
use crate::loader::RawSymbol;

/// Role of a descriptor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Holds the [`PluginHandle`].
    Marker,
    /// Function pointer slot.
    Callable,
    /// Pointer to exported data.
    Data,
}

/// A declared descriptor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    /// Field name, also the exported symbol name.
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldInfo {
    pub const fn marker(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Marker,
        }
    }

    pub const fn callable(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Callable,
        }
    }

    pub const fn data(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Data,
        }
    }

    pub fn is_marker(&self) -> bool {
        self.kind == FieldKind::Marker
    }

    pub fn is_callable(&self) -> bool {
        self.kind == FieldKind::Callable
    }
}

/// A record whose fields can be bound to native symbols.
///
/// Usually implemented by [`descriptor!`](crate::descriptor!); see
/// [`SymbolTable`](crate::table::SymbolTable) for descriptors assembled at
/// runtime.
pub trait Descriptor {
    /// Declared fields, in declaration order.
    fn fields(&self) -> &[FieldInfo];

    /// The marker field's handle, if the descriptor exposes one.
    fn marker_mut(&mut self) -> Option<&mut PluginHandle>;

    /// Bind the symbol slot at `index` (an index into [`fields`](Self::fields)).
    ///
    /// `None` installs the slot's fallback: a no-op stub for callables and the
    /// unbound state for data. Marker indices are ignored.
    ///
    /// # Safety
    /// `symbol` must point to an export whose type matches the slot's declared
    /// type, and must stay valid while the slot is reachable.
    unsafe fn bind_slot(&mut self, index: usize, symbol: Option<RawSymbol>);

    /// Whether the slot at `index` holds a resolved symbol rather than its fallback.
    fn is_slot_bound(&self, index: usize) -> bool;

    /// Names of symbol slots currently holding their fallback.
    fn unbound_symbols(&self) -> Vec<&'static str> {
        self.fields()
            .iter()
            .enumerate()
            .filter(|(index, field)| !field.is_marker() && !self.is_slot_bound(*index))
            .map(|(_, field)| field.name)
            .collect()
    }
}

/// One introspected field: `(name, kind, is_marker)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldEntry {
    pub index: usize,
    pub name: &'static str,
    pub kind: FieldKind,
    pub is_marker: bool,
}

/// Validated view of a descriptor's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    entries: Vec<FieldEntry>,
    marker: Option<usize>,
}

impl Layout {
    /// All fields in declaration order.
    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    /// Fields to resolve, in declaration order.
    pub fn symbol_slots(&self) -> impl Iterator<Item = &FieldEntry> + '_ {
        self.entries.iter().filter(|e| !e.is_marker)
    }

    /// Index of the marker field.
    pub fn marker_index(&self) -> Option<usize> {
        self.marker
    }

    /// Check that `descriptor` has a marker holding a [`PluginHandle`].
    pub fn require_marker<D: Descriptor + ?Sized>(&self, descriptor: &mut D) -> Result<()> {
        let index = self.marker.ok_or(BindError::MissingMarkerField)?;
        if descriptor.marker_mut().is_none() {
            return Err(BindError::InvalidMarkerFieldType(format!(
                "field '{}' does not hold a PluginHandle",
                self.entries[index].name
            )));
        }
        Ok(())
    }
}

/// Enumerate and classify `descriptor`'s fields.
///
/// Fails with [`BindError::InvalidDescriptorShape`] when names are empty,
/// contain NUL, are duplicated, or when more than one marker is declared.
pub fn introspect<D: Descriptor + ?Sized>(descriptor: &D) -> Result<Layout> {
    let fields = descriptor.fields();
    let mut seen = HashSet::with_capacity(fields.len());
    let mut entries = Vec::with_capacity(fields.len());
    let mut marker: Option<usize> = None;

    for (index, field) in fields.iter().enumerate() {
        if field.name.is_empty() {
            return Err(BindError::shape(format!("field {} has an empty name", index)));
        }
        if field.name.contains('\0') {
            return Err(BindError::shape(format!(
                "field name {:?} contains a NUL byte",
                field.name
            )));
        }
        if !seen.insert(field.name) {
            return Err(BindError::shape(format!(
                "duplicate field '{}'",
                field.name
            )));
        }
        if field.is_marker() {
            if let Some(previous) = marker {
                return Err(BindError::shape(format!(
                    "more than one marker field ('{}' and '{}')",
                    fields[previous].name, field.name
                )));
            }
            marker = Some(index);
        }

        entries.push(FieldEntry {
            index,
            name: field.name,
            kind: field.kind,
            is_marker: field.is_marker(),
        });
    }

    Ok(Layout { entries, marker })
}
