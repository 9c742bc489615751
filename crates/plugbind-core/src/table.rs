//! Descriptors assembled at runtime.
//!
//! [`SymbolTable`] is for callers that only know the symbol list once the
//! program runs. It stores type-erased addresses and hands out typed views on
//! request. Callable fallbacks come from the [`StubShape`] table.

use crate::descriptor::{Descriptor, FieldInfo, FieldKind};
use crate::handle::PluginHandle;
use crate::loader::RawSymbol;
use crate::stub::StubShape;

/// Kind of a runtime-declared slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// A function of the given shape.
    Callable(StubShape),
    /// Exported data.
    Data,
}

#[derive(Debug)]
struct Slot {
    kind: Option<SlotKind>,
    address: Option<RawSymbol>,
}

/// Type-erased descriptor built from `(name, kind)` declarations.
#[derive(Debug)]
pub struct SymbolTable {
    fields: Vec<FieldInfo>,
    slots: Vec<Slot>,
    handle: Option<PluginHandle>,
}

impl SymbolTable {
    /// Name of the marker field of tables built with [`new`](Self::new).
    pub const MARKER: &'static str = "plugin";

    /// Table with a marker field and no symbols yet.
    pub fn new() -> Self {
        Self {
            fields: vec![FieldInfo::marker(Self::MARKER)],
            slots: vec![Slot {
                kind: None,
                address: None,
            }],
            handle: Some(PluginHandle::new()),
        }
    }

    /// Table without a marker. Only lenient binding accepts it, and the
    /// library then stays loaded for the rest of the process.
    pub fn without_marker() -> Self {
        Self {
            fields: Vec::new(),
            slots: Vec::new(),
            handle: None,
        }
    }

    /// Declare a callable slot.
    pub fn callable(mut self, name: &'static str, shape: StubShape) -> Self {
        self.fields.push(FieldInfo::callable(name));
        self.slots.push(Slot {
            kind: Some(SlotKind::Callable(shape)),
            address: Some(shape.stub()),
        });
        self
    }

    /// Declare a data slot.
    pub fn data(mut self, name: &'static str) -> Self {
        self.fields.push(FieldInfo::data(name));
        self.slots.push(Slot {
            kind: Some(SlotKind::Data),
            address: None,
        });
        self
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.kind != FieldKind::Marker && f.name == name)
    }

    pub fn kind(&self, name: &str) -> Option<SlotKind> {
        self.index_of(name).and_then(|i| self.slots[i].kind)
    }

    /// Current address of a slot: the resolved symbol, a stub, or `None` for
    /// unbound data.
    pub fn address(&self, name: &str) -> Option<RawSymbol> {
        self.index_of(name).and_then(|i| self.slots[i].address)
    }

    /// Whether `name` holds a resolved symbol.
    pub fn is_bound(&self, name: &str) -> bool {
        self.index_of(name)
            .map(|i| self.is_slot_bound(i))
            .unwrap_or(false)
    }

    /// Whether `name` is a callable currently routed to its no-op stub.
    pub fn is_stubbed(&self, name: &str) -> bool {
        match (self.kind(name), self.address(name)) {
            (Some(SlotKind::Callable(shape)), Some(address)) => shape.is_stub(address),
            _ => false,
        }
    }

    /// Typed view of a callable slot.
    ///
    /// # Safety
    /// `F` must be the function pointer type the slot's shape and the
    /// exporting library agree on.
    pub unsafe fn function<F: Copy>(&self, name: &str) -> Option<F> {
        match self.kind(name)? {
            SlotKind::Callable(_) => self.address(name).map(|a| a.cast::<F>()),
            SlotKind::Data => None,
        }
    }

    /// Address of a data slot, if bound.
    pub fn data_ptr<T>(&self, name: &str) -> Option<*mut T> {
        match self.kind(name)? {
            SlotKind::Data => self.address(name).map(|a| a.as_ptr().cast()),
            SlotKind::Callable(_) => None,
        }
    }

    pub fn handle(&self) -> Option<&PluginHandle> {
        self.handle.as_ref()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor for SymbolTable {
    fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    fn marker_mut(&mut self) -> Option<&mut PluginHandle> {
        self.handle.as_mut()
    }

    unsafe fn bind_slot(&mut self, index: usize, symbol: Option<RawSymbol>) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        slot.address = match (slot.kind, symbol) {
            (None, _) => return,
            (Some(_), Some(symbol)) => Some(symbol),
            (Some(SlotKind::Callable(shape)), None) => Some(shape.stub()),
            (Some(SlotKind::Data), None) => None,
        };
    }

    fn is_slot_bound(&self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(Slot {
                kind: Some(SlotKind::Callable(shape)),
                address: Some(address),
            }) => !shape.is_stub(*address),
            Some(Slot {
                kind: Some(SlotKind::Data),
                address,
            }) => address.is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;

    use super::*;
    use crate::descriptor::introspect;
    use crate::stub::ReturnsI32Fn;

    unsafe extern "C" fn forty_two() -> i32 {
        42
    }

    static COUNT: i64 = 9;

    fn table() -> SymbolTable {
        SymbolTable::new()
            .callable("Answer", StubShape::ReturnsI32)
            .data("Count")
    }

    #[test]
    fn test_layout() {
        let table = table();
        let layout = introspect(&table).unwrap();
        assert_eq!(layout.marker_index(), Some(0));
        let names: Vec<_> = layout.symbol_slots().map(|e| e.name).collect();
        assert_eq!(names, vec!["Answer", "Count"]);
    }

    #[test]
    fn test_initial_state() {
        let table = table();
        assert!(table.is_stubbed("Answer"));
        assert!(!table.is_bound("Answer"));
        assert!(!table.is_bound("Count"));
        assert!(table.data_ptr::<i64>("Count").is_none());
        let answer: ReturnsI32Fn = unsafe { table.function("Answer").unwrap() };
        assert_eq!(unsafe { answer() }, 0);
    }

    #[test]
    fn test_bind_and_typed_access() {
        let mut table = table();
        let answer = RawSymbol::new(forty_two as *const () as *mut c_void).unwrap();
        unsafe {
            table.bind_slot(1, Some(answer));
            table.bind_slot(2, Some(RawSymbol::from_ref(&COUNT)));
        }

        assert!(table.is_bound("Answer"));
        assert!(!table.is_stubbed("Answer"));
        let f: ReturnsI32Fn = unsafe { table.function("Answer").unwrap() };
        assert_eq!(unsafe { f() }, 42);

        let count = table.data_ptr::<i64>("Count").unwrap();
        assert_eq!(unsafe { *count }, 9);
        assert!(table.unbound_symbols().is_empty());
    }

    #[test]
    fn test_kind_mismatch_accessors() {
        let table = table();
        assert!(unsafe { table.function::<ReturnsI32Fn>("Count") }.is_none());
        assert!(table.data_ptr::<u8>("Answer").is_none());
        assert!(table.kind("plugin").is_none());
        assert!(table.kind("Nope").is_none());
    }

    #[test]
    fn test_without_marker() {
        let mut table = SymbolTable::without_marker().callable("Answer", StubShape::ReturnsI32);
        let layout = introspect(&table).unwrap();
        assert_eq!(layout.marker_index(), None);
        assert!(table.marker_mut().is_none());
    }
}
