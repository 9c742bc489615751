//! Data slots.

use std::fmt;
use std::marker::PhantomData;

use crate::loader::RawSymbol;

/// A descriptor field bound to exported data of type `T`.
///
/// Unlike callables, data has no meaningful fallback, so a slot whose symbol
/// was not found stays visibly unbound instead of holding a zero value.
pub struct DataSlot<T> {
    symbol: Option<RawSymbol>,
    _marker: PhantomData<*const T>,
}

// SAFETY: the slot only stores an address; access to the pointee goes through
// `unsafe` accessors whose callers uphold the pointee's own thread-safety.
unsafe impl<T: Sync> Send for DataSlot<T> {}
unsafe impl<T: Sync> Sync for DataSlot<T> {}

impl<T> DataSlot<T> {
    pub const fn unbound() -> Self {
        Self {
            symbol: None,
            _marker: PhantomData,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.symbol.is_some()
    }

    pub fn set(&mut self, symbol: Option<RawSymbol>) {
        self.symbol = symbol;
    }

    /// Address of the exported data, if bound.
    pub fn as_ptr(&self) -> Option<*mut T> {
        self.symbol.map(|s| s.as_ptr().cast())
    }

    /// Borrow the exported data.
    ///
    /// # Safety
    /// The owning library must still be open and export a `T` under this name.
    pub unsafe fn get(&self) -> Option<&T> {
        self.as_ptr().map(|p| &*p)
    }

    /// Read a copy of the exported data.
    ///
    /// # Safety
    /// Same as [`get`](Self::get).
    pub unsafe fn read(&self) -> Option<T>
    where
        T: Copy,
    {
        self.as_ptr().map(|p| p.read())
    }
}

impl<T> Default for DataSlot<T> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<T> fmt::Debug for DataSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol {
            Some(symbol) => write!(f, "DataSlot({:p})", symbol.as_ptr()),
            None => f.write_str("DataSlot(unbound)"),
        }
    }
}
