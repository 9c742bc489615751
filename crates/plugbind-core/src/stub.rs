//! Pre-built no-op functions for callable slots left unresolved.
//!
//! Descriptors generated by [`descriptor!`](crate::descriptor!) get a stub
//! with their exact signature at compile time. Runtime descriptors
//! ([`SymbolTable`](crate::table::SymbolTable)) pick one from this table by
//! signature shape instead.

use std::ffi::c_void;

use serde::{Deserialize, Serialize};

use crate::loader::RawSymbol;

/// Signature shapes with a pre-built stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubShape {
    /// `extern "C" fn()`
    Unit,
    /// `extern "C" fn() -> i32`
    ReturnsI32,
    /// `extern "C" fn() -> i64`
    ReturnsI64,
    /// `extern "C" fn() -> *mut c_void`
    ReturnsPtr,
    /// `extern "C" fn(*mut c_void)`
    PtrArg,
    /// `extern "C" fn(*mut c_void) -> i32`
    PtrArgReturnsI32,
}

pub type UnitFn = unsafe extern "C" fn();
pub type ReturnsI32Fn = unsafe extern "C" fn() -> i32;
pub type ReturnsI64Fn = unsafe extern "C" fn() -> i64;
pub type ReturnsPtrFn = unsafe extern "C" fn() -> *mut c_void;
pub type PtrArgFn = unsafe extern "C" fn(*mut c_void);
pub type PtrArgReturnsI32Fn = unsafe extern "C" fn(*mut c_void) -> i32;

unsafe extern "C" fn nop_unit() {}

unsafe extern "C" fn nop_returns_i32() -> i32 {
    0
}

unsafe extern "C" fn nop_returns_i64() -> i64 {
    0
}

unsafe extern "C" fn nop_returns_ptr() -> *mut c_void {
    std::ptr::null_mut()
}

unsafe extern "C" fn nop_ptr_arg(_: *mut c_void) {}

unsafe extern "C" fn nop_ptr_arg_returns_i32(_: *mut c_void) -> i32 {
    0
}

impl StubShape {
    pub const ALL: [StubShape; 6] = [
        StubShape::Unit,
        StubShape::ReturnsI32,
        StubShape::ReturnsI64,
        StubShape::ReturnsPtr,
        StubShape::PtrArg,
        StubShape::PtrArgReturnsI32,
    ];

    /// Address of the no-op function for this shape.
    pub fn stub(self) -> RawSymbol {
        let addr = match self {
            StubShape::Unit => nop_unit as UnitFn as *const (),
            StubShape::ReturnsI32 => nop_returns_i32 as ReturnsI32Fn as *const (),
            StubShape::ReturnsI64 => nop_returns_i64 as ReturnsI64Fn as *const (),
            StubShape::ReturnsPtr => nop_returns_ptr as ReturnsPtrFn as *const (),
            StubShape::PtrArg => nop_ptr_arg as PtrArgFn as *const (),
            StubShape::PtrArgReturnsI32 => {
                nop_ptr_arg_returns_i32 as PtrArgReturnsI32Fn as *const ()
            }
        };
        // Function addresses are never null.
        match RawSymbol::new(addr as *mut c_void) {
            Some(symbol) => symbol,
            None => unreachable!("function address is null"),
        }
    }

    /// Whether `symbol` is this shape's stub.
    pub fn is_stub(self, symbol: RawSymbol) -> bool {
        self.stub() == symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stubs_are_distinct() {
        for (i, a) in StubShape::ALL.iter().enumerate() {
            for b in &StubShape::ALL[i + 1..] {
                assert_ne!(a.stub(), b.stub(), "{:?} and {:?} share a stub", a, b);
            }
        }
    }

    #[test]
    fn test_stubs_return_defaults() {
        unsafe {
            let unit: UnitFn = StubShape::Unit.stub().cast();
            unit();

            let i: ReturnsI32Fn = StubShape::ReturnsI32.stub().cast();
            assert_eq!(i(), 0);

            let l: ReturnsI64Fn = StubShape::ReturnsI64.stub().cast();
            assert_eq!(l(), 0);

            let p: ReturnsPtrFn = StubShape::ReturnsPtr.stub().cast();
            assert!(p().is_null());

            let mut value = 5u8;
            let arg: PtrArgFn = StubShape::PtrArg.stub().cast();
            arg(&mut value as *mut u8 as *mut c_void);
            assert_eq!(value, 5);

            let arg_i: PtrArgReturnsI32Fn = StubShape::PtrArgReturnsI32.stub().cast();
            assert_eq!(arg_i(std::ptr::null_mut()), 0);
        }
    }

    #[test]
    fn test_is_stub() {
        let stub = StubShape::Unit.stub();
        assert!(StubShape::Unit.is_stub(stub));
        assert!(!StubShape::ReturnsI32.is_stub(stub));
    }
}
