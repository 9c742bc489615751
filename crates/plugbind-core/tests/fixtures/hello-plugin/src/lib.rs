//! Fixture plugin for the binder integration tests.
//!
//! Exports a partial implementation of the test descriptors: `HelloWorld`,
//! `OnlyInC`, `Add`, `PLUGIN_VERSION` and a call counter. `OnlyInGo` is
//! deliberately absent.

#![allow(non_snake_case)]

use std::sync::atomic::{AtomicU32, Ordering};

#[no_mangle]
pub static PLUGIN_VERSION: u32 = 3;

#[no_mangle]
pub static HELLO_CALLS: AtomicU32 = AtomicU32::new(0);

#[no_mangle]
pub extern "C" fn HelloWorld() {
    HELLO_CALLS.fetch_add(1, Ordering::SeqCst);
}

#[no_mangle]
pub extern "C" fn OnlyInC() {}

#[no_mangle]
pub extern "C" fn Add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

#[no_mangle]
pub extern "C" fn HelloCalls() -> u32 {
    HELLO_CALLS.load(Ordering::SeqCst)
}
