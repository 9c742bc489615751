//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::Arc;

use parking_lot::Mutex;
use plugbind_core::{LoaderError, LoaderHandle, NativeLibrary, RawSymbol};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Loader call recorded by [`RecordingLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    Open(String),
    Resolve(u32, String),
    Close(u32),
}

#[derive(Default)]
struct State {
    calls: Vec<LoaderCall>,
    next_id: u32,
    open: Vec<u32>,
}

/// In-memory loader over symbols of the test binary.
///
/// Every opened library gets its own id so tests can tell handles apart and
/// check that none are left open.
#[derive(Clone, Default)]
pub struct RecordingLoader {
    libraries: HashMap<String, HashMap<String, RawSymbol>>,
    state: Arc<Mutex<State>>,
    fail_close: bool,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a library at `path` exporting `symbols`.
    pub fn with_library(mut self, path: &str, symbols: &[(&str, RawSymbol)]) -> Self {
        self.libraries.insert(
            path.to_string(),
            symbols
                .iter()
                .map(|(name, symbol)| (name.to_string(), *symbol))
                .collect(),
        );
        self
    }

    /// Make every library's `close` report an error after releasing it.
    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn calls(&self) -> Vec<LoaderCall> {
        self.state.lock().calls.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, LoaderCall::Open(_)))
            .count()
    }

    pub fn close_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, LoaderCall::Close(_)))
            .count()
    }

    /// Ids of libraries opened and not yet closed.
    pub fn open_handles(&self) -> Vec<u32> {
        self.state.lock().open.clone()
    }
}

impl LoaderHandle for RecordingLoader {
    fn open(&self, path: &str) -> Result<Box<dyn NativeLibrary>, LoaderError> {
        let mut state = self.state.lock();
        state.calls.push(LoaderCall::Open(path.to_string()));

        let symbols = self
            .libraries
            .get(path)
            .cloned()
            .ok_or_else(|| LoaderError::new(format!("{}: cannot open shared object file", path)))?;

        state.next_id += 1;
        let id = state.next_id;
        state.open.push(id);

        Ok(Box::new(RecordingLibrary {
            id,
            symbols,
            state: self.state.clone(),
            fail_close: self.fail_close,
        }))
    }
}

struct RecordingLibrary {
    id: u32,
    symbols: HashMap<String, RawSymbol>,
    state: Arc<Mutex<State>>,
    fail_close: bool,
}

// SAFETY: the addresses point at functions and statics of the test binary.
unsafe impl Send for RecordingLibrary {}

impl NativeLibrary for RecordingLibrary {
    fn resolve(&self, name: &str) -> Result<RawSymbol, LoaderError> {
        self.state
            .lock()
            .calls
            .push(LoaderCall::Resolve(self.id, name.to_string()));
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| LoaderError::new(format!("undefined symbol: {}", name)))
    }

    fn close(self: Box<Self>) -> Result<(), LoaderError> {
        let mut state = self.state.lock();
        state.calls.push(LoaderCall::Close(self.id));
        state.open.retain(|id| *id != self.id);
        if self.fail_close {
            return Err(LoaderError::new("close failed"));
        }
        Ok(())
    }
}

/// Address of a function of the test binary.
pub fn fn_symbol(f: *const ()) -> RawSymbol {
    RawSymbol::new(f as *mut c_void).expect("function address is never null")
}
