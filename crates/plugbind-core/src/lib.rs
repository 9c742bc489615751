//! Bind the exported symbols of a native library into typed plugin descriptors.
//!
//! A descriptor declares the symbols a plugin is expected to export, one field
//! per symbol, plus a marker field that receives the opened library. The
//! plugin can be written in any language as long as it exports C-ABI symbols
//! with matching names.
//!
//! ```rust,no_run
//! use plugbind_core::descriptor;
//!
//! descriptor! {
//!     pub struct MyPlugin {
//!         plugin: PluginHandle,
//!         fn HelloWorld();
//!         fn OnlyInC();
//!     }
//! }
//!
//! # fn main() -> plugbind_core::Result<()> {
//! let mut my_plugin = MyPlugin::default();
//! plugbind_core::open(&mut my_plugin, "./plugin-c/plugin")?;
//! unsafe {
//!     (my_plugin.HelloWorld)();
//!     (my_plugin.OnlyInC)();
//! }
//! plugbind_core::close(&mut my_plugin)?;
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod handle;
pub mod loader;
pub mod macros;
pub mod slot;
pub mod stub;
pub mod table;

pub use binder::{close, open, open_with_check, BindReport, Binder};
pub use config::{BindConfig, BindPolicy};
pub use descriptor::{introspect, Descriptor, FieldEntry, FieldInfo, FieldKind, Layout};
pub use error::{BindError, LoaderError, Result};
pub use handle::{HandleState, PluginHandle};
pub use loader::{DlLoader, LoaderHandle, NativeLibrary, RawSymbol};
pub use slot::DataSlot;
pub use stub::StubShape;
pub use table::{SlotKind, SymbolTable};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::binder::{close, open, open_with_check, BindReport, Binder};
    pub use crate::config::{BindConfig, BindPolicy};
    pub use crate::descriptor::Descriptor;
    pub use crate::error::{BindError, Result};
    pub use crate::handle::PluginHandle;
    pub use crate::loader::{DlLoader, LoaderHandle};
    pub use crate::slot::DataSlot;
    pub use crate::stub::StubShape;
    pub use crate::table::SymbolTable;
}
