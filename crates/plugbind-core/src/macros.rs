//! The `descriptor!` macro.

/// Declare a plugin descriptor.
///
/// The first field is the marker and must be typed `PluginHandle`. It is
/// followed by callable slots (`fn Name(args) -> Ret;`) and then data slots
/// (`static Name: Type;`). Field names are used verbatim as symbol names.
///
/// Callables become `unsafe extern "C" fn` fields. Each one gets a statically
/// generated stub with the same signature that returns `Default::default()`,
/// so return types must implement `Default` (raw pointers do from Rust 1.88,
/// giving a null stub result). Data fields become
/// [`DataSlot`](crate::DataSlot)s.
///
/// ```rust
/// use plugbind_core::descriptor;
///
/// descriptor! {
///     pub struct Greeter {
///         plugin: PluginHandle,
///         fn HelloWorld();
///         fn Add(a: i32, b: i32) -> i32;
///         static PLUGIN_VERSION: u32;
///     }
/// }
///
/// let greeter = Greeter::default();
/// // Unbound callables are no-ops until the descriptor is opened.
/// assert_eq!(unsafe { (greeter.Add)(1, 2) }, 0);
/// assert!(!greeter.PLUGIN_VERSION.is_bound());
/// ```
#[macro_export]
macro_rules! descriptor {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $handle:ident : PluginHandle,
            $(
                fn $func:ident ( $($arg:ident : $aty:ty),* $(,)? ) $(-> $ret:ty)? ;
            )*
            $(
                static $data:ident : $dty:ty ;
            )*
        }
    ) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        $vis struct $name {
            pub $handle: $crate::PluginHandle,
            $(
                pub $func: unsafe extern "C" fn($($aty),*) $(-> $ret)?,
            )*
            $(
                pub $data: $crate::DataSlot<$dty>,
            )*
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self {
                    $handle: $crate::PluginHandle::new(),
                    $(
                        $func: {
                            unsafe extern "C" fn stub($(_: $aty),*) $(-> $ret)? {
                                ::core::default::Default::default()
                            }
                            stub
                        },
                    )*
                    $(
                        $data: $crate::DataSlot::unbound(),
                    )*
                }
            }
        }

        impl $crate::Descriptor for $name {
            fn fields(&self) -> &[$crate::FieldInfo] {
                const FIELDS: &[$crate::FieldInfo] = &[
                    $crate::FieldInfo::marker(stringify!($handle)),
                    $( $crate::FieldInfo::callable(stringify!($func)), )*
                    $( $crate::FieldInfo::data(stringify!($data)), )*
                ];
                FIELDS
            }

            fn marker_mut(&mut self) -> ::core::option::Option<&mut $crate::PluginHandle> {
                ::core::option::Option::Some(&mut self.$handle)
            }

            unsafe fn bind_slot(
                &mut self,
                index: usize,
                symbol: ::core::option::Option<$crate::RawSymbol>,
            ) {
                let mut slot = 0usize;
                $(
                    slot += 1;
                    if slot == index {
                        self.$func = match symbol {
                            ::core::option::Option::Some(symbol) => symbol.cast(),
                            ::core::option::Option::None => {
                                <Self as ::core::default::Default>::default().$func
                            }
                        };
                        return;
                    }
                )*
                $(
                    slot += 1;
                    if slot == index {
                        self.$data.set(symbol);
                        return;
                    }
                )*
                let _ = slot;
            }

            fn is_slot_bound(&self, index: usize) -> bool {
                let _fallback = <Self as ::core::default::Default>::default();
                let mut slot = 0usize;
                $(
                    slot += 1;
                    if slot == index {
                        // Address comparison against a fresh fallback. Fn pointer
                        // identity is not guaranteed across codegen units, so this
                        // only feeds reporting and never drives binding.
                        return self.$func as usize != _fallback.$func as usize;
                    }
                )*
                $(
                    slot += 1;
                    if slot == index {
                        return self.$data.is_bound();
                    }
                )*
                let _ = slot;
                false
            }
        }
    };
}
