#![doc = include_str!("../README.md")]

extern crate alloc;

/// Trace-level logging macro that forwards to `tracing::trace!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

/// Trace-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Debug-level logging macro that forwards to `tracing::debug!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Debug-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[allow(unused_imports)]
pub(crate) use debug;
#[allow(unused_imports)]
pub(crate) use trace;

mod codec;
mod config;
mod decoder;
mod encoder;
mod error;
mod key;
mod key_encoder;
pub mod lookahead;
mod poly;
mod registry;
pub mod scanner;
mod slot;
mod span;

pub use codec::{Decode, Encode, MapSlots};
pub use config::{Codec, CodecBuilder, DecodeOptions, EncodeOptions};
pub use decoder::Decoder;
pub use encoder::{Encoder, ObjectWriter};
pub use error::{JsonError, JsonErrorKind, Result};
pub use key::{MapKey, PolyKey, StructuredKey, resolve_key};
pub use key_encoder::KeyAsStringEncoder;
pub use poly::{Interface, Poly, ROOT_FIELD, decode_interface};
pub use registry::{
    BindingBuilder, Constructor, InterfaceBinding, Registry, RegistryBuilder, TypeCatalog,
    TypeMapping,
};
pub use slot::{ContainerSlot, Installed};
pub use span::Span;

/// Decode a `T` from a JSON string with the default codec.
///
/// The default codec has no interface bindings; use [`Codec::from_str`] for
/// values containing [`Poly`] slots.
pub fn from_str<T: Decode + Default>(input: &str) -> Result<T> {
    Codec::default().from_str(input)
}

/// Encode `value` as a JSON string with the default codec.
pub fn to_string<T: Encode + ?Sized>(value: &T) -> Result<alloc::string::String> {
    Codec::default().to_string(value)
}

/// Implement [`Decode`] and [`Encode`] for a struct by naming the JSON key of
/// each field.
///
/// Fields are written in the listed order. Unknown keys are skipped when
/// decoding. A field followed by `[omit_empty]` is left out of the output
/// while its value reports [`Encode::is_empty`].
///
/// ```
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// polyjson::json_object!(Point { x => "x", y => "y" });
///
/// let p: Point = polyjson::from_str(r#"{"y": 2, "x": 1, "z": 3}"#).unwrap();
/// assert_eq!((p.x, p.y), (1, 2));
/// assert_eq!(polyjson::to_string(&p).unwrap(), r#"{"x":1,"y":2}"#);
/// ```
#[macro_export]
macro_rules! json_object {
    (@encode $obj:ident, $name:literal, $value:expr) => {
        $obj.field($name, $value)?
    };
    (@encode $obj:ident, $name:literal, $value:expr, omit_empty) => {
        $obj.field_omit_empty($name, $value)?
    };
    ($ty:ty { $($field:ident => $name:literal $([$opt:ident])?),* $(,)? }) => {
        impl $crate::Decode for $ty {
            fn decode(&mut self, de: &mut $crate::Decoder<'_, '_>) -> $crate::Result<()> {
                de.read_object(|de, key| match &*key {
                    $($name => de.field(&mut self.$field, $name),)*
                    _ => de.skip_value(),
                })
            }
        }

        impl $crate::Encode for $ty {
            fn encode(&self, enc: &mut $crate::Encoder<'_>) -> $crate::Result<()> {
                enc.encode_object(|obj| {
                    $($crate::json_object!(@encode obj, $name, &self.$field $(, $opt)?);)*
                    Ok(())
                })
            }
        }
    };
}
