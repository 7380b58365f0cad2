//! Map keys: plain string and integer keys, structured keys carried as
//! JSON text, and interface-typed keys resolved by discriminator.

use alloc::borrow::{Cow, ToOwned};
use alloc::boxed::Box;
use alloc::string::String;
use core::any::type_name;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::encoder::encode_to_string;
use crate::slot::ContainerSlot;
use crate::{
    Codec, Decode, Decoder, Encode, Encoder, Interface, JsonError, JsonErrorKind, Result,
    decode_interface,
};

/// A type usable as the key of an encoded map.
///
/// JSON object keys are always strings, so every key has a string form.
pub trait MapKey: Sized {
    /// Build a key from the object key text.
    fn decode_key(key: Cow<'_, str>, de: &mut Decoder<'_, '_>) -> Result<Self>;

    /// Write the key as a JSON string.
    fn encode_key(&self, enc: &mut Encoder<'_>) -> Result<()>;
}

impl MapKey for String {
    fn decode_key(key: Cow<'_, str>, _de: &mut Decoder<'_, '_>) -> Result<Self> {
        Ok(key.into_owned())
    }

    fn encode_key(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_str(self);
        Ok(())
    }
}

macro_rules! impl_integer_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapKey for $ty {
                fn decode_key(key: Cow<'_, str>, _de: &mut Decoder<'_, '_>) -> Result<Self> {
                    key.parse().map_err(|_| {
                        JsonError::without_span(JsonErrorKind::NumberOutOfRange {
                            value: key.into_owned(),
                            target_type: stringify!($ty),
                        })
                    })
                }

                fn encode_key(&self, enc: &mut Encoder<'_>) -> Result<()> {
                    let mut buf = itoa::Buffer::new();
                    enc.write_str(buf.format(*self));
                    Ok(())
                }
            }
        )*
    };
}

impl_integer_key!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// A concrete type used as a map key by encoding it as a JSON document
/// inside the key string.
///
/// Encoding goes through the codec's
/// [`KeyAsStringEncoder`](crate::KeyAsStringEncoder), which must list the
/// type. Decoding parses the key text as JSON.
pub trait StructuredKey: Decode + Encode + Default + 'static {}

impl<T: StructuredKey> MapKey for T {
    fn decode_key(key: Cow<'_, str>, de: &mut Decoder<'_, '_>) -> Result<Self> {
        let mut sub = de.nested(key.as_bytes());
        let value = sub.decode::<T>()?;
        sub.finish()?;
        Ok(value)
    }

    fn encode_key(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_structured_key(self)
    }
}

/// Resolve an interface-typed map key from its key text.
///
/// The key text is itself a JSON object; it is decoded through a fresh
/// cursor using the binding for `I`. The text `null` resolves to `None`.
pub fn resolve_key<I: Interface + ?Sized>(
    de: &Decoder<'_, '_>,
    key: &str,
) -> Result<Option<Box<I>>> {
    let mut sub = de.nested(key.as_bytes());
    decode_interface(ContainerSlot::<'_, I, String>::MapKey, &mut sub)
        .and_then(|instance| {
            sub.finish()?;
            Ok(instance)
        })
        .map_err(|source| key_error::<I>(key, source))
}

fn key_error<I: ?Sized>(key: &str, source: JsonError) -> JsonError {
    JsonError::without_span(JsonErrorKind::KeyDecode {
        interface: type_name::<I>(),
        key: key.to_owned(),
        source: Box::new(source),
    })
}

/// An interface-typed map key.
///
/// Trait objects have no equality or ordering of their own, so a `PolyKey`
/// compares, orders and hashes by its canonical JSON encoding, captured
/// when the key is built.
pub struct PolyKey<I: ?Sized> {
    value: Box<I>,
    canonical: String,
}

impl<I: Interface + ?Sized> PolyKey<I> {
    /// Wrap `value`, computing its canonical form with the default codec.
    pub fn new(value: Box<I>) -> Result<Self> {
        Self::with_codec(value, &Codec::default())
    }

    /// Wrap `value`, computing its canonical form with `codec`.
    pub fn with_codec(value: Box<I>, codec: &Codec) -> Result<Self> {
        let canonical = encode_to_string(codec, &*value)?;
        Ok(PolyKey { value, canonical })
    }
}

impl<I: ?Sized> PolyKey<I> {
    pub fn get(&self) -> &I {
        &self.value
    }

    pub fn into_inner(self) -> Box<I> {
        self.value
    }

    /// The JSON text this key compares by.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl<I: ?Sized> PartialEq for PolyKey<I> {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl<I: ?Sized> Eq for PolyKey<I> {}

impl<I: ?Sized> PartialOrd for PolyKey<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: ?Sized> Ord for PolyKey<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl<I: ?Sized> Hash for PolyKey<I> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl<I: ?Sized> fmt::Debug for PolyKey<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PolyKey").field(&self.canonical).finish()
    }
}

impl<I: Interface + ?Sized> Encode for PolyKey<I> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        self.value.encode(enc)
    }
}

impl<I: Interface + ?Sized> MapKey for PolyKey<I> {
    fn decode_key(key: Cow<'_, str>, de: &mut Decoder<'_, '_>) -> Result<Self> {
        match resolve_key::<I>(de, &key)? {
            Some(value) => PolyKey::with_codec(value, de.codec()),
            None => Err(key_error::<I>(
                &key,
                JsonError::without_span(JsonErrorKind::InvalidValue {
                    message: "a null map key has no value".into(),
                }),
            )),
        }
    }

    fn encode_key(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_structured_key(self)
    }
}
