//! The `Decode` and `Encode` traits and their implementations for std types.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::collections::btree_map;
use alloc::string::String;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};
use std::collections::HashMap;
use std::collections::hash_map;

use crate::{Decoder, Encoder, JsonError, JsonErrorKind, MapKey, Result};

/// Decode the current JSON value into an existing instance.
///
/// `decode` overwrites `self` in place. The associated hooks are called by
/// containers and decide how a value is placed into them; their defaults
/// place a value first and then decode into it. Interface-typed slots
/// override the hooks so the container itself receives the resolved
/// instance.
pub trait Decode {
    /// Decode the next value into `self`.
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()>;

    /// Decode a struct field whose storage is `slot`.
    fn decode_field(slot: &mut Self, field: &'static str, de: &mut Decoder<'_, '_>) -> Result<()>
    where
        Self: Sized,
    {
        let _ = field;
        slot.decode(de)
    }

    /// Decode array element `index` of `items`, reusing an existing element
    /// when there is one.
    fn decode_element(items: &mut Vec<Self>, index: usize, de: &mut Decoder<'_, '_>) -> Result<()>
    where
        Self: Sized + Default,
    {
        if index == items.len() {
            items.push(Self::default());
        }
        match items.get_mut(index) {
            Some(item) => item.decode(de),
            None => Err(JsonError::without_span(JsonErrorKind::InvalidValue {
                message: alloc::format!("element {index} is past the end of the array"),
            })),
        }
    }

    /// Decode the value stored under `key` in `map`.
    fn decode_map_value<M>(map: &mut M, key: M::Key, de: &mut Decoder<'_, '_>) -> Result<()>
    where
        M: MapSlots<Self>,
        Self: Sized + Default,
    {
        map.insert_with(key, Self::default).decode(de)
    }
}

/// Encode a value as JSON.
pub trait Encode {
    /// Write `self` to `enc`.
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()>;

    /// Whether an `omit_empty` field holding this value is skipped.
    fn is_empty(&self) -> bool {
        false
    }
}

/// Mutable access to the entries of a map, used to place decoded values.
pub trait MapSlots<V> {
    type Key;

    /// The value under `key`, if present.
    fn get_mut(&mut self, key: &Self::Key) -> Option<&mut V>;

    /// Store `value` under `key`, replacing any previous value.
    fn insert(&mut self, key: Self::Key, value: V) -> &mut V;

    /// The value under `key`, inserting `make()` first when absent.
    fn insert_with(&mut self, key: Self::Key, make: fn() -> V) -> &mut V;
}

impl<K: Ord, V> MapSlots<V> for BTreeMap<K, V> {
    type Key = K;

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        BTreeMap::get_mut(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> &mut V {
        match self.entry(key) {
            btree_map::Entry::Occupied(mut entry) => {
                entry.insert(value);
                entry.into_mut()
            }
            btree_map::Entry::Vacant(entry) => entry.insert(value),
        }
    }

    fn insert_with(&mut self, key: K, make: fn() -> V) -> &mut V {
        self.entry(key).or_insert_with(make)
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> MapSlots<V> for HashMap<K, V, S> {
    type Key = K;

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        HashMap::get_mut(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> &mut V {
        match self.entry(key) {
            hash_map::Entry::Occupied(mut entry) => {
                entry.insert(value);
                entry.into_mut()
            }
            hash_map::Entry::Vacant(entry) => entry.insert(value),
        }
    }

    fn insert_with(&mut self, key: K, make: fn() -> V) -> &mut V {
        self.entry(key).or_insert_with(make)
    }
}

impl Decode for bool {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        *self = de.read_bool()?;
        Ok(())
    }
}

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_bool(*self);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        !*self
    }
}

macro_rules! impl_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
                    *self = de.read_number(stringify!($ty))?;
                    Ok(())
                }
            }

            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
                    enc.write_integer(*self);
                    Ok(())
                }

                fn is_empty(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

impl_integer!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Decode for f64 {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        *self = de.read_number("f64")?;
        Ok(())
    }
}

impl Encode for f64 {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_f64(*self)
    }

    fn is_empty(&self) -> bool {
        *self == 0.0
    }
}

impl Decode for f32 {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        *self = de.read_number("f32")?;
        Ok(())
    }
}

impl Encode for f32 {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_f32(*self)
    }

    fn is_empty(&self) -> bool {
        *self == 0.0
    }
}

impl Decode for String {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        *self = de.read_str()?.into_owned();
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_str(self);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.write_str(self);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        if de.read_null()? {
            *self = None;
            return Ok(());
        }
        match self {
            Some(value) => value.decode(de),
            None => self.insert(T::default()).decode(de),
        }
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        match self {
            Some(value) => value.encode(enc),
            None => {
                enc.write_null();
                Ok(())
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.is_none()
    }
}

impl<T: Decode + ?Sized> Decode for Box<T> {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        (**self).decode(de)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        (**self).encode(enc)
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        if de.read_null()? {
            self.clear();
            return Ok(());
        }
        let len = de.read_array(|de, index| T::decode_element(self, index, de))?;
        self.truncate(len);
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_array(self.iter())
    }

    fn is_empty(&self) -> bool {
        <[T]>::is_empty(self)
    }
}

impl<K: MapKey + Ord, V: Decode + Default> Decode for BTreeMap<K, V> {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        if de.read_null()? {
            self.clear();
            return Ok(());
        }
        de.read_object(|de, key| {
            let key = K::decode_key(key, de)?;
            V::decode_map_value(self, key, de)
        })
    }
}

impl<K: MapKey, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_map(self.iter())
    }

    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Decode + Default,
    S: BuildHasher,
{
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        if de.read_null()? {
            self.clear();
            return Ok(());
        }
        de.read_object(|de, key| {
            let key = K::decode_key(key, de)?;
            V::decode_map_value(self, key, de)
        })
    }
}

impl<K: MapKey, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_map(self.iter())
    }

    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}
