//! Encode non-primitive map keys as JSON strings holding their JSON form.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};
use std::collections::HashSet;

use crate::encoder::encode_to_string;
use crate::{Encode, Encoder, Interface, PolyKey, Result, TypeCatalog};

/// Renders a map key by encoding it as an ordinary value into a private
/// buffer and writing that text as one escaped JSON string.
///
/// An object key `{"media_type":"audio","channels":1}` becomes
/// `"{\"media_type\":\"audio\",\"channels\":1}"`. Only listed key types
/// are accepted; [`Encoder::encode_structured_key`] rejects the rest.
#[derive(Debug, Clone, Default)]
pub struct KeyAsStringEncoder {
    types: HashSet<TypeId>,
    names: Vec<&'static str>,
}

impl KeyAsStringEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept keys typed as the interface `I`, including [`PolyKey<I>`].
    pub fn interface<I: Interface + ?Sized>(mut self) -> Self {
        self.types.insert(TypeId::of::<I>());
        self.types.insert(TypeId::of::<Box<I>>());
        self.types.insert(TypeId::of::<PolyKey<I>>());
        self.names.push(type_name::<I>());
        self
    }

    /// Accept every type in `catalog` registered as an implementation of
    /// `I`, in value and boxed form.
    pub fn implementors<I: Interface + ?Sized>(mut self, catalog: &TypeCatalog) -> Self {
        self.types.extend(catalog.implementors::<I>());
        self
    }

    /// Accept the concrete type `T`, in value and boxed form.
    pub fn with_type<T: ?Sized + 'static>(mut self) -> Self {
        self.types.insert(TypeId::of::<T>());
        self.types.insert(TypeId::of::<Box<T>>());
        self.names.push(type_name::<T>());
        self
    }

    /// Whether keys of the type identified by `id` are handled.
    pub fn matches(&self, id: TypeId) -> bool {
        self.types.contains(&id)
    }

    /// Names of the interfaces and types listed explicitly.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Encode `value` through the outer encoder's codec into a private
    /// buffer, then write the result to `outer` as a JSON string.
    ///
    /// The key string always has `<`, `>` and `&` escaped, whatever the
    /// codec's `escape_html` setting.
    pub fn encode<T: Encode + ?Sized>(&self, value: &T, outer: &mut Encoder<'_>) -> Result<()> {
        let text = encode_to_string(outer.codec(), value)?;
        trace!("key as string: {text}");
        outer.write_str_html_escaped(&text);
        Ok(())
    }
}
