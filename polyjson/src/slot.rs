//! Where a freshly resolved interface instance is written.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{JsonError, JsonErrorKind, MapSlots, Poly, Result};

/// The container location an interface-typed value is decoded into.
///
/// A slot is built by the container's decode hook, handed to
/// [`decode_interface`](crate::decode_interface) and consumed by it.
pub enum ContainerSlot<'a, I: ?Sized + 'static, K = String> {
    /// A struct field.
    Field {
        value: &'a mut Poly<I>,
        field: &'static str,
    },
    /// Element `index` of a vector; `index` may equal the current length.
    Element {
        items: &'a mut Vec<Poly<I>>,
        index: usize,
    },
    /// The value stored under `key` in a map.
    MapValue {
        map: &'a mut dyn MapSlots<Poly<I>, Key = K>,
        key: K,
    },
    /// A map key: there is no container, the caller receives the instance.
    MapKey,
}

/// Result of [`ContainerSlot::install`].
pub enum Installed<'a, I: ?Sized> {
    /// The instance now lives in the container.
    Container(&'a mut I),
    /// The slot had no container; the instance is handed back.
    Detached(Box<I>),
}

impl<'a, I: ?Sized + 'static, K> ContainerSlot<'a, I, K> {
    /// Short name of the slot kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ContainerSlot::Field { .. } => "field",
            ContainerSlot::Element { .. } => "element",
            ContainerSlot::MapValue { .. } => "map value",
            ContainerSlot::MapKey => "map key",
        }
    }

    /// The instance already stored in the slot, if any.
    pub fn current(&mut self) -> Option<&mut I> {
        match self {
            ContainerSlot::Field { value, .. } => value.get_mut(),
            ContainerSlot::Element { items, index } => {
                items.get_mut(*index).and_then(Poly::get_mut)
            }
            ContainerSlot::MapValue { map, key } => map.get_mut(key).and_then(Poly::get_mut),
            ContainerSlot::MapKey => None,
        }
    }

    /// Store an empty value in the slot (JSON `null`).
    pub fn clear(self, interface: &'static str) -> Result<()> {
        match self {
            ContainerSlot::Field { value, .. } => *value = Poly::none(),
            ContainerSlot::Element { items, index } => {
                let len = items.len();
                match items.get_mut(index) {
                    Some(item) => *item = Poly::none(),
                    None if index == len => items.push(Poly::none()),
                    None => return Err(past_end(interface, index, len)),
                }
            }
            ContainerSlot::MapValue { map, key } => {
                map.insert(key, Poly::none());
            }
            ContainerSlot::MapKey => {}
        }
        Ok(())
    }

    /// Write `instance` into the container before its contents are decoded,
    /// returning where it now lives.
    pub fn install(self, instance: Box<I>, interface: &'static str) -> Result<Installed<'a, I>> {
        match self {
            ContainerSlot::Field { value, .. } => Ok(Installed::Container(value.place(instance))),
            ContainerSlot::Element { items, index } => {
                let len = items.len();
                if index == len {
                    items.push(Poly::none());
                }
                match items.get_mut(index) {
                    Some(item) => Ok(Installed::Container(item.place(instance))),
                    None => Err(past_end(interface, index, len)),
                }
            }
            ContainerSlot::MapValue { map, key } => {
                let entry = map.insert(key, Poly::none());
                Ok(Installed::Container(entry.place(instance)))
            }
            ContainerSlot::MapKey => Ok(Installed::Detached(instance)),
        }
    }
}

fn past_end(interface: &'static str, index: usize, len: usize) -> JsonError {
    JsonError::without_span(JsonErrorKind::UnsupportedContainer {
        interface,
        detail: format!("element {index} is past the end of a vector of length {len}"),
    })
}
