//! Interface-typed values and the decoder that resolves them.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::type_name;
use core::fmt;

use crate::lookahead::locate_field;
use crate::scanner::ScanError;
use crate::slot::{ContainerSlot, Installed};
use crate::{Decode, Decoder, Encode, Encoder, JsonError, JsonErrorKind, MapSlots, Result, Span};

/// Field name reported for a [`Poly`] decoded outside any container.
pub const ROOT_FIELD: &str = "<root>";

/// Marker for trait-object types that can be bound in a
/// [`Registry`](crate::Registry).
///
/// Implement it with [`interface!`](crate::interface) for `dyn Trait`, where
/// `Trait` has `Decode + Encode` as supertraits.
pub trait Interface: Decode + Encode + 'static {}

/// Mark trait-object types as bindable interfaces.
///
/// ```
/// use polyjson::{Decode, Encode};
///
/// trait Shape: Decode + Encode {
///     fn area(&self) -> f64;
/// }
/// polyjson::interface!(dyn Shape);
/// ```
#[macro_export]
macro_rules! interface {
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::Interface for $ty {})+
    };
}

/// A slot holding a value whose static type is an interface.
///
/// Decoding a `Poly<I>` looks up the binding for `I`, picks the concrete type
/// named by the discriminator field and decodes into it. When the slot
/// already holds an instance, decoding goes straight into that instance.
pub struct Poly<I: ?Sized>(Option<Box<I>>);

impl<I: ?Sized> Poly<I> {
    pub fn new(value: Box<I>) -> Self {
        Poly(Some(value))
    }

    /// The empty slot (JSON `null`).
    pub const fn none() -> Self {
        Poly(None)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&I> {
        self.0.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut I> {
        self.0.as_deref_mut()
    }

    pub fn take(&mut self) -> Option<Box<I>> {
        self.0.take()
    }

    pub fn into_inner(self) -> Option<Box<I>> {
        self.0
    }

    pub(crate) fn place(&mut self, instance: Box<I>) -> &mut I {
        self.0.insert(instance)
    }
}

impl<I: ?Sized> Default for Poly<I> {
    fn default() -> Self {
        Poly::none()
    }
}

impl<I: ?Sized> From<Box<I>> for Poly<I> {
    fn from(value: Box<I>) -> Self {
        Poly::new(value)
    }
}

impl<I: ?Sized> From<Option<Box<I>>> for Poly<I> {
    fn from(value: Option<Box<I>>) -> Self {
        Poly(value)
    }
}

impl<I: ?Sized + fmt::Debug> fmt::Debug for Poly<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Poly").field(&value).finish(),
            None => f.write_str("Poly(None)"),
        }
    }
}

impl<I: ?Sized + PartialEq> PartialEq for Poly<I> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<I: Interface + ?Sized> Decode for Poly<I> {
    fn decode(&mut self, de: &mut Decoder<'_, '_>) -> Result<()> {
        Self::decode_field(self, ROOT_FIELD, de)
    }

    fn decode_field(slot: &mut Self, field: &'static str, de: &mut Decoder<'_, '_>) -> Result<()> {
        let slot: ContainerSlot<'_, I> = ContainerSlot::Field { value: slot, field };
        decode_interface(slot, de).map(drop)
    }

    fn decode_element(items: &mut Vec<Self>, index: usize, de: &mut Decoder<'_, '_>) -> Result<()> {
        let slot: ContainerSlot<'_, I> = ContainerSlot::Element { items, index };
        decode_interface(slot, de).map(drop)
    }

    fn decode_map_value<M>(map: &mut M, key: M::Key, de: &mut Decoder<'_, '_>) -> Result<()>
    where
        M: MapSlots<Self>,
    {
        decode_interface(ContainerSlot::MapValue { map, key }, de).map(drop)
    }
}

impl<I: Interface + ?Sized> Encode for Poly<I> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        match self.get() {
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

/// Decode the next value as an `I` into `slot`.
///
/// 1. `null` empties the slot.
/// 2. A slot that already holds an instance is decoded into directly.
/// 3. Otherwise the object is scanned ahead for the binding's discriminator
///    field, the cursor is put back at the object's start, the named variant
///    is allocated and written into the container, and only then is the
///    object decoded into it.
///
/// Returns the new instance only for [`ContainerSlot::MapKey`], which has
/// no container to hold it.
pub fn decode_interface<I, K>(
    mut slot: ContainerSlot<'_, I, K>,
    de: &mut Decoder<'_, '_>,
) -> Result<Option<Box<I>>>
where
    I: Interface + ?Sized,
{
    let Some(binding) = de.codec().registry().lookup::<I>() else {
        let span = de.peek()?.span;
        return Err(JsonError::new(
            JsonErrorKind::UnboundInterface {
                interface: type_name::<I>(),
            },
            span,
        ));
    };
    let interface = binding.interface_name();

    if de.read_null()? {
        trace!("{interface}: null into {}", slot.kind());
        slot.clear(interface)?;
        return Ok(None);
    }

    if let Some(existing) = slot.current() {
        trace!("{interface}: decoding into the existing value");
        existing.decode(de)?;
        return Ok(None);
    }

    let field = binding.type_field();
    let start = de.snapshot()?;
    let located = locate_field(de.input(), start, field);
    de.restore(start);

    let scan_failed = |err: ScanError| {
        JsonError::new(
            JsonErrorKind::DiscriminatorScan {
                interface,
                field: field.into(),
                error: err.kind,
            },
            err.span,
        )
    };

    let raw = match located {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            return Err(JsonError::new(
                JsonErrorKind::DiscriminatorMissing {
                    interface,
                    field: field.into(),
                },
                Span::new(start, 1),
            ));
        }
        Err(err) => return Err(scan_failed(err)),
    };

    let Some(value) = raw.as_str_scalar().map_err(scan_failed)? else {
        return Err(JsonError::new(
            JsonErrorKind::DiscriminatorTypeInvalid {
                interface,
                field: field.into(),
                found: raw.text(),
            },
            raw.span,
        ));
    };
    let value = value.trim_matches([' ', '"']);

    let instance = binding
        .instantiate(value)
        .map_err(|err| err.or_span(raw.span))?;
    debug!(
        "{interface}: '{field}' = '{value}', placing into {}",
        slot.kind()
    );

    match slot.install(instance, interface)? {
        Installed::Container(target) => {
            target.decode(de)?;
            Ok(None)
        }
        Installed::Detached(mut instance) => {
            instance.decode(de)?;
            Ok(Some(instance))
        }
    }
}
