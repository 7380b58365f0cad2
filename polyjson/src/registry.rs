//! Registration of interfaces and the concrete types they decode to.
//!
//! Two ways lead to an [`InterfaceBinding`]:
//!
//! - [`InterfaceBinding::builder`] lists variants directly, each with its
//!   discriminator value and the upcast from the concrete type.
//! - [`InterfaceBinding::from_mapping`] resolves a [`TypeMapping`] (the
//!   discriminator field plus a table of discriminator value to qualified
//!   type name) against a [`TypeCatalog`] the application populated.
//!
//! Bindings are collected by a [`RegistryBuilder`] into an immutable
//! [`Registry`].

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};
use core::fmt;
use std::collections::HashMap;

use crate::{Interface, JsonError, JsonErrorKind, Result};

/// Builds a zero-value instance of one variant, already upcast to `I`.
pub type Constructor<I> = Arc<dyn Fn() -> Box<I> + Send + Sync>;

fn invalid<I: ?Sized>(reason: impl Into<String>) -> JsonError {
    JsonError::without_span(JsonErrorKind::RegistrationInvalid {
        interface: type_name::<I>(),
        reason: reason.into(),
    })
}

/// Concrete types the application makes available by qualified name.
#[derive(Default)]
pub struct TypeCatalog {
    entries: HashMap<String, CatalogEntry>,
}

struct CatalogEntry {
    type_id: TypeId,
    boxed_type_id: TypeId,
    type_name: &'static str,
    /// Interface `TypeId` to `Constructor<I>`.
    constructors: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

pub(crate) enum CatalogLookup<I: ?Sized> {
    Missing,
    NotImplemented { type_name: &'static str },
    Found(Constructor<I>),
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `T` available under `name` as an implementation of `I`.
    ///
    /// A type implementing several interfaces is registered once per
    /// interface under the same name.
    pub fn register<I, T>(&mut self, name: &str, upcast: fn(Box<T>) -> Box<I>) -> Result<&mut Self>
    where
        I: Interface + ?Sized,
        T: Default + 'static,
    {
        let entry = self
            .entries
            .entry(name.to_owned())
            .or_insert_with(|| CatalogEntry {
                type_id: TypeId::of::<T>(),
                boxed_type_id: TypeId::of::<Box<T>>(),
                type_name: type_name::<T>(),
                constructors: HashMap::new(),
            });

        if entry.type_id != TypeId::of::<T>() {
            return Err(invalid::<I>(format!(
                "qualified name `{name}` already names `{}`",
                entry.type_name
            )));
        }

        let ctor: Constructor<I> = Arc::new(move || upcast(Box::<T>::default()));
        entry.constructors.insert(TypeId::of::<I>(), Box::new(ctor));
        trace!("catalog: {name} -> {} as {}", type_name::<T>(), type_name::<I>());
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn lookup<I: Interface + ?Sized>(&self, name: &str) -> CatalogLookup<I> {
        let Some(entry) = self.entries.get(name) else {
            return CatalogLookup::Missing;
        };
        match entry
            .constructors
            .get(&TypeId::of::<I>())
            .and_then(|ctor| ctor.downcast_ref::<Constructor<I>>())
        {
            Some(ctor) => CatalogLookup::Found(Arc::clone(ctor)),
            None => CatalogLookup::NotImplemented {
                type_name: entry.type_name,
            },
        }
    }

    /// `TypeId`s of every catalogued type implementing `I`, in value and
    /// boxed form.
    pub(crate) fn implementors<I: Interface + ?Sized>(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.entries
            .values()
            .filter(|entry| entry.constructors.contains_key(&TypeId::of::<I>()))
            .flat_map(|entry| [entry.type_id, entry.boxed_type_id])
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, e)| (name, e.type_name)))
            .finish()
    }
}

/// Configuration record for one interface: which field discriminates and
/// which qualified type name each discriminator value stands for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    /// Name of the discriminator field.
    pub type_field: String,
    /// Discriminator value to qualified type name.
    pub sub_types: BTreeMap<String, String>,
}

impl TypeMapping {
    pub fn new(type_field: impl Into<String>) -> Self {
        Self {
            type_field: type_field.into(),
            sub_types: BTreeMap::new(),
        }
    }

    /// Map discriminator `value` to the catalogued type `qualified_name`.
    pub fn sub_type(mut self, value: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        self.sub_types.insert(value.into(), qualified_name.into());
        self
    }
}

/// Everything needed to decode one interface: its discriminator field and
/// a constructor per discriminator value.
pub struct InterfaceBinding<I: ?Sized> {
    interface: &'static str,
    type_field: String,
    variants: BTreeMap<String, Constructor<I>>,
}

impl<I: Interface + ?Sized> InterfaceBinding<I> {
    /// Start a binding that discriminates on `type_field`.
    pub fn builder(type_field: impl Into<String>) -> BindingBuilder<I> {
        BindingBuilder {
            type_field: type_field.into(),
            variants: BTreeMap::new(),
        }
    }

    /// Resolve `mapping` against `catalog`.
    ///
    /// Qualified names the catalog does not know are skipped. A name the
    /// catalog knows but did not register for `I` is an error, as is a
    /// mapping with no sub-types.
    pub fn from_mapping(catalog: &TypeCatalog, mapping: &TypeMapping) -> Result<Self> {
        if mapping.sub_types.is_empty() {
            return Err(invalid::<I>("no sub-types were specified"));
        }

        let mut builder = Self::builder(mapping.type_field.clone());
        for (value, qualified_name) in &mapping.sub_types {
            match catalog.lookup::<I>(qualified_name) {
                CatalogLookup::Found(ctor) => {
                    builder.variants.insert(value.clone(), ctor);
                }
                CatalogLookup::NotImplemented { type_name } => {
                    return Err(invalid::<I>(format!(
                        "type `{type_name}` (`{qualified_name}`) does not implement the interface"
                    )));
                }
                CatalogLookup::Missing => {
                    debug!(
                        "skipping `{qualified_name}` for {}: not in the type catalog",
                        type_name::<I>()
                    );
                }
            }
        }
        builder.build()
    }

    /// Qualified Rust name of the interface.
    pub fn interface_name(&self) -> &'static str {
        self.interface
    }

    /// Name of the discriminator field.
    pub fn type_field(&self) -> &str {
        &self.type_field
    }

    /// Registered discriminator values, sorted.
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// Allocate a zero-value instance of the variant named `value`.
    pub fn instantiate(&self, value: &str) -> Result<Box<I>> {
        match self.variants.get(value) {
            Some(ctor) => Ok(ctor()),
            None => Err(JsonError::without_span(JsonErrorKind::UnknownVariant {
                interface: self.interface,
                value: value.to_owned(),
            })),
        }
    }
}

impl<I: ?Sized> fmt::Debug for InterfaceBinding<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceBinding")
            .field("interface", &self.interface)
            .field("type_field", &self.type_field)
            .field("variants", &self.variants.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder returned by [`InterfaceBinding::builder`].
pub struct BindingBuilder<I: ?Sized> {
    type_field: String,
    variants: BTreeMap<String, Constructor<I>>,
}

impl<I: Interface + ?Sized> BindingBuilder<I> {
    /// Decode objects whose discriminator is `value` as `T`.
    pub fn variant<T: Default + 'static>(
        mut self,
        value: impl Into<String>,
        upcast: fn(Box<T>) -> Box<I>,
    ) -> Result<Self> {
        let value = value.into();
        if self.variants.contains_key(&value) {
            return Err(invalid::<I>(format!(
                "discriminator value '{value}' is registered twice"
            )));
        }
        let ctor: Constructor<I> = Arc::new(move || upcast(Box::<T>::default()));
        self.variants.insert(value, ctor);
        Ok(self)
    }

    pub fn build(self) -> Result<InterfaceBinding<I>> {
        if self.type_field.is_empty() {
            return Err(invalid::<I>("the discriminator field name is empty"));
        }
        if self.variants.is_empty() {
            return Err(invalid::<I>("no sub-types were specified"));
        }
        Ok(InterfaceBinding {
            interface: type_name::<I>(),
            type_field: self.type_field,
            variants: self.variants,
        })
    }
}

/// Immutable set of interface bindings, keyed by interface type.
#[derive(Default)]
pub struct Registry {
    bindings: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    names: Vec<&'static str>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The binding for `I`, if one was registered.
    pub fn lookup<I: Interface + ?Sized>(&self) -> Option<&InterfaceBinding<I>> {
        self.bindings
            .get(&TypeId::of::<I>())
            .and_then(|binding| binding.downcast_ref())
    }

    /// Names of the bound interfaces, in registration order.
    pub fn interfaces(&self) -> &[&'static str] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("interfaces", &self.names)
            .finish()
    }
}

/// Collects bindings; a failed registration is returned and nothing is
/// installed for that interface.
#[derive(Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    /// Install `binding`. Each interface may be bound once.
    pub fn bind<I: Interface + ?Sized>(mut self, binding: InterfaceBinding<I>) -> Result<Self> {
        let id = TypeId::of::<I>();
        if self.registry.bindings.contains_key(&id) {
            return Err(invalid::<I>("the interface is already bound"));
        }
        debug!(
            "binding {} on '{}' with {} variant(s)",
            binding.interface,
            binding.type_field,
            binding.variants.len()
        );
        self.registry.names.push(binding.interface);
        self.registry.bindings.insert(id, Box::new(binding));
        Ok(self)
    }

    /// Resolve `mapping` against `catalog` and install the result.
    pub fn register<I: Interface + ?Sized>(
        self,
        catalog: &TypeCatalog,
        mapping: &TypeMapping,
    ) -> Result<Self> {
        let binding = InterfaceBinding::<I>::from_mapping(catalog, mapping)?;
        self.bind(binding)
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}
