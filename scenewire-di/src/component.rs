//! The annotation model. Types take part in injection by registering a
//! [TypeDescriptor](crate::component_registry::TypeDescriptor), which tells the container three
//! things: whether instances are *globally injectable* (and under which target types), whether
//! they are *receivers* with [Inject] fields, and how to default-construct them.
//!
//! ## Registering types
//!
//! With the `derive` feature, descriptors are generated and registered automatically:
//!
//! ```
//! use scenewire_di::component::Inject;
//! use scenewire_di::{injectable, Injectable};
//!
//! #[injectable]
//! trait Audio {}
//!
//! #[derive(Injectable, Default)]
//! #[scenewire(default, global = [dyn Audio, Mixer], persistent)]
//! struct Mixer;
//!
//! impl Audio for Mixer {}
//!
//! #[derive(Injectable, Default)]
//! #[scenewire(component, default)]
//! struct Transform;
//!
//! #[derive(Injectable, Default)]
//! #[scenewire(component, receiver, default)]
//! struct Player {
//!     // resolved from the registry, a prototype, a creation rule or default construction
//!     #[inject]
//!     audio: Inject<dyn Audio>,
//!     // nearest `Transform` from this node up to the root
//!     #[inject(up_in_hierarchy)]
//!     transform: Inject<Transform>,
//! }
//! ```
//!
//! ### Supported `#[scenewire]` type configuration
//!
//! * `component` - instances live on scene nodes; such types can be found by hierarchy strategies
//! and added to nodes as fallback, but cannot be created by `Unique` injection
//! * `receiver` - scan fields marked with `#[inject]` when injecting
//! * `default` - default-construct with `Default::default()`
//! * `constructor = "path"` - default-construct by calling `path()`
//! * `global` - register instances under their own type
//! * `global = [Type, ...]` - register instances under the given target types
//! * `persistent` - register into the persistent partition, which survives scene clears
//!
//! ### Supported `#[inject]` field configuration
//!
//! * none or `global` - [InjectionStrategy::Global]
//! * `unique` - [InjectionStrategy::Unique]
//! * `down_in_hierarchy` - [InjectionStrategy::DownInHierarchy]
//! * `up_in_hierarchy` - [InjectionStrategy::UpInHierarchy]
//! * `base` - the field is an embedded base receiver, whose own fields are injected after the
//! fields of the current type
//!
//! ## Registering aliases
//!
//! Aliases let a concrete type be viewed as a `dyn Trait`, which is needed by creation rules and
//! for finding components by trait in the hierarchy. Global targets can always be viewed this way;
//! other traits need `#[injectable_alias]` on the implementation, after marking the trait itself
//! with `#[injectable]`:
//!
//! ```
//! use scenewire_di::rules::CreationRule;
//! use scenewire_di::{injectable, injectable_alias, Injectable};
//!
//! #[injectable]
//! trait Clock {}
//!
//! #[derive(Injectable, Default)]
//! #[scenewire(default)]
//! struct SystemClock;
//!
//! #[injectable_alias]
//! impl Clock for SystemClock {}
//!
//! let rule = CreationRule::new::<dyn Clock, SystemClock>();
//! ```

use crate::instance_provider::{InstanceAnyPtr, InstancePtr};
use serde::Deserialize;
use std::any::Any;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};

/// Marker trait for types which can be injected - concrete types and `dyn Trait` aliases.
pub trait Injectable: 'static {}

/// Helper trait for traits implemented by concrete injectable types, allowing to view an erased
/// instance of the concrete type `C` as `Self`. Typically generated by `#[injectable_alias]`.
pub trait ComponentDowncast<C: Injectable>: Injectable {
    fn downcast(source: InstanceAnyPtr) -> Result<InstancePtr<Self>, InstanceAnyPtr>;
}

/// How a field marked for injection should be resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionStrategy {
    /// Shared instance from the registry, or created on first use.
    Global,
    /// A fresh instance for every injected field.
    Unique,
    /// Component on the receiver's node or any of its descendants.
    DownInHierarchy,
    /// Component on the receiver's node or nearest ancestor.
    UpInHierarchy,
}

/// Where instances of a type live.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ObjectKind {
    /// Pure data object or resource, free of any scene node.
    Object,
    /// Component attached to a scene node.
    Component,
}

/// Object-safe view of an [Inject] field, used by the resolution engine to write bindings.
pub trait InjectSlot {
    /// Binds the value, which must be a boxed `InstancePtr<T>` for the slot's `T`. The value is
    /// returned on type mismatch.
    fn bind(&self, value: Box<dyn Any>) -> Result<(), Box<dyn Any>>;

    fn is_bound(&self) -> bool;
}

/// Compile-time access to the target type of a field, used by generated descriptors.
pub trait InjectField {
    type Target: Injectable + ?Sized;
}

/// A field resolved by the container. Starts unbound; the container writes the resolved instance
/// directly when injecting the owning receiver.
pub struct Inject<T: Injectable + ?Sized> {
    value: RefCell<Option<InstancePtr<T>>>,
}

impl<T: Injectable + ?Sized> Inject<T> {
    /// Returns the bound instance, if any.
    pub fn get(&self) -> Option<InstancePtr<T>> {
        self.value.borrow().clone()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.value.borrow().is_some()
    }

    pub fn set(&self, value: InstancePtr<T>) {
        *self.value.borrow_mut() = Some(value);
    }

    pub fn take(&self) -> Option<InstancePtr<T>> {
        self.value.borrow_mut().take()
    }
}

impl<T: Injectable + ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self {
            value: RefCell::new(None),
        }
    }
}

impl<T: Injectable + ?Sized> Debug for Inject<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inject")
            .field("target", &std::any::type_name::<T>())
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl<T: Injectable + ?Sized> InjectSlot for Inject<T> {
    fn bind(&self, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        let value = value.downcast::<InstancePtr<T>>()?;
        self.set(*value);
        Ok(())
    }

    #[inline]
    fn is_bound(&self) -> bool {
        Inject::is_bound(self)
    }
}

impl<T: Injectable + ?Sized> InjectField for Inject<T> {
    type Target = T;
}

/// [CastFunction](crate::instance_provider::CastFunction) viewing an erased `C` as `InstancePtr<T>`.
pub fn cast_to<T: ComponentDowncast<C> + ?Sized, C: Injectable>(
    instance: InstanceAnyPtr,
) -> Result<Box<dyn Any>, InstanceAnyPtr> {
    T::downcast(instance).map(|instance| Box::new(instance) as Box<dyn Any>)
}

/// Identity [CastFunction](crate::instance_provider::CastFunction) for sized types.
pub fn cast_self<C: Injectable>(instance: InstanceAnyPtr) -> Result<Box<dyn Any>, InstanceAnyPtr> {
    instance
        .downcast::<C>()
        .map(|instance| Box::new(instance) as Box<dyn Any>)
}

/// [Constructor](crate::instance_provider::Constructor) using `Default`.
pub fn construct_default<C: Injectable + Default>() -> InstanceAnyPtr {
    InstancePtr::new(C::default()) as InstanceAnyPtr
}

#[cfg(test)]
mod tests {
    use crate::component::{cast_self, Inject, InjectSlot, Injectable};
    use crate::instance_provider::{InstanceAnyPtr, InstancePtr};

    struct TestValue(i8);

    impl Injectable for TestValue {}

    #[test]
    fn should_bind_matching_value() {
        let slot = Inject::<TestValue>::default();
        assert!(!slot.is_bound());

        let value = cast_self::<TestValue>(InstancePtr::new(TestValue(5)) as InstanceAnyPtr)
            .unwrap_or_else(|_| panic!("cast failed"));
        assert!(slot.bind(value).is_ok());
        assert_eq!(slot.get().unwrap().0, 5);
    }

    #[test]
    fn should_reject_mismatched_value() {
        let slot = Inject::<TestValue>::default();
        assert!(slot.bind(Box::new(InstancePtr::new(1u8))).is_err());
        assert!(!InjectSlot::is_bound(&slot));
    }

    #[test]
    fn should_take_bound_value() {
        let slot = Inject::<TestValue>::default();
        assert!(slot.take().is_none());

        slot.set(InstancePtr::new(TestValue(3)));
        assert_eq!(slot.take().unwrap().0, 3);
        assert!(!slot.is_bound());
        assert!(slot.get().is_none());
    }

    #[test]
    fn should_not_cast_other_types() {
        assert!(cast_self::<TestValue>(InstancePtr::new(1u8) as InstanceAnyPtr).is_err());
    }
}
