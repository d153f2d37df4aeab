//! Pointer types shared by the whole container and the provider abstraction used to request
//! instances by type.

use crate::component::Injectable;
use crate::error::ResolutionError;
use std::any::{type_name, Any, TypeId};
use std::error::Error;
use std::rc::Rc;

/// Shared pointer to an instance managed by the container. Registries hold clones of these, but
/// destruction authority stays with whoever created the instance: the scene host for components,
/// the container for pure objects it constructed.
pub type InstancePtr<T> = Rc<T>;

/// Type-erased [InstancePtr].
pub type InstanceAnyPtr = InstancePtr<dyn Any + 'static>;

/// Error type for collaborator-supplied failures, e.g. rule providers.
pub type ErrorPtr = Box<dyn Error + Send + Sync>;

/// Casts a type-erased instance of a concrete type to a `Box<InstancePtr<Target>>` erased as
/// `Box<dyn Any>`. Returns the original instance when the concrete type doesn't match. Such
/// functions are the only way to turn an erased instance into a `dyn Trait` pointer, since
/// unsizing coercion needs the concrete type statically.
pub type CastFunction = fn(instance: InstanceAnyPtr) -> Result<Box<dyn Any>, InstanceAnyPtr>;

/// Creates a new, default-constructed, not yet injected instance.
pub type Constructor = fn() -> InstanceAnyPtr;

/// Generic provider for shared instances, resolved with the same rules as `Global` fields.
pub trait InstanceProvider {
    /// Returns a shared instance of the given target type, creating it if necessary. The result
    /// contains an `InstancePtr<Target>`.
    fn global_instance(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<Box<dyn Any>, ResolutionError>;
}

/// Helper trait for [InstanceProvider] providing strongly-typed access.
pub trait TypedInstanceProvider {
    /// Typesafe version of [InstanceProvider::global_instance].
    fn global_instance_typed<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<InstancePtr<T>, ResolutionError>;

    /// Tries to get an instance like [TypedInstanceProvider::global_instance_typed] does, but
    /// returns `None` when nothing can provide it.
    fn global_instance_option<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<Option<InstancePtr<T>>, ResolutionError>;
}

impl<IP: InstanceProvider + ?Sized> TypedInstanceProvider for IP {
    fn global_instance_typed<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<InstancePtr<T>, ResolutionError> {
        self.global_instance(TypeId::of::<T>(), type_name::<T>())
            .and_then(|instance| {
                instance
                    .downcast::<InstancePtr<T>>()
                    .map(|instance| *instance)
                    .map_err(|_| ResolutionError::IncompatibleInstance {
                        type_name: type_name::<T>().to_string(),
                    })
            })
    }

    fn global_instance_option<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<Option<InstancePtr<T>>, ResolutionError> {
        match self.global_instance_typed::<T>() {
            Ok(instance) => Ok(Some(instance)),
            Err(ResolutionError::UnresolvedDependency { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }
}
