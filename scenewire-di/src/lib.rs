//! Runtime dependency injection for component-based scene graphs.
//!
//! Types describe themselves with [type descriptors](component_registry::TypeDescriptor), usually
//! generated by `#[derive(Injectable)]`. A [Container](factory::Container) sweeps the live scene
//! graph exposed by a [SceneHost](scene::SceneHost), registers globally injectable objects and
//! binds the [Inject](component::Inject) fields of every receiver, using one of four
//! [strategies](component::InjectionStrategy).

pub mod component;
pub mod component_registry;
mod error;
pub mod factory;
pub mod global;
pub mod instance_provider;
pub mod policy;
mod resolver;
pub mod rules;
pub mod scene;
pub mod scope;

pub use error::{ContainerError, HostError, RegistryError, ResolutionError};

#[cfg(feature = "derive")]
pub use scenewire_di_derive::{injectable, injectable_alias, Injectable};
