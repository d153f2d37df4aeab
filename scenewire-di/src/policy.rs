//! Policies deciding between alternative, equally valid container behaviors. All of them can be
//! deserialized, so hosts can drive them from configuration.

use serde::Deserialize;

/// Order in which registry partitions are consulted by `Global` lookups.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOrder {
    /// Scene partition first, then persistent.
    #[default]
    SceneFirst,
    /// Persistent partition first, then scene.
    PersistentFirst,
}

/// What happens when a target type is registered twice in the same partition.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with a [RegistryError](crate::RegistryError).
    #[default]
    Reject,
    /// Replace the previous entry and log a warning.
    Overwrite,
}

/// What happens when a hierarchy strategy finds no matching component.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyFallback {
    /// Add a default component to the receiver's node, or use a creation rule for abstract types.
    #[default]
    AddDefaultComponent,
    /// Leave the field unbound and log a warning.
    Warn,
}

/// Complete set of resolution policies used by a [Container](crate::factory::Container).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    pub lookup_order: LookupOrder,
    pub duplicate_policy: DuplicatePolicy,
    pub hierarchy_fallback: HierarchyFallback,
}
