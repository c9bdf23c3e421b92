//! Published per-type descriptors.

use std::sync::Arc;

use crate::{TypeFlags, TypeId, TypeOperations};

/// Everything the registry publishes about one type.
///
/// A descriptor is created once, at first successful registration of its
/// name, and persists unchanged until process teardown. Its size and flags
/// are part of the process-wide layout contract.
#[derive(Debug)]
pub struct TypeDescriptor {
    name: Box<str>,
    id: TypeId,
    ops: TypeOperations,
}

impl TypeDescriptor {
    /// Build a descriptor for a registered type.
    pub fn new(name: impl Into<Box<str>>, id: TypeId, ops: TypeOperations) -> Self {
        Self {
            name: name.into(),
            id,
            ops,
        }
    }

    /// The normalized name this descriptor was registered under.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The id assigned at registration.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The operation table bound to this type.
    #[inline]
    pub fn ops(&self) -> &TypeOperations {
        &self.ops
    }

    /// Payload size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.ops.size()
    }

    /// Layout and lifecycle flags.
    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.ops.flags()
    }
}

/// Shared handle to a published descriptor.
///
/// Values hold one of these so destruction never needs a registry lookup.
pub type DescriptorRef = Arc<TypeDescriptor>;

/// Maps a type id to its published descriptor.
///
/// The registry implements this; the container and the load path depend on
/// the trait rather than on the registry's storage, so isolated registries
/// (and built-in-only resolution in tests) plug in without global state.
pub trait OpsResolver {
    /// The descriptor for `id`; `None` for unknown, out-of-range, or
    /// not-yet-installed module ids.
    fn resolve(&self, id: TypeId) -> Option<DescriptorRef>;
}
