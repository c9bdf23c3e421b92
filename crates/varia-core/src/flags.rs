//! Per-type layout and lifecycle flags.

use bitflags::bitflags;

bitflags! {
    /// Flags describing the memory behavior of a registered type.
    ///
    /// Flags are part of the published descriptor and never change after
    /// registration; two registrations of the same name with different
    /// flags are a process-level consistency violation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        /// The type has a non-trivial constructor; zero-filled memory is
        /// not a valid instance.
        const NEEDS_CONSTRUCTION = 1 << 0;
        /// The type has a non-trivial destructor that must run before its
        /// storage is discarded.
        const NEEDS_DESTRUCTION = 1 << 1;
        /// An instance can be moved to a new location by raw byte copy
        /// without invoking its copy operation.
        const RELOCATABLE = 1 << 2;
        /// The payload is a pointer to a framework object.
        const OBJECT_POINTER = 1 << 3;
    }
}

impl TypeFlags {
    /// Flag set for plain-old-data scalars.
    pub const TRIVIAL: TypeFlags = TypeFlags::RELOCATABLE;

    /// Flag set for heap-owning container types.
    pub const CONTAINER: TypeFlags = TypeFlags::NEEDS_CONSTRUCTION
        .union(TypeFlags::NEEDS_DESTRUCTION)
        .union(TypeFlags::RELOCATABLE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert!(TypeFlags::TRIVIAL.contains(TypeFlags::RELOCATABLE));
        assert!(!TypeFlags::TRIVIAL.contains(TypeFlags::NEEDS_DESTRUCTION));
        assert!(TypeFlags::CONTAINER.contains(TypeFlags::NEEDS_CONSTRUCTION));
    }
}
