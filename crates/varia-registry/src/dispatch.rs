//! Dispatch into externally-installed module operation tables.
//!
//! Each plug-in family (geometry types, graphical types, ...) reserves one
//! module slot: the contiguous id range `slot << MODULE_SHIFT ..`. The
//! family installs one table covering its range; until it does, every
//! operation on an id in that range fails closed. The core never assumes a
//! table is present.

use parking_lot::RwLock;

use varia_core::{DescriptorRef, TypeId, MAX_MODULE_SLOTS};

/// One plug-in family's operation table: descriptors for a contiguous
/// reserved id range.
#[derive(Debug)]
pub struct ModuleTable {
    slot: usize,
    name: &'static str,
    entries: Vec<DescriptorRef>,
}

impl ModuleTable {
    /// Bundle `entries` as the table for module `slot`.
    ///
    /// Entry `i` must carry the id `module_type_id(slot, i)`; the table is
    /// indexed by the low half of the id.
    pub fn new(slot: usize, name: &'static str, entries: Vec<DescriptorRef>) -> Self {
        debug_assert!(slot > 0 && slot < MAX_MODULE_SLOTS);
        debug_assert!(entries
            .iter()
            .enumerate()
            .all(|(i, d)| d.id() == varia_core::module_type_id(slot, i as u32)));
        Self { slot, name, entries }
    }

    /// The slot whose id range this table covers.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// The family name, used for idempotent re-install detection.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Descriptor for `id` if this table covers it.
    pub fn get(&self, id: TypeId) -> Option<DescriptorRef> {
        let index = id.module_index()?;
        if id.module_slot() != self.slot {
            return None;
        }
        self.entries.get(index).cloned()
    }

    /// Scan the table for a type name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.entries.iter().find(|d| d.name() == name).map(|d| d.id())
    }
}

/// Routes module-range ids to whichever tables have been installed.
pub struct ModuleDispatch {
    slots: [RwLock<Option<ModuleTable>>; MAX_MODULE_SLOTS],
}

impl Default for ModuleDispatch {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| RwLock::new(None)),
        }
    }
}

impl ModuleDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a family's table. Re-installing the same family is
    /// idempotent; a different family claiming an occupied slot is
    /// rejected.
    pub fn install(&self, table: ModuleTable) -> bool {
        let slot = table.slot();
        if slot == 0 || slot >= MAX_MODULE_SLOTS {
            tracing::warn!(slot, "module table slot out of range");
            return false;
        }
        let mut guard = self.slots[slot].write();
        match guard.as_ref() {
            Some(existing) if existing.name() == table.name() => true,
            Some(existing) => {
                tracing::warn!(
                    slot,
                    installed = existing.name(),
                    rejected = table.name(),
                    "module slot already claimed"
                );
                false
            }
            None => {
                tracing::trace!(slot, family = table.name(), "module table installed");
                *guard = Some(table);
                true
            }
        }
    }

    /// Descriptor for a module-range id; `None` (fail closed) when the
    /// owning family has not installed its table or the id is outside the
    /// installed table.
    pub fn operations_for(&self, id: TypeId) -> Option<DescriptorRef> {
        let slot = id.module_slot();
        if slot == 0 || slot >= MAX_MODULE_SLOTS {
            return None;
        }
        self.slots[slot].read().as_ref()?.get(id)
    }

    /// Scan installed tables for a type name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.slots[1..]
            .iter()
            .find_map(|slot| slot.read().as_ref()?.lookup(name))
    }
}

impl std::fmt::Debug for ModuleDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let installed: Vec<&str> = self
            .slots
            .iter()
            .filter_map(|s| s.read().as_ref().map(|t| t.name()))
            .collect();
        f.debug_struct("ModuleDispatch")
            .field("installed", &installed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use varia_core::{module_type_id, TypeDescriptor, TypeOperations};

    fn table(slot: usize, name: &'static str) -> ModuleTable {
        let desc = Arc::new(TypeDescriptor::new(
            "mod-point",
            module_type_id(slot, 0),
            TypeOperations::of::<(i32, i32)>(),
        ));
        ModuleTable::new(slot, name, vec![desc])
    }

    #[test]
    fn uninstalled_slot_fails_closed() {
        let dispatch = ModuleDispatch::new();
        assert!(dispatch.operations_for(module_type_id(1, 0)).is_none());
    }

    #[test]
    fn install_then_resolve() {
        let dispatch = ModuleDispatch::new();
        assert!(dispatch.install(table(1, "geometry")));
        let desc = dispatch.operations_for(module_type_id(1, 0)).unwrap();
        assert_eq!(desc.name(), "mod-point");
        assert!(dispatch.operations_for(module_type_id(1, 1)).is_none());
        assert!(dispatch.operations_for(module_type_id(2, 0)).is_none());
    }

    #[test]
    fn reinstall_same_family_is_idempotent() {
        let dispatch = ModuleDispatch::new();
        assert!(dispatch.install(table(1, "geometry")));
        assert!(dispatch.install(table(1, "geometry")));
        assert!(!dispatch.install(table(1, "imaging")));
    }

    #[test]
    fn name_lookup_scans_installed_tables() {
        let dispatch = ModuleDispatch::new();
        assert_eq!(dispatch.lookup("mod-point"), None);
        dispatch.install(table(2, "geometry"));
        assert_eq!(dispatch.lookup("mod-point"), Some(module_type_id(2, 0)));
    }
}
