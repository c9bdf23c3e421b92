//! The runtime type registry.
//!
//! A [`TypeRegistry`] owns the set of known types: the fixed built-in
//! table, a growable append-only table of custom types, the alias map, and
//! the module dispatch for externally-reserved id ranges.
//!
//! # Concurrency
//!
//! Lookups (`lookup`, `describe`, `is_registered`) take a shared lock and
//! run concurrently; registration takes the exclusive lock. The custom
//! table is append-only: a slot becomes visible to readers only after
//! being fully populated, so an id obtained before a concurrent append
//! always denotes a valid, fully-built descriptor.
//!
//! # Fatal re-registration
//!
//! Registering an existing name with a different size or flags means two
//! parts of the process disagree about a type's memory layout. Continuing
//! would risk silent corruption, so this panics instead of returning an
//! error. The same guard applies to re-aliasing a name to a different
//! target.
//!
//! # Ownership
//!
//! Registries are plain values: tests build isolated instances, and call
//! sites that need one shared registry use [`TypeRegistry::global`].

use std::any;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use varia_core::{
    builtin, DescriptorRef, OpsResolver, TypeDescriptor, TypeId, TypeOperations, RegisteredType,
    Value, USER_BASE,
};

use crate::{ModuleDispatch, ModuleTable};

#[derive(Default)]
struct CustomTable {
    /// Append-only; the descriptor for id `USER_BASE + i` lives at index
    /// `i` forever.
    entries: Vec<DescriptorRef>,
    /// Normalized name to id, aliases included (an alias maps straight to
    /// its target id).
    by_name: FxHashMap<Box<str>, TypeId>,
    /// Rust type identity to id, for types registered through the generic
    /// path.
    by_rust_type: FxHashMap<any::TypeId, TypeId>,
}

/// Owns the process's (or a test's) set of registered types.
#[derive(Default)]
pub struct TypeRegistry {
    custom: RwLock<CustomTable>,
    modules: ModuleDispatch,
}

static GLOBAL: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::default);

impl TypeRegistry {
    /// An empty registry (built-ins are always present).
    pub fn new() -> Self {
        Self::default()
    }

    /// The default process-wide registry.
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Register `name` with the given operation table and return its id.
    ///
    /// Names are normalized before lookup, so equivalent spellings
    /// (`"Vec < i32 >"`, `"Vec<i32>"`) collide. Registering a name that
    /// already exists with identical size and flags is idempotent and
    /// returns the existing id.
    ///
    /// # Panics
    ///
    /// Panics when `name` is already registered with a different size or
    /// flag set. This is a process-wide consistency violation, not a
    /// recoverable error.
    pub fn register(&self, name: &str, ops: TypeOperations) -> TypeId {
        let normalized = normalize_type_name(name);

        if let Some(id) = builtin::lookup(&normalized) {
            let existing = builtin::resolve(id).expect("built-in id resolves");
            guard_layout(&normalized, &existing, &ops);
            return id;
        }

        {
            let table = self.custom.read();
            if let Some(&id) = table.by_name.get(normalized.as_str()) {
                if let Some(existing) = resolve_in_table(&table, id) {
                    guard_layout(&normalized, &existing, &ops);
                }
                return id;
            }
        }

        let mut table = self.custom.write();
        // Re-check under the exclusive lock: another thread may have won
        // the race for this name.
        if let Some(&id) = table.by_name.get(normalized.as_str()) {
            if let Some(existing) = resolve_in_table(&table, id) {
                guard_layout(&normalized, &existing, &ops);
            }
            return id;
        }

        let id = TypeId::new(USER_BASE + table.entries.len() as u32);
        let desc = Arc::new(TypeDescriptor::new(normalized.clone(), id, ops));
        if let Some(rust_type) = ops.rust_type() {
            table.by_rust_type.insert(rust_type, id);
        }
        table.entries.push(desc);
        table.by_name.insert(normalized.clone().into_boxed_str(), id);
        tracing::trace!(name = %normalized, id = %id, "type registered");
        id
    }

    /// Register `name` as an alias (typedef) for `target` and return the
    /// id the alias resolves to.
    ///
    /// # Panics
    ///
    /// Panics when `name` already denotes a different id, mirroring the
    /// size/flags guard in [`TypeRegistry::register`].
    pub fn register_alias(&self, name: &str, target: TypeId) -> TypeId {
        let normalized = normalize_type_name(name);

        if let Some(existing) = self.lookup(&normalized) {
            if existing != target {
                panic!(
                    "TypeRegistry::register_alias: consistency violation: \
                     '{normalized}' already denotes {existing}, re-aliased to {target}"
                );
            }
            return existing;
        }

        let mut table = self.custom.write();
        if let Some(&existing) = table.by_name.get(normalized.as_str()) {
            if existing != target {
                panic!(
                    "TypeRegistry::register_alias: consistency violation: \
                     '{normalized}' already denotes {existing}, re-aliased to {target}"
                );
            }
            return existing;
        }
        table.by_name.insert(normalized.clone().into_boxed_str(), target);
        tracing::trace!(name = %normalized, target = %target, "alias registered");
        target
    }

    /// Register `T` under [`RegisteredType::NAME`].
    pub fn register_type<T: RegisteredType>(&self) -> TypeId {
        self.register(T::NAME, T::operations())
    }

    /// The id for `name`, aliases resolved; `None` when unregistered.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        let normalized = normalize_type_name(name);
        if let Some(id) = builtin::lookup(&normalized) {
            return Some(id);
        }
        if let Some(&id) = self.custom.read().by_name.get(normalized.as_str()) {
            return Some(id);
        }
        self.modules.lookup(&normalized)
    }

    /// The descriptor for `id`; `None` for unknown, out-of-range, or
    /// uninstalled-module ids.
    pub fn describe(&self, id: TypeId) -> Option<DescriptorRef> {
        self.resolve(id)
    }

    /// Returns true when `id` currently resolves to a descriptor.
    pub fn is_registered(&self, id: TypeId) -> bool {
        self.resolve(id).is_some()
    }

    /// The id `T` was registered under, if any (built-ins included).
    pub fn id_of<T: 'static>(&self) -> Option<TypeId> {
        let rust_type = any::TypeId::of::<T>();
        for raw in 1..=varia_core::KnownTypeId::LAST as u32 {
            let id = TypeId::new(raw);
            if builtin::resolve(id).is_some_and(|d| d.ops().rust_type() == Some(rust_type)) {
                return Some(id);
            }
        }
        self.custom.read().by_rust_type.get(&rust_type).copied()
    }

    /// Wrap `value` in a [`Value`] using `T`'s registered descriptor.
    pub fn value_of<T: 'static>(&self, value: T) -> Option<Value> {
        let id = self.id_of::<T>()?;
        let desc = self.resolve(id)?;
        Value::from_payload(desc, value)
    }

    /// Install a module family's operation table.
    pub fn install_module(&self, table: ModuleTable) -> bool {
        self.modules.install(table)
    }

    /// The module dispatch behind this registry.
    pub fn modules(&self) -> &ModuleDispatch {
        &self.modules
    }
}

impl OpsResolver for TypeRegistry {
    fn resolve(&self, id: TypeId) -> Option<DescriptorRef> {
        if id.is_builtin() {
            return builtin::resolve(id);
        }
        if id.is_module() {
            return self.modules.operations_for(id);
        }
        let table = self.custom.read();
        lookup_entry(&table, id)
    }
}

/// Resolution that never re-enters the registry lock: built-ins plus the
/// already-borrowed custom table. Module-range targets stay unresolved
/// here, which only relaxes the layout guard for them.
fn resolve_in_table(table: &CustomTable, id: TypeId) -> Option<DescriptorRef> {
    if id.is_builtin() {
        return builtin::resolve(id);
    }
    lookup_entry(table, id)
}

fn lookup_entry(table: &CustomTable, id: TypeId) -> Option<DescriptorRef> {
    // Aliases live only in the name index, so every table entry is a
    // directly registered type.
    table.entries.get(id.user_index()?).cloned()
}

/// Abort-style guard for conflicting re-registration.
fn guard_layout(name: &str, existing: &TypeDescriptor, incoming: &TypeOperations) {
    if existing.size() != incoming.size() || existing.flags() != incoming.flags() {
        panic!(
            "TypeRegistry::register: consistency violation: type '{name}' is registered \
             with size {} and flags {:?}, re-registered with size {} and flags {:?}",
            existing.size(),
            existing.flags(),
            incoming.size(),
            incoming.flags(),
        );
    }
}

/// Strip insignificant whitespace so equivalent spellings of a type name
/// collide: whitespace survives (as a single space) only between two word
/// characters.
pub fn normalize_type_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let prev = out.chars().last();
            let next = chars.peek().copied();
            if prev.is_some_and(is_word_char) && next.is_some_and(is_word_char) {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
