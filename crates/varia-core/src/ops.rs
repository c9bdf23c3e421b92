//! Erased per-type operation tables.
//!
//! [`TypeOperations`] bundles every operation the container needs for one
//! registered type (heap create/destroy, in-place construct/destruct, and
//! the optional save/load/equals/null hooks) behind one table so every
//! dispatch path shares a single source of truth. The table is built once
//! per type by [`TypeOperations::of`], which monomorphizes type-erased
//! shims over the concrete payload type; hand-written tables are possible
//! but rarely needed.
//!
//! # Safety contract
//!
//! Every function pointer in the table is only ever invoked with pointers
//! that are valid, properly aligned instances of the payload type the table
//! was built for. The container upholds this by resolving the table through
//! the descriptor that constructed the payload in the first place.

use std::any;
use std::ptr::NonNull;

use crate::{OpsResolver, Reader, StreamCodec, TypeFlags, Writer};

/// Heap-allocate a new instance, copy-constructed from `src` when present.
pub type CreateFn = unsafe fn(src: Option<NonNull<u8>>) -> NonNull<u8>;

/// Destroy and free an instance produced by the paired [`CreateFn`].
pub type DestroyFn = unsafe fn(ptr: NonNull<u8>);

/// Construct an instance in place at `dst`, copied from `src` when present.
pub type ConstructFn = unsafe fn(dst: NonNull<u8>, src: Option<NonNull<u8>>);

/// Run the destructor in place without freeing the storage.
pub type DestructFn = unsafe fn(ptr: NonNull<u8>);

/// Append the instance's wire form to the writer.
pub type SaveFn = unsafe fn(w: &mut Writer, ptr: NonNull<u8>);

/// Replace the instance at `dst` with a value decoded from the reader.
/// Returns false (leaving `dst` untouched or default-valued) on a short or
/// malformed stream. The resolver is provided for payloads that nest other
/// dynamically-typed values and must construct them by id.
pub type LoadFn =
    unsafe fn(res: &dyn OpsResolver, r: &mut Reader<'_>, dst: NonNull<u8>) -> bool;

/// Semantic equality of two instances.
pub type EqualsFn = unsafe fn(a: NonNull<u8>, b: NonNull<u8>) -> bool;

/// Type-specific null/empty predicate.
pub type IsNullFn = unsafe fn(ptr: NonNull<u8>) -> bool;

/// Types with a well-defined null/empty state, for the optional null hook.
pub trait NullProbe {
    fn is_null(&self) -> bool;
}

/// Immutable bundle of operations and layout metadata for one type.
///
/// Published descriptors embed one of these; once a descriptor is visible
/// its size and flags never change.
#[derive(Clone, Copy)]
pub struct TypeOperations {
    size: usize,
    flags: TypeFlags,
    create: CreateFn,
    destroy: DestroyFn,
    construct: ConstructFn,
    destruct: DestructFn,
    save: Option<SaveFn>,
    load: Option<LoadFn>,
    equals: Option<EqualsFn>,
    is_null: Option<IsNullFn>,
    rust_type: Option<any::TypeId>,
}

impl TypeOperations {
    /// Build the operation table for `T`.
    ///
    /// Flags default to [`TypeFlags::CONTAINER`] when `T` has a destructor
    /// and [`TypeFlags::TRIVIAL`] otherwise; save/load/equals hooks start
    /// absent and are added with the `with_*` builders.
    pub fn of<T>() -> Self
    where
        T: Clone + Default + Send + Sync + 'static,
    {
        let flags = if std::mem::needs_drop::<T>() {
            TypeFlags::CONTAINER
        } else {
            TypeFlags::TRIVIAL
        };
        Self {
            size: std::mem::size_of::<T>(),
            flags,
            create: create_shim::<T>,
            destroy: destroy_shim::<T>,
            construct: construct_shim::<T>,
            destruct: destruct_shim::<T>,
            save: None,
            load: None,
            equals: None,
            is_null: None,
            rust_type: Some(any::TypeId::of::<T>()),
        }
    }

    /// Assemble a table from raw parts, for operation tables that cannot be
    /// expressed through [`TypeOperations::of`] (foreign payload layouts,
    /// module plug-ins written against the erased shape directly).
    ///
    /// # Safety
    ///
    /// Every function pointer must uphold the module-level safety contract
    /// for a payload of exactly `size` bytes, and the pointers must agree
    /// with each other about what that payload is.
    pub unsafe fn from_raw_parts(
        size: usize,
        flags: TypeFlags,
        create: CreateFn,
        destroy: DestroyFn,
        construct: ConstructFn,
        destruct: DestructFn,
    ) -> Self {
        Self {
            size,
            flags,
            create,
            destroy,
            construct,
            destruct,
            save: None,
            load: None,
            equals: None,
            is_null: None,
            rust_type: None,
        }
    }

    /// Replace the default flags.
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Add save/load hooks backed by `T`'s [`StreamCodec`] impl.
    pub fn with_stream<T>(mut self) -> Self
    where
        T: StreamCodec + 'static,
    {
        debug_assert_eq!(self.rust_type, Some(any::TypeId::of::<T>()));
        self.save = Some(save_shim::<T>);
        self.load = Some(load_shim::<T>);
        self
    }

    /// Add a semantic comparator backed by `T: PartialEq`.
    ///
    /// Without this hook, same-type comparison falls back to raw byte
    /// comparison of the payload.
    pub fn with_equals<T>(mut self) -> Self
    where
        T: PartialEq + 'static,
    {
        debug_assert_eq!(self.rust_type, Some(any::TypeId::of::<T>()));
        self.equals = Some(equals_shim::<T>);
        self
    }

    /// Install a hand-written save hook.
    ///
    /// # Safety
    /// `f` must treat its pointer argument as a valid instance of this
    /// table's payload type.
    pub unsafe fn with_save_hook(mut self, f: SaveFn) -> Self {
        self.save = Some(f);
        self
    }

    /// Install a hand-written load hook.
    ///
    /// # Safety
    /// `f` must treat its destination argument as a valid instance of this
    /// table's payload type.
    pub unsafe fn with_load_hook(mut self, f: LoadFn) -> Self {
        self.load = Some(f);
        self
    }

    /// Add a type-specific null predicate.
    pub fn with_null_probe<T>(mut self) -> Self
    where
        T: NullProbe + 'static,
    {
        debug_assert_eq!(self.rust_type, Some(any::TypeId::of::<T>()));
        self.is_null = Some(is_null_shim::<T>);
        self
    }

    /// Payload size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Layout and lifecycle flags.
    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// The Rust type identity behind this table, when built via `of`.
    #[inline]
    pub fn rust_type(&self) -> Option<any::TypeId> {
        self.rust_type
    }

    /// Returns true if the table matches concrete type `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.rust_type == Some(any::TypeId::of::<T>())
    }

    pub fn has_save(&self) -> bool {
        self.save.is_some()
    }

    pub fn has_load(&self) -> bool {
        self.load.is_some()
    }

    pub fn has_equals(&self) -> bool {
        self.equals.is_some()
    }

    /// # Safety
    /// `src`, when present, must point to a valid instance of this table's
    /// payload type.
    pub unsafe fn create(&self, src: Option<NonNull<u8>>) -> NonNull<u8> {
        unsafe { (self.create)(src) }
    }

    /// # Safety
    /// `ptr` must have been produced by this table's `create`.
    pub unsafe fn destroy(&self, ptr: NonNull<u8>) {
        unsafe { (self.destroy)(ptr) }
    }

    /// # Safety
    /// `dst` must be valid, aligned, uninitialized storage of at least
    /// `size` bytes; `src`, when present, a valid instance.
    pub unsafe fn construct(&self, dst: NonNull<u8>, src: Option<NonNull<u8>>) {
        unsafe { (self.construct)(dst, src) }
    }

    /// # Safety
    /// `ptr` must point to a valid in-place-constructed instance.
    pub unsafe fn destruct(&self, ptr: NonNull<u8>) {
        unsafe { (self.destruct)(ptr) }
    }

    /// Invoke the save hook; false when the type never registered one.
    ///
    /// # Safety
    /// `ptr` must point to a valid instance.
    pub unsafe fn save(&self, w: &mut Writer, ptr: NonNull<u8>) -> bool {
        match self.save {
            Some(f) => {
                unsafe { f(w, ptr) };
                true
            }
            None => false,
        }
    }

    /// Invoke the load hook; false when absent or when decoding failed.
    ///
    /// # Safety
    /// `dst` must point to a valid instance (load replaces it).
    pub unsafe fn load(&self, res: &dyn OpsResolver, r: &mut Reader<'_>, dst: NonNull<u8>) -> bool {
        match self.load {
            Some(f) => unsafe { f(res, r, dst) },
            None => false,
        }
    }

    /// Invoke the comparator; `None` when the type never registered one.
    ///
    /// # Safety
    /// Both pointers must be valid instances of this table's payload type.
    pub unsafe fn equals(&self, a: NonNull<u8>, b: NonNull<u8>) -> Option<bool> {
        self.equals.map(|f| unsafe { f(a, b) })
    }

    /// Invoke the null predicate; `None` when the type never registered one.
    ///
    /// # Safety
    /// `ptr` must point to a valid instance.
    pub unsafe fn is_null(&self, ptr: NonNull<u8>) -> Option<bool> {
        self.is_null.map(|f| unsafe { f(ptr) })
    }
}

impl std::fmt::Debug for TypeOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeOperations")
            .field("size", &self.size)
            .field("flags", &self.flags)
            .field("save", &self.save.is_some())
            .field("load", &self.load.is_some())
            .field("equals", &self.equals.is_some())
            .finish()
    }
}

/// Convenience trait for types registered through the generic path.
pub trait RegisteredType: Clone + Default + Send + Sync + 'static {
    /// Name the type is registered under.
    const NAME: &'static str;

    /// Operation table for this type; override to attach hooks or flags.
    fn operations() -> TypeOperations {
        TypeOperations::of::<Self>()
    }
}

// === Erased shims, monomorphized per payload type ===

unsafe fn create_shim<T: Clone + Default>(src: Option<NonNull<u8>>) -> NonNull<u8> {
    let value = match src {
        Some(p) => unsafe { p.cast::<T>().as_ref() }.clone(),
        None => T::default(),
    };
    let raw = Box::into_raw(Box::new(value));
    unsafe { NonNull::new_unchecked(raw).cast() }
}

unsafe fn destroy_shim<T>(ptr: NonNull<u8>) {
    drop(unsafe { Box::from_raw(ptr.cast::<T>().as_ptr()) });
}

unsafe fn construct_shim<T: Clone + Default>(dst: NonNull<u8>, src: Option<NonNull<u8>>) {
    let value = match src {
        Some(p) => unsafe { p.cast::<T>().as_ref() }.clone(),
        None => T::default(),
    };
    unsafe { dst.cast::<T>().as_ptr().write(value) };
}

unsafe fn destruct_shim<T>(ptr: NonNull<u8>) {
    unsafe { std::ptr::drop_in_place(ptr.cast::<T>().as_ptr()) };
}

unsafe fn save_shim<T: StreamCodec>(w: &mut Writer, ptr: NonNull<u8>) {
    unsafe { ptr.cast::<T>().as_ref() }.save(w);
}

unsafe fn load_shim<T: StreamCodec>(
    _res: &dyn OpsResolver,
    r: &mut Reader<'_>,
    dst: NonNull<u8>,
) -> bool {
    match T::load(r) {
        Ok(value) => {
            unsafe { *dst.cast::<T>().as_mut() = value };
            true
        }
        Err(_) => false,
    }
}

unsafe fn equals_shim<T: PartialEq>(a: NonNull<u8>, b: NonNull<u8>) -> bool {
    unsafe { a.cast::<T>().as_ref() == b.cast::<T>().as_ref() }
}

unsafe fn is_null_shim<T: NullProbe>(ptr: NonNull<u8>) -> bool {
    unsafe { ptr.cast::<T>().as_ref() }.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_table_shape() {
        let ops = TypeOperations::of::<i32>();
        assert_eq!(ops.size(), 4);
        assert_eq!(ops.flags(), TypeFlags::TRIVIAL);
        assert!(ops.is::<i32>());
        assert!(!ops.is::<u32>());
        assert!(!ops.has_save());
    }

    #[test]
    fn container_table_shape() {
        let ops = TypeOperations::of::<String>();
        assert!(ops.flags().contains(TypeFlags::NEEDS_DESTRUCTION));
        assert!(ops.flags().contains(TypeFlags::RELOCATABLE));
    }

    #[test]
    fn create_copy_destroy() {
        let ops = TypeOperations::of::<String>().with_equals::<String>();
        unsafe {
            let a = ops.create(None);
            assert_eq!(a.cast::<String>().as_ref(), "");

            let src = String::from("payload");
            let src_ptr = NonNull::from(&src).cast::<u8>();
            let b = ops.create(Some(src_ptr));
            assert_eq!(b.cast::<String>().as_ref(), "payload");
            assert_eq!(ops.equals(b, src_ptr), Some(true));
            assert_eq!(ops.equals(a, b), Some(false));

            ops.destroy(a);
            ops.destroy(b);
        }
    }

    #[test]
    fn in_place_construct_destruct() {
        let ops = TypeOperations::of::<u64>();
        let mut slot = std::mem::MaybeUninit::<u64>::uninit();
        unsafe {
            let dst = NonNull::new_unchecked(slot.as_mut_ptr()).cast::<u8>();
            ops.construct(dst, None);
            assert_eq!(slot.assume_init(), 0);

            let src = 99u64;
            ops.construct(dst, Some(NonNull::from(&src).cast()));
            assert_eq!(slot.assume_init(), 99);
            ops.destruct(dst);
        }
    }

    struct NoResolver;

    impl OpsResolver for NoResolver {
        fn resolve(&self, _id: crate::TypeId) -> Option<crate::DescriptorRef> {
            None
        }
    }

    #[test]
    fn stream_hooks_round_trip() {
        let ops = TypeOperations::of::<i64>().with_stream::<i64>();
        let mut w = Writer::new();
        let v = 42i64;
        unsafe {
            assert!(ops.save(&mut w, NonNull::from(&v).cast()));
        }
        let bytes = w.into_bytes();
        let mut out = 0i64;
        let mut r = Reader::new(&bytes);
        unsafe {
            assert!(ops.load(&NoResolver, &mut r, NonNull::from(&mut out).cast()));
        }
        assert_eq!(out, 42);
    }

    #[test]
    fn null_probe_hook() {
        #[derive(Clone, Default)]
        struct Handle(Option<u32>);

        impl NullProbe for Handle {
            fn is_null(&self) -> bool {
                self.0.is_none()
            }
        }

        let ops = TypeOperations::of::<Handle>().with_null_probe::<Handle>();
        let empty = Handle(None);
        let full = Handle(Some(7));
        unsafe {
            assert_eq!(ops.is_null(NonNull::from(&empty).cast()), Some(true));
            assert_eq!(ops.is_null(NonNull::from(&full).cast()), Some(false));
        }
    }

    #[test]
    fn missing_hooks_fail_closed() {
        let ops = TypeOperations::of::<i32>();
        let v = 1i32;
        let mut w = Writer::new();
        unsafe {
            assert!(!ops.save(&mut w, NonNull::from(&v).cast()));
            assert_eq!(ops.equals(NonNull::from(&v).cast(), NonNull::from(&v).cast()), None);
        }
    }
}
