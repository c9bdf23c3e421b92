//! The dynamically-typed value container.
//!
//! A [`Value`] is a type id plus storage for one payload of that type.
//! Small relocatable payloads live directly in the handle; everything else
//! lives in a reference-counted heap block shared between copies until a
//! mutation forces a private copy (copy-on-write).
//!
//! # Storage invariants
//!
//! - Inline storage is used only when the type's size fits
//!   [`INLINE_CAPACITY`] *and* the type is flagged
//!   [`TypeFlags::RELOCATABLE`]; otherwise storage is heap-allocated and
//!   reference-counted even for a single owner.
//! - A shared payload is never mutated in place: every mutating accessor
//!   verifies exclusive ownership first and deep-copies if the block is
//!   aliased.
//!
//! # Threading
//!
//! Reference counts are atomic (`Arc`), so cloning and dropping aliased
//! values across threads is memory-safe. Mutating through one handle while
//! another thread reads an aliased handle is a caller error unless the
//! mutator detached first; the accessors here always detach.

use std::mem::MaybeUninit;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::{
    DescriptorRef, OpsResolver, Reader, StreamError, TypeFlags, TypeId, Writer,
};

/// Size of the in-handle payload buffer, in bytes.
pub const INLINE_CAPACITY: usize = 16;

/// Reference-counted heap storage for one payload.
///
/// Dropping the last reference runs the type's destroy operation.
struct HeapBlock {
    desc: DescriptorRef,
    data: NonNull<u8>,
}

// Payloads registered through the generic path are Send + Sync by bound;
// hand-written operation tables take on the same contract (see
// `TypeOperations::from_raw_parts`).
unsafe impl Send for HeapBlock {}
unsafe impl Sync for HeapBlock {}

impl Drop for HeapBlock {
    fn drop(&mut self) {
        unsafe { self.desc.ops().destroy(self.data) };
    }
}

struct InlineBuf {
    bytes: [MaybeUninit<u8>; INLINE_CAPACITY],
}

impl InlineBuf {
    fn uninit() -> Self {
        Self {
            bytes: [MaybeUninit::uninit(); INLINE_CAPACITY],
        }
    }

    /// Read-only view of the buffer. Writes must go through
    /// [`InlineBuf::ptr_mut`] so the pointer carries mutable provenance.
    fn ptr(&self) -> NonNull<u8> {
        // An array's address is never null.
        unsafe { NonNull::new_unchecked(self.bytes.as_ptr() as *mut u8) }
    }

    fn ptr_mut(&mut self) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.bytes.as_mut_ptr().cast::<u8>()) }
    }
}

enum Storage {
    Empty,
    Inline(InlineBuf),
    Shared(Arc<HeapBlock>),
}

/// A single value of any registered type, behind one uniform handle.
pub struct Value {
    desc: Option<DescriptorRef>,
    is_null: bool,
    storage: Storage,
}

impl Value {
    /// The invalid value: no type, no payload.
    pub fn invalid() -> Self {
        Self {
            desc: None,
            is_null: true,
            storage: Storage::Empty,
        }
    }

    /// Construct a value of type `id`, copied from `source` when it holds a
    /// payload of the same type, default-constructed otherwise.
    ///
    /// An invalid or unknown `id` yields an invalid value: a caller error
    /// surfaced as a sentinel, never a fault. A default-constructed value
    /// starts out null; a copied one takes the source's null flag.
    pub fn construct(res: &dyn OpsResolver, id: TypeId, source: Option<&Value>) -> Self {
        if !id.is_valid() {
            return Self::invalid();
        }
        let Some(desc) = res.resolve(id) else {
            return Self::invalid();
        };
        let src = source.and_then(|v| {
            (v.type_id() == desc.id())
                .then(|| v.payload_ptr())
                .flatten()
                .map(|p| (p, v.is_null))
        });
        let (src_ptr, is_null) = match src {
            Some((p, null)) => (Some(p), null),
            None => (None, true),
        };
        let storage = unsafe { Self::construct_storage(&desc, src_ptr) };
        Self {
            desc: Some(desc),
            is_null,
            storage,
        }
    }

    /// Move a concrete `T` into a value described by `desc`.
    ///
    /// Returns `None` when `desc`'s operation table was not built for `T`.
    pub fn from_payload<T: 'static>(desc: DescriptorRef, value: T) -> Option<Self> {
        if !desc.ops().is::<T>() {
            return None;
        }
        let storage = if Self::stores_inline(&desc) {
            let mut buf = InlineBuf::uninit();
            unsafe { buf.ptr_mut().cast::<T>().as_ptr().write(value) };
            Storage::Inline(buf)
        } else {
            let raw = Box::into_raw(Box::new(value));
            let data = unsafe { NonNull::new_unchecked(raw).cast::<u8>() };
            Storage::Shared(Arc::new(HeapBlock {
                desc: desc.clone(),
                data,
            }))
        };
        Some(Self {
            desc: Some(desc),
            is_null: false,
            storage,
        })
    }

    fn stores_inline(desc: &DescriptorRef) -> bool {
        desc.size() <= INLINE_CAPACITY && desc.flags().contains(TypeFlags::RELOCATABLE)
    }

    /// # Safety
    /// `src`, when present, must point to a valid payload of `desc`'s type.
    unsafe fn construct_storage(desc: &DescriptorRef, src: Option<NonNull<u8>>) -> Storage {
        if Self::stores_inline(desc) {
            let mut buf = InlineBuf::uninit();
            unsafe { desc.ops().construct(buf.ptr_mut(), src) };
            Storage::Inline(buf)
        } else {
            let data = unsafe { desc.ops().create(src) };
            Storage::Shared(Arc::new(HeapBlock {
                desc: desc.clone(),
                data,
            }))
        }
    }

    /// The id of the stored type; [`TypeId::INVALID`] for an invalid value.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.desc.as_ref().map_or(TypeId::INVALID, |d| d.id())
    }

    /// The registered name of the stored type.
    pub fn type_name(&self) -> Option<&str> {
        self.desc.as_ref().map(|d| d.name())
    }

    /// The descriptor backing this value.
    #[inline]
    pub fn descriptor(&self) -> Option<&DescriptorRef> {
        self.desc.as_ref()
    }

    /// Returns true when the value holds a payload of a registered type.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.desc.is_some()
    }

    /// Returns true for invalid values, default-constructed values, and
    /// payloads whose type-specific null predicate reports null.
    pub fn is_null(&self) -> bool {
        if self.is_null {
            return true;
        }
        match (&self.desc, self.payload_ptr()) {
            (Some(desc), Some(ptr)) => unsafe { desc.ops().is_null(ptr) }.unwrap_or(false),
            _ => true,
        }
    }

    /// Returns true while the payload lives in the handle's inline buffer.
    pub fn uses_inline_storage(&self) -> bool {
        matches!(self.storage, Storage::Inline(_))
    }

    /// Number of handles aliasing this value's heap block (1 for inline or
    /// exclusive storage, 0 for invalid values).
    pub fn share_count(&self) -> usize {
        match &self.storage {
            Storage::Empty => 0,
            Storage::Inline(_) => 1,
            Storage::Shared(arc) => Arc::strong_count(arc),
        }
    }

    /// Read-only pointer to the payload bytes.
    pub fn payload_ptr(&self) -> Option<NonNull<u8>> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Inline(buf) => Some(buf.ptr()),
            Storage::Shared(arc) => Some(arc.data),
        }
    }

    /// Mutable pointer to the payload bytes, privatizing shared storage
    /// first so no other handle observes subsequent writes.
    pub fn mutable_payload_ptr(&mut self) -> Option<NonNull<u8>> {
        self.detach();
        match &mut self.storage {
            Storage::Empty => None,
            Storage::Inline(buf) => Some(buf.ptr_mut()),
            Storage::Shared(arc) => Some(arc.data),
        }
    }

    /// Ensure this handle is the sole owner of its storage, deep-copying
    /// the payload if the heap block is aliased.
    pub fn detach(&mut self) {
        if let Storage::Shared(arc) = &mut self.storage {
            if Arc::get_mut(arc).is_none() {
                let desc = arc.desc.clone();
                let data = unsafe { desc.ops().create(Some(arc.data)) };
                *arc = Arc::new(HeapBlock { desc, data });
            }
        }
    }

    /// Borrow the payload as `T`; `None` when the stored type is not `T`.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        let desc = self.desc.as_ref()?;
        if !desc.ops().is::<T>() {
            return None;
        }
        let ptr = self.payload_ptr()?;
        Some(unsafe { ptr.cast::<T>().as_ref() })
    }

    /// Mutably borrow the payload as `T`, detaching shared storage first.
    ///
    /// Clears the null flag: a caller taking mutable access is giving the
    /// value contents.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if !self.desc.as_ref()?.ops().is::<T>() {
            return None;
        }
        self.is_null = false;
        let ptr = self.mutable_payload_ptr()?;
        Some(unsafe { ptr.cast::<T>().as_mut() })
    }

    /// Clone the payload out as an owned `T`.
    pub fn to_owned_payload<T: Clone + 'static>(&self) -> Option<T> {
        self.get::<T>().cloned()
    }

    /// Serialize as `id, null flag, payload` via the type's save hook.
    ///
    /// Writes nothing and returns false when the type has no save hook.
    /// Invalid values serialize as id 0 with no payload and succeed.
    pub fn save(&self, w: &mut Writer) -> bool {
        let Some(desc) = &self.desc else {
            w.write_u32(TypeId::INVALID.raw());
            w.write_bool(true);
            return true;
        };
        let Some(ptr) = self.payload_ptr() else {
            return false;
        };
        if !desc.ops().has_save() {
            return false;
        }
        w.write_u32(desc.id().raw());
        w.write_bool(self.is_null);
        unsafe { desc.ops().save(w, ptr) }
    }

    /// Deserialize a value written by [`Value::save`].
    pub fn load(res: &dyn OpsResolver, r: &mut Reader<'_>) -> Result<Self, StreamError> {
        let id = TypeId::new(r.read_u32()?);
        Self::load_body(res, id, r)
    }

    /// Deserialize the null flag and payload for an id that was already
    /// read, for outer formats that translate ids before dispatching.
    pub fn load_body(
        res: &dyn OpsResolver,
        id: TypeId,
        r: &mut Reader<'_>,
    ) -> Result<Self, StreamError> {
        if !id.is_valid() {
            let _ = r.read_bool()?;
            return Ok(Self::invalid());
        }
        let Some(desc) = res.resolve(id) else {
            return Err(StreamError::UnsupportedType(id));
        };
        if !desc.ops().has_load() {
            return Err(StreamError::UnsupportedType(id));
        }
        let is_null = r.read_bool()?;
        let mut value = Self::construct(res, desc.id(), None);
        let Some(ptr) = value.mutable_payload_ptr() else {
            return Err(StreamError::UnsupportedType(id));
        };
        if !unsafe { desc.ops().load(res, r, ptr) } {
            return Err(StreamError::DecodeFailed(id));
        }
        value.is_null = is_null;
        Ok(value)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let storage = match &self.storage {
            Storage::Empty => Storage::Empty,
            // Aliasing the block is the whole point: no payload copy until
            // one of the handles mutates.
            Storage::Shared(arc) => Storage::Shared(Arc::clone(arc)),
            Storage::Inline(buf) => {
                let desc = self.desc.as_ref().expect("inline storage implies descriptor");
                let mut copy = InlineBuf::uninit();
                unsafe { desc.ops().construct(copy.ptr_mut(), Some(buf.ptr())) };
                Storage::Inline(copy)
            }
        };
        Self {
            desc: self.desc.clone(),
            is_null: self.is_null,
            storage,
        }
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        if let Storage::Inline(buf) = &mut self.storage {
            if let Some(desc) = &self.desc {
                unsafe { desc.ops().destruct(buf.ptr_mut()) };
            }
        }
        // Shared storage destroys its payload when the last Arc drops.
    }
}

/// Same-type equality.
///
/// Two values compare equal only when they hold the same type: the
/// cross-type comparison path (numeric promotion, coercion) lives in the
/// conversion engine. Types without a registered comparator fall back to
/// raw byte comparison of the payload: representation equality, correct
/// only for types without padding or pointer-identity subtleties.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.desc, &other.desc) {
            (None, None) => true,
            (Some(a), Some(b)) if a.id() == b.id() => {
                let (Some(pa), Some(pb)) = (self.payload_ptr(), other.payload_ptr()) else {
                    return false;
                };
                if let Some(eq) = unsafe { a.ops().equals(pa, pb) } {
                    return eq;
                }
                let size = a.size();
                let lhs = unsafe { std::slice::from_raw_parts(pa.as_ptr(), size) };
                let rhs = unsafe { std::slice::from_raw_parts(pb.as_ptr(), size) };
                lhs == rhs
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.desc {
            None => f.write_str("Value(invalid)"),
            Some(desc) => {
                write!(f, "Value({}", desc.name())?;
                if self.is_null {
                    f.write_str(", null")?;
                }
                f.write_str(")")
            }
        }
    }
}
