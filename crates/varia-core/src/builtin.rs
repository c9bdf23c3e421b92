//! The built-in type table.
//!
//! One descriptor per [`KnownTypeId`], built once on first use. The table
//! is small and fixed, so name lookup is a linear scan; id lookup is an
//! indexed read.

use std::ptr::NonNull;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::{
    DateTime, DescriptorRef, KnownTypeId, OpsResolver, Reader, StreamCodec, TypeDescriptor,
    TypeId, TypeOperations, Value, Writer,
};

const BUILTIN_COUNT: usize = KnownTypeId::LAST as usize;

static BUILTINS: Lazy<[DescriptorRef; BUILTIN_COUNT]> = Lazy::new(|| {
    [
        entry::<bool>(KnownTypeId::Bool),
        entry::<i8>(KnownTypeId::Int8),
        entry::<i16>(KnownTypeId::Int16),
        entry::<i32>(KnownTypeId::Int32),
        entry::<i64>(KnownTypeId::Int64),
        entry::<u8>(KnownTypeId::UInt8),
        entry::<u16>(KnownTypeId::UInt16),
        entry::<u32>(KnownTypeId::UInt32),
        entry::<u64>(KnownTypeId::UInt64),
        entry::<f32>(KnownTypeId::Float32),
        entry::<f64>(KnownTypeId::Float64),
        entry::<String>(KnownTypeId::Str),
        entry::<Vec<u8>>(KnownTypeId::Bytes),
        entry::<Vec<String>>(KnownTypeId::StrList),
        list_entry(),
        entry::<DateTime>(KnownTypeId::DateTime),
    ]
});

fn entry<T>(k: KnownTypeId) -> DescriptorRef
where
    T: Clone + Default + Send + Sync + PartialEq + StreamCodec + 'static,
{
    let ops = TypeOperations::of::<T>().with_stream::<T>().with_equals::<T>();
    Arc::new(TypeDescriptor::new(k.name(), k.into(), ops))
}

fn list_entry() -> DescriptorRef {
    let ops = TypeOperations::of::<Vec<Value>>().with_equals::<Vec<Value>>();
    // Nested values need the resolver during load, so the list codec is
    // hand-written rather than a StreamCodec shim.
    let ops = unsafe { ops.with_save_hook(list_save).with_load_hook(list_load) };
    Arc::new(TypeDescriptor::new(
        KnownTypeId::List.name(),
        KnownTypeId::List.into(),
        ops,
    ))
}

unsafe fn list_save(w: &mut Writer, ptr: NonNull<u8>) {
    let list = unsafe { ptr.cast::<Vec<Value>>().as_ref() };
    w.write_u32(list.len() as u32);
    for item in list {
        if !item.save(w) {
            // Elements of a type without a save hook degrade to the
            // invalid value rather than poisoning the whole stream.
            Value::invalid().save(w);
        }
    }
}

unsafe fn list_load(res: &dyn OpsResolver, r: &mut Reader<'_>, dst: NonNull<u8>) -> bool {
    let Ok(len) = r.read_u32() else {
        return false;
    };
    let mut out = Vec::with_capacity((len as usize).min(r.remaining()));
    for _ in 0..len {
        match Value::load(res, r) {
            Ok(v) => out.push(v),
            Err(_) => return false,
        }
    }
    unsafe { *dst.cast::<Vec<Value>>().as_mut() = out };
    true
}

/// The descriptor for a built-in type.
pub fn descriptor(k: KnownTypeId) -> DescriptorRef {
    BUILTINS[k as usize - 1].clone()
}

/// Indexed built-in resolution; `None` outside the built-in range.
pub fn resolve(id: TypeId) -> Option<DescriptorRef> {
    KnownTypeId::of(id).map(descriptor)
}

/// Scan the built-in table for `name` (already-normalized spelling).
pub fn lookup(name: &str) -> Option<TypeId> {
    BUILTINS
        .iter()
        .find(|d| d.name() == name)
        .map(|d| d.id())
}

/// Resolver over the built-in table only; the registry layers custom and
/// module types on top of this.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinResolver;

impl OpsResolver for BuiltinResolver {
    fn resolve(&self, id: TypeId) -> Option<DescriptorRef> {
        resolve(id)
    }
}

fn from_builtin<T: 'static>(k: KnownTypeId, value: T) -> Value {
    Value::from_payload(descriptor(k), value)
        .expect("built-in descriptor matches its payload type")
}

macro_rules! impl_value_from {
    ($($ty:ty => $known:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Value {
                    from_builtin(KnownTypeId::$known, v)
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => Str,
    Vec<u8> => Bytes,
    Vec<String> => StrList,
    Vec<Value> => List,
    DateTime => DateTime,
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        from_builtin(KnownTypeId::Str, v.to_string())
    }
}
