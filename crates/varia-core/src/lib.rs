//! Core types for the varia runtime type system.
//!
//! This crate is the leaf of the workspace: stable type identifiers,
//! per-type operation tables and descriptors, the dynamically-typed
//! [`Value`] container, the built-in type table, and the byte-stream codec
//! that save/load operations write through.
//!
//! The registry that assigns ids and the conversion engine that coerces
//! between types live in the `varia-registry` and `varia` crates; both
//! reach back into this crate through the [`OpsResolver`] seam.

pub mod builtin;
mod datetime;
mod descriptor;
mod error;
mod flags;
mod ops;
mod stream;
mod type_id;
mod value;

pub use datetime::DateTime;
pub use descriptor::{DescriptorRef, OpsResolver, TypeDescriptor};
pub use error::StreamError;
pub use flags::TypeFlags;
pub use ops::{
    ConstructFn, CreateFn, DestroyFn, DestructFn, EqualsFn, IsNullFn, LoadFn, NullProbe,
    RegisteredType, SaveFn, TypeOperations,
};
pub use stream::{Reader, StreamCodec, Writer};
pub use type_id::{
    module_type_id, KnownTypeId, TypeId, MAX_MODULE_SLOTS, MODULE_SHIFT, USER_BASE,
};
pub use value::{Value, INLINE_CAPACITY};
