//! Runtime type registry and dynamically-typed value container.
//!
//! A [`TypeRegistry`] maps stable numeric ids to type operation tables;
//! a [`Value`] carries one payload of any registered type, stored inline
//! when small and trivially movable, shared copy-on-write otherwise. On
//! top of those this crate adds the [`convert`] engine for coercions
//! between the built-in types and the [`stream`] module for versioned
//! serialization.
//!
//! ```
//! use varia::prelude::*;
//!
//! let registry = TypeRegistry::global();
//! let value = Value::from(42i32);
//! let (text, ok) = varia::convert::convert(registry, &value, KnownTypeId::Str.into());
//! assert!(ok);
//! assert_eq!(text.get::<String>().map(String::as_str), Some("42"));
//! ```

pub mod convert;
pub mod stream;

pub use varia_core as core;
pub use varia_modules as modules;
pub use varia_registry as registry;

pub use varia_core::{
    builtin, module_type_id, DateTime, DescriptorRef, KnownTypeId, OpsResolver, Reader,
    RegisteredType, StreamCodec, StreamError, TypeDescriptor, TypeFlags, TypeId, TypeOperations,
    Value, Writer, INLINE_CAPACITY, MAX_MODULE_SLOTS, MODULE_SHIFT, USER_BASE,
};
pub use varia_registry::{normalize_type_name, ModuleDispatch, ModuleTable, TypeRegistry};

pub mod prelude {
    pub use crate::convert::{
        can_convert, can_convert_value, compare, convert, try_convert, ConvertError,
    };
    pub use crate::stream::{read_value, write_value, STREAM_VERSION};
    pub use varia_core::{
        DateTime, KnownTypeId, OpsResolver, Reader, RegisteredType, StreamCodec, StreamError,
        TypeFlags, TypeId, TypeOperations, Value, Writer,
    };
    pub use varia_registry::{ModuleTable, TypeRegistry};
}
