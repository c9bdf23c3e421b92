//! Stable runtime type identifiers.
//!
//! This module provides [`TypeId`], the opaque integer handle naming a
//! registered type for the lifetime of the process, and [`KnownTypeId`],
//! the fixed set of built-in types known at compile time.
//!
//! # Id ranges
//!
//! - `0` is reserved for "invalid / no type".
//! - `1..=LAST_BUILTIN` are the built-in types.
//! - `USER_BASE..` are custom types, assigned sequentially at registration.
//! - Ids with a non-zero high half (`id >> MODULE_SHIFT`) belong to an
//!   externally-reserved module range; the owning plug-in supplies the
//!   operation table for them.
//!
//! # Example
//!
//! ```
//! use varia_core::{KnownTypeId, TypeId};
//!
//! let id = TypeId::from(KnownTypeId::Int32);
//! assert!(id.is_builtin());
//! assert!(id.is_valid());
//! ```

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// First id handed out to custom registrations.
pub const USER_BASE: u32 = 256;

/// Bit position separating the module slot from the in-module index.
pub const MODULE_SHIFT: u32 = 16;

/// Number of externally-reservable module slots (slot 0 is the core).
pub const MAX_MODULE_SLOTS: usize = 8;

/// A stable per-process handle naming a registered type.
///
/// Ids are plain `u32`s underneath; once the registry has assigned an id it
/// stays valid and keeps the same meaning until process teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// The reserved "invalid / no type" id.
    pub const INVALID: TypeId = TypeId(0);

    /// Create a type id from its raw representation.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw representation.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true unless this is [`TypeId::INVALID`].
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Returns true if this id names one of the compile-time built-ins.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 != 0 && self.0 <= KnownTypeId::LAST as u32
    }

    /// Returns true if this id was assigned from the custom range.
    #[inline]
    pub const fn is_user(self) -> bool {
        self.0 >= USER_BASE && self.module_slot() == 0
    }

    /// The module slot owning this id, or `0` for core ids.
    #[inline]
    pub const fn module_slot(self) -> usize {
        (self.0 >> MODULE_SHIFT) as usize
    }

    /// Returns true if this id falls in an externally-reserved module range.
    #[inline]
    pub const fn is_module(self) -> bool {
        self.module_slot() != 0
    }

    /// Index of this id inside the custom table, if it is a user id.
    #[inline]
    pub const fn user_index(self) -> Option<usize> {
        if self.is_user() {
            Some((self.0 - USER_BASE) as usize)
        } else {
            None
        }
    }

    /// Index of this id inside its module's table, if it is a module id.
    #[inline]
    pub const fn module_index(self) -> Option<usize> {
        if self.is_module() {
            Some((self.0 & ((1 << MODULE_SHIFT) - 1)) as usize)
        } else {
            None
        }
    }
}

/// The id of entry `index` in module slot `slot`'s reserved range.
pub const fn module_type_id(slot: usize, index: u32) -> TypeId {
    TypeId::new(((slot as u32) << MODULE_SHIFT) | index)
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type_{}", self.0)
    }
}

impl From<u32> for TypeId {
    fn from(raw: u32) -> Self {
        Self::new(raw)
    }
}

impl From<TypeId> for u32 {
    fn from(id: TypeId) -> Self {
        id.0
    }
}

impl From<KnownTypeId> for TypeId {
    fn from(known: KnownTypeId) -> Self {
        Self::new(known.into())
    }
}

/// The fixed, compile-time set of built-in types.
///
/// The discriminants are the wire-stable raw ids; they are append-only and
/// must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum KnownTypeId {
    Bool = 1,
    Int8 = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    UInt8 = 6,
    UInt16 = 7,
    UInt32 = 8,
    UInt64 = 9,
    Float32 = 10,
    Float64 = 11,
    Str = 12,
    Bytes = 13,
    StrList = 14,
    List = 15,
    DateTime = 16,
}

impl KnownTypeId {
    /// Highest built-in discriminant.
    pub const LAST: KnownTypeId = KnownTypeId::DateTime;

    /// Resolve a raw id to a built-in, if it is one.
    #[inline]
    pub fn of(id: TypeId) -> Option<KnownTypeId> {
        KnownTypeId::try_from(id.raw()).ok()
    }

    /// The registered name of this built-in.
    pub const fn name(self) -> &'static str {
        match self {
            KnownTypeId::Bool => "bool",
            KnownTypeId::Int8 => "i8",
            KnownTypeId::Int16 => "i16",
            KnownTypeId::Int32 => "i32",
            KnownTypeId::Int64 => "i64",
            KnownTypeId::UInt8 => "u8",
            KnownTypeId::UInt16 => "u16",
            KnownTypeId::UInt32 => "u32",
            KnownTypeId::UInt64 => "u64",
            KnownTypeId::Float32 => "f32",
            KnownTypeId::Float64 => "f64",
            KnownTypeId::Str => "str",
            KnownTypeId::Bytes => "bytes",
            KnownTypeId::StrList => "strlist",
            KnownTypeId::List => "list",
            KnownTypeId::DateTime => "datetime",
        }
    }

    /// Returns true for the integer and floating-point built-ins.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            KnownTypeId::Bool
                | KnownTypeId::Int8
                | KnownTypeId::Int16
                | KnownTypeId::Int32
                | KnownTypeId::Int64
                | KnownTypeId::UInt8
                | KnownTypeId::UInt16
                | KnownTypeId::UInt32
                | KnownTypeId::UInt64
                | KnownTypeId::Float32
                | KnownTypeId::Float64
        )
    }

    /// Returns true for the floating-point built-ins.
    #[inline]
    pub const fn is_floating_point(self) -> bool {
        matches!(self, KnownTypeId::Float32 | KnownTypeId::Float64)
    }

    /// Returns true for the unsigned integer built-ins.
    #[inline]
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            KnownTypeId::UInt8 | KnownTypeId::UInt16 | KnownTypeId::UInt32 | KnownTypeId::UInt64
        )
    }
}
