//! Versioned value streaming.
//!
//! The value wire format itself (`id, null flag, payload`) lives in the
//! core crate; this module adds the version negotiation around it. The
//! current format is version 2, which writes the stable built-in ids
//! directly. Version 1 streams predate the id renumbering and carry their
//! own compact id table; reading them remaps each id before dispatching
//! to the normal payload decoder. Version 1 is read-only, writers always
//! emit the current version.

use varia_core::{KnownTypeId, OpsResolver, Reader, StreamError, TypeId, Value, Writer};

/// Current stream format version.
pub const STREAM_VERSION: u32 = 2;

/// Oldest version [`read_value`] still accepts.
pub const STREAM_VERSION_MIN: u32 = 1;

/// Version 1 id table, in the order the old format assigned them.
const LEGACY_IDS: [(u32, KnownTypeId); 11] = [
    (1, KnownTypeId::List),
    (2, KnownTypeId::Str),
    (3, KnownTypeId::StrList),
    (4, KnownTypeId::Int32),
    (5, KnownTypeId::UInt32),
    (6, KnownTypeId::Bool),
    (7, KnownTypeId::Float64),
    (8, KnownTypeId::Bytes),
    (9, KnownTypeId::Int64),
    (10, KnownTypeId::UInt64),
    (11, KnownTypeId::DateTime),
];

fn remap_legacy(raw: u32) -> Option<TypeId> {
    if raw == 0 {
        return Some(TypeId::INVALID);
    }
    LEGACY_IDS
        .iter()
        .find(|(old, _)| *old == raw)
        .map(|(_, k)| (*k).into())
}

/// Write `value` under the given format version.
///
/// Only the current version can be written; requesting any other version
/// fails without touching the writer, as does a value whose type has no
/// save hook.
pub fn write_value(w: &mut Writer, value: &Value, version: u32) -> bool {
    if version != STREAM_VERSION {
        return false;
    }
    value.save(w)
}

/// Read one value under the given format version.
pub fn read_value(
    res: &dyn OpsResolver,
    r: &mut Reader<'_>,
    version: u32,
) -> Result<Value, StreamError> {
    match version {
        STREAM_VERSION => Value::load(res, r),
        STREAM_VERSION_MIN => {
            let raw = r.read_u32()?;
            let id = remap_legacy(raw).ok_or(StreamError::UnsupportedType(TypeId::new(raw)))?;
            Value::load_body(res, id, r)
        }
        _ => {
            tracing::warn!(version, "unsupported stream version");
            Err(StreamError::UnsupportedType(TypeId::INVALID))
        }
    }
}
