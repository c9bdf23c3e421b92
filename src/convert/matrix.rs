//! Static compatibility matrix for built-in conversions.
//!
//! One `u32` row per built-in source type, with a bit set for every target
//! the source converts to directly. Float32 aliases to the Float64 row on
//! both axes, so the two floating-point types always agree about what they
//! reach. Conversion is direct only; the matrix is never chained through
//! an intermediate type.
//!
//! The original design kept a separate category fallback for
//! narrow-integer kinds living outside its matrix; here every integer
//! width is part of the built-in set, so the fallback collapses into the
//! rows themselves and ids outside the table simply do not convert.

use varia_core::{KnownTypeId, TypeId};

const fn bit(k: KnownTypeId) -> u32 {
    1 << (k as u32)
}

const NUMERIC: u32 = bit(KnownTypeId::Bool)
    | bit(KnownTypeId::Int8)
    | bit(KnownTypeId::Int16)
    | bit(KnownTypeId::Int32)
    | bit(KnownTypeId::Int64)
    | bit(KnownTypeId::UInt8)
    | bit(KnownTypeId::UInt16)
    | bit(KnownTypeId::UInt32)
    | bit(KnownTypeId::UInt64)
    | bit(KnownTypeId::Float32)
    | bit(KnownTypeId::Float64);

const TEXTUAL: u32 = bit(KnownTypeId::Str) | bit(KnownTypeId::Bytes);

/// Row for source type `k`: bits of every directly reachable target.
const fn row(k: KnownTypeId) -> u32 {
    match k {
        // Every numeric kind reaches every other numeric kind and both
        // text forms.
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
        | KnownTypeId::Float64 => (NUMERIC | TEXTUAL) & !bit(k),

        KnownTypeId::Str => {
            NUMERIC
                | bit(KnownTypeId::Bytes)
                | bit(KnownTypeId::StrList)
                | bit(KnownTypeId::DateTime)
        }
        KnownTypeId::Bytes => NUMERIC | bit(KnownTypeId::Str),
        // Sequence to scalar text is data-dependent (exactly one
        // element); the bit stays set and the element count is checked at
        // convert time.
        KnownTypeId::StrList => bit(KnownTypeId::List) | bit(KnownTypeId::Str),
        KnownTypeId::List => bit(KnownTypeId::StrList),
        KnownTypeId::DateTime => bit(KnownTypeId::Str),
    }
}

/// Collapse Float32 onto the Float64 row/column.
fn widen(k: KnownTypeId) -> KnownTypeId {
    if k == KnownTypeId::Float32 {
        KnownTypeId::Float64
    } else {
        k
    }
}

/// True when a value of type `from` is statically convertible to `to`.
///
/// Identical valid ids are always convertible; ids outside the built-in
/// table are not convertible to anything but themselves.
pub fn can_convert(from: TypeId, to: TypeId) -> bool {
    if !from.is_valid() || !to.is_valid() {
        return false;
    }
    if from == to {
        return true;
    }
    let (Some(from), Some(to)) = (KnownTypeId::of(from), KnownTypeId::of(to)) else {
        return false;
    };
    let (from, to) = (widen(from), widen(to));
    if from == to {
        return true;
    }
    row(from) & bit(to) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(k: KnownTypeId) -> TypeId {
        k.into()
    }

    #[test]
    fn identical_ids_always_convert() {
        assert!(can_convert(id(KnownTypeId::Str), id(KnownTypeId::Str)));
        assert!(can_convert(TypeId::new(500), TypeId::new(500)));
        assert!(!can_convert(TypeId::INVALID, TypeId::INVALID));
    }

    #[test]
    fn float_widths_are_interchangeable() {
        assert!(can_convert(id(KnownTypeId::Float32), id(KnownTypeId::Float64)));
        assert!(can_convert(id(KnownTypeId::Float64), id(KnownTypeId::Float32)));
    }

    #[test]
    fn numeric_text_reachability() {
        assert!(can_convert(id(KnownTypeId::Int32), id(KnownTypeId::Str)));
        assert!(can_convert(id(KnownTypeId::Str), id(KnownTypeId::Int32)));
        assert!(can_convert(id(KnownTypeId::Bool), id(KnownTypeId::Bytes)));
        assert!(can_convert(id(KnownTypeId::UInt64), id(KnownTypeId::Float64)));
    }

    #[test]
    fn sequence_rows() {
        assert!(can_convert(id(KnownTypeId::StrList), id(KnownTypeId::Str)));
        assert!(can_convert(id(KnownTypeId::StrList), id(KnownTypeId::List)));
        assert!(can_convert(id(KnownTypeId::List), id(KnownTypeId::StrList)));
        assert!(!can_convert(id(KnownTypeId::List), id(KnownTypeId::Str)));
        assert!(!can_convert(id(KnownTypeId::List), id(KnownTypeId::Int32)));
    }

    #[test]
    fn datetime_reaches_text_only() {
        assert!(can_convert(id(KnownTypeId::DateTime), id(KnownTypeId::Str)));
        assert!(can_convert(id(KnownTypeId::Str), id(KnownTypeId::DateTime)));
        assert!(!can_convert(id(KnownTypeId::DateTime), id(KnownTypeId::Int64)));
    }

    #[test]
    fn out_of_table_ids_do_not_convert() {
        let custom = TypeId::new(varia_core::USER_BASE);
        assert!(!can_convert(custom, id(KnownTypeId::Str)));
        assert!(!can_convert(id(KnownTypeId::Str), custom));
    }
}
