//! Numeric coercion helpers.
//!
//! Every built-in numeric kind promotes to one of three canonical
//! representations: `i64`, `u64`, or `f64`. Narrowing back to the target
//! width is a plain cast: float to integer truncates toward zero, and
//! integer narrowing does not re-check range. The latter is a preserved
//! overflow caveat, not an oversight; callers that care about range must
//! check before converting.

use varia_core::{KnownTypeId, Value};

/// Promote any numeric, textual, or byte payload to `i64`.
///
/// Text parses with surrounding whitespace ignored; non-numeric payloads
/// and unparsable text return `None`.
pub(crate) fn to_signed(value: &Value) -> Option<i64> {
    let kind = KnownTypeId::of(value.type_id())?;
    match kind {
        KnownTypeId::Bool => Some(i64::from(*value.get::<bool>()?)),
        KnownTypeId::Int8 => Some(i64::from(*value.get::<i8>()?)),
        KnownTypeId::Int16 => Some(i64::from(*value.get::<i16>()?)),
        KnownTypeId::Int32 => Some(i64::from(*value.get::<i32>()?)),
        KnownTypeId::Int64 => Some(*value.get::<i64>()?),
        KnownTypeId::UInt8 => Some(i64::from(*value.get::<u8>()?)),
        KnownTypeId::UInt16 => Some(i64::from(*value.get::<u16>()?)),
        KnownTypeId::UInt32 => Some(i64::from(*value.get::<u32>()?)),
        KnownTypeId::UInt64 => Some(*value.get::<u64>()? as i64),
        KnownTypeId::Float32 => Some(*value.get::<f32>()? as i64),
        KnownTypeId::Float64 => Some(*value.get::<f64>()? as i64),
        KnownTypeId::Str => value.get::<String>()?.trim().parse().ok(),
        KnownTypeId::Bytes => std::str::from_utf8(value.get::<Vec<u8>>()?)
            .ok()?
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}

/// Promote any numeric, textual, or byte payload to `u64`.
pub(crate) fn to_unsigned(value: &Value) -> Option<u64> {
    let kind = KnownTypeId::of(value.type_id())?;
    match kind {
        KnownTypeId::UInt8 => Some(u64::from(*value.get::<u8>()?)),
        KnownTypeId::UInt16 => Some(u64::from(*value.get::<u16>()?)),
        KnownTypeId::UInt32 => Some(u64::from(*value.get::<u32>()?)),
        KnownTypeId::UInt64 => Some(*value.get::<u64>()?),
        KnownTypeId::Str => value.get::<String>()?.trim().parse().ok(),
        KnownTypeId::Bytes => std::str::from_utf8(value.get::<Vec<u8>>()?)
            .ok()?
            .trim()
            .parse()
            .ok(),
        // Signed kinds reinterpret through i64, preserving the original's
        // unchecked-narrowing behavior for negatives.
        _ => to_signed(value).map(|v| v as u64),
    }
}

/// Promote any numeric, textual, or byte payload to `f64`.
pub(crate) fn to_double(value: &Value) -> Option<f64> {
    let kind = KnownTypeId::of(value.type_id())?;
    match kind {
        KnownTypeId::Bool => Some(f64::from(*value.get::<bool>()?)),
        KnownTypeId::Float32 => Some(f64::from(*value.get::<f32>()?)),
        KnownTypeId::Float64 => Some(*value.get::<f64>()?),
        KnownTypeId::UInt8 | KnownTypeId::UInt16 | KnownTypeId::UInt32 | KnownTypeId::UInt64 => {
            to_unsigned(value).map(|v| v as f64)
        }
        KnownTypeId::Int8 | KnownTypeId::Int16 | KnownTypeId::Int32 | KnownTypeId::Int64 => {
            to_signed(value).map(|v| v as f64)
        }
        KnownTypeId::Str => value.get::<String>()?.trim().parse().ok(),
        KnownTypeId::Bytes => std::str::from_utf8(value.get::<Vec<u8>>()?)
            .ok()?
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}

/// Build the numeric target value from its canonical promotion.
///
/// Returns `(value, ok)`: on a failed promotion the target is
/// default-valued and `ok` is false, never partially constructed.
pub(crate) fn make_numeric(target: KnownTypeId, source: &Value) -> (Value, bool) {
    match target {
        KnownTypeId::Bool => {
            let ok = to_bool(source);
            match ok {
                Some(b) => (Value::from(b), true),
                None => (Value::from(false), false),
            }
        }
        KnownTypeId::Int8 => narrow_signed(source, |v| Value::from(v as i8)),
        KnownTypeId::Int16 => narrow_signed(source, |v| Value::from(v as i16)),
        KnownTypeId::Int32 => narrow_signed(source, |v| Value::from(v as i32)),
        KnownTypeId::Int64 => narrow_signed(source, Value::from),
        KnownTypeId::UInt8 => narrow_unsigned(source, |v| Value::from(v as u8)),
        KnownTypeId::UInt16 => narrow_unsigned(source, |v| Value::from(v as u16)),
        KnownTypeId::UInt32 => narrow_unsigned(source, |v| Value::from(v as u32)),
        KnownTypeId::UInt64 => narrow_unsigned(source, Value::from),
        KnownTypeId::Float32 => match to_double(source) {
            Some(v) => (Value::from(v as f32), true),
            None => (Value::from(0.0f32), false),
        },
        KnownTypeId::Float64 => match to_double(source) {
            Some(v) => (Value::from(v), true),
            None => (Value::from(0.0f64), false),
        },
        _ => (Value::invalid(), false),
    }
}

fn narrow_signed(source: &Value, build: impl FnOnce(i64) -> Value) -> (Value, bool) {
    match to_signed(source) {
        Some(v) => (build(v), true),
        None => (build(0), false),
    }
}

fn narrow_unsigned(source: &Value, build: impl FnOnce(u64) -> Value) -> (Value, bool) {
    match to_unsigned(source) {
        Some(v) => (build(v), true),
        None => (build(0), false),
    }
}

/// Boolean coercion: text uses the case-insensitive false spellings
/// (`"0"`, `"false"`, empty); numerics compare against zero.
pub(crate) fn to_bool(value: &Value) -> Option<bool> {
    let kind = KnownTypeId::of(value.type_id())?;
    match kind {
        KnownTypeId::Bool => value.get::<bool>().copied(),
        KnownTypeId::Str => Some(text_to_bool(value.get::<String>()?)),
        KnownTypeId::Bytes => {
            let text = std::str::from_utf8(value.get::<Vec<u8>>()?).ok()?;
            Some(text_to_bool(text))
        }
        KnownTypeId::Float32 | KnownTypeId::Float64 => to_double(value).map(|v| v != 0.0),
        _ if kind.is_unsigned() => to_unsigned(value).map(|v| v != 0),
        _ if kind.is_numeric() => to_signed(value).map(|v| v != 0),
        _ => None,
    }
}

pub(crate) fn text_to_bool(text: &str) -> bool {
    !(text.is_empty() || text == "0" || text.eq_ignore_ascii_case("false"))
}

/// True when this value's payload participates in numeric promotion.
pub(crate) fn is_numeric(value: &Value) -> bool {
    KnownTypeId::of(value.type_id()).is_some_and(KnownTypeId::is_numeric)
}

/// True when this value holds one of the floating-point kinds.
pub(crate) fn is_floating_point(value: &Value) -> bool {
    KnownTypeId::of(value.type_id()).is_some_and(KnownTypeId::is_floating_point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use varia_core::DateTime;

    #[test]
    fn promotions() {
        assert_eq!(to_signed(&Value::from(true)), Some(1));
        assert_eq!(to_signed(&Value::from(-7i8)), Some(-7));
        assert_eq!(to_signed(&Value::from(" 42 ")), Some(42));
        assert_eq!(to_signed(&Value::from("abc")), None);
        assert_eq!(to_unsigned(&Value::from(300u16)), Some(300));
        assert_eq!(to_double(&Value::from(2.5f32)), Some(2.5));
        assert_eq!(to_signed(&Value::from(DateTime::default())), None);
    }

    #[test]
    fn float_to_integer_truncates_toward_zero() {
        assert_eq!(to_signed(&Value::from(1.9f64)), Some(1));
        assert_eq!(to_signed(&Value::from(-1.9f64)), Some(-1));
    }

    #[test]
    fn narrowing_does_not_range_check() {
        let (v, ok) = make_numeric(KnownTypeId::Int8, &Value::from(300i32));
        assert!(ok);
        assert_eq!(v.get::<i8>(), Some(&(300i32 as i8)));

        let (v, ok) = make_numeric(KnownTypeId::UInt32, &Value::from(-1i32));
        assert!(ok);
        assert_eq!(v.get::<u32>(), Some(&u32::MAX));
    }

    #[test]
    fn failed_promotion_yields_default_and_false() {
        let (v, ok) = make_numeric(KnownTypeId::Int32, &Value::from("abc"));
        assert!(!ok);
        assert_eq!(v.get::<i32>(), Some(&0));
    }

    #[test]
    fn bool_spellings() {
        assert!(!text_to_bool(""));
        assert!(!text_to_bool("0"));
        assert!(!text_to_bool("false"));
        assert!(!text_to_bool("FALSE"));
        assert!(text_to_bool("1"));
        assert!(text_to_bool("no"));
        assert!(text_to_bool("true"));
    }
}
