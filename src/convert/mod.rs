//! Conversion engine for built-in value types.
//!
//! Conversions are direct, deterministic, and total: [`convert`] always
//! returns a value of the requested type together with an `ok` flag, and
//! the same inputs always produce the same output. [`can_convert`]
//! answers from the static compatibility matrix alone;
//! [`can_convert_value`] additionally applies the data-dependent rules a
//! concrete payload can fail (a multi-element string list has no scalar
//! text form even though the matrix row allows it).

mod matrix;
mod numeric;
mod sequence;
mod text;

pub use matrix::can_convert;

use thiserror::Error;
use varia_core::{DateTime, KnownTypeId, OpsResolver, TypeId, Value};

/// Structured conversion failure, for callers that prefer a `Result` over
/// the `(Value, ok)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// The compatibility matrix has no edge between the two types.
    #[error("no conversion from {from} to {to}")]
    Unsupported { from: TypeId, to: TypeId },

    /// The types are compatible but this payload was rejected, e.g.
    /// unparsable text or a multi-element string list.
    #[error("payload could not be converted to {to}")]
    Rejected { to: TypeId },
}

/// Static convertibility refined by the payload at hand.
pub fn can_convert_value(value: &Value, to: TypeId) -> bool {
    if !matrix::can_convert(value.type_id(), to) {
        return false;
    }
    if value.type_id() == KnownTypeId::StrList.into() && to == KnownTypeId::Str.into() {
        return value.get::<Vec<String>>().is_some_and(|l| l.len() == 1);
    }
    true
}

/// Convert `value` to type `to`.
///
/// Returns the converted value and whether the conversion succeeded. On
/// failure the result is a default-constructed value of the target type
/// (or an invalid value when the target itself cannot be resolved), so
/// callers always hold a value of the type they asked for.
pub fn convert(res: &dyn OpsResolver, value: &Value, to: TypeId) -> (Value, bool) {
    if !value.is_valid() || !to.is_valid() {
        return (Value::invalid(), false);
    }
    if value.type_id() == to {
        return (value.clone(), true);
    }
    if !matrix::can_convert(value.type_id(), to) {
        return (Value::construct(res, to, None), false);
    }
    let Some(target) = KnownTypeId::of(to) else {
        return (Value::construct(res, to, None), false);
    };

    let converted = match target {
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
        | KnownTypeId::Float64 => return numeric::make_numeric(target, value),

        KnownTypeId::Str => to_text_scalar(value).map(Value::from),
        KnownTypeId::Bytes => to_text_scalar(value).map(|s| Value::from(s.into_bytes())),
        KnownTypeId::StrList => to_str_list(value),
        KnownTypeId::List => value
            .get::<Vec<String>>()
            .map(|l| Value::from(sequence::str_list_to_list(l))),
        KnownTypeId::DateTime => value
            .get::<String>()
            .and_then(|s| DateTime::parse(s.trim()))
            .map(Value::from),
    };

    match converted {
        Some(v) => (v, true),
        None => {
            tracing::trace!(
                from = value.type_name().unwrap_or("invalid"),
                to = to.raw(),
                "conversion failed"
            );
            (Value::construct(res, to, None), false)
        }
    }
}

fn to_text_scalar(value: &Value) -> Option<String> {
    if value.type_id() == KnownTypeId::StrList.into() {
        let list = value.get::<Vec<String>>()?;
        return sequence::str_list_to_str(list);
    }
    text::to_text(value)
}

fn to_str_list(value: &Value) -> Option<Value> {
    if let Some(s) = value.get::<String>() {
        return Some(Value::from(sequence::str_to_str_list(s)));
    }
    let list = value.get::<Vec<Value>>()?;
    Some(Value::from(sequence::list_to_str_list(list)))
}

/// [`convert`] with a structured error instead of the `ok` flag.
pub fn try_convert(
    res: &dyn OpsResolver,
    value: &Value,
    to: TypeId,
) -> Result<Value, ConvertError> {
    if !matrix::can_convert(value.type_id(), to) {
        return Err(ConvertError::Unsupported {
            from: value.type_id(),
            to,
        });
    }
    match convert(res, value, to) {
        (v, true) => Ok(v),
        (_, false) => Err(ConvertError::Rejected { to }),
    }
}

/// Relative tolerance comparison for floating-point promotion.
///
/// Scales the tolerance by the smaller magnitude, so values near zero
/// compare essentially exactly.
pub fn fuzzy_compare(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().min(b.abs())
}

/// Cross-type equality.
///
/// Same-type operands use their registered equality. Numeric operands of
/// different types promote: through `f64` with [`fuzzy_compare`] when
/// either side is floating-point, through `i64` otherwise. Any other
/// mixed pair converts the right operand to the left operand's type and
/// compares there; when that conversion fails the values are unequal.
pub fn compare(res: &dyn OpsResolver, a: &Value, b: &Value) -> bool {
    if a.type_id() == b.type_id() {
        return a == b;
    }
    if !a.is_valid() || !b.is_valid() {
        return false;
    }
    if numeric::is_numeric(a) && numeric::is_numeric(b) {
        if numeric::is_floating_point(a) || numeric::is_floating_point(b) {
            return match (numeric::to_double(a), numeric::to_double(b)) {
                (Some(x), Some(y)) => fuzzy_compare(x, y),
                _ => false,
            };
        }
        return match (numeric::to_signed(a), numeric::to_signed(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        };
    }
    let (converted, ok) = convert(res, b, a.type_id());
    ok && *a == converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use varia_core::builtin::BuiltinResolver;

    fn id(k: KnownTypeId) -> TypeId {
        k.into()
    }

    #[test]
    fn text_to_number_and_back() {
        let res = BuiltinResolver;
        let (v, ok) = convert(&res, &Value::from("42"), id(KnownTypeId::Int32));
        assert!(ok);
        assert_eq!(v.get::<i32>(), Some(&42));

        let (v, ok) = convert(&res, &Value::from(42i32), id(KnownTypeId::Str));
        assert!(ok);
        assert_eq!(v.get::<String>().map(String::as_str), Some("42"));
    }

    #[test]
    fn failed_conversion_yields_default_target() {
        let res = BuiltinResolver;
        let (v, ok) = convert(&res, &Value::from("abc"), id(KnownTypeId::Int32));
        assert!(!ok);
        assert_eq!(v.type_id(), id(KnownTypeId::Int32));
        assert_eq!(v.get::<i32>(), Some(&0));
    }

    #[test]
    fn bool_renders_as_words() {
        let res = BuiltinResolver;
        let (v, ok) = convert(&res, &Value::from(true), id(KnownTypeId::Str));
        assert!(ok);
        assert_eq!(v.get::<String>().map(String::as_str), Some("true"));
    }

    #[test]
    fn text_and_numbers_reach_bytes() {
        let res = BuiltinResolver;
        let (v, ok) = convert(&res, &Value::from("héllo"), id(KnownTypeId::Bytes));
        assert!(ok);
        assert_eq!(v.get::<Vec<u8>>(), Some(&"héllo".as_bytes().to_vec()));

        let (v, ok) = convert(&res, &Value::from(42i32), id(KnownTypeId::Bytes));
        assert!(ok);
        assert_eq!(v.get::<Vec<u8>>(), Some(&b"42".to_vec()));

        let (back, ok) = convert(&res, &v, id(KnownTypeId::Int32));
        assert!(ok);
        assert_eq!(back.get::<i32>(), Some(&42));
    }

    #[test]
    fn str_list_scalar_rule_is_data_dependent() {
        let res = BuiltinResolver;
        let one = Value::from(vec!["x".to_owned()]);
        let two = Value::from(vec!["x".to_owned(), "y".to_owned()]);

        assert!(can_convert(id(KnownTypeId::StrList), id(KnownTypeId::Str)));
        assert!(can_convert_value(&one, id(KnownTypeId::Str)));
        assert!(!can_convert_value(&two, id(KnownTypeId::Str)));

        let (v, ok) = convert(&res, &one, id(KnownTypeId::Str));
        assert!(ok);
        assert_eq!(v.get::<String>().map(String::as_str), Some("x"));

        let (v, ok) = convert(&res, &two, id(KnownTypeId::Str));
        assert!(!ok);
        assert_eq!(v.type_id(), id(KnownTypeId::Str));
    }

    #[test]
    fn list_and_str_list_exchange() {
        let res = BuiltinResolver;
        let list = Value::from(vec![Value::from(1i32), Value::from("two")]);
        let (v, ok) = convert(&res, &list, id(KnownTypeId::StrList));
        assert!(ok);
        assert_eq!(
            v.get::<Vec<String>>(),
            Some(&vec!["1".to_owned(), "two".to_owned()])
        );

        let (back, ok) = convert(&res, &v, id(KnownTypeId::List));
        assert!(ok);
        let items = back.get::<Vec<Value>>().unwrap();
        assert_eq!(items[0].get::<String>().map(String::as_str), Some("1"));
    }

    #[test]
    fn datetime_text_round_trip() {
        let res = BuiltinResolver;
        let dt = Value::from(DateTime::from_epoch_secs(1_234_567_890));
        let (text, ok) = convert(&res, &dt, id(KnownTypeId::Str));
        assert!(ok);
        assert_eq!(
            text.get::<String>().map(String::as_str),
            Some("2009-02-13T23:31:30")
        );

        let (back, ok) = convert(&res, &text, id(KnownTypeId::DateTime));
        assert!(ok);
        assert_eq!(back, dt);

        let (_, ok) = convert(&res, &Value::from("not a date"), id(KnownTypeId::DateTime));
        assert!(!ok);
    }

    #[test]
    fn matrix_and_convert_agree_on_builtins() {
        let res = BuiltinResolver;
        let samples: Vec<Value> = vec![
            Value::from(true),
            Value::from(-5i32),
            Value::from(7u64),
            Value::from(1.5f64),
            Value::from("9"),
            Value::from(b"17".to_vec()),
            Value::from(vec!["a".to_owned()]),
            Value::from(vec![Value::from(1i32)]),
            Value::from(DateTime::from_epoch_secs(0)),
        ];
        for sample in &samples {
            for raw in 1..=KnownTypeId::LAST as u32 {
                let to = TypeId::new(raw);
                let (_, ok) = convert(&res, sample, to);
                // Success implies the matrix allows it; the reverse can
                // fail on the payload (unparsable text, list arity).
                if ok {
                    assert!(can_convert(sample.type_id(), to));
                }
                if !can_convert(sample.type_id(), to) {
                    assert!(!ok);
                }
            }
        }
    }

    #[test]
    fn try_convert_distinguishes_failure_modes() {
        let res = BuiltinResolver;
        assert!(try_convert(&res, &Value::from("42"), id(KnownTypeId::Int32)).is_ok());
        assert_eq!(
            try_convert(&res, &Value::from("abc"), id(KnownTypeId::Int32)),
            Err(ConvertError::Rejected {
                to: id(KnownTypeId::Int32)
            })
        );
        assert_eq!(
            try_convert(
                &res,
                &Value::from(vec![Value::from(1i32)]),
                id(KnownTypeId::Int32)
            ),
            Err(ConvertError::Unsupported {
                from: id(KnownTypeId::List),
                to: id(KnownTypeId::Int32)
            })
        );
    }

    #[test]
    fn cross_type_numeric_equality() {
        let res = BuiltinResolver;
        assert!(compare(&res, &Value::from(5i32), &Value::from(5.0f64)));
        assert!(compare(&res, &Value::from(5u8), &Value::from(5i64)));
        assert!(!compare(&res, &Value::from(5i32), &Value::from(6.0f64)));
        assert!(compare(&res, &Value::from(0i32), &Value::from(false)));
    }

    #[test]
    fn cross_type_textual_equality() {
        let res = BuiltinResolver;
        assert!(compare(&res, &Value::from("42"), &Value::from(42i32)));
        assert!(compare(&res, &Value::from(42i32), &Value::from("42")));
        assert!(!compare(
            &res,
            &Value::from("x"),
            &Value::from(vec![Value::from(1i32)])
        ));
    }

    #[test]
    fn fuzzy_tolerance_scales_with_magnitude() {
        assert!(fuzzy_compare(1.0e15, 1.0e15 + 0.5));
        assert!(!fuzzy_compare(1.0, 1.0 + 1.0e-9));
        assert!(fuzzy_compare(0.0, 0.0));
        assert!(!fuzzy_compare(0.0, 1.0e-300));
    }
}
