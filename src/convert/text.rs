//! Text rendering for built-in payloads.
//!
//! Floating-point text uses shortest-form significant-digit formatting,
//! six significant digits for `f32` payloads and fifteen for `f64`, with
//! scientific notation once the magnitude leaves the fixed-point window.
//! The same text feeds back through numeric parsing, so a formatted float
//! re-parses to a value equal at the formatting precision.

use varia_core::{DateTime, KnownTypeId, Value};

/// Significant digits when rendering an `f32` payload.
pub(crate) const FLOAT_DIGITS: usize = 6;

/// Significant digits when rendering an `f64` payload.
pub(crate) const DOUBLE_DIGITS: usize = 15;

/// Format `v` with `precision` significant digits.
///
/// Fixed-point while the decimal exponent is in `-4..precision`,
/// scientific otherwise, and trailing fractional zeros are trimmed in
/// both forms. Matches the C `%g` family that the textual wire formats
/// here were defined against.
pub(crate) fn format_g(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return "nan".to_owned();
    }
    if v.is_infinite() {
        return if v < 0.0 { "-inf" } else { "inf" }.to_owned();
    }
    if v == 0.0 {
        return "0".to_owned();
    }
    let precision = precision.max(1);

    // Round to the requested significant digits first; the exponent of
    // the rounded form decides fixed versus scientific.
    let sci = format!("{:.*e}", precision - 1, v);
    let (mantissa, exp_text) = match sci.split_once('e') {
        Some(parts) => parts,
        None => (sci.as_str(), "0"),
    };
    let exp: i32 = exp_text.parse().unwrap_or(0);

    if exp < -4 || exp >= precision as i32 {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }

    let decimals = (precision as i32 - 1 - exp).max(0) as usize;
    trim_fraction(&format!("{v:.decimals$}"))
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    } else {
        s.to_owned()
    }
}

/// Render a scalar payload as text.
///
/// Sequence payloads are handled separately and return `None` here.
pub(crate) fn to_text(value: &Value) -> Option<String> {
    let kind = KnownTypeId::of(value.type_id())?;
    match kind {
        KnownTypeId::Bool => Some(if *value.get::<bool>()? { "true" } else { "false" }.to_owned()),
        KnownTypeId::Int8 => Some(value.get::<i8>()?.to_string()),
        KnownTypeId::Int16 => Some(value.get::<i16>()?.to_string()),
        KnownTypeId::Int32 => Some(value.get::<i32>()?.to_string()),
        KnownTypeId::Int64 => Some(value.get::<i64>()?.to_string()),
        KnownTypeId::UInt8 => Some(value.get::<u8>()?.to_string()),
        KnownTypeId::UInt16 => Some(value.get::<u16>()?.to_string()),
        KnownTypeId::UInt32 => Some(value.get::<u32>()?.to_string()),
        KnownTypeId::UInt64 => Some(value.get::<u64>()?.to_string()),
        KnownTypeId::Float32 => Some(format_g(f64::from(*value.get::<f32>()?), FLOAT_DIGITS)),
        KnownTypeId::Float64 => Some(format_g(*value.get::<f64>()?, DOUBLE_DIGITS)),
        KnownTypeId::Str => Some(value.get::<String>()?.clone()),
        KnownTypeId::Bytes => Some(String::from_utf8_lossy(value.get::<Vec<u8>>()?).into_owned()),
        KnownTypeId::DateTime => Some(value.get::<DateTime>()?.to_string()),
        KnownTypeId::StrList | KnownTypeId::List => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_window() {
        assert_eq!(format_g(0.0, DOUBLE_DIGITS), "0");
        assert_eq!(format_g(1.0, DOUBLE_DIGITS), "1");
        assert_eq!(format_g(1.5, DOUBLE_DIGITS), "1.5");
        assert_eq!(format_g(-2.25, DOUBLE_DIGITS), "-2.25");
        assert_eq!(format_g(0.0001, DOUBLE_DIGITS), "0.0001");
    }

    #[test]
    fn scientific_outside_window() {
        assert_eq!(format_g(0.00001, DOUBLE_DIGITS), "1e-05");
        assert_eq!(format_g(1e15, DOUBLE_DIGITS), "1e+15");
        assert_eq!(format_g(1234567.0, FLOAT_DIGITS), "1.23457e+06");
        assert_eq!(format_g(-2.5e-7, DOUBLE_DIGITS), "-2.5e-07");
    }

    #[test]
    fn rounding_hides_representation_noise() {
        assert_eq!(format_g(0.1 + 0.2, DOUBLE_DIGITS), "0.3");
    }

    #[test]
    fn float32_precision() {
        assert_eq!(format_g(f64::from(0.25f32), FLOAT_DIGITS), "0.25");
        assert_eq!(format_g(f64::from(1.1f32), FLOAT_DIGITS), "1.1");
    }

    #[test]
    fn non_finite() {
        assert_eq!(format_g(f64::NAN, DOUBLE_DIGITS), "nan");
        assert_eq!(format_g(f64::INFINITY, DOUBLE_DIGITS), "inf");
        assert_eq!(format_g(f64::NEG_INFINITY, DOUBLE_DIGITS), "-inf");
    }

    #[test]
    fn scalar_rendering() {
        assert_eq!(to_text(&Value::from(true)).as_deref(), Some("true"));
        assert_eq!(to_text(&Value::from(false)).as_deref(), Some("false"));
        assert_eq!(to_text(&Value::from(-42i32)).as_deref(), Some("-42"));
        assert_eq!(to_text(&Value::from(3.5f64)).as_deref(), Some("3.5"));
        assert_eq!(
            to_text(&Value::from(b"bytes".to_vec())).as_deref(),
            Some("bytes")
        );
        assert_eq!(
            to_text(&Value::from(DateTime::from_epoch_secs(1_234_567_890))).as_deref(),
            Some("2009-02-13T23:31:30")
        );
        assert_eq!(to_text(&Value::from(vec![Value::from(1i32)])), None);
    }
}
