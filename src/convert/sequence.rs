//! Sequence coercions between the list kinds and scalar text.

use varia_core::Value;

use super::text;

/// A scalar string becomes the one-element string list.
pub(crate) fn str_to_str_list(s: &str) -> Vec<String> {
    vec![s.to_owned()]
}

/// A string list collapses to a scalar string only when it holds exactly
/// one element. Joining longer lists would be lossy in a way that cannot
/// round-trip, so those fail instead.
pub(crate) fn str_list_to_str(list: &[String]) -> Option<String> {
    match list {
        [only] => Some(only.clone()),
        _ => None,
    }
}

/// Element-wise text rendering of a generic list.
///
/// An element with no text form contributes an empty string rather than
/// failing the whole conversion.
pub(crate) fn list_to_str_list(list: &[Value]) -> Vec<String> {
    list.iter()
        .map(|item| text::to_text(item).unwrap_or_default())
        .collect()
}

/// Wrap each string as a string-typed value.
pub(crate) fn str_list_to_list(list: &[String]) -> Vec<Value> {
    list.iter().map(|s| Value::from(s.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use varia_core::KnownTypeId;

    #[test]
    fn singleton_rules() {
        assert_eq!(str_to_str_list("x"), vec!["x".to_owned()]);
        assert_eq!(str_list_to_str(&["x".to_owned()]), Some("x".to_owned()));
        assert_eq!(str_list_to_str(&[]), None);
        assert_eq!(str_list_to_str(&["x".to_owned(), "y".to_owned()]), None);
    }

    #[test]
    fn list_renders_element_wise() {
        let list = vec![
            Value::from(7i32),
            Value::from(true),
            Value::from(vec![Value::from(1i32)]),
            Value::from("tail"),
        ];
        assert_eq!(
            list_to_str_list(&list),
            vec!["7".to_owned(), "true".to_owned(), String::new(), "tail".to_owned()]
        );
    }

    #[test]
    fn str_list_lifts_to_values() {
        let lifted = str_list_to_list(&["a".to_owned(), "b".to_owned()]);
        assert_eq!(lifted.len(), 2);
        assert_eq!(lifted[0].type_id(), KnownTypeId::Str.into());
        assert_eq!(lifted[1].get::<String>(), Some(&"b".to_owned()));
    }
}
