use strata_core::schema::Value;
use strata_core::{Error, Result};

use proc_macro2::Literal;

pub(crate) fn string(value: &str) -> String {
    Literal::string(value).to_string()
}

pub(crate) fn opt_string(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("Some({})", string(value)),
        None => "None".to_string(),
    }
}

/// `&["A", "B"]`
pub(crate) fn strings<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let items: Vec<_> = values.into_iter().map(string).collect();
    format!("&[{}]", items.join(", "))
}

pub(crate) fn bools(values: &[bool]) -> String {
    let items: Vec<_> = values.iter().map(|value| value.to_string()).collect();
    format!("&[{}]", items.join(", "))
}

/// Writes `value` as an expression converting into `Value`. `owner` names
/// the model element holding the value, for the error.
pub(crate) fn value(owner: &str, value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => "Value::Null".to_string(),
        Value::Bool(value) => value.to_string(),
        Value::I64(value) => Literal::i64_suffixed(*value).to_string(),
        Value::U64(value) => Literal::u64_suffixed(*value).to_string(),
        Value::F64(value) if value.is_finite() => Literal::f64_suffixed(*value).to_string(),
        Value::F64(value) => return Err(Error::unsupported_literal(owner, value.to_string())),
        Value::String(value) => string(value),
        Value::Bytes(value) => format!("{}.to_vec()", Literal::byte_string(value)),
        Value::Opaque(opaque) => {
            return Err(Error::unsupported_literal(
                owner,
                format!("runtime object of type {}", opaque.type_name()),
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_escaped() {
        assert_eq!(string("say \"hi\"\n"), r#""say \"hi\"\n""#);
        assert_eq!(strings(["Id", "Name"]), r#"&["Id", "Name"]"#);
        assert_eq!(strings([]), "&[]");
        assert_eq!(opt_string(None), "None");
        assert_eq!(opt_string(Some("dbo")), r#"Some("dbo")"#);
    }

    #[test]
    fn numbers_carry_their_type() {
        assert_eq!(value("x", &Value::I64(-3)).unwrap(), "-3i64");
        assert_eq!(value("x", &Value::U64(7)).unwrap(), "7u64");
        assert_eq!(value("x", &Value::F64(1.5)).unwrap(), "1.5f64");
        assert_eq!(value("x", &Value::Bool(true)).unwrap(), "true");
        assert_eq!(value("x", &Value::Null).unwrap(), "Value::Null");
        assert_eq!(bools(&[true, false]), "&[true, false]");
    }

    #[test]
    fn bytes_become_owned() {
        assert_eq!(
            value("x", &Value::Bytes(vec![0, 65])).unwrap(),
            r#"b"\0A".to_vec()"#
        );
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let err = value("Reading.Value default", &Value::F64(f64::NAN)).unwrap_err();
        assert!(err.is_unsupported_literal());

        let err = value("x", &Value::F64(f64::INFINITY)).unwrap_err();
        assert!(err.is_unsupported_literal());
    }

    #[test]
    fn opaque_values_are_rejected() {
        let err = value("Blog.Handle", &Value::opaque(42u8)).unwrap_err();
        assert!(err.is_unsupported_literal());
        assert!(err.to_string().contains("Blog.Handle"));
    }
}
