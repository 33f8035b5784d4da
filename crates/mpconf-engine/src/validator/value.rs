//! Checks of a property value against its metadata.

use mpconf_core::{ConverterKind, Hint, ItemType, MetadataSnapshot, PropertyItem};
use regex::Regex;

/// A value that does not fit its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValueProblem {
    /// Hard mismatch.
    Mismatch(String),
    /// Not a boolean: the runtime reads it as `false`. Capped at warning.
    NotBoolean(String),
}

/// Checks `value` (already resolved, trimmed, non-empty) against `item`.
pub(crate) fn check_value(
    item: &PropertyItem,
    value: &str,
    metadata: &MetadataSnapshot,
) -> Option<ValueProblem> {
    if let Some(hint) = metadata.hint_for_item(item).filter(|h| !h.values.is_empty()) {
        return check_enum(item, hint, value);
    }

    let item_type = item.item_type()?;
    let valid = match item_type {
        ItemType::Boolean => {
            return (!is_boolean(value)).then(|| {
                ValueProblem::NotBoolean(format!(
                    "Type mismatch: boolean expected. '{value}' defaults to false"
                ))
            });
        }
        ItemType::Int => value.parse::<i32>().is_ok(),
        ItemType::Long => value.parse::<i64>().is_ok(),
        ItemType::Short => value.parse::<i16>().is_ok(),
        ItemType::Float => strip_float_suffix(value).parse::<f32>().is_ok(),
        ItemType::Double => strip_float_suffix(value).parse::<f64>().is_ok(),
        ItemType::BigInteger => is_big_integer(value),
        ItemType::BigDecimal => is_big_decimal(value),
        ItemType::Regex => Regex::new(value).is_ok(),
        ItemType::String | ItemType::Other => true,
    };
    (!valid).then(|| {
        ValueProblem::Mismatch(format!(
            "Type mismatch: {} expected",
            item_type.display_name()
        ))
    })
}

fn check_enum(item: &PropertyItem, hint: &Hint, value: &str) -> Option<ValueProblem> {
    let kinds: &[ConverterKind] = if item.converter_kinds.is_empty() {
        &[ConverterKind::Verbatim]
    } else {
        &item.converter_kinds
    };
    let accepted = hint
        .values
        .iter()
        .any(|hint_value| kinds.iter().any(|kind| kind.convert(&hint_value.value) == value));
    (!accepted).then(|| {
        let type_name = item.type_name.as_deref().unwrap_or(hint.bare_name());
        ValueProblem::Mismatch(format!("Invalid enum value: '{value}' is invalid for type {type_name}"))
    })
}

fn is_boolean(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
}

fn strip_float_suffix(value: &str) -> &str {
    value
        .strip_suffix(['f', 'F', 'd', 'D'])
        .filter(|rest| !rest.is_empty())
        .unwrap_or(value)
}

fn is_big_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decimal literal without `NaN`/`Infinity`, which `f64` parsing accepts.
fn is_big_decimal(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        && value.parse::<f64>().is_ok()
}
