//! Expansion of dynamic metadata items.
//!
//! A dynamic item such as `quarkus.datasource.${datasource-name}.url` is a
//! template. Once the values of the `datasource-name` hint are known, one
//! concrete item is generated per value.

use std::collections::HashSet;

use mpconf_core::{HintLookup, PropertyItem};

/// Generates the concrete items of every dynamic template.
///
/// For each template, the hint named by its placeholder is looked up and one
/// item is produced per hint value: the placeholder is replaced by the value,
/// type, description, default and converters come from the template, and
/// `source_type` comes from the hint value. Generated names are unique and
/// never shadow a static item.
///
/// The result is meant to replace any previous expansion as a whole.
///
/// # Example
///
/// ```
/// use mpconf_core::{Hint, PropertyItem, ValueHint};
/// use mpconf_engine::expand;
///
/// let templates = vec![PropertyItem::new("quarkus.datasource.${ds}.url").with_type("java.lang.String")];
/// let hints = vec![Hint::new("${ds}")
///     .with_value(ValueHint::new("users"))
///     .with_value(ValueHint::new("orders"))];
///
/// let items = expand(&[], &templates, hints.as_slice());
/// let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
/// assert_eq!(names, ["quarkus.datasource.users.url", "quarkus.datasource.orders.url"]);
/// ```
#[must_use]
pub fn expand<H>(
    static_items: &[PropertyItem],
    dynamic_items: &[PropertyItem],
    hints: &H,
) -> Vec<PropertyItem>
where
    H: HintLookup + ?Sized,
{
    let seen: HashSet<&str> = static_items.iter().map(|item| item.name.as_str()).collect();
    let mut generated: Vec<PropertyItem> = Vec::new();

    for template in dynamic_items {
        let Some(placeholder) = template.placeholder() else {
            continue;
        };
        let Some(hint) = hints.find_hint(&placeholder.hint_name) else {
            tracing::trace!(
                template = %template.name,
                hint = %placeholder.hint_name,
                "No hint for dynamic item"
            );
            continue;
        };

        for value in &hint.values {
            if value.value.is_empty() {
                continue;
            }
            let name = format!(
                "{}{}{}",
                &template.name[..placeholder.start],
                value.value,
                &template.name[placeholder.end..]
            );
            if seen.contains(name.as_str()) || generated.iter().any(|item| item.name == name) {
                continue;
            }
            generated.push(PropertyItem {
                name,
                type_name: template.type_name.clone(),
                description: template.description.clone(),
                default_value: template.default_value.clone(),
                required: false,
                binary: template.binary,
                source_type: value.source_type.clone(),
                source_field: template.source_field.clone(),
                source_method: template.source_method.clone(),
                converter_kinds: template.converter_kinds.clone(),
            });
        }
    }

    generated
}
