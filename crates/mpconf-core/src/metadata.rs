//! Property metadata.
//!
//! Metadata describes the properties an application understands: their
//! names, Java types, default values and whether they are required. Hints
//! list the allowed values of a property (enums) or the discovered values of
//! a placeholder used by dynamic properties.
//!
//! A [`MetadataSnapshot`] is an immutable, indexed view over a flat list of
//! items and hints. It is what the resolver and the validator read.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Semantic type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// `java.lang.String`.
    String,
    /// `int` / `java.lang.Integer`.
    Int,
    /// `long` / `java.lang.Long`.
    Long,
    /// `short` / `java.lang.Short`.
    Short,
    /// `float` / `java.lang.Float`.
    Float,
    /// `double` / `java.lang.Double`.
    Double,
    /// `boolean` / `java.lang.Boolean`.
    Boolean,
    /// `java.math.BigInteger`.
    BigInteger,
    /// `java.math.BigDecimal`.
    BigDecimal,
    /// `java.util.regex.Pattern`.
    Regex,
    /// Any other type (enums, durations, classes, ...).
    Other,
}

impl ItemType {
    /// Maps a Java type name to its semantic tag.
    ///
    /// `Optional<T>` wrappers are unwrapped first, and the primitive
    /// `Optional` specialisations map to their element type.
    ///
    /// # Example
    ///
    /// ```
    /// use mpconf_core::ItemType;
    ///
    /// assert_eq!(ItemType::from_java_type("int"), ItemType::Int);
    /// assert_eq!(ItemType::from_java_type("java.util.Optional<java.lang.Long>"), ItemType::Long);
    /// assert_eq!(ItemType::from_java_type("org.acme.Color"), ItemType::Other);
    /// ```
    #[must_use]
    pub fn from_java_type(type_name: &str) -> Self {
        match unwrap_optional(type_name) {
            "java.lang.String" | "String" => Self::String,
            "int" | "java.lang.Integer" | "java.util.OptionalInt" => Self::Int,
            "long" | "java.lang.Long" | "java.util.OptionalLong" => Self::Long,
            "short" | "java.lang.Short" => Self::Short,
            "float" | "java.lang.Float" => Self::Float,
            "double" | "java.lang.Double" | "java.util.OptionalDouble" => Self::Double,
            "boolean" | "java.lang.Boolean" => Self::Boolean,
            "java.math.BigInteger" => Self::BigInteger,
            "java.math.BigDecimal" => Self::BigDecimal,
            "java.util.regex.Pattern" => Self::Regex,
            _ => Self::Other,
        }
    }

    /// Human readable name used in diagnostics.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "int",
            Self::Long => "long",
            Self::Short => "short",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::BigInteger => "BigInteger",
            Self::BigDecimal => "BigDecimal",
            Self::Regex => "Pattern",
            Self::Other => "Object",
        }
    }
}

/// Strips a `java.util.Optional<...>` wrapper from a type name.
fn unwrap_optional(type_name: &str) -> &str {
    let type_name = type_name.trim();
    type_name
        .strip_prefix("java.util.Optional<")
        .and_then(|rest| rest.strip_suffix('>'))
        .map_or(type_name, str::trim)
}

/// How an enum constant is written in a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConverterKind {
    /// The constant exactly as declared (`FOO_BAR`).
    Verbatim,
    /// The hyphenated lower-case form (`foo-bar`).
    KebabCase,
}

impl ConverterKind {
    /// Converts a declared enum constant to the form this kind accepts.
    ///
    /// # Example
    ///
    /// ```
    /// use mpconf_core::ConverterKind;
    ///
    /// assert_eq!(ConverterKind::KebabCase.convert("FOO_BAR"), "foo-bar");
    /// assert_eq!(ConverterKind::KebabCase.convert("fooBar"), "foo-bar");
    /// assert_eq!(ConverterKind::Verbatim.convert("FOO_BAR"), "FOO_BAR");
    /// ```
    #[must_use]
    pub fn convert(&self, value: &str) -> String {
        match self {
            Self::Verbatim => value.to_string(),
            Self::KebabCase => {
                let mut out = String::with_capacity(value.len() + 4);
                let mut previous_lower = false;
                for c in value.chars() {
                    if c == '_' {
                        out.push('-');
                        previous_lower = false;
                    } else if c.is_uppercase() {
                        if previous_lower {
                            out.push('-');
                        }
                        out.extend(c.to_lowercase());
                        previous_lower = false;
                    } else {
                        out.push(c);
                        previous_lower = c.is_lowercase() || c.is_ascii_digit();
                    }
                }
                out
            }
        }
    }
}

/// A `${hint-name}` placeholder inside a dynamic property name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte offset of `$`.
    pub start: usize,
    /// Byte offset just past the closing `}`.
    pub end: usize,
    /// Text between the braces.
    pub hint_name: String,
}

/// Finds the first `${...}` placeholder in a property name.
///
/// # Example
///
/// ```
/// use mpconf_core::find_placeholder;
///
/// let p = find_placeholder("mp.messaging.connector.${connector}.url").unwrap();
/// assert_eq!(p.hint_name, "connector");
/// assert!(find_placeholder("quarkus.http.port").is_none());
/// ```
#[must_use]
pub fn find_placeholder(name: &str) -> Option<Placeholder> {
    let start = name.find("${")?;
    let close = name[start + 2..].find('}')? + start + 2;
    Some(Placeholder {
        start,
        end: close + 1,
        hint_name: name[start + 2..close].to_string(),
    })
}

/// Metadata of one configuration property.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyItem {
    /// Property name, possibly containing a `${hint}` placeholder.
    pub name: String,
    /// Java type name (`java.lang.Integer`, `org.acme.Color`, ...).
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Description shown to users.
    pub description: Option<String>,
    /// Declared default value.
    pub default_value: Option<String>,
    /// Whether the application fails to start without a value.
    pub required: bool,
    /// `true` when discovered from compiled classes, `false` from sources.
    pub binary: bool,
    /// Declaring class.
    pub source_type: Option<String>,
    /// Declaring field.
    pub source_field: Option<String>,
    /// Declaring method.
    pub source_method: Option<String>,
    /// Accepted spellings of enum constants.
    pub converter_kinds: Vec<ConverterKind>,
}

impl PropertyItem {
    /// Creates an item with the given name and nothing else set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the Java type name.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the declaring class.
    #[must_use]
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    /// Marks the item as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the item as discovered from compiled classes.
    #[must_use]
    pub fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    /// Adds an accepted enum spelling.
    #[must_use]
    pub fn with_converter(mut self, kind: ConverterKind) -> Self {
        self.converter_kinds.push(kind);
        self
    }

    /// Semantic type of the value.
    #[must_use]
    pub fn item_type(&self) -> Option<ItemType> {
        self.type_name.as_deref().map(ItemType::from_java_type)
    }

    /// The `${hint}` placeholder of a dynamic item.
    #[must_use]
    pub fn placeholder(&self) -> Option<Placeholder> {
        find_placeholder(&self.name)
    }

    /// Whether the name contains a `${hint}` placeholder.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.placeholder().is_some()
    }
}

/// One allowed or discovered value of a [`Hint`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueHint {
    /// The value.
    pub value: String,
    /// Description shown to users.
    pub description: Option<String>,
    /// Class the value was discovered on.
    pub source_type: Option<String>,
}

impl ValueHint {
    /// Creates a value hint without description or provenance.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Sets the class the value was discovered on.
    #[must_use]
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }
}

/// A named list of values.
///
/// A hint whose name is wrapped in `${}` only feeds the expansion of dynamic
/// properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hint {
    /// Hint name.
    pub name: String,
    /// Values in declaration order.
    pub values: Vec<ValueHint>,
    /// `true` when discovered from compiled classes, `false` from sources.
    pub binary: bool,
}

impl Hint {
    /// Creates an empty hint.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a value.
    #[must_use]
    pub fn with_value(mut self, value: ValueHint) -> Self {
        self.values.push(value);
        self
    }

    /// Marks the hint as discovered from compiled classes.
    #[must_use]
    pub fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    /// Name without a `${}` wrapper.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        strip_placeholder(&self.name)
    }

    /// Whether the name is wrapped in `${}`.
    #[must_use]
    pub fn is_placeholder_hint(&self) -> bool {
        self.name.starts_with("${") && self.name.ends_with('}')
    }

    /// Looks up a value.
    #[must_use]
    pub fn get_value(&self, value: &str) -> Option<&ValueHint> {
        self.values.iter().find(|v| v.value == value)
    }

    /// Appends the values of `other` that are not present yet.
    pub fn merge_values(&mut self, other: &Hint) {
        for value in &other.values {
            if self.get_value(&value.value).is_none() {
                self.values.push(value.clone());
            }
        }
    }
}

fn strip_placeholder(name: &str) -> &str {
    name.strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(name)
}

/// Access to hints by name.
pub trait HintLookup {
    /// Finds a hint by name, with or without a `${}` wrapper.
    fn find_hint(&self, name: &str) -> Option<&Hint>;
}

impl HintLookup for [Hint] {
    fn find_hint(&self, name: &str) -> Option<&Hint> {
        let bare = strip_placeholder(name);
        self.iter()
            .find(|h| h.name == name)
            .or_else(|| self.iter().find(|h| h.bare_name() == bare))
    }
}

/// Serialized form of a metadata snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataDocument {
    /// Property items.
    pub properties: Vec<PropertyItem>,
    /// Hints.
    pub hints: Vec<Hint>,
}

/// Segment matched by a placeholder or a `{*}` map key.
const SEGMENT_PATTERN: &str = r#"(?:"[^"]*"|[^.]+)"#;

/// Immutable, indexed view over metadata items and hints.
///
/// # Example
///
/// ```
/// use mpconf_core::{MetadataSnapshot, PropertyItem};
///
/// let metadata = MetadataSnapshot::new(
///     vec![
///         PropertyItem::new("quarkus.http.port").with_type("int"),
///         PropertyItem::new("quarkus.log.category.{*}.level"),
///     ],
///     vec![],
/// );
///
/// assert!(metadata.get("quarkus.http.port").is_some());
/// assert!(metadata.find_item("quarkus.log.category.\"org.acme\".level").is_some());
/// assert!(metadata.find_item("quarkus.http.host").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetadataSnapshot {
    items: Vec<PropertyItem>,
    hints: Vec<Hint>,
    item_index: HashMap<String, usize>,
    templates: Vec<(Regex, usize)>,
}

impl MetadataSnapshot {
    /// Builds a snapshot. When names repeat, the first item wins lookups.
    #[must_use]
    pub fn new(items: Vec<PropertyItem>, hints: Vec<Hint>) -> Self {
        let mut item_index = HashMap::with_capacity(items.len());
        let mut templates = Vec::new();
        for (i, item) in items.iter().enumerate() {
            item_index.entry(item.name.clone()).or_insert(i);
            if let Some(pattern) = template_pattern(&item.name) {
                templates.push((pattern, i));
            }
        }
        Self {
            items,
            hints,
            item_index,
            templates,
        }
    }

    /// All items.
    #[must_use]
    pub fn items(&self) -> &[PropertyItem] {
        &self.items
    }

    /// All hints.
    #[must_use]
    pub fn hints(&self) -> &[Hint] {
        &self.hints
    }

    /// Item with exactly this name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyItem> {
        self.item_index.get(name).map(|&i| &self.items[i])
    }

    /// Item with this name, or a dynamic/map template matching it.
    #[must_use]
    pub fn find_item(&self, name: &str) -> Option<&PropertyItem> {
        self.get(name).or_else(|| {
            self.templates
                .iter()
                .find(|(pattern, _)| pattern.is_match(name))
                .map(|&(_, i)| &self.items[i])
        })
    }

    /// Whether an item with exactly this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.item_index.contains_key(name)
    }

    /// Names of all items.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name.as_str())
    }

    /// Items marked as required.
    pub fn required_items(&self) -> impl Iterator<Item = &PropertyItem> {
        self.items.iter().filter(|item| item.required)
    }

    /// The hint listing allowed values of an item: the hint named after the
    /// item, else the hint named after its type.
    #[must_use]
    pub fn hint_for_item(&self, item: &PropertyItem) -> Option<&Hint> {
        self.find_hint(&item.name).or_else(|| {
            item.type_name
                .as_deref()
                .map(unwrap_optional)
                .and_then(|type_name| self.find_hint(type_name))
        })
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl HintLookup for MetadataSnapshot {
    fn find_hint(&self, name: &str) -> Option<&Hint> {
        self.hints.as_slice().find_hint(name)
    }
}

impl From<MetadataDocument> for MetadataSnapshot {
    fn from(document: MetadataDocument) -> Self {
        Self::new(document.properties, document.hints)
    }
}

/// Compiles a name containing `${...}` or `{*}` into an anchored pattern.
fn template_pattern(name: &str) -> Option<Regex> {
    let mut pattern = String::from("^");
    let mut rest = name;
    let mut wildcard = false;
    loop {
        let dynamic = rest.find("${");
        let map_key = rest.find("{*}");
        let next = match (dynamic, map_key) {
            (Some(d), Some(m)) => Some(d.min(m)),
            (d, m) => d.or(m),
        };
        let Some(start) = next else {
            pattern.push_str(&regex::escape(rest));
            break;
        };
        let end = if rest[start..].starts_with("{*}") {
            start + 3
        } else {
            match rest[start..].find('}') {
                Some(close) => start + close + 1,
                None => {
                    pattern.push_str(&regex::escape(rest));
                    break;
                }
            }
        };
        pattern.push_str(&regex::escape(&rest[..start]));
        pattern.push_str(SEGMENT_PATTERN);
        wildcard = true;
        rest = &rest[end..];
    }
    pattern.push('$');
    if wildcard {
        Regex::new(&pattern).ok()
    } else {
        None
    }
}
