//! Parsed `.properties` documents.
//!
//! The parser is total: every input produces a document. Structural problems
//! (a line without `=`, an unterminated `${`) are kept in the model and
//! reported later as diagnostics.
//!
//! Ranges are byte offsets into the original text. A property's index in
//! [`PropertiesDocument::properties`] is its stable identity for the lifetime
//! of the document.

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    /// Start offset.
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl TextRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A `${...}` reference inside a property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyExpression {
    range: TextRange,
    reference: String,
    closed: bool,
}

impl PropertyExpression {
    /// Range covering `${` up to and including `}` (or the end of the value).
    #[must_use]
    pub const fn range(&self) -> TextRange {
        self.range
    }

    /// Raw text between `${` and `}`, default part included.
    #[must_use]
    pub fn reference_text(&self) -> &str {
        &self.reference
    }

    /// Whether the closing `}` is present.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Referenced property name: the text before the first `:`, trimmed.
    #[must_use]
    pub fn referenced_name(&self) -> &str {
        self.reference
            .split_once(':')
            .map_or(self.reference.as_str(), |(name, _)| name)
            .trim()
    }

    /// Inline default of `${name:default}`.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.reference.split_once(':').map(|(_, default)| default)
    }
}

/// Finds every `${...}` in `text`.
///
/// `text` is taken as is: line continuations must already be joined.
/// `base` is added to every range so callers can scan a slice and get
/// document offsets back. An expression without `}` runs to the end of the
/// text and is reported as not closed.
///
/// # Example
///
/// ```
/// use mpconf_core::scan_expressions;
///
/// let expressions = scan_expressions("${host}:${port:8080}", 0);
/// assert_eq!(expressions.len(), 2);
/// assert_eq!(expressions[1].referenced_name(), "port");
/// assert_eq!(expressions[1].default_value(), Some("8080"));
/// ```
#[must_use]
pub fn scan_expressions(text: &str, base: usize) -> Vec<PropertyExpression> {
    let mut expressions = Vec::new();
    let mut pos = 0;
    while let Some(found) = text[pos..].find("${") {
        let start = pos + found;
        let inner_start = start + 2;
        match text[inner_start..].find('}') {
            Some(close) => {
                let inner_end = inner_start + close;
                expressions.push(PropertyExpression {
                    range: TextRange::new(base + start, base + inner_end + 1),
                    reference: text[inner_start..inner_end].to_string(),
                    closed: true,
                });
                pos = inner_end + 1;
            }
            None => {
                expressions.push(PropertyExpression {
                    range: TextRange::new(base + start, base + text.len()),
                    reference: text[inner_start..].to_string(),
                    closed: false,
                });
                break;
            }
        }
    }
    expressions
}

/// Splits `%profile.name` into its profile and bare name.
///
/// # Example
///
/// ```
/// use mpconf_core::split_profile;
///
/// assert_eq!(split_profile("%dev.quarkus.http.port"), (Some("dev"), "quarkus.http.port"));
/// assert_eq!(split_profile("quarkus.http.port"), (None, "quarkus.http.port"));
/// ```
#[must_use]
pub fn split_profile(key: &str) -> (Option<&str>, &str) {
    match key.strip_prefix('%') {
        Some(rest) => match rest.split_once('.') {
            Some((profile, name)) => (Some(profile), name),
            None => (Some(rest), ""),
        },
        None => (None, key),
    }
}

/// Value part of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    range: TextRange,
    text: String,
    expressions: Vec<PropertyExpression>,
}

impl PropertyValue {
    /// Range of the raw value in the document.
    #[must_use]
    pub const fn range(&self) -> TextRange {
        self.range
    }

    /// Value with line continuations joined.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `${...}` expressions in document order.
    #[must_use]
    pub fn expressions(&self) -> &[PropertyExpression] {
        &self.expressions
    }
}

/// One `key=value` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    index: usize,
    range: TextRange,
    key: String,
    key_range: TextRange,
    delimiter: Option<usize>,
    value: Option<PropertyValue>,
}

impl Property {
    /// Position of the property in its document.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Range of the whole logical line.
    #[must_use]
    pub const fn range(&self) -> TextRange {
        self.range
    }

    /// Key as written, profile prefix included.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Range of the key.
    #[must_use]
    pub const fn key_range(&self) -> TextRange {
        self.key_range
    }

    /// Profile of a `%profile.` key.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        split_profile(&self.key).0
    }

    /// Profiles of a `%a,b.` key.
    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.profile()
            .into_iter()
            .flat_map(|p| p.split(','))
            .map(str::trim)
    }

    /// Key without its profile prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        split_profile(&self.key).1
    }

    /// Offset of the `=` or `:` delimiter.
    #[must_use]
    pub const fn delimiter(&self) -> Option<usize> {
        self.delimiter
    }

    /// Whether an assignment delimiter is present.
    #[must_use]
    pub const fn has_delimiter(&self) -> bool {
        self.delimiter.is_some()
    }

    /// Value node; `None` when the delimiter is missing.
    #[must_use]
    pub const fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    /// Value text; `None` when the delimiter is missing.
    #[must_use]
    pub fn value_text(&self) -> Option<&str> {
        self.value.as_ref().map(PropertyValue::text)
    }

    /// Whether the value is missing or blank.
    #[must_use]
    pub fn has_empty_value(&self) -> bool {
        self.value_text().map_or(true, |v| v.trim().is_empty())
    }

    /// Expressions of the value.
    #[must_use]
    pub fn expressions(&self) -> &[PropertyExpression] {
        match &self.value {
            Some(value) => &value.expressions,
            None => &[],
        }
    }
}

/// A parsed `.properties` document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertiesDocument {
    uri: String,
    properties: Vec<Property>,
}

impl PropertiesDocument {
    /// Parses `.properties` text.
    ///
    /// Supports `#` and `!` comments, `=` or `:` delimiters, `\` line
    /// continuations and `%profile.` keys. A key separated from its value by
    /// whitespace only has no delimiter and is kept as a key without value.
    ///
    /// Expressions are found in the value after continuations are joined,
    /// so a `${` or a reference name may span lines. Their ranges still
    /// point into the original text.
    #[must_use]
    pub fn parse(uri: impl Into<String>, text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut properties = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let (line_end, next) = line_bounds(text, pos);
            let start = pos + leading_whitespace(&text[pos..line_end]);
            if start == line_end || matches!(bytes[start], b'#' | b'!') {
                pos = next;
                continue;
            }

            let mut end = line_end;
            let mut after = next;
            while ends_with_continuation(&text[start..end]) && after < text.len() {
                let (e, n) = line_bounds(text, after);
                end = e;
                after = n;
            }

            properties.push(parse_property(text, properties.len(), start, end));
            pos = after;
        }

        Self {
            uri: uri.into(),
            properties,
        }
    }

    /// Document identifier.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Properties in document order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Property by index.
    #[must_use]
    pub fn property(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    /// First property whose key (profile included) equals `key`.
    #[must_use]
    pub fn find_by_key(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.key() == key)
    }

    /// Every property whose bare name equals `name`, all profiles.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties.iter().filter(move |p| p.name() == name)
    }
}

fn parse_property(text: &str, index: usize, start: usize, end: usize) -> Property {
    let bytes = text.as_bytes();
    let mut delimiter = None;
    let mut i = start;
    while i < end {
        match bytes[i] {
            b'\\' => i += 1,
            b'=' | b':' => {
                delimiter = Some(i);
                break;
            }
            _ => {}
        }
        i += 1;
    }

    let key_end = delimiter.unwrap_or(end);
    let key = text[start..key_end].trim_end();
    let key_range = TextRange::new(start, start + key.len());

    let value = delimiter.map(|d| {
        let value_start = d + 1 + leading_whitespace(&text[d + 1..end]);
        let value_end = value_start + text[value_start..end].trim_end().len();
        let (joined, offsets) = join_continuations(&text[value_start..value_end]);
        let expressions = scan_expressions(&joined, 0)
            .into_iter()
            .map(|mut expression| {
                let TextRange { start, end } = expression.range;
                expression.range = TextRange::new(
                    value_start + offsets[start],
                    value_start + offsets[end - 1] + 1,
                );
                expression
            })
            .collect();
        PropertyValue {
            range: TextRange::new(value_start, value_end),
            text: joined,
            expressions,
        }
    });

    Property {
        index,
        range: TextRange::new(start, end),
        key: key.to_string(),
        key_range,
        delimiter,
        value,
    }
}

/// End of the line content and start of the next line.
fn line_bounds(text: &str, pos: usize) -> (usize, usize) {
    match text[pos..].find('\n') {
        Some(nl) => {
            let newline = pos + nl;
            let content_end = if newline > pos && text.as_bytes()[newline - 1] == b'\r' {
                newline - 1
            } else {
                newline
            };
            (content_end, newline + 1)
        }
        None => (text.len(), text.len()),
    }
}

fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t', '\u{c}']).len()
}

fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Removes `\` + line break + leading whitespace sequences.
///
/// Also returns, for every byte of the joined text, its offset in `raw`.
fn join_continuations(raw: &str) -> (String, Vec<usize>) {
    let mut out = String::with_capacity(raw.len());
    let mut offsets = Vec::with_capacity(raw.len());
    let mut line_start = 0;
    let mut lines = raw.split('\n').peekable();
    while let Some(line) = lines.next() {
        let start = line_start;
        line_start += line.len() + 1;
        let line = line.strip_suffix('\r').unwrap_or(line);
        let indent = if start == 0 {
            0
        } else {
            line.len() - line.trim_start().len()
        };
        let mut content = &line[indent..];
        if lines.peek().is_some() && ends_with_continuation(content) {
            content = &content[..content.len() - 1];
        }
        out.push_str(content);
        offsets.extend((0..content.len()).map(|i| start + indent + i));
    }
    (out, offsets)
}
