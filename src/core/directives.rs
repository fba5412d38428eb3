use crate::error::CspError;
use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;

/// Converts the underscore spelling accepted by the API (`script_src`) into the
/// hyphenated wire name (`script-src`).
#[inline]
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    if name.contains('_') {
        Cow::Owned(name.replace('_', "-"))
    } else {
        Cow::Borrowed(name)
    }
}

/// One or more source expressions supplied for a single directive entry.
///
/// Each string is opaque; a string may carry several space separated
/// expressions (`"'self' 'nonce'"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources(SmallVec<[String; 4]>);

impl Sources {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, source: impl Into<String>) {
        self.0.push(source.into());
    }

    #[inline]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Individual source expressions, split on whitespace.
    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        self.0.iter().flat_map(|s| s.split_ascii_whitespace())
    }
}

impl From<&str> for Sources {
    fn from(source: &str) -> Self {
        let mut sources = Self::new();
        sources.push(source);
        sources
    }
}

impl From<String> for Sources {
    fn from(source: String) -> Self {
        let mut sources = Self::new();
        sources.push(source);
        sources
    }
}

impl<S: Into<String>> From<Vec<S>> for Sources {
    fn from(list: Vec<S>) -> Self {
        list.into_iter().collect()
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Sources {
    fn from(list: [S; N]) -> Self {
        list.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Sources {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A single `(directive-name, source-list)` entry. The name is stored
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    name: String,
    sources: Sources,
}

impl Directive {
    pub fn new(name: &str, sources: impl Into<Sources>) -> Self {
        Self {
            name: normalize_name(name).into_owned(),
            sources: sources.into(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn sources(&self) -> &Sources {
        &self.sources
    }
}

/// Ordered directive configuration. Repeated names are allowed here and are
/// merged when the header is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveConfig {
    entries: Vec<Directive>,
}

impl DirectiveConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn directive(mut self, name: &str, sources: impl Into<Sources>) -> Self {
        self.push(name, sources);
        self
    }

    pub fn push(&mut self, name: &str, sources: impl Into<Sources>) -> &mut Self {
        self.entries.push(Directive::new(name, sources));
        self
    }

    pub fn prepend(&mut self, name: &str, sources: impl Into<Sources>) -> &mut Self {
        self.entries.insert(0, Directive::new(name, sources));
        self
    }

    #[inline]
    pub fn entries(&self) -> &[Directive] {
        &self.entries
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.entries.iter().any(|d| d.name == name)
    }

    /// Reads a configuration document: either an object mapping names to
    /// sources, or an array of `[name, sources]` pairs. Sources are a string
    /// or an array of strings.
    pub fn from_value(value: &Value) -> Result<Self, CspError> {
        let mut config = Self::new();
        match value {
            Value::Object(map) => {
                for (name, sources) in map {
                    config.push(name, sources_from_value(name, sources)?);
                }
            }
            Value::Array(pairs) => {
                for pair in pairs {
                    let (name, sources) = match pair.as_array().map(Vec::as_slice) {
                        Some([Value::String(name), sources]) => (name, sources),
                        _ => {
                            return Err(CspError::InvalidConfiguration(format!(
                                "expected a [name, sources] pair, got {pair}"
                            )))
                        }
                    };
                    config.push(name, sources_from_value(name, sources)?);
                }
            }
            other => {
                return Err(CspError::InvalidConfiguration(format!(
                    "directives must be an object or a list of pairs, got {}",
                    kind_of(other)
                )))
            }
        }
        Ok(config)
    }
}

impl<'a> IntoIterator for &'a DirectiveConfig {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<N: AsRef<str>, S: Into<Sources>> FromIterator<(N, S)> for DirectiveConfig {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (name, sources) in iter {
            config.push(name.as_ref(), sources);
        }
        config
    }
}

fn sources_from_value(name: &str, value: &Value) -> Result<Sources, CspError> {
    match value {
        Value::String(source) => Ok(Sources::from(source.as_str())),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_owned).ok_or_else(|| {
                    CspError::InvalidConfiguration(format!(
                        "sources for '{name}' must be strings, got {}",
                        kind_of(item)
                    ))
                })
            })
            .collect(),
        other => Err(CspError::InvalidConfiguration(format!(
            "sources for '{name}' must be a string or a list of strings, got {}",
            kind_of(other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
