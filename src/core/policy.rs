use crate::constants::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_SRC, DIRECTIVE_TERMINATOR, HEADER_CSP,
    HEADER_CSP_REPORT_ONLY, NONCE_PLACEHOLDER, NONCE_PREFIX, SELF_SOURCE, SOURCE_SEPARATOR,
    SUFFIX_QUOTE,
};
use crate::core::directives::DirectiveConfig;
use crate::error::CspError;
use crate::security::scope::NonceSource;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::HttpRequest;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;
use serde_json::Value;
use std::{borrow::Cow, fmt, hash::BuildHasherDefault, sync::Arc};

type FxBuildHasher = BuildHasherDefault<FxHasher>;
type SourceSet = IndexSet<String, FxBuildHasher>;

pub type DynamicConfigFn = dyn Fn(&HttpRequest) -> DirectiveConfig + Send + Sync + 'static;

/// Where the directives for a request come from.
#[derive(Clone)]
pub enum PolicyConfig {
    Static(DirectiveConfig),
    /// Evaluated once per build with the request being answered.
    Dynamic(Arc<DynamicConfigFn>),
}

impl PolicyConfig {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&HttpRequest) -> DirectiveConfig + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    #[inline]
    pub fn from_value(value: &Value) -> Result<Self, CspError> {
        DirectiveConfig::from_value(value).map(Self::Static)
    }

    pub fn resolve(&self, req: &HttpRequest) -> Cow<'_, DirectiveConfig> {
        match self {
            Self::Static(config) => Cow::Borrowed(config),
            Self::Dynamic(f) => Cow::Owned(f(req)),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::Static(DirectiveConfig::default())
    }
}

impl From<DirectiveConfig> for PolicyConfig {
    fn from(config: DirectiveConfig) -> Self {
        Self::Static(config)
    }
}

impl fmt::Debug for PolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(config) => f.debug_tuple("Static").field(config).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Directives merged by name in first-seen order, each with a deduplicated
/// source list. `'self'` and `'SELF'` are distinct sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspPolicy {
    directives: IndexMap<String, SourceSet, FxBuildHasher>,
}

impl CspPolicy {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `config`, placing `default-src 'self'` first when the
    /// configuration does not name `default-src`.
    pub fn from_config(config: &DirectiveConfig) -> Self {
        let mut policy = Self::new();
        if !config.contains(DEFAULT_SRC) {
            policy.add_sources(DEFAULT_SRC, [SELF_SOURCE]);
        }
        for directive in config {
            policy.add_sources(directive.name(), directive.sources().expressions());
        }
        policy
    }

    pub fn add_sources<'a>(
        &mut self,
        name: &str,
        sources: impl IntoIterator<Item = &'a str>,
    ) -> &mut Self {
        let set = self.directives.entry(name.to_owned()).or_default();
        for source in sources {
            if !set.contains(source) {
                set.insert(source.to_owned());
            }
        }
        self
    }

    #[inline]
    pub fn get_directive(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        self.directives
            .get(name)
            .map(|set| set.iter().map(String::as_str))
    }

    #[inline]
    pub fn directive_names(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    #[inline]
    pub fn contains_nonce(&self) -> bool {
        self.directives
            .values()
            .any(|set| set.contains(NONCE_PLACEHOLDER))
    }

    /// Serializes to the header wire format, expanding `'nonce'`. The nonce
    /// source is consulted at most once, and only if a placeholder is present.
    ///
    /// Expansion is per source expression: only a whitespace-separated token
    /// equal to `'nonce'` is replaced, so a run-together value such as
    /// `'self''nonce'` is emitted untouched.
    pub fn serialize<N>(&self, nonce_source: &N) -> Result<String, CspError>
    where
        N: NonceSource + ?Sized,
    {
        let nonce = if self.contains_nonce() {
            Some(nonce_source.nonce()?)
        } else {
            None
        };

        let mut buffer = String::with_capacity(self.estimated_size());
        for (name, sources) in &self.directives {
            buffer.push_str(name);
            for source in sources {
                buffer.push(SOURCE_SEPARATOR);
                match nonce.as_deref() {
                    Some(value) if source == NONCE_PLACEHOLDER => {
                        buffer.push_str(NONCE_PREFIX);
                        buffer.push_str(value);
                        buffer.push_str(SUFFIX_QUOTE);
                    }
                    _ => buffer.push_str(source),
                }
            }
            buffer.push(DIRECTIVE_TERMINATOR);
        }
        Ok(buffer)
    }

    fn estimated_size(&self) -> usize {
        let size: usize = self
            .directives
            .iter()
            .map(|(name, sources)| {
                name.len() + 1 + sources.iter().map(|s| s.len() + 1).sum::<usize>()
            })
            .sum();
        size.max(DEFAULT_BUFFER_CAPACITY)
    }
}

/// Builds the `Content-Security-Policy` value for `req`.
pub fn build_header<N>(
    config: &PolicyConfig,
    req: &HttpRequest,
    nonce_source: &N,
) -> Result<String, CspError>
where
    N: NonceSource + ?Sized,
{
    let directives = config.resolve(req);
    CspPolicy::from_config(&directives).serialize(nonce_source)
}

/// [`build_header`] as an Actix header value.
pub fn header_value<N>(
    config: &PolicyConfig,
    req: &HttpRequest,
    nonce_source: &N,
) -> Result<HeaderValue, CspError>
where
    N: NonceSource + ?Sized,
{
    let value = build_header(config, req, nonce_source)?;
    HeaderValue::try_from(value).map_err(|e| CspError::HeaderError(e.to_string()))
}

#[inline]
pub fn header_name(report_only: bool) -> HeaderName {
    if report_only {
        HeaderName::from_static(HEADER_CSP_REPORT_ONLY)
    } else {
        HeaderName::from_static(HEADER_CSP)
    }
}
