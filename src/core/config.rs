use crate::constants::DEFAULT_NONCE_LENGTH;
use crate::core::directives::DirectiveConfig;
use crate::core::policy::{self, DynamicConfigFn, PolicyConfig};
use crate::error::CspError;
use crate::monitoring::stats::CspStats;
use crate::security::nonce::NonceGenerator;
use crate::security::scope::{NonceScope, NonceSource};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::HttpRequest;
use serde::Deserialize;
use serde_json::Value;
use std::{fs, path::Path, sync::Arc};

/// On-disk form of a [`CspConfig`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    directives: Value,
    #[serde(default)]
    report_only: bool,
    #[serde(default)]
    nonce_length: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CspConfig {
    policy: PolicyConfig,
    nonce_generator: Arc<NonceGenerator>,
    report_only: bool,
    stats: Arc<CspStats>,
}

impl CspConfig {
    pub fn new(policy: impl Into<PolicyConfig>) -> Self {
        Self {
            policy: policy.into(),
            nonce_generator: Arc::new(NonceGenerator::new(DEFAULT_NONCE_LENGTH)),
            report_only: false,
            stats: Arc::new(CspStats::new()),
        }
    }

    /// Parses a JSON document of the form
    /// `{"directives": {...} | [[name, sources], ...], "report_only": bool, "nonce_length": n}`.
    pub fn from_json_str(json: &str) -> Result<Self, CspError> {
        let document: ConfigDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_value(value: Value) -> Result<Self, CspError> {
        let document: ConfigDocument = serde_json::from_value(value)?;
        Self::from_document(document)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CspError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        log::debug!("Loading CSP configuration from {}", path.display());
        Self::from_json_str(&contents)
    }

    fn from_document(document: ConfigDocument) -> Result<Self, CspError> {
        let directives = DirectiveConfig::from_value(&document.directives)?;
        let mut builder = CspConfigBuilder::new()
            .directives(directives)
            .report_only(document.report_only);
        if let Some(length) = document.nonce_length {
            builder = builder.with_nonce_length(length);
        }
        Ok(builder.build())
    }

    #[inline]
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    #[inline]
    pub fn nonce_generator(&self) -> &Arc<NonceGenerator> {
        &self.nonce_generator
    }

    #[inline]
    pub fn is_report_only(&self) -> bool {
        self.report_only
    }

    #[inline]
    pub fn stats(&self) -> &Arc<CspStats> {
        &self.stats
    }

    #[inline]
    pub fn header_name(&self) -> HeaderName {
        policy::header_name(self.report_only)
    }

    /// Fresh, empty nonce scope for one logical request.
    #[inline]
    pub fn new_scope(&self) -> NonceScope {
        NonceScope::with_stats(self.nonce_generator.clone(), self.stats.clone())
    }

    pub fn build_header<N>(&self, req: &HttpRequest, nonce_source: &N) -> Result<String, CspError>
    where
        N: NonceSource + ?Sized,
    {
        policy::build_header(&self.policy, req, nonce_source)
    }

    pub fn header_value<N>(
        &self,
        req: &HttpRequest,
        nonce_source: &N,
    ) -> Result<HeaderValue, CspError>
    where
        N: NonceSource + ?Sized,
    {
        policy::header_value(&self.policy, req, nonce_source)
    }
}

impl Default for CspConfig {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

#[derive(Debug, Default)]
pub struct CspConfigBuilder {
    policy: Option<PolicyConfig>,
    nonce_length: Option<usize>,
    nonce_generator: Option<Arc<NonceGenerator>>,
    report_only: bool,
    stats: Option<Arc<CspStats>>,
}

impl CspConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn policy(mut self, policy: impl Into<PolicyConfig>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    #[inline]
    pub fn directives(self, directives: DirectiveConfig) -> Self {
        self.policy(PolicyConfig::Static(directives))
    }

    #[inline]
    pub fn dynamic_policy<F>(self, f: F) -> Self
    where
        F: Fn(&HttpRequest) -> DirectiveConfig + Send + Sync + 'static,
    {
        self.policy(PolicyConfig::dynamic(f))
    }

    #[inline]
    pub fn shared_dynamic_policy(self, f: Arc<DynamicConfigFn>) -> Self {
        self.policy(PolicyConfig::Dynamic(f))
    }

    #[inline]
    pub fn with_nonce_length(mut self, length: usize) -> Self {
        self.nonce_length = Some(length);
        self
    }

    #[inline]
    pub fn with_prebuilt_nonce_generator(mut self, generator: Arc<NonceGenerator>) -> Self {
        self.nonce_generator = Some(generator);
        self
    }

    #[inline]
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.report_only = enabled;
        self
    }

    #[inline]
    pub fn with_stats(mut self, stats: Arc<CspStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn build(self) -> CspConfig {
        let mut config = CspConfig::new(self.policy.unwrap_or_default());

        if let Some(generator) = self.nonce_generator {
            config.nonce_generator = generator;
        } else if let Some(length) = self.nonce_length {
            config.nonce_generator = Arc::new(NonceGenerator::new(length));
        }

        if let Some(stats) = self.stats {
            config.stats = stats;
        }

        config.report_only = self.report_only;
        config
    }
}
