//! Request-scoped nonce storage.
//!
//! A [`NonceScope`] is created for every logical request. The nonce inside it
//! is minted on first read and reused for the rest of the request, so the
//! header and the rendered markup agree. While the middleware drives the
//! downstream service, and later while the response body is polled, the scope
//! is also installed in a Tokio task-local, which backs the zero-argument
//! [`current_nonce`] accessor.

use crate::constants::NONCE_META_NAME;
use crate::error::CspError;
use crate::monitoring::stats::CspStats;
use crate::security::nonce::{is_valid_nonce, NonceGenerator};
use parking_lot::Mutex;
use std::{fmt, future::Future, sync::Arc};

tokio::task_local! {
    static CURRENT_SCOPE: NonceScope;
}

/// Capability to obtain the nonce of the current logical request.
pub trait NonceSource {
    fn nonce(&self) -> Result<String, CspError>;
}

#[derive(Clone)]
pub struct NonceScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    slot: Mutex<Option<String>>,
    generator: Arc<NonceGenerator>,
    stats: Option<Arc<CspStats>>,
}

impl NonceScope {
    pub fn new(generator: Arc<NonceGenerator>) -> Self {
        Self::build(generator, None)
    }

    pub fn with_stats(generator: Arc<NonceGenerator>, stats: Arc<CspStats>) -> Self {
        Self::build(generator, Some(stats))
    }

    fn build(generator: Arc<NonceGenerator>, stats: Option<Arc<CspStats>>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                slot: Mutex::new(None),
                generator,
                stats,
            }),
        }
    }

    /// Returns the nonce of this scope, minting it on first use.
    pub fn get_or_create_nonce(&self) -> Result<String, CspError> {
        let mut slot = self.inner.slot.lock();
        if let Some(nonce) = slot.as_ref() {
            return Ok(nonce.clone());
        }

        let nonce = self.inner.generator.generate()?;
        if let Some(stats) = &self.inner.stats {
            stats.increment_nonce_generation_count();
        }
        *slot = Some(nonce.clone());
        log::debug!("Minted CSP nonce for request scope");
        Ok(nonce)
    }

    /// Installs a nonce issued by an earlier exchange. Must run before any
    /// reader in this scope. Returns `false` and leaves the scope untouched if
    /// the value is empty or not a plausible base64 token.
    pub fn adopt_nonce(&self, nonce: impl Into<String>) -> bool {
        let nonce = nonce.into();
        if !is_valid_nonce(&nonce) {
            if !nonce.is_empty() {
                log::warn!("Ignoring forwarded CSP nonce with unexpected characters");
            }
            return false;
        }

        let mut slot = self.inner.slot.lock();
        if slot.as_deref().is_some_and(|current| current != nonce) {
            log::warn!("Forwarded CSP nonce replaces a nonce already issued in this scope");
        }
        *slot = Some(nonce);
        drop(slot);

        if let Some(stats) = &self.inner.stats {
            stats.increment_nonce_adoption_count();
        }
        log::debug!("Adopted forwarded CSP nonce");
        true
    }

    /// The nonce if one has already been issued; never mints.
    #[inline]
    pub fn peek(&self) -> Option<String> {
        self.inner.slot.lock().clone()
    }

    #[inline]
    pub fn is_issued(&self) -> bool {
        self.inner.slot.lock().is_some()
    }

    /// Runs `future` with this scope installed as the current one.
    pub async fn scope<F: Future>(self, future: F) -> F::Output {
        CURRENT_SCOPE.scope(self, future).await
    }

    /// Runs `f` with this scope installed as the current one.
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT_SCOPE.sync_scope(self, f)
    }

    /// The scope installed for the running task.
    pub fn current() -> Result<Self, CspError> {
        CURRENT_SCOPE
            .try_with(Clone::clone)
            .map_err(|_| CspError::NoActiveScope)
    }
}

impl fmt::Debug for NonceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceScope")
            .field("issued", &self.is_issued())
            .finish()
    }
}

impl NonceSource for NonceScope {
    #[inline]
    fn nonce(&self) -> Result<String, CspError> {
        self.get_or_create_nonce()
    }
}

/// Reads the nonce through the task-local scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentScope;

impl NonceSource for CurrentScope {
    #[inline]
    fn nonce(&self) -> Result<String, CspError> {
        current_nonce()
    }
}

impl<F> NonceSource for F
where
    F: Fn() -> Result<String, CspError>,
{
    #[inline]
    fn nonce(&self) -> Result<String, CspError> {
        self()
    }
}

/// Nonce of the request currently being handled, minted on first use.
pub fn current_nonce() -> Result<String, CspError> {
    NonceScope::current()?.get_or_create_nonce()
}

/// Adopts `nonce` into the scope of the running task.
pub fn adopt_nonce(nonce: impl Into<String>) -> Result<bool, CspError> {
    Ok(NonceScope::current()?.adopt_nonce(nonce))
}

/// `nonce="…"` attribute for inline `<script>` and `<style>` tags.
#[inline]
pub fn nonce_attr(nonce: &str) -> String {
    format!("nonce=\"{nonce}\"")
}

/// `<meta>` tag the client bootstrap reads to forward the nonce when it opens
/// a long-lived session.
#[inline]
pub fn meta_tag(nonce: &str) -> String {
    format!("<meta name=\"{NONCE_META_NAME}\" content=\"{nonce}\">")
}
