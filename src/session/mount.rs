use crate::constants::NONCE_PARAM;
use crate::core::config::CspConfig;
use crate::monitoring::stats::CspStats;
use crate::security::scope::NonceScope;
use actix_web::{web, HttpRequest};
use serde::Deserialize;
use std::collections::HashMap;

const MISSING_NONCE_HELP: &str = "Long-lived session started without a forwarded CSP nonce; \
inline content rendered in this session will not match the page's policy. To forward it: \
(1) wrap the app with the CSP middleware, \
(2) render the nonce into the page with a <meta name=\"csp-nonce\"> tag, \
(3) read that tag in the client bootstrap and send it as the `_csp_nonce` connect parameter.";

/// Parameters sent by the client when it upgrades to a long-lived session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MountParams {
    #[serde(rename = "_csp_nonce")]
    nonce: Option<String>,
    #[serde(flatten)]
    params: HashMap<String, String>,
}

impl MountParams {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the query string of the upgrade request. A malformed query
    /// string yields no parameters.
    pub fn from_request(req: &HttpRequest) -> Self {
        web::Query::<Self>::from_query(req.query_string())
            .map(web::Query::into_inner)
            .unwrap_or_default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if key == NONCE_PARAM {
            self.nonce = Some(value.into());
        } else {
            self.params.insert(key, value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key == NONCE_PARAM {
            self.nonce.as_deref()
        } else {
            self.params.get(key).map(String::as_str)
        }
    }

    #[inline]
    pub fn forwarded_nonce(&self) -> Option<&str> {
        self.nonce.as_deref().filter(|nonce| !nonce.is_empty())
    }
}

impl From<HashMap<String, String>> for MountParams {
    fn from(mut params: HashMap<String, String>) -> Self {
        Self {
            nonce: params.remove(NONCE_PARAM),
            params,
        }
    }
}

/// Initializes the nonce state of an upgraded session. Must be called by the
/// host before any rendering in `scope`.
///
/// A forwarded nonce is adopted as-is. Without one the scope is returned
/// unchanged, so a fresh nonce is minted on first read; a diagnostic is logged
/// since that nonce will not match the header of the originating page.
pub fn on_mount(params: &MountParams, scope: NonceScope) -> NonceScope {
    on_mount_with_stats(params, scope, None)
}

fn on_mount_with_stats(
    params: &MountParams,
    scope: NonceScope,
    stats: Option<&CspStats>,
) -> NonceScope {
    let adopted = params
        .forwarded_nonce()
        .is_some_and(|nonce| scope.adopt_nonce(nonce));

    if !adopted {
        if let Some(stats) = stats {
            stats.increment_unforwarded_mount_count();
        }
        log::warn!("{MISSING_NONCE_HELP}");
    }
    scope
}

/// New scope for a session upgraded from `req`, with the forwarded nonce
/// adopted from its query string.
pub fn mount_scope(req: &HttpRequest, config: &CspConfig) -> NonceScope {
    let params = MountParams::from_request(req);
    on_mount_with_stats(&params, config.new_scope(), Some(config.stats()))
}
