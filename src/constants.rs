pub(crate) const HEADER_CSP: &str = "content-security-policy";
pub(crate) const HEADER_CSP_REPORT_ONLY: &str = "content-security-policy-report-only";

pub(crate) const DEFAULT_SRC: &str = "default-src";

pub(crate) const SELF_SOURCE: &str = "'self'";
pub(crate) const NONCE_PLACEHOLDER: &str = "'nonce'";
pub(crate) const NONCE_PREFIX: &str = "'nonce-";
pub(crate) const SUFFIX_QUOTE: &str = "'";

pub(crate) const DIRECTIVE_TERMINATOR: char = ';';
pub(crate) const SOURCE_SEPARATOR: char = ' ';

/// 24 bytes encode to 32 unpadded base64url characters.
pub(crate) const DEFAULT_NONCE_LENGTH: usize = 24;
pub(crate) const MIN_NONCE_LENGTH: usize = 16;

pub(crate) const DEFAULT_BUFFER_CAPACITY: usize = 256;

pub(crate) const NONCE_META_NAME: &str = "csp-nonce";

/// Handshake parameter the client bootstrap uses to forward the page nonce.
pub const NONCE_PARAM: &str = "_csp_nonce";
